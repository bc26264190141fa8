//! Component D: the simplifier driver (spec §2, §4.4, §4.5, §4.6).
//!
//! Per-kind rewrite rules ([`rules`]), the constant-folding gate
//! ([`fold`]), the generic-map resolver ([`generic`]), and subprogram
//! classification ([`subprogram`]) — everything [`crate::Driver`] wires
//! together around [`crate::ast::arena::Arena::rewrite`].

pub mod fold;
pub mod generic;
pub mod rules;
pub mod subprogram;

pub use fold::{fold_possible, FoldPossible};
pub use rules::RuleEnv;
pub use subprogram::ClassAttrs;
