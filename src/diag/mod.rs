//! Component B: the source-location registry and diagnostic emitter
//! (spec §4.2).
//!
//! Packed locations and the file registry ([`loc`]), the diagnostic record
//! with its hints/trace/counter ([`diagnostic`]), and the two rendering
//! styles the configured [`crate::config::MessageStyle`] selects between
//! ([`render`]).

pub mod diagnostic;
pub mod loc;
pub mod render;

pub use diagnostic::{ConsumerHook, Diagnostic, Diagnostics, Hint, HintHook, Level, TraceFrame};
pub use loc::{FileRef, FileRegistry, Loc};
