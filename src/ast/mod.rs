//! Component A: the AST store (spec §3, §4.1).
//!
//! Tagged node values with per-kind field predicates ([`kind`]), the value
//! type itself ([`node`]), the owning arena with its `visit`/`rewrite`/
//! `copy` traversal ([`arena`]), mark-and-sweep collection ([`gc`]),
//! identifier interning ([`ident`]), and the binary on-disk form
//! ([`serialize`]).

pub mod arena;
pub mod gc;
pub mod ident;
pub mod kind;
pub mod node;
pub mod serialize;

pub use arena::Arena;
pub use ident::IdentTable;
pub use kind::NodeKind;
pub use node::{Ident, Node, NodeKey, NodeList, INVALID_NODE_KEY};
