//! Subprogram classification via user attributes (spec §3 "User
//! attributes", §4.5 "predefined ... foreign ... impure").
//!
//! The elaborator — which would normally classify a `DeclFunc`/`DeclProc`
//! as predefined, impure, foreign, or already-lowered — is out of scope
//! (spec §1). Rather than extend [`crate::ast::node::Node`] with four
//! fields nothing else in the AST store needs, this models the
//! elaborator's verdict as ordinary user attributes, the same mechanism
//! spec §3 already sets aside for exactly this kind of side information.

use crate::ast::arena::Arena;
use crate::ast::ident::IdentTable;
use crate::ast::node::{AttrValue, Ident, NodeKey};

/// Interned names for the five classification attributes, cached once at
/// driver construction so callers don't re-intern the same names on every
/// lookup.
#[derive(Debug, Clone, Copy)]
pub struct ClassAttrs {
    predefined: Ident,
    impure: Ident,
    foreign: Ident,
    lowered: Ident,
    hidden: Ident,
}

impl ClassAttrs {
    pub fn new(idents: &mut IdentTable) -> Self {
        Self {
            predefined: idents.intern("simp.predefined"),
            impure: idents.intern("simp.impure"),
            foreign: idents.intern("simp.foreign"),
            lowered: idents.intern("simp.lowered"),
            hidden: idents.intern("simp.hidden"),
        }
    }

    fn flag(arena: &Arena, decl: NodeKey, name: Ident) -> bool {
        matches!(arena.get(decl).get_attr(name), Some(AttrValue::Int(1)))
    }

    fn mark(arena: &mut Arena, decl: NodeKey, name: Ident) {
        arena.get_mut(decl).set_attr(name, AttrValue::Int(1));
    }

    /// A predefined operator/function (spec §4.5: folding these never
    /// needs `EVAL_FCALL`).
    pub fn is_predefined(&self, arena: &Arena, decl: NodeKey) -> bool {
        Self::flag(arena, decl, self.predefined)
    }

    pub fn mark_predefined(&self, arena: &mut Arena, decl: NodeKey) {
        Self::mark(arena, decl, self.predefined);
    }

    /// An impure subprogram (spec §4.5: never static, refused unconditionally).
    pub fn is_impure(&self, arena: &Arena, decl: NodeKey) -> bool {
        Self::flag(arena, decl, self.impure)
    }

    pub fn mark_impure(&self, arena: &mut Arena, decl: NodeKey) {
        Self::mark(arena, decl, self.impure);
    }

    /// Bound to a foreign (non-VHDL) body (spec §4.5).
    pub fn is_foreign(&self, arena: &Arena, decl: NodeKey) -> bool {
        Self::flag(arena, decl, self.foreign)
    }

    pub fn mark_foreign(&self, arena: &mut Arena, decl: NodeKey) {
        Self::mark(arena, decl, self.foreign);
    }

    /// Whether a lowered unit already exists for `decl` — a foreign
    /// subprogram without one refuses folding (spec §4.5); a foreign one
    /// with one is foldable like any other.
    pub fn has_lowered_body(&self, arena: &Arena, decl: NodeKey) -> bool {
        Self::flag(arena, decl, self.lowered)
    }

    pub fn mark_lowered(&self, arena: &mut Arena, decl: NodeKey) {
        Self::mark(arena, decl, self.lowered);
    }

    /// Marked by the elaborator when an explicit user declaration hides a
    /// predefined operator of the same signature (spec §4.4 "Subprogram
    /// declaration").
    pub fn is_hidden(&self, arena: &Arena, decl: NodeKey) -> bool {
        Self::flag(arena, decl, self.hidden)
    }

    pub fn mark_hidden(&self, arena: &mut Arena, decl: NodeKey) {
        Self::mark(arena, decl, self.hidden);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::kind::NodeKind;
    use crate::diag::loc::Loc;

    #[test]
    fn unmarked_declarations_classify_as_plain_user_subprograms() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        assert!(!classes.is_predefined(&arena, decl));
        assert!(!classes.is_impure(&arena, decl));
        assert!(!classes.is_foreign(&arena, decl));
        assert!(!classes.is_hidden(&arena, decl));
    }

    #[test]
    fn marking_a_declaration_round_trips() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        classes.mark_predefined(&mut arena, decl);
        classes.mark_hidden(&mut arena, decl);
        assert!(classes.is_predefined(&arena, decl));
        assert!(classes.is_hidden(&arena, decl));
        assert!(!classes.is_impure(&arena, decl));
    }
}
