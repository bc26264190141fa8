//! Generic-map resolver (spec §4.6), grounded on `simp.c`'s
//! `simp_generic_map` and the generic-substitution branch of `simp_ref`.
//!
//! The substitution map is a scoped stack (spec §9 "Generic substitution
//! as a scoped context"): [`resolve_generic_map`] computes one scope before
//! descent into a `block`/`instance`/`binding`; the driver pushes it,
//! descends (every `ExprRef` to a mapped formal resolves through
//! [`substitute_reference`]), then pops it and calls
//! [`rebuild_positional`] to normalise the node's own `genmaps` to
//! positional form.

use crate::ast::arena::Arena;
use crate::ast::ident::IdentTable;
use crate::ast::kind::NodeKind;
use crate::ast::node::{AttrValue, Ident, NodeKey, ParamEntry};
use crate::error::fatal;
use rustc_hash::FxHashMap;

/// One block/instance/binding's formal -> actual mapping.
pub type GenericScope = FxHashMap<NodeKey, NodeKey>;

/// Marks an `ExprRef` as occurring in a *formal-name* context (spec §4.6
/// second paragraph) — a position elaboration still needs to resolve by
/// name, where only a reference-shaped actual may ever substitute. The
/// elaborator that would set this during parsing is out of scope (spec
/// §1), so — matching [`crate::simp::subprogram::ClassAttrs`]'s approach —
/// this is modeled as a user attribute rather than a new `Node` field.
#[derive(Debug, Clone, Copy)]
pub struct FormalNameFlag(Ident);

impl FormalNameFlag {
    pub fn new(idents: &mut IdentTable) -> Self {
        Self(idents.intern("simp.formal_name"))
    }

    pub fn is_set(&self, arena: &Arena, expr: NodeKey) -> bool {
        matches!(arena.get(expr).get_attr(self.0), Some(AttrValue::Int(1)))
    }

    pub fn mark(&self, arena: &mut Arena, expr: NodeKey) {
        arena.get_mut(expr).set_attr(self.0, AttrValue::Int(1));
    }
}

/// The permitted actual-node kinds for direct substitution into an
/// expression position (spec §4.6 "Permitted actual kinds").
fn is_permitted_actual_kind(arena: &Arena, actual: NodeKey) -> bool {
    matches!(
        arena.get(actual).kind,
        NodeKind::ExprLiteral
            | NodeKind::ExprAggregate
            | NodeKind::ExprArraySlice
            | NodeKind::ExprArrayRef
            | NodeKind::ExprFCall
            | NodeKind::ExprRecordRef
            | NodeKind::ExprOpen
            | NodeKind::ExprQualified
            | NodeKind::ExprRef
    )
}

/// Compute `node`'s formal -> actual mapping (spec §4.6 first paragraph):
/// positional actual at the formal's index, else a named actual matching
/// the formal, else the formal's own default. A formal left unresolved
/// here (no actual, no default) is simply absent from the returned map —
/// [`rebuild_positional`] is what decides whether that's fatal or `open`.
pub fn resolve_generic_map(arena: &Arena, node: NodeKey) -> GenericScope {
    let formals: Vec<NodeKey> = arena.get(node).generics.iter().copied().collect();
    let actuals: Vec<ParamEntry> = arena.get(node).genmaps.to_vec();

    let mut map = GenericScope::default();
    for (i, &formal) in formals.iter().enumerate() {
        let positional = actuals.get(i).and_then(|a| match a {
            ParamEntry::Positional { value } => Some(*value),
            _ => None,
        });
        let formal_ident = arena.get(formal).ident;
        let named = actuals.iter().find_map(|a| match a {
            ParamEntry::Named { name, value } if Some(*name) == formal_ident => Some(*value),
            _ => None,
        });
        let default = arena.get(formal).get_value();

        if let Some(v) = positional.or(named).or(default) {
            map.insert(formal, v);
        }
    }
    map
}

/// Resolve an `ExprRef` that names a formal generic against the active
/// scope stack (innermost first), honouring the formal-name restriction
/// (spec §4.6 second paragraph). Returns the actual to substitute, or
/// `None` to leave the reference as-is (not a mapped formal, or a
/// formal-name context paired with a non-reference actual).
pub fn substitute_reference(
    arena: &Arena,
    flag: &FormalNameFlag,
    scopes: &[GenericScope],
    expr: NodeKey,
) -> Option<NodeKey> {
    let decl = arena.get(expr).get_ref()?;
    if arena.get(decl).kind != NodeKind::DeclGeneric {
        return None;
    }
    let actual = scopes.iter().rev().find_map(|s| s.get(&decl).copied())?;

    if flag.is_set(arena, expr) {
        (arena.get(actual).kind == NodeKind::ExprRef).then_some(actual)
    } else {
        is_permitted_actual_kind(arena, actual).then_some(actual)
    }
}

/// Rebuild `node`'s `genmaps` into fully-positional form in declaration
/// order (spec §4.6 "rebuild ... to use only positional generic actuals").
/// For a `binding`, a formal with no resolved actual becomes `open`; for
/// `block`/`instance` it is fatal (spec §4.6, §7).
pub fn rebuild_positional(arena: &mut Arena, node: NodeKey, map: &GenericScope) {
    let formals: Vec<NodeKey> = arena.get(node).generics.iter().copied().collect();
    let is_binding = arena.get(node).kind == NodeKind::Binding;

    let mut rebuilt: smallvec::SmallVec<[ParamEntry; 4]> = smallvec::SmallVec::new();
    for formal in formals {
        match map.get(&formal) {
            Some(&value) => rebuilt.push(ParamEntry::Positional { value }),
            None if is_binding => rebuilt.push(ParamEntry::Open),
            None => fatal(format!(
                "generic {:?} has no actual and no default outside a binding",
                arena.get(formal).ident
            )),
        }
    }
    arena.get_mut(node).genmaps = rebuilt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::Literal;
    use crate::diag::loc::Loc;

    fn generic_with_default(arena: &mut Arena, idents: &mut IdentTable, name: &str, default: i64) -> NodeKey {
        let lit = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(lit).set_literal(Literal::Integer(default));
        let decl = arena.new_node(NodeKind::DeclGeneric, Loc::unknown());
        arena.get_mut(decl).ident = Some(idents.intern(name));
        arena.get_mut(decl).set_value(Some(lit));
        decl
    }

    fn int_lit(arena: &mut Arena, v: i64) -> NodeKey {
        let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(k).set_literal(Literal::Integer(v));
        k
    }

    #[test]
    fn positional_actual_wins_over_default() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let n = generic_with_default(&mut arena, &mut idents, "n", 8);
        let k = generic_with_default(&mut arena, &mut idents, "k", 16);
        let block = arena.new_node(NodeKind::Block, Loc::unknown());
        arena.get_mut(block).add_generic(n);
        arena.get_mut(block).add_generic(k);
        let actual = int_lit(&mut arena, 2);
        arena
            .get_mut(block)
            .add_genmap(ParamEntry::Positional { value: actual });

        let map = resolve_generic_map(&arena, block);
        assert_eq!(map.get(&n), Some(&actual));
        let default_k = arena.get(k).get_value().unwrap();
        assert_eq!(map.get(&k), Some(&default_k));

        rebuild_positional(&mut arena, block, &map);
        assert_eq!(arena.get(block).genmaps.len(), 2);
        assert!(matches!(
            arena.get(block).genmaps[1],
            ParamEntry::Positional { value } if value == default_k
        ));
    }

    #[test]
    fn binding_with_missing_actual_and_no_default_becomes_open() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let g = arena.new_node(NodeKind::DeclGeneric, Loc::unknown());
        arena.get_mut(g).ident = Some(idents.intern("w"));
        let binding = arena.new_node(NodeKind::Binding, Loc::unknown());
        arena.get_mut(binding).add_generic(g);

        let map = resolve_generic_map(&arena, binding);
        assert!(map.is_empty());
        rebuild_positional(&mut arena, binding, &map);
        assert!(matches!(arena.get(binding).genmaps[0], ParamEntry::Open));
    }

    #[test]
    fn formal_name_context_refuses_non_reference_actual() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let flag = FormalNameFlag::new(&mut idents);
        let formal = generic_with_default(&mut arena, &mut idents, "n", 8);
        let actual = int_lit(&mut arena, 2);
        let mut scope = GenericScope::default();
        scope.insert(formal, actual);

        let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r).set_ref(Some(formal));
        flag.mark(&mut arena, r);

        assert_eq!(substitute_reference(&arena, &flag, &[scope], r), None);
    }
}
