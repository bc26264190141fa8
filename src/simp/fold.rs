//! Constant-folding gate (spec §4.5), grounded on `simp.c`'s
//! `fold_possible`/`fold_not_possible`.
//!
//! Unlike the bare boolean the distilled spec describes, the source's gate
//! carries a reason along every refusal (SPEC_FULL "`fold_possible` reason
//! strings") so a caller folding with `EVAL_WARN` set can attribute exactly
//! why an expression stayed unfolded. [`FoldPossible`] is that reason,
//! not a log call: whether to actually warn is the rule's decision (spec
//! §7 "optionally emits a warning"), not this gate's.

use crate::ast::arena::Arena;
use crate::ast::ident::IdentTable;
use crate::ast::kind::NodeKind;
use crate::ast::node::NodeKey;
use crate::config::EvalFlags;
use crate::simp::subprogram::ClassAttrs;

/// The gate's verdict for one (sub-)expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldPossible {
    Yes,
    /// Refused, with a one-line reason (spec §4.5, §7).
    No(String),
}

impl FoldPossible {
    pub fn is_possible(&self) -> bool {
        matches!(self, FoldPossible::Yes)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FoldPossible::No(r) => Some(r.as_str()),
            FoldPossible::Yes => None,
        }
    }
}

/// `fold_possible` (spec §4.5): recurse through `expr`, refusing as soon as
/// any sub-expression fails one of the permitted shapes.
pub fn fold_possible(
    arena: &Arena,
    idents: &IdentTable,
    classes: &ClassAttrs,
    flags: EvalFlags,
    expr: NodeKey,
) -> FoldPossible {
    match arena.get(expr).kind {
        NodeKind::ExprLiteral => FoldPossible::Yes,

        NodeKind::ExprRef => match arena.get(expr).get_ref() {
            None => FoldPossible::No("unresolved reference".into()),
            Some(decl) => match arena.get(decl).kind {
                NodeKind::DeclUnit | NodeKind::DeclEnumLit => FoldPossible::Yes,
                NodeKind::DeclConst => match arena.get(decl).get_value() {
                    Some(init) => fold_possible(arena, idents, classes, flags, init),
                    None => FoldPossible::No("deferred constant has no initialiser".into()),
                },
                _ => FoldPossible::No("reference is not locally static".into()),
            },
        },

        NodeKind::ExprTypeConv | NodeKind::ExprQualified => {
            fold_possible(arena, idents, classes, flags, arena.get(expr).get_operand())
        }

        NodeKind::ExprAggregate => {
            for assoc in &arena.get(expr).assocs {
                if let Some(value) = assoc.value() {
                    let r = fold_possible(arena, idents, classes, flags, value);
                    if !r.is_possible() {
                        return r;
                    }
                }
            }
            FoldPossible::Yes
        }

        NodeKind::ExprFCall => fold_possible_call(arena, idents, classes, flags, expr),

        other => FoldPossible::No(format!("{other:?} is not locally static")),
    }
}

fn fold_possible_call(
    arena: &Arena,
    idents: &IdentTable,
    classes: &ClassAttrs,
    flags: EvalFlags,
    expr: NodeKey,
) -> FoldPossible {
    let Some(decl) = arena.get(expr).get_ref() else {
        return FoldPossible::No("unresolved call".into());
    };

    if classes.is_impure(arena, decl) {
        return FoldPossible::No("impure subprogram".into());
    }

    if !classes.is_predefined(arena, decl) {
        if !flags.contains(EvalFlags::EVAL_FCALL) {
            return FoldPossible::No("user-defined subprogram (EVAL_FCALL not set)".into());
        }
        if classes.is_foreign(arena, decl) && !classes.has_lowered_body(arena, decl) {
            return FoldPossible::No("foreign subprogram with no lowered body".into());
        }
        if !classes.has_lowered_body(arena, decl) {
            return FoldPossible::No("user subprogram has no lowered unit".into());
        }
    }

    let params: Vec<NodeKey> = arena
        .get(expr)
        .params
        .iter()
        .filter_map(|p| p.value())
        .collect();
    for p in params {
        let r = fold_possible(arena, idents, classes, flags, p);
        if !r.is_possible() {
            return r;
        }
    }
    FoldPossible::Yes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::loc::Loc;

    fn int_lit(arena: &mut Arena, v: i64) -> NodeKey {
        let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena
            .get_mut(k)
            .set_literal(crate::ast::node::Literal::Integer(v));
        k
    }

    #[test]
    fn literal_always_folds() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let lit = int_lit(&mut arena, 1);
        assert!(fold_possible(&arena, &idents, &classes, EvalFlags::empty(), lit).is_possible());
    }

    #[test]
    fn impure_call_refuses_unconditionally() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        classes.mark_impure(&mut arena, decl);
        let call = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(call).set_ref(Some(decl));
        let mut flags = EvalFlags::empty();
        flags.insert(EvalFlags::EVAL_FCALL);
        let verdict = fold_possible(&arena, &idents, &classes, flags, call);
        assert_eq!(verdict.reason(), Some("impure subprogram"));
    }

    #[test]
    fn user_subprogram_without_eval_fcall_refuses() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        let call = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(call).set_ref(Some(decl));
        let verdict = fold_possible(&arena, &idents, &classes, EvalFlags::empty(), call);
        assert!(!verdict.is_possible());
    }

    #[test]
    fn predefined_call_over_literals_folds() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        classes.mark_predefined(&mut arena, decl);
        let a = int_lit(&mut arena, 2);
        let b = int_lit(&mut arena, 3);
        let call = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(call).set_ref(Some(decl));
        arena
            .get_mut(call)
            .add_param(crate::ast::node::ParamEntry::Positional { value: a });
        arena
            .get_mut(call)
            .add_param(crate::ast::node::ParamEntry::Positional { value: b });
        assert!(fold_possible(&arena, &idents, &classes, EvalFlags::empty(), call).is_possible());
    }

    #[test]
    fn deferred_constant_refuses() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let decl = arena.new_node(NodeKind::DeclConst, Loc::unknown());
        let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r).set_ref(Some(decl));
        let verdict = fold_possible(&arena, &idents, &classes, EvalFlags::empty(), r);
        assert!(!verdict.is_possible());
    }
}
