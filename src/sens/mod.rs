//! Component C: the sensitivity-list builder (spec §4.3).
//!
//! Walks an arbitrary expression/statement subtree and appends *trigger*
//! expressions to a target `wait` node, grounded on `simp.c`'s
//! `simp_build_wait`/`simp_build_wait_for_target`/`simp_longest_static_prefix`.
//! This is a read-only walk: it adds triggers to the `wait` node passed in
//! but never rewrites the subtree it walks, which is why it lives apart
//! from [`crate::simp`]'s rewrite rules even though the driver is its only
//! caller.

use crate::ast::arena::Arena;
use crate::ast::kind::NodeKind;
use crate::ast::node::{NodeKey, ObjectClass};
use crate::error::fatal;

/// `class_of` (spec §4.3): the object class of whatever `key` names, or
/// `None` for a kind that doesn't carry one (a type, a unit, an
/// enumeration literal — none of these are ever a signal).
fn class_of(arena: &Arena, key: NodeKey) -> Option<ObjectClass> {
    let node = arena.get(key);
    if node.kind.has_class() {
        node.get_class()
    } else {
        None
    }
}

/// The *static-prefix* predicate (spec §4.3): a reference is static iff its
/// target is a constant, unit, enumeration literal, or a constant-class
/// port/generic; a literal is always static; an alias is static iff its
/// aliased expression is.
pub fn is_static(arena: &Arena, expr: NodeKey) -> bool {
    match arena.get(expr).kind {
        NodeKind::ExprLiteral => true,
        NodeKind::ExprRef => match arena.get(expr).get_ref() {
            Some(decl) => is_static_decl(arena, decl),
            None => false,
        },
        _ => false,
    }
}

fn is_static_decl(arena: &Arena, decl: NodeKey) -> bool {
    match arena.get(decl).kind {
        NodeKind::DeclConst | NodeKind::DeclUnit | NodeKind::DeclEnumLit => true,
        NodeKind::DeclPort | NodeKind::DeclGeneric => {
            class_of(arena, decl) == Some(ObjectClass::Constant)
        }
        NodeKind::DeclAlias => match arena.get(decl).get_ref() {
            Some(aliased) => is_static(arena, aliased),
            None => false,
        },
        _ => false,
    }
}

/// The *longest static prefix* of an array ref/slice (spec §4.3): walk
/// down through nested indexing while every index/range subexpression is
/// static; stop (returning the innermost prefix found so far) at the
/// first level that isn't.
fn longest_static_prefix(arena: &Arena, expr: NodeKey) -> NodeKey {
    match arena.get(expr).kind {
        NodeKind::ExprArrayRef => {
            let value = arena.get(expr).get_operand();
            let prefix = longest_static_prefix(arena, value);
            if prefix != value {
                return prefix;
            }
            let all_static = arena
                .get(expr)
                .params
                .iter()
                .filter_map(|p| p.value())
                .all(|v| is_static(arena, v));
            if all_static {
                expr
            } else {
                prefix
            }
        }
        NodeKind::ExprArraySlice => {
            let value = arena.get(expr).get_operand();
            let prefix = longest_static_prefix(arena, value);
            if prefix != value {
                return prefix;
            }
            let range = arena.get(expr).get_range();
            let bounds_static = match range {
                Some(r) => {
                    let rnode = arena.get(r);
                    is_static(arena, rnode.get_left()) && is_static(arena, rnode.get_right())
                }
                None => false,
            };
            if bounds_static {
                expr
            } else {
                prefix
            }
        }
        _ => expr,
    }
}

/// `simp_build_wait_for_target` (spec §4.3): for a signal-assignment
/// target, recurse into the index/range expressions of an array
/// ref/slice, but not into the array being indexed itself (that's the
/// assignment's own target, not a trigger).
fn build_wait_for_target(arena: &Arena, wait: NodeKey, expr: NodeKey, all: bool, out: &mut Vec<NodeKey>) {
    match arena.get(expr).kind {
        NodeKind::ExprArraySlice => {
            if let Some(r) = arena.get(expr).get_range() {
                build_wait(arena, wait, r, all, out);
            }
        }
        NodeKind::ExprArrayRef => {
            let params: Vec<NodeKey> = arena
                .get(expr)
                .params
                .iter()
                .filter_map(|p| p.value())
                .collect();
            for p in params {
                build_wait(arena, wait, p, all, out);
            }
        }
        _ => {}
    }
}

/// Add `expr` to `out` as a trigger unless an existing trigger in `wait`
/// already names the same declaration (spec §4.3 "dedupe").
fn add_trigger_deduped(arena: &Arena, wait: NodeKey, decl: NodeKey, expr: NodeKey, out: &mut Vec<NodeKey>) {
    for &t in arena.get(wait).triggers.iter().chain(out.iter()) {
        if arena.get(t).kind == NodeKind::ExprRef && arena.get(t).get_ref() == Some(decl) {
            return;
        }
    }
    out.push(expr);
}

/// `simp_build_wait` (spec §4.3): recursively collect trigger expressions
/// for `expr` into `out` (the caller appends them to `wait` via
/// `add_trigger`, after the whole walk, so dedup-against-`wait` still sees
/// everything already committed from a prior call in the same pass).
///
/// `all` is the distinguished "all-sensitised process" flag (spec §4.4
/// "Process"): when set, a call into a procedure body also walks the
/// callee's own statements, per LRM 08 §11.3.
pub fn build_wait(arena: &Arena, wait: NodeKey, expr: NodeKey, all: bool, out: &mut Vec<NodeKey>) {
    match arena.get(expr).kind {
        NodeKind::ExprRef => {
            if let Some(decl) = arena.get(expr).get_ref() {
                if class_of(arena, decl) == Some(ObjectClass::Signal) {
                    add_trigger_deduped(arena, wait, decl, expr, out);
                }
            }
        }

        NodeKind::ExprArraySlice | NodeKind::ExprArrayRef => {
            let signal = arena
                .get(expr)
                .get_operand();
            let is_signal = matches!(arena.get(signal).kind, NodeKind::ExprRef)
                && arena
                    .get(signal)
                    .get_ref()
                    .map(|d| class_of(arena, d) == Some(ObjectClass::Signal))
                    .unwrap_or(false);
            if is_signal {
                if longest_static_prefix(arena, expr) == expr {
                    out.push(expr);
                } else {
                    build_wait(arena, wait, signal, all, out);
                    build_wait_for_target(arena, wait, expr, all, out);
                }
            }
        }

        NodeKind::Waveform | NodeKind::ExprRecordRef | NodeKind::ExprQualified | NodeKind::ExprTypeConv => {
            let operand = if arena.get(expr).kind == NodeKind::Waveform {
                arena.get(expr).value
            } else {
                Some(arena.get(expr).get_operand())
            };
            if let Some(v) = operand {
                build_wait(arena, wait, v, all, out);
            }
        }

        NodeKind::StmtAssert | NodeKind::ConcAssert => {
            let cond = arena.get(expr).get_cond();
            build_wait(arena, wait, cond, all, out);
        }

        NodeKind::ExprFCall | NodeKind::StmtPCall | NodeKind::ConcPCall => {
            build_wait_call(arena, wait, expr, all, out);
        }

        NodeKind::ExprAggregate => {
            let values: Vec<NodeKey> = arena
                .get(expr)
                .assocs
                .iter()
                .filter_map(|a| a.value())
                .collect();
            for v in values {
                build_wait(arena, wait, v, all, out);
            }
        }

        NodeKind::ExprAttrRef => {
            use crate::ast::node::AttrKind;
            if matches!(
                arena.get(expr).attr_kind,
                Some(AttrKind::Event) | Some(AttrKind::Active)
            ) {
                let prefix = arena.get(expr).get_operand();
                build_wait(arena, wait, prefix, all, out);
            }
            let params: Vec<NodeKey> = arena
                .get(expr)
                .params
                .iter()
                .filter_map(|p| p.value())
                .collect();
            for p in params {
                build_wait(arena, wait, p, all, out);
            }
        }

        NodeKind::ExprLiteral => {}

        NodeKind::StmtIf => {
            let cond = arena.get(expr).get_cond();
            build_wait(arena, wait, cond, all, out);
            let stmts: Vec<NodeKey> = arena.get(expr).stmts.iter().copied().collect();
            for s in stmts {
                build_wait(arena, wait, s, all, out);
            }
            let elses: Vec<NodeKey> = arena.get(expr).else_stmts.iter().copied().collect();
            for s in elses {
                build_wait(arena, wait, s, all, out);
            }
        }

        NodeKind::StmtProcess | NodeKind::Block | NodeKind::DeclProc => {
            let stmts: Vec<NodeKey> = arena.get(expr).stmts.iter().copied().collect();
            for s in stmts {
                build_wait(arena, wait, s, all, out);
            }
        }

        NodeKind::StmtSignalAssign | NodeKind::ConcSignalAssign => {
            let target = arena.get(expr).get_target();
            build_wait_for_target(arena, wait, target, all, out);
            let waves: Vec<NodeKey> = arena.get(expr).waveforms.iter().copied().collect();
            for w in waves {
                build_wait(arena, wait, w, all, out);
            }
        }

        // A selected signal assignment keeps its per-choice waveforms as
        // `assocs` values (spec §4.4 "Concurrent ... selected assignment");
        // the selector expression lives in `value`, same as `StmtCase`.
        NodeKind::ConcSelectedAssign => {
            let target = arena.get(expr).get_target();
            build_wait_for_target(arena, wait, target, all, out);
            if let Some(v) = arena.get(expr).value {
                build_wait(arena, wait, v, all, out);
            }
            let waves: Vec<NodeKey> = arena
                .get(expr)
                .assocs
                .iter()
                .filter_map(|a| a.value())
                .collect();
            for w in waves {
                build_wait(arena, wait, w, all, out);
            }
        }

        NodeKind::StmtVarAssign => {
            let target = arena.get(expr).get_target();
            build_wait_for_target(arena, wait, target, all, out);
            if let Some(v) = arena.get(expr).value {
                build_wait(arena, wait, v, all, out);
            }
        }

        NodeKind::StmtCase => {
            if let Some(v) = arena.get(expr).value {
                build_wait(arena, wait, v, all, out);
            }
            let values: Vec<NodeKey> = arena
                .get(expr)
                .assocs
                .iter()
                .filter_map(|a| a.value())
                .collect();
            for v in values {
                build_wait(arena, wait, v, all, out);
            }
        }

        NodeKind::StmtFor => {
            if let Some(r) = arena.get(expr).get_range() {
                build_wait(arena, wait, r, all, out);
            }
            let stmts: Vec<NodeKey> = arena.get(expr).stmts.iter().copied().collect();
            for s in stmts {
                build_wait(arena, wait, s, all, out);
            }
        }

        NodeKind::StmtWhile => {
            let cond = arena.get(expr).get_cond();
            build_wait(arena, wait, cond, all, out);
            let stmts: Vec<NodeKey> = arena.get(expr).stmts.iter().copied().collect();
            for s in stmts {
                build_wait(arena, wait, s, all, out);
            }
        }

        NodeKind::ExprRange => {
            use crate::ast::node::RangeKind;
            match arena.get(expr).range_kind {
                Some(RangeKind::RangeAttribute) | Some(RangeKind::ReverseRangeAttribute) => {
                    if let Some(v) = arena.get(expr).value {
                        build_wait(arena, wait, v, all, out);
                    }
                }
                _ => {
                    let l = arena.get(expr).get_left();
                    let r = arena.get(expr).get_right();
                    build_wait(arena, wait, l, all, out);
                    build_wait(arena, wait, r, all, out);
                }
            }
        }

        other => fatal(format!(
            "sensitivity-list builder reached unsupported node kind {other:?}"
        )),
    }
}

/// `T_FCALL`/`T_PCALL` (spec §4.3 "Function or procedure call"): recurse
/// into each actual whose formal has mode `in`/`inout`; when `all` is set
/// and the callee has a body, also recurse into the body.
fn build_wait_call(arena: &Arena, wait: NodeKey, call: NodeKey, all: bool, out: &mut Vec<NodeKey>) {
    use crate::ast::node::PortMode;

    let Some(decl) = arena.get(call).get_ref() else {
        return;
    };
    let ports: Vec<NodeKey> = arena.get(decl).ports.iter().copied().collect();
    let params: Vec<NodeKey> = arena
        .get(call)
        .params
        .iter()
        .filter_map(|p| p.value())
        .collect();

    for (i, &value) in params.iter().enumerate() {
        let mode = ports
            .get(i)
            .and_then(|&p| arena.get(p).port_mode)
            .unwrap_or(PortMode::In);
        if matches!(mode, PortMode::In | PortMode::InOut) {
            build_wait(arena, wait, value, all, out);
        }
    }

    if all && arena.get(decl).kind == NodeKind::DeclProc {
        build_wait(arena, wait, decl, all, out);
    }
}

/// Entry point the driver calls (spec §4.4 "Process"/"Wait"/"Concurrent
/// ..."): walk `expr`, appending every collected trigger to `wait`.
pub fn build_wait_into(arena: &mut Arena, wait: NodeKey, expr: NodeKey, all: bool) {
    let mut out = Vec::new();
    build_wait(arena, wait, expr, all, &mut out);
    for t in out {
        arena.get_mut(wait).add_trigger(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::kind::NodeKind;
    use crate::ast::node::ObjectClass;
    use crate::diag::loc::Loc;

    fn signal_ref(arena: &mut Arena) -> (NodeKey, NodeKey) {
        let decl = arena.new_node(NodeKind::DeclSignal, Loc::unknown());
        arena.get_mut(decl).set_class(ObjectClass::Signal);
        let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r).set_ref(Some(decl));
        (decl, r)
    }

    #[test]
    fn simple_signal_reference_becomes_a_trigger() {
        let mut arena = Arena::new();
        let wait = arena.new_node(NodeKind::StmtWait, Loc::unknown());
        let (_, r) = signal_ref(&mut arena);
        build_wait_into(&mut arena, wait, r, false);
        assert_eq!(arena.get(wait).triggers.len(), 1);
    }

    #[test]
    fn duplicate_signal_references_dedupe() {
        let mut arena = Arena::new();
        let wait = arena.new_node(NodeKind::StmtWait, Loc::unknown());
        let decl = arena.new_node(NodeKind::DeclSignal, Loc::unknown());
        arena.get_mut(decl).set_class(ObjectClass::Signal);
        let r1 = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r1).set_ref(Some(decl));
        let r2 = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r2).set_ref(Some(decl));

        let block = arena.new_node(NodeKind::StmtBlock, Loc::unknown());
        arena.get_mut(block).add_stmt(r1);
        // Can't add an expr as a stmt for real, but build_wait only reads kinds.
        build_wait_into(&mut arena, wait, r1, false);
        build_wait_into(&mut arena, wait, r2, false);
        let _ = block;
        assert_eq!(arena.get(wait).triggers.len(), 1);
    }

    #[test]
    fn constant_reference_is_not_a_trigger() {
        let mut arena = Arena::new();
        let wait = arena.new_node(NodeKind::StmtWait, Loc::unknown());
        let decl = arena.new_node(NodeKind::DeclConst, Loc::unknown());
        let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r).set_ref(Some(decl));
        build_wait_into(&mut arena, wait, r, false);
        assert!(arena.get(wait).triggers.is_empty());
    }

    #[test]
    fn literal_index_into_signal_array_yields_one_trigger_for_the_whole_expression() {
        let mut arena = Arena::new();
        let wait = arena.new_node(NodeKind::StmtWait, Loc::unknown());
        let (_, arr_ref) = signal_ref(&mut arena);
        let idx = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena
            .get_mut(idx)
            .set_literal(crate::ast::node::Literal::Integer(0));
        let aref = arena.new_node(NodeKind::ExprArrayRef, Loc::unknown());
        arena.get_mut(aref).set_operand(arr_ref);
        arena
            .get_mut(aref)
            .add_param(crate::ast::node::ParamEntry::Positional { value: idx });

        build_wait_into(&mut arena, wait, aref, false);
        assert_eq!(arena.get(wait).triggers.len(), 1);
        assert_eq!(arena.get(wait).triggers[0], aref);
    }

    #[test]
    fn non_static_index_recurses_into_prefix_and_index() {
        let mut arena = Arena::new();
        let wait = arena.new_node(NodeKind::StmtWait, Loc::unknown());
        let (_, arr_ref) = signal_ref(&mut arena);
        let (_, idx_ref) = signal_ref(&mut arena);
        let aref = arena.new_node(NodeKind::ExprArrayRef, Loc::unknown());
        arena.get_mut(aref).set_operand(arr_ref);
        arena
            .get_mut(aref)
            .add_param(crate::ast::node::ParamEntry::Positional { value: idx_ref });

        build_wait_into(&mut arena, wait, aref, false);
        // Both the array signal and the index signal become separate triggers.
        assert_eq!(arena.get(wait).triggers.len(), 2);
    }
}
