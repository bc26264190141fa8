//! Mark-and-sweep collection (spec §4.1 `gc`).
//!
//! Ordinary traversals (`visit`/`rewrite`/`copy`) only follow structural
//! children — they never chase a `ref` cross-link, because that would
//! make "deep copy a declaration" accidentally also deep-copy every other
//! declaration it happens to reference. `gc` is the one traversal that
//! *does* follow `ref`, in what spec §9 calls "`deep` mode": a declaration
//! is alive if a live expression anywhere names it, not just if it's
//! nested under a live scope.

use crate::ast::arena::Arena;
use crate::ast::node::{NodeKey, INVALID_NODE_KEY};
use rustc_hash::FxHashMap;
use roaring::RoaringBitmap;

impl Arena {
    /// Mark every node reachable from `roots` (structural children plus,
    /// in deep mode, `ref` links) and free the rest. Returns the number of
    /// nodes freed.
    ///
    /// The mark set is a [`RoaringBitmap`] rather than a hash set: node
    /// keys are dense `u32` indices into the arena, exactly the case a
    /// compressed bitmap is built for, and it hands back the reachable set
    /// already in ascending order for the sweep below.
    ///
    /// Remaps every node's internal key fields so indices stay contiguous
    /// after the sweep; callers must discard any `NodeKey` obtained before
    /// this call except the (remapped) roots returned alongside it.
    pub fn gc(&mut self, roots: &[NodeKey]) -> GcResult {
        let mut reachable = RoaringBitmap::new();
        let mut stack: Vec<NodeKey> = roots.iter().copied().filter(|&k| k != INVALID_NODE_KEY).collect();
        while let Some(key) = stack.pop() {
            if !reachable.insert(key) {
                continue;
            }
            let node = self.get(key);
            for child in node.children() {
                if child != INVALID_NODE_KEY && !reachable.contains(child) {
                    stack.push(child);
                }
            }
            if let Some(r) = node.reference {
                if r != INVALID_NODE_KEY && !reachable.contains(r) {
                    stack.push(r);
                }
            }
        }

        let total = self.len();
        let freed = total - reachable.len() as usize;

        let ordered: Vec<NodeKey> = reachable.iter().collect();
        let mut remap: FxHashMap<NodeKey, NodeKey> = FxHashMap::default();
        for (new_key, &old_key) in ordered.iter().enumerate() {
            remap.insert(old_key, new_key as NodeKey);
        }

        let mut new_nodes = Vec::with_capacity(ordered.len());
        for &old_key in &ordered {
            let mut node = self.get(old_key).clone();
            remap_node_keys(&mut node, &remap);
            new_nodes.push(node);
        }

        self.replace_nodes(new_nodes);

        let new_roots = roots
            .iter()
            .map(|&k| remap.get(&k).copied().unwrap_or(INVALID_NODE_KEY))
            .collect();

        GcResult { freed, new_roots }
    }
}

/// Result of a collection pass: how many nodes were reclaimed, and the
/// roots' keys after the sweep renumbered the arena.
#[derive(Debug, Clone)]
pub struct GcResult {
    pub freed: usize,
    pub new_roots: Vec<NodeKey>,
}

fn remap_key(k: NodeKey, remap: &FxHashMap<NodeKey, NodeKey>) -> NodeKey {
    if k == INVALID_NODE_KEY {
        INVALID_NODE_KEY
    } else {
        *remap.get(&k).unwrap_or(&INVALID_NODE_KEY)
    }
}

fn remap_opt(k: &mut Option<NodeKey>, remap: &FxHashMap<NodeKey, NodeKey>) {
    if let Some(v) = k {
        *v = remap_key(*v, remap);
    }
}

fn remap_node_keys(node: &mut crate::ast::node::Node, remap: &FxHashMap<NodeKey, NodeKey>) {
    use crate::ast::node::{Literal, ParamEntry};

    for list in [
        &mut node.ports,
        &mut node.generics,
        &mut node.decls,
        &mut node.stmts,
        &mut node.else_stmts,
        &mut node.waveforms,
        &mut node.triggers,
    ] {
        for key in list.iter_mut() {
            *key = remap_key(*key, remap);
        }
    }

    for entries in [&mut node.assocs, &mut node.params, &mut node.genmaps] {
        for entry in entries.iter_mut() {
            *entry = match std::mem::replace(entry, ParamEntry::Open) {
                ParamEntry::Positional { value } => ParamEntry::Positional {
                    value: remap_key(value, remap),
                },
                ParamEntry::Named { name, value } => ParamEntry::Named {
                    name,
                    value: remap_key(value, remap),
                },
                ParamEntry::Others { value } => ParamEntry::Others {
                    value: remap_key(value, remap),
                },
                ParamEntry::Range { range, value } => ParamEntry::Range {
                    range: remap_key(range, remap),
                    value: remap_key(value, remap),
                },
                ParamEntry::Choice { choice, value } => ParamEntry::Choice {
                    choice: remap_key(choice, remap),
                    value: remap_key(value, remap),
                },
                ParamEntry::Open => ParamEntry::Open,
            };
        }
    }

    remap_opt(&mut node.value, remap);
    remap_opt(&mut node.operand, remap);
    remap_opt(&mut node.target, remap);
    remap_opt(&mut node.reference, remap);
    remap_opt(&mut node.type_of, remap);
    remap_opt(&mut node.range, remap);
    remap_opt(&mut node.severity, remap);
    remap_opt(&mut node.message, remap);
    remap_opt(&mut node.delay, remap);
    remap_opt(&mut node.guard_expr, remap);
    remap_opt(&mut node.cond, remap);
    remap_opt(&mut node.left, remap);
    remap_opt(&mut node.right, remap);

    match &mut node.literal {
        Some(Literal::Physical { unit, .. }) => *unit = remap_key(*unit, remap),
        Some(Literal::EnumLit(key)) => *key = remap_key(*key, remap),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::kind::NodeKind;
    use crate::ast::node::Literal;
    use crate::diag::loc::Loc;

    #[test]
    fn gc_frees_unreachable_nodes() {
        let mut arena = Arena::new();
        let live = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(live).set_literal(Literal::Integer(1));
        let _dead = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());

        let result = arena.gc(&[live]);
        assert_eq!(result.freed, 1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn gc_follows_ref_in_deep_mode() {
        let mut arena = Arena::new();
        let decl = arena.new_node(NodeKind::DeclConst, Loc::unknown());
        let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
        arena.get_mut(r).set_ref(Some(decl));

        let result = arena.gc(&[r]);
        assert_eq!(result.freed, 0);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn gc_remaps_child_indices() {
        let mut arena = Arena::new();
        let _dead = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        let a = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(a).set_literal(Literal::Integer(7));
        let block = arena.new_node(NodeKind::StmtBlock, Loc::unknown());
        arena.get_mut(block).add_stmt(a);

        let result = arena.gc(&[block]);
        let new_block = result.new_roots[0];
        let child = arena.get(new_block).stmts[0];
        assert_eq!(arena.get(child).get_literal(), &Literal::Integer(7));
    }
}
