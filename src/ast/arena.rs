//! The tree arena: owns every node, assigns generations, and implements
//! `visit`/`rewrite`/`copy` (spec §4.1).
//!
//! Spec §3 describes node ownership as "a single process-wide tree arena"
//! with DAG-shaped children held by reference. This crate models that as
//! an explicit `Arena` value the caller threads through the pipeline
//! (rather than a literal global), which keeps the "not thread-safe,
//! mutated only from the main compilation thread" rule of spec §5 true by
//! construction instead of by convention: there's no `unsafe`, no
//! `thread_local!`, and nothing to accidentally share across threads.

use crate::ast::kind::NodeKind;
use crate::ast::node::{Node, NodeKey, INVALID_NODE_KEY};
use crate::diag::loc::Loc;
use rustc_hash::FxHashMap;

/// Owns every live node and the monotonic generation counter used to
/// memoise traversals (spec §3 "Generation counter").
pub struct Arena {
    nodes: Vec<Node>,
    generation: u32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generation: 0,
        }
    }

    /// Allocate a new node (spec §4.1 `new(kind)`).
    pub fn new_node(&mut self, kind: NodeKind, loc: Loc) -> NodeKey {
        let key = self.nodes.len() as NodeKey;
        self.nodes.push(Node::new(kind, loc));
        key
    }

    pub fn get(&self, key: NodeKey) -> &Node {
        &self.nodes[key as usize]
    }

    pub fn get_mut(&mut self, key: NodeKey) -> &mut Node {
        &mut self.nodes[key as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Swap in a freshly renumbered node list (used by [`crate::ast::gc`]
    /// after a sweep has remapped every key).
    pub(crate) fn replace_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    /// Start a fresh pass: every node's generation tag becomes stale
    /// relative to the new counter value, so `visit`/`rewrite`/`copy` treat
    /// every node as unvisited again without having to walk the arena
    /// clearing flags.
    fn begin_pass(&mut self) -> u32 {
        self.generation += 1;
        self.generation
    }

    /// Visit every reachable node from `root` exactly once, in document
    /// order (spec §4.1 `visit`).
    pub fn visit(&mut self, root: NodeKey, mut f: impl FnMut(&Arena, NodeKey)) {
        let gen = self.begin_pass();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if key == INVALID_NODE_KEY {
                continue;
            }
            if self.nodes[key as usize].generation == gen {
                continue;
            }
            self.nodes[key as usize].generation = gen;
            f(self, key);
            let children = self.nodes[key as usize].children();
            stack.extend(children.into_iter().rev());
        }
    }

    /// As `visit`, but only invokes `f` for nodes of `kind` (spec §4.1
    /// `visit_only`). Every reachable node is still walked for children;
    /// only the callback is filtered.
    pub fn visit_only(
        &mut self,
        root: NodeKey,
        kind: NodeKind,
        mut f: impl FnMut(&Arena, NodeKey),
    ) where
        NodeKind: PartialEq,
    {
        self.visit(root, |arena, key| {
            if arena.get(key).kind == kind {
                f(arena, key);
            }
        });
    }

    /// Pre-order `pre`, recurse into children, then post-order `post`;
    /// `post`'s return value replaces the node, `None` deletes it (spec
    /// §4.1 `rewrite`). Memoises: a subtree reached through more than one
    /// parent is rewritten once, and every later encounter reuses the
    /// first result — this is what keeps a DAG a DAG after rewriting
    /// instead of re-expanding shared subtrees into separate copies.
    pub fn rewrite(
        &mut self,
        root: NodeKey,
        mut pre: impl FnMut(&mut Arena, NodeKey),
        mut post: impl FnMut(&mut Arena, NodeKey) -> Option<NodeKey>,
    ) -> Option<NodeKey> {
        self.begin_pass();
        let mut memo = FxHashMap::default();
        self.rewrite_inner(root, &mut pre, &mut post, &mut memo)
    }

    fn rewrite_inner(
        &mut self,
        key: NodeKey,
        pre: &mut impl FnMut(&mut Arena, NodeKey),
        post: &mut impl FnMut(&mut Arena, NodeKey) -> Option<NodeKey>,
        memo: &mut FxHashMap<NodeKey, Option<NodeKey>>,
    ) -> Option<NodeKey> {
        if key == INVALID_NODE_KEY {
            return None;
        }
        if let Some(result) = memo.get(&key) {
            return *result;
        }
        pre(self, key);

        macro_rules! rewrite_list {
            ($field:ident) => {{
                let old = std::mem::take(&mut self.get_mut(key).$field);
                let mut new_list = crate::ast::node::NodeList::new();
                for child in old {
                    if let Some(replaced) = self.rewrite_inner(child, pre, post, memo) {
                        new_list.push(replaced);
                    }
                }
                self.get_mut(key).$field = new_list;
            }};
        }
        rewrite_list!(ports);
        rewrite_list!(generics);
        rewrite_list!(decls);
        rewrite_list!(stmts);
        rewrite_list!(else_stmts);
        rewrite_list!(waveforms);
        rewrite_list!(triggers);

        macro_rules! rewrite_entries {
            ($field:ident) => {{
                let old = std::mem::take(&mut self.get_mut(key).$field);
                let mut new_list = smallvec::SmallVec::new();
                for entry in old {
                    new_list.push(self.rewrite_entry(entry, pre, post, memo));
                }
                self.get_mut(key).$field = new_list;
            }};
        }
        rewrite_entries!(assocs);
        rewrite_entries!(params);
        rewrite_entries!(genmaps);

        self.rewrite_optional_fields(key, pre, post, memo);

        let result = post(self, key);
        memo.insert(key, result);
        result
    }

    fn rewrite_entry(
        &mut self,
        entry: crate::ast::node::ParamEntry,
        pre: &mut impl FnMut(&mut Arena, NodeKey),
        post: &mut impl FnMut(&mut Arena, NodeKey) -> Option<NodeKey>,
        memo: &mut FxHashMap<NodeKey, Option<NodeKey>>,
    ) -> crate::ast::node::ParamEntry {
        use crate::ast::node::ParamEntry::*;
        match entry {
            Positional { value } => Positional {
                value: self
                    .rewrite_inner(value, pre, post, memo)
                    .unwrap_or(value),
            },
            Named { name, value } => Named {
                name,
                value: self
                    .rewrite_inner(value, pre, post, memo)
                    .unwrap_or(value),
            },
            Others { value } => Others {
                value: self
                    .rewrite_inner(value, pre, post, memo)
                    .unwrap_or(value),
            },
            Range { range, value } => Range {
                range: self
                    .rewrite_inner(range, pre, post, memo)
                    .unwrap_or(range),
                value: self
                    .rewrite_inner(value, pre, post, memo)
                    .unwrap_or(value),
            },
            Choice { choice, value } => Choice {
                choice: self
                    .rewrite_inner(choice, pre, post, memo)
                    .unwrap_or(choice),
                value: self
                    .rewrite_inner(value, pre, post, memo)
                    .unwrap_or(value),
            },
            Open => Open,
        }
    }

    fn rewrite_optional_fields(
        &mut self,
        key: NodeKey,
        pre: &mut impl FnMut(&mut Arena, NodeKey),
        post: &mut impl FnMut(&mut Arena, NodeKey) -> Option<NodeKey>,
        memo: &mut FxHashMap<NodeKey, Option<NodeKey>>,
    ) {
        macro_rules! rewrite_field {
            ($field:ident) => {{
                if let Some(child) = self.get(key).$field {
                    self.get_mut(key).$field = self.rewrite_inner(child, pre, post, memo);
                }
            }};
        }
        rewrite_field!(value);
        rewrite_field!(operand);
        rewrite_field!(target);
        rewrite_field!(type_of);
        rewrite_field!(range);
        rewrite_field!(severity);
        rewrite_field!(message);
        rewrite_field!(delay);
        rewrite_field!(guard_expr);
        rewrite_field!(cond);
        rewrite_field!(left);
        rewrite_field!(right);
        // `reference` (the `ref` cross-link) is deliberately not rewritten
        // here: it names a declaration elsewhere in the tree (possibly
        // outside the subtree being rewritten) and must keep pointing at
        // whatever that declaration rewrites to, which the driver's rules
        // re-resolve explicitly rather than via blind structural descent.
    }

    /// Deep copy `root`, memoising so shared subgraphs stay shared in the
    /// copy (spec §4.1 `copy`).
    pub fn copy(&mut self, root: NodeKey) -> NodeKey {
        self.begin_pass();
        let mut memo = FxHashMap::default();
        self.copy_inner(root, &mut memo)
    }

    fn copy_inner(&mut self, key: NodeKey, memo: &mut FxHashMap<NodeKey, NodeKey>) -> NodeKey {
        if key == INVALID_NODE_KEY {
            return INVALID_NODE_KEY;
        }
        if let Some(&copied) = memo.get(&key) {
            return copied;
        }
        let mut node = self.get(key).clone();
        let new_key = self.nodes.len() as NodeKey;
        // Reserve the slot before recursing, mirroring the serialised
        // reader's "reserve the slot before recursing so upward
        // references resolve" rule (spec §4.1) — here that matters for
        // cyclic `ref` links rather than upward back-references.
        self.nodes.push(node.clone());
        memo.insert(key, new_key);

        macro_rules! copy_list {
            ($field:ident) => {{
                let mut new_list = crate::ast::node::NodeList::new();
                for child in std::mem::take(&mut node.$field) {
                    new_list.push(self.copy_inner(child, memo));
                }
                node.$field = new_list;
            }};
        }
        copy_list!(ports);
        copy_list!(generics);
        copy_list!(decls);
        copy_list!(stmts);
        copy_list!(else_stmts);
        copy_list!(waveforms);
        copy_list!(triggers);

        macro_rules! copy_opt {
            ($field:ident) => {{
                if let Some(child) = node.$field {
                    node.$field = Some(self.copy_inner(child, memo));
                }
            }};
        }
        copy_opt!(value);
        copy_opt!(operand);
        copy_opt!(target);
        copy_opt!(type_of);
        copy_opt!(range);
        copy_opt!(severity);
        copy_opt!(message);
        copy_opt!(delay);
        copy_opt!(guard_expr);
        copy_opt!(cond);
        copy_opt!(left);
        copy_opt!(right);
        // `reference` is remapped, not recursively copied: it must point
        // at the copy of whatever it referenced if that declaration was
        // itself reachable from `root` (and so already has a `memo`
        // entry by the time we get here only if it was copied first);
        // otherwise it keeps pointing at the original, shared declaration.
        if let Some(r) = node.reference {
            if let Some(&copied) = memo.get(&r) {
                node.reference = Some(copied);
            }
        }
        // Same treatment for a literal's embedded declaration link
        // (a physical literal's unit, an enum literal's declaration).
        match &mut node.literal {
            Some(crate::ast::node::Literal::Physical { unit, .. }) => {
                if let Some(&copied) = memo.get(unit) {
                    *unit = copied;
                }
            }
            Some(crate::ast::node::Literal::EnumLit(decl)) => {
                if let Some(&copied) = memo.get(decl) {
                    *decl = copied;
                }
            }
            _ => {}
        }

        macro_rules! copy_entries {
            ($field:ident) => {{
                let mut new_list = smallvec::SmallVec::new();
                for entry in std::mem::take(&mut node.$field) {
                    new_list.push(self.copy_param_entry(entry, memo));
                }
                node.$field = new_list;
            }};
        }
        copy_entries!(assocs);
        copy_entries!(params);
        copy_entries!(genmaps);

        self.nodes[new_key as usize] = node;
        new_key
    }

    fn copy_param_entry(
        &mut self,
        entry: crate::ast::node::ParamEntry,
        memo: &mut FxHashMap<NodeKey, NodeKey>,
    ) -> crate::ast::node::ParamEntry {
        use crate::ast::node::ParamEntry::*;
        match entry {
            Positional { value } => Positional {
                value: self.copy_inner(value, memo),
            },
            Named { name, value } => Named {
                name,
                value: self.copy_inner(value, memo),
            },
            Others { value } => Others {
                value: self.copy_inner(value, memo),
            },
            Range { range, value } => Range {
                range: self.copy_inner(range, memo),
                value: self.copy_inner(value, memo),
            },
            Choice { choice, value } => Choice {
                choice: self.copy_inner(choice, memo),
                value: self.copy_inner(value, memo),
            },
            Open => Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::loc::Loc;

    fn lit(arena: &mut Arena, v: i64) -> NodeKey {
        let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(k).set_literal(crate::ast::node::Literal::Integer(v));
        k
    }

    #[test]
    fn visit_each_node_once_even_with_shared_subtree() {
        let mut arena = Arena::new();
        let shared = lit(&mut arena, 1);
        let block = arena.new_node(NodeKind::StmtBlock, Loc::unknown());
        arena.get_mut(block).add_stmt(shared);
        arena.get_mut(block).add_stmt(shared);

        let mut count = 0;
        arena.visit(block, |_, _| count += 1);
        // block + shared literal, each exactly once despite the double edge.
        assert_eq!(count, 2);
    }

    #[test]
    fn rewrite_deletes_on_none() {
        let mut arena = Arena::new();
        let a = lit(&mut arena, 1);
        let b = lit(&mut arena, 2);
        let block = arena.new_node(NodeKind::StmtBlock, Loc::unknown());
        arena.get_mut(block).add_stmt(a);
        arena.get_mut(block).add_stmt(b);

        let result = arena
            .rewrite(
                block,
                |_, _| {},
                |arena, key| {
                    if arena.get(key).kind == NodeKind::ExprLiteral {
                        if let crate::ast::node::Literal::Integer(1) = arena.get(key).get_literal()
                        {
                            return None;
                        }
                    }
                    Some(key)
                },
            )
            .unwrap();
        assert_eq!(arena.get(result).stmts.len(), 1);
    }

    #[test]
    fn copy_preserves_sharing() {
        let mut arena = Arena::new();
        let shared = lit(&mut arena, 42);
        let block = arena.new_node(NodeKind::StmtBlock, Loc::unknown());
        arena.get_mut(block).add_stmt(shared);
        arena.get_mut(block).add_stmt(shared);

        let copied = arena.copy(block);
        assert_eq!(arena.get(copied).stmts[0], arena.get(copied).stmts[1]);
        assert_ne!(arena.get(copied).stmts[0], shared);
    }
}
