//! Per-kind rewrite rules (spec §4.4), grounded on `simp.c`'s dispatch
//! switch (`simp_tree`) and the individual `simp_*` functions it calls.
//!
//! [`post`] is the driver's post-descent callback (spec §2 "Control
//! flow"): by the time it runs for a node, every structural child has
//! already been rewritten (or deleted), so a rule only ever needs to read
//! already-simplified children — it never has to recurse itself.

use std::cell::RefCell;

use crate::ast::arena::Arena;
use crate::ast::ident::IdentTable;
use crate::ast::kind::NodeKind;
use crate::ast::node::{AttrKind, AttrValue, Literal, NodeKey, ParamEntry, RangeKind};
use crate::config::EvalFlags;
use crate::diag::diagnostic::{Diagnostic, Diagnostics, Level};
use crate::diag::loc::Loc;
use crate::error::fatal;
use crate::simp::fold::{fold_possible, FoldPossible};
use crate::simp::generic::{self, FormalNameFlag, GenericScope};
use crate::simp::subprogram::ClassAttrs;
use crate::thunk::{FoldedScalar, ThunkCompiler};

/// Everything a rule needs beyond the arena and the generic-scope stack
/// (which lives in its own `RefCell` — see [`crate::Driver`] — because
/// both the pre- and post-descent callbacks need it).
pub struct RuleEnv<'a, T: ThunkCompiler> {
    pub idents: &'a mut IdentTable,
    pub diags: &'a mut Diagnostics,
    pub classes: &'a ClassAttrs,
    pub thunk: &'a T,
    pub flags: EvalFlags,
    pub formal_flag: &'a FormalNameFlag,
    pub imp_signals: &'a mut Vec<(NodeKey, NodeKey)>,
    /// Set once the diagnostic emitter reports the error-limit has been
    /// reached (spec §4.2, §7); the driver checks this after the pass
    /// completes rather than unwinding mid-rewrite, matching spec §5's
    /// "cancellation is coarse-grained: abandon the whole pass".
    pub error_limit_hit: Option<u32>,
}

/// The driver's post-descent callback (spec §2).
pub fn post<T: ThunkCompiler>(
    arena: &mut Arena,
    env: &mut RuleEnv<T>,
    generics: &RefCell<Vec<GenericScope>>,
    key: NodeKey,
) -> Option<NodeKey> {
    use NodeKind::*;
    match arena.get(key).kind {
        ExprFCall => {
            normalize_call_args(arena, key);
            try_fold_call(arena, env, key)
        }
        StmtPCall => {
            normalize_call_args(arena, key);
            Some(key)
        }
        ConcPCall => {
            normalize_call_args(arena, key);
            simp_concurrent(arena, key)
        }
        ExprRef => {
            let scopes = generics.borrow();
            simp_ref(arena, env.formal_flag, &scopes, key)
        }
        ExprAttrRef => dispatch_attr_ref(arena, env, key),
        ExprArrayRef => simp_array_ref(arena, key),
        ExprRecordRef => simp_record_ref(arena, key),
        StmtCase => simp_case(arena, key),
        StmtIf => simp_if(arena, key),
        StmtWhile => simp_while(arena, key),
        StmtAssert => simp_assert(arena, key),
        ConcAssert => {
            let cond = arena.get(key).get_cond();
            if as_bool_literal(arena, cond) == Some(true) {
                None
            } else {
                simp_concurrent(arena, key)
            }
        }
        IfGenerate => simp_if_generate(arena, key),
        StmtProcess => simp_process(arena, env.idents, key),
        StmtWait => simp_wait(arena, key),
        ConcSignalAssign | ConcSelectedAssign => simp_concurrent(arena, key),
        ExprLiteral => simp_literal(arena, key),
        ExprRange => simp_range(arena, key),
        DeclFunc | DeclProc => simp_subprogram_decl(arena, env.classes, key),
        Block | Instance | Binding => {
            let scope = generics.borrow_mut().pop().unwrap_or_default();
            generic::rebuild_positional(arena, key, &scope);
            Some(key)
        }
        _ => Some(key),
    }
}

// ---------------------------------------------------------------------
// Function/procedure calls (spec §4.4 "Function/procedure calls").
// ---------------------------------------------------------------------

/// `simp_call_args`: match named/positional/open actuals against the
/// callee's ports in declaration order and rewrite `params` to be fully
/// positional, substituting each port's default for an `open` or omitted
/// actual (spec §3 Invariant 2).
fn normalize_call_args(arena: &mut Arena, key: NodeKey) {
    let Some(decl) = arena.get(key).get_ref() else {
        return;
    };
    let ports: Vec<NodeKey> = arena.get(decl).ports.iter().copied().collect();
    let old_params: Vec<ParamEntry> = arena.get(key).params.to_vec();

    let mut positional: Vec<Option<NodeKey>> = vec![None; ports.len()];
    for (i, p) in old_params.iter().enumerate() {
        match p {
            ParamEntry::Positional { value } => {
                if let Some(slot) = positional.get_mut(i) {
                    *slot = Some(*value);
                }
            }
            ParamEntry::Named { name, value } => {
                if let Some(idx) = ports
                    .iter()
                    .position(|&port| arena.get(port).ident == Some(*name))
                {
                    positional[idx] = Some(*value);
                }
            }
            _ => {}
        }
    }

    let mut rebuilt: smallvec::SmallVec<[ParamEntry; 4]> = smallvec::SmallVec::new();
    for (i, &port) in ports.iter().enumerate() {
        let value = positional[i].or_else(|| {
            if arena.get(port).kind.has_value() {
                arena.get(port).get_value()
            } else {
                None
            }
        });
        match value {
            Some(v) => rebuilt.push(ParamEntry::Positional { value: v }),
            None => fatal("call actual missing and the corresponding port has no default"),
        }
    }
    arena.get_mut(key).params = rebuilt;
}

/// `simp_fcall`/`fold_possible`/`simp_fold` (spec §4.4, §4.5): attempt to
/// fold a (now positionally-normalised) function call to a literal.
fn try_fold_call<T: ThunkCompiler>(arena: &mut Arena, env: &mut RuleEnv<T>, key: NodeKey) -> Option<NodeKey> {
    match fold_possible(arena, env.idents, env.classes, env.flags, key) {
        FoldPossible::Yes => {
            if let Some(thunk) = env.thunk.lower(arena, env.idents, key) {
                if let Ok(scalar) = env.thunk.evaluate(&thunk) {
                    return Some(materialize_scalar(arena, key, scalar));
                }
            }
            Some(key)
        }
        FoldPossible::No(reason) => {
            if env.flags.contains(EvalFlags::EVAL_WARN) {
                let loc = arena.get(key).loc;
                let diag = Diagnostic::new(Level::Warning, loc, format!("not folded: {reason}"));
                if let Err(crate::error::SimpError::ErrorLimitReached { limit }) = env.diags.emit(diag) {
                    env.error_limit_hit = Some(limit);
                }
            }
            Some(key)
        }
    }
}

fn materialize_scalar(arena: &mut Arena, original: NodeKey, scalar: FoldedScalar) -> NodeKey {
    let loc = arena.get(original).loc;
    let lit = arena.new_node(NodeKind::ExprLiteral, loc);
    arena.get_mut(lit).set_literal(match scalar {
        FoldedScalar::Integer(v) => Literal::Integer(v),
        FoldedScalar::Real(v) => Literal::Real(v),
        FoldedScalar::EnumLit(decl) => Literal::EnumLit(decl),
    });
    if arena.get(original).kind.has_type() {
        if let Some(t) = arena.get(original).get_type() {
            arena.get_mut(lit).set_type(Some(t));
        }
    }
    lit
}

// ---------------------------------------------------------------------
// References (spec §4.4 "References").
// ---------------------------------------------------------------------

fn simp_ref(
    arena: &mut Arena,
    flag: &FormalNameFlag,
    scopes: &[GenericScope],
    key: NodeKey,
) -> Option<NodeKey> {
    if let Some(actual) = generic::substitute_reference(arena, flag, scopes, key) {
        return Some(actual);
    }
    let Some(decl) = arena.get(key).get_ref() else {
        return Some(key);
    };
    match arena.get(decl).kind {
        NodeKind::DeclConst => match arena.get(decl).get_value() {
            Some(init) if is_scalar_foldable_initializer(arena, init) => Some(init),
            _ => Some(key),
        },
        NodeKind::DeclUnit => match arena.get(decl).get_value() {
            Some(init) => Some(init),
            None => Some(key),
        },
        _ => Some(key),
    }
}

/// Stand-in for "the type is scalar" (spec §4.4): this AST doesn't carry a
/// type system (see `thunk.rs`'s documented narrowing), so a constant's
/// initialiser is treated as scalar-foldable exactly when it's already a
/// literal or a reference to an enumeration literal — the two shapes a
/// scalar initialiser can actually take in this tree.
fn is_scalar_foldable_initializer(arena: &Arena, init: NodeKey) -> bool {
    match arena.get(init).kind {
        NodeKind::ExprLiteral => true,
        NodeKind::ExprRef => arena
            .get(init)
            .get_ref()
            .map(|d| arena.get(d).kind == NodeKind::DeclEnumLit)
            .unwrap_or(false),
        _ => false,
    }
}

// ---------------------------------------------------------------------
// Attribute references (spec §4.4 "Attribute references").
// ---------------------------------------------------------------------

fn dispatch_attr_ref<T: ThunkCompiler>(arena: &mut Arena, env: &mut RuleEnv<T>, key: NodeKey) -> Option<NodeKey> {
    match arena.get(key).attr_kind {
        Some(AttrKind::Delayed) | Some(AttrKind::Transaction) => {
            Some(simp_attr_delayed_transaction(arena, env.idents, env.imp_signals, key))
        }
        Some(AttrKind::Pos) => simp_attr_pos(arena, key),
        Some(AttrKind::Length)
        | Some(AttrKind::Left)
        | Some(AttrKind::Right)
        | Some(AttrKind::Low)
        | Some(AttrKind::High)
        | Some(AttrKind::Ascending) => simp_attr_dimension(arena, key),
        _ => Some(key),
    }
}

/// `simp_attr_delayed_transaction` (spec §4.4, SPEC_FULL Open Questions):
/// synthesise an implicit signal and driver process, record the pair for
/// the driver to splice into the declarative region once the whole pass
/// completes (spec §9's "generic substitution as a scoped context" doesn't
/// cover this, but the same "collect now, commit once" shape applies: an
/// attribute reference can't add a sibling declaration to its own
/// enclosing scope mid-traversal without invalidating the list the
/// traversal is iterating).
fn simp_attr_delayed_transaction(
    arena: &mut Arena,
    idents: &mut IdentTable,
    imp_signals: &mut Vec<(NodeKey, NodeKey)>,
    key: NodeKey,
) -> NodeKey {
    let loc = arena.get(key).loc;
    let prefix = arena.get(key).get_operand();
    let kind = arena.get(key).attr_kind;
    let prefix_decl = match arena.get(prefix).kind {
        NodeKind::ExprRef => arena.get(prefix).get_ref(),
        _ => None,
    };
    let prefix_name = prefix_decl
        .and_then(|d| arena.get(d).ident)
        .map(|i| idents.resolve(i).to_string())
        .unwrap_or_else(|| "sig".to_string());

    let new_name = match kind {
        Some(AttrKind::Delayed) => format!("delayed_{prefix_name}"),
        Some(AttrKind::Transaction) => format!("{prefix_name}_transaction"),
        _ => fatal("simp_attr_delayed_transaction called on a non-delayed/transaction attribute"),
    };

    let sig = arena.new_node(NodeKind::DeclSignal, loc);
    arena.get_mut(sig).ident = Some(idents.intern(&new_name));
    if let Some(t) = prefix_decl.and_then(|d| {
        if arena.get(d).kind.has_type() {
            arena.get(d).get_type()
        } else {
            None
        }
    }) {
        arena.get_mut(sig).set_type(Some(t));
    }

    let process = arena.new_node(NodeKind::StmtProcess, loc);
    let target_ref = arena.new_node(NodeKind::ExprRef, loc);
    arena.get_mut(target_ref).set_ref(Some(sig));

    match kind {
        Some(AttrKind::Delayed) => {
            // "use the prefix's initial value for 'delayed" (SPEC_FULL Open
            // Questions).
            if let Some(d) = prefix_decl {
                if arena.get(d).kind.has_value() {
                    if let Some(init) = arena.get(d).get_value() {
                        arena.get_mut(sig).set_value(Some(init));
                    }
                }
            }
            let delay = arena.get(key).params.first().and_then(|p| p.value());
            let assign = arena.new_node(NodeKind::StmtSignalAssign, loc);
            arena.get_mut(assign).set_target(target_ref);
            let wave = arena.new_node(NodeKind::Waveform, loc);
            arena.get_mut(wave).set_value(Some(prefix));
            arena.get_mut(wave).set_delay(delay);
            arena.get_mut(assign).add_waveform(wave);
            arena.get_mut(process).add_stmt(assign);
        }
        Some(AttrKind::Transaction) => {
            // "use the subtype default for 'transaction" (SPEC_FULL Open
            // Questions) — this AST has no type system to compute a
            // subtype default from (see `thunk.rs`), so `sig` is left
            // without an initial value rather than inventing one.
            let not_call = arena.new_node(NodeKind::ExprFCall, loc);
            arena.get_mut(not_call).ident = Some(idents.intern("not"));
            let self_ref = arena.new_node(NodeKind::ExprRef, loc);
            arena.get_mut(self_ref).set_ref(Some(sig));
            arena
                .get_mut(not_call)
                .add_param(ParamEntry::Positional { value: self_ref });
            let assign = arena.new_node(NodeKind::StmtSignalAssign, loc);
            arena.get_mut(assign).set_target(target_ref);
            let wave = arena.new_node(NodeKind::Waveform, loc);
            arena.get_mut(wave).set_value(Some(not_call));
            arena.get_mut(assign).add_waveform(wave);
            arena.get_mut(process).add_stmt(assign);
        }
        _ => unreachable!("guarded by the outer match in dispatch_attr_ref"),
    }

    let wait = arena.new_node(NodeKind::StmtWait, loc);
    arena.get_mut(wait).add_trigger(prefix);
    arena.get_mut(process).add_stmt(wait);

    imp_signals.push((sig, process));

    let result_ref = arena.new_node(NodeKind::ExprRef, loc);
    arena.get_mut(result_ref).set_ref(Some(sig));
    result_ref
}

/// `'pos` (spec §4.4): folds when its argument is itself an enumeration
/// literal (by position) or already an integer.
fn simp_attr_pos(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let Some(arg) = arena.get(key).params.first().and_then(|p| p.value()) else {
        return Some(key);
    };
    let loc = arena.get(key).loc;
    let pos = match arena.get(arg).kind {
        NodeKind::ExprRef => arena.get(arg).get_ref().and_then(|d| {
            (arena.get(d).kind == NodeKind::DeclEnumLit).then(|| arena.get(d).get_pos() as i64)
        }),
        NodeKind::ExprLiteral => match arena.get(arg).get_literal() {
            Literal::EnumLit(d) => Some(arena.get(*d).get_pos() as i64),
            Literal::Integer(v) => Some(*v),
            _ => None,
        },
        _ => None,
    };
    match pos {
        Some(p) => {
            let lit = arena.new_node(NodeKind::ExprLiteral, loc);
            arena.get_mut(lit).set_literal(Literal::Integer(p));
            Some(lit)
        }
        None => Some(key),
    }
}

/// `'length`/`'left`/`'right`/`'low`/`'high`/`'ascending` on a ranged
/// scalar/array subtype, or on an enumeration type directly (spec §4.4).
/// The unconstrained-array form spec §4.4 also names isn't reachable here:
/// this AST has no index-constraint cross-link to resolve it against (see
/// `thunk.rs`'s documented narrowing); such attribute references are left
/// unchanged rather than guessed at.
fn simp_attr_dimension(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let attr_kind = arena.get(key).attr_kind;
    let loc = arena.get(key).loc;
    let prefix = arena.get(key).get_operand();
    let Some(type_key) = (if arena.get(prefix).kind.has_type() {
        arena.get(prefix).get_type()
    } else {
        None
    }) else {
        return Some(key);
    };
    if arena.get(type_key).kind == NodeKind::DeclType {
        return simp_attr_dimension_enum(arena, type_key, attr_kind, loc).or(Some(key));
    }
    if arena.get(type_key).kind != NodeKind::DeclSubtype {
        return Some(key);
    }
    let Some(range) = arena.get(type_key).get_range() else {
        return Some(key);
    };
    if arena.get(range).kind != NodeKind::ExprRange {
        return Some(key);
    }
    let downto = arena.get(range).range_kind == Some(RangeKind::Downto);
    let left = arena.get(range).get_left();
    let right = arena.get(range).get_right();

    match attr_kind {
        Some(AttrKind::Left) => Some(left),
        Some(AttrKind::Right) => Some(right),
        Some(AttrKind::Low) => Some(if downto { right } else { left }),
        Some(AttrKind::High) => Some(if downto { left } else { right }),
        Some(AttrKind::Ascending) => Some(key),
        Some(AttrKind::Length) => {
            let (Some(lv), Some(rv)) = (as_int_literal(arena, left), as_int_literal(arena, right)) else {
                return Some(key);
            };
            let (low, high) = if downto { (rv, lv) } else { (lv, rv) };
            let len = (high - low + 1).max(0);
            let lit = arena.new_node(NodeKind::ExprLiteral, loc);
            arena.get_mut(lit).set_literal(Literal::Integer(len));
            Some(lit)
        }
        _ => Some(key),
    }
}

/// `'left`/`'right`/`'low`/`'high`/`'ascending` on an enumeration type
/// itself (`original_source/simp.c`'s `T_ENUM` branch): `'left`/`'low` is
/// the first declared literal, `'right`/`'high` the last, and
/// `'ascending` is unconditionally `true` — enumeration types have no
/// declared direction. `'length` isn't meaningful here and falls through
/// to `None`, leaving the attribute reference unchanged.
fn simp_attr_dimension_enum(
    arena: &mut Arena,
    type_key: NodeKey,
    attr_kind: Option<AttrKind>,
    loc: Loc,
) -> Option<NodeKey> {
    match attr_kind {
        Some(AttrKind::Left) | Some(AttrKind::Low) => arena.get(type_key).decls.first().copied(),
        Some(AttrKind::Right) | Some(AttrKind::High) => arena.get(type_key).decls.last().copied(),
        Some(AttrKind::Ascending) => {
            // No BOOLEAN type is reachable from here to borrow its `TRUE`
            // literal (this AST has no type system, see `thunk.rs`'s
            // documented narrowing), so synthesise the position-1
            // enumeration literal `as_bool_literal` already reads `true`
            // from, the same convention this crate's own tests use.
            let decl = arena.new_node(NodeKind::DeclEnumLit, loc);
            arena.get_mut(decl).set_pos(1);
            let r = arena.new_node(NodeKind::ExprRef, loc);
            arena.get_mut(r).set_ref(Some(decl));
            Some(r)
        }
        _ => None,
    }
}

fn as_int_literal(arena: &Arena, expr: NodeKey) -> Option<i64> {
    if arena.get(expr).kind != NodeKind::ExprLiteral {
        return None;
    }
    match arena.get(expr).get_literal() {
        Literal::Integer(v) => Some(*v),
        _ => None,
    }
}

fn range_bounds(arena: &Arena, range: NodeKey) -> Option<(i64, i64)> {
    if arena.get(range).kind != NodeKind::ExprRange {
        return None;
    }
    let left = as_int_literal(arena, arena.get(range).get_left())?;
    let right = as_int_literal(arena, arena.get(range).get_right())?;
    Some(if arena.get(range).range_kind == Some(RangeKind::Downto) {
        (right, left)
    } else {
        (left, right)
    })
}

/// VHDL's `BOOLEAN` declares `false` at position 0 and `true` at position
/// 1 (LRM); folded booleans in this AST are enumeration-literal references
/// (or embedded `Literal::EnumLit`s) into that two-valued type, so a
/// folded condition's truth value is exactly its position.
fn as_bool_literal(arena: &Arena, expr: NodeKey) -> Option<bool> {
    let decl = match arena.get(expr).kind {
        NodeKind::ExprRef => arena.get(expr).get_ref()?,
        NodeKind::ExprLiteral => match arena.get(expr).get_literal() {
            Literal::EnumLit(d) => *d,
            _ => return None,
        },
        _ => return None,
    };
    if arena.get(decl).kind != NodeKind::DeclEnumLit {
        return None;
    }
    match arena.get(decl).get_pos() {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Array ref / slice, record ref (spec §4.4).
// ---------------------------------------------------------------------

fn simp_array_ref(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let value = arena.get(key).get_operand();
    if arena.get(value).kind == NodeKind::ExprOpen {
        return Some(value);
    }
    let params: Vec<NodeKey> = arena.get(key).params.iter().filter_map(|p| p.value()).collect();
    if params.len() != 1 {
        return Some(key);
    }
    let Some(index) = as_int_literal(arena, params[0]) else {
        return Some(key);
    };
    match arena.get(value).kind {
        NodeKind::ExprAggregate => extract_aggregate(arena, value, index).or(Some(key)),
        NodeKind::ExprRef => {
            let agg = arena.get(value).get_ref().and_then(|d| {
                (arena.get(d).kind == NodeKind::DeclConst)
                    .then(|| arena.get(d).get_value())
                    .flatten()
                    .filter(|&v| arena.get(v).kind == NodeKind::ExprAggregate)
            });
            match agg {
                Some(agg) => extract_aggregate(arena, agg, index).or(Some(key)),
                None => Some(key),
            }
        }
        // `simp_extract_string_literal` (original_source/simp.c): indexing
        // a string literal yields the single character at that position,
        // modelled here as a one-character `Literal::Str` (this AST has no
        // dedicated character-literal kind, see `thunk.rs`'s narrowing).
        NodeKind::ExprLiteral => {
            let s = match arena.get(value).get_literal() {
                Literal::Str(s) => s.clone(),
                _ => return Some(key),
            };
            match s.chars().nth(index as usize) {
                Some(c) => {
                    let loc = arena.get(key).loc;
                    let lit = arena.new_node(NodeKind::ExprLiteral, loc);
                    arena.get_mut(lit).set_literal(Literal::Str(c.to_string()));
                    Some(lit)
                }
                None => Some(key),
            }
        }
        _ => Some(key),
    }
}

/// `simp_extract_aggregate` (spec §4.4 "Array ref / slice"): find the
/// association whose choice covers `index`, falling back to `others`.
fn extract_aggregate(arena: &Arena, agg: NodeKey, index: i64) -> Option<NodeKey> {
    let mut positional_pos: i64 = 0;
    let mut others: Option<NodeKey> = None;
    for assoc in &arena.get(agg).assocs {
        match assoc {
            ParamEntry::Positional { value } => {
                if positional_pos == index {
                    return Some(*value);
                }
                positional_pos += 1;
            }
            ParamEntry::Choice { choice, value } => {
                if as_int_literal(arena, *choice) == Some(index) {
                    return Some(*value);
                }
            }
            ParamEntry::Range { range, value } => {
                if let Some((lo, hi)) = range_bounds(arena, *range) {
                    if index >= lo && index <= hi {
                        return Some(*value);
                    }
                }
            }
            ParamEntry::Others { value } => others = Some(*value),
            ParamEntry::Named { .. } | ParamEntry::Open => {}
        }
    }
    others
}

fn simp_record_ref(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let value = arena.get(key).get_operand();
    if arena.get(value).kind == NodeKind::ExprOpen {
        return Some(value);
    }
    let field = arena.get(key).ident;
    let agg = match arena.get(value).kind {
        NodeKind::ExprAggregate => Some(value),
        NodeKind::ExprRef => arena.get(value).get_ref().and_then(|d| {
            (arena.get(d).kind == NodeKind::DeclConst)
                .then(|| arena.get(d).get_value())
                .flatten()
                .filter(|&v| arena.get(v).kind == NodeKind::ExprAggregate)
        }),
        _ => None,
    };
    if let Some(agg) = agg {
        for assoc in &arena.get(agg).assocs {
            if let ParamEntry::Named { name, value } = assoc {
                if Some(*name) == field {
                    return Some(*value);
                }
            }
        }
    }
    Some(key)
}

// ---------------------------------------------------------------------
// Case / if / while / assert / if-generate (spec §4.4).
// ---------------------------------------------------------------------

fn arm_is_empty(arena: &Arena, v: NodeKey) -> bool {
    arena.get(v).kind == NodeKind::StmtBlock && arena.get(v).stmts.is_empty()
}

fn simp_case(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    if arena.get(key).assocs.is_empty() {
        return None;
    }
    let Some(selector) = arena.get(key).value else {
        return Some(key);
    };
    let Some(sel) = as_int_literal(arena, selector) else {
        return Some(key);
    };
    let assocs: Vec<ParamEntry> = arena.get(key).assocs.to_vec();

    let mut matched: Option<NodeKey> = None;
    let mut others: Option<NodeKey> = None;
    for assoc in &assocs {
        match assoc {
            ParamEntry::Choice { choice, value } => {
                if as_int_literal(arena, *choice) == Some(sel) {
                    matched = Some(*value);
                    break;
                }
            }
            ParamEntry::Range { range, value } => {
                if let Some((lo, hi)) = range_bounds(arena, *range) {
                    if sel >= lo && sel <= hi {
                        matched = Some(*value);
                        break;
                    }
                }
            }
            ParamEntry::Others { value } => others = Some(*value),
            _ => {}
        }
    }

    match matched.or(others) {
        Some(v) if arm_is_empty(arena, v) => None,
        Some(v) => Some(v),
        None => Some(key),
    }
}

fn simp_if(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let cond = arena.get(key).get_cond();
    let Some(taken) = as_bool_literal(arena, cond) else {
        return Some(key);
    };
    let branch: Vec<NodeKey> = if taken {
        arena.get(key).stmts.to_vec()
    } else {
        arena.get(key).else_stmts.to_vec()
    };
    if branch.is_empty() {
        return None;
    }
    if branch.len() == 1 {
        return Some(branch[0]);
    }
    let loc = arena.get(key).loc;
    let block = arena.new_node(NodeKind::StmtBlock, loc);
    for s in branch {
        arena.get_mut(block).add_stmt(s);
    }
    Some(block)
}

fn simp_while(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let cond = arena.get(key).get_cond();
    match as_bool_literal(arena, cond) {
        Some(false) => None,
        _ => Some(key),
    }
}

fn simp_assert(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let cond = arena.get(key).get_cond();
    match as_bool_literal(arena, cond) {
        Some(true) => None,
        _ => Some(key),
    }
}

fn simp_if_generate(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let cond = arena.get(key).get_cond();
    let Some(taken) = as_bool_literal(arena, cond) else {
        return Some(key);
    };
    if !taken {
        return None;
    }
    let loc = arena.get(key).loc;
    let block = arena.new_node(NodeKind::Block, loc);
    for d in arena.get(key).decls.to_vec() {
        arena.get_mut(block).add_decl(d);
    }
    for s in arena.get(key).stmts.to_vec() {
        arena.get_mut(block).add_stmt(s);
    }
    Some(block)
}

// ---------------------------------------------------------------------
// Process / wait (spec §4.4 "Process", "Wait").
// ---------------------------------------------------------------------

fn is_all_sensitised(arena: &Arena, idents: &mut IdentTable, key: NodeKey) -> bool {
    let name = idents.intern("simp.process_all");
    matches!(arena.get(key).get_attr(name), Some(AttrValue::Int(1)))
}

fn finalize_process(arena: &Arena, key: NodeKey) -> Option<NodeKey> {
    let stmts = &arena.get(key).stmts;
    if stmts.len() == 1 && arena.get(stmts[0]).kind == NodeKind::StmtWait {
        None
    } else {
        Some(key)
    }
}

fn simp_process(arena: &mut Arena, idents: &mut IdentTable, key: NodeKey) -> Option<NodeKey> {
    let triggers: Vec<NodeKey> = arena.get(key).triggers.to_vec();
    let all = is_all_sensitised(arena, idents, key);
    if triggers.is_empty() && !all {
        return finalize_process(arena, key);
    }

    let loc = arena.get(key).loc;
    let wait = arena.new_node(NodeKind::StmtWait, loc);
    if all {
        let body: Vec<NodeKey> = arena.get(key).stmts.to_vec();
        for s in body {
            crate::sens::build_wait_into(arena, wait, s, true);
        }
    } else {
        for t in triggers {
            arena.get_mut(wait).add_trigger(t);
        }
    }
    arena.get_mut(key).triggers.clear();
    arena.get_mut(key).add_stmt(wait);
    finalize_process(arena, key)
}

fn simp_wait(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    if !arena.get(key).triggers.is_empty() {
        return Some(key);
    }
    if let Some(cond) = arena.get(key).cond {
        crate::sens::build_wait_into(arena, key, cond, false);
    }
    Some(key)
}

// ---------------------------------------------------------------------
// Concurrent statements (spec §4.4 "Concurrent ...").
// ---------------------------------------------------------------------

fn build_inner_stmt(arena: &mut Arena, key: NodeKey, loc: crate::diag::loc::Loc) -> NodeKey {
    match arena.get(key).kind {
        NodeKind::ConcSignalAssign => {
            let target = arena.get(key).get_target();
            let waves: Vec<NodeKey> = arena.get(key).waveforms.to_vec();
            let stmt = arena.new_node(NodeKind::StmtSignalAssign, loc);
            arena.get_mut(stmt).set_target(target);
            for w in waves {
                arena.get_mut(stmt).add_waveform(w);
            }
            stmt
        }
        NodeKind::ConcSelectedAssign => {
            let target = arena.get(key).get_target();
            let selector = arena.get(key).value;
            let assocs: Vec<ParamEntry> = arena.get(key).assocs.to_vec();
            let case = arena.new_node(NodeKind::StmtCase, loc);
            arena.get_mut(case).value = selector;
            for assoc in assocs {
                let Some(wave) = assoc.value() else { continue };
                let inner = arena.new_node(NodeKind::StmtSignalAssign, loc);
                arena.get_mut(inner).set_target(target);
                arena.get_mut(inner).add_waveform(wave);
                let rebuilt = match assoc {
                    ParamEntry::Choice { choice, .. } => ParamEntry::Choice { choice, value: inner },
                    ParamEntry::Range { range, .. } => ParamEntry::Range { range, value: inner },
                    ParamEntry::Others { .. } => ParamEntry::Others { value: inner },
                    ParamEntry::Named { name, .. } => ParamEntry::Named { name, value: inner },
                    ParamEntry::Positional { .. } => ParamEntry::Positional { value: inner },
                    ParamEntry::Open => ParamEntry::Open,
                };
                arena.get_mut(case).assocs.push(rebuilt);
            }
            case
        }
        NodeKind::ConcPCall => {
            let decl = arena.get(key).get_ref();
            let params: Vec<ParamEntry> = arena.get(key).params.to_vec();
            let stmt = arena.new_node(NodeKind::StmtPCall, loc);
            arena.get_mut(stmt).set_ref(decl);
            for p in params {
                arena.get_mut(stmt).add_param(p);
            }
            stmt
        }
        NodeKind::ConcAssert => {
            let cond = arena.get(key).get_cond();
            let severity = arena.get(key).get_severity();
            let message = arena.get(key).get_message();
            let stmt = arena.new_node(NodeKind::StmtAssert, loc);
            arena.get_mut(stmt).set_cond(cond);
            arena.get_mut(stmt).set_severity(severity);
            arena.get_mut(stmt).set_message(message);
            stmt
        }
        other => fatal(format!("simp_concurrent called on unsupported kind {other:?}")),
    }
}

/// Expand a concurrent statement into an equivalent process (spec §4.4
/// "Concurrent signal assignment / selection / concurrent procedure call /
/// concurrent assertion"): the inner statement plus a terminal wait whose
/// triggers are exactly what the sensitivity-list builder collects from
/// the original concurrent node (its per-kind rule in `crate::sens`
/// already walks target/waveforms/selector/actuals correctly), plus the
/// guard if present.
fn simp_concurrent(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    let loc = arena.get(key).loc;
    let guard = if arena.get(key).kind.has_guard() {
        arena.get(key).get_guard()
    } else {
        None
    };

    let inner = build_inner_stmt(arena, key, loc);

    let process = arena.new_node(NodeKind::StmtProcess, loc);
    let body = match guard {
        Some(g) => {
            let if_stmt = arena.new_node(NodeKind::StmtIf, loc);
            arena.get_mut(if_stmt).set_cond(g);
            arena.get_mut(if_stmt).add_stmt(inner);
            if_stmt
        }
        None => inner,
    };
    arena.get_mut(process).add_stmt(body);

    let wait = arena.new_node(NodeKind::StmtWait, loc);
    crate::sens::build_wait_into(arena, wait, key, false);
    if let Some(g) = guard {
        crate::sens::build_wait_into(arena, wait, g, false);
    }
    arena.get_mut(process).add_stmt(wait);

    Some(process)
}

// ---------------------------------------------------------------------
// Literal, range, subprogram declaration (spec §4.4).
// ---------------------------------------------------------------------

/// `simp_phys_literal` (spec §4.4 "Literal", SPEC_FULL "Physical-literal
/// unit normalisation detail"): walk the unit's declaration chain to its
/// base unit, accumulating the product of multipliers, and collapse the
/// literal to a plain integer expressed in base-unit terms.
fn simp_literal(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    if let Literal::Physical { magnitude, unit } = arena.get(key).get_literal().clone() {
        let base_magnitude = walk_to_base_unit(arena, unit, magnitude);
        arena.get_mut(key).set_literal(Literal::Integer(base_magnitude));
    }
    Some(key)
}

fn walk_to_base_unit(arena: &Arena, unit: NodeKey, magnitude: i64) -> i64 {
    match arena.get(unit).get_value() {
        None => magnitude,
        Some(def) => match arena.get(def).get_literal() {
            Literal::Physical { magnitude: m, unit: next } => {
                magnitude * walk_to_base_unit(arena, *next, *m)
            }
            Literal::Integer(m) => magnitude * m,
            _ => magnitude,
        },
    }
}

/// `simp_range` (spec §4.4 "Range"): a `T'range`/`T'reverse_range` folds to
/// the referenced type's dimension range.
fn simp_range(arena: &mut Arena, key: NodeKey) -> Option<NodeKey> {
    match arena.get(key).range_kind {
        Some(RangeKind::RangeAttribute) | Some(RangeKind::ReverseRangeAttribute) => {}
        _ => return Some(key),
    }
    let Some(prefix) = arena.get(key).value else {
        return Some(key);
    };
    let Some(type_key) = (if arena.get(prefix).kind.has_type() {
        arena.get(prefix).get_type()
    } else {
        None
    }) else {
        return Some(key);
    };
    if arena.get(type_key).kind != NodeKind::DeclSubtype {
        return Some(key);
    }
    let Some(dim) = arena.get(type_key).get_range() else {
        return Some(key);
    };
    if arena.get(dim).kind != NodeKind::ExprRange {
        return Some(key);
    }

    if arena.get(key).range_kind == Some(RangeKind::ReverseRangeAttribute) {
        let loc = arena.get(key).loc;
        let l = arena.get(dim).get_left();
        let r = arena.get(dim).get_right();
        let dir = arena.get(dim).range_kind;
        let rev = arena.new_node(NodeKind::ExprRange, loc);
        arena.get_mut(rev).set_left(r);
        arena.get_mut(rev).set_right(l);
        arena.get_mut(rev).range_kind = Some(match dir {
            Some(RangeKind::Downto) => RangeKind::To,
            _ => RangeKind::Downto,
        });
        Some(rev)
    } else {
        Some(dim)
    }
}

/// `simp_subprogram_decl` (spec §4.4 "Subprogram declaration"): an explicit
/// declaration the elaborator marked as hiding a predefined operator of the
/// same signature is redundant once simplification has resolved every call
/// through its `ref`, and is deleted.
fn simp_subprogram_decl(arena: &Arena, classes: &ClassAttrs, key: NodeKey) -> Option<NodeKey> {
    if classes.is_predefined(arena, key) && classes.is_hidden(arena, key) {
        None
    } else {
        Some(key)
    }
}
