//! End-to-end scenarios from spec §8 — each builds a small tree by hand
//! (no parser is in scope, spec §1) and drives it through [`Driver::simplify`].
//! S1 (nested arithmetic folding) lives alongside `Driver` itself in
//! `src/lib.rs`; the rest are here.

use hdl_simp::ast::arena::Arena;
use hdl_simp::ast::ident::IdentTable;
use hdl_simp::ast::kind::NodeKind;
use hdl_simp::ast::node::{Literal, NodeKey, ObjectClass, ParamEntry};
use hdl_simp::config::Config;
use hdl_simp::diag::loc::Loc;
use hdl_simp::Driver;

fn int_lit(arena: &mut Arena, v: i64) -> NodeKey {
    let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
    arena.get_mut(k).set_literal(Literal::Integer(v));
    k
}

fn str_lit(arena: &mut Arena, s: &str) -> NodeKey {
    let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
    arena.get_mut(k).set_literal(Literal::Str(s.into()));
    k
}

/// S2: `arrayref(aggregate{ pos: 1->'a', pos: 2->'b', others->'z' }, 2)`
/// folds to `'b'`; indexing `7` falls back to `'z'`.
#[test]
fn scenario_s2_array_ref_picks_the_matching_choice_or_falls_back_to_others() {
    let mut arena = Arena::new();
    let mut driver = Driver::new(&Config::default());

    let agg = arena.new_node(NodeKind::ExprAggregate, Loc::unknown());
    let one = int_lit(&mut arena, 1);
    let a = str_lit(&mut arena, "a");
    arena.get_mut(agg).assocs.push(ParamEntry::Choice { choice: one, value: a });
    let two = int_lit(&mut arena, 2);
    let b = str_lit(&mut arena, "b");
    arena.get_mut(agg).assocs.push(ParamEntry::Choice { choice: two, value: b });
    let z = str_lit(&mut arena, "z");
    arena.get_mut(agg).assocs.push(ParamEntry::Others { value: z });

    let idx2 = int_lit(&mut arena, 2);
    let aref = arena.new_node(NodeKind::ExprArrayRef, Loc::unknown());
    arena.get_mut(aref).set_operand(agg);
    arena.get_mut(aref).add_param(ParamEntry::Positional { value: idx2 });

    let result = driver.simplify_native(&mut arena, aref).unwrap();
    assert_eq!(*arena.get(result).get_literal(), Literal::Str("b".into()));

    let idx7 = int_lit(&mut arena, 7);
    let aref2 = arena.new_node(NodeKind::ExprArrayRef, Loc::unknown());
    arena.get_mut(aref2).set_operand(agg);
    arena.get_mut(aref2).add_param(ParamEntry::Positional { value: idx7 });

    let result2 = driver.simplify_native(&mut arena, aref2).unwrap();
    assert_eq!(*arena.get(result2).get_literal(), Literal::Str("z".into()));
}

/// S3: `process[sens=[sig_a]] { x := sig_a; }` gets a terminal
/// `wait on sig_a;` and keeps its original body.
#[test]
fn scenario_s3_process_with_sensitivity_list_gains_a_terminal_wait() {
    let mut arena = Arena::new();
    let mut driver = Driver::new(&Config::default());

    let sig_a = arena.new_node(NodeKind::DeclSignal, Loc::unknown());
    arena.get_mut(sig_a).set_class(ObjectClass::Signal);

    let x = arena.new_node(NodeKind::DeclVariable, Loc::unknown());
    let target = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(target).set_ref(Some(x));
    let sig_ref = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(sig_ref).set_ref(Some(sig_a));
    let assign = arena.new_node(NodeKind::StmtSignalAssign, Loc::unknown());
    arena.get_mut(assign).set_target(target);
    let wave = arena.new_node(NodeKind::Waveform, Loc::unknown());
    arena.get_mut(wave).set_value(Some(sig_ref));
    arena.get_mut(assign).add_waveform(wave);

    let process = arena.new_node(NodeKind::StmtProcess, Loc::unknown());
    arena.get_mut(process).add_stmt(assign);
    let sens_ref = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(sens_ref).set_ref(Some(sig_a));
    arena.get_mut(process).add_trigger(sens_ref);

    let result = driver.simplify_native(&mut arena, process).unwrap();
    let stmts = &arena.get(result).stmts;
    assert_eq!(stmts.len(), 2);
    assert_eq!(arena.get(stmts[0]).kind, NodeKind::StmtSignalAssign);
    let wait = stmts[1];
    assert_eq!(arena.get(wait).kind, NodeKind::StmtWait);
    assert_eq!(arena.get(wait).triggers.len(), 1);
    assert!(arena.get(result).triggers.is_empty());
}

fn bool_lit(arena: &mut Arena, v: bool) -> NodeKey {
    let decl = arena.new_node(NodeKind::DeclEnumLit, Loc::unknown());
    arena.get_mut(decl).set_pos(if v { 1 } else { 0 });
    let r = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(r).set_ref(Some(decl));
    r
}

/// S4: `if true then s1; end; if false then s2; else s3; end` folds each
/// `if` independently to `s1` and `block(s3)`.
#[test]
fn scenario_s4_each_if_folds_to_its_taken_branch() {
    let mut arena = Arena::new();
    let mut driver = Driver::new(&Config::default());

    let if_true = arena.new_node(NodeKind::StmtIf, Loc::unknown());
    let cond_true = bool_lit(&mut arena, true);
    arena.get_mut(if_true).set_cond(cond_true);
    let s1 = int_lit(&mut arena, 1);
    arena.get_mut(if_true).add_stmt(s1);
    let result1 = driver.simplify_native(&mut arena, if_true).unwrap();
    assert_eq!(result1, s1);

    let if_false = arena.new_node(NodeKind::StmtIf, Loc::unknown());
    let cond_false = bool_lit(&mut arena, false);
    arena.get_mut(if_false).set_cond(cond_false);
    let s2 = int_lit(&mut arena, 2);
    arena.get_mut(if_false).add_stmt(s2);
    let s3 = int_lit(&mut arena, 3);
    arena.get_mut(if_false).add_else_stmt(s3);
    let result2 = driver.simplify_native(&mut arena, if_false).unwrap();
    assert_eq!(result2, s3);
}

/// S5: `sig'delayed(5 ns)` in a declarative region injects an implicit
/// signal and driver process, and the attribute reference itself is
/// replaced by a reference to that new signal.
#[test]
fn scenario_s5_delayed_attribute_synthesises_a_signal_and_process() {
    let mut arena = Arena::new();
    let mut driver = Driver::new(&Config::default());

    let fs = arena.new_node(NodeKind::DeclUnit, Loc::unknown());
    let ns_def = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
    arena
        .get_mut(ns_def)
        .set_literal(Literal::Physical { magnitude: 1_000_000, unit: fs });
    let ns = arena.new_node(NodeKind::DeclUnit, Loc::unknown());
    arena.get_mut(ns).set_value(Some(ns_def));

    let sig = arena.new_node(NodeKind::DeclSignal, Loc::unknown());
    arena.get_mut(sig).set_class(ObjectClass::Signal);
    let mut idents = IdentTable::new();
    arena.get_mut(sig).ident = Some(idents.intern("sig"));

    let sig_ref = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(sig_ref).set_ref(Some(sig));

    let delay = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
    arena
        .get_mut(delay)
        .set_literal(Literal::Physical { magnitude: 5, unit: ns });

    let attr = arena.new_node(NodeKind::ExprAttrRef, Loc::unknown());
    arena.get_mut(attr).set_operand(sig_ref);
    arena.get_mut(attr).attr_kind = Some(hdl_simp::ast::node::AttrKind::Delayed);
    arena.get_mut(attr).add_param(ParamEntry::Positional { value: delay });

    let arch = arena.new_node(NodeKind::Architecture, Loc::unknown());
    arena.get_mut(arch).add_decl(sig);
    let proc_body = arena.new_node(NodeKind::StmtProcess, Loc::unknown());
    let target = arena.new_node(NodeKind::ExprRef, Loc::unknown());
    arena.get_mut(target).set_ref(Some(sig));
    let assign = arena.new_node(NodeKind::StmtSignalAssign, Loc::unknown());
    arena.get_mut(assign).set_target(target);
    let wave = arena.new_node(NodeKind::Waveform, Loc::unknown());
    arena.get_mut(wave).set_value(Some(attr));
    arena.get_mut(assign).add_waveform(wave);
    arena.get_mut(proc_body).add_stmt(assign);
    arena.get_mut(arch).add_stmt(proc_body);

    let result = driver.simplify_native(&mut arena, arch).unwrap();

    let decls = arena.get(result).decls.clone();
    assert_eq!(decls.len(), 2, "the implicit delayed_sig signal must be spliced in");
    let synthesised = decls[1];
    assert_eq!(arena.get(synthesised).kind, NodeKind::DeclSignal);

    let stmts = arena.get(result).stmts.clone();
    assert_eq!(stmts.len(), 2, "the implicit driver process must be spliced in");
    let driver_process = stmts[1];
    assert_eq!(arena.get(driver_process).kind, NodeKind::StmtProcess);
}

/// S6: a generic map with positional `{2}` on a block whose generics are
/// `(n: integer := 8; k: integer := 16)` normalises to positional `(2, 16)`.
#[test]
fn scenario_s6_partial_generic_map_fills_in_remaining_defaults() {
    let mut arena = Arena::new();
    let mut idents = IdentTable::new();
    let mut driver = Driver::new(&Config::default());

    let n_default = int_lit(&mut arena, 8);
    let n = arena.new_node(NodeKind::DeclGeneric, Loc::unknown());
    arena.get_mut(n).ident = Some(idents.intern("n"));
    arena.get_mut(n).set_value(Some(n_default));

    let k_default = int_lit(&mut arena, 16);
    let k = arena.new_node(NodeKind::DeclGeneric, Loc::unknown());
    arena.get_mut(k).ident = Some(idents.intern("k"));
    arena.get_mut(k).set_value(Some(k_default));

    let block = arena.new_node(NodeKind::Block, Loc::unknown());
    arena.get_mut(block).add_generic(n);
    arena.get_mut(block).add_generic(k);
    let actual = int_lit(&mut arena, 2);
    arena.get_mut(block).add_genmap(ParamEntry::Positional { value: actual });

    let result = driver.simplify_native(&mut arena, block).unwrap();
    let genmaps = &arena.get(result).genmaps;
    assert_eq!(genmaps.len(), 2);
    assert!(matches!(genmaps[0], ParamEntry::Positional { value } if value == actual));
    assert!(matches!(genmaps[1], ParamEntry::Positional { value } if value == k_default));
}
