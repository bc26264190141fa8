//! Semantic simplification and constant-folding pass for an HDL compiler
//! front end (spec §1, §2).
//!
//! Four cooperating components, leaves first: [`ast`] (the tree arena and
//! its `visit`/`rewrite`/`copy`/`gc`/serialisation), [`diag`] (the file
//! registry and diagnostic emitter), [`sens`] (the sensitivity-list
//! builder), and [`simp`] (the rewrite driver itself). [`thunk`] is the
//! seam to the external lowering/evaluator pipeline spec §1 calls `exec`;
//! [`config`] and [`error`] are the ambient configuration and error type.
//!
//! [`Driver`] is the crate's single public entry point: it owns the
//! process-wide state spec §5 describes (the identifier table, the
//! diagnostic emitter, subprogram classification, the formal-name flag)
//! across as many [`Driver::simplify`] calls as the caller has top-level
//! units to rewrite.

pub mod ast;
pub mod config;
pub mod diag;
pub mod error;
pub mod sens;
pub mod simp;
pub mod thunk;

use std::cell::RefCell;

use ast::arena::Arena;
use ast::ident::IdentTable;
use ast::kind::NodeKind;
use ast::node::NodeKey;
use config::{Config, EvalFlags};
use diag::diagnostic::Diagnostics;
use error::{Result, SimpError};
use simp::generic::{self, FormalNameFlag, GenericScope};
use simp::rules::RuleEnv;
use simp::subprogram::ClassAttrs;
use thunk::{NativeThunkCompiler, ThunkCompiler};

/// Owns the state that must survive across every top-level unit a single
/// compilation run simplifies (spec §5 "Shared resources"): the
/// identifier table, the diagnostic emitter and its error counter, the
/// subprogram-classification attributes, and the formal-name-context
/// marker the generic-map resolver consults. One `Driver` corresponds to
/// one compilation run; [`Driver::reset`] is what spec §9's "tests reset
/// between runs" refers to.
pub struct Driver {
    pub idents: IdentTable,
    pub diags: Diagnostics,
    pub classes: ClassAttrs,
    pub formal_flag: FormalNameFlag,
    pub flags: EvalFlags,
}

impl Driver {
    /// Build a driver from a loaded [`Config`] (spec §6 "Configuration
    /// options read").
    pub fn new(config: &Config) -> Self {
        let mut idents = IdentTable::new();
        let classes = ClassAttrs::new(&mut idents);
        let formal_flag = FormalNameFlag::new(&mut idents);
        let diags = Diagnostics::new(config.error_limit, config.unit_test);
        Self {
            idents,
            diags,
            classes,
            formal_flag,
            flags: config.eval_flags(),
        }
    }

    /// Reset the error counter and diagnostic log between independent runs
    /// (spec §9 "Global error counter ... tests reset between runs"); the
    /// identifier table and classification attributes are left alone since
    /// they describe the tree being simplified, not the run itself.
    pub fn reset(&mut self) {
        self.diags.reset();
    }

    /// Simplify a single top-level unit (spec §2 "Control flow"): the
    /// driver invokes [`Arena::rewrite`] with a pre-descent callback that
    /// binds generics and a post-descent callback that applies the
    /// per-kind rules of spec §4.4, using `thunk` to fold constant
    /// expressions through the fold gate of spec §4.5.
    ///
    /// Returns the rewritten root, or `Err` if the rewrite deleted the
    /// top-level unit outright (a contract violation — spec §3 doesn't
    /// permit that for `Entity`/`Architecture`/`Package`/`PackageBody`) or
    /// if the diagnostic emitter's error limit was reached mid-pass
    /// (spec §4.2, §7).
    pub fn simplify<T: ThunkCompiler>(
        &mut self,
        arena: &mut Arena,
        thunk: &T,
        root: NodeKey,
    ) -> Result<NodeKey> {
        let generics: RefCell<Vec<GenericScope>> = RefCell::new(Vec::new());
        let mut imp_signals: Vec<(NodeKey, NodeKey)> = Vec::new();

        let mut env = RuleEnv {
            idents: &mut self.idents,
            diags: &mut self.diags,
            classes: &self.classes,
            thunk,
            flags: self.flags,
            formal_flag: &self.formal_flag,
            imp_signals: &mut imp_signals,
            error_limit_hit: None,
        };

        let result = arena.rewrite(
            root,
            |arena, key| pre(arena, &generics, key),
            |arena, key| post(arena, &mut env, &generics, key),
        );

        if let Some(limit) = env.error_limit_hit {
            return Err(SimpError::ErrorLimitReached { limit });
        }
        result.ok_or_else(|| SimpError::Fatal {
            message: "simplification deleted the top-level unit".into(),
        })
    }

    /// Convenience wrapper over [`Driver::simplify`] using
    /// [`NativeThunkCompiler`] — enough to exercise spec §8's literal-only
    /// folding scenarios without wiring up a real `exec` backend.
    pub fn simplify_native(&mut self, arena: &mut Arena, root: NodeKey) -> Result<NodeKey> {
        let thunk = NativeThunkCompiler;
        self.simplify(arena, &thunk, root)
    }
}

/// The driver's pre-descent callback (spec §2, §4.6 "Generic substitution
/// as a scoped context"): before descending into a `block`/`instance`/
/// `binding`, compute its formal -> actual generic mapping and push it so
/// every `ExprRef` underneath resolves against it.
fn pre(arena: &mut Arena, generics: &RefCell<Vec<GenericScope>>, key: NodeKey) {
    if matches!(
        arena.get(key).kind,
        NodeKind::Block | NodeKind::Instance | NodeKind::Binding
    ) {
        let scope = generic::resolve_generic_map(arena, key);
        generics.borrow_mut().push(scope);
    }
}

/// The driver's post-descent callback: apply spec §4.4's per-kind rule via
/// [`simp::rules::post`], then splice in any implicit signals/processes an
/// `'delayed`/`'transaction` attribute reference synthesised beneath this
/// node (spec §4.4 "Attribute references") into the first enclosing
/// *concurrent* declarative region the traversal returns to.
///
/// This deliberately stops at [`is_concurrent_region`] rather than any
/// `has_decls() && has_stmts()` container: `StmtProcess`/`DeclFunc`/
/// `DeclProc` satisfy that pair too, but a VHDL process's declarative part
/// may only hold variables/constants, never a signal — splicing there
/// would synthesise an illegal declaration. Since the traversal is
/// bottom-up, the first concurrent region the callback sees after the
/// attribute reference was processed is the nearest legal one.
fn post<T: ThunkCompiler>(
    arena: &mut Arena,
    env: &mut RuleEnv<T>,
    generics: &RefCell<Vec<GenericScope>>,
    key: NodeKey,
) -> Option<NodeKey> {
    let result = simp::rules::post(arena, env, generics, key);
    let Some(result_key) = result else {
        return result;
    };
    if env.imp_signals.is_empty() {
        return result;
    }
    if is_concurrent_region(arena.get(result_key).kind) {
        for (sig, process) in std::mem::take(env.imp_signals) {
            arena.get_mut(result_key).add_decl(sig);
            arena.get_mut(result_key).add_stmt(process);
        }
    }
    result
}

/// The node kinds that are legal homes for a synthesised implicit signal
/// and its driver process (spec §4.4 "Attribute references"): architecture
/// bodies and blocks, the two concurrent-statement regions this AST models.
fn is_concurrent_region(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Architecture | NodeKind::Block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::node::{Literal, ParamEntry};
    use diag::loc::Loc;

    fn int_lit(arena: &mut Arena, v: i64) -> NodeKey {
        let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(k).set_literal(Literal::Integer(v));
        k
    }

    /// Spec §8 S1: `fcall("+", fcall("*", 2, 3), 4)` folds to `10`.
    #[test]
    fn scenario_s1_nested_arithmetic_folds_to_a_literal() {
        let mut arena = Arena::new();
        let mut driver = Driver::new(&Config::default());

        let plus = driver.idents.intern("+");
        let times = driver.idents.intern("*");
        let plus_decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        driver.classes.mark_predefined(&mut arena, plus_decl);
        let times_decl = arena.new_node(NodeKind::DeclFunc, Loc::unknown());
        driver.classes.mark_predefined(&mut arena, times_decl);

        let two = int_lit(&mut arena, 2);
        let three = int_lit(&mut arena, 3);
        let mul = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(mul).ident = Some(times);
        arena.get_mut(mul).set_ref(Some(times_decl));
        arena.get_mut(mul).add_param(ParamEntry::Positional { value: two });
        arena.get_mut(mul).add_param(ParamEntry::Positional { value: three });

        let four = int_lit(&mut arena, 4);
        let add = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(add).ident = Some(plus);
        arena.get_mut(add).set_ref(Some(plus_decl));
        arena.get_mut(add).add_param(ParamEntry::Positional { value: mul });
        arena.get_mut(add).add_param(ParamEntry::Positional { value: four });

        let result = driver.simplify_native(&mut arena, add).unwrap();
        assert_eq!(*arena.get(result).get_literal(), Literal::Integer(10));
    }

    #[test]
    fn reset_clears_the_error_counter_between_runs() {
        use diag::diagnostic::{Diagnostic, Level};
        let mut driver = Driver::new(&Config::default());
        driver
            .diags
            .emit(Diagnostic::new(Level::Error, Loc::unknown(), "boom"))
            .unwrap();
        assert_eq!(driver.diags.error_count(), 1);
        driver.reset();
        assert_eq!(driver.diags.error_count(), 0);
    }
}
