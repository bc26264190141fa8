//! The two-callback seam to the external lowering/evaluator pipeline that
//! spec §1 calls `exec` and places firmly out of scope: "lower this static
//! expression" and "evaluate the lowered form" are the only two questions
//! [`crate::simp::fold`] ever needs answered, so that's the entire trait.
//!
//! A real integration would hand `lower` to the actual code generator and
//! `evaluate` to an out-of-process (or JIT'd) evaluator. [`NativeThunkCompiler`]
//! answers both questions in-process for the predefined scalar operators,
//! which is enough to fold the handful of expressions spec §8's scenarios
//! (S1, S2) exercise without standing up that whole pipeline.

use crate::ast::arena::Arena;
use crate::ast::ident::IdentTable;
use crate::ast::kind::NodeKind;
use crate::ast::node::{Literal, NodeKey};
use crate::error::Result;

/// What a thunk evaluates to: the three scalar shapes a folded expression
/// can reduce to (spec §3 "Scalars", §4.4 "folds to a literal").
#[derive(Debug, Clone, PartialEq)]
pub enum FoldedScalar {
    Integer(i64),
    Real(f64),
    /// The fold produced an enumeration literal; `NodeKey` names its
    /// `DeclEnumLit` declaration rather than carrying its text.
    EnumLit(NodeKey),
}

/// Compiles a static expression to a thunk and evaluates it (spec §4.5,
/// §9 "Constant folding via an injected evaluator"). This is the sole
/// point where the driver reaches outside the AST store: everything else
/// in [`crate::simp`] only ever reads and rewrites the tree.
pub trait ThunkCompiler {
    type Thunk;

    /// Compile `expr` (already established static by
    /// [`crate::simp::fold::fold_possible`]) to a thunk, or `None` if this
    /// particular compiler doesn't know how to lower it — an operator it
    /// doesn't recognise, a user subprogram with no lowered unit, and so
    /// on. `None` here means "leave the expression unfolded", not an error.
    fn lower(&self, arena: &Arena, idents: &IdentTable, expr: NodeKey) -> Option<Self::Thunk>;

    fn evaluate(&self, thunk: &Self::Thunk) -> Result<FoldedScalar>;
}

/// In-process stand-in for the external lowering/evaluator pipeline:
/// recognises the predefined scalar operators on integer and real operands
/// (`+ - * / mod` on `INTEGER`-shaped values) and evaluates them directly,
/// the thunk being the already-computed value rather than a compiled form.
///
/// Deliberately narrow: predefined boolean/relational operators and any
/// enumeration-typed arithmetic would need the type information this
/// crate's AST doesn't carry (see DESIGN.md) to know which `DeclEnumLit`
/// stands for `true`/`false` for a given type. A real lowering backend
/// would resolve that through the type declaration; this stand-in doesn't
/// have one to consult.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeThunkCompiler;

impl ThunkCompiler for NativeThunkCompiler {
    type Thunk = FoldedScalar;

    fn lower(&self, arena: &Arena, idents: &IdentTable, expr: NodeKey) -> Option<Self::Thunk> {
        if arena.get(expr).kind != NodeKind::ExprFCall {
            return None;
        }
        let op = idents.resolve(arena.get(expr).ident?);
        let operands: Vec<&Literal> = arena
            .get(expr)
            .params
            .iter()
            .filter_map(|p| p.value())
            .map(|v| arena.get(v).get_literal())
            .collect();

        let result = match (op, operands.as_slice()) {
            ("+", [Literal::Integer(a), Literal::Integer(b)]) => FoldedScalar::Integer(a + b),
            ("-", [Literal::Integer(a), Literal::Integer(b)]) => FoldedScalar::Integer(a - b),
            ("*", [Literal::Integer(a), Literal::Integer(b)]) => FoldedScalar::Integer(a * b),
            ("/", [Literal::Integer(a), Literal::Integer(b)]) if *b != 0 => {
                FoldedScalar::Integer(a / b)
            }
            ("mod", [Literal::Integer(a), Literal::Integer(b)]) if *b != 0 => {
                FoldedScalar::Integer(a.rem_euclid(*b))
            }
            ("-", [Literal::Integer(a)]) => FoldedScalar::Integer(-a),
            ("+", [Literal::Real(a), Literal::Real(b)]) => FoldedScalar::Real(a + b),
            ("-", [Literal::Real(a), Literal::Real(b)]) => FoldedScalar::Real(a - b),
            ("*", [Literal::Real(a), Literal::Real(b)]) => FoldedScalar::Real(a * b),
            ("/", [Literal::Real(a), Literal::Real(b)]) if *b != 0.0 => {
                FoldedScalar::Real(a / b)
            }
            ("-", [Literal::Real(a)]) => FoldedScalar::Real(-a),
            _ => return None,
        };
        Some(result)
    }

    fn evaluate(&self, thunk: &Self::Thunk) -> Result<FoldedScalar> {
        Ok(thunk.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::loc::Loc;
    use crate::ast::node::ParamEntry;

    fn int_lit(arena: &mut Arena, v: i64) -> NodeKey {
        let k = arena.new_node(NodeKind::ExprLiteral, Loc::unknown());
        arena.get_mut(k).set_literal(Literal::Integer(v));
        k
    }

    #[test]
    fn native_compiler_folds_integer_addition() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let plus = idents.intern("+");
        let a = int_lit(&mut arena, 2);
        let b = int_lit(&mut arena, 3);
        let call = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(call).ident = Some(plus);
        arena.get_mut(call).add_param(ParamEntry::Positional { value: a });
        arena.get_mut(call).add_param(ParamEntry::Positional { value: b });

        let compiler = NativeThunkCompiler;
        let thunk = compiler.lower(&arena, &idents, call).unwrap();
        assert_eq!(compiler.evaluate(&thunk).unwrap(), FoldedScalar::Integer(5));
    }

    #[test]
    fn native_compiler_refuses_unrecognised_operator() {
        let mut arena = Arena::new();
        let mut idents = IdentTable::new();
        let weird = idents.intern("frobnicate");
        let a = int_lit(&mut arena, 2);
        let call = arena.new_node(NodeKind::ExprFCall, Loc::unknown());
        arena.get_mut(call).ident = Some(weird);
        arena.get_mut(call).add_param(ParamEntry::Positional { value: a });

        let compiler = NativeThunkCompiler;
        assert!(compiler.lower(&arena, &idents, call).is_none());
    }
}
