//! Node kinds and the capability predicates that gate field access.
//!
//! Spec §3 describes the source's node as a manual union with boolean
//! predicates (`has_value`, `has_ports`, ...). §9's DESIGN NOTES observe
//! that a tagged-variant representation is cleaner and that the
//! predicates become exhaustive pattern matches — that's what this module
//! does: `NodeKind` is a plain tag (mirroring the teacher's
//! `models::unified_ast::AstKind` style of a `#[repr(u16)]`-friendly enum),
//! and every `has_*` predicate below is an exhaustive `matches!` over it.
//! [`crate::ast::node::Node`] then uses these predicates to guard its
//! accessors, which is the accessor contract spec §3/§4.1 describe.

/// Tag for every AST node kind the simplifier handles.
///
/// Declarations, statements, expressions and top-level design units, per
/// spec §3's "≈ 40 kinds" — this crate implements the subset spec §4.4's
/// rules actually name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeKind {
    // --- top-level units ---
    Entity,
    Architecture,
    Package,
    PackageBody,
    Instance,
    Binding,
    Block,

    // --- declarations ---
    DeclConst,
    DeclSignal,
    DeclVariable,
    DeclType,
    DeclSubtype,
    DeclUnit,
    DeclGeneric,
    DeclPort,
    DeclAlias,
    DeclEnumLit,
    DeclFunc,
    DeclProc,
    DeclAttribute,

    // --- statements ---
    StmtIf,
    StmtCase,
    StmtWhile,
    StmtFor,
    StmtAssert,
    StmtWait,
    StmtProcess,
    StmtSignalAssign,
    StmtVarAssign,
    StmtPCall,
    StmtReturn,
    StmtBlock,

    // --- concurrent statements ---
    ConcSignalAssign,
    ConcSelectedAssign,
    ConcPCall,
    ConcAssert,
    IfGenerate,

    // --- expressions ---
    ExprRef,
    ExprFCall,
    ExprLiteral,
    ExprAggregate,
    ExprArrayRef,
    ExprArraySlice,
    ExprRecordRef,
    ExprAttrRef,
    ExprQualified,
    ExprTypeConv,
    ExprOpen,
    ExprRange,

    // --- misc ---
    Waveform,
}

impl NodeKind {
    /// A `value` cross-link: a declaration's initialiser/default expression,
    /// a waveform's assigned expression, or (for `ExprRange` in its
    /// `RangeAttribute`/`ReverseRangeAttribute` form) the prefix expression
    /// whose dimension is being queried.
    ///
    /// `DeclSignal` carries its optional initial-value expression here too
    /// (`signal s : bit := '0';`) — SPEC_FULL's `'delayed`/`'transaction`
    /// synthesis rule (§4.4) needs to read and set this when it injects an
    /// implicit signal carrying the prefix's own initial value.
    pub fn has_value(self) -> bool {
        matches!(
            self,
            NodeKind::DeclConst
                | NodeKind::DeclSignal
                | NodeKind::DeclUnit
                | NodeKind::DeclGeneric
                | NodeKind::DeclPort
                | NodeKind::Waveform
                | NodeKind::ExprRange
        )
    }

    /// Carries a literal scalar payload directly on the node.
    pub fn has_literal(self) -> bool {
        matches!(self, NodeKind::ExprLiteral)
    }

    /// `ports` child sequence (entities, instances, bindings, subprograms).
    pub fn has_ports(self) -> bool {
        matches!(
            self,
            NodeKind::Entity
                | NodeKind::Instance
                | NodeKind::Binding
                | NodeKind::Block
                | NodeKind::DeclFunc
                | NodeKind::DeclProc
        )
    }

    /// `generics` child sequence.
    pub fn has_generics(self) -> bool {
        matches!(
            self,
            NodeKind::Entity | NodeKind::Instance | NodeKind::Binding | NodeKind::Block
        )
    }

    /// `genmaps` child sequence (actuals for the generic map resolver, §4.6).
    pub fn has_genmaps(self) -> bool {
        matches!(self, NodeKind::Instance | NodeKind::Binding | NodeKind::Block)
    }

    /// `decls` child sequence. On `DeclType` this holds an enumeration
    /// type's `DeclEnumLit` literals in declaration order (spec §4.4
    /// "Attribute references" dimension attributes on an enumeration type).
    pub fn has_decls(self) -> bool {
        matches!(
            self,
            NodeKind::Architecture
                | NodeKind::Package
                | NodeKind::PackageBody
                | NodeKind::Block
                | NodeKind::StmtProcess
                | NodeKind::StmtBlock
                | NodeKind::DeclFunc
                | NodeKind::DeclProc
                | NodeKind::IfGenerate
                | NodeKind::DeclType
        )
    }

    /// `stmts` child sequence.
    pub fn has_stmts(self) -> bool {
        matches!(
            self,
            NodeKind::Architecture
                | NodeKind::Block
                | NodeKind::StmtProcess
                | NodeKind::StmtIf
                | NodeKind::StmtCase
                | NodeKind::StmtWhile
                | NodeKind::StmtFor
                | NodeKind::StmtBlock
                | NodeKind::DeclFunc
                | NodeKind::DeclProc
                | NodeKind::IfGenerate
        )
    }

    /// `else_stmts` child sequence (`if` only).
    pub fn has_else_stmts(self) -> bool {
        matches!(self, NodeKind::StmtIf)
    }

    /// `waveforms` child sequence (signal assignment targets).
    pub fn has_waveforms(self) -> bool {
        matches!(self, NodeKind::StmtSignalAssign | NodeKind::ConcSignalAssign)
    }

    /// `triggers` child sequence (a `wait`'s sensitivity set).
    pub fn has_triggers(self) -> bool {
        matches!(self, NodeKind::StmtWait)
    }

    /// `assocs` child sequence (aggregate associations).
    pub fn has_assocs(self) -> bool {
        matches!(self, NodeKind::ExprAggregate)
    }

    /// `params` child sequence (call actuals, or a `'length`/`'left`/...
    /// attribute's dimension-index argument on `ExprAttrRef`/`ExprRange`).
    pub fn has_params(self) -> bool {
        matches!(
            self,
            NodeKind::ExprFCall
                | NodeKind::StmtPCall
                | NodeKind::ConcPCall
                | NodeKind::ExprAttrRef
                | NodeKind::ExprRange
        )
    }

    /// Has a `target` cross-link (assignment LHS).
    pub fn has_target(self) -> bool {
        matches!(
            self,
            NodeKind::StmtSignalAssign
                | NodeKind::StmtVarAssign
                | NodeKind::ConcSignalAssign
                | NodeKind::ConcSelectedAssign
        )
    }

    /// Has a `ref` cross-link (expression -> declaration it names).
    ///
    /// For `ExprFCall`/`StmtPCall`/`ConcPCall` this is the resolved callee
    /// (spec §4.4 "Function/procedure calls", §4.3's builder uses it via
    /// `build_wait_call`); for `ExprAttrRef` it is the resolved type or
    /// object declaration the attribute is computed over (distinct from
    /// `operand`, the prefix *expression*, which the sensitivity builder
    /// walks for `'event`/`'active`/`'delayed`/`'transaction`).
    pub fn has_ref(self) -> bool {
        matches!(
            self,
            NodeKind::ExprRef
                | NodeKind::ExprAttrRef
                | NodeKind::ExprRange
                | NodeKind::DeclAlias
                | NodeKind::ExprFCall
                | NodeKind::StmtPCall
                | NodeKind::ConcPCall
        )
    }

    /// Has a `type_of` cross-link (expression -> its type).
    pub fn has_type(self) -> bool {
        matches!(
            self,
            NodeKind::ExprRef
                | NodeKind::ExprFCall
                | NodeKind::ExprLiteral
                | NodeKind::ExprAggregate
                | NodeKind::ExprArrayRef
                | NodeKind::ExprArraySlice
                | NodeKind::ExprRecordRef
                | NodeKind::ExprAttrRef
                | NodeKind::ExprQualified
                | NodeKind::ExprTypeConv
                | NodeKind::DeclConst
                | NodeKind::DeclSignal
                | NodeKind::DeclVariable
                | NodeKind::DeclGeneric
                | NodeKind::DeclPort
        )
    }

    /// Has a `range` cross-link (subtype/array constraint, or a `for`
    /// statement's iteration scheme — the sensitivity-list builder's
    /// `T_FOR` rule recurses into exactly this field, spec §4.3).
    pub fn has_range(self) -> bool {
        matches!(self, NodeKind::DeclSubtype | NodeKind::StmtFor)
    }

    /// Has `left`/`right` bound expressions (a `to`/`downto` range).
    pub fn has_bounds(self) -> bool {
        matches!(self, NodeKind::ExprRange)
    }

    /// Has a `severity` expression (assertions).
    pub fn has_severity(self) -> bool {
        matches!(self, NodeKind::StmtAssert | NodeKind::ConcAssert)
    }

    /// Has an (optional) `message` expression (assertions).
    pub fn has_message(self) -> bool {
        matches!(self, NodeKind::StmtAssert | NodeKind::ConcAssert)
    }

    /// Has a `delay` expression (waveform).
    pub fn has_delay(self) -> bool {
        matches!(self, NodeKind::Waveform)
    }

    /// Guard expression (concurrent assignment/selected assignment).
    pub fn has_guard(self) -> bool {
        matches!(self, NodeKind::ConcSignalAssign | NodeKind::ConcSelectedAssign)
    }

    /// Has an ordinal `pos` (an enumeration literal's position in its type,
    /// spec §6 "enum literals (position)").
    pub fn has_pos(self) -> bool {
        matches!(self, NodeKind::DeclEnumLit)
    }

    /// Has an object class (spec §4.3 "constant-class port"): distinguishes
    /// a generic/constant-class formal from a signal-class port for the
    /// sensitivity-list builder's static-prefix predicate.
    pub fn has_class(self) -> bool {
        matches!(
            self,
            NodeKind::DeclPort
                | NodeKind::DeclGeneric
                | NodeKind::DeclSignal
                | NodeKind::DeclConst
                | NodeKind::DeclVariable
        )
    }

    /// Has an `operand` cross-link: the base expression an array ref/slice
    /// indexes, the aggregate a record ref projects, the expression a
    /// qualified-expression or type-conversion wraps, or the prefix object
    /// an attribute reference names. Spec §4.3 treats all of these as "the
    /// prefix" the sensitivity-list builder recurses into; this predicate
    /// is the one field that carries it across every kind that has one.
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            NodeKind::ExprArrayRef
                | NodeKind::ExprArraySlice
                | NodeKind::ExprRecordRef
                | NodeKind::ExprQualified
                | NodeKind::ExprTypeConv
                | NodeKind::ExprAttrRef
        )
    }

    /// Condition expression (`if`/`while`/`assert`/`wait`/`if-generate`).
    pub fn has_cond(self) -> bool {
        matches!(
            self,
            NodeKind::StmtIf
                | NodeKind::StmtWhile
                | NodeKind::StmtAssert
                | NodeKind::StmtWait
                | NodeKind::IfGenerate
                | NodeKind::ConcAssert
        )
    }
}

/// Every kind, in declaration order — the order [`NodeKind`]'s `#[repr(u16)]`
/// discriminants follow, and so the order the wire format's 16-bit kind tag
/// indexes into (spec §6 "16-bit kind").
pub const ALL_KINDS: &[NodeKind] = &[
    NodeKind::Entity,
    NodeKind::Architecture,
    NodeKind::Package,
    NodeKind::PackageBody,
    NodeKind::Instance,
    NodeKind::Binding,
    NodeKind::Block,
    NodeKind::DeclConst,
    NodeKind::DeclSignal,
    NodeKind::DeclVariable,
    NodeKind::DeclType,
    NodeKind::DeclSubtype,
    NodeKind::DeclUnit,
    NodeKind::DeclGeneric,
    NodeKind::DeclPort,
    NodeKind::DeclAlias,
    NodeKind::DeclEnumLit,
    NodeKind::DeclFunc,
    NodeKind::DeclProc,
    NodeKind::DeclAttribute,
    NodeKind::StmtIf,
    NodeKind::StmtCase,
    NodeKind::StmtWhile,
    NodeKind::StmtFor,
    NodeKind::StmtAssert,
    NodeKind::StmtWait,
    NodeKind::StmtProcess,
    NodeKind::StmtSignalAssign,
    NodeKind::StmtVarAssign,
    NodeKind::StmtPCall,
    NodeKind::StmtReturn,
    NodeKind::StmtBlock,
    NodeKind::ConcSignalAssign,
    NodeKind::ConcSelectedAssign,
    NodeKind::ConcPCall,
    NodeKind::ConcAssert,
    NodeKind::IfGenerate,
    NodeKind::ExprRef,
    NodeKind::ExprFCall,
    NodeKind::ExprLiteral,
    NodeKind::ExprAggregate,
    NodeKind::ExprArrayRef,
    NodeKind::ExprArraySlice,
    NodeKind::ExprRecordRef,
    NodeKind::ExprAttrRef,
    NodeKind::ExprQualified,
    NodeKind::ExprTypeConv,
    NodeKind::ExprOpen,
    NodeKind::ExprRange,
    NodeKind::Waveform,
];

impl NodeKind {
    /// Decode a wire-format kind tag (spec §6). `None` for an out-of-range
    /// value — the caller treats that as stream corruption.
    pub fn from_u16(tag: u16) -> Option<NodeKind> {
        ALL_KINDS.get(tag as usize).copied()
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_wire_tag() {
        for (i, &k) in ALL_KINDS.iter().enumerate() {
            assert_eq!(k.to_u16(), i as u16);
            assert_eq!(NodeKind::from_u16(i as u16), Some(k));
        }
    }
}
