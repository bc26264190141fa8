//! The node value itself: identifiers, literals, parameter/assoc entries,
//! scalars, cross-links, and the guarded accessors spec §3/§4.1 describe.

use crate::ast::kind::NodeKind;
use crate::diag::loc::Loc;
use crate::error::fatal;
use smallvec::SmallVec;

/// Interned symbol handle (spec §3 "Identifiers").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident(pub u32);

/// Arena index for a node. `u32::MAX` is the null sentinel, matching the
/// teacher's `models::unified_ast::{NodeKey, INVALID_NODE_KEY}`.
pub type NodeKey = u32;
pub const INVALID_NODE_KEY: NodeKey = u32::MAX;

/// A small, inline-first vector of child keys — children sequences are
/// usually short (a handful of ports or statements), so `SmallVec` avoids
/// a heap allocation for the common case the way the teacher's codebase
/// reaches for `smallvec` wherever a `Vec` would mostly hold 0-4 items.
pub type NodeList = SmallVec<[NodeKey; 4]>;

/// Scalar literal payload (spec §3 "Scalars").
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    /// A physical literal: raw magnitude plus the unit declaration it was
    /// written against, *before* `simp_phys_literal` (SPEC_FULL, §4.4)
    /// normalises it to the base unit.
    Physical { magnitude: i64, unit: NodeKey },
    EnumLit(NodeKey),
    Str(String),
}

/// Port mode (spec §3 "Scalars").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortMode {
    In,
    Out,
    InOut,
    Buffer,
    Linkage,
}

/// Range direction (spec §3 "Scalars").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    To,
    Downto,
    /// `T'range`.
    RangeAttribute,
    /// `T'reverse_range`.
    ReverseRangeAttribute,
}

/// Subprogram kind (spec §3 "Scalars").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubprogramKind {
    Function,
    Procedure,
}

/// Object class of a declaration (spec §4.3's "constant-class port"):
/// which kind of object a declaration names, independent of its `port_mode`.
/// Used by the sensitivity-list builder's static-prefix predicate and by
/// `simp_build_wait`'s "reference to a signal" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Constant,
    Signal,
    Variable,
}

/// Attribute kind (spec §3 "Scalars", spec §4.4 "Attribute references").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Delayed,
    Transaction,
    Event,
    Active,
    Pos,
    Length,
    Left,
    Right,
    Low,
    High,
    Ascending,
    Other,
}

/// A parameter/association-list entry (spec §3 "Parameter/assoc entries").
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEntry {
    Positional { value: NodeKey },
    Named { name: Ident, value: NodeKey },
    /// An aggregate association whose choice is a range (e.g. `(1 to 3 =>
    /// 'a')`): `range` is the choice, `value` the associated expression.
    Range { range: NodeKey, value: NodeKey },
    Others { value: NodeKey },
    /// A `case`/selected-assignment arm whose choice is a discrete
    /// expression (a literal or an enumeration-literal reference), e.g.
    /// `when 3 =>` or `when red =>` (spec §4.4 "Case", §3 "case"'s choice
    /// kinds). Distinct from `Named`, which carries an *identifier* (a
    /// record field name or a formal parameter/generic name) rather than an
    /// expression to evaluate.
    Choice { choice: NodeKey, value: NodeKey },
    /// An `open` actual (formal uses its default).
    Open,
}

impl ParamEntry {
    pub fn value(&self) -> Option<NodeKey> {
        match self {
            ParamEntry::Positional { value } | ParamEntry::Named { value, .. } => Some(*value),
            ParamEntry::Others { value } => Some(*value),
            ParamEntry::Range { value, .. } => Some(*value),
            ParamEntry::Choice { value, .. } => Some(*value),
            ParamEntry::Open => None,
        }
    }

    /// The range choice, for `Range` entries only.
    pub fn choice_range(&self) -> Option<NodeKey> {
        match self {
            ParamEntry::Range { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// The discrete choice expression, for `Choice` entries only.
    pub fn choice_expr(&self) -> Option<NodeKey> {
        match self {
            ParamEntry::Choice { choice, .. } => Some(*choice),
            _ => None,
        }
    }
}

/// A small variant type for user-defined attributes (spec §3 "User
/// attributes"), capped by [`MAX_ATTRS`] per node.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Tree(NodeKey),
}

/// Maximum number of user attributes a single node may carry (spec §3).
pub const MAX_ATTRS: usize = 8;

/// A single AST node.
///
/// Field presence is governed by the capability predicates on
/// [`NodeKind`]; accessors below enforce the contract described in
/// spec §3/§4.1: calling a guarded accessor on a node whose kind does not
/// satisfy the corresponding predicate is a programming error and is
/// fatal, not a recoverable `Result`.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Loc,

    pub ident: Option<Ident>,
    pub ident2: Option<Ident>,

    pub ports: NodeList,
    pub generics: NodeList,
    pub genmaps: SmallVec<[ParamEntry; 4]>,
    pub decls: NodeList,
    pub stmts: NodeList,
    pub else_stmts: NodeList,
    pub waveforms: NodeList,
    pub triggers: NodeList,
    pub assocs: SmallVec<[ParamEntry; 4]>,
    pub params: SmallVec<[ParamEntry; 4]>,

    pub value: Option<NodeKey>,
    pub literal: Option<Literal>,
    /// Base expression for an array ref/slice, record ref, qualified
    /// expression, type conversion, or attribute reference (spec §4.3
    /// "prefix"); see [`NodeKind::has_operand`].
    pub operand: Option<NodeKey>,
    pub target: Option<NodeKey>,
    pub reference: Option<NodeKey>,
    pub type_of: Option<NodeKey>,
    pub range: Option<NodeKey>,
    pub severity: Option<NodeKey>,
    pub message: Option<NodeKey>,
    pub delay: Option<NodeKey>,
    pub guard_expr: Option<NodeKey>,
    pub cond: Option<NodeKey>,
    /// Range bounds (`ExprRange` in `to`/`downto` form).
    pub left: Option<NodeKey>,
    pub right: Option<NodeKey>,

    pub port_mode: Option<PortMode>,
    pub range_kind: Option<RangeKind>,
    pub subprogram_kind: Option<SubprogramKind>,
    pub attr_kind: Option<AttrKind>,
    pub class: Option<ObjectClass>,
    /// An enumeration literal's position in its type (spec §6).
    pub pos: Option<u32>,

    /// Generation tag for the traversal in progress (spec §3 "Generation
    /// counter"): a node is visited/rewritten/serialised/copied at most
    /// once per pass; this is compared against the arena's current
    /// generation, not incremented directly by node code.
    pub(crate) generation: u32,

    attrs: SmallVec<[(Ident, AttrValue); MAX_ATTRS]>,
}

impl Node {
    pub fn new(kind: NodeKind, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            ident: None,
            ident2: None,
            ports: NodeList::new(),
            generics: NodeList::new(),
            genmaps: SmallVec::new(),
            decls: NodeList::new(),
            stmts: NodeList::new(),
            else_stmts: NodeList::new(),
            waveforms: NodeList::new(),
            triggers: NodeList::new(),
            assocs: SmallVec::new(),
            params: SmallVec::new(),
            value: None,
            literal: None,
            operand: None,
            target: None,
            reference: None,
            type_of: None,
            range: None,
            severity: None,
            message: None,
            delay: None,
            guard_expr: None,
            cond: None,
            left: None,
            right: None,
            port_mode: None,
            range_kind: None,
            subprogram_kind: None,
            attr_kind: None,
            class: None,
            pos: None,
            generation: 0,
            attrs: SmallVec::new(),
        }
    }

    fn guard(&self, ok: bool, field: &str) {
        if !ok {
            fatal(format!(
                "accessed field `{field}` on node of kind {:?}, which does not support it",
                self.kind
            ));
        }
    }

    pub fn get_value(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_value(), "value");
        self.value
    }

    pub fn set_value(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_value(), "value");
        self.value = v;
    }

    pub fn get_literal(&self) -> &Literal {
        self.guard(self.kind.has_literal(), "literal");
        self.literal
            .as_ref()
            .unwrap_or_else(|| fatal("literal node missing its literal payload"))
    }

    pub fn set_literal(&mut self, v: Literal) {
        self.guard(self.kind.has_literal(), "literal");
        self.literal = Some(v);
    }

    pub fn get_operand(&self) -> NodeKey {
        self.guard(self.kind.has_operand(), "operand");
        self.operand
            .unwrap_or_else(|| fatal("node missing its operand"))
    }

    pub fn set_operand(&mut self, v: NodeKey) {
        self.guard(self.kind.has_operand(), "operand");
        self.operand = Some(v);
    }

    pub fn get_target(&self) -> NodeKey {
        self.guard(self.kind.has_target(), "target");
        self.target
            .unwrap_or_else(|| fatal("assignment node missing its target"))
    }

    pub fn set_target(&mut self, v: NodeKey) {
        self.guard(self.kind.has_target(), "target");
        self.target = Some(v);
    }

    pub fn get_ref(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_ref(), "ref");
        self.reference
    }

    pub fn set_ref(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_ref(), "ref");
        self.reference = v;
    }

    pub fn get_type(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_type(), "type");
        self.type_of
    }

    pub fn set_type(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_type(), "type");
        self.type_of = v;
    }

    pub fn get_range(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_range(), "range");
        self.range
    }

    pub fn set_range(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_range(), "range");
        self.range = v;
    }

    pub fn get_cond(&self) -> NodeKey {
        self.guard(self.kind.has_cond(), "cond");
        self.cond.unwrap_or_else(|| fatal("node missing its condition"))
    }

    pub fn set_cond(&mut self, v: NodeKey) {
        self.guard(self.kind.has_cond(), "cond");
        self.cond = Some(v);
    }

    pub fn get_guard(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_guard(), "guard");
        self.guard_expr
    }

    pub fn set_guard(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_guard(), "guard");
        self.guard_expr = v;
    }

    pub fn get_severity(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_severity(), "severity");
        self.severity
    }

    pub fn set_severity(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_severity(), "severity");
        self.severity = v;
    }

    pub fn get_message(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_message(), "message");
        self.message
    }

    pub fn set_message(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_message(), "message");
        self.message = v;
    }

    pub fn get_delay(&self) -> Option<NodeKey> {
        self.guard(self.kind.has_delay(), "delay");
        self.delay
    }

    pub fn set_delay(&mut self, v: Option<NodeKey>) {
        self.guard(self.kind.has_delay(), "delay");
        self.delay = v;
    }

    pub fn get_left(&self) -> NodeKey {
        self.guard(self.kind.has_bounds(), "left");
        self.left.unwrap_or_else(|| fatal("range node missing its left bound"))
    }

    pub fn set_left(&mut self, v: NodeKey) {
        self.guard(self.kind.has_bounds(), "left");
        self.left = Some(v);
    }

    pub fn get_right(&self) -> NodeKey {
        self.guard(self.kind.has_bounds(), "right");
        self.right.unwrap_or_else(|| fatal("range node missing its right bound"))
    }

    pub fn set_right(&mut self, v: NodeKey) {
        self.guard(self.kind.has_bounds(), "right");
        self.right = Some(v);
    }

    pub fn get_class(&self) -> Option<ObjectClass> {
        self.guard(self.kind.has_class(), "class");
        self.class
    }

    pub fn set_class(&mut self, v: ObjectClass) {
        self.guard(self.kind.has_class(), "class");
        self.class = Some(v);
    }

    pub fn get_pos(&self) -> u32 {
        self.guard(self.kind.has_pos(), "pos");
        self.pos.unwrap_or_else(|| fatal("enum literal missing its position"))
    }

    pub fn set_pos(&mut self, v: u32) {
        self.guard(self.kind.has_pos(), "pos");
        self.pos = Some(v);
    }

    pub fn add_port(&mut self, v: NodeKey) {
        self.guard(self.kind.has_ports(), "ports");
        self.ports.push(v);
    }

    pub fn add_generic(&mut self, v: NodeKey) {
        self.guard(self.kind.has_generics(), "generics");
        self.generics.push(v);
    }

    pub fn add_decl(&mut self, v: NodeKey) {
        self.guard(self.kind.has_decls(), "decls");
        self.decls.push(v);
    }

    pub fn add_stmt(&mut self, v: NodeKey) {
        self.guard(self.kind.has_stmts(), "stmts");
        self.stmts.push(v);
    }

    pub fn add_else_stmt(&mut self, v: NodeKey) {
        self.guard(self.kind.has_else_stmts(), "else_stmts");
        self.else_stmts.push(v);
    }

    pub fn add_waveform(&mut self, v: NodeKey) {
        self.guard(self.kind.has_waveforms(), "waveforms");
        self.waveforms.push(v);
    }

    pub fn add_trigger(&mut self, v: NodeKey) {
        self.guard(self.kind.has_triggers(), "triggers");
        self.triggers.push(v);
    }

    pub fn add_assoc(&mut self, v: ParamEntry) {
        self.guard(self.kind.has_assocs(), "assocs");
        self.assocs.push(v);
    }

    pub fn add_param(&mut self, v: ParamEntry) {
        self.guard(self.kind.has_params(), "params");
        self.params.push(v);
    }

    pub fn add_genmap(&mut self, v: ParamEntry) {
        self.guard(self.kind.has_genmaps(), "genmaps");
        self.genmaps.push(v);
    }

    /// User attribute lookup (spec §3 "User attributes").
    pub fn get_attr(&self, name: Ident) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Set a user attribute, replacing any existing entry with the same
    /// name. Fatal once [`MAX_ATTRS`] distinct names would be exceeded —
    /// spec §4.1 lists "oversized attribute table" as a contract violation.
    pub fn set_attr(&mut self, name: Ident, value: AttrValue) {
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
            return;
        }
        if self.attrs.len() >= MAX_ATTRS {
            fatal(format!("attribute table overflow (max {MAX_ATTRS})"));
        }
        self.attrs.push((name, value));
    }

    pub fn attrs(&self) -> &[(Ident, AttrValue)] {
        &self.attrs
    }

    /// Every child key reachable directly from this node, in document
    /// order, across every family that can carry one. Used by
    /// `visit`/`rewrite`/`copy`/`gc` so they don't need a kind-specific
    /// match at every call site.
    pub fn children(&self) -> SmallVec<[NodeKey; 8]> {
        let mut out = SmallVec::new();
        out.extend(self.ports.iter().copied());
        out.extend(self.generics.iter().copied());
        out.extend(self.genmaps.iter().filter_map(|p| p.value()));
        out.extend(self.genmaps.iter().filter_map(|p| p.choice_range()));
        out.extend(self.genmaps.iter().filter_map(|p| p.choice_expr()));
        out.extend(self.decls.iter().copied());
        out.extend(self.stmts.iter().copied());
        out.extend(self.else_stmts.iter().copied());
        out.extend(self.waveforms.iter().copied());
        out.extend(self.triggers.iter().copied());
        out.extend(self.assocs.iter().filter_map(|p| p.value()));
        out.extend(self.assocs.iter().filter_map(|p| p.choice_range()));
        out.extend(self.assocs.iter().filter_map(|p| p.choice_expr()));
        out.extend(self.params.iter().filter_map(|p| p.value()));
        out.extend(self.params.iter().filter_map(|p| p.choice_range()));
        out.extend(self.params.iter().filter_map(|p| p.choice_expr()));
        out.extend(self.value);
        out.extend(self.operand);
        out.extend(self.target);
        out.extend(self.type_of);
        out.extend(self.range);
        out.extend(self.severity);
        out.extend(self.message);
        out.extend(self.delay);
        out.extend(self.guard_expr);
        out.extend(self.cond);
        out.extend(self.left);
        out.extend(self.right);
        if let Some(Literal::Physical { unit, .. }) = &self.literal {
            out.push(*unit);
        }
        if let Some(Literal::EnumLit(key)) = &self.literal {
            out.push(*key);
        }
        for (_, v) in &self.attrs {
            if let AttrValue::Tree(key) = v {
                out.push(*key);
            }
        }
        out
    }
}
