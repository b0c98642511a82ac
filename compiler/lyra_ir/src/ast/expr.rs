//! Expression nodes.
//!
//! The variant set is closed: the checker pattern-matches on `ExprKind`
//! exhaustively and rewrites nodes in place (a dot expression whose left
//! side is a namespace collapses into the namespaced inner expression; a
//! subscript over a user type decays into a `__getitem_<key>__` call).
//!
//! A node may carry a parser-supplied type instance in `annotation`; the
//! checker accepts it when it is weakly equal to the inferred instance
//! and rejects it otherwise.

use smallvec::SmallVec;

use crate::arena::ExprId;
use crate::instance::TypeInstance;
use crate::token::Token;

/// An expression node: kind, origin token, optional parser annotation.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub token: Token,
    pub annotation: Option<TypeInstance>,
}

impl Expr {
    pub fn new(kind: ExprKind, token: Token) -> Self {
        Expr {
            kind,
            token,
            annotation: None,
        }
    }

    pub fn with_annotation(kind: ExprKind, token: Token, annotation: TypeInstance) -> Self {
        Expr {
            kind,
            token,
            annotation: Some(annotation),
        }
    }
}

/// Literal categories. The lexical value is the node's token lexeme.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LiteralKind {
    Integer,
    Floating,
    Decimal,
    Str,
    /// Classical bit string; length must be 1, 2, 4 or 8.
    Bits,
    /// Quantum ket; length must be 1, 2, 4 or 8.
    Qubits,
}

/// Unary operators, decaying to fixed function names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `+` → `__pos__`
    Plus,
    /// `-` → `__neg__`
    Minus,
    /// `~` → `__bnot__`
    BitNot,
    /// `!` → `__not__`
    LogicalNot,
}

impl UnaryOp {
    /// The function name the operator decays to.
    pub fn decay_name(self) -> &'static str {
        match self {
            UnaryOp::Plus => "__pos__",
            UnaryOp::Minus => "__neg__",
            UnaryOp::BitNot => "__bnot__",
            UnaryOp::LogicalNot => "__not__",
        }
    }
}

/// Binary operators.
///
/// Most decay to fixed function names; `Is`/`IsNot` are structural
/// reference comparisons handled directly by the evaluator, and
/// `Dot`/`Subscript` are resolved by the checker.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    IsNot,
    Dot,
    Subscript,
}

impl BinaryOp {
    /// The function name the operator decays to, or `None` for the
    /// operators the checker and evaluator handle structurally.
    pub fn decay_name(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("__add__"),
            BinaryOp::Sub => Some("__sub__"),
            BinaryOp::Mul => Some("__mul__"),
            BinaryOp::Div => Some("__div__"),
            BinaryOp::Mod => Some("__mod__"),
            BinaryOp::Pow => Some("__pow__"),
            BinaryOp::Shl => Some("__lshift__"),
            BinaryOp::Shr => Some("__rshift__"),
            BinaryOp::LogicalAnd => Some("__and__"),
            BinaryOp::LogicalOr => Some("__or__"),
            BinaryOp::BitAnd => Some("__band__"),
            BinaryOp::BitOr => Some("__bor__"),
            BinaryOp::BitXor => Some("__xor__"),
            BinaryOp::Eq => Some("__eq__"),
            BinaryOp::Ne => Some("__ne__"),
            BinaryOp::Lt => Some("__lt__"),
            BinaryOp::Le => Some("__le__"),
            BinaryOp::Gt => Some("__gt__"),
            BinaryOp::Ge => Some("__ge__"),
            BinaryOp::Is | BinaryOp::IsNot | BinaryOp::Dot | BinaryOp::Subscript => None,
        }
    }
}

/// A call argument. `name` is `None` for positional (star-token)
/// arguments and carries the field token for record-constructor calls.
#[derive(Clone, Debug)]
pub struct CallArg {
    pub name: Option<Token>,
    pub value: ExprId,
}

impl CallArg {
    pub fn positional(value: ExprId) -> Self {
        CallArg { name: None, value }
    }

    pub fn named(name: Token, value: ExprId) -> Self {
        CallArg {
            name: Some(name),
            value,
        }
    }
}

/// A call expression: function call, default-constructor or
/// record-constructor application. Which of the three it is gets decided
/// by the checker and recorded in the side tables.
#[derive(Clone, Debug)]
pub struct CallExpr {
    /// Requested namespace; `None` until a dot rewrite qualifies the call.
    pub namespace: Option<String>,
    pub name: String,
    pub args: Vec<CallArg>,
    /// Explicit specialisation instances supplied at the call site.
    pub specialisations: Vec<TypeInstance>,
    /// Return-type instance attached on the call literal. Only legal on
    /// function calls.
    pub return_instance: Option<TypeInstance>,
}

/// A tuple element, optionally named.
#[derive(Clone, Debug)]
pub struct TupleField {
    pub name: Option<String>,
    pub value: ExprId,
}

/// A map literal entry.
#[derive(Copy, Clone, Debug)]
pub struct MapEntry {
    pub key: ExprId,
    pub value: ExprId,
}

/// Expression variants. The set is closed.
#[derive(Clone, Debug)]
pub enum ExprKind {
    /// The `_` placeholder.
    Underscore,
    Literal(LiteralKind),
    /// `ref v`
    Reference(ExprId),
    /// `dref v`
    Dereference(ExprId),
    Identifier {
        name: String,
        /// Set when a dot rewrite qualified the identifier.
        namespace: Option<String>,
    },
    Call(CallExpr),
    Grouped(ExprId),
    Tuple(Vec<TupleField>),
    List(SmallVec<[ExprId; 4]>),
    Map(Vec<MapEntry>),
    Cast {
        target: TypeInstance,
        operand: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// `lhs === rhs` / `lhs =!= rhs`
    Match {
        negated: bool,
        lhs: ExprId,
        rhs: ExprId,
    },
    Assignment {
        lhs: ExprId,
        rhs: ExprId,
    },
}
