//! Lyra IR - the data model of the Lyra compiler.
//!
//! This crate contains the core data structures shared by the checker
//! and the evaluator:
//! - Origin tokens (the source-location currency of diagnostics)
//! - Type instances with weak/strong equality
//! - AST nodes in flat arenas addressed by stable ids
//! - Declarations: types, constructors, variables, functions
//! - The scoped, namespaced symbol environment
//! - Programs and the side tables checking attaches to them
//!
//! # Design
//!
//! AST nodes never carry inferred information; the checker writes its
//! results into `CheckFacts`, keyed by node id. Declarations and scopes
//! are shared by identity through `Shared<T>` (`Rc<RefCell<T>>`), which
//! is what specialisation relies on: a clone keeps a live link to its
//! template without ever mutating it.

mod arena;
pub mod ast;
pub mod build;
mod facts;
mod instance;
mod scope;
mod shared;
mod token;

pub use arena::{ExprArena, ExprId, StmtArena, StmtId};
pub use ast::decl::{
    Constructor, FunctionDecl, SharedFunctionDecl, SharedTypeDecl, SharedVariable, TypeDecl,
    Validity, Variable, VariableFlags,
};
pub use ast::expr::{
    BinaryOp, CallArg, CallExpr, Expr, ExprKind, LiteralKind, MapEntry, TupleField, UnaryOp,
};
pub use ast::program::{fqn_of_path, Compilation, Decl, Declaration, Import, Program};
pub use ast::stmt::{CondBranch, Stmt, StmtKind};
pub use build::AstBuilder;
pub use facts::{Callee, CalleeRegistry, CallKind, CheckFacts, MapCallees};
pub use instance::{InstanceCategory, InstanceFlags, TypeInstance};
pub use scope::{ConstructorRef, PublicDecls, Scope, SharedScope, SymbolError};
pub use shared::Shared;
pub use token::{display_ns, Token, TokenKind, BUILTIN_SOURCE, GLOBAL_NS, STAR_NS};
