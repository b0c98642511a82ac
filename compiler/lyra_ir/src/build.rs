//! Programmatic AST construction.
//!
//! The parser is an external collaborator, so the builtin declarations
//! and every test construct their ASTs through this builder instead of
//! from source text.

use smallvec::SmallVec;

use crate::arena::{ExprId, StmtId};
use crate::ast::decl::{SharedVariable, Variable};
use crate::ast::expr::{
    BinaryOp, CallArg, CallExpr, Expr, ExprKind, LiteralKind, MapEntry, TupleField, UnaryOp,
};
use crate::ast::program::Compilation;
use crate::ast::stmt::{CondBranch, Stmt, StmtKind};
use crate::instance::TypeInstance;
use crate::shared::Shared;
use crate::token::{Token, TokenKind, STAR_NS};

/// Builds nodes into a compilation's arenas, attributing tokens to one
/// source file.
pub struct AstBuilder<'c> {
    pub comp: &'c mut Compilation,
    source: String,
}

impl<'c> AstBuilder<'c> {
    pub fn new(comp: &'c mut Compilation, source: impl Into<String>) -> Self {
        AstBuilder {
            comp,
            source: source.into(),
        }
    }

    pub fn token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, 1, 1, self.source.as_str())
    }

    pub fn ident_token(&self, name: &str) -> Token {
        self.token(TokenKind::Identifier, name)
    }

    /// An unresolved USER instance named `name` in the search namespace.
    pub fn instance(&self, name: &str) -> TypeInstance {
        TypeInstance::new(self.ident_token(name), STAR_NS)
    }

    /// An unresolved USER instance with parameters.
    pub fn instance_with(&self, name: &str, params: Vec<TypeInstance>) -> TypeInstance {
        let mut inst = self.instance(name);
        for p in params {
            inst.add_param(p);
        }
        inst
    }

    // -- expressions ------------------------------------------------------

    fn alloc(&mut self, kind: ExprKind, token: Token) -> ExprId {
        self.comp.exprs.alloc(Expr::new(kind, token))
    }

    pub fn underscore(&mut self) -> ExprId {
        self.alloc(ExprKind::Underscore, Token::underscore())
    }

    pub fn int(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::Integer, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Integer), token)
    }

    pub fn float(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::Floating, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Floating), token)
    }

    pub fn dec(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::Decimal, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Decimal), token)
    }

    pub fn string(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::String, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Str), token)
    }

    pub fn bits(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::Bits, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Bits), token)
    }

    pub fn qubits(&mut self, lexeme: &str) -> ExprId {
        let token = self.token(TokenKind::Qubits, lexeme);
        self.alloc(ExprKind::Literal(LiteralKind::Qubits), token)
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        let token = self.ident_token(name);
        self.alloc(
            ExprKind::Identifier {
                name: name.to_owned(),
                namespace: None,
            },
            token,
        )
    }

    pub fn reference(&mut self, inner: ExprId) -> ExprId {
        let token = self.comp.exprs.get(inner).token.clone();
        self.alloc(ExprKind::Reference(inner), token)
    }

    pub fn dereference(&mut self, inner: ExprId) -> ExprId {
        let token = self.comp.exprs.get(inner).token.clone();
        self.alloc(ExprKind::Dereference(inner), token)
    }

    pub fn grouped(&mut self, inner: ExprId) -> ExprId {
        let token = self.comp.exprs.get(inner).token.clone();
        self.alloc(ExprKind::Grouped(inner), token)
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let token = self.ident_token(name);
        let args = args.into_iter().map(CallArg::positional).collect();
        self.alloc(
            ExprKind::Call(CallExpr {
                namespace: None,
                name: name.to_owned(),
                args,
                specialisations: Vec::new(),
                return_instance: None,
            }),
            token,
        )
    }

    pub fn call_named(&mut self, name: &str, args: Vec<(&str, ExprId)>) -> ExprId {
        let token = self.ident_token(name);
        let args = args
            .into_iter()
            .map(|(n, v)| CallArg::named(self.token(TokenKind::Identifier, n), v))
            .collect();
        self.alloc(
            ExprKind::Call(CallExpr {
                namespace: None,
                name: name.to_owned(),
                args,
                specialisations: Vec::new(),
                return_instance: None,
            }),
            token,
        )
    }

    pub fn tuple(&mut self, fields: Vec<(Option<&str>, ExprId)>) -> ExprId {
        let token = match fields.first() {
            Some((_, id)) => self.comp.exprs.get(*id).token.clone(),
            None => Token::star(),
        };
        let fields = fields
            .into_iter()
            .map(|(name, value)| TupleField {
                name: name.map(ToOwned::to_owned),
                value,
            })
            .collect();
        self.alloc(ExprKind::Tuple(fields), token)
    }

    pub fn list(&mut self, elements: Vec<ExprId>) -> ExprId {
        let token = match elements.first() {
            Some(id) => self.comp.exprs.get(*id).token.clone(),
            None => Token::star(),
        };
        self.alloc(ExprKind::List(SmallVec::from_vec(elements)), token)
    }

    pub fn map(&mut self, entries: Vec<(ExprId, ExprId)>) -> ExprId {
        let token = match entries.first() {
            Some((key, _)) => self.comp.exprs.get(*key).token.clone(),
            None => Token::star(),
        };
        let entries = entries
            .into_iter()
            .map(|(key, value)| MapEntry { key, value })
            .collect();
        self.alloc(ExprKind::Map(entries), token)
    }

    pub fn cast(&mut self, target: TypeInstance, operand: ExprId) -> ExprId {
        let token = target.token().clone();
        self.alloc(ExprKind::Cast { target, operand }, token)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        let token = self.comp.exprs.get(operand).token.clone();
        self.alloc(ExprKind::Unary { op, operand }, token)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let token = self.comp.exprs.get(lhs).token.clone();
        self.alloc(ExprKind::Binary { op, lhs, rhs }, token)
    }

    pub fn match_(&mut self, lhs: ExprId, rhs: ExprId, negated: bool) -> ExprId {
        let token = self.comp.exprs.get(lhs).token.clone();
        self.alloc(ExprKind::Match { negated, lhs, rhs }, token)
    }

    pub fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        let token = self.comp.exprs.get(lhs).token.clone();
        self.alloc(ExprKind::Assignment { lhs, rhs }, token)
    }

    /// Attach a parser-level type annotation to an existing node.
    pub fn annotate(&mut self, id: ExprId, instance: TypeInstance) {
        self.comp.exprs.get_mut(id).annotation = Some(instance);
    }

    // -- statements -------------------------------------------------------

    fn alloc_stmt(&mut self, kind: StmtKind, token: Token) -> StmtId {
        self.comp.stmts.alloc(Stmt::new(kind, token))
    }

    pub fn block(&mut self, stmts: Vec<StmtId>) -> StmtId {
        let token = match stmts.first() {
            Some(id) => self.comp.stmts.get(*id).token.clone(),
            None => Token::star(),
        };
        self.alloc_stmt(StmtKind::Block(stmts), token)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        let token = self.comp.exprs.get(expr).token.clone();
        self.alloc_stmt(StmtKind::Expression(expr), token)
    }

    /// A local variable declaration statement. Returns the declaration
    /// handle alongside the statement so tests can inspect it.
    pub fn var_stmt(
        &mut self,
        name: &str,
        mutable: bool,
        instance: Option<TypeInstance>,
        initialiser: Option<ExprId>,
    ) -> (StmtId, SharedVariable) {
        let token = self.ident_token(name);
        let mut var = Variable::new(token.clone(), STAR_NS, mutable);
        if let Some(inst) = instance {
            var.set_instance(inst);
        }
        if let Some(init) = initialiser {
            var.set_initialiser(init);
        }
        let var = Shared::new(var);
        let stmt = self.alloc_stmt(StmtKind::Variable(var.clone()), token);
        (stmt, var)
    }

    pub fn if_stmt(
        &mut self,
        branches: Vec<(ExprId, StmtId)>,
        else_body: Option<StmtId>,
    ) -> StmtId {
        let token = match branches.first() {
            Some((cond, _)) => self.comp.exprs.get(*cond).token.clone(),
            None => Token::star(),
        };
        let branches = branches
            .into_iter()
            .map(|(condition, body)| CondBranch { condition, body })
            .collect();
        self.alloc_stmt(
            StmtKind::If {
                branches,
                else_body,
            },
            token,
        )
    }

    pub fn while_stmt(&mut self, condition: ExprId, body: StmtId) -> StmtId {
        let token = self.comp.exprs.get(condition).token.clone();
        self.alloc_stmt(StmtKind::While { condition, body }, token)
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.alloc_stmt(StmtKind::Break, Token::star())
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.alloc_stmt(StmtKind::Continue, Token::star())
    }

    pub fn pass_stmt(&mut self) -> StmtId {
        self.alloc_stmt(StmtKind::Pass, Token::star())
    }

    pub fn return_stmt(&mut self, value: Option<ExprId>) -> StmtId {
        let token = match value {
            Some(id) => self.comp.exprs.get(id).token.clone(),
            None => Token::star(),
        };
        self.alloc_stmt(StmtKind::Return(value), token)
    }
}
