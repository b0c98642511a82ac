//! Arena allocation for AST nodes.
//!
//! Expressions and statements live in flat arenas addressed by stable
//! `u32` ids. Checker rewrites (dot and subscript decaying to calls,
//! namespace resolution) replace the kind at an id in place, so every
//! side table keyed by that id survives the rewrite. Function
//! specialisation allocates fresh ids for the cloned body; templates are
//! never mutated.

use std::fmt;

use crate::ast::expr::{Expr, ExprKind};
use crate::ast::stmt::{Stmt, StmtKind};

/// Stable id of an expression node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Stable id of a statement node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Flat storage for expression nodes.
#[derive(Default, Debug)]
pub struct ExprArena {
    nodes: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = u32::try_from(self.nodes.len()).unwrap_or_else(|_| {
            // 4 billion expressions will not happen before memory runs out
            unreachable!("expression arena overflow")
        });
        self.nodes.push(expr);
        ExprId(id)
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.nodes[id.index()].kind
    }

    /// Replace the kind at `id` in place, keeping the origin token and any
    /// side-table entries keyed by the id.
    pub fn replace_kind(&mut self, id: ExprId, kind: ExprKind) {
        self.nodes[id.index()].kind = kind;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Flat storage for statement nodes.
#[derive(Default, Debug)]
pub struct StmtArena {
    nodes: Vec<Stmt>,
}

impl StmtArena {
    pub fn new() -> Self {
        StmtArena::default()
    }

    pub fn alloc(&mut self, stmt: Stmt) -> StmtId {
        let id = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| unreachable!("statement arena overflow"));
        self.nodes.push(stmt);
        StmtId(id)
    }

    #[inline]
    pub fn get(&self, id: StmtId) -> &Stmt {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: StmtId) -> &StmtKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    #[test]
    fn alloc_and_replace() {
        let mut arena = ExprArena::new();
        let id = arena.alloc(Expr::new(ExprKind::Underscore, Token::underscore()));
        assert!(matches!(arena.kind(id), ExprKind::Underscore));

        arena.replace_kind(id, ExprKind::Grouped(id));
        // token survives the rewrite
        assert!(matches!(arena.kind(id), ExprKind::Grouped(_)));
        assert_eq!(arena.get(id).token.lexeme(), "_");
    }
}
