//! Programs and compilations.
//!
//! A program is the unit of import: one source file, identified by the
//! FQN derived from its path, owning its root scope and top-level
//! declarations. The node arenas and the checker's side tables are
//! compilation-wide, because declarations are shared by identity across
//! programs once imports are linked.

use indexmap::IndexMap;

use crate::arena::{ExprArena, StmtArena};
use crate::ast::decl::{SharedFunctionDecl, SharedTypeDecl, SharedVariable};
use crate::facts::{CalleeRegistry, CheckFacts};
use crate::scope::{Scope, SharedScope};
use crate::shared::Shared;
use crate::token::Token;

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Type(SharedTypeDecl),
    Function(SharedFunctionDecl),
    Variable(SharedVariable),
}

/// A declaration together with the namespace it was declared in.
#[derive(Clone, Debug)]
pub struct Declaration {
    pub namespace: String,
    pub decl: Decl,
}

/// An import declaration naming a dependency by FQN.
#[derive(Clone, Debug)]
pub struct Import {
    pub token: Token,
    pub fqn: String,
}

/// One source file: root scope, declarations, imports.
#[derive(Debug)]
pub struct Program {
    fqn: String,
    source: String,
    pub scope: SharedScope,
    pub decls: Vec<Declaration>,
    pub imports: Vec<Import>,
}

impl Program {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let fqn = fqn_of_path(&source);
        Program {
            scope: Shared::new(Scope::new(source.clone())),
            fqn,
            source,
            decls: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn add_decl(&mut self, namespace: impl Into<String>, decl: Decl) {
        self.decls.push(Declaration {
            namespace: namespace.into(),
            decl,
        });
    }

    pub fn add_import(&mut self, token: Token, fqn: impl Into<String>) {
        self.imports.push(Import {
            token,
            fqn: fqn.into(),
        });
    }
}

/// A whole compilation: every loaded program plus the node arenas and
/// side tables they share.
#[derive(Default, Debug)]
pub struct Compilation {
    pub exprs: ExprArena,
    pub stmts: StmtArena,
    pub facts: CheckFacts,
    pub registry: CalleeRegistry,
    programs: IndexMap<String, Program>,
}

impl Compilation {
    pub fn new() -> Self {
        Compilation::default()
    }

    /// Register a loaded program under its FQN. A program loaded twice
    /// keeps its first registration.
    pub fn add_program(&mut self, program: Program) {
        let fqn = program.fqn().to_owned();
        self.programs.entry(fqn).or_insert(program);
    }

    pub fn program(&self, fqn: &str) -> Option<&Program> {
        self.programs.get(fqn)
    }

    pub fn program_mut(&mut self, fqn: &str) -> Option<&mut Program> {
        self.programs.get_mut(fqn)
    }

    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.programs.values()
    }

    pub fn fqns(&self) -> Vec<String> {
        self.programs.keys().cloned().collect()
    }
}

/// Derive a program FQN from its source path: strip the extension,
/// replace path separators with dots. `a/b/c.lyra` → `a.b.c`.
pub fn fqn_of_path(path: &str) -> String {
    let without_ext = match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => &path[..dot],
        _ => path,
    };
    without_ext.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqn_from_path() {
        assert_eq!(fqn_of_path("a/b/c.lyra"), "a.b.c");
        assert_eq!(fqn_of_path("main.lyra"), "main");
        assert_eq!(fqn_of_path("no_extension"), "no_extension");
    }

    #[test]
    fn programs_register_once() {
        let mut comp = Compilation::new();
        comp.add_program(Program::new("main.lyra"));
        comp.add_program(Program::new("main.lyra"));
        assert_eq!(comp.fqns(), vec!["main".to_owned()]);
    }
}
