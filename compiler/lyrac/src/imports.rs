//! Import linking.
//!
//! `import a.b.c` names a previously loaded program by FQN. Linking
//! walks the dependency graph from the main program, rejects cycles,
//! then merges the public declarations of every dependency into the
//! main program's scope, namespace by namespace. A clash on an
//! identical (namespace, name, arity) is an error.

use std::fmt;

use rustc_hash::FxHashSet;

use lyra_diagnostic::{Diagnostic, ErrorCode};
use lyra_ir::{Compilation, SymbolError, Token};

/// Errors from import linking.
#[derive(Clone, Debug)]
pub enum LinkError {
    /// The import chain loops back onto itself.
    Cycle { token: Token, chain: Vec<String> },
    /// An imported FQN was never loaded.
    MissingProgram { token: Token, fqn: String },
    /// Two programs declare the same symbol in the same namespace.
    Clash { token: Token, error: SymbolError },
}

impl LinkError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LinkError::Cycle { token, chain } => Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("import cycle: {}", chain.join(" -> ")))
                .with_token(token.clone(), token.lexeme().to_owned()),
            LinkError::MissingProgram { token, fqn } => Diagnostic::error(ErrorCode::E1005)
                .with_message(format!("the imported program <{fqn}> is not loaded"))
                .with_token(token.clone(), token.lexeme().to_owned()),
            LinkError::Clash { token, error } => Diagnostic::error(ErrorCode::E1002)
                .with_message(error.to_string())
                .with_token(token.clone(), token.lexeme().to_owned()),
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Cycle { chain, .. } => {
                write!(f, "import cycle: {}", chain.join(" -> "))
            }
            LinkError::MissingProgram { fqn, .. } => {
                write!(f, "the imported program <{fqn}> is not loaded")
            }
            LinkError::Clash { error, .. } => write!(f, "{error}"),
        }
    }
}

/// Link the main program: verify the dependency graph is acyclic and
/// merge every dependency's public declarations into the main scope.
pub fn link(comp: &mut Compilation, main_fqn: &str) -> Result<(), LinkError> {
    let mut order = Vec::new();
    let mut visiting = Vec::new();
    let mut visited = FxHashSet::default();
    visit(comp, main_fqn, &mut visiting, &mut visited, &mut order)?;

    let main_scope = match comp.program(main_fqn) {
        Some(main) => main.scope.clone(),
        None => return Ok(()),
    };

    for fqn in order {
        if fqn == main_fqn {
            continue;
        }
        let Some(dependency) = comp.program(&fqn) else {
            continue;
        };
        let dep_scope = dependency.scope.clone();
        let import_token = Token::synthetic(lyra_ir::TokenKind::Identifier, &fqn);

        for ns in dep_scope.borrow().namespaces() {
            let public = dep_scope.borrow().public_decls(&ns);
            let mut scope = main_scope.borrow_mut();
            for decl in public.types {
                scope.add_type(&ns, decl).map_err(|error| LinkError::Clash {
                    token: import_token.clone(),
                    error,
                })?;
            }
            for decl in public.functions {
                scope
                    .add_function(&ns, decl)
                    .map_err(|error| LinkError::Clash {
                        token: import_token.clone(),
                        error,
                    })?;
            }
            for decl in public.variables {
                scope
                    .add_variable(&ns, decl)
                    .map_err(|error| LinkError::Clash {
                        token: import_token.clone(),
                        error,
                    })?;
            }
        }
    }
    Ok(())
}

fn visit(
    comp: &Compilation,
    fqn: &str,
    visiting: &mut Vec<String>,
    visited: &mut FxHashSet<String>,
    order: &mut Vec<String>,
) -> Result<(), LinkError> {
    if visited.contains(fqn) {
        return Ok(());
    }
    if visiting.iter().any(|f| f == fqn) {
        let mut chain = visiting.clone();
        chain.push(fqn.to_owned());
        return Err(LinkError::Cycle {
            token: Token::synthetic(lyra_ir::TokenKind::Identifier, fqn),
            chain,
        });
    }

    let Some(program) = comp.program(fqn) else {
        return Err(LinkError::MissingProgram {
            token: Token::synthetic(lyra_ir::TokenKind::Identifier, fqn),
            fqn: fqn.to_owned(),
        });
    };
    let imports: Vec<(Token, String)> = program
        .imports
        .iter()
        .map(|i| (i.token.clone(), i.fqn.clone()))
        .collect();

    visiting.push(fqn.to_owned());
    for (token, import_fqn) in imports {
        match visit(comp, &import_fqn, visiting, visited, order) {
            Ok(()) => {}
            Err(LinkError::MissingProgram { fqn, .. }) => {
                return Err(LinkError::MissingProgram { token, fqn });
            }
            Err(other) => return Err(other),
        }
    }
    visiting.pop();
    visited.insert(fqn.to_owned());
    // Dependencies land before their importers.
    order.push(fqn.to_owned());
    Ok(())
}
