//! The per-declaration check driver.
//!
//! Checking catches the first error of each declaration subtree, routes
//! it through the sink, and synchronises at the next declaration
//! boundary so one broken declaration does not hide the errors in the
//! rest of the program.

use lyra_diagnostic::DiagnosticSink;
use lyra_ir::{Compilation, Decl};
use lyra_types::{check_function_decl, check_global_variable, check_type_decl, Sema};

/// Check every declaration of every loaded program.
#[tracing::instrument(level = "debug", skip_all)]
pub fn check_compilation(comp: &mut Compilation, sink: &mut DiagnosticSink) {
    for fqn in comp.fqns() {
        let Some(program) = comp.program(&fqn) else {
            continue;
        };
        let scope = program.scope.clone();
        let decls = program.decls.clone();

        for declaration in decls {
            let mut sema = Sema::new(comp);
            let result = match &declaration.decl {
                Decl::Type(decl) => check_type_decl(decl, &scope, &declaration.namespace),
                Decl::Variable(decl) => {
                    check_global_variable(&mut sema, decl, &scope, &declaration.namespace)
                }
                Decl::Function(decl) => {
                    check_function_decl(&mut sema, decl, &scope, &declaration.namespace)
                }
            };
            if let Err(error) = result {
                tracing::debug!(%error, "declaration failed to check");
                sink.push(error.to_diagnostic());
            }
        }
    }
}
