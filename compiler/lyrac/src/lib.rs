//! The Lyra compiler driver.
//!
//! Wires the pipeline end to end: load parsed programs, link imports,
//! check every declaration, interpret. The lexer and parser are
//! external collaborators; programs arrive as ASTs (see
//! `lyra_ir::AstBuilder`).
//!
//! ```no_run
//! use lyrac::{Compiler, CompileOptions};
//!
//! let mut compiler = Compiler::new(CompileOptions::default());
//! // compiler.load(program)?; ... for each parsed program
//! // compiler.compile("main")?;
//! // let exit = compiler.run("main", &[])?;
//! ```

mod check;
mod imports;
mod run;

pub use imports::{link, LinkError};
pub use run::{exit_value, run, run_with_processor};

use lyra_diagnostic::{DiagnosticEmitter, DiagnosticSink, TerminalEmitter};
use lyra_eval::QuantumProcessor;
use lyra_ir::{Compilation, Decl, Program};
use lyra_patterns::{EvalError, Value};
use lyra_types::{builtins, SemaError};

/// Driver configuration.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Render collected diagnostics to stderr after checking.
    pub report_diagnostics: bool,
}

/// The compiler facade: owns the compilation and the diagnostic sink.
pub struct Compiler {
    options: CompileOptions,
    comp: Compilation,
    sink: DiagnosticSink,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            options,
            comp: Compilation::new(),
            sink: DiagnosticSink::new(),
        }
    }

    /// Mutable access to the compilation for program construction.
    pub fn compilation_mut(&mut self) -> &mut Compilation {
        &mut self.comp
    }

    pub fn compilation(&self) -> &Compilation {
        &self.comp
    }

    pub fn sink(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Load a parsed program: install the builtin declarations into its
    /// root scope, register its top-level declarations, and add it to
    /// the compilation under its FQN.
    pub fn load(&mut self, program: Program) -> Result<(), SemaError> {
        builtins::install(&program.scope)?;

        for declaration in &program.decls {
            let ns = declaration.namespace.clone();
            program.scope.borrow_mut().declare_namespace(&ns);
            let result = match &declaration.decl {
                Decl::Type(decl) => {
                    let token = decl.borrow().token().clone();
                    program
                        .scope
                        .borrow_mut()
                        .add_type(&ns, decl.clone())
                        .map_err(|e| SemaError::symbol(&token, e))
                }
                Decl::Function(decl) => {
                    let token = decl.borrow().token().clone();
                    program
                        .scope
                        .borrow_mut()
                        .add_function(&ns, decl.clone())
                        .map_err(|e| SemaError::symbol(&token, e))
                }
                Decl::Variable(decl) => {
                    decl.borrow_mut().set_global(true);
                    let token = decl.borrow().token().clone();
                    program
                        .scope
                        .borrow_mut()
                        .add_variable(&ns, decl.clone())
                        .map_err(|e| SemaError::symbol(&token, e))
                }
            };
            result?;
        }

        self.comp.add_program(program);
        Ok(())
    }

    /// Link imports and check every declaration. Returns `true` when the
    /// compilation is clean.
    pub fn compile(&mut self, main_fqn: &str) -> bool {
        if let Err(error) = imports::link(&mut self.comp, main_fqn) {
            self.sink.push(error.to_diagnostic());
        } else {
            check::check_compilation(&mut self.comp, &mut self.sink);
        }

        if self.options.report_diagnostics && !self.sink.is_empty() {
            let mut emitter = TerminalEmitter::new();
            self.sink.report(&mut emitter);
        }
        !self.sink.has_errors()
    }

    /// Interpret a compiled program. Refuses to run a dirty compilation.
    pub fn run(&mut self, main_fqn: &str, argv: &[String]) -> Result<Value, EvalError> {
        if self.sink.has_errors() {
            return Err(EvalError::new(
                "refusing to interpret a program that failed checking",
            ));
        }
        run::run(&self.comp, main_fqn, argv).inspect_err(|error| {
            if self.options.report_diagnostics {
                let mut emitter = TerminalEmitter::new();
                emitter.emit(&lyra_eval::diagnostics::to_diagnostic(error));
            }
        })
    }

    /// Interpret with a caller-supplied quantum processor.
    pub fn run_with_processor(
        &mut self,
        main_fqn: &str,
        argv: &[String],
        qproc: Box<dyn QuantumProcessor>,
    ) -> Result<Value, EvalError> {
        if self.sink.has_errors() {
            return Err(EvalError::new(
                "refusing to interpret a program that failed checking",
            ));
        }
        run::run_with_processor(&self.comp, main_fqn, argv, qproc)
    }
}

/// Initialise tracing from `RUST_LOG`, once. Safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
