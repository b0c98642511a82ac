//! The tree-walking interpreter.
//!
//! A single-threaded, synchronous, direct recursive walk over the
//! checked AST. Function calls are synchronous descents; statement
//! interpretation threads a [`Step`] up through blocks so `return`,
//! `break` and `continue` land where they belong.

mod call;
mod expr;
mod pattern;

use rustc_hash::FxHashMap;

use lyra_ir::{
    Compilation, Decl, SharedFunctionDecl, SharedScope, SharedVariable, StmtId, StmtKind,
    GLOBAL_NS, STAR_NS,
};
use lyra_patterns::{BuiltinRegistry, EvalError, EvalResult, Value, ValueSlot};

use crate::environment::Environment;
use crate::qprocessor::{QuantumProcessor, RecordingProcessor};
use crate::step::Step;

/// The evaluator. Walks a checked compilation; never mutates it.
pub struct Interpreter<'c> {
    pub(crate) comp: &'c Compilation,
    main_fqn: String,
    pub(crate) builtins: BuiltinRegistry,
    pub(crate) qproc: Box<dyn QuantumProcessor>,
    /// Runtime slots of global variables, keyed by declaration identity.
    pub(crate) globals: FxHashMap<usize, ValueSlot>,
}

impl<'c> Interpreter<'c> {
    pub fn new(comp: &'c Compilation, main_fqn: impl Into<String>) -> Self {
        Interpreter {
            comp,
            main_fqn: main_fqn.into(),
            builtins: BuiltinRegistry::standard(),
            qproc: Box::new(RecordingProcessor::new()),
            globals: FxHashMap::default(),
        }
    }

    /// Swap in a different quantum processor.
    #[must_use]
    pub fn with_processor(mut self, qproc: Box<dyn QuantumProcessor>) -> Self {
        self.qproc = qproc;
        self
    }

    /// Locate `(*, __main__, 1)` in the main program, build the argv
    /// list, and run it.
    #[tracing::instrument(level = "debug", skip_all, fields(main = self.main_fqn.as_str()))]
    pub fn run(&mut self, argv: &[String]) -> EvalResult {
        self.init_globals()?;

        let main_program = self.comp.program(&self.main_fqn).ok_or_else(|| {
            EvalError::new(format!("the program <{}> is not loaded", self.main_fqn))
        })?;
        let mains =
            main_program
                .scope
                .borrow()
                .get_functions(STAR_NS, GLOBAL_NS, "__main__", 1);
        let main_fn = match mains.as_slice() {
            [] => {
                return Err(EvalError::new(format!(
                    "the program <{}> has no __main__ function taking one argument",
                    self.main_fqn
                )));
            }
            [main_fn] => main_fn.clone(),
            _ => {
                return Err(EvalError::new(
                    "more than one __main__ function taking one argument",
                ));
            }
        };

        let argv_value = Value::List(argv.iter().map(|s| Value::Str(s.clone())).collect());
        self.call_user_function(&main_fn, vec![argv_value])
    }

    /// Evaluate every global variable initialiser, in declaration order,
    /// imports first.
    fn init_globals(&mut self) -> Result<(), EvalError> {
        let comp = self.comp;
        for program in comp.programs() {
            let scope = program.scope.clone();
            for declaration in &program.decls {
                let Decl::Variable(var) = &declaration.decl else {
                    continue;
                };
                let mut env = Environment::new();
                let value =
                    self.eval_variable_init(var, &mut env, &scope, &declaration.namespace)?;
                self.globals
                    .insert(var.addr(), lyra_ir::Shared::new(value));
            }
        }
        Ok(())
    }

    /// Call a user-defined function: fresh activation frame, parameters
    /// bound by position, body interpreted to its final value.
    pub(crate) fn call_user_function(
        &mut self,
        decl: &SharedFunctionDecl,
        args: Vec<Value>,
    ) -> EvalResult {
        let (params, body, scope, ns) = {
            let d = decl.borrow();
            let scope = d.scope().cloned();
            (
                d.params()
                    .iter()
                    .map(|(name, _)| name.clone())
                    .collect::<Vec<_>>(),
                d.body(),
                scope,
                d.namespace().to_owned(),
            )
        };
        let Some(scope) = scope else {
            return Err(EvalError::at(
                decl.borrow().token(),
                "this function was never checked",
            ));
        };

        let mut env = Environment::new();
        for (name, value) in params.into_iter().zip(args.into_iter()) {
            env.define(name, value);
        }

        match body {
            None => Ok(Value::Unit),
            Some(body) => {
                let step = self.interpret_stmt(body, &mut env, &scope, &ns)?;
                Ok(step.into_value())
            }
        }
    }

    /// Interpret one statement.
    pub(crate) fn interpret_stmt(
        &mut self,
        id: StmtId,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<Step, EvalError> {
        let kind = self.comp.stmts.kind(id).clone();
        let token = self.comp.stmts.get(id).token.clone();
        match kind {
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    let step = self.interpret_stmt(stmt, env, scope, ns)?;
                    if !matches!(step, Step::Normal(_)) {
                        return Ok(step);
                    }
                }
                Ok(Step::Normal(Value::Unit))
            }
            StmtKind::Expression(expr) => {
                let value = self.eval_expr(expr, env, scope, ns)?;
                Ok(Step::Normal(value))
            }
            StmtKind::Variable(var) => {
                let value = self.eval_variable_init(&var, env, scope, ns)?;
                let name = var.borrow().name().to_owned();
                env.define(name, value);
                Ok(Step::Normal(Value::Unit))
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    let cond = self.eval_expr(branch.condition, env, scope, ns)?;
                    let cond = cond.as_bool().ok_or_else(|| {
                        EvalError::at(
                            &token,
                            "a condition did not reduce to a boolean constructor",
                        )
                    })?;
                    if cond {
                        return self.interpret_stmt(branch.body, env, scope, ns);
                    }
                }
                match else_body {
                    Some(else_body) => self.interpret_stmt(else_body, env, scope, ns),
                    None => Ok(Step::Normal(Value::Unit)),
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    let cond = self.eval_expr(condition, env, scope, ns)?;
                    let cond = cond.as_bool().ok_or_else(|| {
                        EvalError::at(
                            &token,
                            "a loop condition did not reduce to a boolean constructor",
                        )
                    })?;
                    if !cond {
                        break;
                    }
                    match self.interpret_stmt(body, env, scope, ns)? {
                        Step::Break => break,
                        Step::Continue | Step::Normal(_) => {}
                        step @ Step::Return(_) => return Ok(step),
                    }
                }
                Ok(Step::Normal(Value::Unit))
            }
            StmtKind::Break => Ok(Step::Break),
            StmtKind::Continue => Ok(Step::Continue),
            StmtKind::Pass => Ok(Step::Normal(Value::Unit)),
            StmtKind::Return(value) => match value {
                None => Ok(Step::Return(Value::Unit)),
                Some(value) => {
                    let value = self.eval_expr(value, env, scope, ns)?;
                    Ok(Step::Return(value))
                }
            },
        }
    }

    /// Evaluate a variable initialiser. Quantum declarations route the
    /// ket literal through the quantum processor and keep only the index
    /// range it answers with.
    pub(crate) fn eval_variable_init(
        &mut self,
        var: &SharedVariable,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let (name, token, instance, initialiser) = {
            let v = var.borrow();
            (
                v.name().to_owned(),
                v.token().clone(),
                v.instance().cloned(),
                v.initialiser(),
            )
        };

        if instance.as_ref().is_some_and(lyra_ir::TypeInstance::is_quantum) {
            let Some(init) = initialiser else {
                return Err(EvalError::at(
                    &token,
                    "a quantum variable has no ket initialiser",
                ));
            };
            let bits = self.comp.exprs.get(init).token.lexeme().to_owned();
            let width = bits.len();
            let (start, end) = self.qproc.add_ket(&name, &bits, width);
            return Ok(Value::Qureg {
                label: name,
                start,
                end,
                width,
            });
        }

        match initialiser {
            Some(init) => self.eval_expr(init, env, scope, ns),
            None => Ok(Value::Unit),
        }
    }
}
