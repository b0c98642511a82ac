//! Call dispatch.
//!
//! Every call node leaves checking with a callee triple; the evaluator
//! resolves it through the compilation's callee registry and dispatches
//! either to the builtin registry or to a recursive interpretation of
//! the user-defined body. Constructor applications re-emit themselves
//! with evaluated arguments.

use lyra_ir::{Callee, CallKind, ExprId, ExprKind, SharedScope, Token};
use lyra_patterns::{missing_callee, EvalError, EvalResult, Value};

use crate::environment::Environment;
use crate::exec::Interpreter;

impl Interpreter<'_> {
    pub(crate) fn eval_call(
        &mut self,
        id: ExprId,
        token: &Token,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let ExprKind::Call(call) = self.comp.exprs.kind(id).clone() else {
            return Err(EvalError::at(token, "malformed call node"));
        };
        let kind = self
            .comp
            .facts
            .call_kind(id)
            .ok_or_else(|| EvalError::at(token, "a call node survived checking unresolved"))?;
        let callee = self.resolved_callee(id, token)?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg.value, env, scope, ns)?);
        }

        match kind {
            CallKind::Function => self.dispatch_callee(&callee, args, token),
            CallKind::DefaultConstructor => Ok(Value::Cons {
                namespace: callee.namespace,
                name: callee.mangled,
                args,
            }),
            CallKind::RecordConstructor => {
                // Normalise record arguments to declaration order so
                // structural equality and matching see one canonical
                // shape.
                let cons = scope
                    .borrow()
                    .get_constructor(&callee.namespace, ns, &callee.mangled, callee.arity)
                    .map_err(|e| EvalError::at(token, e.to_string()))?;
                let field_names = cons.get().field_names();
                let mut ordered = Vec::with_capacity(args.len());
                for field in &field_names {
                    let position = call.args.iter().position(|arg| {
                        arg.name
                            .as_ref()
                            .is_some_and(|n| n.lexeme() == field.as_str())
                    });
                    let Some(position) = position else {
                        return Err(EvalError::at(
                            token,
                            format!("missing record argument <{field}>"),
                        ));
                    };
                    ordered.push(args[position].clone());
                }
                Ok(Value::Cons {
                    namespace: callee.namespace,
                    name: callee.mangled,
                    args: ordered,
                })
            }
        }
    }

    /// The callee triple checking attached to this node.
    pub(crate) fn resolved_callee(
        &self,
        id: ExprId,
        token: &Token,
    ) -> Result<Callee, EvalError> {
        self.comp
            .facts
            .callee(id)
            .cloned()
            .ok_or_else(|| EvalError::at(token, "an expression survived checking without a callee"))
    }

    /// Dispatch a resolved callee: builtin registry or user body.
    pub(crate) fn dispatch_callee(
        &mut self,
        callee: &Callee,
        args: Vec<Value>,
        token: &Token,
    ) -> EvalResult {
        let Some(decl) = self.comp.registry.get(callee) else {
            return Err(
                missing_callee(&callee.namespace, &callee.mangled, callee.arity)
                    .with_token(token),
            );
        };
        if decl.borrow().is_builtin() {
            let Some(implementation) = self.builtins.get(callee) else {
                return Err(
                    missing_callee(&callee.namespace, &callee.mangled, callee.arity)
                        .with_token(token),
                );
            };
            return implementation(&args).map_err(|e| e.with_token(token));
        }
        self.call_user_function(&decl, args)
            .map_err(|e| e.with_token(token))
    }
}
