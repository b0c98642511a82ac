//! The match engine.
//!
//! Decides structural match between a value and a pattern, staging
//! capture bindings as it recurses. Bindings are only installed into the
//! environment when the whole pattern matched; a failed match leaves no
//! trace.

use lyra_ir::{ExprId, ExprKind, SharedScope, STAR_NS};
use lyra_patterns::{EvalError, EvalResult, Value};

use crate::environment::Environment;
use crate::exec::Interpreter;

impl Interpreter<'_> {
    /// Evaluate a match expression: `true` on match (inverted for the
    /// negated form), captures installed in the enclosing scope only on
    /// success.
    pub(crate) fn eval_match(
        &mut self,
        negated: bool,
        lhs: ExprId,
        rhs: ExprId,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let value = self.eval_expr(lhs, env, scope, ns)?;
        let mut staged = Vec::new();
        let matched = self.match_pattern(rhs, &value, &mut staged, scope, ns)?;
        if matched {
            for (name, captured) in staged {
                env.define(name, captured);
            }
        }
        Ok(Value::bool(matched != negated))
    }

    /// Structural match of `value` against the pattern at `pat`.
    pub(crate) fn match_pattern(
        &mut self,
        pat: ExprId,
        value: &Value,
        staged: &mut Vec<(String, Value)>,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<bool, EvalError> {
        let kind = self.comp.exprs.kind(pat).clone();
        let token = self.comp.exprs.get(pat).token.clone();
        match kind {
            ExprKind::Underscore => Ok(true),
            ExprKind::Literal(lit) => {
                let wanted = self.literal_value(lit, &token)?;
                Ok(wanted == *value)
            }
            ExprKind::Identifier { name, namespace } => {
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                let is_constructor = scope
                    .borrow()
                    .constructor_exists(requested, ns, &name, 0);
                if is_constructor {
                    let owner_ns = scope
                        .borrow()
                        .get_constructor(requested, ns, &name, 0)
                        .map_err(|e| EvalError::at(&token, e.to_string()))?
                        .owner
                        .borrow()
                        .namespace()
                        .to_owned();
                    return Ok(matches!(
                        value,
                        Value::Cons {
                            namespace,
                            name: value_name,
                            args,
                        } if *namespace == owner_ns && *value_name == name && args.is_empty()
                    ));
                }
                // A capture: bound on overall success.
                staged.push((name, value.clone()));
                Ok(true)
            }
            ExprKind::Call(call) => {
                let Value::Cons {
                    namespace: value_ns,
                    name: value_name,
                    args: value_args,
                } = value
                else {
                    return Ok(false);
                };
                if *value_name != call.name || value_args.len() != call.args.len() {
                    return Ok(false);
                }

                let requested = call.namespace.as_deref().unwrap_or(STAR_NS);
                let cons = scope
                    .borrow()
                    .get_constructor(requested, ns, &call.name, call.args.len())
                    .map_err(|e| EvalError::at(&token, e.to_string()))?;
                if cons.owner.borrow().namespace() != value_ns.as_str() {
                    return Ok(false);
                }

                let constructor = cons.get();
                if constructor.is_record() {
                    let field_names = constructor.field_names();
                    for arg in &call.args {
                        let Some(name_token) = &arg.name else {
                            return Err(EvalError::at(
                                &token,
                                "record pattern arguments must be named",
                            ));
                        };
                        let Some(position) = field_names
                            .iter()
                            .position(|f| f.as_str() == name_token.lexeme())
                        else {
                            return Err(EvalError::at(
                                name_token,
                                "record pattern names a missing field",
                            ));
                        };
                        if !self.match_pattern(
                            arg.value,
                            &value_args[position],
                            staged,
                            scope,
                            ns,
                        )? {
                            return Ok(false);
                        }
                    }
                } else {
                    for (arg, value_arg) in call.args.iter().zip(value_args.iter()) {
                        if !self.match_pattern(arg.value, value_arg, staged, scope, ns)? {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
            ExprKind::Grouped(inner) => self.match_pattern(inner, value, staged, scope, ns),
            _ => Err(EvalError::at(&token, "this expression is not a pattern")),
        }
    }
}
