//! Expression evaluation.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use lyra_ir::{
    BinaryOp, ExprId, ExprKind, InstanceCategory, LiteralKind, SharedScope, Token, STAR_NS,
};
use lyra_patterns::{EvalError, EvalResult, Value, ValueSlot};

use crate::environment::Environment;
use crate::exec::Interpreter;

impl Interpreter<'_> {
    /// Evaluate one expression to a value.
    pub(crate) fn eval_expr(
        &mut self,
        id: ExprId,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let kind = self.comp.exprs.kind(id).clone();
        let token = self.comp.exprs.get(id).token.clone();
        match kind {
            ExprKind::Underscore => Ok(Value::Unit),
            ExprKind::Literal(lit) => self.literal_value(lit, &token),
            ExprKind::Identifier { name, namespace } => {
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                self.eval_identifier(&name, requested, &token, env, scope, ns)
            }
            ExprKind::Reference(inner) => {
                let slot = self.expr_slot(inner, env, scope, ns)?;
                Ok(Value::Ref(slot))
            }
            ExprKind::Dereference(inner) => {
                let value = self.eval_expr(inner, env, scope, ns)?;
                match value {
                    Value::Ref(slot) => Ok(slot.borrow().clone()),
                    _ => Err(EvalError::at(&token, "dereference of a non-reference value")),
                }
            }
            ExprKind::Grouped(inner) => self.eval_expr(inner, env, scope, ns),
            ExprKind::Call(_) => self.eval_call(id, &token, env, scope, ns),
            ExprKind::Tuple(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.eval_expr(field.value, env, scope, ns)?;
                    out.push((field.name, value));
                }
                Ok(Value::Tuple(out))
            }
            ExprKind::List(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    out.push(self.eval_expr(element, env, scope, ns)?);
                }
                Ok(Value::List(out))
            }
            ExprKind::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for entry in entries {
                    let key = self.eval_expr(entry.key, env, scope, ns)?;
                    let value = self.eval_expr(entry.value, env, scope, ns)?;
                    out.push((key, value));
                }
                Ok(Value::Map {
                    entries: out,
                    ops: self.comp.facts.map_ops(id).cloned(),
                })
            }
            ExprKind::Cast { operand, .. } => {
                let value = self.eval_expr(operand, env, scope, ns)?;
                let callee = self.resolved_callee(id, &token)?;
                self.dispatch_callee(&callee, vec![value], &token)
            }
            ExprKind::Unary { operand, .. } => {
                let value = self.eval_expr(operand, env, scope, ns)?;
                let callee = self.resolved_callee(id, &token)?;
                self.dispatch_callee(&callee, vec![value], &token)
            }
            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Dot => self.eval_tuple_attr(lhs, rhs, &token, env, scope, ns),
                BinaryOp::Subscript => self.eval_subscript(lhs, rhs, &token, env, scope, ns),
                BinaryOp::Is | BinaryOp::IsNot => {
                    let left = self.eval_expr(lhs, env, scope, ns)?;
                    let right = self.eval_expr(rhs, env, scope, ns)?;
                    let (Value::Ref(a), Value::Ref(b)) = (&left, &right) else {
                        return Err(EvalError::at(
                            &token,
                            "identity comparison over non-reference values",
                        ));
                    };
                    let same = a.ptr_eq(b);
                    Ok(Value::bool(if op == BinaryOp::Is { same } else { !same }))
                }
                _ => {
                    let left = self.eval_expr(lhs, env, scope, ns)?;
                    let right = self.eval_expr(rhs, env, scope, ns)?;
                    let callee = self.resolved_callee(id, &token)?;
                    self.dispatch_callee(&callee, vec![left, right], &token)
                }
            },
            ExprKind::Match { negated, lhs, rhs } => {
                self.eval_match(negated, lhs, rhs, env, scope, ns)
            }
            ExprKind::Assignment { lhs, rhs } => {
                let value = self.eval_expr(rhs, env, scope, ns)?;
                let slot = match self.comp.exprs.kind(lhs).clone() {
                    ExprKind::Identifier { .. } => self.expr_slot(lhs, env, scope, ns)?,
                    ExprKind::Dereference(inner) => {
                        match self.eval_expr(inner, env, scope, ns)? {
                            Value::Ref(slot) => slot,
                            _ => {
                                return Err(EvalError::at(
                                    &token,
                                    "write through a non-reference value",
                                ));
                            }
                        }
                    }
                    _ => {
                        return Err(EvalError::at(
                            &token,
                            "assignment to a non-assignable expression",
                        ));
                    }
                };
                *slot.borrow_mut() = value.clone();
                Ok(value)
            }
        }
    }

    /// Parse a literal node into its value.
    pub(crate) fn literal_value(&self, lit: LiteralKind, token: &Token) -> EvalResult {
        match lit {
            LiteralKind::Integer => token
                .lexeme()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::at(token, "malformed integer literal")),
            LiteralKind::Floating => token
                .lexeme()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| EvalError::at(token, "malformed floating-point literal")),
            LiteralKind::Decimal => BigDecimal::from_str(token.lexeme())
                .map(Value::Dec)
                .map_err(|_| EvalError::at(token, "malformed decimal literal")),
            LiteralKind::Str => Ok(Value::Str(token.lexeme().to_owned())),
            LiteralKind::Bits => Ok(Value::Bits(token.lexeme().to_owned())),
            LiteralKind::Qubits => Err(EvalError::at(
                token,
                "a ket literal can only initialise a quantum variable",
            )),
        }
    }

    fn eval_identifier(
        &mut self,
        name: &str,
        requested: &str,
        token: &Token,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        if let Some(slot) = self.lookup_slot(name, requested, env, scope, ns) {
            return Ok(slot.borrow().clone());
        }

        // Not a variable: a nullary constructor value.
        let cons = scope
            .borrow()
            .get_constructor(requested, ns, name, 0)
            .map_err(|e| EvalError::at(token, e.to_string()))?;
        let namespace = cons.owner.borrow().namespace().to_owned();
        Ok(Value::Cons {
            namespace,
            name: name.to_owned(),
            args: Vec::new(),
        })
    }

    /// Resolve the storage slot behind a variable identifier.
    pub(crate) fn lookup_slot(
        &self,
        name: &str,
        requested: &str,
        env: &Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> Option<ValueSlot> {
        if requested == STAR_NS {
            if let Some(slot) = env.lookup(name) {
                return Some(slot);
            }
        }
        let var = scope.borrow().get_variable(requested, ns, name).ok()?;
        if var.borrow().is_global() {
            return self.globals.get(&var.addr()).cloned();
        }
        env.lookup(name)
    }

    /// The slot of an identifier expression.
    pub(crate) fn expr_slot(
        &mut self,
        id: ExprId,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<ValueSlot, EvalError> {
        let token = self.comp.exprs.get(id).token.clone();
        let ExprKind::Identifier { name, namespace } = self.comp.exprs.kind(id).clone() else {
            return Err(EvalError::at(&token, "expected a variable"));
        };
        let requested = namespace.as_deref().unwrap_or(STAR_NS);
        self.lookup_slot(&name, requested, env, scope, ns)
            .ok_or_else(|| {
                EvalError::at(&token, format!("the variable <{name}> has no storage"))
            })
    }

    /// Named-tuple attribute selection: the only dot expression that
    /// survives checking.
    fn eval_tuple_attr(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        token: &Token,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let ExprKind::Identifier { name: field, .. } = self.comp.exprs.kind(rhs).clone() else {
            return Err(EvalError::at(token, "malformed attribute access"));
        };
        let value = self.eval_expr(lhs, env, scope, ns)?;
        let Value::Tuple(fields) = value else {
            return Err(EvalError::at(token, "attribute access on a non-tuple value"));
        };
        fields
            .into_iter()
            .find_map(|(name, value)| (name.as_deref() == Some(field.as_str())).then_some(value))
            .ok_or_else(|| {
                EvalError::at(token, format!("this tuple has no element named <{field}>"))
            })
    }

    fn eval_subscript(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        token: &Token,
        env: &mut Environment,
        scope: &SharedScope,
        ns: &str,
    ) -> EvalResult {
        let category = self
            .comp
            .facts
            .instance(lhs)
            .map(lyra_ir::TypeInstance::category)
            .ok_or_else(|| EvalError::at(token, "subscript over an unchecked expression"))?;

        match category {
            InstanceCategory::Tuple => {
                let key_token = self.comp.exprs.get(rhs).token.clone();
                let index: usize = key_token
                    .lexeme()
                    .parse()
                    .map_err(|_| EvalError::at(&key_token, "malformed tuple subscript"))?;
                let value = self.eval_expr(lhs, env, scope, ns)?;
                let Value::Tuple(mut fields) = value else {
                    return Err(EvalError::at(token, "subscript on a non-tuple value"));
                };
                if index >= fields.len() {
                    return Err(EvalError::at(
                        &key_token,
                        format!("tuple subscript {index} out of range"),
                    ));
                }
                Ok(fields.swap_remove(index).1)
            }
            InstanceCategory::List => {
                let key = self.eval_expr(rhs, env, scope, ns)?.as_int()?;
                let value = self.eval_expr(lhs, env, scope, ns)?;
                let Value::List(elements) = value else {
                    return Err(EvalError::at(token, "subscript on a non-list value"));
                };
                let index = usize::try_from(key).ok();
                Ok(match index.and_then(|i| elements.into_iter().nth(i)) {
                    Some(element) => Value::just(element),
                    None => Value::none(),
                })
            }
            InstanceCategory::Map => {
                let key = self.eval_expr(rhs, env, scope, ns)?;
                let value = self.eval_expr(lhs, env, scope, ns)?;
                let Value::Map { entries, ops } = value else {
                    return Err(EvalError::at(token, "subscript on a non-map value"));
                };
                let Some(ops) = ops else {
                    return Ok(Value::none());
                };
                let wanted = self.dispatch_callee(&ops.hash, vec![key], token)?;
                for (entry_key, entry_value) in entries {
                    let entry_hash =
                        self.dispatch_callee(&ops.hash, vec![entry_key], token)?;
                    let equal = self
                        .dispatch_callee(&ops.eq, vec![entry_hash, wanted.clone()], token)?
                        .as_bool()
                        .unwrap_or(false);
                    if equal {
                        return Ok(Value::just(entry_value));
                    }
                }
                Ok(Value::none())
            }
            InstanceCategory::User => Err(EvalError::at(
                token,
                "subscript over a user type survived checking",
            )),
        }
    }
}
