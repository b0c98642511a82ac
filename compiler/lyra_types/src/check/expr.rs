//! Expression checking.
//!
//! `check_expression` first runs inference (which performs the AST
//! rewrites and resolves callees), then enforces the well-formedness
//! rules on the rewritten tree: match containment, underscore
//! dependence, argument completeness, quantum by-value bans, assignment
//! forms, and pattern validity.
//!
//! Pattern capture variables are installed into the enclosing scope
//! here, during checking; installation only ever happens through an
//! explicit `PatternContext`, never through hidden checker state.

use lyra_ir::{
    BinaryOp, ExprId, ExprKind, Shared, SharedScope, Token, TypeInstance, Validity, Variable,
    STAR_NS,
};

use crate::context::Sema;
use crate::env;
use crate::error::SemaError;
use crate::infer::constructor_result_instance;
use crate::instance_check::complex_check;
use crate::specialise::{substitute, Bindings};

/// Where a pattern is being checked, and therefore where its capture
/// variables land.
pub struct PatternContext<'a> {
    pub scope: &'a SharedScope,
    pub namespace: &'a str,
}

impl Sema<'_> {
    /// Check an expression: infer it, then enforce the well-formedness
    /// rules on the (possibly rewritten) subtree.
    pub fn check_expression(
        &mut self,
        id: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let inst = self.infer(id, scope, ns)?;
        self.enforce_rules(id, scope, ns)?;
        Ok(inst)
    }

    fn enforce_rules(
        &mut self,
        id: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<(), SemaError> {
        let kind = self.comp.exprs.kind(id).clone();
        let token = self.comp.exprs.get(id).token.clone();
        match kind {
            ExprKind::Underscore | ExprKind::Literal(_) | ExprKind::Identifier { .. } => Ok(()),
            ExprKind::Reference(inner) => {
                if !matches!(self.comp.exprs.kind(inner), ExprKind::Identifier { .. }) {
                    return Err(SemaError::invalid_expression(
                        &token,
                        "only a variable can be referenced",
                    ));
                }
                self.enforce_rules(inner, scope, ns)
            }
            ExprKind::Dereference(inner) => self.enforce_rules(inner, scope, ns),
            ExprKind::Call(call) => {
                if self.comp.exprs.get(id).annotation.is_some() && call.return_instance.is_some()
                {
                    return Err(SemaError::invalid_expression(
                        &token,
                        "a call may not carry a type annotation and a return type \
                         instance at the same time",
                    ));
                }
                for arg in &call.args {
                    if self.contains_underscore(arg.value) {
                        return Err(SemaError::invalid_expression(
                            &token,
                            "a call may not depend on the underscore expression",
                        ));
                    }
                    self.enforce_rules(arg.value, scope, ns)?;

                    let arg_token = self.comp.exprs.get(arg.value).token.clone();
                    let Some(arg_inst) = self.comp.facts.instance(arg.value).cloned() else {
                        continue;
                    };
                    if !arg_inst.is_complete() && !arg_inst.is_parametrized() {
                        return Err(SemaError::invalid_expression(
                            &arg_token,
                            "a call argument must have a complete type instance",
                        ));
                    }
                    if arg_inst.is_quantum() {
                        return Err(SemaError::invalid_expression(
                            &arg_token,
                            "a quantum value may not be passed by value; pass a reference",
                        ));
                    }
                }
                Ok(())
            }
            ExprKind::Grouped(inner) => {
                self.reject_match_inside(&token, inner)?;
                self.enforce_rules(inner, scope, ns)
            }
            ExprKind::Tuple(fields) => {
                for field in &fields {
                    self.reject_match_inside(&token, field.value)?;
                    self.enforce_rules(field.value, scope, ns)?;
                }
                Ok(())
            }
            ExprKind::List(elements) => {
                for element in &elements {
                    self.reject_match_inside(&token, *element)?;
                    self.enforce_rules(*element, scope, ns)?;
                }
                Ok(())
            }
            ExprKind::Map(entries) => {
                for entry in &entries {
                    self.reject_match_inside(&token, entry.key)?;
                    self.reject_match_inside(&token, entry.value)?;
                    self.enforce_rules(entry.key, scope, ns)?;
                    self.enforce_rules(entry.value, scope, ns)?;
                }
                Ok(())
            }
            ExprKind::Cast { operand, .. } => {
                self.reject_match_inside(&token, operand)?;
                self.enforce_rules(operand, scope, ns)
            }
            ExprKind::Unary { operand, .. } => {
                self.reject_match_inside(&token, operand)?;
                self.enforce_rules(operand, scope, ns)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.reject_match_inside(&token, lhs)?;
                self.reject_match_inside(&token, rhs)?;
                self.enforce_rules(lhs, scope, ns)?;
                // A named-tuple attribute keeps its identifier right side,
                // which is not an expression of its own.
                if op != BinaryOp::Dot {
                    self.enforce_rules(rhs, scope, ns)?;
                }
                Ok(())
            }
            ExprKind::Match { lhs, rhs, .. } => {
                self.enforce_rules(lhs, scope, ns)?;
                let lhs_inst = self.infer(lhs, scope, ns)?;
                let ctx = PatternContext {
                    scope,
                    namespace: ns,
                };
                self.check_pattern(rhs, &lhs_inst, &ctx)
            }
            ExprKind::Assignment { lhs, rhs } => {
                self.reject_match_inside(&token, rhs)?;
                self.enforce_rules(rhs, scope, ns)?;
                self.check_assignment_target(&token, lhs, rhs, scope, ns)
            }
        }
    }

    fn check_assignment_target(
        &mut self,
        token: &Token,
        lhs: ExprId,
        rhs: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<(), SemaError> {
        let rhs_inst = self.infer(rhs, scope, ns)?;
        if rhs_inst.is_quantum() {
            return Err(SemaError::invalid_expression(
                token,
                "a quantum value may not appear on the right side of an assignment",
            ));
        }

        let lhs_inst = match self.comp.exprs.kind(lhs).clone() {
            ExprKind::Identifier { name, namespace } => {
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                let var = env::find_variable(scope, requested, ns, &name, token)?;
                let var = var.borrow();
                let inst = var.instance().cloned().unwrap_or_else(TypeInstance::star);
                if inst.is_reference() {
                    return Err(SemaError::invalid_expression(
                        token,
                        "a reference may not be reassigned",
                    ));
                }
                if !var.is_mutable() {
                    return Err(SemaError::invalid_expression(
                        token,
                        format!("the immutable variable <{name}> may not be reassigned"),
                    ));
                }
                inst
            }
            ExprKind::Dereference(inner) => {
                let ExprKind::Identifier { name, namespace } =
                    self.comp.exprs.kind(inner).clone()
                else {
                    return Err(SemaError::invalid_expression(
                        token,
                        "only a variable reference can be written through",
                    ));
                };
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                let var = env::find_variable(scope, requested, ns, &name, token)?;
                if !var.borrow().is_mutable() {
                    return Err(SemaError::invalid_expression(
                        token,
                        format!(
                            "writing through <{name}> requires the reference and its \
                             target to be mutable"
                        ),
                    ));
                }
                self.infer(lhs, scope, ns)?
            }
            _ => {
                return Err(SemaError::invalid_expression(
                    token,
                    "the left side of an assignment must be a variable or a dereference",
                ));
            }
        };

        let matches = if lhs_inst.is_complete() && rhs_inst.is_complete() {
            lhs_inst.strong_eq(&rhs_inst)
        } else {
            lhs_inst.weak_eq(&rhs_inst)
        };
        if !matches {
            return Err(SemaError::invalid_expression(
                token,
                format!(
                    "cannot assign <{rhs_inst}> to a target of type instance <{lhs_inst}>"
                ),
            ));
        }
        Ok(())
    }

    /// Validate a match pattern against the instance being matched, and
    /// install capture variables into the pattern context's scope.
    pub fn check_pattern(
        &mut self,
        pat: ExprId,
        expected: &TypeInstance,
        ctx: &PatternContext<'_>,
    ) -> Result<(), SemaError> {
        let kind = self.comp.exprs.kind(pat).clone();
        let token = self.comp.exprs.get(pat).token.clone();
        match kind {
            ExprKind::Underscore => Ok(()),
            ExprKind::Literal(lit) => {
                let inst = self.infer_literal(lit, &token, ctx.scope)?;
                if !inst.weak_eq(expected) {
                    return Err(SemaError::invalid_expression(
                        &token,
                        format!(
                            "this pattern has type instance <{inst}> while the matched \
                             expression has <{expected}>"
                        ),
                    ));
                }
                self.comp.facts.set_instance(pat, inst);
                Ok(())
            }
            ExprKind::Identifier { name, namespace } => {
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                let is_constructor = ctx
                    .scope
                    .borrow()
                    .constructor_exists(requested, ctx.namespace, &name, 0);
                if is_constructor {
                    let cons = env::find_constructor(
                        ctx.scope,
                        requested,
                        ctx.namespace,
                        &name,
                        0,
                        &token,
                    )?;
                    let inst = constructor_result_instance(&cons.owner, &Bindings::default());
                    if !inst.weak_eq(expected) {
                        return Err(SemaError::invalid_expression(
                            &token,
                            format!(
                                "the constructor pattern <{name}> belongs to <{inst}>, \
                                 not <{expected}>"
                            ),
                        ));
                    }
                    self.comp.facts.set_instance(pat, inst);
                    return Ok(());
                }
                self.declare_capture(pat, &name, &token, expected, ctx)
            }
            ExprKind::Call(call) => {
                let requested = call.namespace.as_deref().unwrap_or(STAR_NS);
                let cons = env::find_constructor(
                    ctx.scope,
                    requested,
                    ctx.namespace,
                    &call.name,
                    call.args.len(),
                    &token,
                )?;

                // The pattern's constructor must belong to the matched type.
                let same_type = expected
                    .type_ref()
                    .is_some_and(|decl| decl.ptr_eq(&cons.owner));
                if !same_type {
                    return Err(SemaError::invalid_expression(
                        &token,
                        format!(
                            "the constructor pattern <{}> does not belong to the matched \
                             type instance <{expected}>",
                            call.name
                        ),
                    ));
                }

                // Bind the owning type's standins from the matched
                // instance, then recurse with substituted parameter
                // expectations.
                let standins = cons.owner.borrow().standins().to_vec();
                let mut bindings = Bindings::default();
                for (standin, param) in standins.iter().zip(expected.params().iter()) {
                    bindings.insert(standin.lexeme().to_owned(), param.clone());
                }

                let constructor = cons.get();
                let declared = constructor.param_instances();
                let field_names = constructor.field_names();
                if constructor.is_record() {
                    for arg in &call.args {
                        let Some(name_token) = &arg.name else {
                            return Err(SemaError::invalid_expression(
                                &token,
                                "record-constructor pattern arguments must be named",
                            ));
                        };
                        let Some(position) = field_names
                            .iter()
                            .position(|f| f.as_str() == name_token.lexeme())
                        else {
                            return Err(SemaError::invalid_expression(
                                name_token,
                                format!(
                                    "the constructor <{}> has no parameter named <{}>",
                                    call.name,
                                    name_token.lexeme()
                                ),
                            ));
                        };
                        let expected_arg = substitute(&declared[position], &bindings);
                        self.check_pattern(arg.value, &expected_arg, ctx)?;
                    }
                } else {
                    for (arg, declared_inst) in call.args.iter().zip(declared.iter()) {
                        if arg.name.is_some() {
                            return Err(SemaError::invalid_expression(
                                &token,
                                "default-constructor pattern arguments must be positional",
                            ));
                        }
                        let expected_arg = substitute(declared_inst, &bindings);
                        self.check_pattern(arg.value, &expected_arg, ctx)?;
                    }
                }
                self.comp.facts.set_instance(pat, expected.clone());
                Ok(())
            }
            ExprKind::Grouped(inner) => self.check_pattern(inner, expected, ctx),
            ExprKind::Binary {
                op: BinaryOp::Dot,
                lhs,
                rhs,
            } => {
                // A namespaced pattern `N.X(...)`.
                let ExprKind::Identifier {
                    name: ns_name,
                    namespace: None,
                } = self.comp.exprs.kind(lhs).clone()
                else {
                    return Err(SemaError::invalid_expression(
                        &token,
                        "this expression cannot be used as a pattern",
                    ));
                };
                if !ctx.scope.borrow().namespace_exists(&ns_name) {
                    return Err(SemaError::invalid_expression(
                        &token,
                        format!("<{ns_name}> does not name a namespace"),
                    ));
                }
                let mut inner = self.comp.exprs.kind(rhs).clone();
                match &mut inner {
                    ExprKind::Identifier { namespace, .. } => *namespace = Some(ns_name),
                    ExprKind::Call(call) => call.namespace = Some(ns_name),
                    _ => {
                        return Err(SemaError::invalid_expression(
                            &token,
                            "this expression cannot be used as a pattern",
                        ));
                    }
                }
                self.comp.exprs.replace_kind(pat, inner);
                self.check_pattern(pat, expected, ctx)
            }
            _ => Err(SemaError::invalid_expression(
                &token,
                "this expression cannot be used as a pattern",
            )),
        }
    }

    /// A capture: a freshly declared immutable local, pre-validated with
    /// the parser-supplied type instance (or the matched instance when
    /// none was supplied).
    fn declare_capture(
        &mut self,
        pat: ExprId,
        name: &str,
        token: &Token,
        expected: &TypeInstance,
        ctx: &PatternContext<'_>,
    ) -> Result<(), SemaError> {
        let instance = match self.comp.exprs.get(pat).annotation.clone() {
            Some(mut annotation) => {
                complex_check(&mut annotation, ctx.scope, ctx.namespace, &[])?;
                if !annotation.weak_eq(expected) {
                    return Err(SemaError::invalid_expression(
                        token,
                        format!(
                            "the capture <{name}> is annotated <{annotation}> but the \
                             matched expression has <{expected}>"
                        ),
                    ));
                }
                annotation
            }
            None => expected.clone(),
        };

        let mut var = Variable::new(token.clone(), ctx.namespace, false);
        var.set_instance(instance.clone());
        var.set_validity(Validity::Valid);
        let var = Shared::new(var);

        let added = ctx
            .scope
            .borrow_mut()
            .add_variable(ctx.namespace, var.clone());
        if let Err(err) = added {
            // Re-checking the same pattern redeclares its captures; accept
            // when the instances agree.
            let existing = ctx
                .scope
                .borrow()
                .get_variable(ctx.namespace, ctx.namespace, name);
            match existing {
                Ok(existing)
                    if existing
                        .borrow()
                        .instance()
                        .is_some_and(|i| i.weak_eq(&instance)) => {}
                _ => return Err(SemaError::symbol(token, err)),
            }
        }
        self.comp.facts.set_instance(pat, instance);
        Ok(())
    }

    fn reject_match_inside(&self, token: &Token, id: ExprId) -> Result<(), SemaError> {
        if self.contains_match(id) {
            return Err(SemaError::invalid_expression(
                token,
                "a match expression may not be nested inside this expression",
            ));
        }
        Ok(())
    }

    /// Does the subtree contain a match expression?
    pub(crate) fn contains_match(&self, id: ExprId) -> bool {
        self.walk_any(id, &|kind| matches!(kind, ExprKind::Match { .. }))
    }

    /// Does the subtree contain the underscore expression?
    pub(crate) fn contains_underscore(&self, id: ExprId) -> bool {
        self.walk_any(id, &|kind| matches!(kind, ExprKind::Underscore))
    }

    fn walk_any(&self, id: ExprId, pred: &dyn Fn(&ExprKind) -> bool) -> bool {
        let kind = self.comp.exprs.kind(id);
        if pred(kind) {
            return true;
        }
        match kind {
            ExprKind::Underscore | ExprKind::Literal(_) | ExprKind::Identifier { .. } => false,
            ExprKind::Reference(inner)
            | ExprKind::Dereference(inner)
            | ExprKind::Grouped(inner)
            | ExprKind::Cast { operand: inner, .. }
            | ExprKind::Unary { operand: inner, .. } => self.walk_any(*inner, pred),
            ExprKind::Call(call) => call.args.iter().any(|a| self.walk_any(a.value, pred)),
            ExprKind::Tuple(fields) => fields.iter().any(|f| self.walk_any(f.value, pred)),
            ExprKind::List(elements) => elements.iter().any(|e| self.walk_any(*e, pred)),
            ExprKind::Map(entries) => entries
                .iter()
                .any(|e| self.walk_any(e.key, pred) || self.walk_any(e.value, pred)),
            ExprKind::Binary { lhs, rhs, .. }
            | ExprKind::Match { lhs, rhs, .. }
            | ExprKind::Assignment { lhs, rhs } => {
                self.walk_any(*lhs, pred) || self.walk_any(*rhs, pred)
            }
        }
    }
}
