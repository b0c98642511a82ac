//! The inference engine.
//!
//! `Sema::infer` attaches a type instance to any expression. Inference
//! is where the AST rewrites happen: dot expressions collapse into
//! namespaced identifiers/calls or decay to `__getattr_*__` calls,
//! subscripts over user types decay to `__getitem_*__` calls, and every
//! call site ends up with a resolved callee triple in the side tables.
//!
//! Results are cached per node id; re-running inference over a checked
//! tree yields the same instances.

mod call;

use lyra_ir::{
    BinaryOp, ExprId, ExprKind, InstanceCategory, LiteralKind, SharedScope, Token, TypeInstance,
    GLOBAL_NS, STAR_NS,
};

use crate::builtins::{self, width_type};
use crate::context::Sema;
use crate::env;
use crate::error::SemaError;
use crate::instance_check::complex_check;

impl Sema<'_> {
    /// Infer the type instance of `id`, resolving and caching as it goes.
    #[tracing::instrument(level = "trace", skip(self, scope))]
    pub fn infer(
        &mut self,
        id: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        if let Some(inst) = self.comp.facts.instance(id) {
            return Ok(inst.clone());
        }
        let inferred = self.infer_uncached(id, scope, ns)?;
        let reconciled = self.reconcile_annotation(id, inferred, scope, ns)?;
        self.comp.facts.set_instance(id, reconciled.clone());
        Ok(reconciled)
    }

    fn infer_uncached(
        &mut self,
        id: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let kind = self.comp.exprs.kind(id).clone();
        let token = self.comp.exprs.get(id).token.clone();

        match kind {
            ExprKind::Underscore => Ok(TypeInstance::star()),
            ExprKind::Literal(lit) => self.infer_literal(lit, &token, scope),
            ExprKind::Reference(inner) => {
                let inner_inst = self.infer(inner, scope, ns)?;
                if inner_inst.is_reference() {
                    return Err(SemaError::invalid_expression(
                        &token,
                        "a reference to a reference is not allowed",
                    ));
                }
                let mut inst = TypeInstance::reference(inner_inst);
                complex_check(&mut inst, scope, ns, &[])?;
                Ok(inst)
            }
            ExprKind::Dereference(inner) => {
                let inner_inst = self.infer(inner, scope, ns)?;
                let Some(referent) = inner_inst.referent().cloned() else {
                    return Err(SemaError::invalid_expression(
                        &token,
                        format!(
                            "only a reference can be dereferenced, \
                             this expression has type instance <{inner_inst}>"
                        ),
                    ));
                };
                if referent.is_quantum() {
                    return Err(SemaError::invalid_expression(
                        &token,
                        "a quantum value may not be dereferenced",
                    ));
                }
                Ok(referent)
            }
            ExprKind::Identifier { name, namespace } => {
                let requested = namespace.as_deref().unwrap_or(STAR_NS);
                self.infer_identifier(&token, requested, &name, scope, ns)
            }
            ExprKind::Call(_) => self.infer_call(id, scope, ns),
            ExprKind::Grouped(inner) => self.infer(inner, scope, ns),
            ExprKind::Tuple(fields) => {
                let mut params = Vec::with_capacity(fields.len());
                let mut names = Vec::with_capacity(fields.len());
                for field in &fields {
                    params.push(self.infer(field.value, scope, ns)?);
                    names.push(field.name.clone());
                }
                let mut inst =
                    TypeInstance::container(token, InstanceCategory::Tuple, params);
                inst.set_field_names(names);
                complex_check(&mut inst, scope, ns, &[])?;
                Ok(inst)
            }
            ExprKind::List(elements) => {
                let element = match elements.split_first() {
                    None => TypeInstance::star(),
                    Some((first, rest)) => {
                        let first_inst = self.infer(*first, scope, ns)?;
                        for other in rest {
                            let other_inst = self.infer(*other, scope, ns)?;
                            if !other_inst.weak_eq(&first_inst) {
                                let other_token = self.comp.exprs.get(*other).token.clone();
                                return Err(SemaError::invalid_expression(
                                    &other_token,
                                    format!(
                                        "list elements must share one type instance, \
                                         <{other_inst}> conflicts with <{first_inst}>"
                                    ),
                                ));
                            }
                        }
                        first_inst
                    }
                };
                let mut inst =
                    TypeInstance::container(token, InstanceCategory::List, vec![element]);
                complex_check(&mut inst, scope, ns, &[])?;
                Ok(inst)
            }
            ExprKind::Map(entries) => self.infer_map(id, &token, &entries, scope, ns),
            ExprKind::Cast { target, operand } => {
                let mut target = target;
                complex_check(&mut target, scope, ns, &[])?;
                if target.is_parametrized() {
                    return Err(SemaError::invalid_type(
                        &token,
                        "a cast target must be a concrete type instance",
                    ));
                }
                let operand_inst = self.infer(operand, scope, ns)?;
                let requested = operand_namespace(&operand_inst);
                let (callee, ret) = self.resolve_function(
                    &token,
                    &requested,
                    "__cast__",
                    &[operand_inst],
                    Some(&target),
                    &[],
                    scope,
                    ns,
                )?;
                self.comp.facts.set_callee(id, callee);
                Ok(ret)
            }
            ExprKind::Unary { op, operand } => {
                let operand_inst = self.infer(operand, scope, ns)?;
                let requested = operand_namespace(&operand_inst);
                let (callee, ret) = self.resolve_function(
                    &token,
                    &requested,
                    op.decay_name(),
                    &[operand_inst],
                    None,
                    &[],
                    scope,
                    ns,
                )?;
                self.comp.facts.set_callee(id, callee);
                Ok(ret)
            }
            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Dot => self.infer_dot(id, &token, lhs, rhs, scope, ns),
                BinaryOp::Subscript => self.infer_subscript(id, &token, lhs, rhs, scope, ns),
                BinaryOp::Is | BinaryOp::IsNot => {
                    let lhs_inst = self.infer(lhs, scope, ns)?;
                    let rhs_inst = self.infer(rhs, scope, ns)?;
                    if !lhs_inst.is_reference() || !rhs_inst.is_reference() {
                        return Err(SemaError::invalid_expression(
                            &token,
                            "identity comparison requires reference operands",
                        ));
                    }
                    builtins::named_instance(scope, "bool")
                }
                _ => {
                    let lhs_inst = self.infer(lhs, scope, ns)?;
                    let rhs_inst = self.infer(rhs, scope, ns)?;
                    let name = op
                        .decay_name()
                        .unwrap_or_else(|| unreachable!("structural operator in decay path"));
                    let requested = operand_namespace(&lhs_inst);
                    let (callee, ret) = self.resolve_function(
                        &token,
                        &requested,
                        name,
                        &[lhs_inst, rhs_inst],
                        None,
                        &[],
                        scope,
                        ns,
                    )?;
                    self.comp.facts.set_callee(id, callee);
                    Ok(ret)
                }
            },
            ExprKind::Match { lhs, .. } => {
                // The right side is a pattern; the expression checker
                // validates it and installs captures.
                self.infer(lhs, scope, ns)?;
                builtins::named_instance(scope, "bool")
            }
            ExprKind::Assignment { lhs, .. } => self.infer(lhs, scope, ns),
        }
    }

    pub(crate) fn infer_literal(
        &mut self,
        lit: LiteralKind,
        token: &Token,
        scope: &SharedScope,
    ) -> Result<TypeInstance, SemaError> {
        let name = match lit {
            LiteralKind::Integer => "int".to_owned(),
            LiteralKind::Floating => "float".to_owned(),
            LiteralKind::Decimal => "dec".to_owned(),
            LiteralKind::Str => "string".to_owned(),
            LiteralKind::Bits => self.width_name("bit", token)?,
            LiteralKind::Qubits => self.width_name("qubit", token)?,
        };
        builtins::named_instance(scope, &name)
    }

    fn width_name(&self, prefix: &str, token: &Token) -> Result<String, SemaError> {
        width_type(prefix, token.lexeme().len()).ok_or_else(|| {
            SemaError::invalid_expression(
                token,
                format!(
                    "a {prefix} string literal must have length 1, 2, 4 or 8, \
                     this one has length {}",
                    token.lexeme().len()
                ),
            )
        })
    }

    fn infer_identifier(
        &mut self,
        token: &Token,
        requested: &str,
        name: &str,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        if let Ok(var) = scope.borrow().get_variable(requested, ns, name) {
            var.borrow_mut().mark_used();
            let inst = var.borrow().instance().cloned();
            return inst.ok_or_else(|| {
                SemaError::invalid_variable(
                    token,
                    format!("the variable <{name}> has no declared or inferred type instance"),
                )
            });
        }

        // Not a variable: a nullary default constructor.
        let cons = env::find_constructor(scope, requested, ns, name, 0, token)?;
        let owner = cons.owner.clone();
        Ok(constructor_result_instance(&owner, &Default::default()))
    }

    fn infer_map(
        &mut self,
        id: ExprId,
        token: &Token,
        entries: &[lyra_ir::MapEntry],
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let (key, value) = match entries.split_first() {
            None => (TypeInstance::star(), TypeInstance::star()),
            Some((first, rest)) => {
                let key = self.infer(first.key, scope, ns)?;
                let value = self.infer(first.value, scope, ns)?;
                for entry in rest {
                    let other_key = self.infer(entry.key, scope, ns)?;
                    let other_value = self.infer(entry.value, scope, ns)?;
                    if !other_key.weak_eq(&key) || !other_value.weak_eq(&value) {
                        let entry_token = self.comp.exprs.get(entry.key).token.clone();
                        return Err(SemaError::invalid_expression(
                            &entry_token,
                            "map entries must share one key and one value type instance",
                        ));
                    }
                }
                (key, value)
            }
        };

        // A usable map needs a hash over its key type and an integer
        // comparator; record both on the node.
        if !key.is_star() {
            let int_inst = builtins::named_instance(scope, "int")?;
            let bool_inst = builtins::named_instance(scope, "bool")?;
            let key_ns = operand_namespace(&key);
            let (hash, _) = self.resolve_function(
                token,
                &key_ns,
                "__hash__",
                std::slice::from_ref(&key),
                Some(&int_inst),
                &[],
                scope,
                ns,
            )?;
            let (eq, _) = self.resolve_function(
                token,
                GLOBAL_NS,
                "__eq__",
                &[int_inst.clone(), int_inst],
                Some(&bool_inst),
                &[],
                scope,
                ns,
            )?;
            self.comp
                .facts
                .set_map_ops(id, lyra_ir::MapCallees { hash, eq });
        }

        let mut inst =
            TypeInstance::container(token.clone(), InstanceCategory::Map, vec![key, value]);
        complex_check(&mut inst, scope, ns, &[])?;
        Ok(inst)
    }

    fn infer_dot(
        &mut self,
        id: ExprId,
        token: &Token,
        lhs: ExprId,
        rhs: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        // Namespace access: rewrite to the namespaced inner expression.
        if let ExprKind::Identifier {
            name,
            namespace: None,
        } = self.comp.exprs.kind(lhs)
        {
            let lhs_name = name.clone();
            if scope.borrow().namespace_exists(&lhs_name) {
                let mut inner = self.comp.exprs.kind(rhs).clone();
                match &mut inner {
                    ExprKind::Identifier { namespace, .. } => *namespace = Some(lhs_name),
                    ExprKind::Call(call) => call.namespace = Some(lhs_name),
                    _ => {
                        return Err(SemaError::invalid_expression(
                            token,
                            "only identifiers and calls can be namespaced",
                        ));
                    }
                }
                self.comp.exprs.replace_kind(id, inner);
                return self.infer_uncached(id, scope, ns);
            }
        }

        let lhs_inst = self.infer(lhs, scope, ns)?;

        let ExprKind::Identifier { name: field, .. } = self.comp.exprs.kind(rhs) else {
            return Err(SemaError::invalid_expression(
                token,
                "the dot operator expects an attribute name on its right side",
            ));
        };
        let field = field.clone();

        // Named-tuple element selection.
        if lhs_inst.category() == InstanceCategory::Tuple {
            if let Some(index) = lhs_inst.field_index(&field) {
                return Ok(lhs_inst.params()[index].clone());
            }
            return Err(SemaError::invalid_expression(
                token,
                format!("this tuple has no element named <{field}>"),
            ));
        }

        // Anything else decays to a `__getattr_<field>__` call.
        let call_name = format!("__getattr_{field}__");
        let namespace = concrete_namespace(&lhs_inst);
        self.comp.exprs.replace_kind(
            id,
            ExprKind::Call(lyra_ir::CallExpr {
                namespace,
                name: call_name,
                args: vec![lyra_ir::CallArg::positional(lhs)],
                specialisations: Vec::new(),
                return_instance: None,
            }),
        );
        self.infer_uncached(id, scope, ns)
    }

    fn infer_subscript(
        &mut self,
        id: ExprId,
        token: &Token,
        lhs: ExprId,
        rhs: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let lhs_inst = self.infer(lhs, scope, ns)?;
        match lhs_inst.category() {
            InstanceCategory::Tuple => {
                let key_token = self.comp.exprs.get(rhs).token.clone();
                if !matches!(
                    self.comp.exprs.kind(rhs),
                    ExprKind::Literal(LiteralKind::Integer)
                ) {
                    return Err(SemaError::invalid_expression(
                        &key_token,
                        "a tuple subscript must be an integer literal",
                    ));
                }
                let index: usize = key_token.lexeme().parse().map_err(|_| {
                    SemaError::invalid_expression(&key_token, "malformed tuple subscript")
                })?;
                let Some(element) = lhs_inst.params().get(index) else {
                    return Err(SemaError::invalid_expression(
                        &key_token,
                        format!(
                            "tuple subscript {index} is out of range for <{lhs_inst}>"
                        ),
                    ));
                };
                Ok(element.clone())
            }
            InstanceCategory::List => {
                let key_inst = self.infer(rhs, scope, ns)?;
                let int_inst = builtins::named_instance(scope, "int")?;
                if !key_inst.weak_eq(&int_inst) {
                    return Err(SemaError::invalid_expression(
                        token,
                        format!("a list subscript must be an <int>, not <{key_inst}>"),
                    ));
                }
                self.maybe_of(scope, ns, token, lhs_inst.params()[0].clone())
            }
            InstanceCategory::Map => {
                let key_inst = self.infer(rhs, scope, ns)?;
                if !key_inst.weak_eq(&lhs_inst.params()[0]) {
                    return Err(SemaError::invalid_expression(
                        token,
                        format!(
                            "this map is keyed by <{}>, not <{key_inst}>",
                            lhs_inst.params()[0]
                        ),
                    ));
                }
                self.maybe_of(scope, ns, token, lhs_inst.params()[1].clone())
            }
            InstanceCategory::User => {
                // Decay to `__getitem_<key>__(lhs)`, the key spelled into
                // the function name.
                let key_token = self.comp.exprs.get(rhs).token.clone();
                let call_name = format!("__getitem_{}__", key_token.lexeme());
                let namespace = concrete_namespace(&lhs_inst);
                self.comp.exprs.replace_kind(
                    id,
                    ExprKind::Call(lyra_ir::CallExpr {
                        namespace,
                        name: call_name,
                        args: vec![lyra_ir::CallArg::positional(lhs)],
                        specialisations: Vec::new(),
                        return_instance: None,
                    }),
                );
                self.infer_uncached(id, scope, ns)
            }
        }
    }

    /// `maybe(element)`, resolved.
    fn maybe_of(
        &mut self,
        scope: &SharedScope,
        ns: &str,
        token: &Token,
        element: TypeInstance,
    ) -> Result<TypeInstance, SemaError> {
        let decl = env::find_type(scope, GLOBAL_NS, ns, "maybe", 1, token)?;
        let mut inst = TypeInstance::new(decl.borrow().token().clone(), GLOBAL_NS);
        let parametrized = element.is_abstract() || element.is_parametrized();
        inst.add_param(element);
        inst.set_type(decl.clone());
        inst.set_parametrized(parametrized);
        Ok(inst)
    }

    /// Honour a parser-supplied type annotation: accept when weakly equal
    /// to the inferred instance and keep the parser's (checked) form.
    fn reconcile_annotation(
        &mut self,
        id: ExprId,
        inferred: TypeInstance,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let Some(annotation) = self.comp.exprs.get(id).annotation.clone() else {
            return Ok(inferred);
        };
        let token = self.comp.exprs.get(id).token.clone();
        let mut annotation = annotation;
        complex_check(&mut annotation, scope, ns, &[])?;
        if annotation.is_parametrized() {
            return Err(SemaError::invalid_type(
                annotation.token(),
                "a parametric type instance may not annotate an expression",
            ));
        }
        if !annotation.weak_eq(&inferred) {
            return Err(SemaError::invalid_expression(
                &token,
                format!(
                    "the type instance supplied along the expression <{annotation}> is not \
                     the same as the one deduced by the inference engine <{inferred}>"
                ),
            ));
        }
        self.comp.exprs.get_mut(id).annotation = Some(annotation.clone());
        Ok(annotation)
    }
}

/// Namespace to search for a function over the given operand, preferring
/// the operand's own namespace.
fn operand_namespace(inst: &TypeInstance) -> String {
    inst.namespace().to_owned()
}

fn concrete_namespace(inst: &TypeInstance) -> Option<String> {
    if inst.namespace() == STAR_NS {
        None
    } else {
        Some(inst.namespace().to_owned())
    }
}

/// The result instance of a constructor application: the owning type
/// applied to one instance per standin, each taken from `bindings` or
/// left abstract.
pub(crate) fn constructor_result_instance(
    owner: &lyra_ir::SharedTypeDecl,
    bindings: &crate::specialise::Bindings,
) -> TypeInstance {
    let o = owner.borrow();
    let mut inst = TypeInstance::new(o.token().clone(), o.namespace());
    let mut parametrized = false;
    for standin in o.standins() {
        let param = match bindings.get(standin.lexeme()) {
            Some(bound) => bound.clone(),
            None => {
                let mut leaf = TypeInstance::new(standin.clone(), STAR_NS);
                leaf.set_parametrized(true);
                leaf
            }
        };
        parametrized |= param.is_abstract() || param.is_parametrized();
        inst.add_param(param);
    }
    drop(o);
    inst.set_type(owner.clone());
    inst.set_parametrized(parametrized);
    inst
}
