//! Call classification and overload resolution.
//!
//! A call node is one of three things, decided here in order: a function
//! call when the (namespace, name, arity) matches a declared function; a
//! record-constructor application when the call uses named arguments and
//! a matching constructor exists; a default-constructor application
//! otherwise.

use lyra_ir::{
    Callee, CallExpr, CallKind, Constructor, ExprId, ExprKind, SharedScope, Token, TypeInstance,
    STAR_NS,
};

use crate::context::Sema;
use crate::env;
use crate::error::SemaError;
use crate::infer::constructor_result_instance;
use crate::instance_check::complex_check;
use crate::specialise::{specialise_function, unify_instance, Bindings};

impl Sema<'_> {
    pub(crate) fn infer_call(
        &mut self,
        id: ExprId,
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        let ExprKind::Call(call) = self.comp.exprs.kind(id).clone() else {
            unreachable!("infer_call on a non-call node")
        };
        let token = self.comp.exprs.get(id).token.clone();
        let requested = call.namespace.clone().unwrap_or_else(|| STAR_NS.to_owned());
        let arity = call.args.len();

        let mut arg_insts = Vec::with_capacity(arity);
        for arg in &call.args {
            arg_insts.push(self.infer(arg.value, scope, ns)?);
        }

        if scope
            .borrow()
            .function_exists(&requested, ns, &call.name, arity)
        {
            return self.infer_function_call(id, &token, &call, &requested, &arg_insts, scope, ns);
        }

        // Not a function: a constructor application.
        if call.return_instance.is_some() {
            return Err(SemaError::invalid_expression(
                &token,
                "a return type instance may only be supplied on a function call",
            ));
        }
        let uses_named_args = call.args.iter().any(|a| a.name.is_some());
        let cons = env::find_constructor(scope, &requested, ns, &call.name, arity, &token)?;
        if uses_named_args {
            self.infer_record_constructor(id, &token, &call, &cons, &arg_insts)
        } else {
            self.infer_default_constructor(id, &token, &call, &cons, &arg_insts)
        }
    }

    fn infer_function_call(
        &mut self,
        id: ExprId,
        token: &Token,
        call: &CallExpr,
        requested: &str,
        arg_insts: &[TypeInstance],
        scope: &SharedScope,
        ns: &str,
    ) -> Result<TypeInstance, SemaError> {
        // Explicit return instance and specialisations are resolved
        // before candidates are weighed.
        let requested_ret = match &call.return_instance {
            Some(ret) => {
                let mut ret = ret.clone();
                complex_check(&mut ret, scope, ns, &[])?;
                Some(ret)
            }
            None => None,
        };
        let mut explicit = call.specialisations.clone();
        for spec in &mut explicit {
            complex_check(spec, scope, ns, &[])?;
        }

        let (callee, ret) = self.resolve_function(
            token,
            requested,
            &call.name,
            arg_insts,
            requested_ret.as_ref(),
            &explicit,
            scope,
            ns,
        )?;
        self.comp.facts.set_call_kind(id, CallKind::Function);
        self.comp.facts.set_callee(id, callee);
        Ok(ret)
    }

    /// Overload resolution: unify every candidate's declared
    /// parameters against the argument instances, demand exactly one
    /// survivor, then specialise it.
    pub(crate) fn resolve_function(
        &mut self,
        token: &Token,
        requested: &str,
        name: &str,
        arg_insts: &[TypeInstance],
        requested_ret: Option<&TypeInstance>,
        explicit_specs: &[TypeInstance],
        scope: &SharedScope,
        ns: &str,
    ) -> Result<(Callee, TypeInstance), SemaError> {
        let mut candidates = scope
            .borrow()
            .get_functions(requested, ns, name, arg_insts.len());
        if candidates.is_empty() && requested != STAR_NS {
            candidates = scope
                .borrow()
                .get_functions(STAR_NS, ns, name, arg_insts.len());
        }
        if candidates.is_empty() {
            return Err(SemaError::symbol(
                token,
                lyra_ir::SymbolError::NotFound {
                    what: "function",
                    name: format!("{name}/{}", arg_insts.len()),
                },
            ));
        }

        let mut viable = Vec::new();
        for candidate in candidates {
            let constraints = candidate.borrow().constraints().to_vec();
            let mut bindings = Bindings::default();

            if !explicit_specs.is_empty() {
                if explicit_specs.len() != constraints.len() {
                    continue;
                }
                for (constraint, spec) in constraints.iter().zip(explicit_specs.iter()) {
                    bindings.insert(constraint.lexeme().to_owned(), spec.clone());
                }
            }

            let declared = candidate.borrow().param_instances();
            let mut applies = declared
                .iter()
                .zip(arg_insts.iter())
                .all(|(d, a)| unify_instance(d, a, &constraints, &mut bindings));
            if applies {
                if let Some(ret) = requested_ret {
                    let declared_ret = candidate.borrow().return_instance().clone();
                    applies = unify_instance(&declared_ret, ret, &constraints, &mut bindings);
                }
            }
            if applies {
                viable.push((candidate, bindings));
            }
        }

        match viable.len() {
            0 => Err(SemaError::symbol(
                token,
                lyra_ir::SymbolError::NotFound {
                    what: "function",
                    name: format!(
                        "{name}({})",
                        arg_insts
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(",")
                    ),
                },
            )),
            1 => {
                let (winner, bindings) = viable
                    .pop()
                    .unwrap_or_else(|| unreachable!("viable candidate list emptied"));
                let (_, callee, ret) =
                    specialise_function(self, &winner, &bindings, scope, ns)?;
                Ok((callee, ret))
            }
            _ => Err(SemaError::symbol(
                token,
                lyra_ir::SymbolError::CanCollide {
                    what: "function",
                    name: name.to_owned(),
                },
            )),
        }
    }

    fn infer_default_constructor(
        &mut self,
        id: ExprId,
        token: &Token,
        call: &CallExpr,
        cons: &lyra_ir::ConstructorRef,
        arg_insts: &[TypeInstance],
    ) -> Result<TypeInstance, SemaError> {
        let constructor = cons.get();
        let Constructor::Default { params, .. } = &constructor else {
            return Err(SemaError::invalid_expression(
                token,
                format!(
                    "the constructor <{}> takes named arguments, none were given",
                    call.name
                ),
            ));
        };

        for arg in &call.args {
            if let Some(name_token) = &arg.name {
                return Err(SemaError::invalid_expression(
                    name_token,
                    "default-constructor arguments must be positional",
                ));
            }
        }

        let standins = cons.owner.borrow().standins().to_vec();
        let mut bindings = Bindings::default();
        for (declared, actual) in params.iter().zip(arg_insts.iter()) {
            if !unify_instance(declared, actual, &standins, &mut bindings) {
                return Err(SemaError::invalid_expression(
                    token,
                    format!(
                        "this expression has type instance <{actual}> while the expected \
                         type instance is <{declared}>"
                    ),
                ));
            }
        }

        self.comp
            .facts
            .set_call_kind(id, CallKind::DefaultConstructor);
        self.comp.facts.set_callee(
            id,
            constructor_callee(&cons.owner, &call.name, arg_insts.len()),
        );
        Ok(constructor_result_instance(&cons.owner, &bindings))
    }

    fn infer_record_constructor(
        &mut self,
        id: ExprId,
        token: &Token,
        call: &CallExpr,
        cons: &lyra_ir::ConstructorRef,
        arg_insts: &[TypeInstance],
    ) -> Result<TypeInstance, SemaError> {
        let constructor = cons.get();
        let Constructor::Record { fields, .. } = &constructor else {
            return Err(SemaError::invalid_expression(
                token,
                format!(
                    "the constructor <{}> takes positional arguments, named ones were given",
                    call.name
                ),
            ));
        };

        // The argument name set must match the field set exactly; fields
        // are unified in declaration order for mangling consistency.
        for arg in &call.args {
            let Some(name_token) = &arg.name else {
                return Err(SemaError::invalid_expression(
                    token,
                    "record-constructor arguments must all be named",
                ));
            };
            if !fields.contains_key(name_token.lexeme()) {
                return Err(SemaError::invalid_expression(
                    name_token,
                    format!(
                        "the constructor <{}> has no parameter named <{}>",
                        call.name,
                        name_token.lexeme()
                    ),
                ));
            }
        }

        let standins = cons.owner.borrow().standins().to_vec();
        let mut bindings = Bindings::default();
        for (field_name, declared) in fields {
            let position = call.args.iter().position(|arg| {
                arg.name
                    .as_ref()
                    .is_some_and(|n| n.lexeme() == field_name.as_str())
            });
            let Some(position) = position else {
                return Err(SemaError::invalid_expression(
                    token,
                    format!(
                        "the constructor <{}> is missing its <{field_name}> argument",
                        call.name
                    ),
                ));
            };
            let actual = &arg_insts[position];
            if !unify_instance(declared, actual, &standins, &mut bindings) {
                return Err(SemaError::invalid_expression(
                    token,
                    format!(
                        "the <{field_name}> argument has type instance <{actual}> while \
                         the expected type instance is <{declared}>"
                    ),
                ));
            }
        }

        self.comp
            .facts
            .set_call_kind(id, CallKind::RecordConstructor);
        self.comp.facts.set_callee(
            id,
            constructor_callee(&cons.owner, &call.name, arg_insts.len()),
        );
        Ok(constructor_result_instance(&cons.owner, &bindings))
    }
}

fn constructor_callee(
    owner: &lyra_ir::SharedTypeDecl,
    name: &str,
    arity: usize,
) -> Callee {
    Callee::new(owner.borrow().namespace(), name, arity)
}
