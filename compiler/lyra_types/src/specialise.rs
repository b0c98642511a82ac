//! The function specialiser.
//!
//! A call to a generic function picks a template, binds each constraint
//! standin to exactly one concrete instance, then produces a fully
//! concrete clone: parameter, return and body instances are rewritten
//! under the binding map, the clone is re-checked, and its mangled name
//! becomes the callee at the triggering call site.
//!
//! Specialisations are deduplicated by mangled name, so repeated calls
//! share one clone. A non-generic function "specialises" to itself: it
//! only picks up its mangled name and a registry entry.

use rustc_hash::FxHashMap;

use lyra_ir::{
    Callee, CallExpr, Expr, ExprId, ExprKind, FunctionDecl, Scope, Shared, SharedFunctionDecl,
    SharedScope, SharedVariable, Stmt, StmtId, StmtKind, Token, TypeInstance, Variable,
};

use crate::check;
use crate::context::Sema;
use crate::error::SemaError;
use crate::instance_check::complex_check;
use crate::mangle::mangle_function;

/// Bindings of constraint standins to concrete instances.
pub type Bindings = FxHashMap<String, TypeInstance>;

/// Unify a declared parameter instance against an argument instance,
/// binding constraint standins as they are met. Returns `false` when the
/// candidate cannot apply; a conflicting second binding for the same
/// standin also rejects it.
pub(crate) fn unify_instance(
    declared: &TypeInstance,
    actual: &TypeInstance,
    constraints: &[Token],
    bindings: &mut Bindings,
) -> bool {
    if declared.is_star() || actual.is_star() {
        return true;
    }
    if declared.is_abstract() {
        let name = declared.name();
        if !constraints.iter().any(|c| c.lexeme() == name) {
            return false;
        }
        return match bindings.get(name) {
            Some(bound) => bound.strong_eq(actual),
            None => {
                bindings.insert(name.to_owned(), actual.clone());
                true
            }
        };
    }
    if actual.is_abstract() {
        return false;
    }
    if declared.is_reference() != actual.is_reference() {
        return false;
    }
    if declared.category() != actual.category() || declared.arity() != actual.arity() {
        return false;
    }
    if declared.category() == lyra_ir::InstanceCategory::User {
        let same_head = match (declared.type_ref(), actual.type_ref()) {
            (Some(a), Some(b)) => {
                a.ptr_eq(b) || {
                    let a = a.borrow();
                    let b = b.borrow();
                    a.namespace() == b.namespace() && a.name() == b.name() && a.arity() == b.arity()
                }
            }
            _ => false,
        };
        if !same_head {
            return false;
        }
    }
    declared
        .params()
        .iter()
        .zip(actual.params().iter())
        .all(|(d, a)| unify_instance(d, a, constraints, bindings))
}

/// Rewrite an instance under the binding map. A bound abstract leaf is
/// replaced by its binding, remembering the standin token for
/// back-lookup; everything else recurses over parameters.
pub(crate) fn substitute(instance: &TypeInstance, bindings: &Bindings) -> TypeInstance {
    if instance.is_star() {
        return instance.clone();
    }
    if instance.is_abstract() {
        if let Some(bound) = bindings.get(instance.name()) {
            let mut replaced = bound.clone();
            replaced.set_old_token(instance.token().clone());
            return replaced;
        }
        return instance.clone();
    }
    let mut out = instance.clone();
    for param in out.params_mut() {
        *param = substitute(param, bindings);
    }
    let parametrized = out
        .params()
        .iter()
        .any(|p| p.is_abstract() || p.is_parametrized());
    out.set_parametrized(parametrized);
    out
}

/// Specialise `template` under `bindings`, re-check the clone, register
/// it, and return it with its callee triple and concrete return
/// instance.
#[tracing::instrument(level = "trace", skip_all, fields(name = template.borrow().name()))]
pub fn specialise_function(
    sema: &mut Sema<'_>,
    template: &SharedFunctionDecl,
    bindings: &Bindings,
    scope: &SharedScope,
    ns: &str,
) -> Result<(SharedFunctionDecl, Callee, TypeInstance), SemaError> {
    let (name, fn_ns, token, is_generic, is_builtin, arity) = {
        let t = template.borrow();
        (
            t.name().to_owned(),
            t.namespace().to_owned(),
            t.token().clone(),
            t.is_generic(),
            t.is_builtin(),
            t.arity(),
        )
    };

    // Substituted signature.
    let mut params: Vec<TypeInstance> = template
        .borrow()
        .param_instances()
        .iter()
        .map(|p| substitute(p, bindings))
        .collect();
    let mut ret = substitute(template.borrow().return_instance(), bindings);

    for param in &mut params {
        complex_check(param, scope, ns, &[])?;
        if !param.is_complete() {
            return Err(SemaError::invalid_function(
                &token,
                format!(
                    "the parameter instance <{param}> of <{name}> could not be fully specialised"
                ),
            ));
        }
    }
    complex_check(&mut ret, scope, ns, &[])?;
    if !ret.is_complete() {
        return Err(SemaError::invalid_function(
            &token,
            format!("the return instance <{ret}> of <{name}> could not be fully specialised"),
        ));
    }

    let mangled = mangle_function(&name, &params, &ret);
    let callee = Callee::new(fn_ns.clone(), mangled.clone(), arity);

    // Idempotent by mangled name: repeated calls share one clone.
    if let Some(existing) = template.borrow().specialisation(&mangled) {
        return Ok((existing, callee, ret));
    }

    if !is_generic {
        // Nothing to rewrite; the template is its own specialisation.
        template.borrow_mut().set_mangled(mangled.clone());
        template
            .borrow_mut()
            .add_specialisation(mangled, template.clone());
        sema.comp.registry.add(&callee, template.clone());
        return Ok((template.clone(), callee, ret));
    }
    if is_builtin {
        return Err(SemaError::invalid_function(
            &token,
            "builtin functions do not take constraints",
        ));
    }

    let clone = clone_function(sema, template, bindings, &params, &ret, scope, &mangled)?;

    // Register before re-checking the body so a recursive call inside the
    // clone resolves to the clone itself instead of looping.
    template
        .borrow_mut()
        .add_specialisation(mangled.clone(), clone.clone());
    sema.comp.registry.add(&callee, clone.clone());

    check::check_function_body(sema, &clone)?;

    Ok((clone, callee, ret))
}

/// Shallow-clone the declaration, deep-clone the body with substituted
/// instances.
fn clone_function(
    sema: &mut Sema<'_>,
    template: &SharedFunctionDecl,
    bindings: &Bindings,
    params: &[TypeInstance],
    ret: &TypeInstance,
    scope: &SharedScope,
    mangled: &str,
) -> Result<SharedFunctionDecl, SemaError> {
    let t = template.borrow();

    let parent = t
        .scope()
        .and_then(|s| s.borrow().parent().cloned())
        .unwrap_or_else(|| scope.clone());
    let fn_scope = Shared::new(Scope::with_parent(mangled, parent));

    let mut clone = FunctionDecl::new(
        t.token().clone(),
        t.namespace(),
        t.fqn(),
        ret.clone(),
    );
    clone.set_public(t.is_public());
    clone.set_mangled(mangled);

    for ((param_name, var), inst) in t.params().iter().zip(params.iter()) {
        let v = var.borrow();
        let mut param = Variable::new(v.token().clone(), v.namespace(), v.is_mutable());
        param.set_instance(inst.clone());
        param.set_validity(lyra_ir::Validity::Valid);
        let param = Shared::new(param);
        fn_scope
            .borrow_mut()
            .add_variable(t.namespace(), param.clone())
            .map_err(|e| SemaError::symbol(v.token(), e))?;
        clone.add_param(param_name.clone(), param);
    }

    if let Some(body) = t.body() {
        let cloned_body = clone_stmt(sema, body, bindings);
        clone.set_body(cloned_body);
    }
    clone.set_scope(fn_scope);
    drop(t);

    Ok(Shared::new(clone))
}

fn clone_stmt(sema: &mut Sema<'_>, id: StmtId, bindings: &Bindings) -> StmtId {
    let node = sema.comp.stmts.get(id).clone();
    let kind = match node.kind {
        StmtKind::Block(stmts) => StmtKind::Block(
            stmts
                .into_iter()
                .map(|s| clone_stmt(sema, s, bindings))
                .collect(),
        ),
        StmtKind::Expression(expr) => StmtKind::Expression(clone_expr(sema, expr, bindings)),
        StmtKind::Variable(var) => StmtKind::Variable(clone_variable(sema, &var, bindings)),
        StmtKind::If {
            branches,
            else_body,
        } => StmtKind::If {
            branches: branches
                .into_iter()
                .map(|b| lyra_ir::CondBranch {
                    condition: clone_expr(sema, b.condition, bindings),
                    body: clone_stmt(sema, b.body, bindings),
                })
                .collect(),
            else_body: else_body.map(|b| clone_stmt(sema, b, bindings)),
        },
        StmtKind::While { condition, body } => StmtKind::While {
            condition: clone_expr(sema, condition, bindings),
            body: clone_stmt(sema, body, bindings),
        },
        StmtKind::Break => StmtKind::Break,
        StmtKind::Continue => StmtKind::Continue,
        StmtKind::Pass => StmtKind::Pass,
        StmtKind::Return(value) => {
            StmtKind::Return(value.map(|v| clone_expr(sema, v, bindings)))
        }
    };
    sema.comp.stmts.alloc(Stmt::new(kind, node.token))
}

fn clone_variable(
    sema: &mut Sema<'_>,
    var: &SharedVariable,
    bindings: &Bindings,
) -> SharedVariable {
    let (token, namespace, mutable, public, global, instance, initialiser) = {
        let v = var.borrow();
        (
            v.token().clone(),
            v.namespace().to_owned(),
            v.is_mutable(),
            v.is_public(),
            v.is_global(),
            v.instance().cloned(),
            v.initialiser(),
        )
    };
    let mut clone = Variable::new(token, namespace, mutable);
    clone.set_public(public);
    clone.set_global(global);
    if let Some(inst) = instance {
        clone.set_instance(substitute(&inst, bindings));
    }
    if let Some(init) = initialiser {
        let cloned = clone_expr(sema, init, bindings);
        clone.set_initialiser(cloned);
    }
    Shared::new(clone)
}

fn clone_expr(sema: &mut Sema<'_>, id: ExprId, bindings: &Bindings) -> ExprId {
    let node = sema.comp.exprs.get(id).clone();
    let kind = match node.kind {
        ExprKind::Underscore | ExprKind::Literal(_) | ExprKind::Identifier { .. } => node.kind,
        ExprKind::Reference(inner) => ExprKind::Reference(clone_expr(sema, inner, bindings)),
        ExprKind::Dereference(inner) => ExprKind::Dereference(clone_expr(sema, inner, bindings)),
        ExprKind::Call(call) => {
            let args = call
                .args
                .into_iter()
                .map(|arg| lyra_ir::CallArg {
                    name: arg.name,
                    value: clone_expr(sema, arg.value, bindings),
                })
                .collect();
            ExprKind::Call(CallExpr {
                namespace: call.namespace,
                name: call.name,
                args,
                specialisations: call
                    .specialisations
                    .iter()
                    .map(|s| substitute(s, bindings))
                    .collect(),
                return_instance: call.return_instance.map(|r| substitute(&r, bindings)),
            })
        }
        ExprKind::Grouped(inner) => ExprKind::Grouped(clone_expr(sema, inner, bindings)),
        ExprKind::Tuple(fields) => ExprKind::Tuple(
            fields
                .into_iter()
                .map(|f| lyra_ir::TupleField {
                    name: f.name,
                    value: clone_expr(sema, f.value, bindings),
                })
                .collect(),
        ),
        ExprKind::List(elements) => ExprKind::List(
            elements
                .into_iter()
                .map(|e| clone_expr(sema, e, bindings))
                .collect(),
        ),
        ExprKind::Map(entries) => ExprKind::Map(
            entries
                .into_iter()
                .map(|e| lyra_ir::MapEntry {
                    key: clone_expr(sema, e.key, bindings),
                    value: clone_expr(sema, e.value, bindings),
                })
                .collect(),
        ),
        ExprKind::Cast { target, operand } => ExprKind::Cast {
            target: substitute(&target, bindings),
            operand: clone_expr(sema, operand, bindings),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: clone_expr(sema, operand, bindings),
        },
        ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
            op,
            lhs: clone_expr(sema, lhs, bindings),
            rhs: clone_expr(sema, rhs, bindings),
        },
        ExprKind::Match { negated, lhs, rhs } => ExprKind::Match {
            negated,
            lhs: clone_expr(sema, lhs, bindings),
            rhs: clone_expr(sema, rhs, bindings),
        },
        ExprKind::Assignment { lhs, rhs } => ExprKind::Assignment {
            lhs: clone_expr(sema, lhs, bindings),
            rhs: clone_expr(sema, rhs, bindings),
        },
    };
    let annotation = node.annotation.map(|a| substitute(&a, bindings));
    let mut expr = Expr::new(kind, node.token);
    expr.annotation = annotation;
    sema.comp.exprs.alloc(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::{TokenKind, STAR_NS};

    fn leaf(name: &str) -> TypeInstance {
        TypeInstance::new(Token::synthetic(TokenKind::Identifier, name), STAR_NS)
    }

    fn constraint(name: &str) -> Token {
        Token::synthetic(TokenKind::Identifier, name)
    }

    #[test]
    fn binding_is_recorded_once() {
        let declared = leaf("T");
        let actual = leaf("int");
        // a bare leaf is abstract; give the actual a resolved type so the
        // strong-equality conflict check can fire
        let mut bindings = Bindings::default();
        assert!(unify_instance(
            &declared,
            &actual,
            &[constraint("T")],
            &mut bindings
        ));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn unknown_abstract_leaf_rejects() {
        let declared = leaf("U");
        let actual = leaf("int");
        let mut bindings = Bindings::default();
        assert!(!unify_instance(
            &declared,
            &actual,
            &[constraint("T")],
            &mut bindings
        ));
    }

    #[test]
    fn substitution_remembers_the_standin() {
        let mut bindings = Bindings::default();
        bindings.insert("T".to_owned(), leaf("int"));

        let out = substitute(&leaf("T"), &bindings);
        assert_eq!(out.name(), "int");
        assert_eq!(out.old_token().map(Token::lexeme), Some("T"));
    }
}
