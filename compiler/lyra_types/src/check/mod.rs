//! Declaration checking.
//!
//! Drives the inference engine over every declaration of a program:
//! type declarations get their constructor parameter instances resolved,
//! variables get their declared and inferred instances reconciled, and
//! function bodies are walked statement by statement. The same body walk
//! re-checks specialised clones.

mod expr;

pub use expr::PatternContext;

use lyra_ir::{
    InstanceCategory, Scope, Shared, SharedFunctionDecl, SharedScope, SharedTypeDecl,
    SharedVariable, StmtId, StmtKind, Token, TypeInstance, Validity,
};

use crate::builtins;
use crate::context::Sema;
use crate::error::SemaError;
use crate::instance_check::complex_check;

/// Context carried through a statement walk.
pub struct CheckCtx {
    pub scope: SharedScope,
    pub namespace: String,
    pub standins: Vec<Token>,
    pub return_instance: Option<TypeInstance>,
}

/// Check a type declaration: every constructor parameter instance must
/// resolve, with the type's own standins accepted as abstract leaves.
pub fn check_type_decl(
    decl: &SharedTypeDecl,
    scope: &SharedScope,
    ns: &str,
) -> Result<(), SemaError> {
    let standins = decl.borrow().standins().to_vec();
    let mut d = decl.borrow_mut();
    for cons in d.constructors_mut() {
        for inst in cons.param_instances_mut() {
            complex_check(inst, scope, ns, &standins)?;
        }
    }
    Ok(())
}

/// Check a global variable declaration.
pub fn check_global_variable(
    sema: &mut Sema<'_>,
    var: &SharedVariable,
    scope: &SharedScope,
    ns: &str,
) -> Result<(), SemaError> {
    check_variable(sema, var, scope, ns, &[])
}

/// Check a variable declaration, global or local.
pub fn check_variable(
    sema: &mut Sema<'_>,
    var: &SharedVariable,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
) -> Result<(), SemaError> {
    let result = check_variable_inner(sema, var, scope, ns, standins);
    if result.is_err() {
        var.borrow_mut().set_validity(Validity::Invalid);
    }
    result
}

fn check_variable_inner(
    sema: &mut Sema<'_>,
    var: &SharedVariable,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
) -> Result<(), SemaError> {
    let token = var.borrow().token().clone();
    let declared = var.borrow().instance().cloned();
    let initialiser = var.borrow().initialiser();

    if declared.is_none() && initialiser.is_none() {
        return Err(SemaError::invalid_variable(
            &token,
            "a variable needs an explicit type instance or an initialiser",
        ));
    }

    let declared = match declared {
        Some(mut inst) => {
            complex_check(&mut inst, scope, ns, standins)?;
            var.borrow_mut().set_instance(inst.clone());
            Some(inst)
        }
        None => None,
    };

    if let Some(init) = initialiser {
        let init_inst = sema.check_expression(init, scope, ns)?;
        match &declared {
            Some(decl_inst) => {
                let matches = if decl_inst.is_complete() && init_inst.is_complete() {
                    decl_inst.strong_eq(&init_inst)
                } else {
                    decl_inst.weak_eq(&init_inst)
                };
                if !matches {
                    return Err(SemaError::invalid_variable(
                        &token,
                        format!(
                            "the variable <{}> is declared with type instance <{decl_inst}> \
                             but its initialiser has <{init_inst}>",
                            token.lexeme()
                        ),
                    ));
                }
            }
            None => var.borrow_mut().set_instance(init_inst.clone()),
        }
    }

    let instance = var
        .borrow()
        .instance()
        .cloned()
        .unwrap_or_else(TypeInstance::star);

    // Quantum data is written exactly once, from a ket literal.
    if instance.is_quantum() {
        let Some(init) = initialiser else {
            return Err(SemaError::invalid_variable(
                &token,
                "a quantum variable must be initialised with a ket literal",
            ));
        };
        if !matches!(
            sema.comp.exprs.kind(init),
            lyra_ir::ExprKind::Literal(lyra_ir::LiteralKind::Qubits)
        ) {
            return Err(SemaError::invalid_variable(
                &token,
                "a quantum variable can only be initialised with a ket literal",
            ));
        }
    }

    // Strings and containers force immutability.
    let forces_immutable = match instance.category() {
        InstanceCategory::Tuple | InstanceCategory::List | InstanceCategory::Map => true,
        InstanceCategory::User => !instance.is_reference() && instance.name() == "string",
    };
    if forces_immutable {
        var.borrow_mut().set_mutable(false);
    }

    if instance.is_reference() {
        check_reference_variable(sema, var, scope, ns, &token, initialiser)?;
    }

    let valid = instance.is_complete();
    var.borrow_mut().set_validity(if valid {
        Validity::Valid
    } else {
        Validity::Unknown
    });
    Ok(())
}

/// A reference variable must be initialised from `ref <variable>` and may
/// not be more permissive than its referent.
fn check_reference_variable(
    sema: &mut Sema<'_>,
    var: &SharedVariable,
    scope: &SharedScope,
    ns: &str,
    token: &Token,
    initialiser: Option<lyra_ir::ExprId>,
) -> Result<(), SemaError> {
    let Some(init) = initialiser else {
        return Err(SemaError::invalid_variable(
            token,
            "a reference variable must be initialised",
        ));
    };
    let lyra_ir::ExprKind::Reference(inner) = sema.comp.exprs.kind(init) else {
        return Err(SemaError::invalid_variable(
            token,
            "a reference variable must be initialised with a reference expression",
        ));
    };
    let inner = *inner;
    let lyra_ir::ExprKind::Identifier { name, namespace } = sema.comp.exprs.kind(inner).clone()
    else {
        return Err(SemaError::invalid_variable(
            token,
            "only a variable can be referenced",
        ));
    };
    let requested = namespace.as_deref().unwrap_or(lyra_ir::STAR_NS);
    let referent = scope
        .borrow()
        .get_variable(requested, ns, &name)
        .map_err(|e| SemaError::symbol(token, e))?;
    if var.borrow().is_mutable() && !referent.borrow().is_mutable() {
        return Err(SemaError::invalid_variable(
            token,
            format!(
                "the reference variable <{}> may not be more permissive than its \
                 referent <{name}>",
                token.lexeme()
            ),
        ));
    }
    Ok(())
}

/// Check a function declaration: resolve its signature, then walk the
/// body.
#[tracing::instrument(level = "debug", skip_all, fields(name = decl.borrow().name()))]
pub fn check_function_decl(
    sema: &mut Sema<'_>,
    decl: &SharedFunctionDecl,
    scope: &SharedScope,
    ns: &str,
) -> Result<(), SemaError> {
    if decl.borrow().is_builtin() {
        // Builtin signatures are constructed resolved.
        return Ok(());
    }

    let standins = decl.borrow().constraints().to_vec();

    // The function's own scope hangs off the program scope and holds its
    // parameters.
    if decl.borrow().scope().is_none() {
        let fn_scope = Shared::new(Scope::with_parent(
            decl.borrow().name().to_owned(),
            scope.clone(),
        ));
        decl.borrow_mut().set_scope(fn_scope);
    }
    let fn_scope = decl
        .borrow()
        .scope()
        .cloned()
        .unwrap_or_else(|| unreachable!("function scope installed above"));

    let params: Vec<(String, SharedVariable)> = decl.borrow().params().to_vec();
    for (_, param) in &params {
        let token = param.borrow().token().clone();
        let mut inst = param.borrow().instance().cloned().ok_or_else(|| {
            SemaError::invalid_variable(&token, "a function parameter needs a type instance")
        })?;
        complex_check(&mut inst, scope, ns, &standins)?;
        param.borrow_mut().set_instance(inst);
        add_local(&fn_scope, ns, param, &token)?;
    }

    let mut ret = decl.borrow().return_instance().clone();
    complex_check(&mut ret, scope, ns, &standins)?;
    decl.borrow_mut().set_return_instance(ret);

    check_function_body(sema, decl)
}

/// Walk a function body. Used both for templates at declaration time and
/// for specialised clones.
pub fn check_function_body(
    sema: &mut Sema<'_>,
    decl: &SharedFunctionDecl,
) -> Result<(), SemaError> {
    let Some(body) = decl.borrow().body() else {
        return Ok(());
    };
    let scope = decl
        .borrow()
        .scope()
        .cloned()
        .unwrap_or_else(|| unreachable!("a function body needs a scope"));
    let ctx = CheckCtx {
        scope,
        namespace: decl.borrow().namespace().to_owned(),
        standins: decl.borrow().constraints().to_vec(),
        return_instance: Some(decl.borrow().return_instance().clone()),
    };
    check_statement(sema, body, &ctx)
}

/// Check one statement.
pub fn check_statement(
    sema: &mut Sema<'_>,
    id: StmtId,
    ctx: &CheckCtx,
) -> Result<(), SemaError> {
    let kind = sema.comp.stmts.kind(id).clone();
    let token = sema.comp.stmts.get(id).token.clone();
    match kind {
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                check_statement(sema, stmt, ctx)?;
            }
            Ok(())
        }
        StmtKind::Expression(expr) => {
            sema.check_expression(expr, &ctx.scope, &ctx.namespace)?;
            Ok(())
        }
        StmtKind::Variable(var) => {
            let var_token = var.borrow().token().clone();
            add_local(&ctx.scope, &ctx.namespace, &var, &var_token)?;
            check_variable(sema, &var, &ctx.scope, &ctx.namespace, &ctx.standins)
        }
        StmtKind::If {
            branches,
            else_body,
        } => {
            for branch in branches {
                check_condition(sema, branch.condition, ctx)?;
                check_statement(sema, branch.body, ctx)?;
            }
            if let Some(else_body) = else_body {
                check_statement(sema, else_body, ctx)?;
            }
            Ok(())
        }
        StmtKind::While { condition, body } => {
            check_condition(sema, condition, ctx)?;
            check_statement(sema, body, ctx)
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Pass => Ok(()),
        StmtKind::Return(value) => {
            let Some(value) = value else {
                return Ok(());
            };
            let value_inst = sema.check_expression(value, &ctx.scope, &ctx.namespace)?;
            if let Some(expected) = &ctx.return_instance {
                let matches = if expected.is_complete() && value_inst.is_complete() {
                    expected.strong_eq(&value_inst)
                } else {
                    expected.weak_eq(&value_inst)
                };
                if !matches {
                    return Err(SemaError::invalid_expression(
                        &token,
                        format!(
                            "this function returns <{expected}> but the returned \
                             expression has <{value_inst}>"
                        ),
                    ));
                }
            }
            Ok(())
        }
    }
}

fn check_condition(
    sema: &mut Sema<'_>,
    condition: lyra_ir::ExprId,
    ctx: &CheckCtx,
) -> Result<(), SemaError> {
    let inst = sema.check_expression(condition, &ctx.scope, &ctx.namespace)?;
    let bool_inst = builtins::named_instance(&ctx.scope, "bool")?;
    if !inst.weak_eq(&bool_inst) {
        let token = sema.comp.exprs.get(condition).token.clone();
        return Err(SemaError::invalid_expression(
            &token,
            format!("a condition must have type instance <bool>, not <{inst}>"),
        ));
    }
    Ok(())
}

/// Register a local declaration, tolerating the re-registration that a
/// second checking pass performs.
fn add_local(
    scope: &SharedScope,
    ns: &str,
    var: &SharedVariable,
    token: &Token,
) -> Result<(), SemaError> {
    let added = scope.borrow_mut().add_variable(ns, var.clone());
    match added {
        Ok(()) => Ok(()),
        Err(err) => {
            let existing = scope.borrow().get_variable(ns, ns, token.lexeme());
            match existing {
                Ok(existing) if existing.ptr_eq(var) => Ok(()),
                _ => Err(SemaError::symbol(token, err)),
            }
        }
    }
}
