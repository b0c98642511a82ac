//! The type instance checker.
//!
//! `complex_check` validates a type instance against the environment and
//! resolves it in place: the category is fixed, the type pointer bound,
//! and the parametrised flag recomputed as the OR of all parameter
//! flags. The returned boolean is that flag.
//!
//! A standin listed by the caller is accepted as a parametrised-but-valid
//! abstract leaf; any other unresolvable name is an invalid-type error.

use lyra_ir::{
    InstanceCategory, SharedScope, Token, TypeInstance, GLOBAL_NS,
};

use crate::env;
use crate::error::SemaError;

/// Validate and resolve `instance` against `scope`, looking names up from
/// namespace `ns`. Returns whether the instance is parametrised.
#[tracing::instrument(level = "trace", skip(instance, scope, standins), fields(name = instance.name()))]
pub fn complex_check(
    instance: &mut TypeInstance,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
) -> Result<bool, SemaError> {
    // The star wildcard is a valid placeholder anywhere a type goes.
    if instance.is_star() {
        instance.set_parametrized(true);
        return Ok(true);
    }

    if instance.is_reference() {
        return check_reference(instance, scope, ns, standins);
    }

    match instance.category() {
        InstanceCategory::Tuple => {
            check_builtin_container(instance, scope, ns, standins, "tuple", None)
        }
        InstanceCategory::List => {
            check_builtin_container(instance, scope, ns, standins, "list", Some(1))
        }
        InstanceCategory::Map => {
            check_builtin_container(instance, scope, ns, standins, "map", Some(2))
        }
        InstanceCategory::User => check_user(instance, scope, ns, standins),
    }
}

fn check_reference(
    instance: &mut TypeInstance,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
) -> Result<bool, SemaError> {
    if instance.arity() != 1 {
        return Err(SemaError::invalid_type(
            instance.token(),
            "a reference type instance takes exactly one parameter",
        ));
    }
    if instance.params()[0].is_reference() {
        return Err(SemaError::invalid_type(
            instance.token(),
            "a reference to a reference is not allowed",
        ));
    }
    let decl = env::find_type(scope, GLOBAL_NS, ns, "ref", 1, instance.token())
        .map_err(|_| invalid(instance.token(), "ref", 1))?;
    instance.set_type(decl);

    let mut parametrized = false;
    for param in instance.params_mut() {
        parametrized |= complex_check(param, scope, ns, standins)?;
    }
    instance.set_parametrized(parametrized);
    Ok(parametrized)
}

fn check_builtin_container(
    instance: &mut TypeInstance,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
    head: &str,
    expected_arity: Option<usize>,
) -> Result<bool, SemaError> {
    if let Some(expected) = expected_arity {
        if instance.arity() != expected {
            return Err(SemaError::invalid_type(
                instance.token(),
                format!(
                    "the <{head}> type instance takes exactly {expected} parameter(s), \
                     {} given",
                    instance.arity()
                ),
            ));
        }
    }
    // The marker declarations for builtin containers live in the global
    // namespace under fixed arities.
    let marker_arity = expected_arity.unwrap_or(0);
    let decl = env::find_type(scope, GLOBAL_NS, ns, head, marker_arity, instance.token())
        .map_err(|_| invalid(instance.token(), head, marker_arity))?;
    instance.set_type(decl);

    let mut parametrized = false;
    for param in instance.params_mut() {
        parametrized |= complex_check(param, scope, ns, standins)?;
    }
    instance.set_parametrized(parametrized);
    Ok(parametrized)
}

fn check_user(
    instance: &mut TypeInstance,
    scope: &SharedScope,
    ns: &str,
    standins: &[Token],
) -> Result<bool, SemaError> {
    // An abstract leaf naming a declared standin stays abstract and makes
    // the enclosing instance parametrised.
    if instance.arity() == 0
        && standins
            .iter()
            .any(|standin| standin.lexeme() == instance.name())
    {
        instance.set_parametrized(true);
        return Ok(true);
    }

    let decl = scope
        .borrow()
        .get_type(instance.namespace(), ns, instance.name(), instance.arity())
        .map_err(|_| invalid(instance.token(), instance.name(), instance.arity()))?;

    // Resolve the search namespace to the declaring one.
    let declared_ns = decl.borrow().namespace().to_owned();
    instance.set_namespace(declared_ns);
    instance.set_type(decl);

    let mut parametrized = false;
    for param in instance.params_mut() {
        parametrized |= complex_check(param, scope, ns, standins)?;
    }
    instance.set_parametrized(parametrized);
    Ok(parametrized)
}

fn invalid(token: &Token, name: &str, arity: usize) -> SemaError {
    SemaError::invalid_type(
        token,
        format!("the type instance <{name}> with {arity} parameter(s) does not name a declared type"),
    )
}
