//! Builtin type and function declarations.
//!
//! Installed into the global namespace of every compilation's root scope
//! before any user declaration is checked. The declarations here are the
//! checker-facing half of the builtin surface; the value-level
//! implementations live in `lyra_patterns::builtins` under the same
//! mangled names.

mod core;
mod logic;
mod numeric;
mod quantum;
mod text;

pub use quantum::width_type;

use lyra_ir::{
    FunctionDecl, Shared, SharedScope, SharedTypeDecl, Token, TokenKind, TypeDecl, TypeInstance,
    Variable, GLOBAL_NS,
};

use crate::error::SemaError;

/// Install every builtin declaration into `scope`'s global namespace.
///
/// Types land first so the function signatures can refer to each other
/// across modules.
pub fn install(scope: &SharedScope) -> Result<(), SemaError> {
    core::install(scope)?;
    logic::install(scope)?;
    numeric::install_types(scope)?;
    text::install_types(scope)?;
    quantum::install(scope)?;
    numeric::install_functions(scope)?;
    text::install_functions(scope)?;
    Ok(())
}

pub(crate) fn builtin_token(name: &str) -> Token {
    Token::synthetic(TokenKind::Identifier, name)
}

/// Declare a builtin type with the given standins.
pub(crate) fn declare_type(
    scope: &SharedScope,
    name: &str,
    standins: &[&str],
    quantum: bool,
) -> Result<SharedTypeDecl, SemaError> {
    let token = builtin_token(name);
    let mut decl = TypeDecl::new(token.clone(), GLOBAL_NS, name);
    // Ambient rather than public: every program scope gets its own copy,
    // so import linking must not carry them across.
    decl.set_public(false);
    decl.set_quantum(quantum);
    for standin in standins {
        decl.add_standin(builtin_token(standin));
    }
    let decl = Shared::new(decl);
    scope
        .borrow_mut()
        .add_type(GLOBAL_NS, decl.clone())
        .map_err(|e| SemaError::symbol(&token, e))?;
    Ok(decl)
}

/// A resolved nullary instance of a declared builtin type.
pub(crate) fn instance_of(decl: &SharedTypeDecl) -> TypeInstance {
    let (token, ns) = {
        let d = decl.borrow();
        (d.token().clone(), d.namespace().to_owned())
    };
    let mut inst = TypeInstance::new(token, ns);
    inst.set_type(decl.clone());
    inst
}

/// An abstract instance naming a standin.
pub(crate) fn abstract_instance(name: &str) -> TypeInstance {
    let mut inst = TypeInstance::new(builtin_token(name), GLOBAL_NS);
    inst.set_parametrized(true);
    inst
}

/// Look up a nullary builtin type and build a resolved instance of it.
pub fn named_instance(scope: &SharedScope, name: &str) -> Result<TypeInstance, SemaError> {
    let token = builtin_token(name);
    let decl = scope
        .borrow()
        .get_type(GLOBAL_NS, GLOBAL_NS, name, 0)
        .map_err(|e| SemaError::symbol(&token, e))?;
    Ok(instance_of(&decl))
}

/// Declare a builtin function over concrete instances.
pub(crate) fn declare_fn(
    scope: &SharedScope,
    name: &str,
    params: &[TypeInstance],
    ret: TypeInstance,
) -> Result<(), SemaError> {
    let token = builtin_token(name);
    let mut decl = FunctionDecl::new(token.clone(), GLOBAL_NS, name, ret);
    decl.set_public(false);
    decl.set_builtin(true);
    for (i, param) in params.iter().enumerate() {
        let param_name = format!("__arg{i}");
        let mut var = Variable::new(builtin_token(&param_name), GLOBAL_NS, false);
        var.set_instance(param.clone());
        decl.add_param(param_name, Shared::new(var));
    }
    scope
        .borrow_mut()
        .add_function(GLOBAL_NS, Shared::new(decl))
        .map_err(|e| SemaError::symbol(&token, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::Scope;

    #[test]
    fn install_declares_the_primitive_types() {
        let scope = Shared::new(Scope::new("<builtin>"));
        install(&scope).unwrap();

        for name in ["int", "float", "dec", "string", "bool", "bit", "qubit8"] {
            assert!(
                scope.borrow().type_exists(GLOBAL_NS, GLOBAL_NS, name, 0),
                "missing builtin type {name}"
            );
        }
        assert!(scope.borrow().type_exists(GLOBAL_NS, GLOBAL_NS, "maybe", 1));
        assert!(scope.borrow().type_exists(GLOBAL_NS, GLOBAL_NS, "ref", 1));
    }

    #[test]
    fn install_declares_the_operator_functions() {
        let scope = Shared::new(Scope::new("<builtin>"));
        install(&scope).unwrap();

        let s = scope.borrow();
        assert!(s.function_exists(GLOBAL_NS, GLOBAL_NS, "__add__", 2));
        assert!(s.function_exists(GLOBAL_NS, GLOBAL_NS, "__hash__", 1));
        // two casts out of int, separated by return instance
        assert!(s.get_functions(GLOBAL_NS, GLOBAL_NS, "__cast__", 1).len() >= 2);
    }

    #[test]
    fn boolean_constructors_are_visible() {
        let scope = Shared::new(Scope::new("<builtin>"));
        install(&scope).unwrap();

        let s = scope.borrow();
        assert!(s.constructor_exists(GLOBAL_NS, GLOBAL_NS, "true", 0));
        assert!(s.constructor_exists(GLOBAL_NS, GLOBAL_NS, "false", 0));
        assert!(s.constructor_exists(GLOBAL_NS, GLOBAL_NS, "Just", 1));
        assert!(s.constructor_exists(GLOBAL_NS, GLOBAL_NS, "None", 0));
    }
}
