//! The builtin `bool` type and its operator functions.

use lyra_ir::{Constructor, Shared, SharedScope, TypeDecl, GLOBAL_NS};

use super::{builtin_token, declare_fn, instance_of};
use crate::error::SemaError;

pub(super) fn install(scope: &SharedScope) -> Result<(), SemaError> {
    let token = builtin_token("bool");
    let mut decl = TypeDecl::new(token.clone(), GLOBAL_NS, "bool");
    decl.set_public(false);
    decl.add_constructor(Constructor::Default {
        token: builtin_token("true"),
        params: Vec::new(),
    });
    decl.add_constructor(Constructor::Default {
        token: builtin_token("false"),
        params: Vec::new(),
    });
    let decl = Shared::new(decl);
    scope
        .borrow_mut()
        .add_type(GLOBAL_NS, decl.clone())
        .map_err(|e| SemaError::symbol(&token, e))?;

    let b = instance_of(&decl);
    declare_fn(scope, "__and__", &[b.clone(), b.clone()], b.clone())?;
    declare_fn(scope, "__or__", &[b.clone(), b.clone()], b.clone())?;
    declare_fn(scope, "__not__", &[b.clone()], b.clone())?;
    declare_fn(scope, "__eq__", &[b.clone(), b.clone()], b.clone())?;
    Ok(())
}
