//! Core builtin types: the container markers, `ref` and `maybe`.

use lyra_ir::{Constructor, Shared, SharedScope, TypeDecl, GLOBAL_NS};

use super::{abstract_instance, builtin_token, declare_type};
use crate::error::SemaError;

pub(super) fn install(scope: &SharedScope) -> Result<(), SemaError> {
    // Marker declarations the instance checker binds container instances
    // to. Tuples are variadic, so the marker carries no standins.
    declare_type(scope, "tuple", &[], false)?;
    declare_type(scope, "list", &["T"], false)?;
    declare_type(scope, "map", &["K", "V"], false)?;
    declare_type(scope, "ref", &["T"], false)?;

    let token = builtin_token("maybe");
    let mut maybe = TypeDecl::new(token.clone(), GLOBAL_NS, "maybe");
    maybe.set_public(false);
    maybe.add_standin(builtin_token("T"));
    maybe.add_constructor(Constructor::Default {
        token: builtin_token("Just"),
        params: vec![abstract_instance("T")],
    });
    maybe.add_constructor(Constructor::Default {
        token: builtin_token("None"),
        params: Vec::new(),
    });
    scope
        .borrow_mut()
        .add_type(GLOBAL_NS, Shared::new(maybe))
        .map_err(|e| SemaError::symbol(&token, e))?;

    Ok(())
}
