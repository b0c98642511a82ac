//! The builtin `string` type and its functions.

use lyra_ir::SharedScope;

use super::{declare_fn, declare_type, named_instance};
use crate::error::SemaError;

pub(super) fn install_types(scope: &SharedScope) -> Result<(), SemaError> {
    declare_type(scope, "string", &[], false)?;
    Ok(())
}

pub(super) fn install_functions(scope: &SharedScope) -> Result<(), SemaError> {
    let s = named_instance(scope, "string")?;
    let i = named_instance(scope, "int")?;
    let b = named_instance(scope, "bool")?;

    declare_fn(scope, "__add__", &[s.clone(), s.clone()], s.clone())?;
    declare_fn(scope, "__reverse__", &[s.clone()], s.clone())?;
    declare_fn(scope, "__hash__", &[s.clone()], i.clone())?;
    declare_fn(scope, "__eq__", &[s.clone(), s.clone()], b.clone())?;
    Ok(())
}
