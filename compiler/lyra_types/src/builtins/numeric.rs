//! Builtin numeric types and their operator functions.
//!
//! The surfaces mirror the interpreter's builtin registry exactly:
//! every declaration here has a value-level implementation registered
//! under the same mangled name. `float` deliberately has no equality or
//! ordering functions.

use lyra_ir::SharedScope;

use super::{declare_fn, declare_type, named_instance};
use crate::error::SemaError;

pub(super) fn install_types(scope: &SharedScope) -> Result<(), SemaError> {
    declare_type(scope, "int", &[], false)?;
    declare_type(scope, "float", &[], false)?;
    declare_type(scope, "dec", &[], false)?;
    Ok(())
}

pub(super) fn install_functions(scope: &SharedScope) -> Result<(), SemaError> {
    let i = named_instance(scope, "int")?;
    let f = named_instance(scope, "float")?;
    let d = named_instance(scope, "dec")?;
    let b = named_instance(scope, "bool")?;
    let s = named_instance(scope, "string")?;

    // int
    for name in ["__add__", "__sub__", "__mul__", "__div__", "__mod__", "__pow__"] {
        declare_fn(scope, name, &[i.clone(), i.clone()], i.clone())?;
    }
    declare_fn(scope, "__neg__", &[i.clone()], i.clone())?;
    declare_fn(scope, "__pos__", &[i.clone()], i.clone())?;
    for name in ["__eq__", "__ne__", "__lt__", "__le__", "__gt__", "__ge__"] {
        declare_fn(scope, name, &[i.clone(), i.clone()], b.clone())?;
    }
    declare_fn(scope, "__hash__", &[i.clone()], i.clone())?;

    // float
    for name in ["__add__", "__sub__", "__mul__", "__div__"] {
        declare_fn(scope, name, &[f.clone(), f.clone()], f.clone())?;
    }
    declare_fn(scope, "__neg__", &[f.clone()], f.clone())?;
    declare_fn(scope, "__pos__", &[f.clone()], f.clone())?;

    // dec
    for name in ["__add__", "__sub__", "__mul__", "__div__"] {
        declare_fn(scope, name, &[d.clone(), d.clone()], d.clone())?;
    }
    declare_fn(scope, "__neg__", &[d.clone()], d.clone())?;
    declare_fn(scope, "__pos__", &[d.clone()], d.clone())?;
    for name in ["__eq__", "__ne__", "__lt__", "__le__", "__gt__", "__ge__"] {
        declare_fn(scope, name, &[d.clone(), d.clone()], b.clone())?;
    }

    // casts
    declare_fn(scope, "__cast__", &[i.clone()], s.clone())?;
    declare_fn(scope, "__cast__", &[i.clone()], f.clone())?;
    declare_fn(scope, "__cast__", &[f.clone()], s.clone())?;
    declare_fn(scope, "__cast__", &[d.clone()], s.clone())?;

    Ok(())
}
