//! Boolean builtins.

use crate::builtins::expect_args;
use crate::errors::{wrong_arg_type, EvalError, EvalResult};
use crate::registry::BuiltinRegistry;
use crate::value::Value;

pub(super) fn install(registry: &mut BuiltinRegistry) {
    registry.add("__and__(bool,bool)->bool", 2, and);
    registry.add("__or__(bool,bool)->bool", 2, or);
    registry.add("__not__(bool)->bool", 1, not);
    registry.add("__eq__(bool,bool)->bool", 2, eq);
}

fn as_bool(value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| wrong_arg_type("bool"))
}

fn binary(args: &[Value]) -> Result<(bool, bool), EvalError> {
    expect_args!(args, 2);
    Ok((as_bool(&args[0])?, as_bool(&args[1])?))
}

fn and(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a && b))
}

fn or(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a || b))
}

fn not(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::bool(!as_bool(&args[0])?))
}

fn eq(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a == b))
}
