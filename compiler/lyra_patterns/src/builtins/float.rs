//! Floating-point builtins. No equality or ordering: floats do not
//! carry an `__eq__`.

use crate::builtins::expect_args;
use crate::errors::{EvalError, EvalResult};
use crate::registry::BuiltinRegistry;
use crate::value::Value;

pub(super) fn install(registry: &mut BuiltinRegistry) {
    registry.add("__add__(float,float)->float", 2, add);
    registry.add("__sub__(float,float)->float", 2, sub);
    registry.add("__mul__(float,float)->float", 2, mul);
    registry.add("__div__(float,float)->float", 2, div);
    registry.add("__neg__(float)->float", 1, neg);
    registry.add("__pos__(float)->float", 1, pos);
    registry.add("__cast__(float)->string", 1, cast_string);
}

fn binary(args: &[Value]) -> Result<(f64, f64), EvalError> {
    expect_args!(args, 2);
    Ok((args[0].as_float()?, args[1].as_float()?))
}

fn add(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Float(a + b))
}

fn sub(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Float(a - b))
}

fn mul(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Float(a * b))
}

fn div(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Float(a / b))
}

fn neg(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Float(-args[0].as_float()?))
}

fn pos(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Float(args[0].as_float()?))
}

fn cast_string(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Str(args[0].as_float()?.to_string()))
}
