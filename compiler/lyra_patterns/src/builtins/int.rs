//! Integer builtins.

use crate::builtins::expect_args;
use crate::errors::{division_by_zero, numeric_overflow, EvalError, EvalResult};
use crate::registry::BuiltinRegistry;
use crate::value::Value;

pub(super) fn install(registry: &mut BuiltinRegistry) {
    registry.add("__add__(int,int)->int", 2, add);
    registry.add("__sub__(int,int)->int", 2, sub);
    registry.add("__mul__(int,int)->int", 2, mul);
    registry.add("__div__(int,int)->int", 2, div);
    registry.add("__mod__(int,int)->int", 2, rem);
    registry.add("__pow__(int,int)->int", 2, pow);
    registry.add("__neg__(int)->int", 1, neg);
    registry.add("__pos__(int)->int", 1, pos);
    registry.add("__eq__(int,int)->bool", 2, eq);
    registry.add("__ne__(int,int)->bool", 2, ne);
    registry.add("__lt__(int,int)->bool", 2, lt);
    registry.add("__le__(int,int)->bool", 2, le);
    registry.add("__gt__(int,int)->bool", 2, gt);
    registry.add("__ge__(int,int)->bool", 2, ge);
    registry.add("__hash__(int)->int", 1, crate::builtins::hash::int_hash);
    registry.add("__cast__(int)->string", 1, cast_string);
    registry.add("__cast__(int)->float", 1, cast_float);
}

fn binary(args: &[Value]) -> Result<(i64, i64), EvalError> {
    expect_args!(args, 2);
    Ok((args[0].as_int()?, args[1].as_int()?))
}

fn add(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    a.checked_add(b)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__add__"))
}

fn sub(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    a.checked_sub(b)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__sub__"))
}

fn mul(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    a.checked_mul(b)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__mul__"))
}

fn div(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    if b == 0 {
        return Err(division_by_zero());
    }
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__div__"))
}

fn rem(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    if b == 0 {
        return Err(division_by_zero());
    }
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__mod__"))
}

fn pow(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    let exp = u32::try_from(b).map_err(|_| EvalError::new("negative exponent"))?;
    a.checked_pow(exp)
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__pow__"))
}

fn neg(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    args[0]
        .as_int()?
        .checked_neg()
        .map(Value::Int)
        .ok_or_else(|| numeric_overflow("__neg__"))
}

fn pos(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Int(args[0].as_int()?))
}

fn eq(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a == b))
}

fn ne(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a != b))
}

fn lt(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a < b))
}

fn le(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a <= b))
}

fn gt(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a > b))
}

fn ge(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::bool(a >= b))
}

fn cast_string(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Str(args[0].as_int()?.to_string()))
}

#[allow(clippy::cast_precision_loss)]
fn cast_float(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Float(args[0].as_int()? as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        assert_eq!(
            add(&[Value::Int(1), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            pow(&[Value::Int(2), Value::Int(10)]).unwrap(),
            Value::Int(1024)
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(div(&[Value::Int(1), Value::Int(0)]).is_err());
        assert!(rem(&[Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn comparisons_produce_boolean_constructors() {
        assert_eq!(
            lt(&[Value::Int(1), Value::Int(2)]).unwrap().as_bool(),
            Some(true)
        );
        assert_eq!(
            eq(&[Value::Int(1), Value::Int(2)]).unwrap().as_bool(),
            Some(false)
        );
    }
}
