//! Decimal builtins over `bigdecimal`.

use bigdecimal::BigDecimal;

use crate::builtins::expect_args;
use crate::errors::{division_by_zero, EvalError, EvalResult};
use crate::registry::BuiltinRegistry;
use crate::value::Value;

pub(super) fn install(registry: &mut BuiltinRegistry) {
    registry.add("__add__(dec,dec)->dec", 2, add);
    registry.add("__sub__(dec,dec)->dec", 2, sub);
    registry.add("__mul__(dec,dec)->dec", 2, mul);
    registry.add("__div__(dec,dec)->dec", 2, div);
    registry.add("__neg__(dec)->dec", 1, neg);
    registry.add("__pos__(dec)->dec", 1, pos);
    registry.add("__eq__(dec,dec)->bool", 2, eq);
    registry.add("__ne__(dec,dec)->bool", 2, ne);
    registry.add("__lt__(dec,dec)->bool", 2, lt);
    registry.add("__le__(dec,dec)->bool", 2, le);
    registry.add("__gt__(dec,dec)->bool", 2, gt);
    registry.add("__ge__(dec,dec)->bool", 2, ge);
    registry.add("__cast__(dec)->string", 1, cast_string);
}

fn binary(args: &[Value]) -> Result<(&BigDecimal, &BigDecimal), EvalError> {
    expect_args!(args, 2);
    Ok((args[0].as_dec()?, args[1].as_dec()?))
}

fn add(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Dec(a + b))
}

fn sub(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Dec(a - b))
}

fn mul(args: &[Value]) -> EvalResult {
    let (a, b) = binary(args)?;
    Ok(Value::Dec(a * b))
}

fn div(args: &[Value]) -> EvalResult {
    use bigdecimal::Zero;
    let (a, b) = binary(args)?;
    if b.is_zero() {
        return Err(division_by_zero());
    }
    Ok(Value::Dec(a / b))
}

fn neg(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Dec(-args[0].as_dec()?.clone()))
}

fn pos(args: &[Value]) -> EvalResult {
    expect_args!(args, 1);
    Ok(Value::Dec(args[0].as_dec()?.clone()))
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
    Ok(Value::Str(args[0].as_dec()?.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::Dec(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn exact_decimal_arithmetic() {
        let out = add(&[dec("0.1"), dec("0.2")]).unwrap();
        assert_eq!(out, dec("0.3"));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(div(&[dec("1"), dec("0")]).is_err());
    }
}
