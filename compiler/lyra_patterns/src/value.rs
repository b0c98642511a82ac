//! Runtime values.
//!
//! Every non-primitive value is a constructor application (`Cons`); the
//! boolean `true` is the nullary constructor of `bool`, `Just(3)` an
//! application of `maybe`'s constructor, and so on. References carry the
//! identity of the slot they point at: `is`/`is not` is pointer equality
//! over slots.

use std::fmt;

use bigdecimal::BigDecimal;

use lyra_ir::{MapCallees, Shared, GLOBAL_NS};

use crate::errors::{wrong_arg_type, EvalError};

/// A mutable storage slot for one variable binding. References alias the
/// slot of the variable they were taken from.
pub type ValueSlot = Shared<Value>;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absence of a value (a function that returns nothing).
    Unit,
    Int(i64),
    Float(f64),
    Dec(BigDecimal),
    Str(String),
    /// A classical bit string, kept in its lexical form.
    Bits(String),
    /// A quantum register: the ket was handed to the quantum processor,
    /// which answered with the index range.
    Qureg {
        label: String,
        start: usize,
        end: usize,
        width: usize,
    },
    Tuple(Vec<(Option<String>, Value)>),
    List(Vec<Value>),
    /// Map entries in insertion order, with the hash and comparator
    /// callees resolved for the key type (`None` only for the empty map,
    /// which never consults them). Lookup is first-match-wins.
    Map {
        entries: Vec<(Value, Value)>,
        ops: Option<MapCallees>,
    },
    /// A constructor application.
    Cons {
        namespace: String,
        name: String,
        args: Vec<Value>,
    },
    /// A reference: the identity of the referred variable's slot.
    Ref(ValueSlot),
}

impl Value {
    /// The boolean constructor for `b`.
    pub fn bool(b: bool) -> Self {
        Value::Cons {
            namespace: GLOBAL_NS.to_owned(),
            name: if b { "true" } else { "false" }.to_owned(),
            args: Vec::new(),
        }
    }

    /// `Just(value)`.
    pub fn just(value: Value) -> Self {
        Value::Cons {
            namespace: GLOBAL_NS.to_owned(),
            name: "Just".to_owned(),
            args: vec![value],
        }
    }

    /// `None`.
    pub fn none() -> Self {
        Value::Cons {
            namespace: GLOBAL_NS.to_owned(),
            name: "None".to_owned(),
            args: Vec::new(),
        }
    }

    /// Whether this is the boolean constructor `true` (or `false`).
    /// Anything else is not a boolean at all.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Cons { name, args, .. } if args.is_empty() => match name.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(wrong_arg_type("int")),
        }
    }

    pub fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Float(x) => Ok(*x),
            _ => Err(wrong_arg_type("float")),
        }
    }

    pub fn as_dec(&self) -> Result<&BigDecimal, EvalError> {
        match self {
            Value::Dec(d) => Ok(d),
            _ => Err(wrong_arg_type("dec")),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(wrong_arg_type("string")),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality, except references compare by slot identity
    /// and floats by bit pattern.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Dec(a), Value::Dec(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bits(a), Value::Bits(b)) => a == b,
            (
                Value::Qureg {
                    label: la,
                    start: sa,
                    end: ea,
                    ..
                },
                Value::Qureg {
                    label: lb,
                    start: sb,
                    end: eb,
                    ..
                },
            ) => la == lb && sa == sb && ea == eb,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map { entries: a, .. }, Value::Map { entries: b, .. }) => a == b,
            (
                Value::Cons {
                    namespace: na,
                    name: ca,
                    args: aa,
                },
                Value::Cons {
                    namespace: nb,
                    name: cb,
                    args: ab,
                },
            ) => na == nb && ca == cb && aa == ab,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Dec(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Bits(bits) => write!(f, "0b{bits}"),
            Value::Qureg {
                label, start, end, ..
            } => write!(f, "|{label}:{start}..{end}>"),
            Value::Tuple(fields) => {
                f.write_str("(")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = name {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
            Value::List(elements) => {
                f.write_str("[")?;
                for (i, value) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Cons { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
            Value::Ref(slot) => write!(f, "ref {}", slot.borrow()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_constructors() {
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);
    }

    #[test]
    fn references_compare_by_identity() {
        let slot = Shared::new(Value::Int(1));
        let a = Value::Ref(slot.clone());
        let b = Value::Ref(slot);
        let c = Value::Ref(Shared::new(Value::Int(1)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::just(Value::Int(2)).to_string(), "Just(2)");
        assert_eq!(Value::none().to_string(), "None");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }
}
