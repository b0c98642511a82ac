//! Runtime values and the builtin function registry for the Lyra
//! interpreter.
//!
//! The evaluator crate re-exports everything here; the split keeps the
//! value model free of interpreter machinery so the match engine and the
//! builtin implementations can be tested on plain values.

mod builtins;
mod errors;
mod registry;
mod value;

pub use errors::{
    division_by_zero, missing_callee, numeric_overflow, wrong_arg_count, wrong_arg_type,
    EvalError, EvalResult,
};
pub use registry::{BuiltinFn, BuiltinRegistry};
pub use value::{Value, ValueSlot};
