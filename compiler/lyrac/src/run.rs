//! The entry point.

use lyra_eval::{Interpreter, QuantumProcessor};
use lyra_ir::Compilation;
use lyra_patterns::{EvalResult, Value};

/// Locate `(*, __main__, 1)` in the main program, hand it the argument
/// list, and interpret to the exit value.
pub fn run(comp: &Compilation, main_fqn: &str, argv: &[String]) -> EvalResult {
    Interpreter::new(comp, main_fqn).run(argv)
}

/// Same, with a caller-supplied quantum processor.
pub fn run_with_processor(
    comp: &Compilation,
    main_fqn: &str,
    argv: &[String],
    qproc: Box<dyn QuantumProcessor>,
) -> EvalResult {
    Interpreter::new(comp, main_fqn)
        .with_processor(qproc)
        .run(argv)
}

/// Map a run outcome to a process exit value: `0` when interpretation
/// returned nothing, the integer itself when it returned one.
pub fn exit_value(result: &Value) -> i32 {
    match result {
        Value::Int(n) => i32::try_from(*n).unwrap_or(i32::MAX),
        _ => 0,
    }
}
