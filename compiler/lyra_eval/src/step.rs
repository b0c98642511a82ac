//! Control-flow signalling.

use lyra_patterns::Value;

/// The outcome of interpreting one statement.
///
/// `Return` propagates up to the function activation; `Break` and
/// `Continue` up to the enclosing loop, which consumes them.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

impl Step {
    /// The carried value of a `Normal` or `Return` step.
    pub fn into_value(self) -> Value {
        match self {
            Step::Normal(value) | Step::Return(value) => value,
            Step::Break | Step::Continue => Value::Unit,
        }
    }
}
