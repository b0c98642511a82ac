//! Interpretation errors.
//!
//! A runtime error aborts interpretation immediately; execution has no
//! meaningful continuation past it. Errors produced inside builtin
//! functions carry no token; the evaluator attaches the call-site token
//! on the way out.

use std::fmt;

use lyra_ir::Token;

/// A runtime violation.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub token: Option<Token>,
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            token: None,
            message: message.into(),
        }
    }

    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        EvalError {
            token: Some(token.clone()),
            message: message.into(),
        }
    }

    /// Attach a token if none is set yet.
    #[must_use]
    pub fn with_token(mut self, token: &Token) -> Self {
        if self.token.is_none() {
            self.token = Some(token.clone());
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

// Factory functions for the common error families.

pub fn division_by_zero() -> EvalError {
    EvalError::new("division by zero")
}

pub fn wrong_arg_count(expected: usize, found: usize) -> EvalError {
    EvalError::new(format!(
        "wrong number of arguments: expected {expected}, found {found}"
    ))
}

pub fn wrong_arg_type(expected: &str) -> EvalError {
    EvalError::new(format!("expected a {expected} argument"))
}

pub fn missing_callee(namespace: &str, mangled: &str, arity: usize) -> EvalError {
    EvalError::new(format!(
        "no callable registered under ({}, {mangled}, {arity})",
        lyra_ir::display_ns(namespace)
    ))
}

pub fn numeric_overflow(op: &str) -> EvalError {
    EvalError::new(format!("integer overflow in {op}"))
}
