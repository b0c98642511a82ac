//! Semantic errors.
//!
//! Every error carries the token it arose at. A per-declaration driver
//! catches the first error of a declaration subtree, converts it to a
//! diagnostic and resumes at the next declaration boundary.

use std::fmt;

use lyra_diagnostic::{Diagnostic, ErrorCode};
use lyra_ir::{SymbolError, Token};

/// An error produced during semantic analysis.
#[derive(Clone, Debug)]
pub enum SemaError {
    /// Unresolvable, malformed, or parametrised-where-disallowed type
    /// instance.
    InvalidType { token: Token, message: String },
    /// Illegal mutability, missing type/initialiser, or
    /// reference-permissiveness violation.
    InvalidVariable { token: Token, message: String },
    /// Constraint or arity mismatch during specialisation.
    InvalidFunction { token: Token, message: String },
    /// An expression rule violation.
    InvalidExpression { token: Token, message: String },
    /// Environment lookup failure.
    Symbol { token: Token, error: SymbolError },
}

impl SemaError {
    pub fn invalid_type(token: &Token, message: impl Into<String>) -> Self {
        SemaError::InvalidType {
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn invalid_variable(token: &Token, message: impl Into<String>) -> Self {
        SemaError::InvalidVariable {
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn invalid_function(token: &Token, message: impl Into<String>) -> Self {
        SemaError::InvalidFunction {
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn invalid_expression(token: &Token, message: impl Into<String>) -> Self {
        SemaError::InvalidExpression {
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn symbol(token: &Token, error: SymbolError) -> Self {
        SemaError::Symbol {
            token: token.clone(),
            error,
        }
    }

    pub fn token(&self) -> &Token {
        match self {
            SemaError::InvalidType { token, .. }
            | SemaError::InvalidVariable { token, .. }
            | SemaError::InvalidFunction { token, .. }
            | SemaError::InvalidExpression { token, .. }
            | SemaError::Symbol { token, .. } => token,
        }
    }

    /// Convert to a diagnostic for the sink.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, message) = match self {
            SemaError::InvalidType { message, .. } => (ErrorCode::E2001, message.clone()),
            SemaError::InvalidVariable { message, .. } => (ErrorCode::E2002, message.clone()),
            SemaError::InvalidFunction { message, .. } => (ErrorCode::E2003, message.clone()),
            SemaError::InvalidExpression { message, .. } => (ErrorCode::E3001, message.clone()),
            SemaError::Symbol { error, .. } => {
                let code = match error {
                    SymbolError::NotFound { .. } => ErrorCode::E1001,
                    SymbolError::AlreadyDeclared { .. } => ErrorCode::E1002,
                    SymbolError::CanCollide { .. } => ErrorCode::E1003,
                };
                (code, error.to_string())
            }
        };
        Diagnostic::error(code)
            .with_message(message)
            .with_token(self.token().clone(), self.token().lexeme().to_owned())
    }
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaError::InvalidType { message, .. } => write!(f, "invalid type: {message}"),
            SemaError::InvalidVariable { message, .. } => {
                write!(f, "invalid variable: {message}")
            }
            SemaError::InvalidFunction { message, .. } => {
                write!(f, "invalid function: {message}")
            }
            SemaError::InvalidExpression { message, .. } => {
                write!(f, "invalid expression: {message}")
            }
            SemaError::Symbol { error, .. } => write!(f, "{error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::TokenKind;

    #[test]
    fn symbol_errors_map_to_environment_codes() {
        let token = Token::new(TokenKind::Identifier, "f", 2, 5, "main.lyra");
        let err = SemaError::symbol(
            &token,
            SymbolError::CanCollide {
                what: "function",
                name: "f".to_owned(),
            },
        );
        assert_eq!(err.to_diagnostic().code, ErrorCode::E1003);
    }

    #[test]
    fn expression_errors_use_the_expression_code() {
        let token = Token::new(TokenKind::Identifier, "x", 1, 1, "main.lyra");
        let err = SemaError::invalid_expression(&token, "bad");
        assert_eq!(err.to_diagnostic().code, ErrorCode::E3001);
    }
}
