//! Interpretation errors as diagnostics.

use lyra_diagnostic::{Diagnostic, ErrorCode};
use lyra_patterns::EvalError;

/// Convert a runtime error into a diagnostic for the sink.
pub fn to_diagnostic(error: &EvalError) -> Diagnostic {
    let diag = Diagnostic::error(ErrorCode::E6001).with_message(error.message.clone());
    match &error.token {
        Some(token) => diag.with_token(token.clone(), token.lexeme().to_owned()),
        None => diag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::{Token, TokenKind};

    #[test]
    fn runtime_errors_use_the_interpretation_code() {
        let token = Token::new(TokenKind::Identifier, "xs", 8, 3, "main.lyra");
        let error = EvalError::at(&token, "subscript out of range");
        let diag = to_diagnostic(&error);
        assert_eq!(diag.code, ErrorCode::E6001);
        assert_eq!(diag.label.unwrap().token.line(), 8);
    }
}
