//! Structured diagnostics.
//!
//! A diagnostic carries a severity, an error code, a message and an
//! optional origin token with a label. The token is the only source
//! information the core has; file/line rendering beyond it belongs to
//! the error-reporting shell.

use std::fmt;

use lyra_ir::Token;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labelled origin token.
#[derive(Clone, Debug)]
pub struct Label {
    pub token: Token,
    pub message: String,
}

/// A structured diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub label: Option<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: ErrorCode) -> Self {
        Diagnostic {
            severity,
            code,
            message: String::new(),
            label: None,
            notes: Vec::new(),
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        Diagnostic::new(Severity::Error, code)
    }

    pub fn warning(code: ErrorCode) -> Self {
        Diagnostic::new(Severity::Warning, code)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Token, message: impl Into<String>) -> Self {
        self.label = Some(Label {
            token,
            message: message.into(),
        });
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::TokenKind;

    #[test]
    fn builder_accumulates() {
        let token = Token::new(TokenKind::Identifier, "x", 3, 7, "main.lyra");
        let diag = Diagnostic::error(ErrorCode::E3001)
            .with_message("invalid expression")
            .with_token(token, "here")
            .with_note("see the assignment rules");

        assert!(diag.is_error());
        assert_eq!(diag.message, "invalid expression");
        assert_eq!(diag.label.as_ref().unwrap().token.line(), 3);
        assert_eq!(diag.notes.len(), 1);
    }
}
