//! Diagnostic emitters.
//!
//! The core renders to a terminal-style text form:
//!
//! ```text
//! error[E3001]: reference to reference is not allowed
//!   --> main.lyra:4:12 (r)
//!   = note: dereference the inner value first
//! ```

use std::fmt::Write as _;
use std::io::Write as _;

use crate::Diagnostic;

/// Trait for emitting diagnostics.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic);

    /// Emit multiple diagnostics.
    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    /// Emit a summary of errors/warnings.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}

/// Render one diagnostic to its text form.
pub fn render(diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}[{}]: {}",
        diagnostic.severity, diagnostic.code, diagnostic.message
    );
    if let Some(label) = &diagnostic.label {
        let _ = write!(
            out,
            "\n  --> {}:{}:{}",
            label.token.source(),
            label.token.line(),
            label.token.column()
        );
        if !label.message.is_empty() {
            let _ = write!(out, " ({})", label.message);
        }
    }
    for note in &diagnostic.notes {
        let _ = write!(out, "\n  = note: {note}");
    }
    out
}

/// Emits diagnostics to stderr.
#[derive(Default)]
pub struct TerminalEmitter;

impl TerminalEmitter {
    pub fn new() -> Self {
        TerminalEmitter
    }
}

impl DiagnosticEmitter for TerminalEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", render(diagnostic));
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{error_count} error(s), {warning_count} warning(s)"
        );
    }
}

/// Collects rendered diagnostics in memory. Used by tests and by hosts
/// that render through their own shell.
#[derive(Default)]
pub struct BufferEmitter {
    pub rendered: Vec<String>,
}

impl BufferEmitter {
    pub fn new() -> Self {
        BufferEmitter::default()
    }
}

impl DiagnosticEmitter for BufferEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.rendered.push(render(diagnostic));
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        self.rendered
            .push(format!("{error_count} error(s), {warning_count} warning(s)"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use lyra_ir::{Token, TokenKind};

    #[test]
    fn renders_code_location_and_notes() {
        let token = Token::new(TokenKind::Identifier, "r", 4, 12, "main.lyra");
        let diag = crate::Diagnostic::error(ErrorCode::E3001)
            .with_message("reference to reference is not allowed")
            .with_token(token, "r")
            .with_note("dereference the inner value first");

        let text = render(&diag);
        assert!(text.starts_with("error[E3001]: reference to reference"));
        assert!(text.contains("--> main.lyra:4:12 (r)"));
        assert!(text.contains("note: dereference"));
    }
}
