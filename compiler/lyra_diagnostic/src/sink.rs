//! The error sink.
//!
//! Checking collects one error per declaration subtree and carries on at
//! the next declaration boundary; the sink is where those errors land.
//! Interpretation errors abort immediately, so at most one of those ever
//! reaches the sink.

use crate::{Diagnostic, DiagnosticEmitter};

/// Collects diagnostics during a compilation.
#[derive(Default, Debug)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drain everything into an emitter, followed by the summary line.
    pub fn report(&self, emitter: &mut dyn DiagnosticEmitter) {
        emitter.emit_all(&self.diagnostics);
        emitter.emit_summary(self.error_count(), self.warning_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, Severity};

    #[test]
    fn counts_split_by_severity() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::error(ErrorCode::E2001).with_message("bad type"));
        sink.push(Diagnostic::warning(ErrorCode::E2002).with_message("unused"));

        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.diagnostics()[1].severity, Severity::Warning);
    }
}
