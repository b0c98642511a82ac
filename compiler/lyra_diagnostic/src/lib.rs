//! Lyra diagnostics: error codes, structured diagnostics, emitters and
//! the collecting sink.

mod diagnostic;
mod emitter;
mod error_code;
mod sink;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use emitter::{render, BufferEmitter, DiagnosticEmitter, TerminalEmitter};
pub use error_code::ErrorCode;
pub use sink::DiagnosticSink;
