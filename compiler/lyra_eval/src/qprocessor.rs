//! The quantum processor abstraction.
//!
//! The core never inspects quantum state. Initialising a quantum
//! variable hands the ket to the processor, which answers with the index
//! range the register occupies; that range is all the evaluator keeps.

/// An opaque quantum state processor.
pub trait QuantumProcessor {
    /// Register a ket under `label` with the given initial bit string.
    /// Returns the inclusive (start, end) index range of the register.
    fn add_ket(&mut self, label: &str, bits: &str, length: usize) -> (usize, usize);
}

/// One registered ket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KetRecord {
    pub label: String,
    pub bits: String,
    pub start: usize,
    pub end: usize,
}

/// The default processor: allocates consecutive indices and records
/// every registration. Useful as a test double and as the stand-in when
/// no simulator is attached.
#[derive(Default, Debug)]
pub struct RecordingProcessor {
    next_index: usize,
    kets: Vec<KetRecord>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        RecordingProcessor::default()
    }

    pub fn kets(&self) -> &[KetRecord] {
        &self.kets
    }
}

impl QuantumProcessor for RecordingProcessor {
    fn add_ket(&mut self, label: &str, bits: &str, length: usize) -> (usize, usize) {
        let start = self.next_index;
        let end = start + length.saturating_sub(1);
        self.next_index = end + 1;
        self.kets.push(KetRecord {
            label: label.to_owned(),
            bits: bits.to_owned(),
            start,
            end,
        });
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_allocated_consecutively() {
        let mut proc = RecordingProcessor::new();
        assert_eq!(proc.add_ket("a", "01", 2), (0, 1));
        assert_eq!(proc.add_ket("b", "1", 1), (2, 2));
        assert_eq!(proc.kets().len(), 2);
    }
}
