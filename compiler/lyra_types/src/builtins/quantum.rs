//! Builtin classical bit and quantum qubit width types.
//!
//! Bit-string and ket literals of length 1, 2, 4 and 8 infer the
//! matching width type. The qubit types are flagged quantum: values of
//! those types may never be copied.

use lyra_ir::SharedScope;

use super::declare_type;
use crate::error::SemaError;

/// Width type name for a literal of `length` bits, when valid.
pub fn width_type(prefix: &str, length: usize) -> Option<String> {
    match length {
        1 => Some(prefix.to_owned()),
        2 | 4 | 8 => Some(format!("{prefix}{length}")),
        _ => None,
    }
}

pub(super) fn install(scope: &SharedScope) -> Result<(), SemaError> {
    for name in ["bit", "bit2", "bit4", "bit8"] {
        declare_type(scope, name, &[], false)?;
    }
    for name in ["qubit", "qubit2", "qubit4", "qubit8"] {
        declare_type(scope, name, &[], true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_types_cover_the_legal_lengths() {
        assert_eq!(width_type("bit", 1).as_deref(), Some("bit"));
        assert_eq!(width_type("qubit", 4).as_deref(), Some("qubit4"));
        assert_eq!(width_type("bit", 3), None);
        assert_eq!(width_type("qubit", 9), None);
    }
}
