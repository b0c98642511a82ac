//! Deterministic name mangling.
//!
//! A function's call key is its name applied to the canonical spellings
//! of its parameter instances plus its return instance:
//! `id(bool)->bool`, `__cast__(int)->float`. The return instance is part
//! of the key because casts overload on it alone. The spelling of an
//! instance is its `Display` form (see `lyra_ir::TypeInstance`).

use lyra_ir::TypeInstance;

/// Mangle a function over concrete parameter and return instances.
pub fn mangle_function(name: &str, params: &[TypeInstance], ret: &TypeInstance) -> String {
    let mut out = String::with_capacity(name.len() + 16);
    out.push_str(name);
    out.push('(');
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&p.to_string());
    }
    out.push_str(")->");
    out.push_str(&ret.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::{Token, TokenKind, STAR_NS};

    fn leaf(name: &str) -> TypeInstance {
        TypeInstance::new(Token::synthetic(TokenKind::Identifier, name), STAR_NS)
    }

    #[test]
    fn mangles_are_deterministic_over_structure() {
        let a = mangle_function("id", &[leaf("bool")], &leaf("bool"));
        let b = mangle_function("id", &[leaf("bool")], &leaf("bool"));
        assert_eq!(a, b);
        assert_eq!(a, "id(bool)->bool");
    }

    #[test]
    fn return_instance_separates_casts() {
        let to_float = mangle_function("__cast__", &[leaf("int")], &leaf("float"));
        let to_string = mangle_function("__cast__", &[leaf("int")], &leaf("string"));
        assert_ne!(to_float, to_string);
    }
}
