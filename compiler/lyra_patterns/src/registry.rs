//! The builtin function registry.
//!
//! Maps `(namespace, mangled-name, arity)` to a callable. The mangled
//! keys mirror the declarations `lyra_types::builtins` installs; the
//! checker resolves a call to one of those declarations, and the
//! evaluator lands here through the resulting callee triple.

use rustc_hash::FxHashMap;

use lyra_ir::{Callee, GLOBAL_NS};

use crate::builtins;
use crate::errors::EvalResult;
use crate::value::Value;

/// A builtin implementation.
pub type BuiltinFn = fn(&[Value]) -> EvalResult;

/// Registry of builtin callables.
pub struct BuiltinRegistry {
    entries: FxHashMap<(String, String, usize), BuiltinFn>,
}

impl BuiltinRegistry {
    pub fn empty() -> Self {
        BuiltinRegistry {
            entries: FxHashMap::default(),
        }
    }

    /// The standard registry: every operation the builtin declarations
    /// promise.
    pub fn standard() -> Self {
        let mut registry = BuiltinRegistry::empty();
        builtins::install(&mut registry);
        registry
    }

    /// Register an implementation in the global namespace.
    pub fn add(&mut self, mangled: &str, arity: usize, f: BuiltinFn) {
        self.entries
            .insert((GLOBAL_NS.to_owned(), mangled.to_owned(), arity), f);
    }

    pub fn get(&self, callee: &Callee) -> Option<BuiltinFn> {
        self.entries.get(&callee.key()).copied()
    }

    pub fn contains(&self, callee: &Callee) -> bool {
        self.entries.contains_key(&callee.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        BuiltinRegistry::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callee(mangled: &str, arity: usize) -> Callee {
        Callee::new(GLOBAL_NS, mangled, arity)
    }

    #[test]
    fn standard_registry_covers_the_operator_surface() {
        let registry = BuiltinRegistry::standard();
        for (mangled, arity) in [
            ("__add__(int,int)->int", 2),
            ("__pow__(int,int)->int", 2),
            ("__eq__(int,int)->bool", 2),
            ("__hash__(int)->int", 1),
            ("__cast__(int)->float", 1),
            ("__add__(float,float)->float", 2),
            ("__add__(dec,dec)->dec", 2),
            ("__add__(string,string)->string", 2),
            ("__reverse__(string)->string", 1),
            ("__hash__(string)->int", 1),
            ("__and__(bool,bool)->bool", 2),
            ("__not__(bool)->bool", 1),
        ] {
            assert!(
                registry.contains(&callee(mangled, arity)),
                "missing builtin {mangled}"
            );
        }
    }

    #[test]
    fn dispatch_runs_the_implementation() {
        let registry = BuiltinRegistry::standard();
        let add = registry
            .get(&callee("__add__(int,int)->int", 2))
            .unwrap();
        let out = add(&[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(out, Value::Int(3));
    }
}
