//! Side tables produced by checking.
//!
//! The checker never stores inferred information on AST nodes. Instances,
//! callee bindings and call classifications are keyed by node id here, so
//! the AST proper stays a pure parse artefact and re-checking is
//! idempotent by construction.

use rustc_hash::FxHashMap;

use crate::arena::ExprId;
use crate::ast::decl::SharedFunctionDecl;
use crate::instance::TypeInstance;

/// The resolved callee of a call node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Callee {
    pub namespace: String,
    pub mangled: String,
    pub arity: usize,
}

impl Callee {
    pub fn new(namespace: impl Into<String>, mangled: impl Into<String>, arity: usize) -> Self {
        Callee {
            namespace: namespace.into(),
            mangled: mangled.into(),
            arity,
        }
    }

    pub fn key(&self) -> (String, String, usize) {
        (self.namespace.clone(), self.mangled.clone(), self.arity)
    }
}

/// What a call node turned out to be.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CallKind {
    Function,
    DefaultConstructor,
    RecordConstructor,
}

/// Hash and comparator callees resolved for a map node's key type.
#[derive(Clone, Debug)]
pub struct MapCallees {
    pub hash: Callee,
    pub eq: Callee,
}

/// Checked-program facts, keyed by expression id.
#[derive(Default, Debug)]
pub struct CheckFacts {
    instances: FxHashMap<ExprId, TypeInstance>,
    callees: FxHashMap<ExprId, Callee>,
    call_kinds: FxHashMap<ExprId, CallKind>,
    map_ops: FxHashMap<ExprId, MapCallees>,
}

impl CheckFacts {
    pub fn new() -> Self {
        CheckFacts::default()
    }

    pub fn set_instance(&mut self, id: ExprId, instance: TypeInstance) {
        self.instances.insert(id, instance);
    }

    pub fn instance(&self, id: ExprId) -> Option<&TypeInstance> {
        self.instances.get(&id)
    }

    pub fn set_callee(&mut self, id: ExprId, callee: Callee) {
        self.callees.insert(id, callee);
    }

    pub fn callee(&self, id: ExprId) -> Option<&Callee> {
        self.callees.get(&id)
    }

    pub fn set_call_kind(&mut self, id: ExprId, kind: CallKind) {
        self.call_kinds.insert(id, kind);
    }

    pub fn call_kind(&self, id: ExprId) -> Option<CallKind> {
        self.call_kinds.get(&id).copied()
    }

    pub fn set_map_ops(&mut self, id: ExprId, ops: MapCallees) {
        self.map_ops.insert(id, ops);
    }

    pub fn map_ops(&self, id: ExprId) -> Option<&MapCallees> {
        self.map_ops.get(&id)
    }
}

/// Interpreter-facing registry of resolved callables, keyed by the callee
/// triple. Population is idempotent; entries are never replaced.
#[derive(Default, Debug)]
pub struct CalleeRegistry {
    entries: FxHashMap<(String, String, usize), SharedFunctionDecl>,
}

impl CalleeRegistry {
    pub fn new() -> Self {
        CalleeRegistry::default()
    }

    /// Register a resolved function under its callee triple. Returns
    /// `false` when the triple was already present (the existing entry
    /// wins).
    pub fn add(&mut self, callee: &Callee, decl: SharedFunctionDecl) -> bool {
        if self.entries.contains_key(&callee.key()) {
            return false;
        }
        self.entries.insert(callee.key(), decl);
        true
    }

    pub fn get(&self, callee: &Callee) -> Option<SharedFunctionDecl> {
        self.entries.get(&callee.key()).cloned()
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
