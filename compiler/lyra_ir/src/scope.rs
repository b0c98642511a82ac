//! The symbol environment.
//!
//! A scope is a set of namespaced tables for types, constructors,
//! functions and variables, chained to a parent. Lookup walks the chain;
//! declaration always lands in the scope it was issued on.
//!
//! Namespace resolution: a lookup against the `"*"` namespace tries the
//! caller's namespace first and falls back to the global namespace.
//! A lookup against a concrete namespace searches only that namespace.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::decl::{Constructor, SharedFunctionDecl, SharedTypeDecl, SharedVariable};
use crate::shared::Shared;
use crate::token::{display_ns, GLOBAL_NS, STAR_NS};

pub type SharedScope = Shared<Scope>;

/// Errors from environment lookups and declarations.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum SymbolError {
    NotFound { what: &'static str, name: String },
    AlreadyDeclared { what: &'static str, name: String },
    CanCollide { what: &'static str, name: String },
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::NotFound { what, name } => {
                write!(f, "{what} <{name}> was not found in this scope")
            }
            SymbolError::AlreadyDeclared { what, name } => {
                write!(f, "{what} <{name}> is already declared")
            }
            SymbolError::CanCollide { what, name } => {
                write!(f, "{what} <{name}> matches more than one declaration")
            }
        }
    }
}

/// A reference to one constructor of a declared type.
#[derive(Clone, Debug)]
pub struct ConstructorRef {
    pub owner: SharedTypeDecl,
    pub name: String,
    pub arity: usize,
}

impl ConstructorRef {
    /// Clone the underlying constructor out of the owning type.
    pub fn get(&self) -> Constructor {
        self.owner
            .borrow()
            .constructor(&self.name, self.arity)
            .cloned()
            .unwrap_or_else(|| unreachable!("constructor ref out of sync with its type"))
    }
}

/// Per-namespace symbol tables.
#[derive(Default, Debug)]
struct SymbolTable {
    types: FxHashMap<(String, usize), SharedTypeDecl>,
    constructors: FxHashMap<(String, usize), ConstructorRef>,
    /// Multimap: overloads share a (name, arity) key and are told apart
    /// by the inference engine using argument instances.
    functions: FxHashMap<(String, usize), Vec<SharedFunctionDecl>>,
    variables: FxHashMap<String, SharedVariable>,
}

/// A lexical scope with namespaced symbol tables.
#[derive(Default, Debug)]
pub struct Scope {
    parent: Option<SharedScope>,
    origin: String,
    start_line: u32,
    end_line: u32,
    spaces: FxHashMap<String, SymbolTable>,
}

impl Scope {
    pub fn new(origin: impl Into<String>) -> Self {
        Scope {
            parent: None,
            origin: origin.into(),
            start_line: 0,
            end_line: 0,
            spaces: FxHashMap::default(),
        }
    }

    pub fn with_parent(origin: impl Into<String>, parent: SharedScope) -> Self {
        Scope {
            parent: Some(parent),
            origin: origin.into(),
            start_line: 0,
            end_line: 0,
            spaces: FxHashMap::default(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn parent(&self) -> Option<&SharedScope> {
        self.parent.as_ref()
    }

    pub fn set_lines(&mut self, start: u32, end: u32) {
        self.start_line = start;
        self.end_line = end;
    }

    pub fn lines(&self) -> (u32, u32) {
        (self.start_line, self.end_line)
    }

    fn space(&mut self, ns: &str) -> &mut SymbolTable {
        self.spaces.entry(ns.to_owned()).or_default()
    }

    /// Candidate namespaces for a lookup, in search order.
    fn search_order<'a>(requested: &'a str, caller: &'a str) -> Vec<&'a str> {
        if requested == STAR_NS {
            if caller == GLOBAL_NS || caller == STAR_NS {
                vec![GLOBAL_NS]
            } else {
                vec![caller, GLOBAL_NS]
            }
        } else {
            vec![requested]
        }
    }

    // -- types ------------------------------------------------------------

    /// Declare a type in `ns`. Registers its constructors alongside it.
    pub fn add_type(&mut self, ns: &str, decl: SharedTypeDecl) -> Result<(), SymbolError> {
        let (name, arity) = {
            let d = decl.borrow();
            (d.name().to_owned(), d.arity())
        };
        let table = self.space(ns);
        if table.types.contains_key(&(name.clone(), arity)) {
            return Err(SymbolError::AlreadyDeclared { what: "type", name });
        }

        let cons_keys: Vec<(String, usize)> = decl
            .borrow()
            .constructors()
            .map(|c| (c.name().to_owned(), c.arity()))
            .collect();
        for key in &cons_keys {
            if table.constructors.contains_key(key) {
                return Err(SymbolError::AlreadyDeclared {
                    what: "constructor",
                    name: key.0.clone(),
                });
            }
        }
        for (cons_name, cons_arity) in cons_keys {
            table.constructors.insert(
                (cons_name.clone(), cons_arity),
                ConstructorRef {
                    owner: decl.clone(),
                    name: cons_name,
                    arity: cons_arity,
                },
            );
        }
        table.types.insert((name, arity), decl);
        Ok(())
    }

    pub fn type_exists(&self, ns: &str, caller: &str, name: &str, arity: usize) -> bool {
        self.get_type(ns, caller, name, arity).is_ok()
    }

    pub fn get_type(
        &self,
        ns: &str,
        caller: &str,
        name: &str,
        arity: usize,
    ) -> Result<SharedTypeDecl, SymbolError> {
        for space in Scope::search_order(ns, caller) {
            if let Some(table) = self.spaces.get(space) {
                if let Some(decl) = table.types.get(&(name.to_owned(), arity)) {
                    return Ok(decl.clone());
                }
            }
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().get_type(ns, caller, name, arity);
        }
        Err(SymbolError::NotFound {
            what: "type",
            name: format!("{}.{}/{}", display_ns(ns), name, arity),
        })
    }

    // -- constructors -----------------------------------------------------

    pub fn get_constructor(
        &self,
        ns: &str,
        caller: &str,
        name: &str,
        arity: usize,
    ) -> Result<ConstructorRef, SymbolError> {
        for space in Scope::search_order(ns, caller) {
            if let Some(table) = self.spaces.get(space) {
                if let Some(cons) = table.constructors.get(&(name.to_owned(), arity)) {
                    return Ok(cons.clone());
                }
            }
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().get_constructor(ns, caller, name, arity);
        }
        Err(SymbolError::NotFound {
            what: "constructor",
            name: format!("{}.{}/{}", display_ns(ns), name, arity),
        })
    }

    pub fn constructor_exists(&self, ns: &str, caller: &str, name: &str, arity: usize) -> bool {
        self.get_constructor(ns, caller, name, arity).is_ok()
    }

    // -- functions --------------------------------------------------------

    /// Declare a function in `ns`. Overloads on the same (name, arity)
    /// are allowed; an exact duplicate of the declared signature spelling
    /// (parameters and return) is rejected. Casts legitimately overload
    /// on the return instance alone.
    pub fn add_function(&mut self, ns: &str, decl: SharedFunctionDecl) -> Result<(), SymbolError> {
        fn signature_of(decl: &SharedFunctionDecl) -> Vec<String> {
            let d = decl.borrow();
            let mut sig: Vec<String> =
                d.param_instances().iter().map(ToString::to_string).collect();
            sig.push(d.return_instance().to_string());
            sig
        }

        let (name, arity) = {
            let d = decl.borrow();
            (d.name().to_owned(), d.arity())
        };
        let signature = signature_of(&decl);
        let table = self.space(ns);
        let overloads = table.functions.entry((name.clone(), arity)).or_default();
        for existing in overloads.iter() {
            if signature_of(existing) == signature {
                return Err(SymbolError::AlreadyDeclared {
                    what: "function",
                    name,
                });
            }
        }
        overloads.push(decl);
        Ok(())
    }

    /// Collect overload candidates. The first namespace in search order
    /// that holds any candidate wins; namespaces are not merged.
    pub fn get_functions(
        &self,
        ns: &str,
        caller: &str,
        name: &str,
        arity: usize,
    ) -> Vec<SharedFunctionDecl> {
        for space in Scope::search_order(ns, caller) {
            let found = self.functions_in(space, name, arity);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn functions_in(&self, space: &str, name: &str, arity: usize) -> Vec<SharedFunctionDecl> {
        if let Some(table) = self.spaces.get(space) {
            if let Some(overloads) = table.functions.get(&(name.to_owned(), arity)) {
                if !overloads.is_empty() {
                    return overloads.clone();
                }
            }
        }
        match &self.parent {
            Some(parent) => parent.borrow().functions_in(space, name, arity),
            None => Vec::new(),
        }
    }

    pub fn function_exists(&self, ns: &str, caller: &str, name: &str, arity: usize) -> bool {
        !self.get_functions(ns, caller, name, arity).is_empty()
    }

    // -- variables --------------------------------------------------------

    pub fn add_variable(&mut self, ns: &str, decl: SharedVariable) -> Result<(), SymbolError> {
        let name = decl.borrow().name().to_owned();
        let table = self.space(ns);
        if table.variables.contains_key(&name) {
            return Err(SymbolError::AlreadyDeclared {
                what: "variable",
                name,
            });
        }
        table.variables.insert(name, decl);
        Ok(())
    }

    pub fn get_variable(
        &self,
        ns: &str,
        caller: &str,
        name: &str,
    ) -> Result<SharedVariable, SymbolError> {
        for space in Scope::search_order(ns, caller) {
            if let Some(table) = self.spaces.get(space) {
                if let Some(var) = table.variables.get(name) {
                    return Ok(var.clone());
                }
            }
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().get_variable(ns, caller, name);
        }
        Err(SymbolError::NotFound {
            what: "variable",
            name: format!("{}.{}", display_ns(ns), name),
        })
    }

    pub fn variable_exists(&self, ns: &str, caller: &str, name: &str) -> bool {
        self.get_variable(ns, caller, name).is_ok()
    }

    /// Whether `name` names a namespace known to this scope chain.
    pub fn namespace_exists(&self, name: &str) -> bool {
        if self.spaces.contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow().namespace_exists(name),
            None => false,
        }
    }

    /// Ensure a namespace table exists even when empty.
    pub fn declare_namespace(&mut self, ns: &str) {
        self.space(ns);
    }

    /// All namespaces declared directly on this scope.
    pub fn namespaces(&self) -> Vec<String> {
        let mut spaces: Vec<String> = self.spaces.keys().cloned().collect();
        spaces.sort();
        spaces
    }

    /// All public declarations of one namespace, for import linking.
    pub fn public_decls(&self, ns: &str) -> PublicDecls {
        let mut out = PublicDecls::default();
        if let Some(table) = self.spaces.get(ns) {
            for decl in table.types.values() {
                if decl.borrow().is_public() {
                    out.types.push(decl.clone());
                }
            }
            for overloads in table.functions.values() {
                for decl in overloads {
                    if decl.borrow().is_public() {
                        out.functions.push(decl.clone());
                    }
                }
            }
            for decl in table.variables.values() {
                if decl.borrow().is_public() {
                    out.variables.push(decl.clone());
                }
            }
        }
        out
    }
}

/// Public declarations of one namespace, as collected for linking.
#[derive(Default, Debug)]
pub struct PublicDecls {
    pub types: Vec<SharedTypeDecl>,
    pub functions: Vec<SharedFunctionDecl>,
    pub variables: Vec<SharedVariable>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decl::{TypeDecl, Variable};
    use crate::token::{Token, TokenKind};

    fn type_decl(name: &str) -> SharedTypeDecl {
        Shared::new(TypeDecl::new(
            Token::new(TokenKind::Identifier, name, 1, 1, "test.lyra"),
            GLOBAL_NS,
            name,
        ))
    }

    #[test]
    fn declare_and_find_type() {
        let mut scope = Scope::new("test.lyra");
        scope.add_type(GLOBAL_NS, type_decl("bool")).unwrap();

        assert!(scope.type_exists(GLOBAL_NS, GLOBAL_NS, "bool", 0));
        // the star namespace falls back to global
        assert!(scope.type_exists(STAR_NS, "geometry", "bool", 0));
        assert!(!scope.type_exists(STAR_NS, "geometry", "bool", 1));
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut scope = Scope::new("test.lyra");
        scope.add_type(GLOBAL_NS, type_decl("bool")).unwrap();
        let err = scope.add_type(GLOBAL_NS, type_decl("bool")).unwrap_err();
        assert!(matches!(err, SymbolError::AlreadyDeclared { .. }));
    }

    #[test]
    fn lookup_walks_parents() {
        let root = Shared::new(Scope::new("root.lyra"));
        root.borrow_mut()
            .add_type(GLOBAL_NS, type_decl("int"))
            .unwrap();

        let child = Scope::with_parent("fn main", root.clone());
        assert!(child.type_exists(STAR_NS, GLOBAL_NS, "int", 0));
    }

    #[test]
    fn variables_are_per_namespace() {
        let mut scope = Scope::new("test.lyra");
        let var = Shared::new(Variable::new(
            Token::new(TokenKind::Identifier, "x", 3, 1, "test.lyra"),
            "geometry",
            false,
        ));
        scope.add_variable("geometry", var).unwrap();

        assert!(scope.variable_exists("geometry", GLOBAL_NS, "x"));
        assert!(!scope.variable_exists(GLOBAL_NS, GLOBAL_NS, "x"));
        // search namespace finds it through the caller namespace
        assert!(scope.variable_exists(STAR_NS, "geometry", "x"));
    }
}
