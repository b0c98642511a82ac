//! Environment lookups with token attribution.
//!
//! `lyra_ir::Scope` reports plain symbol errors; semantic analysis wants
//! them anchored to the token that asked. These helpers do the
//! conversion so every caller gets a `SemaError` it can hand to the
//! sink.

use lyra_ir::{ConstructorRef, SharedScope, SharedTypeDecl, SharedVariable, Token};

use crate::error::SemaError;

pub fn find_type(
    scope: &SharedScope,
    ns: &str,
    caller: &str,
    name: &str,
    arity: usize,
    token: &Token,
) -> Result<SharedTypeDecl, SemaError> {
    scope
        .borrow()
        .get_type(ns, caller, name, arity)
        .map_err(|e| SemaError::symbol(token, e))
}

pub fn find_constructor(
    scope: &SharedScope,
    ns: &str,
    caller: &str,
    name: &str,
    arity: usize,
    token: &Token,
) -> Result<ConstructorRef, SemaError> {
    scope
        .borrow()
        .get_constructor(ns, caller, name, arity)
        .map_err(|e| SemaError::symbol(token, e))
}

pub fn find_variable(
    scope: &SharedScope,
    ns: &str,
    caller: &str,
    name: &str,
    token: &Token,
) -> Result<SharedVariable, SemaError> {
    scope
        .borrow()
        .get_variable(ns, caller, name)
        .map_err(|e| SemaError::symbol(token, e))
}
