//! Declarations: types, constructors, variables, functions.
//!
//! Types and functions are registered at load time and live for the whole
//! process. They are never mutated after checking, with one exception:
//! a function's specialisation table grows monotonically and
//! registration is idempotent by mangled name.

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::arena::{ExprId, StmtId};
use crate::instance::TypeInstance;
use crate::scope::SharedScope;
use crate::shared::Shared;
use crate::token::Token;

pub type SharedTypeDecl = Shared<TypeDecl>;
pub type SharedVariable = Shared<Variable>;
pub type SharedFunctionDecl = Shared<FunctionDecl>;

/// A data constructor, either positional or named-field.
#[derive(Clone, Debug)]
pub enum Constructor {
    /// Anonymous parameters, applied positionally.
    Default {
        token: Token,
        params: Vec<TypeInstance>,
    },
    /// Named parameters; the map preserves declaration order, which is
    /// what record mangling iterates.
    Record {
        token: Token,
        fields: IndexMap<String, TypeInstance>,
    },
}

impl Constructor {
    pub fn token(&self) -> &Token {
        match self {
            Constructor::Default { token, .. } | Constructor::Record { token, .. } => token,
        }
    }

    pub fn name(&self) -> &str {
        self.token().lexeme()
    }

    pub fn arity(&self) -> usize {
        match self {
            Constructor::Default { params, .. } => params.len(),
            Constructor::Record { fields, .. } => fields.len(),
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Constructor::Record { .. })
    }

    /// Parameter instances in declaration order.
    pub fn param_instances(&self) -> Vec<TypeInstance> {
        match self {
            Constructor::Default { params, .. } => params.clone(),
            Constructor::Record { fields, .. } => fields.values().cloned().collect(),
        }
    }

    /// Mutable views of the parameter instances, declaration order.
    pub fn param_instances_mut(&mut self) -> Vec<&mut TypeInstance> {
        match self {
            Constructor::Default { params, .. } => params.iter_mut().collect(),
            Constructor::Record { fields, .. } => fields.values_mut().collect(),
        }
    }

    /// Field names of a record constructor, declaration order.
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Constructor::Default { .. } => Vec::new(),
            Constructor::Record { fields, .. } => fields.keys().cloned().collect(),
        }
    }
}

/// A type declaration.
///
/// Identity is (namespace, name, arity); `arity` is the number of
/// abstract parameter names (standins).
#[derive(Clone, Debug)]
pub struct TypeDecl {
    token: Token,
    namespace: String,
    fqn: String,
    is_public: bool,
    /// Set on the builtin qubit width types; quantum data may not be
    /// copied by value.
    is_quantum: bool,
    standins: Vec<Token>,
    constructors: IndexMap<(String, usize), Constructor>,
}

impl TypeDecl {
    pub fn new(token: Token, namespace: impl Into<String>, fqn: impl Into<String>) -> Self {
        TypeDecl {
            token,
            namespace: namespace.into(),
            fqn: fqn.into(),
            is_public: true,
            is_quantum: false,
            standins: Vec::new(),
            constructors: IndexMap::new(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn name(&self) -> &str {
        self.token.lexeme()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn set_public(&mut self, public: bool) {
        self.is_public = public;
    }

    pub fn is_quantum(&self) -> bool {
        self.is_quantum
    }

    pub fn set_quantum(&mut self, quantum: bool) {
        self.is_quantum = quantum;
    }

    pub fn standins(&self) -> &[Token] {
        &self.standins
    }

    pub fn add_standin(&mut self, standin: Token) {
        self.standins.push(standin);
    }

    pub fn arity(&self) -> usize {
        self.standins.len()
    }

    pub fn add_constructor(&mut self, cons: Constructor) {
        self.constructors
            .insert((cons.name().to_owned(), cons.arity()), cons);
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Constructor> {
        self.constructors.values()
    }

    pub fn constructors_mut(&mut self) -> impl Iterator<Item = &mut Constructor> {
        self.constructors.values_mut()
    }

    pub fn constructor(&self, name: &str, arity: usize) -> Option<&Constructor> {
        self.constructors.get(&(name.to_owned(), arity))
    }
}

bitflags! {
    /// Variable state flags.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct VariableFlags: u8 {
        const MUTABLE = 1 << 0;
        const PUBLIC = 1 << 1;
        const GLOBAL = 1 << 2;
        const USED = 1 << 3;
    }
}

/// Checking state of a variable declaration.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Validity {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

/// A variable declaration, global or local.
#[derive(Clone, Debug)]
pub struct Variable {
    token: Token,
    namespace: String,
    flags: VariableFlags,
    instance: Option<TypeInstance>,
    initialiser: Option<ExprId>,
    validity: Validity,
}

impl Variable {
    pub fn new(token: Token, namespace: impl Into<String>, mutable: bool) -> Self {
        let mut flags = VariableFlags::empty();
        flags.set(VariableFlags::MUTABLE, mutable);
        Variable {
            token,
            namespace: namespace.into(),
            flags,
            instance: None,
            initialiser: None,
            validity: Validity::Unknown,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn name(&self) -> &str {
        self.token.lexeme()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_mutable(&self) -> bool {
        self.flags.contains(VariableFlags::MUTABLE)
    }

    pub fn set_mutable(&mut self, mutable: bool) {
        self.flags.set(VariableFlags::MUTABLE, mutable);
    }

    pub fn is_public(&self) -> bool {
        self.flags.contains(VariableFlags::PUBLIC)
    }

    pub fn set_public(&mut self, public: bool) {
        self.flags.set(VariableFlags::PUBLIC, public);
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains(VariableFlags::GLOBAL)
    }

    pub fn set_global(&mut self, global: bool) {
        self.flags.set(VariableFlags::GLOBAL, global);
    }

    pub fn is_used(&self) -> bool {
        self.flags.contains(VariableFlags::USED)
    }

    pub fn mark_used(&mut self) {
        self.flags.insert(VariableFlags::USED);
    }

    pub fn instance(&self) -> Option<&TypeInstance> {
        self.instance.as_ref()
    }

    pub fn set_instance(&mut self, instance: TypeInstance) {
        self.instance = Some(instance);
    }

    pub fn initialiser(&self) -> Option<ExprId> {
        self.initialiser
    }

    pub fn set_initialiser(&mut self, expr: ExprId) {
        self.initialiser = Some(expr);
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn set_validity(&mut self, validity: Validity) {
        self.validity = validity;
    }
}

/// A function declaration.
///
/// `constraints` are the generic parameter tokens; a function with a
/// non-empty constraint list must be specialised before it can be
/// called or interpreted.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    token: Token,
    namespace: String,
    fqn: String,
    is_public: bool,
    is_builtin: bool,
    constraints: Vec<Token>,
    params: Vec<(String, SharedVariable)>,
    return_instance: TypeInstance,
    body: Option<StmtId>,
    scope: Option<SharedScope>,
    /// Mangled name, set once the function (or its specialisation) has
    /// been resolved against concrete argument instances.
    mangled: Option<String>,
    /// Specialisations keyed by mangled name; insertion is idempotent.
    specialisations: IndexMap<String, SharedFunctionDecl>,
}

impl FunctionDecl {
    pub fn new(
        token: Token,
        namespace: impl Into<String>,
        fqn: impl Into<String>,
        return_instance: TypeInstance,
    ) -> Self {
        FunctionDecl {
            token,
            namespace: namespace.into(),
            fqn: fqn.into(),
            is_public: true,
            is_builtin: false,
            constraints: Vec::new(),
            params: Vec::new(),
            return_instance,
            body: None,
            scope: None,
            mangled: None,
            specialisations: IndexMap::new(),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn name(&self) -> &str {
        self.token.lexeme()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn set_public(&mut self, public: bool) {
        self.is_public = public;
    }

    pub fn is_builtin(&self) -> bool {
        self.is_builtin
    }

    pub fn set_builtin(&mut self, builtin: bool) {
        self.is_builtin = builtin;
    }

    pub fn constraints(&self) -> &[Token] {
        &self.constraints
    }

    pub fn add_constraint(&mut self, constraint: Token) {
        self.constraints.push(constraint);
    }

    pub fn is_generic(&self) -> bool {
        !self.constraints.is_empty()
    }

    pub fn params(&self) -> &[(String, SharedVariable)] {
        &self.params
    }

    pub fn add_param(&mut self, name: impl Into<String>, var: SharedVariable) {
        self.params.push((name.into(), var));
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameter instances, in order.
    pub fn param_instances(&self) -> Vec<TypeInstance> {
        self.params
            .iter()
            .map(|(_, v)| {
                v.borrow()
                    .instance()
                    .cloned()
                    .unwrap_or_else(TypeInstance::star)
            })
            .collect()
    }

    pub fn return_instance(&self) -> &TypeInstance {
        &self.return_instance
    }

    pub fn set_return_instance(&mut self, instance: TypeInstance) {
        self.return_instance = instance;
    }

    pub fn body(&self) -> Option<StmtId> {
        self.body
    }

    pub fn set_body(&mut self, body: StmtId) {
        self.body = Some(body);
    }

    pub fn scope(&self) -> Option<&SharedScope> {
        self.scope.as_ref()
    }

    pub fn set_scope(&mut self, scope: SharedScope) {
        self.scope = Some(scope);
    }

    pub fn mangled(&self) -> Option<&str> {
        self.mangled.as_deref()
    }

    pub fn set_mangled(&mut self, mangled: impl Into<String>) {
        self.mangled = Some(mangled.into());
    }

    /// Register a specialisation. Idempotent by mangled name: a repeat
    /// registration keeps the first clone and reports `false`.
    pub fn add_specialisation(&mut self, mangled: String, spec: SharedFunctionDecl) -> bool {
        if self.specialisations.contains_key(&mangled) {
            return false;
        }
        self.specialisations.insert(mangled, spec);
        true
    }

    pub fn specialisation(&self, mangled: &str) -> Option<SharedFunctionDecl> {
        self.specialisations.get(mangled).cloned()
    }

    pub fn specialisations(&self) -> impl Iterator<Item = (&String, &SharedFunctionDecl)> {
        self.specialisations.iter()
    }
}
