//! Type instances.
//!
//! A type instance is a concrete or partly-concrete use of a type. Every
//! expression carries one after checking. Instances are plain value
//! objects: copies are cheap and common, and ownership is always by the
//! containing node.
//!
//! Two equality relations exist and they are deliberately distinct:
//!
//! - *weak* equality ignores abstract leaves (a standin compares equal to
//!   anything) and the reference flag. It answers "could these be the
//!   same type once the generics are filled in?".
//! - *strong* equality demands both sides be fully resolved, parameters
//!   strong-equal, and reference flags match. It answers "are these the
//!   same type, full stop?".
//!
//! `strong_eq(a, b)` implies `weak_eq(a, b)`.

use std::fmt;

use bitflags::bitflags;

use crate::ast::decl::SharedTypeDecl;
use crate::token::{Token, STAR_NS};

bitflags! {
    /// State flags carried on an instance.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct InstanceFlags: u8 {
        /// The instance is a reference to its single parameter.
        const REFERENCE = 1 << 0;
        /// The instance transitively contains an abstract leaf.
        const PARAMETRIZED = 1 << 1;
        /// The instance is the `*` placeholder wildcard.
        const STAR = 1 << 2;
    }
}

/// Instance category: user-declared or one of the builtin containers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InstanceCategory {
    User,
    Tuple,
    List,
    Map,
}

/// A concrete or partly-concrete use of a type.
#[derive(Clone, Debug)]
pub struct TypeInstance {
    token: Token,
    /// Set when a standin was substituted away; enables back-lookup for
    /// diagnostics on specialised code.
    old_token: Option<Token>,
    namespace: String,
    category: InstanceCategory,
    /// Resolved declaration. `None` means the instance is abstract.
    type_ref: Option<SharedTypeDecl>,
    params: Vec<TypeInstance>,
    /// Field names for named-tuple instances, aligned with `params`.
    field_names: Vec<Option<String>>,
    flags: InstanceFlags,
}

impl TypeInstance {
    /// An unresolved USER instance named by `token`, to be resolved by the
    /// type instance checker.
    pub fn new(token: Token, namespace: impl Into<String>) -> Self {
        TypeInstance {
            token,
            old_token: None,
            namespace: namespace.into(),
            category: InstanceCategory::User,
            type_ref: None,
            params: Vec::new(),
            field_names: Vec::new(),
            flags: InstanceFlags::empty(),
        }
    }

    /// The star instance: abstract, never complete, matches anything
    /// weakly.
    pub fn star() -> Self {
        let mut inst = TypeInstance::new(Token::star(), STAR_NS);
        inst.flags = InstanceFlags::STAR | InstanceFlags::PARAMETRIZED;
        inst
    }

    /// A container instance of the given category.
    pub fn container(token: Token, category: InstanceCategory, params: Vec<TypeInstance>) -> Self {
        let mut inst = TypeInstance::new(token, STAR_NS);
        inst.category = category;
        inst.params = params;
        inst
    }

    /// A reference instance over `inner`.
    pub fn reference(inner: TypeInstance) -> Self {
        let mut inst = TypeInstance::new(
            Token::synthetic(crate::token::TokenKind::Identifier, "ref"),
            STAR_NS,
        );
        let parametrized = inner.is_parametrized() || inner.is_abstract();
        inst.params.push(inner);
        inst.flags.insert(InstanceFlags::REFERENCE);
        inst.flags.set(InstanceFlags::PARAMETRIZED, parametrized);
        inst
    }

    #[inline]
    pub fn token(&self) -> &Token {
        &self.token
    }

    #[inline]
    pub fn old_token(&self) -> Option<&Token> {
        self.old_token.as_ref()
    }

    pub fn set_old_token(&mut self, token: Token) {
        self.old_token = Some(token);
    }

    /// The instance's own name: the type name for USER instances, the
    /// standin name for abstract leaves.
    #[inline]
    pub fn name(&self) -> &str {
        self.token.lexeme()
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_namespace(&mut self, ns: impl Into<String>) {
        self.namespace = ns.into();
    }

    #[inline]
    pub fn category(&self) -> InstanceCategory {
        self.category
    }

    pub fn set_category(&mut self, category: InstanceCategory) {
        self.category = category;
    }

    #[inline]
    pub fn type_ref(&self) -> Option<&SharedTypeDecl> {
        self.type_ref.as_ref()
    }

    pub fn set_type(&mut self, decl: SharedTypeDecl) {
        self.type_ref = Some(decl);
    }

    #[inline]
    pub fn params(&self) -> &[TypeInstance] {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut [TypeInstance] {
        &mut self.params
    }

    pub fn add_param(&mut self, param: TypeInstance) {
        self.params.push(param);
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn field_names(&self) -> &[Option<String>] {
        &self.field_names
    }

    pub fn set_field_names(&mut self, names: Vec<Option<String>>) {
        self.field_names = names;
    }

    /// Index of a named tuple field, if this is a named-tuple instance.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    #[inline]
    pub fn is_star(&self) -> bool {
        self.flags.contains(InstanceFlags::STAR)
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        self.flags.contains(InstanceFlags::REFERENCE)
    }

    pub fn set_reference(&mut self, reference: bool) {
        self.flags.set(InstanceFlags::REFERENCE, reference);
    }

    /// Whether the instance transitively contains an abstract leaf.
    #[inline]
    pub fn is_parametrized(&self) -> bool {
        self.flags.contains(InstanceFlags::PARAMETRIZED)
    }

    pub fn set_parametrized(&mut self, parametrized: bool) {
        self.flags.set(InstanceFlags::PARAMETRIZED, parametrized);
    }

    /// An abstract instance has no resolved type declaration.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.type_ref.is_none()
    }

    /// Fully concrete: resolved, not the star wildcard, and no parameter
    /// is parametrised.
    pub fn is_complete(&self) -> bool {
        !self.is_star()
            && self.type_ref.is_some()
            && self.params.iter().all(TypeInstance::is_complete)
    }

    /// Whether the instance's resolved type holds quantum data.
    pub fn is_quantum(&self) -> bool {
        self.type_ref
            .as_ref()
            .is_some_and(|t| t.borrow().is_quantum())
    }

    /// The referent of a reference instance.
    pub fn referent(&self) -> Option<&TypeInstance> {
        if self.is_reference() {
            self.params.first()
        } else {
            None
        }
    }

    /// Weak equality: same category, same head, same arity, weakly-equal
    /// parameters. Abstract and star instances compare equal to anything.
    pub fn weak_eq(&self, other: &TypeInstance) -> bool {
        if self.is_star() || other.is_star() || self.is_abstract() || other.is_abstract() {
            return true;
        }
        if self.category != other.category || self.params.len() != other.params.len() {
            return false;
        }
        if self.category == InstanceCategory::User && !same_decl(self, other) {
            return false;
        }
        self.params
            .iter()
            .zip(other.params.iter())
            .all(|(a, b)| a.weak_eq(b))
    }

    /// Strong equality: weak equality plus every parameter strong-equal,
    /// matching reference flags, and both sides non-abstract.
    pub fn strong_eq(&self, other: &TypeInstance) -> bool {
        if self.is_abstract() || other.is_abstract() || self.is_star() || other.is_star() {
            return false;
        }
        if self.is_reference() != other.is_reference() {
            return false;
        }
        if self.category != other.category || self.params.len() != other.params.len() {
            return false;
        }
        if self.category == InstanceCategory::User && !same_decl(self, other) {
            return false;
        }
        self.params
            .iter()
            .zip(other.params.iter())
            .all(|(a, b)| a.strong_eq(b))
    }
}

fn same_decl(a: &TypeInstance, b: &TypeInstance) -> bool {
    match (a.type_ref(), b.type_ref()) {
        (Some(x), Some(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let x = x.borrow();
            let y = y.borrow();
            x.namespace() == y.namespace() && x.name() == y.name() && x.arity() == y.arity()
        }
        _ => false,
    }
}

impl fmt::Display for TypeInstance {
    /// The canonical spelling, also used for name mangling:
    /// `int`, `maybe(int)`, `(int,string)`, `[int]`, `{string:int}`,
    /// `ref(int)`, `*` for the star wildcard, the standin name for an
    /// abstract leaf.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_star() {
            return f.write_str("*");
        }
        if self.is_reference() {
            write!(f, "ref(")?;
            match self.referent() {
                Some(inner) => write!(f, "{inner}")?,
                None => f.write_str("?")?,
            }
            return f.write_str(")");
        }
        match self.category {
            InstanceCategory::User => {
                f.write_str(self.name())?;
                if !self.params.is_empty() {
                    f.write_str("(")?;
                    for (i, p) in self.params.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{p}")?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
            InstanceCategory::Tuple => {
                f.write_str("(")?;
                for (i, p) in self.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str(")")
            }
            InstanceCategory::List => match self.params.first() {
                Some(p) => write!(f, "[{p}]"),
                None => f.write_str("[]"),
            },
            InstanceCategory::Map => match (self.params.first(), self.params.get(1)) {
                (Some(k), Some(v)) => write!(f, "{{{k}:{v}}}"),
                _ => f.write_str("{}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn abstract_instance(name: &str) -> TypeInstance {
        TypeInstance::new(
            Token::new(TokenKind::Identifier, name, 1, 1, "test.lyra"),
            STAR_NS,
        )
    }

    #[test]
    fn star_is_abstract_and_incomplete() {
        let star = TypeInstance::star();
        assert!(star.is_star());
        assert!(star.is_abstract());
        assert!(!star.is_complete());
        assert!(star.is_parametrized());
    }

    #[test]
    fn abstract_weakly_matches_anything() {
        let a = abstract_instance("T");
        let b = abstract_instance("U");
        assert!(a.weak_eq(&b));
        assert!(a.weak_eq(&TypeInstance::star()));
        // but never strongly
        assert!(!a.strong_eq(&b));
    }

    #[test]
    fn display_spellings() {
        let t = abstract_instance("T");
        assert_eq!(t.to_string(), "T");
        assert_eq!(TypeInstance::star().to_string(), "*");

        let list = TypeInstance::container(
            Token::synthetic(TokenKind::Identifier, "list"),
            InstanceCategory::List,
            vec![abstract_instance("T")],
        );
        assert_eq!(list.to_string(), "[T]");

        let map = TypeInstance::container(
            Token::synthetic(TokenKind::Identifier, "map"),
            InstanceCategory::Map,
            vec![abstract_instance("K"), abstract_instance("V")],
        );
        assert_eq!(map.to_string(), "{K:V}");
    }
}
