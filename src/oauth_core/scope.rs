//! Scope decomposition and narrowing rules.

use std::collections::{HashMap, HashSet};

use super::error::{OAuthError, Result};

/// Decomposes scopes into atomic capabilities and recognises the maximal scope.
pub trait ScopeValidator: Send + Sync + 'static {
    /// Atomic capabilities granted by `scope`.
    fn capabilities(&self, scope: &str) -> HashSet<String>;

    /// Whether `scope` is the super-admin scope.
    fn is_maximal(&self, scope: &str) -> bool;

    /// Whether every capability of `requested` is held by `held`.
    fn is_subset(&self, requested: &str, held: &str) -> bool {
        let held = self.capabilities(held);
        self.capabilities(requested).iter().all(|cap| held.contains(cap))
    }

    /// Resolve the scope for a rotated token pair.
    ///
    /// No request keeps the held scope. A holder of the maximal scope may ask for
    /// anything. Everyone else may only narrow, and never to the maximal scope.
    fn narrow(&self, held: &str, requested: Option<&str>) -> Result<String> {
        let Some(requested) = requested else {
            return Ok(held.to_string());
        };
        if self.is_maximal(held) {
            return Ok(requested.to_string());
        }
        if self.is_maximal(requested) || !self.is_subset(requested, held) {
            return Err(OAuthError::InvalidScope);
        }
        Ok(requested.to_string())
    }
}

/// Space-delimited scopes where every word is a capability.
#[derive(Debug, Clone)]
pub struct DelimitedScopes {
    maximal: String,
}

impl DelimitedScopes {
    pub fn new(maximal: impl Into<String>) -> Self {
        DelimitedScopes { maximal: maximal.into() }
    }
}

impl Default for DelimitedScopes {
    fn default() -> Self {
        DelimitedScopes::new("*")
    }
}

impl ScopeValidator for DelimitedScopes {
    fn capabilities(&self, scope: &str) -> HashSet<String> {
        scope.split_whitespace().map(str::to_string).collect()
    }

    fn is_maximal(&self, scope: &str) -> bool {
        scope.trim() == self.maximal
    }
}

/// Named scopes that expand into capability sets, e.g. `editor` -> `read write publish`.
///
/// Words without a mapping stand for themselves.
#[derive(Debug, Clone, Default)]
pub struct MappedScopes {
    scopes: HashMap<String, HashSet<String>>,
    maximal: Option<String>,
}

impl MappedScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named scope.
    pub fn scope<I, S>(mut self, name: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.insert(name.into(), capabilities.into_iter().map(Into::into).collect());
        self
    }

    /// Marks a named scope as the maximal one.
    pub fn maximal(mut self, name: impl Into<String>) -> Self {
        self.maximal = Some(name.into());
        self
    }
}

impl ScopeValidator for MappedScopes {
    fn capabilities(&self, scope: &str) -> HashSet<String> {
        let mut caps = HashSet::new();
        for word in scope.split_whitespace() {
            match self.scopes.get(word) {
                Some(mapped) => caps.extend(mapped.iter().cloned()),
                None => {
                    caps.insert(word.to_string());
                }
            }
        }
        caps
    }

    fn is_maximal(&self, scope: &str) -> bool {
        self.maximal.as_deref().is_some_and(|m| scope.trim() == m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_request_keeps_held_scope() {
        let scopes = DelimitedScopes::default();
        assert_eq!(scopes.narrow("read write", None).unwrap(), "read write");
    }

    #[test]
    fn narrowing_is_allowed() {
        let scopes = DelimitedScopes::default();
        assert_eq!(scopes.narrow("read write", Some("read")).unwrap(), "read");
        assert_eq!(scopes.narrow("read write", Some("write read")).unwrap(), "write read");
    }

    #[test]
    fn widening_is_rejected() {
        let scopes = DelimitedScopes::default();
        assert!(matches!(scopes.narrow("read", Some("read write")), Err(OAuthError::InvalidScope)));
    }

    #[test]
    fn maximal_scope_rules() {
        let scopes = DelimitedScopes::default();
        assert!(matches!(scopes.narrow("read write", Some("*")), Err(OAuthError::InvalidScope)));
        assert_eq!(scopes.narrow("*", Some("*")).unwrap(), "*");
        assert_eq!(scopes.narrow("*", Some("anything at all")).unwrap(), "anything at all");
    }

    #[test]
    fn mapped_scopes_expand() {
        let scopes = MappedScopes::new()
            .scope("editor", ["read", "write", "publish"])
            .scope("reader", ["read"])
            .scope("admin", ["read", "write", "publish", "manage"])
            .maximal("admin");
        assert!(scopes.is_subset("reader", "editor"));
        assert!(scopes.is_subset("read publish", "editor"));
        assert!(!scopes.is_subset("editor", "reader"));
        assert!(!scopes.is_subset("unknown", "editor"));
        assert!(matches!(scopes.narrow("editor", Some("admin")), Err(OAuthError::InvalidScope)));
        assert_eq!(scopes.narrow("admin", Some("reader")).unwrap(), "reader");
    }
}
