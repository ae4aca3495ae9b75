//! The per-evaluation interpretation context: named-pattern registry,
//! generation policy, and cycle prevention.
//!
//! The registry is an immutable arena (name -> pattern); every
//! cross-reference between patterns is a name looked up here, never a
//! direct link. A `Resolver` is constructed once per contract evaluation
//! and discarded afterwards; the registry it wraps may be shared across
//! concurrent resolvers.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::PatternError;
use crate::pattern::Pattern;

/// How many times a single named pattern may be re-entered during one
/// generation or match before the branch terminates with a placeholder.
pub const CYCLE_DEPTH_LIMIT: usize = 3;

/// Immutable name -> pattern arena. Self-referential schemas are expressed
/// as lookups into this registry, which sidesteps ownership cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternRegistry {
    patterns: BTreeMap<String, Pattern>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        PatternRegistry::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: Pattern) {
        self.patterns.insert(name.into(), pattern);
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Flags steering what the generators produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationPolicy {
    /// Also produce boundary-violating mutations for negative testing.
    pub negative: bool,
}

/// The interpretation context for one evaluation: resolves named patterns
/// and bounds recursion into self-referential schemas.
///
/// The re-entry guard is the only mutable state, and it is interior to the
/// resolver; each concurrent evaluation gets its own `Resolver` over a
/// shared registry.
#[derive(Debug)]
pub struct Resolver<'a> {
    registry: &'a PatternRegistry,
    policy: GenerationPolicy,
    active: RefCell<BTreeMap<String, usize>>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Resolver::with_policy(registry, GenerationPolicy::default())
    }

    pub fn with_policy(registry: &'a PatternRegistry, policy: GenerationPolicy) -> Self {
        Resolver {
            registry,
            policy,
            active: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn policy(&self) -> GenerationPolicy {
        self.policy
    }

    /// Resolve a named pattern. Names fall back to the built-in scalar
    /// types when the registry has no entry.
    pub fn lookup(&self, name: &str) -> Result<Pattern, PatternError> {
        if let Some(pattern) = self.registry.get(name) {
            return Ok(pattern.clone());
        }
        match name {
            "string" => Ok(Pattern::String),
            "number" => Ok(Pattern::Number),
            "boolean" => Ok(Pattern::Boolean),
            "binary" => Ok(Pattern::Binary),
            _ => Err(PatternError::UnresolvedReference {
                name: name.to_string(),
            }),
        }
    }

    /// Run `f` under the re-entry guard for `name`. Once the same named
    /// pattern has been re-entered `CYCLE_DEPTH_LIMIT` times on this
    /// call stack, the branch terminates with `placeholder` instead of
    /// recursing further.
    pub fn with_cycle_prevention<T>(
        &self,
        name: &str,
        placeholder: impl FnOnce() -> T,
        f: impl FnOnce(&Self) -> Result<T, PatternError>,
    ) -> Result<T, PatternError> {
        {
            let mut active = self.active.borrow_mut();
            let count = active.entry(name.to_string()).or_insert(0);
            if *count >= CYCLE_DEPTH_LIMIT {
                return Ok(placeholder());
            }
            *count += 1;
        }
        let out = f(self);
        let mut active = self.active.borrow_mut();
        if let Some(count) = active.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                active.remove(name);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_and_builtin_fallback() {
        let mut registry = PatternRegistry::new();
        registry.insert("Id", Pattern::Number);
        let resolver = Resolver::new(&registry);

        assert_eq!(resolver.lookup("Id").unwrap(), Pattern::Number);
        assert_eq!(resolver.lookup("string").unwrap(), Pattern::String);
        assert!(matches!(
            resolver.lookup("Customer"),
            Err(PatternError::UnresolvedReference { name }) if name == "Customer"
        ));
    }

    #[test]
    fn guard_substitutes_placeholder_past_the_limit() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);

        fn recurse(resolver: &Resolver, depth: usize) -> Result<usize, PatternError> {
            resolver.with_cycle_prevention("Self", || depth, |r| recurse(r, depth + 1))
        }

        let depth = recurse(&resolver, 0).unwrap();
        assert_eq!(depth, CYCLE_DEPTH_LIMIT);
    }

    #[test]
    fn guard_unwinds_between_calls() {
        let registry = PatternRegistry::new();
        let resolver = Resolver::new(&registry);
        for _ in 0..10 {
            let out = resolver
                .with_cycle_prevention("Self", || 0, |_| Ok(1))
                .unwrap();
            assert_eq!(out, 1);
        }
    }
}
