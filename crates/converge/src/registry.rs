//! Capability registry - name to capability lookup

use crate::capability::{BoxedCapability, Capability};
use std::collections::BTreeMap;

/// Capabilities keyed by name
///
/// Populated once at startup and read-only while runs execute. Iteration
/// is in lexicographic name order, which is for display only; execution
/// order always comes from the plan.
pub struct Registry<S> {
    capabilities: BTreeMap<String, BoxedCapability<S>>,
}

impl<S> Registry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            capabilities: BTreeMap::new(),
        }
    }

    /// Register a capability under its own name
    ///
    /// An existing entry with the same name is replaced (last writer wins).
    /// The replaced capability is returned so callers can report it.
    pub fn register(&mut self, capability: BoxedCapability<S>) -> Option<BoxedCapability<S>> {
        let name = capability.name().to_string();
        let previous = self.capabilities.insert(name.clone(), capability);
        if previous.is_some() {
            log::warn!("Capability '{}' registered twice; keeping the latest", name);
        } else {
            log::debug!("Registered capability '{}'", name);
        }
        previous
    }

    /// Look up a capability by name
    pub fn get(&self, name: &str) -> Option<&dyn Capability<S>> {
        self.capabilities.get(name).map(|capability| capability.as_ref())
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// All registered names, sorted
    pub fn list(&self) -> Vec<String> {
        self.capabilities.keys().cloned().collect()
    }

    /// Iterate over `(name, capability)` pairs, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Capability<S>)> {
        self.capabilities
            .iter()
            .map(|(name, capability)| (name.as_str(), capability.as_ref()))
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[derive(Debug)]
    struct Named {
        name: &'static str,
        description: &'static str,
    }

    impl Capability<()> for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> String {
            self.description.to_string()
        }

        fn probe(&self, _desired: &()) -> Result<bool> {
            Ok(true)
        }

        fn apply(&self, _desired: &()) -> Result<()> {
            Ok(())
        }
    }

    fn named(name: &'static str, description: &'static str) -> BoxedCapability<()> {
        Box::new(Named { name, description })
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new();
        assert!(registry.register(named("ssh", "Harden SSH")).is_none());

        let found = registry.get("ssh").expect("ssh should be registered");
        assert_eq!(found.description(), "Harden SSH");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = Registry::new();
        registry.register(named("ssh", "lower"));
        assert!(registry.get("SSH").is_none());
    }

    #[test]
    fn test_register_overwrites_and_returns_previous() {
        let mut registry = Registry::new();
        registry.register(named("ssh", "first"));

        let previous = registry
            .register(named("ssh", "second"))
            .expect("overwrite should return the displaced capability");

        assert_eq!(previous.description(), "first");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("ssh").unwrap().description(), "second");
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = Registry::new();
        registry.register(named("user", ""));
        registry.register(named("firewall", ""));
        registry.register(named("ssh", ""));

        assert_eq!(registry.list(), vec!["firewall", "ssh", "user"]);

        let iterated: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(iterated, vec!["firewall", "ssh", "user"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry: Registry<()> = Registry::default();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }
}
