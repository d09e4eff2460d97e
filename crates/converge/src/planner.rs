//! Execution planner - resolves profiles and selections into ordered plans

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};

/// Named, read-only lists of capability names
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Vec<String>>,
}

impl ProfileCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any profile with the same name
    ///
    /// Returns the replaced member list, if any.
    pub fn insert<I, N>(&mut self, name: impl Into<String>, members: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let name = name.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        let previous = self.profiles.insert(name.clone(), members);
        if previous.is_some() {
            log::warn!("Profile '{}' defined twice; keeping the latest", name);
        }
        previous
    }

    /// Look up a profile's members
    ///
    /// The returned list is a copy; the catalog cannot be modified through it.
    pub fn get(&self, name: &str) -> Option<Vec<String>> {
        self.profiles.get(name).cloned()
    }

    /// All profile names, sorted
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Iterate over `(name, members)` pairs, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.profiles
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// An ordered, de-duplicated, non-empty list of capability names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    names: Vec<String>,
}

impl ExecutionPlan {
    /// Build a plan from names, dropping repeats after their first occurrence
    ///
    /// Fails with [`Error::EmptyPlan`] if no names remain.
    pub fn from_names<I, N>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| seen.insert(name.clone()))
            .collect();

        if names.is_empty() {
            return Err(Error::EmptyPlan);
        }

        Ok(Self { names })
    }

    /// Planned capability names, in execution order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of planned capabilities
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check if a capability is part of the plan
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Build an execution plan from an optional profile and explicit names
///
/// Profile members come first in their declared order, followed by the
/// explicit names in caller order. A name appearing more than once runs
/// once, at its first position. Names are not checked against any
/// registry here; unknown names surface as errored results at execution.
pub fn build_plan(
    catalog: &ProfileCatalog,
    profile: Option<&str>,
    explicit: &[String],
) -> Result<ExecutionPlan> {
    let mut names = Vec::new();

    if let Some(profile) = profile {
        let members = catalog.get(profile).ok_or_else(|| Error::ProfileNotFound {
            name: profile.to_string(),
            available: catalog.names(),
        })?;
        log::debug!("Profile '{}' expands to {:?}", profile, members);
        names.extend(members);
    }

    names.extend(explicit.iter().cloned());

    let plan = ExecutionPlan::from_names(names)?;
    log::debug!("Resolved plan: {:?}", plan.names());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn catalog() -> ProfileCatalog {
        let mut catalog = ProfileCatalog::new();
        catalog.insert("web", ["a", "b", "a"]);
        catalog.insert("base", ["hostname", "packages"]);
        catalog
    }

    #[test]
    fn test_profile_and_explicit_are_deduplicated() {
        let plan = build_plan(&catalog(), Some("web"), &strings(&["b", "c"])).unwrap();
        assert_eq!(plan.names(), &strings(&["a", "b", "c"])[..]);
    }

    #[test]
    fn test_profile_order_comes_first() {
        let plan = build_plan(&catalog(), Some("base"), &strings(&["user", "hostname"])).unwrap();
        assert_eq!(plan.names(), &strings(&["hostname", "packages", "user"])[..]);
    }

    #[test]
    fn test_explicit_only() {
        let plan = build_plan(&catalog(), None, &strings(&["ssh", "user", "ssh"])).unwrap();
        assert_eq!(plan.names(), &strings(&["ssh", "user"])[..]);
    }

    #[test]
    fn test_unknown_profile_names_available() {
        let err = build_plan(&catalog(), Some("db"), &[]).unwrap_err();
        assert_eq!(
            err,
            Error::ProfileNotFound {
                name: "db".to_string(),
                available: strings(&["base", "web"]),
            }
        );
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        let err = build_plan(&catalog(), None, &[]).unwrap_err();
        assert_eq!(err, Error::EmptyPlan);

        let mut empty = ProfileCatalog::new();
        empty.insert("nothing", Vec::<String>::new());
        assert_eq!(
            build_plan(&empty, Some("nothing"), &[]).unwrap_err(),
            Error::EmptyPlan
        );
    }

    #[test]
    fn test_unregistered_names_are_kept() {
        let plan = build_plan(&catalog(), None, &strings(&["missing"])).unwrap();
        assert!(plan.contains("missing"));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_profile_lookup_returns_copy() {
        let catalog = catalog();
        let mut members = catalog.get("base").unwrap();
        members.push("tampered".to_string());
        members.clear();

        assert_eq!(catalog.get("base").unwrap(), strings(&["hostname", "packages"]));
    }

    #[test]
    fn test_profile_overwrite_returns_previous() {
        let mut catalog = catalog();
        let previous = catalog.insert("base", ["packages"]).unwrap();
        assert_eq!(previous, strings(&["hostname", "packages"]));
        assert_eq!(catalog.get("base").unwrap(), strings(&["packages"]));
    }

    #[test]
    fn test_profile_names_sorted() {
        let mut catalog = ProfileCatalog::new();
        catalog.insert("zeta", ["a"]);
        catalog.insert("alpha", ["b"]);
        assert_eq!(catalog.names(), strings(&["alpha", "zeta"]));
    }
}
