//! Built-in profiles and engine assembly

use std::sync::Arc;

use converge::Engine;

use crate::capability;
use crate::config::Settings;
use crate::runner::CommandRunner;

/// Profiles every installation ships with
pub const BUILTIN: &[(&str, &[&str])] = &[
    ("minimal", &["hostname", "packages"]),
    ("hardened", &["user", "ssh", "firewall", "sysctl"]),
    (
        "full",
        &["hostname", "packages", "user", "ssh", "firewall", "sysctl"],
    ),
];

/// Register every capability, the built-in profiles, then configured ones
///
/// A configured profile with a built-in's name replaces it.
pub fn build_engine(settings: &Settings, runner: &Arc<dyn CommandRunner>) -> Engine<Settings> {
    let mut engine = Engine::new();

    for capability in capability::all(runner) {
        engine.register(capability);
    }

    for (name, members) in BUILTIN {
        engine.register_profile(*name, members.iter().copied());
    }

    for (name, members) in &settings.profiles {
        let unknown: Vec<&str> = members
            .iter()
            .filter(|m| !engine.registry().contains(m))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            // still registered: the run reports each unknown name as errored
            log::warn!(
                "Profile '{}' references unknown capabilities: {}",
                name,
                unknown.join(", ")
            );
        }
        engine.register_profile(name.clone(), members.iter().cloned());
    }

    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;

    fn runner() -> Arc<dyn CommandRunner> {
        Arc::new(ScriptedRunner::new())
    }

    #[test]
    fn test_builtin_profiles_reference_registered_capabilities() {
        let engine = build_engine(&Settings::default(), &runner());
        for (name, members) in BUILTIN {
            for member in *members {
                assert!(
                    engine.registry().contains(member),
                    "profile {name} references unknown {member}"
                );
            }
        }
    }

    #[test]
    fn test_listing() {
        let engine = build_engine(&Settings::default(), &runner());
        assert_eq!(engine.list_profiles(), vec!["full", "hardened", "minimal"]);
        assert_eq!(
            engine.list_capabilities(),
            vec!["firewall", "hostname", "packages", "ssh", "sysctl", "user"]
        );
    }

    #[test]
    fn test_configured_profiles_are_added_and_override() {
        let mut settings = Settings::default();
        settings
            .profiles
            .insert("web".to_string(), vec!["packages".to_string(), "firewall".to_string()]);
        settings
            .profiles
            .insert("minimal".to_string(), vec!["hostname".to_string()]);

        let engine = build_engine(&settings, &runner());

        assert_eq!(
            engine.profiles().get("web"),
            Some(vec!["packages".to_string(), "firewall".to_string()])
        );
        assert_eq!(
            engine.profiles().get("minimal"),
            Some(vec!["hostname".to_string()])
        );
    }

    #[test]
    fn test_hardened_plan_order() {
        let engine = build_engine(&Settings::default(), &runner());
        let plan = engine
            .build_plan(Some("hardened"), &["ssh".to_string(), "hostname".to_string()])
            .unwrap();
        assert_eq!(
            plan.names(),
            &["user", "ssh", "firewall", "sysctl", "hostname"]
        );
    }
}
