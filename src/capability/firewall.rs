//! Firewall capability - ufw policy and allowed ports
//!
//! `ufw status verbose` is reduced to a canonical summary (status, default
//! policies, sorted allow rules) so the comparison ignores column widths,
//! IPv6 duplicates and logging settings. An inactive ufw lists no rules in
//! its status, so the rules it will load on enable come from `ufw show added`.

use anyhow::{Result, bail};
use converge::Capability;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{FirewallSettings, Settings, parse_port_rule};
use crate::runner::{CommandRunner, command_exists};

/// What ufw reports, reduced to the parts we manage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UfwState {
    pub active: bool,
    pub incoming: Option<String>,
    pub outgoing: Option<String>,
    pub allowed: BTreeSet<String>,
}

impl UfwState {
    /// The state these settings ask for
    pub fn desired(firewall: &FirewallSettings) -> Self {
        Self {
            active: true,
            incoming: Some(firewall.default_incoming.to_string()),
            outgoing: Some(firewall.default_outgoing.to_string()),
            allowed: firewall
                .allow
                .iter()
                .map(|rule| {
                    parse_port_rule(rule).map_or_else(|_| rule.trim().to_string(), |r| r.to_string())
                })
                .collect(),
        }
    }

    /// Parse `ufw status verbose`
    pub fn parse(output: &str) -> Self {
        let mut state = Self::default();
        let mut in_rules = false;

        for line in output.lines() {
            let line = line.trim();
            if let Some(status) = line.strip_prefix("Status:") {
                state.active = status.trim() == "active";
            } else if let Some(defaults) = line.strip_prefix("Default:") {
                // "deny (incoming), allow (outgoing), disabled (routed)"
                for part in defaults.split(',') {
                    let mut words = part.split_whitespace();
                    match (words.next(), words.next()) {
                        (Some(policy), Some("(incoming)")) => {
                            state.incoming = Some(policy.to_string());
                        }
                        (Some(policy), Some("(outgoing)")) => {
                            state.outgoing = Some(policy.to_string());
                        }
                        _ => {}
                    }
                }
            } else if line.starts_with("--") {
                in_rules = true;
            } else if in_rules && !line.is_empty() {
                if let Some(rule) = parse_rule(line) {
                    state.allowed.insert(rule);
                }
            }
        }

        state
    }

    /// Read the allow rules from `ufw show added`
    ///
    /// Only plain `ufw allow <port>` lines count, matching what `parse`
    /// keeps from an active firewall.
    pub fn parse_added(&mut self, output: &str) {
        for line in output.lines() {
            let Some(rule) = line.trim().strip_prefix("ufw allow ") else {
                continue;
            };
            let mut words = rule.split_whitespace();
            if let (Some(target), None) = (words.next(), words.next()) {
                self.allowed.insert(target.to_string());
            }
        }
    }

    /// Canonical text form used for comparison
    pub fn render(&self) -> String {
        let mut out = format!(
            "status {}\n",
            if self.active { "active" } else { "inactive" }
        );
        if let Some(incoming) = &self.incoming {
            out.push_str(&format!("default incoming {incoming}\n"));
        }
        if let Some(outgoing) = &self.outgoing {
            out.push_str(&format!("default outgoing {outgoing}\n"));
        }
        for rule in &self.allowed {
            out.push_str(&format!("allow {rule}\n"));
        }
        out
    }
}

// "22/tcp   ALLOW IN   Anywhere"; v6 rows and non-allow rules are dropped
fn parse_rule(line: &str) -> Option<String> {
    let mut words = line.split_whitespace();
    let target = words.next()?;
    let rest: Vec<&str> = words.collect();
    if rest.first() == Some(&"(v6)") {
        return None;
    }
    if rest.first() != Some(&"ALLOW") {
        return None;
    }
    // only rules open to everyone are ours
    if !rest.contains(&"Anywhere") {
        return None;
    }
    Some(target.to_string())
}

/// Configures ufw
#[derive(Debug, Clone)]
pub struct Firewall {
    runner: Arc<dyn CommandRunner>,
}

impl Firewall {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn observed(&self) -> Result<Option<UfwState>> {
        if !command_exists(self.runner.as_ref(), "ufw") {
            return Ok(None);
        }
        let output = self.runner.run_capture("ufw", &["status", "verbose"])?;
        let mut state = UfwState::parse(&output);
        if !state.active {
            let added = self.runner.run_capture("ufw", &["show", "added"])?;
            state.parse_added(&added);
        }
        Ok(Some(state))
    }
}

impl Capability<Settings> for Firewall {
    fn name(&self) -> &str {
        "firewall"
    }

    fn description(&self) -> String {
        "Configure the ufw firewall".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        let expected = UfwState::desired(&desired.firewall).render();
        let observed = self.observed()?.map(|state| state.render());
        match converge::compare(&expected, observed.as_deref()) {
            converge::Comparison::Satisfied => Ok(true),
            converge::Comparison::Missing => {
                log::debug!("firewall: ufw is not installed");
                Ok(false)
            }
            converge::Comparison::Drifted { diff } => {
                log::debug!("firewall: rules differ:\n{diff}");
                Ok(false)
            }
        }
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let Some(observed) = self.observed()? else {
            bail!("ufw is not installed (add it to [packages] install)");
        };
        let wanted = UfwState::desired(&desired.firewall);

        if observed.incoming != wanted.incoming
            && let Some(policy) = &wanted.incoming
        {
            self.runner
                .run_checked("ufw", &["default", policy, "incoming"])?;
        }
        if observed.outgoing != wanted.outgoing
            && let Some(policy) = &wanted.outgoing
        {
            self.runner
                .run_checked("ufw", &["default", policy, "outgoing"])?;
        }

        for rule in wanted.allowed.difference(&observed.allowed) {
            self.runner.run_checked("ufw", &["allow", rule])?;
        }
        for rule in observed.allowed.difference(&wanted.allowed) {
            log::info!("Removing firewall rule {rule}");
            self.runner.run_checked("ufw", &["delete", "allow", rule])?;
        }

        if !observed.active {
            self.runner.run_checked("ufw", &["--force", "enable"])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;

    const ACTIVE: &str = "\
Status: active
Logging: on (low)
Default: deny (incoming), allow (outgoing), disabled (routed)
New profiles: skip

To                         Action      From
--                         ------      ----
22/tcp                     ALLOW IN    Anywhere
8080/tcp                   ALLOW IN    Anywhere
22/tcp (v6)                ALLOW IN    Anywhere (v6)
3306                       DENY IN     Anywhere
";

    const ADDED: &str = "\
Added user rules (see 'ufw status' for running firewall):
ufw allow 22/tcp
ufw allow 8080/tcp
ufw allow from 10.0.0.0/8 to any port 5432
";

    #[test]
    fn test_parse_status_verbose() {
        let state = UfwState::parse(ACTIVE);

        assert!(state.active);
        assert_eq!(state.incoming.as_deref(), Some("deny"));
        assert_eq!(state.outgoing.as_deref(), Some("allow"));
        assert_eq!(
            state.allowed.iter().collect::<Vec<_>>(),
            vec!["22/tcp", "8080/tcp"]
        );
    }

    #[test]
    fn test_parse_inactive() {
        let state = UfwState::parse("Status: inactive\n");
        assert!(!state.active);
        assert!(state.allowed.is_empty());
        assert_eq!(state.incoming, None);
    }

    #[test]
    fn test_render_is_order_independent() {
        let mut firewall = FirewallSettings::default();
        firewall.allow = vec!["443/tcp".to_string(), "22/tcp".to_string()];
        let a = UfwState::desired(&firewall).render();

        firewall.allow.reverse();
        let b = UfwState::desired(&firewall).render();

        assert_eq!(a, b);
    }

    #[test]
    fn test_probe_satisfied() {
        let runner = Arc::new(ScriptedRunner::new().ok("ufw status verbose", ACTIVE));
        let mut settings = Settings::default();
        settings.firewall.allow = vec!["8080/tcp".to_string(), "22/tcp".to_string()];

        assert!(Firewall::new(runner).probe(&settings).unwrap());
    }

    #[test]
    fn test_probe_missing_ufw() {
        let runner = Arc::new(ScriptedRunner::new().fail("which ufw", ""));
        assert!(!Firewall::new(runner).probe(&Settings::default()).unwrap());
    }

    #[test]
    fn test_apply_converges_rules() {
        let runner = Arc::new(ScriptedRunner::new().ok("ufw status verbose", ACTIVE));
        let mut settings = Settings::default();
        settings.firewall.allow = vec!["22/tcp".to_string(), "443/tcp".to_string()];

        Firewall::new(runner.clone()).apply(&settings).unwrap();

        assert_eq!(
            runner.calls_matching("ufw"),
            vec![
                "ufw status verbose",
                "ufw allow 443/tcp",
                "ufw delete allow 8080/tcp"
            ]
        );
    }

    #[test]
    fn test_apply_enables_inactive_firewall() {
        let runner = Arc::new(ScriptedRunner::new().ok("ufw status verbose", "Status: inactive\n"));

        Firewall::new(runner.clone())
            .apply(&Settings::default())
            .unwrap();

        assert_eq!(
            runner.calls_matching("ufw"),
            vec![
                "ufw status verbose",
                "ufw show added",
                "ufw default deny incoming",
                "ufw default allow outgoing",
                "ufw allow 22/tcp",
                "ufw --force enable"
            ]
        );
    }

    #[test]
    fn test_parse_added_keeps_open_port_rules() {
        let mut state = UfwState::default();
        state.parse_added(ADDED);
        assert_eq!(
            state.allowed.iter().collect::<Vec<_>>(),
            vec!["22/tcp", "8080/tcp"]
        );
    }

    #[test]
    fn test_apply_inactive_removes_rules_added_before_enable() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("ufw status verbose", "Status: inactive\n")
                .ok("ufw show added", ADDED),
        );
        let firewall = Firewall::new(runner.clone());
        let settings = Settings::default();

        firewall.apply(&settings).unwrap();
        assert_eq!(
            runner.calls_matching("ufw"),
            vec![
                "ufw status verbose",
                "ufw show added",
                "ufw default deny incoming",
                "ufw default allow outgoing",
                "ufw delete allow 8080/tcp",
                "ufw --force enable"
            ]
        );

        runner.set_ok(
            "ufw status verbose",
            "\
Status: active
Default: deny (incoming), allow (outgoing), disabled (routed)

To                         Action      From
--                         ------      ----
22/tcp                     ALLOW IN    Anywhere
",
        );
        assert!(firewall.probe(&settings).unwrap());
    }

    #[test]
    fn test_apply_without_ufw_fails() {
        let runner = Arc::new(ScriptedRunner::new().fail("which ufw", ""));
        let err = Firewall::new(runner)
            .apply(&Settings::default())
            .unwrap_err();
        assert!(err.to_string().contains("ufw is not installed"));
    }
}
