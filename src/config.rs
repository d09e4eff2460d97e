//! Desired-state configuration
//!
//! One TOML file describes the server: its hostname, the operator
//! account, SSH daemon settings, packages, firewall rules, kernel
//! parameters, and any extra profiles. Every section is optional and
//! falls back to conservative defaults.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The full desired state of a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Static hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Operator account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSettings>,

    /// SSH daemon hardening
    #[serde(default)]
    pub ssh: SshSettings,

    /// System packages
    #[serde(default)]
    pub packages: PackageSettings,

    /// Host firewall (ufw)
    #[serde(default)]
    pub firewall: FirewallSettings,

    /// Kernel parameters
    #[serde(default)]
    pub sysctl: SysctlSettings,

    /// Extra profiles, name -> capability names
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Vec<String>>,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// A missing file yields the default settings.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in serverkit config")
    }

    /// Render settings back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Collect every validation problem
    pub fn problems(&self) -> Vec<ValidationError> {
        let mut problems = Vec::new();

        if let Some(hostname) = &self.hostname
            && !HOSTNAME_RE.is_match(hostname)
        {
            problems.push(ValidationError::new(
                "hostname",
                format!("'{hostname}' is not a valid hostname"),
            ));
        }

        if let Some(user) = &self.user {
            user.validate(&mut problems);
        }
        self.ssh.validate(&mut problems);
        self.packages.validate(&mut problems);
        self.firewall.validate(&mut problems);
        self.sysctl.validate(&mut problems);

        for (name, members) in &self.profiles {
            if members.is_empty() {
                problems.push(ValidationError::new(
                    format!("profiles.{name}"),
                    "profile lists no capabilities",
                ));
            }
        }

        problems
    }

    /// Validate the configuration, failing on the first report of problems
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        let listed: Vec<String> = problems.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration:\n  - {}", listed.join("\n  - "))
    }
}

/// A single configuration problem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// RFC 1123 labels, dot separated
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("hostname regex is valid")
});

// useradd's default NAME_REGEX
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("username regex is valid"));

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9+.-]+$").expect("package regex is valid"));

static SYSCTL_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+(\.[a-zA-Z0-9_-]+)+$").expect("sysctl regex is valid"));

// ============================================================================
// User
// ============================================================================

/// The operator account to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSettings {
    /// Login name
    pub name: String,

    /// Login shell
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Supplementary groups (e.g. "sudo")
    #[serde(default)]
    pub groups: Vec<String>,

    /// Public keys written to ~/.ssh/authorized_keys
    #[serde(default)]
    pub authorized_keys: Vec<String>,

    /// Home directory; defaults to /home/<name>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

impl UserSettings {
    /// Expanded home directory
    pub fn home_dir(&self) -> PathBuf {
        match &self.home {
            Some(home) => PathBuf::from(shellexpand::tilde(home).as_ref()),
            None => PathBuf::from("/home").join(&self.name),
        }
    }

    fn validate(&self, problems: &mut Vec<ValidationError>) {
        if !USERNAME_RE.is_match(&self.name) {
            problems.push(ValidationError::new(
                "user.name",
                format!("'{}' is not a valid user name", self.name),
            ));
        }
        if !self.shell.starts_with('/') {
            problems.push(ValidationError::new(
                "user.shell",
                format!("'{}' must be an absolute path", self.shell),
            ));
        }
        for group in &self.groups {
            if !USERNAME_RE.is_match(group) {
                problems.push(ValidationError::new(
                    "user.groups",
                    format!("'{group}' is not a valid group name"),
                ));
            }
        }
        for key in &self.authorized_keys {
            if key.split_whitespace().count() < 2 || key.contains('\n') {
                problems.push(ValidationError::new(
                    "user.authorized_keys",
                    format!("'{}' does not look like a public key", termkit::truncate(key, 40)),
                ));
            }
        }
    }
}

// ============================================================================
// SSH
// ============================================================================

/// sshd settings rendered into a drop-in file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshSettings {
    /// Listen port
    pub port: u16,

    /// Allow root logins
    pub permit_root_login: bool,

    /// Allow password authentication
    pub password_authentication: bool,

    /// Restrict logins to these users (empty: no restriction)
    pub allow_users: Vec<String>,

    /// Maximum authentication attempts per connection
    pub max_auth_tries: u32,

    /// Where the drop-in is written
    pub config_path: String,

    /// Stop the rest of the plan if SSH cannot be configured
    pub critical: bool,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            port: 22,
            permit_root_login: false,
            password_authentication: false,
            allow_users: Vec::new(),
            max_auth_tries: 3,
            config_path: "/etc/ssh/sshd_config.d/10-serverkit.conf".to_string(),
            critical: true,
        }
    }
}

impl SshSettings {
    fn validate(&self, problems: &mut Vec<ValidationError>) {
        if self.port == 0 {
            problems.push(ValidationError::new("ssh.port", "port must be non-zero"));
        }
        if self.max_auth_tries == 0 {
            problems.push(ValidationError::new(
                "ssh.max_auth_tries",
                "must allow at least one attempt",
            ));
        }
        for user in &self.allow_users {
            if !USERNAME_RE.is_match(user) {
                problems.push(ValidationError::new(
                    "ssh.allow_users",
                    format!("'{user}' is not a valid user name"),
                ));
            }
        }
        if !self.config_path.starts_with('/') {
            problems.push(ValidationError::new(
                "ssh.config_path",
                "must be an absolute path",
            ));
        }
    }
}

// ============================================================================
// Packages
// ============================================================================

/// Packages to install with apt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Package names
    pub install: Vec<String>,

    /// Run `apt-get update` before installing
    pub update: bool,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            install: Vec::new(),
            update: true,
        }
    }
}

impl PackageSettings {
    fn validate(&self, problems: &mut Vec<ValidationError>) {
        for package in &self.install {
            if !PACKAGE_RE.is_match(package) {
                problems.push(ValidationError::new(
                    "packages.install",
                    format!("'{package}' is not a valid package name"),
                ));
            }
        }
    }
}

// ============================================================================
// Firewall
// ============================================================================

/// Default policy for a traffic direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Allow,
    Deny,
    Reject,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Allow => write!(f, "allow"),
            Policy::Deny => write!(f, "deny"),
            Policy::Reject => write!(f, "reject"),
        }
    }
}

/// ufw policy and allowed ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FirewallSettings {
    /// Policy for incoming traffic
    pub default_incoming: Policy,

    /// Policy for outgoing traffic
    pub default_outgoing: Policy,

    /// Allowed ports, e.g. "22/tcp", "80", "60000:61000/udp"
    pub allow: Vec<String>,
}

impl Default for FirewallSettings {
    fn default() -> Self {
        Self {
            default_incoming: Policy::Deny,
            default_outgoing: Policy::Allow,
            allow: vec!["22/tcp".to_string()],
        }
    }
}

static PORT_RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<from>\d{1,5})(:(?P<to>\d{1,5}))?(/(?P<proto>tcp|udp))?$")
        .expect("port rule regex is valid")
});

impl FirewallSettings {
    fn validate(&self, problems: &mut Vec<ValidationError>) {
        for rule in &self.allow {
            if let Err(message) = parse_port_rule(rule) {
                problems.push(ValidationError::new("firewall.allow", message));
            }
        }
    }
}

/// A parsed `port[:port][/proto]` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRule {
    pub from: u16,
    pub to: Option<u16>,
    pub proto: Option<String>,
}

impl fmt::Display for PortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.from)?;
        if let Some(to) = self.to {
            write!(f, ":{to}")?;
        }
        if let Some(proto) = &self.proto {
            write!(f, "/{proto}")?;
        }
        Ok(())
    }
}

/// Parse a firewall allow rule
pub fn parse_port_rule(rule: &str) -> std::result::Result<PortRule, String> {
    let caps = PORT_RULE_RE
        .captures(rule.trim())
        .ok_or_else(|| format!("'{rule}' is not a port rule (expected port[:port][/tcp|udp])"))?;

    let port = |name: &str| -> std::result::Result<Option<u16>, String> {
        caps.name(name)
            .map(|m| {
                m.as_str()
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| format!("'{rule}': port {} out of range", m.as_str()))
            })
            .transpose()
    };

    let from = port("from")?.ok_or_else(|| format!("'{rule}': missing port"))?;
    let to = port("to")?;
    if let Some(to) = to {
        if to <= from {
            return Err(format!("'{rule}': range end must be greater than start"));
        }
        if caps.name("proto").is_none() {
            return Err(format!("'{rule}': port ranges need a protocol"));
        }
    }

    Ok(PortRule {
        from,
        to,
        proto: caps.name("proto").map(|m| m.as_str().to_string()),
    })
}

// ============================================================================
// Sysctl
// ============================================================================

/// Kernel parameters written to a sysctl.d drop-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SysctlSettings {
    /// Where the drop-in is written
    pub path: String,

    /// Parameter -> value
    pub settings: BTreeMap<String, String>,
}

impl Default for SysctlSettings {
    fn default() -> Self {
        let settings = [
            ("net.ipv4.conf.all.accept_redirects", "0"),
            ("net.ipv4.conf.all.send_redirects", "0"),
            ("net.ipv4.tcp_syncookies", "1"),
            ("kernel.kptr_restrict", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            path: "/etc/sysctl.d/90-serverkit.conf".to_string(),
            settings,
        }
    }
}

impl SysctlSettings {
    fn validate(&self, problems: &mut Vec<ValidationError>) {
        for (key, value) in &self.settings {
            if !SYSCTL_KEY_RE.is_match(key) {
                problems.push(ValidationError::new(
                    "sysctl.settings",
                    format!("'{key}' is not a sysctl key"),
                ));
            }
            if value.trim().is_empty() || value.contains('\n') {
                problems.push(ValidationError::new(
                    format!("sysctl.settings.{key}"),
                    "value must be a single non-empty line",
                ));
            }
        }
        if !self.path.starts_with('/') {
            problems.push(ValidationError::new("sysctl.path", "must be an absolute path"));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"
hostname = "web-01"

[user]
name = "deploy"
groups = ["sudo"]
authorized_keys = ["ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAA deploy@laptop"]

[ssh]
port = 2222
allow_users = ["deploy"]

[packages]
install = ["curl", "git", "ufw"]

[firewall]
allow = ["2222/tcp", "80/tcp", "443"]

[sysctl.settings]
"net.ipv4.ip_forward" = "0"

[profiles]
web = ["packages", "user", "ssh", "firewall"]
"#;

    #[test]
    fn test_parse_full_config() {
        let settings = Settings::from_toml(FULL).unwrap();
        assert_eq!(settings.hostname.as_deref(), Some("web-01"));

        let user = settings.user.as_ref().unwrap();
        assert_eq!(user.name, "deploy");
        assert_eq!(user.shell, "/bin/bash");
        assert_eq!(user.home_dir(), PathBuf::from("/home/deploy"));

        assert_eq!(settings.ssh.port, 2222);
        assert!(!settings.ssh.password_authentication);
        assert!(settings.ssh.critical);
        assert!(settings.packages.update);
        assert_eq!(settings.firewall.default_incoming, Policy::Deny);
        assert_eq!(settings.sysctl.settings.len(), 1);
        assert_eq!(settings.profiles["web"].len(), 4);
        assert!(settings.problems().is_empty(), "{:?}", settings.problems());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.user.is_none());
        assert_eq!(settings.ssh.port, 22);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Settings::from_toml("[ssh]\nportt = 22\n").unwrap_err();
        assert!(format!("{err:#}").contains("portt"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_shown_config_loads_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let settings = Settings::from_toml(FULL).unwrap();
        std::fs::write(&path, settings.to_toml().unwrap()).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let settings = Settings::from_toml(
            r#"
hostname = "-bad-"

[user]
name = "Deploy"
shell = "bash"

[packages]
install = ["Curl"]

[firewall]
allow = ["http", "70000/tcp"]

[sysctl.settings]
"not a key" = "1"
"#,
        )
        .unwrap();

        let fields: Vec<String> = settings.problems().into_iter().map(|p| p.field).collect();
        assert!(fields.contains(&"hostname".to_string()));
        assert!(fields.contains(&"user.name".to_string()));
        assert!(fields.contains(&"user.shell".to_string()));
        assert!(fields.contains(&"packages.install".to_string()));
        assert_eq!(fields.iter().filter(|f| *f == "firewall.allow").count(), 2);
        assert!(fields.contains(&"sysctl.settings".to_string()));

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.starts_with("Invalid configuration:"));
    }

    #[test]
    fn test_parse_port_rules() {
        assert_eq!(
            parse_port_rule("22/tcp").unwrap(),
            PortRule {
                from: 22,
                to: None,
                proto: Some("tcp".to_string())
            }
        );
        assert_eq!(parse_port_rule("443").unwrap().proto, None);
        assert_eq!(parse_port_rule("60000:61000/udp").unwrap().to, Some(61000));

        assert!(parse_port_rule("0/tcp").is_err());
        assert!(parse_port_rule("65536").is_err());
        assert!(parse_port_rule("1000:900/tcp").is_err());
        assert!(parse_port_rule("1000:2000").is_err());
        assert!(parse_port_rule("22/icmp").is_err());

        assert_eq!(parse_port_rule(" 60000:61000/udp ").unwrap().to_string(), "60000:61000/udp");
    }

    #[test]
    fn test_custom_home_is_expanded() {
        let user = UserSettings {
            name: "ops".to_string(),
            shell: default_shell(),
            groups: Vec::new(),
            authorized_keys: Vec::new(),
            home: Some("/srv/ops".to_string()),
        };
        assert_eq!(user.home_dir(), PathBuf::from("/srv/ops"));
    }
}
