//! SSH capability - harden sshd through a drop-in file
//!
//! The drop-in is rendered from a template, compared with the file on disk,
//! and only replaced when it differs. A rejected configuration (`sshd -t`)
//! is rolled back to the previous file before the error is returned, so a
//! typo never survives to the next daemon restart.

use anyhow::{Context, Result};
use converge::Capability;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::{MANAGED_HEADER, file_matches, read_observed, write_managed};
use crate::config::{Settings, SshSettings};
use crate::runner::CommandRunner;

const TEMPLATE: &str = r"{{ header }}
Port {{ port }}
PermitRootLogin {{ permit_root_login }}
PasswordAuthentication {{ password_authentication }}
KbdInteractiveAuthentication no
PubkeyAuthentication yes
MaxAuthTries {{ max_auth_tries }}
X11Forwarding no
{% if allow_users %}AllowUsers {{ allow_users | join(sep=' ') }}
{% endif %}";

#[derive(Serialize)]
struct TemplateContext<'a> {
    header: &'a str,
    port: u16,
    permit_root_login: &'static str,
    password_authentication: &'static str,
    max_auth_tries: u32,
    allow_users: &'a [String],
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Render the expected drop-in for these settings
pub fn render(ssh: &SshSettings) -> Result<String> {
    let context = TemplateContext {
        header: MANAGED_HEADER,
        port: ssh.port,
        // key-only root access rather than full lock-out when allowed
        permit_root_login: if ssh.permit_root_login {
            "prohibit-password"
        } else {
            "no"
        },
        password_authentication: yes_no(ssh.password_authentication),
        max_auth_tries: ssh.max_auth_tries,
        allow_users: &ssh.allow_users,
    };
    let context =
        tera::Context::from_serialize(&context).context("Could not build sshd template context")?;
    tera::Tera::one_off(TEMPLATE, &context, false).context("Could not render sshd drop-in")
}

/// Hardens the SSH daemon
#[derive(Debug, Clone)]
pub struct Ssh {
    runner: Arc<dyn CommandRunner>,
}

impl Ssh {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn restore(path: &Path, previous: Option<&str>) -> Result<()> {
        match previous {
            Some(content) => write_managed(path, content, 0o644),
            None => std::fs::remove_file(path)
                .with_context(|| format!("Could not remove {}", path.display())),
        }
    }
}

impl Capability<Settings> for Ssh {
    fn name(&self) -> &str {
        "ssh"
    }

    fn description(&self) -> String {
        "Harden the SSH daemon configuration".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        let expected = render(&desired.ssh)?;
        file_matches("ssh", &expected, Path::new(&desired.ssh.config_path))
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let path = Path::new(&desired.ssh.config_path);
        let expected = render(&desired.ssh)?;
        let previous = read_observed(path)?;

        write_managed(path, &expected, 0o644)?;

        if let Err(e) = self.runner.run_checked("sshd", &["-t"]) {
            Self::restore(path, previous.as_deref())
                .context("sshd rejected the new configuration and restoring the old one failed")?;
            return Err(e.context("sshd rejected the new configuration, previous file restored"));
        }

        self.runner.run_checked("systemctl", &["reload", "ssh"])?;
        log::info!("Reloaded sshd with {}", path.display());
        Ok(())
    }

    fn critical(&self, desired: &Settings) -> bool {
        desired.ssh.critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.ssh.config_path = dir
            .path()
            .join("sshd_config.d")
            .join("10-serverkit.conf")
            .to_string_lossy()
            .to_string();
        settings
    }

    #[test]
    fn test_render_defaults() {
        let rendered = render(&SshSettings::default()).unwrap();
        let lines = converge::normalize(&rendered);

        assert_eq!(
            lines,
            vec![
                "Port 22",
                "PermitRootLogin no",
                "PasswordAuthentication no",
                "KbdInteractiveAuthentication no",
                "PubkeyAuthentication yes",
                "MaxAuthTries 3",
                "X11Forwarding no",
            ]
        );
    }

    #[test]
    fn test_render_allow_users_and_root_keys() {
        let ssh = SshSettings {
            port: 2222,
            permit_root_login: true,
            allow_users: vec!["deploy".to_string(), "ops".to_string()],
            ..SshSettings::default()
        };
        let rendered = render(&ssh).unwrap();

        assert!(rendered.contains("Port 2222\n"));
        assert!(rendered.contains("PermitRootLogin prohibit-password\n"));
        assert!(rendered.contains("AllowUsers deploy ops\n"));
    }

    #[test]
    fn test_apply_writes_validates_and_reloads() {
        let dir = TempDir::new().unwrap();
        let desired = settings(&dir);
        let runner = Arc::new(ScriptedRunner::new());
        let capability = Ssh::new(runner.clone());

        assert!(!capability.probe(&desired).unwrap());
        capability.apply(&desired).unwrap();

        assert_eq!(runner.calls(), vec!["sshd -t", "systemctl reload ssh"]);
        assert!(capability.probe(&desired).unwrap());
    }

    #[test]
    fn test_hand_edited_whitespace_is_still_satisfied() {
        let dir = TempDir::new().unwrap();
        let desired = settings(&dir);
        let path = Path::new(&desired.ssh.config_path);
        let edited = render(&desired.ssh)
            .unwrap()
            .replace("Port 22", "Port    22   # default");
        write_managed(path, &edited, 0o644).unwrap();

        let capability = Ssh::new(Arc::new(ScriptedRunner::new()));
        assert!(capability.probe(&desired).unwrap());
    }

    #[test]
    fn test_rejected_config_restores_previous_file() {
        let dir = TempDir::new().unwrap();
        let desired = settings(&dir);
        let path = Path::new(&desired.ssh.config_path);
        write_managed(path, "Port 22\n", 0o644).unwrap();

        let runner = Arc::new(ScriptedRunner::new().fail("sshd -t", "Bad configuration option"));
        let capability = Ssh::new(runner.clone());

        let err = capability.apply(&desired).unwrap_err();
        assert!(format!("{err:#}").contains("Bad configuration option"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Port 22\n");
        assert!(runner.calls_matching("systemctl").is_empty());
    }

    #[test]
    fn test_rejected_config_removes_new_file() {
        let dir = TempDir::new().unwrap();
        let desired = settings(&dir);

        let runner = Arc::new(ScriptedRunner::new().fail("sshd -t", "Bad configuration option"));
        Ssh::new(runner).apply(&desired).unwrap_err();

        assert!(!Path::new(&desired.ssh.config_path).exists());
    }

    #[test]
    fn test_critical_follows_config() {
        let capability = Ssh::new(Arc::new(ScriptedRunner::new()));
        let mut settings = Settings::default();
        assert!(capability.critical(&settings));

        settings.ssh.critical = false;
        assert!(!capability.critical(&settings));
    }
}
