//! User capability - the operator account, its groups and SSH keys
//!
//! Critical: later capabilities (ssh `AllowUsers`, the firewall locking
//! down password logins) assume the account can log in.

use anyhow::{Context, Result};
use converge::Capability;
use std::path::PathBuf;
use std::sync::Arc;

use super::{MANAGED_HEADER, file_matches, set_mode, write_managed};
use crate::config::{Settings, UserSettings};
use crate::runner::CommandRunner;

/// Creates the operator account and installs its authorized keys
#[derive(Debug, Clone)]
pub struct User {
    runner: Arc<dyn CommandRunner>,
}

impl User {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn exists(&self, name: &str) -> Result<bool> {
        self.runner.run_status("id", &["-u", name])
    }

    /// Configured groups the account is not yet a member of
    fn missing_groups(&self, user: &UserSettings) -> Result<Vec<String>> {
        let current = self.runner.run_capture("id", &["-nG", &user.name])?;
        let current: Vec<&str> = current.split_whitespace().collect();
        Ok(user
            .groups
            .iter()
            .filter(|g| !current.contains(&g.as_str()))
            .cloned()
            .collect())
    }

    fn keys_path(user: &UserSettings) -> PathBuf {
        user.home_dir().join(".ssh").join("authorized_keys")
    }

    fn keys_match(user: &UserSettings) -> Result<bool> {
        if user.authorized_keys.is_empty() {
            return Ok(true);
        }
        file_matches("user", &render_keys(user), &Self::keys_path(user))
    }

    fn create(&self, user: &UserSettings) -> Result<()> {
        let home = user.home_dir();
        let home = home.to_string_lossy();
        self.runner.run_checked(
            "useradd",
            &["-m", "-d", &home, "-s", &user.shell, &user.name],
        )?;
        log::info!("Created user {}", user.name);
        Ok(())
    }

    fn install_keys(&self, user: &UserSettings) -> Result<()> {
        let path = Self::keys_path(user);
        let ssh_dir = path
            .parent()
            .context("authorized_keys path has no parent")?
            .to_path_buf();

        write_managed(&path, &render_keys(user), 0o600)?;
        set_mode(&ssh_dir, 0o700)?;

        let owner = format!("{0}:{0}", user.name);
        self.runner
            .run_checked("chown", &["-R", &owner, &ssh_dir.to_string_lossy()])?;
        Ok(())
    }
}

/// The expected authorized_keys file
pub fn render_keys(user: &UserSettings) -> String {
    let mut out = String::from(MANAGED_HEADER);
    out.push('\n');
    for key in &user.authorized_keys {
        out.push_str(key.trim());
        out.push('\n');
    }
    out
}

impl Capability<Settings> for User {
    fn name(&self) -> &str {
        "user"
    }

    fn description(&self) -> String {
        "Create the operator account and install SSH keys".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        let Some(user) = &desired.user else {
            log::debug!("user: none configured");
            return Ok(true);
        };

        if !self.exists(&user.name)? {
            log::debug!("user: {} does not exist", user.name);
            return Ok(false);
        }

        let missing = self.missing_groups(user)?;
        if !missing.is_empty() {
            log::debug!("user: {} missing groups {}", user.name, missing.join(", "));
            return Ok(false);
        }

        Self::keys_match(user)
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let Some(user) = &desired.user else {
            return Ok(());
        };

        if !self.exists(&user.name)? {
            self.create(user)?;
        }

        let missing = self.missing_groups(user)?;
        if !missing.is_empty() {
            self.runner
                .run_checked("usermod", &["-aG", &missing.join(","), &user.name])?;
        }

        if !Self::keys_match(user)? {
            self.install_keys(user)
                .with_context(|| format!("Could not install SSH keys for {}", user.name))?;
        }

        Ok(())
    }

    fn critical(&self, desired: &Settings) -> bool {
        desired.user.is_some()
    }
}
