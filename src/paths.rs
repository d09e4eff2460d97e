//! Config file resolution for serverkit
//!
//! # Environment Variables
//!
//! - `SERVERKIT_CONFIG` - Path to the config file
//!
//! # Resolution Priority
//!
//! 1. `--config` flag
//! 2. `SERVERKIT_CONFIG` environment variable
//! 3. `/etc/serverkit/config.toml` (if it exists)
//! 4. `XDG_CONFIG_HOME/serverkit/config.toml` or `~/.config/serverkit/config.toml`
//!
//! A path given by the flag or the environment variable must exist. The
//! system and user locations may be absent, which means defaults.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the config file override
pub const ENV_CONFIG: &str = "SERVERKIT_CONFIG";

/// System-wide config file
pub const SYSTEM_CONFIG: &str = "/etc/serverkit/config.toml";

/// Where the config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Env,
    System,
    User,
}

impl ConfigSource {
    pub fn label(self) -> &'static str {
        match self {
            ConfigSource::Flag => "--config",
            ConfigSource::Env => ENV_CONFIG,
            ConfigSource::System => "system",
            ConfigSource::User => "user",
        }
    }
}

/// Resolve the config file path
pub fn config_file(flag: Option<&Path>) -> Result<(PathBuf, ConfigSource)> {
    resolve(flag, std::env::var(ENV_CONFIG).ok(), Path::new(SYSTEM_CONFIG))
}

fn resolve(
    flag: Option<&Path>,
    env: Option<String>,
    system: &Path,
) -> Result<(PathBuf, ConfigSource)> {
    if let Some(path) = flag {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using config from --config: {}", path.display());
        return Ok((path, ConfigSource::Flag));
    }

    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        let path = expand(&value);
        log::debug!("Using config from {}: {}", ENV_CONFIG, path.display());
        return Ok((path, ConfigSource::Env));
    }

    if system.exists() {
        log::debug!("Using system config: {}", system.display());
        return Ok((system.to_path_buf(), ConfigSource::System));
    }

    let path = user_config_dir()?.join("config.toml");
    log::debug!("Using user config: {}", path.display());
    Ok((path, ConfigSource::User))
}

/// Per-user config directory
///
/// `XDG_CONFIG_HOME/serverkit` when set, `~/.config/serverkit` otherwise.
pub fn user_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Ok(PathBuf::from(xdg_config).join("serverkit"));
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("serverkit"))
}

/// Expand ~ and environment variables in a path string
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
