pub mod apply;
pub mod config;
pub mod list;
pub mod plan;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::Context;
use crate::config::Settings;
use crate::paths::{self, ConfigSource};
use crate::runner::{CommandRunner, SystemRunner};

/// Settings plus where they came from
pub struct Loaded {
    pub settings: Settings,
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Resolve and load the configuration without validating it
pub fn load(ctx: &Context) -> Result<Loaded> {
    let (path, source) = paths::config_file(ctx.config.as_deref())?;
    load_from(path, source)
}

// A path named by --config or SERVERKIT_CONFIG must exist; only the
// implicit locations fall back to defaults.
fn load_from(path: PathBuf, source: ConfigSource) -> Result<Loaded> {
    if matches!(source, ConfigSource::Flag | ConfigSource::Env) && !path.exists() {
        anyhow::bail!(
            "Config file not found: {} (from {})",
            path.display(),
            source.label()
        );
    }
    let settings = Settings::load(&path)?;
    Ok(Loaded {
        settings,
        path,
        source,
    })
}

/// Load the configuration and refuse to continue if it is invalid
pub fn load_valid(ctx: &Context) -> Result<Loaded> {
    let loaded = load(ctx)?;
    loaded
        .settings
        .validate()
        .with_context(|| format!("in {}", loaded.path.display()))?;
    Ok(loaded)
}

/// The runner used for real system commands
pub fn system_runner() -> Arc<dyn CommandRunner> {
    Arc::new(SystemRunner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx(config: PathBuf) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: Some(config),
        }
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load(&ctx(tmp.path().join("absent.toml"))).err().unwrap();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_env_missing_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_from(tmp.path().join("typo.toml"), ConfigSource::Env)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Config file not found"));
        assert!(err.to_string().contains(paths::ENV_CONFIG));
    }

    #[test]
    fn test_implicit_missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_from(tmp.path().join("config.toml"), ConfigSource::User).unwrap();
        assert_eq!(loaded.source, ConfigSource::User);
        assert_eq!(loaded.settings.hostname, None);
    }

    #[test]
    fn test_load_valid_rejects_bad_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "hostname = \"-nope-\"\n").unwrap();

        assert!(load(&ctx(path.clone())).is_ok());
        let err = load_valid(&ctx(path)).err().unwrap();
        assert!(format!("{err:#}").contains("hostname"));
    }

    #[test]
    fn test_load_reports_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "hostname = \"web-01\"\n").unwrap();

        let loaded = load_valid(&ctx(path.clone())).unwrap();
        assert_eq!(loaded.source, ConfigSource::Flag);
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.settings.hostname.as_deref(), Some("web-01"));
    }
}
