//! Packages capability - install apt packages

use anyhow::Result;
use converge::Capability;
use std::sync::Arc;

use crate::config::Settings;
use crate::runner::CommandRunner;

/// Installs the configured packages with apt-get
#[derive(Debug, Clone)]
pub struct Packages {
    runner: Arc<dyn CommandRunner>,
}

impl Packages {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Check if a package is installed
    fn is_installed(&self, package: &str) -> Result<bool> {
        // dpkg-query exits non-zero for packages it has never heard of
        let output = self
            .runner
            .run("dpkg-query", &["-W", "-f=${Status}", package])?;
        Ok(output.success && output.stdout_str().trim() == "install ok installed")
    }

    /// Configured packages that are not installed, in configured order
    fn missing(&self, packages: &[String]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for package in packages {
            if !self.is_installed(package)? {
                missing.push(package.clone());
            }
        }
        Ok(missing)
    }
}

impl Capability<Settings> for Packages {
    fn name(&self) -> &str {
        "packages"
    }

    fn description(&self) -> String {
        "Install system packages".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        let missing = self.missing(&desired.packages.install)?;
        if !missing.is_empty() {
            log::debug!("packages: missing {}", missing.join(", "));
        }
        Ok(missing.is_empty())
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let missing = self.missing(&desired.packages.install)?;
        if missing.is_empty() {
            return Ok(());
        }

        if desired.packages.update {
            self.runner.run_checked("apt-get", &["update", "-q"])?;
        }

        let mut args = vec!["install", "-y", "-q", "--no-install-recommends"];
        args.extend(missing.iter().map(String::as_str));
        self.runner.run_checked("apt-get", &args)?;

        log::info!("Installed {}", missing.join(", "));
        Ok(())
    }
}
