//! Hostname capability - set the static hostname

use anyhow::Result;
use converge::Capability;
use std::sync::Arc;

use crate::config::Settings;
use crate::runner::CommandRunner;

/// Sets the static hostname with hostnamectl
#[derive(Debug, Clone)]
pub struct Hostname {
    runner: Arc<dyn CommandRunner>,
}

impl Hostname {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn current(&self) -> Result<String> {
        self.runner.run_capture("hostname", &[])
    }
}

impl Capability<Settings> for Hostname {
    fn name(&self) -> &str {
        "hostname"
    }

    fn description(&self) -> String {
        "Set the static hostname".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        let Some(wanted) = &desired.hostname else {
            log::debug!("hostname: none configured");
            return Ok(true);
        };
        let current = self.current()?;
        log::debug!("hostname: current '{current}', wanted '{wanted}'");
        Ok(current == *wanted)
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let Some(wanted) = &desired.hostname else {
            return Ok(());
        };
        self.runner
            .run_checked("hostnamectl", &["set-hostname", wanted])?;
        Ok(())
    }
}
