//! Sysctl capability - kernel parameters via a sysctl.d drop-in

use anyhow::Result;
use converge::Capability;
use std::path::Path;
use std::sync::Arc;

use super::{MANAGED_HEADER, file_matches, write_managed};
use crate::config::{Settings, SysctlSettings};
use crate::runner::CommandRunner;

/// Render the expected drop-in, keys sorted
pub fn render(sysctl: &SysctlSettings) -> String {
    let mut out = String::from(MANAGED_HEADER);
    out.push('\n');
    for (key, value) in &sysctl.settings {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(value.trim());
        out.push('\n');
    }
    out
}

/// Writes kernel parameters and loads them
#[derive(Debug, Clone)]
pub struct Sysctl {
    runner: Arc<dyn CommandRunner>,
}

impl Sysctl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Capability<Settings> for Sysctl {
    fn name(&self) -> &str {
        "sysctl"
    }

    fn description(&self) -> String {
        "Apply kernel parameters".to_string()
    }

    fn probe(&self, desired: &Settings) -> Result<bool> {
        if desired.sysctl.settings.is_empty() {
            return Ok(true);
        }
        file_matches(
            "sysctl",
            &render(&desired.sysctl),
            Path::new(&desired.sysctl.path),
        )
    }

    fn apply(&self, desired: &Settings) -> Result<()> {
        let path = Path::new(&desired.sysctl.path);
        write_managed(path, &render(&desired.sysctl), 0o644)?;
        self.runner.run_checked("sysctl", &["--system"])?;
        Ok(())
    }
}
