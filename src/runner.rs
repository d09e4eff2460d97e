//! Command execution for capabilities
//!
//! Capabilities never spawn processes directly; they go through a
//! [`CommandRunner`] so probes and applies can be exercised against a
//! scripted runner in tests.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::process::{Command, Output, Stdio};

/// Output from a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Runs external commands on behalf of capabilities
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Run a command to completion and capture its output
    ///
    /// A non-zero exit is not an error here; only failing to start is.
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command and return just success/failure
    fn run_status(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        Ok(self.run(cmd, args)?.success)
    }

    /// Run a command and capture trimmed stdout, failing on non-zero exit
    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = self.run_checked(cmd, args)?;
        Ok(output.stdout_str().trim().to_string())
    }

    /// Run a command, failing with its stderr on non-zero exit
    fn run_checked(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(cmd, args)?;
        if !output.success {
            let stderr = output.stderr_str();
            let detail = stderr.trim();
            if detail.is_empty() {
                bail!("Command failed: {} {}", cmd, args.join(" "));
            }
            bail!("Command failed: {} {}: {}", cmd, args.join(" "), detail);
        }
        Ok(output)
    }
}

/// Runs commands on the local system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("Running: {} {}", cmd, args.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;
        log::trace!("{} exited with success={}", cmd, output.status.success());
        Ok(output.into())
    }
}

/// Check if a command exists on PATH
pub fn command_exists(runner: &dyn CommandRunner, cmd: &str) -> bool {
    runner
        .run("which", &[cmd])
        .map(|output| output.success)
        .unwrap_or(false)
}
