//! Concrete capabilities for a single Linux server
//!
//! Each capability reads its desired state from [`Settings`] and talks to
//! the system through a shared [`CommandRunner`]. File-backed capabilities
//! (ssh, sysctl, the user's authorized_keys) render the expected file and
//! use [`converge::compare`] against what is on disk.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::runner::CommandRunner;

pub mod firewall;
pub mod hostname;
pub mod packages;
pub mod sshd;
pub mod sysctl;
pub mod user;

pub use firewall::Firewall;
pub use hostname::Hostname;
pub use packages::Packages;
pub use sshd::Ssh;
pub use sysctl::Sysctl;
pub use user::User;

/// Header written at the top of every managed file
pub const MANAGED_HEADER: &str = "# Managed by serverkit. Local changes will be overwritten.";

/// Every capability, in the order they are listed in `full`
pub fn all(runner: &Arc<dyn CommandRunner>) -> Vec<converge::BoxedCapability<Settings>> {
    vec![
        Box::new(Hostname::new(Arc::clone(runner))),
        Box::new(Packages::new(Arc::clone(runner))),
        Box::new(User::new(Arc::clone(runner))),
        Box::new(Ssh::new(Arc::clone(runner))),
        Box::new(Firewall::new(Arc::clone(runner))),
        Box::new(Sysctl::new(Arc::clone(runner))),
    ]
}

/// Read a managed file, `None` if it does not exist
pub(crate) fn read_observed(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Could not read {}", path.display())),
    }
}

/// Write a managed file with the given permission bits
pub(crate) fn write_managed(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;
    set_mode(path, mode)?;
    log::debug!("Wrote {} ({:o})", path.display(), mode);
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Could not set permissions on {}", path.display()))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Compare a rendered file against the one on disk, logging any drift
pub(crate) fn file_matches(name: &str, expected: &str, path: &Path) -> Result<bool> {
    let observed = read_observed(path)?;
    match converge::compare(expected, observed.as_deref()) {
        converge::Comparison::Satisfied => Ok(true),
        converge::Comparison::Missing => {
            log::debug!("{}: {} does not exist", name, path.display());
            Ok(false)
        }
        converge::Comparison::Drifted { diff } => {
            log::debug!("{}: {} differs:\n{}", name, path.display(), diff);
            Ok(false)
        }
    }
}
