//! Error types for the converge crate

use thiserror::Error;

/// Errors produced by planning and by the aggregate run check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested profile is not in the catalog
    #[error("profile '{name}' not found (available: {})", format_available(.available))]
    ProfileNotFound {
        name: String,
        available: Vec<String>,
    },

    /// Neither the profile nor the explicit selection named any capability
    #[error("execution plan is empty: select a profile or at least one capability")]
    EmptyPlan,

    /// A planned name has no registered capability
    #[error("capability '{0}' not found")]
    CapabilityNotFound(String),

    /// One or more capabilities ended Failed or Errored
    #[error("{failed} {} failed out of {total}", plural(.failed))]
    RunFailed { failed: usize, total: usize },
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 { "capability" } else { "capabilities" }
}

/// Result type for converge operations
pub type Result<T> = std::result::Result<T, Error>;
