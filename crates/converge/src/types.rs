//! Core types for capability reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal state of one planned capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    /// Probe reported work needed and apply succeeded
    Applied,
    /// Probe reported the desired state already in effect
    Skipped,
    /// Dry run: probe reported work needed, apply was not called
    WouldApply,
    /// Apply returned an error
    Failed,
    /// Capability not found, or probe returned an error
    Errored,
    /// Not attempted because an earlier critical capability did not succeed
    NotRun,
}

impl CapabilityStatus {
    /// Whether this status counts against the run
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Errored)
    }

    /// Short lowercase label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::WouldApply => "would apply",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::NotRun => "not run",
        }
    }
}

impl fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one planned capability in one run
///
/// `error` is present iff `status` is Failed or Errored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityResult {
    /// Planned capability name
    pub name: String,
    /// Terminal status
    pub status: CapabilityStatus,
    /// Error message with its context chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the capability was not run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Time spent probing and applying
    #[serde(
        default,
        rename = "duration_ms",
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
}

impl CapabilityResult {
    /// Applied successfully
    pub fn applied(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, CapabilityStatus::Applied, None, Some(duration))
    }

    /// Already satisfied
    pub fn skipped(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, CapabilityStatus::Skipped, None, Some(duration))
    }

    /// Dry run found work to do
    pub fn would_apply(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, CapabilityStatus::WouldApply, None, Some(duration))
    }

    /// Apply failed
    pub fn failed(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self::new(
            name,
            CapabilityStatus::Failed,
            Some(error.into()),
            Some(duration),
        )
    }

    /// Lookup or probe failed
    pub fn errored(
        name: impl Into<String>,
        error: impl Into<String>,
        duration: Option<Duration>,
    ) -> Self {
        Self::new(name, CapabilityStatus::Errored, Some(error.into()), duration)
    }

    /// Not attempted
    pub fn not_run(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(name, CapabilityStatus::NotRun, None, None)
        }
    }

    fn new(
        name: impl Into<String>,
        status: CapabilityStatus,
        error: Option<String>,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            error,
            reason: None,
            duration,
        }
    }

    /// Whether this result counts against the run
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Options for a single run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Probe and report, never apply
    pub dry_run: bool,
}

impl ExecuteOptions {
    /// Options for a dry run
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
