//! Capability trait for idempotent provisioning
//!
//! A Capability is one facet of a server (an account, the SSH daemon,
//! the firewall) that can tell whether it is already in the desired
//! state and, if not, bring the system there.

use anyhow::Result;
use std::fmt;

/// Core trait for provisioning capabilities
///
/// `S` is the desired-state type shared by every capability in a registry,
/// usually the parsed configuration. It is passed to both `probe` and
/// `apply` so that probes can render the expected artifact from it.
///
/// # Example
///
/// ```ignore
/// use converge::Capability;
///
/// #[derive(Debug)]
/// struct Motd;
///
/// impl Capability<Settings> for Motd {
///     fn name(&self) -> &str {
///         "motd"
///     }
///
///     fn description(&self) -> String {
///         "Install the login banner".to_string()
///     }
///
///     fn probe(&self, desired: &Settings) -> anyhow::Result<bool> {
///         let observed = std::fs::read_to_string("/etc/motd").ok();
///         Ok(converge::compare::is_satisfied(&desired.motd, observed.as_deref()))
///     }
///
///     fn apply(&self, desired: &Settings) -> anyhow::Result<()> {
///         std::fs::write("/etc/motd", &desired.motd)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Capability<S: ?Sized>: Send + Sync + fmt::Debug {
    /// Stable, unique, non-empty identifier
    ///
    /// This is the key used by profiles, plans and the registry.
    /// Examples: "user", "ssh", "firewall".
    fn name(&self) -> &str;

    /// Human-readable description, for display only
    fn description(&self) -> String;

    /// Check whether the desired state is already in effect
    ///
    /// Returns `true` when nothing needs to be done. An error aborts only
    /// this capability's turn; `apply` is not attempted.
    fn probe(&self, desired: &S) -> Result<bool>;

    /// Bring the system to the desired state
    ///
    /// Only called after `probe` returned `false`, and never in a dry run.
    fn apply(&self, desired: &S) -> Result<()>;

    /// Whether a failure of this capability stops the rest of the plan
    ///
    /// Most capabilities are independent facets of a system and the
    /// engine keeps going past their failures. Override to return `true`
    /// when later capabilities cannot be meaningfully applied without this
    /// one.
    fn critical(&self, _desired: &S) -> bool {
        false
    }
}

/// A boxed capability for type-erased storage
pub type BoxedCapability<S> = Box<dyn Capability<S>>;
