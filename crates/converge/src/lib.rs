//! # Converge
//!
//! An engine for idempotent, ordered provisioning.
//!
//! A server is described as a list of named capabilities (an account, the
//! SSH daemon, the firewall). Each capability can probe whether its desired
//! state is already in effect and, if not, apply it. The engine turns a
//! profile and/or an explicit selection into an ordered plan, walks the plan
//! one capability at a time, and reports what happened to each.
//!
//! ## Core Concepts
//!
//! - **Capability**: a unit of provisioning work with `probe` and `apply`
//! - **Registry**: capabilities by unique name
//! - **ProfileCatalog**: named lists of capability names
//! - **ExecutionPlan**: ordered, de-duplicated, non-empty list of names
//! - **RunResult**: one result per planned name, plus the overall outcome
//!
//! ## Example
//!
//! ```ignore
//! use converge::{Engine, ExecuteOptions, NoProgress};
//!
//! let mut engine: Engine<Settings> = Engine::new();
//! engine.register(Box::new(Hostname::new(runner.clone())));
//! engine.register(Box::new(Packages::new(runner.clone())));
//! engine.register_profile("minimal", ["hostname", "packages"]);
//!
//! let plan = engine.build_plan(Some("minimal"), &[])?;
//! let (result, error) = engine.run(&plan, &settings, ExecuteOptions::dry_run(), &mut NoProgress);
//! for r in &result.results {
//!     println!("{}: {}", r.name, r.status);
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Capabilities execute sequentially, strictly in plan order.
//! - `apply` is never called after a satisfied probe, nor in a dry run.
//! - A failure is recorded and the run continues, unless the capability is
//!   critical, in which case the remaining slots are recorded as not run.
//! - The aggregate error is produced only after the whole plan is walked.

pub mod capability;
pub mod compare;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod planner;
pub mod registry;
pub mod report;
pub mod types;

// Re-export main types at crate root
pub use capability::{BoxedCapability, Capability};
pub use compare::{Comparison, compare, is_satisfied, normalize};
pub use context::{NoProgress, ProgressCallback, RecordingProgress};
pub use engine::Engine;
pub use error::{Error, Result};
pub use executor::{execute, execute_simple};
pub use planner::{ExecutionPlan, ProfileCatalog, build_plan};
pub use registry::Registry;
pub use report::{RunResult, RunSummary, summarize};
pub use types::{CapabilityResult, CapabilityStatus, ExecuteOptions};
