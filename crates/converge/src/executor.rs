//! Reconciliation loop - probes and applies planned capabilities in order
//!
//! Each planned name walks a small state machine:
//!
//! ```text
//! Pending ─┬─ not registered ───────────────────────────► Errored
//!          └► Probing ─┬─ error ────────────────────────► Errored
//!                      ├─ satisfied ────────────────────► Skipped
//!                      └► NeedsWork ─┬─ dry run ────────► WouldApply
//!                                    └► Applying ─┬─ ok ► Applied
//!                                                 └─ err► Failed
//! ```
//!
//! Capabilities run one at a time, in plan order. A failure is recorded and
//! the loop moves on, unless the failing capability is critical, in which
//! case every remaining slot is recorded as `NotRun`.

use crate::capability::Capability;
use crate::context::{NoProgress, ProgressCallback};
use crate::error::Error;
use crate::planner::ExecutionPlan;
use crate::registry::Registry;
use crate::report::{RunResult, summarize};
use crate::types::{CapabilityResult, ExecuteOptions};
use std::time::Instant;

/// Where a planned capability is in its turn
enum Phase<'r, S> {
    Pending,
    Probing(&'r dyn Capability<S>),
    NeedsWork(&'r dyn Capability<S>),
    Applying(&'r dyn Capability<S>),
    Done(CapabilityResult),
}

impl<S> Phase<'_, S> {
    fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Probing(_) => "probing",
            Self::NeedsWork(_) => "needs-work",
            Self::Applying(_) => "applying",
            Self::Done(result) => result.status.label(),
        }
    }
}

/// Execute a plan against a registry
///
/// # Arguments
/// * `registry` - Capabilities available to this run
/// * `plan` - Names to reconcile, in order
/// * `desired` - Desired state handed to every probe and apply
/// * `opts` - Run options (dry run)
/// * `progress` - Progress callback
///
/// # Returns
/// One result per planned name, in plan order. Use [`RunResult::check`] to
/// turn failures into the aggregate error.
pub fn execute<S, P>(
    registry: &Registry<S>,
    plan: &ExecutionPlan,
    desired: &S,
    opts: ExecuteOptions,
    progress: &mut P,
) -> RunResult
where
    P: ProgressCallback + ?Sized,
{
    let total = plan.len();
    log::info!(
        "Reconciling {} capabilities{}",
        total,
        if opts.dry_run { " (dry run)" } else { "" }
    );
    progress.on_run_start(total, opts.dry_run);

    let mut results = Vec::with_capacity(total);
    let mut halted_by: Option<String> = None;

    for (index, name) in plan.names().iter().enumerate() {
        let capability = registry.get(name);
        let description = capability.map(|c| c.description()).unwrap_or_default();
        progress.on_capability_start(index, total, name, &description);

        let result = match &halted_by {
            Some(critical) => CapabilityResult::not_run(
                name.as_str(),
                format!("critical capability '{}' did not succeed", critical),
            ),
            None => reconcile(registry, name, desired, opts),
        };

        if halted_by.is_none()
            && result.is_failure()
            && capability.is_some_and(|c| c.critical(desired))
        {
            log::warn!(
                "Critical capability '{}' {}; remaining capabilities will not run",
                name,
                result.status
            );
            halted_by = Some(name.clone());
        }

        progress.on_capability_complete(&result);
        results.push(result);
    }

    let run = summarize(results, opts.dry_run);
    progress.on_run_complete(&run.summary());
    run
}

/// Execute a plan without progress reporting
pub fn execute_simple<S>(
    registry: &Registry<S>,
    plan: &ExecutionPlan,
    desired: &S,
    opts: ExecuteOptions,
) -> RunResult {
    execute(registry, plan, desired, opts, &mut NoProgress)
}

/// Drive one planned name from `Pending` to a terminal result
fn reconcile<S>(
    registry: &Registry<S>,
    name: &str,
    desired: &S,
    opts: ExecuteOptions,
) -> CapabilityResult {
    let started = Instant::now();
    let mut phase: Phase<'_, S> = Phase::Pending;

    loop {
        let from = phase.label();
        let next = match phase {
            Phase::Pending => match registry.get(name) {
                Some(capability) => Phase::Probing(capability),
                None => Phase::Done(CapabilityResult::errored(
                    name,
                    Error::CapabilityNotFound(name.to_string()).to_string(),
                    None,
                )),
            },
            Phase::Probing(capability) => match capability.probe(desired) {
                Ok(true) => Phase::Done(CapabilityResult::skipped(name, started.elapsed())),
                Ok(false) => Phase::NeedsWork(capability),
                Err(e) => Phase::Done(CapabilityResult::errored(
                    name,
                    format!("probe failed: {e:#}"),
                    Some(started.elapsed()),
                )),
            },
            Phase::NeedsWork(capability) => {
                if opts.dry_run {
                    Phase::Done(CapabilityResult::would_apply(name, started.elapsed()))
                } else {
                    Phase::Applying(capability)
                }
            }
            Phase::Applying(capability) => match capability.apply(desired) {
                Ok(()) => Phase::Done(CapabilityResult::applied(name, started.elapsed())),
                Err(e) => Phase::Done(CapabilityResult::failed(
                    name,
                    format!("{e:#}"),
                    started.elapsed(),
                )),
            },
            Phase::Done(result) => {
                log::debug!("{}: {}", name, result.status);
                return result;
            }
        };

        log::trace!("{}: {} -> {}", name, from, next.label());
        phase = next;
    }
}
