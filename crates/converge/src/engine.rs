//! Engine facade - registry, profiles, planning and execution in one place

use crate::capability::BoxedCapability;
use crate::context::ProgressCallback;
use crate::error::{Error, Result};
use crate::executor;
use crate::planner::{self, ExecutionPlan, ProfileCatalog};
use crate::registry::Registry;
use crate::report::RunResult;
use crate::types::ExecuteOptions;

/// The capabilities and profiles a process can run
///
/// Build it once at startup with [`Engine::register`] and
/// [`Engine::register_profile`], then plan and execute any number of runs
/// against it. Runs borrow the engine immutably.
pub struct Engine<S> {
    registry: Registry<S>,
    profiles: ProfileCatalog,
}

impl<S> Engine<S> {
    /// Create an engine with no capabilities or profiles
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            profiles: ProfileCatalog::new(),
        }
    }

    /// Register a capability; returns the capability it replaced, if any
    pub fn register(&mut self, capability: BoxedCapability<S>) -> Option<BoxedCapability<S>> {
        self.registry.register(capability)
    }

    /// Register a profile; returns the member list it replaced, if any
    pub fn register_profile<I, N>(&mut self, name: impl Into<String>, members: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.profiles.insert(name, members)
    }

    /// Resolve a profile and explicit names into a plan
    pub fn build_plan(&self, profile: Option<&str>, explicit: &[String]) -> Result<ExecutionPlan> {
        planner::build_plan(&self.profiles, profile, explicit)
    }

    /// Execute a plan, reporting progress
    pub fn execute<P>(
        &self,
        plan: &ExecutionPlan,
        desired: &S,
        opts: ExecuteOptions,
        progress: &mut P,
    ) -> RunResult
    where
        P: ProgressCallback + ?Sized,
    {
        executor::execute(&self.registry, plan, desired, opts, progress)
    }

    /// Execute a plan and return the aggregate error alongside the results
    ///
    /// The error is present iff at least one capability ended Failed or
    /// Errored.
    pub fn run<P>(
        &self,
        plan: &ExecutionPlan,
        desired: &S,
        opts: ExecuteOptions,
        progress: &mut P,
    ) -> (RunResult, Option<Error>)
    where
        P: ProgressCallback + ?Sized,
    {
        let result = self.execute(plan, desired, opts, progress);
        let error = result.error();
        (result, error)
    }

    /// Registered capability names, sorted
    pub fn list_capabilities(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Profile names, sorted
    pub fn list_profiles(&self) -> Vec<String> {
        self.profiles.names()
    }

    /// The capability registry
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// The profile catalog
    pub fn profiles(&self) -> &ProfileCatalog {
        &self.profiles
    }
}

impl<S> Default for Engine<S> {
    fn default() -> Self {
        Self::new()
    }
}
