//! `plan` - show what a selection resolves to without probing anything

use anyhow::Result;
use colored::Colorize;
use converge::{Engine, ExecutionPlan};

use crate::Context;
use crate::cli::Selection;
use crate::config::Settings;
use crate::profiles;

pub fn run(ctx: &Context, selection: &Selection) -> Result<()> {
    let loaded = super::load(ctx)?;
    let runner = super::system_runner();
    let engine = profiles::build_engine(&loaded.settings, &runner);
    let plan = engine.build_plan(selection.profile.as_deref(), &selection.capabilities)?;

    if ctx.quiet {
        for name in &plan {
            println!("{name}");
        }
        return Ok(());
    }

    print_plan(&engine, &plan, selection.profile.as_deref());
    Ok(())
}

/// Print the numbered plan with each capability's description
pub fn print_plan(engine: &Engine<Settings>, plan: &ExecutionPlan, profile: Option<&str>) {
    termkit::header("Plan");
    if let Some(profile) = profile {
        termkit::kv("Profile", profile);
    }
    println!();

    for (i, line) in plan_lines(engine, plan).iter().enumerate() {
        termkit::step(i + 1, plan.len(), line);
    }
    println!();
}

fn plan_lines(engine: &Engine<Settings>, plan: &ExecutionPlan) -> Vec<String> {
    plan.names()
        .iter()
        .map(|name| match engine.registry().get(name) {
            Some(capability) => format!("{} {}", name, capability.description().dimmed()),
            None => format!("{} {}", name, "(unknown capability)".red()),
        })
        .collect()
}
