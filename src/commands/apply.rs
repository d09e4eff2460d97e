//! `apply` and `check` - walk the plan against the live system

use anyhow::Result;
use converge::{ExecuteOptions, NoProgress, ProgressCallback};

use crate::Context;
use crate::cli::{ApplyArgs, CheckArgs, Selection};
use crate::profiles;
use crate::report::{self, JsonReport, TerminalProgress};

/// How a run should behave and be presented
#[derive(Debug, Clone, Copy, Default)]
struct RunOptions {
    dry_run: bool,
    yes: bool,
    json: bool,
}

impl RunOptions {
    fn needs_confirmation(self) -> bool {
        !(self.dry_run || self.yes || self.json)
    }

    // the prompt is only meaningful next to the plan, so -q does not hide it
    fn prints_plan(self, quiet: bool) -> bool {
        !self.json && (!quiet || self.needs_confirmation())
    }
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    execute(
        ctx,
        &args.selection,
        RunOptions {
            dry_run: args.dry_run,
            yes: args.yes,
            json: args.json,
        },
    )
}

pub fn check(ctx: &Context, args: CheckArgs) -> Result<()> {
    execute(
        ctx,
        &args.selection,
        RunOptions {
            dry_run: true,
            yes: true,
            json: args.json,
        },
    )
}

fn execute(ctx: &Context, selection: &Selection, opts: RunOptions) -> Result<()> {
    let loaded = super::load_valid(ctx)?;
    let runner = super::system_runner();
    let engine = profiles::build_engine(&loaded.settings, &runner);
    let plan = engine.build_plan(selection.profile.as_deref(), &selection.capabilities)?;

    let human = !opts.json && !ctx.quiet;
    if opts.prints_plan(ctx.quiet) {
        super::plan::print_plan(&engine, &plan, selection.profile.as_deref());
    }

    if !opts.dry_run && !is_root() {
        termkit::warn("Not running as root; most capabilities will fail to apply");
    }

    if opts.needs_confirmation() {
        if !console::Term::stderr().is_term() {
            anyhow::bail!("Not a terminal; pass --yes to apply without confirmation");
        }
        if !confirm_proceed(plan.len())? {
            termkit::info("Aborted");
            return Ok(());
        }
    }

    let exec = if opts.dry_run {
        ExecuteOptions::dry_run()
    } else {
        ExecuteOptions::default()
    };

    let mut terminal = TerminalProgress::new();
    let mut silent = NoProgress;
    let progress: &mut dyn ProgressCallback = if human {
        &mut terminal
    } else {
        &mut silent
    };

    let (result, error) = engine.run(&plan, &loaded.settings, exec, progress);

    if opts.json {
        println!("{}", JsonReport::new(plan.names(), &result).to_json()?);
    } else if !ctx.quiet || !result.is_success() {
        report::print_summary(&result);
    }

    match error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Confirm with user
fn confirm_proceed(count: usize) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Apply {}?",
            termkit::pluralize(count, "capability", "capabilities")
        ))
        .default(false)
        .interact()?;

    Ok(confirmed)
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid takes no arguments and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
