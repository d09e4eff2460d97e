use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::profiles;

pub fn capabilities(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;
    let runner = super::system_runner();
    let engine = profiles::build_engine(&loaded.settings, &runner);

    if ctx.quiet {
        for name in engine.list_capabilities() {
            println!("{name}");
        }
        return Ok(());
    }

    termkit::header("Capabilities");
    let width = engine
        .registry()
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, capability) in engine.registry().iter() {
        let critical = if capability.critical(&loaded.settings) {
            " (critical)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}  {}{}",
            format!("{name:<width$}").bold(),
            capability.description().dimmed(),
            critical
        );
    }
    Ok(())
}

pub fn profiles(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;
    let runner = super::system_runner();
    let engine = profiles::build_engine(&loaded.settings, &runner);

    if ctx.quiet {
        for name in engine.list_profiles() {
            println!("{name}");
        }
        return Ok(());
    }

    termkit::header("Profiles");
    for (name, members) in engine.profiles().iter() {
        let origin = if loaded.settings.profiles.contains_key(name) {
            " (config)".dimmed().to_string()
        } else {
            String::new()
        };
        termkit::section(&format!("{name}{origin}"));
        termkit::dim(&members.join(" → "));
    }
    Ok(())
}
