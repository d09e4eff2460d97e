use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Validate => validate(ctx),
        ConfigCommand::Path => path(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;

    if !ctx.quiet {
        termkit::header("Configuration");
        termkit::kv("File", &loaded.path.display().to_string());
        termkit::kv("Source", loaded.source.label());
        if !loaded.path.exists() {
            termkit::dim("File does not exist; showing defaults.");
        }
        println!();
    }

    print!("{}", loaded.settings.to_toml()?);
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;
    let problems = loaded.settings.problems();

    if problems.is_empty() {
        termkit::success(&format!("{} is valid", loaded.path.display()));
        return Ok(());
    }

    for problem in &problems {
        termkit::error(&problem.to_string());
    }
    anyhow::bail!(
        "{} in {}",
        termkit::pluralize(problems.len(), "problem", "problems"),
        loaded.path.display()
    )
}

fn path(ctx: &Context) -> Result<()> {
    let loaded = super::load(ctx)?;
    println!("{}", loaded.path.display());
    Ok(())
}
