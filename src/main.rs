mod capability;
mod cli;
mod commands;
mod config;
mod paths;
mod profiles;
mod report;
mod runner;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Check(args) => commands::apply::check(&ctx, args),
        Command::Plan(selection) => commands::plan::run(&ctx, &selection),
        Command::List => commands::list::capabilities(&ctx),
        Command::Profiles => commands::list::profiles(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "serverkit", &mut io::stdout());
            Ok(())
        }
    }
}
