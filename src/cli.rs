use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "serverkit")]
#[command(version)]
#[command(about = "Idempotent provisioning for a single Linux server", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $SERVERKIT_CONFIG, /etc/serverkit/config.toml, ~/.config/serverkit/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring the server to the configured state
    Apply(ApplyArgs),

    /// Report what apply would change, without changing anything
    Check(CheckArgs),

    /// Print the resolved execution plan
    Plan(Selection),

    /// List available capabilities
    List,

    /// List profiles and their capabilities
    Profiles,

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which capabilities to run
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Capabilities to run, after the profile's
    #[arg(value_name = "CAPABILITY")]
    pub capabilities: Vec<String>,

    /// Profile to start from
    #[arg(short, long)]
    pub profile: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Probe only; never apply
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Validate the configuration file
    Validate,

    /// Print the config file path in use
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_parses_profile_and_names() {
        let cli = Cli::parse_from([
            "serverkit", "-vv", "apply", "-p", "hardened", "hostname", "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.selection.profile.as_deref(), Some("hardened"));
        assert_eq!(args.selection.capabilities, vec!["hostname"]);
        assert!(args.dry_run);
        assert!(!args.yes);
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["serverkit", "check", "--config", "/tmp/sk.toml", "--json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sk.toml")));
        assert!(matches!(cli.command, Command::Check(CheckArgs { json: true, .. })));
    }
}
