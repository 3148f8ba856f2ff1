//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::config::file::CONFIG_ENV;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Liquity trove and TCR monitor
///
/// Watches the protocol's total collateral ratio and a list of troves, and
/// alerts once when a ratio falls below its threshold.
#[derive(Parser, Debug)]
#[command(name = "trovemon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<String>,

    /// State file used to remember fired alerts
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one monitoring pass
    Check(CheckArgs),

    /// Run monitoring passes on an interval
    Watch(WatchArgs),

    /// Show the remembered alert state of every subject
    Status,

    /// Forget the remembered alert state of a subject
    Reset {
        /// `tcr` or a trove address
        subject: String,
    },

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments shared by `check` and `watch`
#[derive(Parser, Debug, Default)]
pub struct CheckArgs {
    /// Chain snapshot JSON to read
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// TCR alert threshold (e.g. 2.0 for 200%)
    #[arg(long)]
    pub tcr_threshold: Option<f64>,

    /// Trove CR alert threshold (e.g. 1.5 for 150%)
    #[arg(long)]
    pub trove_cr_threshold: Option<f64>,
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub check: CheckArgs,

    /// Interval between runs in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Run once and exit (single-use mode)
    #[arg(long)]
    pub single_use: bool,

    /// Stop on the first failed run instead of retrying
    #[arg(long)]
    pub no_retry: bool,

    /// Retry interval in seconds
    #[arg(long)]
    pub retry_interval: Option<u64>,
}

/// Arguments for configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check() {
        let args = Cli::try_parse_from(["trovemon", "check"]).unwrap();
        assert!(matches!(args.command, Commands::Check(_)));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["trovemon", "-v", "status"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_check_overrides() {
        let args = Cli::try_parse_from([
            "trovemon",
            "check",
            "--snapshot",
            "chain.json",
            "--tcr-threshold",
            "1.8",
        ])
        .unwrap();

        if let Commands::Check(check) = args.command {
            assert_eq!(check.snapshot, Some(PathBuf::from("chain.json")));
            assert_eq!(check.tcr_threshold, Some(1.8));
            assert_eq!(check.trove_cr_threshold, None);
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_watch_args() {
        let args = Cli::try_parse_from([
            "trovemon",
            "watch",
            "--interval",
            "30",
            "--single-use",
            "--snapshot",
            "chain.json",
        ])
        .unwrap();

        if let Commands::Watch(watch) = args.command {
            assert_eq!(watch.interval, Some(30));
            assert!(watch.single_use);
            assert!(!watch.no_retry);
            assert!(watch.check.snapshot.is_some());
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_cli_parse_reset() {
        let args = Cli::try_parse_from(["trovemon", "reset", "tcr"]).unwrap();
        assert!(matches!(args.command, Commands::Reset { subject } if subject == "tcr"));
    }

    #[test]
    fn test_cli_parse_config_init() {
        let args =
            Cli::try_parse_from(["trovemon", "config", "init", "--path", "t.toml", "--force"])
                .unwrap();
        if let Commands::Config(config) = args.command {
            assert!(matches!(
                config.command,
                ConfigCommands::Init { force: true, .. }
            ));
        } else {
            panic!("Expected Config command");
        }
    }

    #[test]
    fn test_cli_rejects_non_numeric_threshold() {
        let result = Cli::try_parse_from(["trovemon", "check", "--tcr-threshold", "high"]);
        assert!(result.is_err());
    }
}
