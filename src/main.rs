//! trovemon - Liquity trove and TCR monitor
//!
//! A command-line tool that alerts when the protocol's total collateral ratio
//! or a watched trove's collateral ratio falls below its threshold.

use clap::Parser;
use trovemon::cli::args::{generate_completions, Cli, Commands};
use trovemon::commands::{run_check, run_config, run_reset, run_status, run_watch};
use trovemon::error::{AppError, ConfigError, PriceError, StorageError};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    logger(cli.verbose).init();

    // Run the appropriate command
    let result = run(&cli).await;

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

/// Logger honouring `RUST_LOG`, raised to debug by `--verbose`
fn logger(verbose: bool) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp(None);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
}

async fn run(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config.as_deref();
    let state = cli.state.clone();

    match &cli.command {
        Commands::Check(args) => run_check(args, cli.format, config, state).await,

        Commands::Watch(args) => run_watch(args, cli.format, config, state).await,

        Commands::Status => run_status(cli.format, config, state).await,

        Commands::Reset { subject } => run_reset(subject, cli.format, config, state).await,

        Commands::Config(args) => run_config(args, cli.format, config, state),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::MissingField(field)) if field == "data_source.snapshot_path" => {
            eprintln!();
            eprintln!("Hint: Pass --snapshot <PATH> or set [data_source] snapshot_path");
            eprintln!("      in the configuration file.");
        }
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'trovemon config init' to create a default configuration.");
        }
        AppError::Price(PriceError::NoPriceAvailable) => {
            eprintln!();
            eprintln!("Hint: Check network access to CoinGecko, or enable the price feed");
            eprintln!("      source in [price_sources].");
        }
        AppError::Storage(StorageError::Corrupt { path, .. }) => {
            eprintln!();
            eprintln!("Hint: The state file {} is not valid JSON.", path);
            eprintln!("      Fix or remove it; removing it forgets every active alert.");
        }
        AppError::Delivery(_) => {
            eprintln!();
            eprintln!("Hint: Alerts were recorded and will not be re-sent until they recover.");
            eprintln!("      Use 'trovemon reset <tcr|ADDRESS>' to force a re-send.");
        }
        _ => {}
    }
}
