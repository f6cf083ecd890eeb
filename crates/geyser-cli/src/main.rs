// crates/geyser-cli/src/main.rs
//
// CLI entrypoint for the Geyser staking pool tools.
//
// Provides subcommands for validating a pool configuration, printing the
// bonus curve it describes, and replaying a scenario file through the
// accounting engine.

mod commands;
mod config;
mod output;
mod scenario;

use std::path::Path;

use clap::{Parser, Subcommand};
use commands::curve::CurveCmd;
use commands::simulate::SimulateCmd;
use config::CliConfig;
use output::OutputFormat;

/// Geyser CLI: time-weighted staking pool tools.
#[derive(Parser, Debug)]
#[command(
    name = "geyser",
    version = "0.1.0",
    about = "Geyser staking pool CLI: inspect pool parameters and simulate staking scenarios"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "geyser.toml")]
    config: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate the configuration and print the pool parameters.
    CheckConfig,

    /// Print the reward bonus by held duration.
    Curve(CurveCmd),

    /// Replay a scenario file through the accounting engine.
    Simulate(SimulateCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing file means defaults; a file that exists must parse.
    let config_found = Path::new(&cli.config).exists();
    let config = if config_found {
        CliConfig::load(&cli.config)?
    } else {
        CliConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if config_found {
        tracing::info!("Loaded configuration from {}", cli.config);
    } else {
        tracing::warn!("No config at {}. Using defaults.", cli.config);
    }

    match &cli.command {
        Commands::CheckConfig => commands::check_config::run(&config, &cli.format).await?,
        Commands::Curve(cmd) => commands::curve::run(cmd, &config, &cli.format).await?,
        Commands::Simulate(cmd) => commands::simulate::run(cmd, &config, &cli.format).await?,
    }

    Ok(())
}
