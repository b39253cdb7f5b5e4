// crates/syndicate-cli/src/main.rs
//
// CLI entrypoint for the Syndicate ledger.
//
// Deploys an in-memory ledger from a TOML configuration, prints the emission
// schedule, and replays scenario scripts against a fresh deployment.

mod commands;
mod config;
mod output;
mod scenario;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{expand_tilde, DeploymentConfig};
use output::OutputFormat;

/// Syndicate CLI: role-gated token, time-weighted staking, escrow swap.
#[derive(Parser, Debug)]
#[command(
    name = "syndicate",
    version = "0.1.0",
    about = "Syndicate CLI: deploy the token and staking ledger and replay scenarios"
)]
struct Cli {
    /// Path to the deployment configuration file.
    #[arg(long, global = true, default_value = "~/.syndicate/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Deploy tokens, factory, core pool and swap escrow; print addresses and roles.
    Deploy {
        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Print the decaying emission schedule.
    Schedule {
        /// Number of update periods to show.
        #[arg(long, default_value_t = 12)]
        periods: u64,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Replay a TOML scenario against a fresh deployment.
    Simulate {
        /// Scenario file with `[[steps]]`.
        #[arg(long)]
        scenario: String,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config);
    let (config, load_warning) = DeploymentConfig::load_or_default(&config_path);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match load_warning {
        Some(warning) => tracing::warn!("{}", warning),
        None => tracing::debug!("Loaded config from {}", config_path),
    }

    match &cli.command {
        Commands::Deploy { json } => {
            commands::deploy::run(&config, OutputFormat::from_json_flag(*json))?
        }
        Commands::Schedule { periods, json } => {
            commands::schedule::run(&config, *periods, OutputFormat::from_json_flag(*json))?
        }
        Commands::Simulate { scenario, json } => commands::simulate::run(
            &config,
            &expand_tilde(scenario),
            OutputFormat::from_json_flag(*json),
        )?,
    }

    Ok(())
}
