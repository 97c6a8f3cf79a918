use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod config;
mod output;
mod settings;

#[derive(Parser)]
#[command(name = "tripseal")]
#[command(about = "Confidential trip vault: proofs, decryption capabilities, demo flow")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true)]
    json: bool,

    /// Capability store directory
    #[arg(long, global = true, env = "TRIPSEAL_STORE")]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect encrypted-input proofs
    Proof {
        #[command(subcommand)]
        action: commands::proof::ProofCommand,
    },
    /// Manage cached decryption capabilities
    Capability {
        #[command(subcommand)]
        action: commands::capability::CapabilityCommand,
    },
    /// Read trips from a deployed contract over JSON-RPC
    Trips {
        #[command(subcommand)]
        action: commands::trips::TripsCommand,
    },
    /// Submit and read back a trip against the mock engine
    Demo(commands::demo::DemoArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tripseal=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tripseal=info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        store_override: cli.store,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Proof { action } => commands::proof::run(action, &ctx).await,
        Commands::Capability { action } => commands::capability::run(action, &ctx).await,
        Commands::Trips { action } => commands::trips::run(action, &ctx).await,
        Commands::Demo(args) => commands::demo::run(args, &ctx).await,
        Commands::Config { action } => commands::config::run(action, &ctx).await,
    }
}
