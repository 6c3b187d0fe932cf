//! Canopy CLI — a thin terminal client over the agent orchestration runtime.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod setup;

/// Canopy — declarative agent orchestration runtime.
#[derive(Parser)]
#[command(name = "canopy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive conversation against a node-tree configuration.
    Run {
        /// Path to the node-tree TOML document.
        #[arg(short, long, default_value = "tree.toml")]
        tree: String,
    },
    /// Load and structurally validate a node-tree document.
    Validate {
        /// Path to the node-tree TOML document.
        #[arg(short, long, default_value = "tree.toml")]
        tree: String,
    },
    /// Configuration introspection.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective layered runtime configuration.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let log_config = canopy_telemetry::LogConfig {
        filter: filter.to_string(),
        ..canopy_telemetry::LogConfig::default()
    };
    if let Err(err) = canopy_telemetry::setup_logging(&log_config) {
        eprintln!("failed to initialize logging: {err}");
    }

    match cli.command {
        Commands::Run { tree } => commands::run::run(&tree).await,
        Commands::Validate { tree } => commands::validate::run(&tree),
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(),
        },
    }
}
