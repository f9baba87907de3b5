//! Portfolio Opportunity Engine CLI.
//!
//! Runs a single planning cycle against a fixture file (securities,
//! positions, portfolio totals, and an optional planner config) and
//! prints the resulting action candidates, without standing up the HTTP
//! server.
//!
//! # Commands
//!
//! - `portfolio_cli plan --fixture <file>` - run one planning cycle

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

pub use error::{CliError, Result};

/// Portfolio Opportunity Engine CLI.
#[derive(Parser)]
#[command(name = "portfolio_cli")]
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
    /// Run one planning cycle against a fixture file and print the
    /// resulting action candidates.
    Plan {
        /// Path to a JSON fixture: securities, positions, portfolio
        /// totals, and an optional `plannerConfig`.
        #[arg(short, long)]
        fixture: PathBuf,

        /// Output format: `table` or `json`.
        #[arg(short = 'o', long, default_value = "table")]
        format: String,

        /// Log each calculator's before/after progress notification.
        #[arg(long)]
        progress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Plan {
            fixture,
            format,
            progress,
        } => commands::plan::run(&fixture, &format, progress),
    }
}
