//! Portfolio Opportunity Engine Server
//!
//! REST API server exposing `/health`, `/ready` and `POST /recommendations`
//! over the `portfolio_engine` calculator registry.

use std::path::PathBuf;

use clap::Parser;
use portfolio_server::config::{build_config, CliArgs as ConfigCliArgs};
use portfolio_server::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Portfolio Opportunity Engine Server.
#[derive(Parser, Debug)]
#[command(name = "portfolio_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to.
    #[arg(long, env = "PORTFOLIO_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "PORTFOLIO_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "PORTFOLIO_LOG_LEVEL")]
    log_level: Option<String>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    init_tracing(config.log_level.as_filter_str());

    tracing::info!(version = %portfolio_server::VERSION, "portfolio opportunity engine server");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = ?config.log_level,
        "server configuration loaded"
    );

    let server = Server::new(config);
    tracing::info!(address = %server.socket_addr(), "starting server");

    server.run().await?;

    Ok(())
}
