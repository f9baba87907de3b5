//! Server configuration management.
//!
//! Handles loading configuration from environment variables, TOML files,
//! and CLI arguments, layered as defaults < file < environment < CLI.

use std::path::PathBuf;
use std::str::FromStr;

use portfolio_engine::PlannerConfig;
use serde::Deserialize;
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port was `0`, which cannot be bound.
    #[error("invalid port number: {0}. must be between 1 and 65535")]
    InvalidPort(u16),

    /// Log level string did not match a known level.
    #[error("invalid log level: {0}. must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Config file could not be read or parsed.
    #[error("configuration file error: {0}")]
    FileError(String),
}

/// Log levels supported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Verbose, developer-facing.
    Debug,
    /// Default operational level.
    #[default]
    Info,
    /// Recoverable anomalies.
    Warn,
    /// Failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Converts to a `tracing_subscriber::EnvFilter` directive string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Top-level server configuration: HTTP bind settings plus the
/// [`PlannerConfig`] applied to every planning run that does not supply its
/// own override in the request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Log level.
    pub log_level: LogLevel,
    /// Shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,
    /// Default planning configuration, used when a recommendations request
    /// omits its own.
    pub default_planner_config: PlannerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            shutdown_timeout_secs: 30,
            default_planner_config: PlannerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("failed to read config file: {e}")))?;
        let config: ServerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::FileError(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `PORTFOLIO_SERVER_HOST`/`PORTFOLIO_SERVER_PORT`/
    /// `PORTFOLIO_LOG_LEVEL` overrides, when set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("PORTFOLIO_SERVER_HOST") {
            self.host = host;
        }
        if let Ok(port_str) = std::env::var("PORTFOLIO_SERVER_PORT") {
            self.port = port_str.parse().map_err(|_| ConfigError::InvalidPort(0))?;
        }
        if let Ok(log_level) = std::env::var("PORTFOLIO_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&log_level)?;
        }
        Ok(())
    }

    /// Merges CLI argument overrides (CLI takes precedence).
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        Ok(())
    }

    /// The socket address string to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CLI argument overrides for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Path to a TOML config file.
    pub config_file: Option<PathBuf>,
    /// Host override.
    pub host: Option<String>,
    /// Port override.
    pub port: Option<u16>,
    /// Log level override.
    pub log_level: Option<String>,
}

/// Builds configuration from all sources, in priority order: CLI > env >
/// file > defaults.
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env()?;
    config.merge_with_cli(cli);
    config.validate()?;
    Ok(config)
}
