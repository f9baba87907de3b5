//! CLI error type.

use thiserror::Error;

/// Errors surfaced by the CLI's command implementations.
#[derive(Debug, Error)]
pub enum CliError {
    /// A path given on the command line does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The fixture file could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The fixture file was not valid JSON for the expected shape.
    #[error("failed to parse {path} as a planning fixture: {source}")]
    InvalidFixture {
        /// Path that failed to parse.
        path: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// [`portfolio_engine::context::OpportunityContextBuilder::build`]
    /// rejected the fixture's assembled context.
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// An argument value was not one of the accepted choices.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout `commands`.
pub type Result<T> = std::result::Result<T, CliError>;
