//! Server error type — wraps engine/config errors for conversion into HTTP
//! responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body failed to deserialize into a valid planning
    /// context or configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// [`portfolio_engine::context::OpportunityContextBuilder::build`]
    /// rejected the assembled context (an §4.1 invariant violation).
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// A registered calculator failed in a way that is not supposed to be
    /// possible outside the tag-filter-unavailable case (§7); surfaced as
    /// a 500 rather than silently swallowed, since it indicates a bug.
    #[error("engine error: {0}")]
    Engine(#[from] portfolio_engine::EngineError),

    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Machine-readable error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ServerError::InvalidRequest(_) | ServerError::InvalidContext(_) => StatusCode::BAD_REQUEST,
            ServerError::Engine(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: match &self {
                ServerError::InvalidRequest(_) => "invalid_request",
                ServerError::InvalidContext(_) => "invalid_context",
                ServerError::Engine(_) => "engine_error",
                ServerError::Config(_) => "configuration_error",
            }
            .to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
