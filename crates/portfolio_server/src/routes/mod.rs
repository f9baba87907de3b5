//! HTTP route modules and shared application state.

pub mod health;
pub mod recommendations;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use portfolio_engine::CalculatorRegistry;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// State shared across every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Active server configuration, including the default [`portfolio_engine::PlannerConfig`].
    pub config: Arc<ServerConfig>,
    /// The calculator registry, pre-populated with the six default calculators.
    pub registry: Arc<CalculatorRegistry>,
    /// Process start time, used by the `/health` uptime field.
    pub start_time: Instant,
}

impl AppState {
    /// Builds application state from a loaded configuration.
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            registry: Arc::new(CalculatorRegistry::with_default_calculators()),
            start_time: Instant::now(),
        }
    }
}

/// Assembles the full application router from its constituent route modules.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(recommendations::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
