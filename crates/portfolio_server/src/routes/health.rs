//! Health check and readiness endpoints for load balancer integration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use super::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `"healthy"`; the process answering the request is by definition up.
    pub status: String,
    /// Crate version, from `CARGO_PKG_VERSION`.
    pub version: String,
    /// Seconds since the process started.
    pub uptime_secs: u64,
    /// Number of calculators currently registered.
    pub registered_calculators: usize,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// Whether the server is ready to accept planning requests.
    pub ready: bool,
}

/// Builds the health and readiness routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

/// `GET /health` — liveness probe.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        registered_calculators: [
            "profit_taking",
            "averaging_down",
            "opportunity_buys",
            "weight_based",
            "rebalance_sells",
            "rebalance_buys",
        ]
        .iter()
        .filter(|name| state.registry.contains(name))
        .count(),
    };
    (StatusCode::OK, Json(response))
}

/// `GET /ready` — readiness probe. Ready as soon as the default calculator
/// set is registered, which happens synchronously at [`AppState::new`].
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.registry.contains("profit_taking");
    (StatusCode::OK, Json(ReadyResponse { ready }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    fn test_state() -> AppState {
        AppState::new(Arc::new(ServerConfig::default()))
    }

    #[tokio::test]
    async fn health_endpoint_returns_200_with_six_calculators() {
        let router = routes().with_state(test_state());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.registered_calculators, 6);
    }

    #[tokio::test]
    async fn ready_endpoint_reports_ready() {
        let router = routes().with_state(test_state());
        let response = router
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let ready: ReadyResponse = serde_json::from_slice(&body).unwrap();
        assert!(ready.ready);
    }
}
