//! Server startup and binding.
//!
//! Provides functionality to start the Axum server with configurable
//! host/port and graceful shutdown support.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::routes::{self, AppState};

/// Waits for SIGTERM or SIGINT and logs shutdown events.
///
/// On Unix systems, listens for both SIGTERM and SIGINT. On other
/// platforms, only Ctrl+C is observed.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        },
    }

    tracing::info!(timeout_secs = shutdown_timeout.as_secs(), "waiting for in-flight requests to complete");
}

/// Creates a shutdown signal that can be triggered programmatically, for
/// tests that need deterministic shutdown rather than a real signal.
pub fn create_shutdown_channel() -> (impl std::future::Future<Output = ()>, watch::Sender<bool>) {
    let (tx, mut rx) = watch::channel(false);
    let shutdown_future = async move {
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    };
    (shutdown_future, tx)
}

/// A server instance ready to bind and serve.
pub struct Server {
    config: Arc<ServerConfig>,
    router: Router,
}

impl Server {
    /// Builds a server from a loaded configuration, wiring the registry
    /// and router via [`AppState::new`].
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let state = AppState::new(config.clone());
        let router = routes::build_router(state);
        Self { config, router }
    }

    /// The socket address the server will bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        self.config
            .socket_addr()
            .parse()
            .expect("ServerConfig::socket_addr must produce a valid address")
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.config.shutdown_timeout_secs)
    }

    /// Binds and serves, shutting down gracefully on SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr = self.socket_addr();
        let listener = TcpListener::bind(addr).await?;
        let shutdown_timeout = self.shutdown_timeout();

        tracing::info!(address = %addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
            .await?;

        tracing::info!("server shutdown complete");
        Ok(())
    }

    /// Binds and serves on a caller-supplied listener (port 0 for an
    /// ephemeral port in tests) with a caller-supplied shutdown future.
    pub async fn run_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("server shutdown complete");
        Ok(())
    }
}
