//! Thin REST surface over the opportunity identification engine.
//!
//! Exposes `/health`, `/ready` and `POST /recommendations`; everything
//! that actually identifies opportunities lives in `portfolio_engine`.
//! This crate only does HTTP plumbing: request/response shapes,
//! configuration layering, and graceful startup/shutdown.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use routes::AppState;

/// Server crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
