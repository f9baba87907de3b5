//! Engine error types.
//!
//! This module provides structured error types for the opportunity
//! identification engine using `thiserror` for derivation. Per the
//! propagation policy, a calculator's `calculate` has exactly one non-nil
//! error surface (an unavailable tag-filter collaborator); every other
//! anomaly is recorded as a [`PreFilteredSecurity`](crate::data::PreFilteredSecurity)
//! instead of an `Err`.

use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The tag filter collaborator failed before a calculator did any work.
    ///
    /// The registry logs this and moves on to the next calculator; the
    /// failing calculator's accumulated (empty) exclusions are still
    /// merged into the result.
    #[error("tag filter call failed before any work was done: calculator={calculator}")]
    TagFilterUnavailable {
        /// Name of the calculator whose tag-filter call failed.
        calculator: String,
    },

    /// `registry.get(name)` was asked for a calculator that was never
    /// registered.
    #[error("unknown calculator: {0}")]
    UnknownCalculator(String),
}
