//! # Portfolio Engine (L2: Opportunity Identification)
//!
//! The opportunity identification engine: a registry of pluggable
//! calculators, each producing BUY/SELL action candidates of one category,
//! driven against a shared, immutable [`context::OpportunityContext`] and
//! the quality-gate, concentration, sell-quality, priority-adjustment and
//! geographic sell-plan collaborators every calculator depends on.
//!
//! ## Entry point
//!
//! Build a [`registry::CalculatorRegistry`] (or call
//! [`registry::CalculatorRegistry::with_default_calculators`] for the six
//! §4.11 calculators pre-registered), assemble an
//! [`context::OpportunityContext`] via [`context::OpportunityContextBuilder`],
//! and call [`registry::CalculatorRegistry::identify_opportunities_with_exclusions`]
//! (or the progress-reporting variant) with a [`config::PlannerConfig`].
//!
//! ## Concurrency
//!
//! Per §5, a single planning invocation runs every enabled calculator
//! sequentially on the caller's own thread; no component blocks on I/O.
//! Multiple invocations may run concurrently across threads, sharing only
//! the registry (guarded by a `RwLock`) and the read-only context each
//! invocation builds for itself.

#![warn(missing_docs)]

pub mod calculators;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod exclusions;
pub mod gates;
pub mod params;
pub mod registry;

pub use config::PlannerConfig;
pub use context::{OpportunityContext, OpportunityContextBuilder};
pub use error::EngineError;
pub use registry::{CalculatorRegistry, ProgressUpdate};
