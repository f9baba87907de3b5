//! Per-run configuration (§4.12, §6.1) — enabled calculators, per-calculator
//! parameter bags, tag-filtering toggle and the temperament-adjusted
//! [`CalculatorBoosts`] override.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gates::priority::CalculatorBoosts;
use crate::params::ParamBag;

/// Configuration supplied to a single planning run.
///
/// `calculator_boosts` replaces the process-wide `DefaultCalculatorBoosts`
/// constants wholesale when supplied; the field's own `Default` reproduces
/// those constants, so a default-constructed `PlannerConfig` behaves exactly
/// like the hardcoded table did.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Calculator names to run, in registration/execution order. A name with
    /// no matching registered calculator is logged and skipped.
    pub enabled_calculators: Vec<String>,
    /// Per-calculator parameter bag, keyed by calculator name.
    pub calculator_params: HashMap<String, ParamBag>,
    /// Whether tag-based quality-gate and candidate-set filtering is active.
    pub enable_tag_filtering: bool,
    /// The §4.7 tag-boost multiplier table for this run.
    pub calculator_boosts: CalculatorBoosts,
    /// Per-position concentration cap, as a fraction of total portfolio value.
    pub position_cap: f64,
    /// Per-geography concentration cap, as a fraction of total portfolio value.
    pub geo_cap: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled_calculators: Vec::new(),
            calculator_params: HashMap::new(),
            enable_tag_filtering: false,
            calculator_boosts: CalculatorBoosts::default(),
            position_cap: 0.10,
            geo_cap: 0.40,
        }
    }
}

impl PlannerConfig {
    /// Returns the parameter bag registered for `calculator`, or `None` if
    /// none was supplied — calculators fall back to their own defaults in
    /// that case.
    pub fn params_for(&self, calculator: &str) -> ParamBag {
        self.calculator_params
            .get(calculator)
            .cloned()
            .unwrap_or(None)
    }
}
