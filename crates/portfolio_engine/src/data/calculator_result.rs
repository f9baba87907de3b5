//! The result shape every calculator returns.

use serde::{Deserialize, Serialize};

use super::candidate::ActionCandidate;
use super::prefiltered::PreFilteredSecurity;

/// Everything a single calculator invocation produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    /// Accepted action candidates, in the calculator's own priority order.
    pub candidates: Vec<ActionCandidate>,
    /// Securities the calculator considered and rejected, with reasons.
    pub pre_filtered: Vec<PreFilteredSecurity>,
}

impl CalculatorResult {
    /// An empty result — used by the shared policy gate (§4.11) when
    /// `allow_buy`/`allow_sell` is false and by the early-exit paths that
    /// still want to report why nothing was produced via `pre_filtered`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends `other`'s candidates and pre-filtered entries onto `self`,
    /// used by the registry when multiple calculators share a category.
    pub fn append(&mut self, mut other: CalculatorResult) {
        self.candidates.append(&mut other.candidates);
        self.pre_filtered.append(&mut other.pre_filtered);
    }
}
