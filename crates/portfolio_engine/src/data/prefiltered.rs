//! Pre-filtered security reporting — structured exclusions.

use portfolio_core::{Isin, Symbol};
use serde::{Deserialize, Serialize};

/// One rejection reason recorded against a security, along with whether the
/// user has already dismissed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionReason {
    /// Short machine-stable reason string, e.g. `"trade value below minimum"`.
    pub reason: String,
    /// Whether the user has dismissed this exact reason for this security
    /// and calculator.
    pub dismissed: bool,
}

/// A security that a calculator considered and rejected, with every
/// distinct reason it was rejected for.
///
/// Reasons are deduplicated per `(isin, reason)` pair by the
/// [`ExclusionCollector`](crate::exclusions::ExclusionCollector) that builds
/// these; a security can still carry several *different* reasons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreFilteredSecurity {
    /// International Securities Identification Number.
    pub isin: Isin,
    /// Exchange trading symbol.
    pub symbol: Symbol,
    /// Display name.
    pub name: String,
    /// Name of the calculator that produced this exclusion.
    pub calculator: String,
    /// Every distinct reason this security was excluded, in first-seen order.
    pub reasons: Vec<ExclusionReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_reasons_in_order() {
        let entry = PreFilteredSecurity {
            isin: Isin::new("US1234567890"),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            calculator: "opportunity_buys".into(),
            reasons: vec![
                ExclusionReason {
                    reason: "below minimum score".into(),
                    dismissed: false,
                },
                ExclusionReason {
                    reason: "trade value below minimum".into(),
                    dismissed: true,
                },
            ],
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["reasons"][0]["reason"], "below minimum score");
        assert_eq!(json["reasons"][1]["dismissed"], true);
    }
}
