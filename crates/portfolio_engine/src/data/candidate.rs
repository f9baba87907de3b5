//! Action candidates — the engine's primary output.

use portfolio_core::{Currency, Isin, Symbol};
use serde::{Deserialize, Serialize};

use super::category::Category;

/// Trade direction for an [`ActionCandidate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Acquire shares.
    Buy,
    /// Dispose of shares.
    Sell,
}

/// A concrete, ranked trade recommendation.
///
/// `quantity` is always a positive integer and a multiple of the
/// security's `min_lot`; `priority` is an unbounded real value, typically
/// no larger than about 2, used only to rank candidates within and across
/// calculators — never to gate whether a candidate is emitted.
///
/// # Examples
///
/// ```
/// use portfolio_core::{Currency, Isin, Symbol};
/// use portfolio_engine::data::{ActionCandidate, Category, Side};
///
/// let candidate = ActionCandidate {
///     side: Side::Buy,
///     isin: Isin::new("US1234567890"),
///     symbol: Symbol::new("TEST.US"),
///     name: "Test Corp".into(),
///     quantity: 88,
///     price: 15.0,
///     value_eur: 1320.0,
///     currency: Currency::USD,
///     priority: 0.40,
///     reason: "averaging down a 25% loss".into(),
///     tags: vec!["quality-gate-pass".into()],
///     category: Category::AveragingDown,
/// };
/// assert_eq!(candidate.quantity % 1, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCandidate {
    /// BUY or SELL.
    pub side: Side,
    /// International Securities Identification Number.
    pub isin: Isin,
    /// Exchange trading symbol.
    pub symbol: Symbol,
    /// Display name.
    pub name: String,
    /// Quantity to trade; a positive multiple of `min_lot`.
    pub quantity: i64,
    /// Price per unit used to size the candidate.
    pub price: f64,
    /// Total value in EUR (BUY: cost including fees; SELL: proceeds net of fees).
    pub value_eur: f64,
    /// Settlement currency.
    pub currency: Currency,
    /// Ranking score; unbounded, typically <= ~2.
    pub priority: f64,
    /// Human-readable explanation for the recommendation.
    pub reason: String,
    /// Free-form tags describing why this candidate was produced.
    pub tags: Vec<String>,
    /// The calculator category that produced this candidate.
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_camel_case_json() {
        let candidate = ActionCandidate {
            side: Side::Sell,
            isin: Isin::new("US1234567890"),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            quantity: 280,
            price: 15.0,
            value_eur: 4200.0,
            currency: Currency::USD,
            priority: 0.5,
            reason: "profit taking on a windfall gain".into(),
            tags: vec![],
            category: Category::ProfitTaking,
        };
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["valueEur"], 4200.0);
        assert_eq!(json["side"], "SELL");
    }
}
