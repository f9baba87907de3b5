//! Portfolio position types.

use portfolio_core::{Currency, Isin, Symbol};
use serde::{Deserialize, Serialize};

/// A held position enriched with the embedded security reference data and
/// derived valuation fields.
///
/// Created once at context-assembly time (an external, out-of-scope
/// concern) and never mutated by a calculator; the [`OpportunityContext`](crate::context::OpportunityContext)
/// owns the authoritative list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPosition {
    /// International Securities Identification Number.
    pub isin: Isin,
    /// Exchange trading symbol.
    pub symbol: Symbol,
    /// Display name.
    pub name: String,
    /// Held quantity (non-negative).
    pub quantity: f64,
    /// Average cost per unit in the position's currency.
    pub average_cost: f64,
    /// Current market price per unit.
    pub current_price: f64,
    /// Market value of the position expressed in EUR.
    pub market_value_eur: f64,
    /// Weight of this position within the total portfolio.
    pub weight_in_portfolio: f64,
    /// Settlement currency.
    pub currency: Currency,
    /// Comma-separated geography tags.
    pub geography: String,
    /// Industry classification.
    pub industry: String,
    /// Minimum tradable increment.
    pub min_lot: i64,
    /// Whether new BUY candidates may be generated for this security.
    pub allow_buy: bool,
    /// Whether SELL candidates may be generated for this security.
    pub allow_sell: bool,
}

impl EnrichedPosition {
    /// Unrealized gain as a fraction of cost: `(current_price - average_cost)
    /// / average_cost`. Returns `0.0` when `average_cost` is not positive
    /// (an invalid-input condition calculators treat as "no signal" rather
    /// than dividing by zero).
    pub fn gain_fraction(&self) -> f64 {
        if self.average_cost <= 0.0 {
            return 0.0;
        }
        (self.current_price - self.average_cost) / self.average_cost
    }

    /// Splits [`Self::geography`] into individual region tags.
    pub fn geographies(&self) -> Vec<&str> {
        self.geography
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Market value computed from quantity × current price, used as a
    /// fallback when `market_value_eur` has not been populated by the
    /// upstream valuation step.
    pub fn quantity_value(&self) -> f64 {
        self.quantity * self.current_price
    }
}
