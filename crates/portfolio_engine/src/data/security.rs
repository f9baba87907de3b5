//! Security reference data.

use portfolio_core::{Currency, Isin, Symbol};
use serde::{Deserialize, Serialize};

/// Static reference data for a tradable security.
///
/// `geography` may hold more than one region as a comma-separated list
/// (e.g. `"US,Europe"` for a dual-listed or globally-diversified issuer);
/// callers that need per-region exposure split the CSV themselves — see
/// the concentration guardrail and the geographic sell-plan allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    /// International Securities Identification Number.
    pub isin: Isin,
    /// Exchange trading symbol.
    pub symbol: Symbol,
    /// Display name.
    pub name: String,
    /// Settlement currency.
    pub currency: Currency,
    /// Comma-separated geography tags, e.g. `"US"` or `"US,Europe"`.
    pub geography: String,
    /// Industry classification.
    pub industry: String,
    /// Minimum tradable increment; every emitted quantity is a multiple of this.
    pub min_lot: i64,
    /// Whether new BUY candidates may be generated for this security.
    pub allow_buy: bool,
    /// Whether SELL candidates may be generated for this security.
    pub allow_sell: bool,
}

impl Security {
    /// Splits [`Self::geography`] into its individual region tags, trimming
    /// whitespace and skipping empty segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use portfolio_core::{Currency, Isin, Symbol};
    /// use portfolio_engine::data::Security;
    ///
    /// let security = Security {
    ///     isin: Isin::new("US1234567890"),
    ///     symbol: Symbol::new("TEST.US"),
    ///     name: "Test Corp".into(),
    ///     currency: Currency::USD,
    ///     geography: "US, Europe".into(),
    ///     industry: "Technology".into(),
    ///     min_lot: 1,
    ///     allow_buy: true,
    ///     allow_sell: true,
    /// };
    /// assert_eq!(security.geographies(), vec!["US", "Europe"]);
    /// ```
    pub fn geographies(&self) -> Vec<&str> {
        self.geography
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
