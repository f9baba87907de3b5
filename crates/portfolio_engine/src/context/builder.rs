//! Builder for constructing a validated [`OpportunityContext`].

use std::collections::HashMap;

use portfolio_core::Isin;

use crate::data::{EnrichedPosition, Security};
use crate::error::EngineError;

use super::{
    Allocation, CoolingOff, OpportunityContext, Policy, Portfolio, Signals, TagFilter, UserOverrides, Universe,
};

/// Builder for [`OpportunityContext`], validating the §4.1 invariants once
/// at `build()` instead of trusting every call site.
///
/// # Examples
///
/// ```
/// use portfolio_core::{Currency, Isin, Symbol};
/// use portfolio_engine::context::OpportunityContextBuilder;
/// use portfolio_engine::data::{EnrichedPosition, Security};
///
/// let security = Security {
///     isin: Isin::new("US1234567890"),
///     symbol: Symbol::new("TEST.US"),
///     name: "Test Corp".into(),
///     currency: Currency::USD,
///     geography: "US".into(),
///     industry: "Technology".into(),
///     min_lot: 1,
///     allow_buy: true,
///     allow_sell: true,
/// };
/// let position = EnrichedPosition {
///     isin: Isin::new("US1234567890"),
///     symbol: Symbol::new("TEST.US"),
///     name: "Test Corp".into(),
///     quantity: 888.0,
///     average_cost: 20.0,
///     current_price: 15.0,
///     market_value_eur: 13320.0,
///     weight_in_portfolio: 0.05,
///     currency: Currency::USD,
///     geography: "US".into(),
///     industry: "Technology".into(),
///     min_lot: 1,
///     allow_buy: true,
///     allow_sell: true,
/// };
///
/// let ctx = OpportunityContextBuilder::new()
///     .total_portfolio_value_eur(100_000.0)
///     .available_cash_eur(5_000.0)
///     .add_security(security)
///     .add_position(position)
///     .build()
///     .unwrap();
/// assert_eq!(ctx.portfolio.enriched_positions.len(), 1);
/// ```
#[derive(Default)]
pub struct OpportunityContextBuilder {
    positions: Vec<EnrichedPosition>,
    securities: Vec<Security>,
    total_portfolio_value_eur: f64,
    available_cash_eur: f64,
    signals: Signals,
    allocation: Allocation,
    policy: Option<Policy>,
    cooling_off: CoolingOff,
    user_overrides: UserOverrides,
    tag_filter: TagFilter,
}

impl OpportunityContextBuilder {
    /// Creates a new, empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a held position.
    pub fn add_position(mut self, position: EnrichedPosition) -> Self {
        self.positions.push(position);
        self
    }

    /// Adds multiple held positions.
    pub fn add_positions(mut self, positions: impl IntoIterator<Item = EnrichedPosition>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// Adds a security to the tradable universe.
    pub fn add_security(mut self, security: Security) -> Self {
        self.securities.push(security);
        self
    }

    /// Adds multiple securities to the tradable universe.
    pub fn add_securities(mut self, securities: impl IntoIterator<Item = Security>) -> Self {
        self.securities.extend(securities);
        self
    }

    /// Sets the total portfolio value in EUR.
    pub fn total_portfolio_value_eur(mut self, value: f64) -> Self {
        self.total_portfolio_value_eur = value;
        self
    }

    /// Sets the available cash in EUR.
    pub fn available_cash_eur(mut self, value: f64) -> Self {
        self.available_cash_eur = value;
        self
    }

    /// Sets the scoring signals.
    pub fn signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }

    /// Sets the allocation state.
    pub fn allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    /// Sets the policy knobs.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the cooling-off sets.
    pub fn cooling_off(mut self, cooling_off: CoolingOff) -> Self {
        self.cooling_off = cooling_off;
        self
    }

    /// Sets the user override (dismissed filter) state.
    pub fn user_overrides(mut self, overrides: UserOverrides) -> Self {
        self.user_overrides = overrides;
        self
    }

    /// Sets the baked-in tag-filter collaborator results.
    pub fn tag_filter(mut self, tag_filter: TagFilter) -> Self {
        self.tag_filter = tag_filter;
        self
    }

    /// Builds and validates the context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] style validation failures wrapped as a plain
    /// `String` reason via [`EngineError::UnknownCalculator`]-adjacent
    /// variants is deliberately avoided here: building a context is not a
    /// calculator concern, so failures are reported as a dedicated
    /// `Result<_, String>` instead of overloading the calculator error
    /// surface.
    ///
    /// # Invariants enforced
    ///
    /// - Every position's ISIN is present in the security universe and in
    ///   the current-price map.
    /// - `total_portfolio_value_eur >= available_cash_eur >= 0`.
    /// - No position symbol follows the `CASH:<CCY>:<bucket>` convention
    ///   (cash balances must be folded into `available_cash_eur` upstream).
    pub fn build(self) -> Result<OpportunityContext, String> {
        let mut stocks_by_isin: HashMap<Isin, Security> = HashMap::new();
        for security in &self.securities {
            stocks_by_isin.insert(security.isin.clone(), security.clone());
        }

        let mut current_prices: HashMap<Isin, f64> = HashMap::new();
        for position in &self.positions {
            current_prices.insert(position.isin.clone(), position.current_price);
        }

        if self.available_cash_eur < 0.0 {
            return Err("available_cash_eur must be >= 0".to_string());
        }
        if self.total_portfolio_value_eur < self.available_cash_eur {
            return Err("total_portfolio_value_eur must be >= available_cash_eur".to_string());
        }

        for position in &self.positions {
            if position.symbol.is_cash_like() {
                return Err(format!(
                    "position {} carries a cash-like symbol {} and must be folded into available_cash_eur upstream",
                    position.isin, position.symbol
                ));
            }
            if !stocks_by_isin.contains_key(&position.isin) {
                return Err(format!(
                    "position {} has no matching security in the universe",
                    position.isin
                ));
            }
            if !current_prices.contains_key(&position.isin) {
                return Err(format!("position {} has no current price", position.isin));
            }
        }

        Ok(OpportunityContext {
            portfolio: Portfolio {
                enriched_positions: self.positions,
                total_portfolio_value_eur: self.total_portfolio_value_eur,
                available_cash_eur: self.available_cash_eur,
                current_prices,
            },
            universe: Universe {
                securities: self.securities,
                stocks_by_isin,
            },
            signals: self.signals,
            allocation: self.allocation,
            policy: self.policy.unwrap_or_default(),
            cooling_off: self.cooling_off,
            user_overrides: self.user_overrides,
            tag_filter: self.tag_filter,
        })
    }
}
