//! The Opportunity Context — a single, immutable snapshot every calculator
//! reads from.

mod builder;

pub use builder::OpportunityContextBuilder;

use std::collections::{HashMap, HashSet};

use portfolio_core::{Isin, Symbol};

use crate::data::{EnrichedPosition, Security};

/// Held positions and portfolio-level valuation.
#[derive(Clone, Debug, Default)]
pub struct Portfolio {
    /// Every currently held position, enriched with security reference data.
    pub enriched_positions: Vec<EnrichedPosition>,
    /// Total portfolio value in EUR, including cash.
    pub total_portfolio_value_eur: f64,
    /// Cash available to fund new BUY candidates, in EUR.
    pub available_cash_eur: f64,
    /// Current price per unit, keyed by ISIN.
    pub current_prices: HashMap<Isin, f64>,
}

/// The tradable universe.
#[derive(Clone, Debug, Default)]
pub struct Universe {
    /// Every security known to the engine.
    pub securities: Vec<Security>,
    /// The same securities, keyed by ISIN for O(1) lookup.
    pub stocks_by_isin: HashMap<Isin, Security>,
}

/// Per-ISIN scoring signals. Absence of a key means "not available" — most
/// calculators treat a missing signal as a rejection reason rather than a
/// default value. `expected_returns` in particular is post-filter: an ISIN
/// absent from this map has already been determined to sit below the 6%
/// absolute return floor upstream.
#[derive(Clone, Debug, Default)]
pub struct Signals {
    /// General security score.
    pub security_scores: HashMap<Isin, f64>,
    /// Expected forward return; absent means below the 6% floor.
    pub expected_returns: HashMap<Isin, f64>,
    /// Compound annual growth rate.
    pub cagrs: HashMap<Isin, f64>,
    /// Fundamentals quality score in `[0, 1]`.
    pub fundamentals_scores: HashMap<Isin, f64>,
    /// Long-term quality score in `[0, 1]`.
    pub long_term_scores: HashMap<Isin, f64>,
    /// Price stability score in `[0, 1]`.
    pub stability_scores: HashMap<Isin, f64>,
    /// Opportunity (undervaluation) score in `[0, 1]`.
    pub opportunity_scores: HashMap<Isin, f64>,
    /// Momentum score, roughly in `[-1, 1]`.
    pub momentum_scores: HashMap<Isin, f64>,
    /// Annualized volatility.
    pub volatility: HashMap<Isin, f64>,
    /// Fractional-Kelly position size, as a fraction of total portfolio value.
    pub kelly_sizes: HashMap<Isin, f64>,
    /// Price-to-earnings ratio.
    pub pe_ratios: HashMap<Isin, f64>,
    /// Market-average P/E ratio for the security's peer group.
    pub market_avg_pe: HashMap<Isin, f64>,
    /// Dividend-specific sub-scores used by the quality gate's dividend
    /// income path, keyed by ISIN: `(dividend_score, dividend_yield)`.
    pub dividend_scores: HashMap<Isin, f64>,
    /// Dividend yield, as a fraction (0.035 == 3.5%).
    pub dividend_yields: HashMap<Isin, f64>,
    /// Sharpe ratio, when supplied directly rather than derived from cagr/vol.
    pub sharpe_ratios: HashMap<Isin, f64>,
    /// Sortino ratio, when supplied directly.
    pub sortino_ratios: HashMap<Isin, f64>,
    /// Tags attached to each security by the upstream tag repository,
    /// mirrored here for calculators that need them without a live
    /// collaborator call.
    pub tags: HashMap<Isin, Vec<String>>,
}

/// Current and target allocation state, used by the rebalancing calculators
/// and the concentration guardrail.
#[derive(Clone, Debug, Default)]
pub struct Allocation {
    /// Current weight of each country in the portfolio.
    pub country_weights: HashMap<String, f64>,
    /// Current EUR allocation of each country.
    pub country_allocations: HashMap<String, f64>,
    /// Current weight of each geography group in the portfolio.
    pub geography_weights: HashMap<String, f64>,
    /// Current EUR allocation of each geography group.
    pub geography_allocations: HashMap<String, f64>,
    /// Target weight per country/geography group.
    pub target_country_weights: HashMap<String, f64>,
    /// Per-ISIN target weight, as produced by the (out-of-scope) optimizer.
    pub target_weights: HashMap<Isin, f64>,
    /// Maps a country code to the geography group it rolls up into.
    pub country_to_group: HashMap<String, String>,
}

/// Policy knobs that gate or scale every calculator.
#[derive(Clone, Debug)]
pub struct Policy {
    /// Whether new BUY candidates may be generated at all.
    pub allow_buy: bool,
    /// Whether new SELL candidates may be generated at all.
    pub allow_sell: bool,
    /// Target annualized return the portfolio aims for.
    pub target_return: f64,
    /// Fraction of `target_return` a candidate's expected return must clear
    /// before incurring the below-target priority penalty.
    pub target_return_threshold_pct: f64,
    /// Market regime score in `[-1, 1]`; not used directly by the pipeline
    /// (which derives its own tag-based regime), but available to
    /// calculators that want a continuous signal.
    pub regime_score: f64,
    /// Fixed transaction cost per trade, in EUR.
    pub transaction_cost_fixed: f64,
    /// Percentage transaction cost, as a fraction of trade value.
    pub transaction_cost_percent: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_buy: true,
            allow_sell: true,
            target_return: 0.11,
            target_return_threshold_pct: 0.70,
            regime_score: 0.0,
            transaction_cost_fixed: 1.0,
            transaction_cost_percent: 0.0,
        }
    }
}

/// Cooling-off and eligibility sets.
#[derive(Clone, Debug, Default)]
pub struct CoolingOff {
    /// ISINs bought recently enough that a new BUY should be skipped.
    pub recently_bought_isins: HashSet<Isin>,
    /// ISINs sold recently enough that a new SELL should be skipped.
    pub recently_sold_isins: HashSet<Isin>,
    /// ISINs temporarily ineligible for any new action.
    pub ineligible_isins: HashSet<Isin>,
}

/// User-provided overrides.
#[derive(Clone, Debug, Default)]
pub struct UserOverrides {
    /// `isin -> calculator -> [reasons]` the user has already dismissed.
    pub dismissed_filters: HashMap<Isin, HashMap<String, Vec<String>>>,
}

/// Results of the (out-of-scope) tag-filter collaborator, baked into the
/// context ahead of time rather than invoked live by each calculator.
///
/// When `enabled` is `false` every calculator treats the candidate sets as
/// unrestricted — the filter is simply not consulted.
#[derive(Clone, Debug, Default)]
pub struct TagFilter {
    /// Whether tag-based filtering is active for this run.
    pub enabled: bool,
    /// Symbols the filter allows to be considered for BUY-side candidates.
    /// Ignored when `enabled` is `false`.
    pub opportunity_candidates: HashSet<Symbol>,
    /// Symbols the filter allows to be considered for SELL-side candidates.
    /// Ignored when `enabled` is `false`.
    pub sell_candidates: HashSet<Symbol>,
    /// Whether the filter has independently flagged the overall market as
    /// volatile, informing calculators that read market-wide mood rather
    /// than per-security tags.
    pub market_volatile: bool,
}

impl TagFilter {
    /// Whether `symbol` may be considered for a BUY-side candidate.
    ///
    /// Always `true` when the filter is disabled.
    pub fn allows_opportunity(&self, symbol: &Symbol) -> bool {
        !self.enabled || self.opportunity_candidates.contains(symbol)
    }

    /// Whether `symbol` may be considered for a SELL-side candidate.
    ///
    /// Always `true` when the filter is disabled.
    pub fn allows_sell(&self, symbol: &Symbol) -> bool {
        !self.enabled || self.sell_candidates.contains(symbol)
    }
}

/// The immutable snapshot passed to every calculator invocation.
///
/// # Invariants
///
/// - Every `isin` in `portfolio.enriched_positions` is present in both
///   `universe.stocks_by_isin` and `portfolio.current_prices`.
/// - `portfolio.total_portfolio_value_eur >= portfolio.available_cash_eur >= 0`.
///
/// These are checked once by [`OpportunityContextBuilder::build`] rather
/// than by every calculator call site.
#[derive(Clone, Debug)]
pub struct OpportunityContext {
    /// Held positions and portfolio-level valuation.
    pub portfolio: Portfolio,
    /// The tradable universe.
    pub universe: Universe,
    /// Per-ISIN scoring signals.
    pub signals: Signals,
    /// Current and target allocation state.
    pub allocation: Allocation,
    /// Policy knobs.
    pub policy: Policy,
    /// Cooling-off and eligibility sets.
    pub cooling_off: CoolingOff,
    /// User-provided dismissal overrides.
    pub user_overrides: UserOverrides,
    /// Baked-in tag-filter collaborator results.
    pub tag_filter: TagFilter,
}

impl OpportunityContext {
    /// `transaction_cost_fixed / max_cost_ratio` — the minimum notional a
    /// trade must clear given the policy's fixed transaction cost.
    ///
    /// # Examples
    ///
    /// ```
    /// use portfolio_engine::context::{OpportunityContextBuilder, Policy};
    ///
    /// let ctx = OpportunityContextBuilder::new()
    ///     .policy(Policy { transaction_cost_fixed: 1.0, ..Policy::default() })
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(ctx.calculate_min_trade_amount(0.01), 100.0);
    /// ```
    pub fn calculate_min_trade_amount(&self, max_cost_ratio: f64) -> f64 {
        portfolio_core::min_trade_amount(self.policy.transaction_cost_fixed, max_cost_ratio)
    }

    /// Looks up a position by ISIN.
    pub fn position(&self, isin: &Isin) -> Option<&EnrichedPosition> {
        self.portfolio
            .enriched_positions
            .iter()
            .find(|p| &p.isin == isin)
    }

    /// Looks up a security by ISIN.
    pub fn security(&self, isin: &Isin) -> Option<&Security> {
        self.universe.stocks_by_isin.get(isin)
    }

    /// Returns the reasons the given `(isin, calculator)` pair has already
    /// been dismissed for.
    pub fn dismissed_reasons(&self, isin: &Isin, calculator: &str) -> &[String] {
        self.user_overrides
            .dismissed_filters
            .get(isin)
            .and_then(|by_calc| by_calc.get(calculator))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
