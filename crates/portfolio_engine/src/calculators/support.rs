//! Helpers shared across calculator implementations.

use portfolio_core::Isin;

use crate::context::OpportunityContext;
use crate::gates::priority::{detect_regime, Regime};
use crate::gates::quality_gate::QualityInputs;
use crate::gates::sell_quality::{self, SellQuality};

/// Tag marking a security caught up in a speculative run-up the priority
/// pipeline penalizes (§4.7 step 1).
pub const QUANTUM_BUBBLE_WARNING_TAG: &str = "quantum-bubble-warning";

/// Tags attached to `isin`, or an empty slice when none are known.
pub fn tags_for<'a>(ctx: &'a OpportunityContext, isin: &Isin) -> &'a [String] {
    ctx.signals
        .tags
        .get(isin)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Whether `tags` carries the quantum-bubble-warning flag.
pub fn has_quantum_warning(tags: &[String]) -> bool {
    tags.iter().any(|t| t == QUANTUM_BUBBLE_WARNING_TAG)
}

/// Detects the market regime from every security's tags known to the
/// context.
pub fn regime(ctx: &OpportunityContext) -> Regime {
    detect_regime(ctx.signals.tags.values().map(|v| v.as_slice()))
}

/// Builds the sell-quality score for a held position, defaulting missing
/// stability/long-term signals to a neutral `0.5`.
pub fn sell_quality_for(ctx: &OpportunityContext, isin: &Isin) -> SellQuality {
    let stability = ctx.signals.stability_scores.get(isin).copied().unwrap_or(0.5);
    let long_term = ctx.signals.long_term_scores.get(isin).copied().unwrap_or(0.5);
    sell_quality::score(stability, long_term, tags_for(ctx, isin))
}

/// Assembles score-based [`QualityInputs`] from the context's signal maps for
/// `isin`, then layers in `tags` for tag-based evaluation when present.
pub fn quality_inputs(ctx: &OpportunityContext, isin: &Isin, tags: &[String]) -> QualityInputs {
    let mut inputs = crate::gates::quality_gate::inputs_from_signal_maps(
        isin,
        &ctx.signals.fundamentals_scores,
        &ctx.signals.long_term_scores,
        &ctx.signals.opportunity_scores,
        &ctx.signals.momentum_scores,
        &ctx.signals.volatility,
        &ctx.signals.cagrs,
    );
    inputs.dividend_score = ctx.signals.dividend_scores.get(isin).copied();
    inputs.dividend_yield = ctx.signals.dividend_yields.get(isin).copied();
    inputs.sharpe = ctx.signals.sharpe_ratios.get(isin).copied();
    inputs.sortino = ctx.signals.sortino_ratios.get(isin).copied();
    if !tags.is_empty() {
        inputs.tags = Some(tags.to_vec());
    }
    inputs
}

/// Current EUR value of a held position, or `0.0` when not held.
pub fn current_position_value(ctx: &OpportunityContext, isin: &Isin) -> f64 {
    ctx.position(isin).map(|p| p.market_value_eur).unwrap_or(0.0)
}

/// Looks up a geography group's current EUR allocation, `0.0` when unknown.
pub fn current_geo_value(ctx: &OpportunityContext, geography: &str) -> f64 {
    ctx.allocation
        .geography_allocations
        .get(geography)
        .copied()
        .unwrap_or(0.0)
}
