//! Profit Taking (§4.11.1) — trims positions that have gained significantly.

use portfolio_core::round_to_lot;

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::priority;
use crate::params::get_f64;

/// Trims a position once its unrealized gain clears `min_gain_threshold`,
/// selling the full `max_sell_percentage` once the gain reaches
/// `windfall_threshold` regardless of sell-quality protection.
pub struct ProfitTakingCalculator;

impl Calculator for ProfitTakingCalculator {
    fn name(&self) -> &str {
        "profit_taking"
    }

    fn category(&self) -> Category {
        Category::ProfitTaking
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();
        if !ctx.policy.allow_sell {
            return Ok(result);
        }

        let bag = config.params_for(self.name());
        let min_gain_threshold = get_f64(&bag, "min_gain_threshold", 0.15);
        let max_sell_percentage = get_f64(&bag, "max_sell_percentage", 0.20);
        let sell_percentage = get_f64(&bag, "sell_percentage", 1.0);
        let windfall_threshold = get_f64(&bag, "windfall_threshold", 0.30);

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);

        for position in &ctx.portfolio.enriched_positions {
            if !position.allow_sell {
                collector.add(&position.isin, position.symbol.as_str(), &position.name, "sell not allowed");
                continue;
            }

            let gain = position.gain_fraction();
            if gain < min_gain_threshold {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "gain below minimum threshold",
                );
                continue;
            }

            let quality = support::sell_quality_for(ctx, &position.isin);
            let is_windfall = gain >= windfall_threshold;
            let fraction = if is_windfall {
                max_sell_percentage
            } else {
                (sell_percentage.min(max_sell_percentage) * quality.sell_priority_boost).min(max_sell_percentage)
            };

            let quantity = round_to_lot(position.quantity * fraction, position.min_lot);
            if quantity <= 0 {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "sell quantity rounds to zero",
                );
                continue;
            }

            let tags = support::tags_for(ctx, &position.isin);
            let has_quantum = support::has_quantum_warning(tags);
            let base_priority = gain * fraction * quality.sell_priority_boost;
            let priority = priority::adjust(
                base_priority,
                Category::ProfitTaking,
                tags,
                regime,
                has_quantum,
                &config.calculator_boosts,
            );

            let value_eur = quantity as f64 * position.current_price;
            let mut candidate_tags = vec!["profit_taking".to_string()];
            if is_windfall {
                candidate_tags.push("windfall".to_string());
            }

            result.candidates.push(ActionCandidate {
                side: Side::Sell,
                isin: position.isin.clone(),
                symbol: position.symbol.clone(),
                name: position.name.clone(),
                quantity,
                price: position.current_price,
                value_eur,
                currency: position.currency,
                priority,
                reason: format!(
                    "Profit taking: {:.1}% gain (cost basis: {:.2}, current: {:.2})",
                    gain * 100.0,
                    position.average_cost,
                    position.current_price
                ),
                tags: candidate_tags,
                category: Category::ProfitTaking,
            });
        }

        result.candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
        result.pre_filtered = collector.result();
        Ok(result)
    }
}
