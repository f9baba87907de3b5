//! Rebalance Sells (§4.11.5) — trims overweight geographies back toward
//! target, protecting high-quality positions unless the overweight is severe.

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::geo_allocator;
use crate::gates::priority;
use crate::params::get_f64;

/// Sells down geographies whose current allocation exceeds its target by
/// more than `min_overweight_threshold`, protecting high sell-quality
/// positions unless the overweight is severe.
pub struct RebalanceSellsCalculator;

impl Calculator for RebalanceSellsCalculator {
    fn name(&self) -> &str {
        "rebalance_sells"
    }

    fn category(&self) -> Category {
        Category::RebalanceSells
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();
        if !ctx.policy.allow_sell {
            return Ok(result);
        }

        let bag = config.params_for(self.name());
        let min_overweight_threshold = get_f64(&bag, "min_overweight_threshold", 0.05);
        let max_sell_percentage = get_f64(&bag, "max_sell_percentage", 0.20);
        let severe_overweight_threshold = get_f64(&bag, "severe_overweight_threshold", 0.20);
        let quality_protection_threshold = get_f64(&bag, "quality_protection_threshold", 0.7);

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);

        for (geography, &target) in &ctx.allocation.target_country_weights {
            let current = ctx.allocation.geography_weights.get(geography).copied().unwrap_or(0.0);
            let overweight = current - target;
            if overweight <= min_overweight_threshold {
                continue;
            }

            let positions: Vec<_> = ctx
                .portfolio
                .enriched_positions
                .iter()
                .filter(|p| p.geographies().contains(&geography.as_str()))
                .collect();
            if positions.is_empty() {
                continue;
            }

            let severe = overweight > severe_overweight_threshold;
            let mut eligible = Vec::new();
            for position in &positions {
                let tags = support::tags_for(ctx, &position.isin);
                let quality = support::sell_quality_for(ctx, &position.isin);
                if !severe && (quality.is_high_quality || quality.quality_score >= quality_protection_threshold) {
                    collector.add(
                        &position.isin,
                        position.symbol.as_str(),
                        &position.name,
                        "protected by high sell-quality score",
                    );
                    continue;
                }
                eligible.push((*position, quality, tags));
            }

            if eligible.is_empty() {
                continue;
            }

            let positions_with_quality: Vec<(&_, _)> =
                eligible.iter().map(|(p, q, _)| (*p, q.clone())).collect();
            let plans = geo_allocator::allocate(
                overweight,
                ctx.portfolio.total_portfolio_value_eur,
                &positions_with_quality,
                max_sell_percentage,
            );

            for plan in plans {
                let Some((position, _, tags)) =
                    eligible.iter().find(|(p, _, _)| p.isin == plan.isin)
                else {
                    continue;
                };

                let base_priority = overweight * 0.5 * plan.sell_priority_boost;
                let priority_value = priority::adjust(
                    base_priority,
                    Category::RebalanceSells,
                    tags,
                    regime,
                    support::has_quantum_warning(tags),
                    &config.calculator_boosts,
                );

                result.candidates.push(ActionCandidate {
                    side: Side::Sell,
                    isin: position.isin.clone(),
                    symbol: position.symbol.clone(),
                    name: position.name.clone(),
                    quantity: plan.quantity,
                    price: position.current_price,
                    value_eur: plan.quantity as f64 * position.current_price,
                    currency: position.currency,
                    priority: priority_value,
                    reason: format!(
                        "Rebalance sell: {} overweight by {:.1}%",
                        geography,
                        overweight * 100.0
                    ),
                    tags: vec!["rebalance_sells".to_string()],
                    category: Category::RebalanceSells,
                });
            }
        }

        result.candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
        result.pre_filtered = collector.result();
        Ok(result)
    }
}
