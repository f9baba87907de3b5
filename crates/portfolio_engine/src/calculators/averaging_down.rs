//! Averaging Down (§4.11.2) — adds to a position trading at a meaningful
//! loss, preferring a Kelly-sized top-up over a flat percentage.

use portfolio_core::round_to_lot;

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::priority;
use crate::gates::quality_gate;
use crate::params::get_f64;

/// Tops up a losing position, sizing toward its Kelly-optimal weight when a
/// Kelly size is available and falling back to a flat percentage otherwise.
pub struct AveragingDownCalculator;

impl Calculator for AveragingDownCalculator {
    fn name(&self) -> &str {
        "averaging_down"
    }

    fn category(&self) -> Category {
        Category::AveragingDown
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();
        if !ctx.policy.allow_buy {
            return Ok(result);
        }

        let bag = config.params_for(self.name());
        let max_loss_percent = get_f64(&bag, "max_loss_percent", -0.30);
        let min_loss_percent = get_f64(&bag, "min_loss_percent", -0.05);
        let max_value_per_position = get_f64(&bag, "max_value_per_position", f64::INFINITY);
        let averaging_down_percent = get_f64(&bag, "averaging_down_percent", 0.10);
        let max_positions = crate::params::get_i64(&bag, "max_positions", 3).max(0) as usize;
        let max_cost_ratio = get_f64(&bag, "max_cost_ratio", 0.01);

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);
        let min_trade = ctx.calculate_min_trade_amount(max_cost_ratio);

        for position in &ctx.portfolio.enriched_positions {
            let loss = position.gain_fraction();
            if !(loss > max_loss_percent && loss < min_loss_percent) {
                continue;
            }
            if !position.allow_buy {
                collector.add(&position.isin, position.symbol.as_str(), &position.name, "buy not allowed");
                continue;
            }

            let tags = support::tags_for(ctx, &position.isin);
            if config.enable_tag_filtering
                && !tags.is_empty()
                && !ctx.tag_filter.allows_opportunity(&position.symbol)
            {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "excluded by tag filter",
                );
                continue;
            }

            let inputs = support::quality_inputs(ctx, &position.isin, tags);
            if let Err(reason) = quality_gate::evaluate(&inputs, config.enable_tag_filtering, ctx.policy.target_return) {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    format!("quality gate: {:?}", reason),
                );
                continue;
            }

            let kelly = ctx.signals.kelly_sizes.get(&position.isin).copied();
            let mut quantity_f = if let Some(kelly) = kelly {
                let target_shares = (kelly * ctx.portfolio.total_portfolio_value_eur) / position.current_price;
                let additional = target_shares - position.quantity;
                if additional <= 0.0 {
                    collector.add(
                        &position.isin,
                        position.symbol.as_str(),
                        &position.name,
                        "already at Kelly-optimal size",
                    );
                    continue;
                }
                additional
            } else {
                (position.quantity * averaging_down_percent).max(1.0)
            };

            if quantity_f * position.current_price > max_value_per_position {
                quantity_f = max_value_per_position / position.current_price;
            }

            let quantity = round_to_lot(quantity_f, position.min_lot);
            if quantity <= 0 {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "rounds to zero after lot sizing",
                );
                continue;
            }

            let value_eur = quantity as f64 * position.current_price;
            if value_eur < min_trade {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "trade value below minimum",
                );
                continue;
            }

            let fees = ctx.policy.transaction_cost_fixed + value_eur * ctx.policy.transaction_cost_percent;
            if value_eur + fees > ctx.portfolio.available_cash_eur {
                collector.add(
                    &position.isin,
                    position.symbol.as_str(),
                    &position.name,
                    "insufficient cash",
                );
                continue;
            }

            let base_priority = -loss;
            let priority = if !tags.is_empty() {
                priority::adjust(
                    base_priority,
                    Category::AveragingDown,
                    tags,
                    regime,
                    support::has_quantum_warning(tags),
                    &config.calculator_boosts,
                )
            } else {
                base_priority
            };

            result.candidates.push(ActionCandidate {
                side: Side::Buy,
                isin: position.isin.clone(),
                symbol: position.symbol.clone(),
                name: position.name.clone(),
                quantity,
                price: position.current_price,
                value_eur,
                currency: position.currency,
                priority,
                reason: format!(
                    "Averaging down: {:.1}% loss (cost basis: {:.2}, current: {:.2})",
                    loss * 100.0,
                    position.average_cost,
                    position.current_price
                ),
                tags: vec!["averaging_down".to_string()],
                category: Category::AveragingDown,
            });
        }

        result.candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
        result.candidates.truncate(max_positions);
        result.pre_filtered = collector.result();
        Ok(result)
    }
}
