//! Weight-Based (§4.11.4) — trades a security toward an explicit per-ISIN
//! target weight, in either direction.

use portfolio_core::{absolute_sell_ceiling, round_to_lot};

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::{guardrail, priority, quality_gate};
use crate::params::{get_f64, get_i64};

/// Trades every ISIN with an explicit `target_weights` entry toward that
/// weight: BUY when underweight, SELL when overweight.
pub struct WeightBasedCalculator;

impl Calculator for WeightBasedCalculator {
    fn name(&self) -> &str {
        "weight_based"
    }

    fn category(&self) -> Category {
        Category::WeightBased
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();

        let bag = config.params_for(self.name());
        let min_weight_diff = get_f64(&bag, "min_weight_diff", 0.02);
        let max_sell_percentage = get_f64(&bag, "max_sell_percentage", 1.0);
        let max_cost_ratio = get_f64(&bag, "max_cost_ratio", 0.01);
        let max_buy_positions = get_i64(&bag, "max_buy_positions", 5).max(0) as usize;
        let max_sell_positions = get_i64(&bag, "max_sell_positions", 5).max(0) as usize;

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);
        let min_trade = ctx.calculate_min_trade_amount(max_cost_ratio);

        let mut buys: Vec<(ActionCandidate, f64)> = Vec::new();
        let mut sells: Vec<(ActionCandidate, f64)> = Vec::new();

        for (isin, &target) in &ctx.allocation.target_weights {
            let current = ctx.position(isin).map(|p| p.weight_in_portfolio).unwrap_or(0.0);
            let diff = target - current;
            if diff.abs() < min_weight_diff {
                continue;
            }

            let Some(security) = ctx.security(isin) else {
                collector.add(isin, "", "", "no matching security in universe");
                continue;
            };

            if diff > 0.0 {
                if !ctx.policy.allow_buy {
                    continue;
                }
                if !security.allow_buy {
                    collector.add(isin, security.symbol.as_str(), &security.name, "buy not allowed");
                    continue;
                }

                let tags = support::tags_for(ctx, isin);
                let inputs = support::quality_inputs(ctx, isin, tags);
                if let Err(reason) = quality_gate::evaluate(&inputs, config.enable_tag_filtering, ctx.policy.target_return) {
                    collector.add(isin, security.symbol.as_str(), &security.name, format!("quality gate: {:?}", reason));
                    continue;
                }

                let current_price = ctx.portfolio.current_prices.get(isin).copied().unwrap_or(0.0);
                if current_price <= 0.0 {
                    collector.add(isin, security.symbol.as_str(), &security.name, "no current price");
                    continue;
                }

                let mut target_value = diff * ctx.portfolio.total_portfolio_value_eur;
                if let Some(kelly) = ctx.signals.kelly_sizes.get(isin) {
                    let kelly_value = kelly * ctx.portfolio.total_portfolio_value_eur;
                    if kelly_value < target_value {
                        target_value = kelly_value;
                    }
                }

                let current_position_value = support::current_position_value(ctx, isin);
                let geographies = security.geographies();
                let guardrail_result = guardrail::check(
                    current_position_value,
                    &geographies,
                    |geo| support::current_geo_value(ctx, geo),
                    target_value,
                    ctx.portfolio.total_portfolio_value_eur,
                    config.position_cap,
                    config.geo_cap,
                );
                if !guardrail_result.passes {
                    collector.add(
                        isin,
                        security.symbol.as_str(),
                        &security.name,
                        guardrail_result.reason.unwrap_or_else(|| "concentration cap exceeded".to_string()),
                    );
                    continue;
                }

                let quantity = round_to_lot(target_value / current_price, security.min_lot);
                if quantity <= 0 {
                    collector.add(isin, security.symbol.as_str(), &security.name, "rounds to zero after lot sizing");
                    continue;
                }
                let value_eur = quantity as f64 * current_price;
                if value_eur < min_trade {
                    collector.add(isin, security.symbol.as_str(), &security.name, "trade value below minimum");
                    continue;
                }
                let fees = ctx.policy.transaction_cost_fixed + value_eur * ctx.policy.transaction_cost_percent;
                if value_eur + fees > ctx.portfolio.available_cash_eur {
                    collector.add(isin, security.symbol.as_str(), &security.name, "insufficient cash");
                    continue;
                }

                let priority_value = priority::adjust(
                    diff.abs(),
                    Category::WeightBased,
                    tags,
                    regime,
                    support::has_quantum_warning(tags),
                    &config.calculator_boosts,
                );

                buys.push((
                    ActionCandidate {
                        side: Side::Buy,
                        isin: isin.clone(),
                        symbol: security.symbol.clone(),
                        name: security.name.clone(),
                        quantity,
                        price: current_price,
                        value_eur,
                        currency: security.currency,
                        priority: priority_value,
                        reason: format!("Weight-based buy: target {:.1}% vs current {:.1}%", target * 100.0, current * 100.0),
                        tags: vec!["weight_based".to_string()],
                        category: Category::WeightBased,
                    },
                    diff.abs(),
                ));
            } else {
                if !ctx.policy.allow_sell {
                    continue;
                }
                let Some(position) = ctx.position(isin) else {
                    collector.add(isin, security.symbol.as_str(), &security.name, "no position to sell");
                    continue;
                };
                if !position.allow_sell || position.quantity <= 0.0 || position.current_price <= 0.0 {
                    collector.add(isin, security.symbol.as_str(), &security.name, "sell not allowed");
                    continue;
                }

                let absolute_ceiling = absolute_sell_ceiling(max_sell_percentage);
                let market_value = if position.market_value_eur > 0.0 {
                    position.market_value_eur
                } else {
                    position.quantity_value()
                };
                let target_sell_value = diff.abs() * ctx.portfolio.total_portfolio_value_eur;
                let max_sell_value = market_value * absolute_ceiling;
                let actual = target_sell_value.min(max_sell_value);

                let quantity = round_to_lot(actual / position.current_price, position.min_lot).min(position.quantity.floor() as i64);
                if quantity <= 0 {
                    collector.add(isin, security.symbol.as_str(), &security.name, "sell quantity rounds to zero");
                    continue;
                }

                let tags = support::tags_for(ctx, isin);
                let quality = support::sell_quality_for(ctx, isin);
                let priority_value = priority::adjust(
                    diff.abs() * quality.sell_priority_boost,
                    Category::WeightBased,
                    tags,
                    regime,
                    support::has_quantum_warning(tags),
                    &config.calculator_boosts,
                );

                sells.push((
                    ActionCandidate {
                        side: Side::Sell,
                        isin: isin.clone(),
                        symbol: position.symbol.clone(),
                        name: position.name.clone(),
                        quantity,
                        price: position.current_price,
                        value_eur: quantity as f64 * position.current_price,
                        currency: position.currency,
                        priority: priority_value,
                        reason: format!("Weight-based sell: target {:.1}% vs current {:.1}%", target * 100.0, current * 100.0),
                        tags: vec!["weight_based".to_string()],
                        category: Category::WeightBased,
                    },
                    diff.abs(),
                ));
            }
        }

        buys.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        sells.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        buys.truncate(max_buy_positions);
        sells.truncate(max_sell_positions);

        result.candidates.extend(buys.into_iter().map(|(c, _)| c));
        result.candidates.extend(sells.into_iter().map(|(c, _)| c));
        result.pre_filtered = collector.result();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpportunityContextBuilder;
    use portfolio_core::{Currency, Isin, Symbol};
    use crate::data::{EnrichedPosition, Security};

    fn security(isin: &str) -> Security {
        Security {
            isin: Isin::new(isin),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            currency: Currency::USD,
            geography: "US".into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    fn position(isin: &str) -> EnrichedPosition {
        EnrichedPosition {
            isin: Isin::new(isin),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            quantity: 1000.0,
            average_cost: 50.0,
            current_price: 50.0,
            market_value_eur: 50_000.0,
            weight_in_portfolio: 0.50,
            currency: Currency::USD,
            geography: "US".into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    #[test]
    fn sells_down_an_overweight_position() {
        let isin = Isin::new("US1234567890");
        let mut allocation = crate::context::Allocation::default();
        allocation.target_weights.insert(isin.clone(), 0.30);

        let ctx = OpportunityContextBuilder::new()
            .total_portfolio_value_eur(100_000.0)
            .add_security(security("US1234567890"))
            .add_position(position("US1234567890"))
            .allocation(allocation)
            .build()
            .unwrap();

        let config = PlannerConfig::default();
        let result = WeightBasedCalculator.calculate(&ctx, &config).unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].side, Side::Sell);
    }

    #[test]
    fn small_diff_below_threshold_is_skipped() {
        let isin = Isin::new("US1234567890");
        let mut allocation = crate::context::Allocation::default();
        allocation.target_weights.insert(isin.clone(), 0.51);

        let ctx = OpportunityContextBuilder::new()
            .total_portfolio_value_eur(100_000.0)
            .add_security(security("US1234567890"))
            .add_position(position("US1234567890"))
            .allocation(allocation)
            .build()
            .unwrap();

        let config = PlannerConfig::default();
        let result = WeightBasedCalculator.calculate(&ctx, &config).unwrap();
        assert!(result.candidates.is_empty());
    }
}
