//! Rebalance Buys (§4.11.6) — buys into country groups that have fallen
//! meaningfully underweight against their target.

use portfolio_core::round_to_lot;

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::{guardrail, priority, quality_gate};
use crate::params::get_f64;

/// Buys into countries whose current weight has drifted below target by
/// more than `min_underweight_threshold`, ranking candidates by
/// `underweight * opportunity_score`.
pub struct RebalanceBuysCalculator;

impl Calculator for RebalanceBuysCalculator {
    fn name(&self) -> &str {
        "rebalance_buys"
    }

    fn category(&self) -> Category {
        Category::RebalanceBuys
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();
        if !ctx.policy.allow_buy {
            return Ok(result);
        }

        let bag = config.params_for(self.name());
        let min_underweight_threshold = get_f64(&bag, "min_underweight_threshold", 0.05);
        let min_score = get_f64(&bag, "min_score", 0.60);
        let max_value_per_position = get_f64(&bag, "max_value_per_position", f64::INFINITY);
        let max_cost_ratio = get_f64(&bag, "max_cost_ratio", 0.01);
        let max_positions = crate::params::get_i64(&bag, "max_positions", 5).max(0) as usize;

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);
        let min_trade = ctx.calculate_min_trade_amount(max_cost_ratio);

        let mut underweight_countries = Vec::new();
        for (country, &target) in &ctx.allocation.target_country_weights {
            let current = ctx.allocation.country_weights.get(country).copied().unwrap_or(0.0);
            let underweight = target - current;
            if underweight > min_underweight_threshold {
                underweight_countries.push((country.clone(), underweight));
            }
        }
        if underweight_countries.is_empty() {
            return Ok(result);
        }

        let mut candidates: Vec<(_, f64, f64)> = Vec::new();
        for security in &ctx.universe.securities {
            let Some(&underweight) = underweight_countries
                .iter()
                .find(|(country, _)| {
                    ctx.allocation
                        .country_to_group
                        .get(country)
                        .map(|group| group == &security.geography)
                        .unwrap_or(country == &security.geography)
                })
                .map(|(_, u)| u)
            else {
                continue;
            };

            let Some(score) = ctx.signals.opportunity_scores.get(&security.isin).copied() else {
                continue;
            };
            if score < min_score {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "below minimum score");
                continue;
            }
            if ctx.cooling_off.recently_bought_isins.contains(&security.isin) {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "recently bought");
                continue;
            }
            candidates.push((security, underweight, score));
        }

        candidates.sort_by(|a, b| {
            let rank_a = a.1 * a.2;
            let rank_b = b.1 * b.2;
            rank_b.partial_cmp(&rank_a).unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(max_positions);

        for (security, underweight, score) in candidates {
            if !security.allow_buy {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "buy not allowed");
                continue;
            }

            let tags = support::tags_for(ctx, &security.isin);
            let inputs = support::quality_inputs(ctx, &security.isin, tags);
            if let Err(reason) = quality_gate::evaluate(&inputs, config.enable_tag_filtering, ctx.policy.target_return)
            {
                collector.add(
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    format!("quality gate: {:?}", reason),
                );
                continue;
            }

            let current_price = ctx.portfolio.current_prices.get(&security.isin).copied().unwrap_or(0.0);
            if current_price <= 0.0 {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "no current price");
                continue;
            }

            let mut target_value = max_value_per_position;
            if let Some(kelly) = ctx.signals.kelly_sizes.get(&security.isin) {
                let kelly_value = kelly * ctx.portfolio.total_portfolio_value_eur;
                if kelly_value < target_value {
                    target_value = kelly_value;
                }
            }

            let current_position_value = support::current_position_value(ctx, &security.isin);
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
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    guardrail_result.reason.unwrap_or_else(|| "concentration cap exceeded".to_string()),
                );
                continue;
            }

            let quantity = round_to_lot(target_value / current_price, security.min_lot);
            if quantity <= 0 {
                collector.add(
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    "rounds to zero after lot sizing",
                );
                continue;
            }

            let value_eur = quantity as f64 * current_price;
            if value_eur < min_trade {
                collector.add(
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    "trade value below minimum",
                );
                continue;
            }

            let fees = ctx.policy.transaction_cost_fixed + value_eur * ctx.policy.transaction_cost_percent;
            if value_eur + fees > ctx.portfolio.available_cash_eur {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "insufficient cash");
                continue;
            }

            let base_priority = underweight * score;
            let priority_value = priority::adjust(
                base_priority,
                Category::RebalanceBuys,
                tags,
                regime,
                support::has_quantum_warning(tags),
                &config.calculator_boosts,
            );

            result.candidates.push(ActionCandidate {
                side: Side::Buy,
                isin: security.isin.clone(),
                symbol: security.symbol.clone(),
                name: security.name.clone(),
                quantity,
                price: current_price,
                value_eur,
                currency: security.currency,
                priority: priority_value,
                reason: format!(
                    "Rebalance buy: {} underweight by {:.1}%, score {:.2}",
                    security.geography,
                    underweight * 100.0,
                    score
                ),
                tags: vec!["rebalance_buys".to_string()],
                category: Category::RebalanceBuys,
            });
        }

        result.candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
        result.pre_filtered = collector.result();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpportunityContextBuilder;
    use portfolio_core::{Currency, Isin, Symbol};
    use crate::data::Security;

    fn security(isin: &str, geography: &str) -> Security {
        Security {
            isin: Isin::new(isin),
            symbol: Symbol::new("TEST.US"),
            name: "Test Corp".into(),
            currency: Currency::USD,
            geography: geography.into(),
            industry: "Technology".into(),
            min_lot: 1,
            allow_buy: true,
            allow_sell: true,
        }
    }

    #[test]
    fn buys_into_an_underweight_country() {
        let isin = Isin::new("JP1234567890");
        let mut allocation = crate::context::Allocation::default();
        allocation.country_weights.insert("JP".to_string(), 0.05);
        allocation.target_country_weights.insert("JP".to_string(), 0.15);

        let mut signals = crate::context::Signals::default();
        signals.opportunity_scores.insert(isin.clone(), 0.80);
        signals.fundamentals_scores.insert(isin.clone(), 0.80);

        let mut ctx = OpportunityContextBuilder::new()
            .total_portfolio_value_eur(100_000.0)
            .available_cash_eur(50_000.0)
            .add_security(security("JP1234567890", "JP"))
            .allocation(allocation)
            .signals(signals)
            .build()
            .unwrap();
        ctx.portfolio.current_prices.insert(isin, 50.0);

        let mut config = PlannerConfig::default();
        config
            .calculator_params
            .insert("rebalance_buys".to_string(), Some(serde_json::json!({ "max_value_per_position": 5000.0 })));

        let result = RebalanceBuysCalculator.calculate(&ctx, &config).unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].side, Side::Buy);
    }

    #[test]
    fn below_threshold_underweight_yields_no_candidates() {
        let mut allocation = crate::context::Allocation::default();
        allocation.country_weights.insert("JP".to_string(), 0.12);
        allocation.target_country_weights.insert("JP".to_string(), 0.15);

        let ctx = OpportunityContextBuilder::new()
            .total_portfolio_value_eur(100_000.0)
            .add_security(security("JP1234567890", "JP"))
            .allocation(allocation)
            .build()
            .unwrap();

        let config = PlannerConfig::default();
        let result = RebalanceBuysCalculator.calculate(&ctx, &config).unwrap();
        assert!(result.candidates.is_empty());
    }
}
