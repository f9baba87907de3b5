//! Opportunity Buys (§4.11.3) — opens or adds to positions on a high
//! opportunity score.

use portfolio_core::round_to_lot;

use crate::calculators::support;
use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{ActionCandidate, CalculatorResult, Category, Side};
use crate::error::EngineError;
use crate::exclusions::ExclusionCollector;
use crate::gates::{guardrail, priority, quality_gate};
use crate::params::{get_bool, get_f64, get_i64};

/// Surfaces new BUY candidates ranked by opportunity score, subject to the
/// quality gate and the concentration guardrail.
pub struct OpportunityBuysCalculator;

impl Calculator for OpportunityBuysCalculator {
    fn name(&self) -> &str {
        "opportunity_buys"
    }

    fn category(&self) -> Category {
        Category::OpportunityBuys
    }

    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
        let mut result = CalculatorResult::empty();
        if !ctx.policy.allow_buy {
            return Ok(result);
        }

        let bag = config.params_for(self.name());
        let min_score = get_f64(&bag, "min_score", 0.65);
        let max_value_per_position = get_f64(&bag, "max_value_per_position", f64::INFINITY);
        let max_positions = get_i64(&bag, "max_positions", 5).max(0) as usize;
        let exclude_existing = get_bool(&bag, "exclude_existing", false);
        let max_cost_ratio = get_f64(&bag, "max_cost_ratio", 0.01);

        let regime = support::regime(ctx);
        let mut collector = ExclusionCollector::new(self.name(), ctx);
        let min_trade = ctx.calculate_min_trade_amount(max_cost_ratio);

        let mut candidates: Vec<(_, f64)> = if config.enable_tag_filtering && ctx.tag_filter.enabled {
            ctx.universe
                .securities
                .iter()
                .filter(|s| ctx.tag_filter.opportunity_candidates.contains(&s.symbol))
                .filter_map(|s| ctx.signals.opportunity_scores.get(&s.isin).map(|&score| (s, score)))
                .collect()
        } else {
            ctx.universe
                .securities
                .iter()
                .filter_map(|s| ctx.signals.opportunity_scores.get(&s.isin).map(|&score| (s, score)))
                .collect()
        };

        candidates.retain(|(security, score)| {
            if *score < min_score {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "below minimum score");
                return false;
            }
            if ctx.cooling_off.recently_bought_isins.contains(&security.isin) {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "recently bought");
                return false;
            }
            if exclude_existing && ctx.position(&security.isin).is_some() {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "already held");
                return false;
            }
            true
        });

        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(max_positions);

        for (security, score) in candidates {
            if !security.allow_buy {
                collector.add(&security.isin, security.symbol.as_str(), &security.name, "buy not allowed");
                continue;
            }

            let Some(expected_return) = ctx.signals.expected_returns.get(&security.isin).copied() else {
                collector.add(
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    "below minimum expected return",
                );
                continue;
            };

            let threshold = ctx.policy.target_return * ctx.policy.target_return_threshold_pct;
            let mut adjusted_score = score;
            if expected_return < threshold && threshold > 0.0 {
                let deficit = ((threshold - expected_return) / threshold).clamp(0.0, 1.0);
                adjusted_score *= 1.0 - deficit * 0.20;
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

            let kelly_value = ctx
                .signals
                .kelly_sizes
                .get(&security.isin)
                .map(|k| k * ctx.portfolio.total_portfolio_value_eur);
            let mut target_value = max_value_per_position;
            if let Some(kelly_value) = kelly_value {
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
                collector.add(
                    &security.isin,
                    security.symbol.as_str(),
                    &security.name,
                    "insufficient cash",
                );
                continue;
            }

            let mut candidate_priority = priority::adjust(
                adjusted_score,
                Category::OpportunityBuys,
                tags,
                regime,
                support::has_quantum_warning(tags),
                &config.calculator_boosts,
            );
            candidate_priority = candidate_priority.min(1.0);

            result.candidates.push(ActionCandidate {
                side: Side::Buy,
                isin: security.isin.clone(),
                symbol: security.symbol.clone(),
                name: security.name.clone(),
                quantity,
                price: current_price,
                value_eur,
                currency: security.currency,
                priority: candidate_priority,
                reason: format!("Opportunity buy: score {:.2}", score),
                tags: vec!["opportunity_buys".to_string()],
                category: Category::OpportunityBuys,
            });
        }

        result.candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
        result.pre_filtered = collector.result();
        Ok(result)
    }
}
