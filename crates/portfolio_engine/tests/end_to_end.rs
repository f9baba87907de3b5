//! End-to-end tests driving the real calculator registry against small
//! fixture portfolios, covering the cross-cutting §8 testable properties
//! that no single calculator's unit tests exercise on their own:
//! determinism across repeated runs, and category merging across the full
//! default calculator set.

use portfolio_core::{Currency, Isin, Symbol};
use portfolio_engine::context::OpportunityContextBuilder;
use portfolio_engine::data::{EnrichedPosition, Security};
use portfolio_engine::{CalculatorRegistry, PlannerConfig};

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

fn position(isin: &str, quantity: f64, average_cost: f64, current_price: f64, geography: &str) -> EnrichedPosition {
    EnrichedPosition {
        isin: Isin::new(isin),
        symbol: Symbol::new("TEST.US"),
        name: "Test Corp".into(),
        quantity,
        average_cost,
        current_price,
        market_value_eur: quantity * current_price,
        weight_in_portfolio: 0.1,
        currency: Currency::USD,
        geography: geography.into(),
        industry: "Technology".into(),
        min_lot: 1,
        allow_buy: true,
        allow_sell: true,
    }
}

#[test]
fn same_context_and_config_yield_identical_results_across_runs() {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(100_000.0)
        .available_cash_eur(10_000.0)
        .add_security(security("US1234567890", "US"))
        .add_position(position("US1234567890", 1000.0, 10.0, 15.0, "US"))
        .build()
        .unwrap();

    let mut config = PlannerConfig::default();
    config.enabled_calculators = vec!["profit_taking".to_string()];

    let registry = CalculatorRegistry::with_default_calculators();
    let first = registry.identify_opportunities(&ctx, &config);
    let second = registry.identify_opportunities(&ctx, &config);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.isin, b.isin);
        assert_eq!(a.quantity, b.quantity);
        assert!((a.priority - b.priority).abs() < 1e-12);
    }
}

#[test]
fn disabled_calculator_contributes_nothing_and_policy_gate_holds() {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(100_000.0)
        .available_cash_eur(10_000.0)
        .add_security(security("US1234567890", "US"))
        .add_position(position("US1234567890", 1000.0, 10.0, 15.0, "US"))
        .build()
        .unwrap();

    let config = PlannerConfig::default(); // enabled_calculators is empty
    let registry = CalculatorRegistry::with_default_calculators();
    let result = registry.identify_opportunities_with_exclusions(&ctx, &config);
    assert!(result.is_empty());
}

#[test]
fn progress_reports_reach_total_for_a_multi_calculator_run() {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(100_000.0)
        .available_cash_eur(10_000.0)
        .add_security(security("US1234567890", "US"))
        .add_position(position("US1234567890", 1000.0, 10.0, 15.0, "US"))
        .build()
        .unwrap();

    let mut config = PlannerConfig::default();
    config.enabled_calculators = vec!["profit_taking".to_string(), "averaging_down".to_string()];

    let registry = CalculatorRegistry::with_default_calculators();
    let mut last_current = 0;
    let mut last_total = 0;
    registry.identify_opportunities_with_progress(&ctx, &config, |update| {
        assert!(update.current >= last_current);
        last_current = update.current;
        last_total = update.total;
    });
    assert_eq!(last_current, last_total);
    assert_eq!(last_total, 2);
}

#[test]
fn every_buy_candidate_clears_the_lot_size_invariant() {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(100_000.0)
        .available_cash_eur(50_000.0)
        .add_security(security("US1234567890", "US"))
        .add_position(position("US1234567890", 100.0, 20.0, 15.0, "US"))
        .build()
        .unwrap();

    let mut config = PlannerConfig::default();
    config.enabled_calculators = vec!["averaging_down".to_string()];

    let registry = CalculatorRegistry::with_default_calculators();
    let candidates = registry.identify_opportunities(&ctx, &config);
    for candidate in candidates {
        assert_eq!(candidate.quantity % 1, 0);
        assert!(candidate.quantity >= 1);
    }
}

#[test]
fn category_order_is_stable_across_runs_with_several_calculators_enabled() {
    let ctx = OpportunityContextBuilder::new()
        .total_portfolio_value_eur(100_000.0)
        .available_cash_eur(50_000.0)
        .add_security(security("US1234567890", "US"))
        .add_position(position("US1234567890", 1000.0, 10.0, 15.0, "US"))
        .add_security(security("US0987654321", "US"))
        .add_position(position("US0987654321", 100.0, 20.0, 15.0, "US"))
        .build()
        .unwrap();

    let mut config = PlannerConfig::default();
    config.enabled_calculators = vec![
        "averaging_down".to_string(),
        "profit_taking".to_string(),
        "weight_based".to_string(),
    ];

    let registry = CalculatorRegistry::with_default_calculators();
    let first = registry.identify_opportunities_with_exclusions(&ctx, &config);
    let second = registry.identify_opportunities_with_exclusions(&ctx, &config);

    let first_order: Vec<_> = first.iter().map(|(category, _)| *category).collect();
    let second_order: Vec<_> = second.iter().map(|(category, _)| *category).collect();
    assert_eq!(first_order, second_order);
    assert_eq!(
        first_order,
        vec![
            portfolio_engine::data::Category::AveragingDown,
            portfolio_engine::data::Category::ProfitTaking,
            portfolio_engine::data::Category::WeightBased,
        ]
    );
}
