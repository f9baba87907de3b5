//! Calculator registry (§4.12, §5) — registers calculators, resolves the
//! enabled subset from configuration, runs them in order, merges results by
//! category, and reports hierarchical progress to an optional observer.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::calculators::Calculator;
use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{CalculatorResult, Category};
use crate::data::ActionCandidate;
use crate::error::EngineError;

/// One before/after progress notification for a single calculator
/// invocation (§4.12, §6.2).
#[derive(Clone, Debug, Default)]
pub struct ProgressUpdate {
    /// Always `"opportunity_identification"` for this registry.
    pub phase: String,
    /// The calculator's stable name.
    pub sub_phase: String,
    /// 1-based index of the calculator within this run.
    pub current: usize,
    /// Total number of calculators enabled for this run.
    pub total: usize,
    /// `"Running X"` before, `"Completed X"` after.
    pub message: String,
    /// Free-form counts: `candidates`, `pre_filtered`, `total_candidates`,
    /// `total_pre_filtered`.
    pub details: HashMap<String, usize>,
}

/// Per-category results in calculator registration/execution order.
///
/// A plain `HashMap` would not preserve that order (§5: "the order of
/// categories in the returned map reflects the registration … order"), so
/// results are merged into this order-preserving list instead; a category
/// first produced by the third enabled calculator sits third in the list
/// regardless of `Category`'s own enum discriminant order.
pub type CategoryResults = Vec<(Category, CalculatorResult)>;

fn merge_category(results: &mut CategoryResults, category: Category, result: CalculatorResult) {
    match results.iter_mut().find(|(c, _)| *c == category) {
        Some((_, existing)) => existing.append(result),
        None => results.push((category, result)),
    }
}

/// Registers [`Calculator`] implementations under their stable names and
/// drives planning runs against them.
///
/// Reads (`get`, `get_enabled`, `identify_opportunities*`) take a shared
/// lock; `register` takes the exclusive lock.
pub struct CalculatorRegistry {
    calculators: RwLock<HashMap<String, Box<dyn Calculator>>>,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            calculators: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry pre-populated with all six §4.11 calculators
    /// under their default names.
    pub fn with_default_calculators() -> Self {
        let registry = Self::new();
        registry.register(Box::new(crate::calculators::ProfitTakingCalculator));
        registry.register(Box::new(crate::calculators::AveragingDownCalculator));
        registry.register(Box::new(crate::calculators::OpportunityBuysCalculator));
        registry.register(Box::new(crate::calculators::WeightBasedCalculator));
        registry.register(Box::new(crate::calculators::RebalanceSellsCalculator));
        registry.register(Box::new(crate::calculators::RebalanceBuysCalculator));
        registry
    }

    /// Inserts `calculator`, keyed by its own [`Calculator::name`].
    /// Re-registering a name replaces the previous entry.
    pub fn register(&self, calculator: Box<dyn Calculator>) {
        let mut calculators = self.calculators.write().expect("registry lock poisoned");
        calculators.insert(calculator.name().to_string(), calculator);
    }

    /// Looks up a registered calculator's category by name, or `None` if
    /// unregistered.
    pub fn category_of(&self, name: &str) -> Option<Category> {
        let calculators = self.calculators.read().expect("registry lock poisoned");
        calculators.get(name).map(|c| c.category())
    }

    /// Whether `name` has a registered calculator.
    pub fn contains(&self, name: &str) -> bool {
        let calculators = self.calculators.read().expect("registry lock poisoned");
        calculators.contains_key(name)
    }

    /// Names of every calculator in `config.enabled_calculators` that is
    /// actually registered, in configured order; unregistered names are
    /// dropped (the caller is expected to have already logged them via
    /// [`Self::identify_opportunities_with_progress`] or similar).
    fn resolve_enabled<'a>(&self, config: &'a PlannerConfig) -> Vec<String> {
        let calculators = self.calculators.read().expect("registry lock poisoned");
        config
            .enabled_calculators
            .iter()
            .filter(|name| {
                let known = calculators.contains_key(name.as_str());
                if !known {
                    tracing::warn!(calculator = %name, "enabled_calculators names an unregistered calculator, skipping");
                }
                known
            })
            .cloned()
            .collect()
    }

    /// Backward-compatible entry point: returns only the flattened
    /// candidate list across every enabled calculator, in category-then-
    /// calculator-then-priority order.
    pub fn identify_opportunities(
        &self,
        ctx: &OpportunityContext,
        config: &PlannerConfig,
    ) -> Vec<ActionCandidate> {
        self.identify_opportunities_with_exclusions(ctx, config)
            .into_iter()
            .flat_map(|(_, result)| result.candidates)
            .collect()
    }

    /// Runs every enabled calculator in order, merging calculators that
    /// share a category by appending their results (candidates then
    /// pre-filtered, in calculator execution order).
    pub fn identify_opportunities_with_exclusions(
        &self,
        ctx: &OpportunityContext,
        config: &PlannerConfig,
    ) -> CategoryResults {
        self.run(ctx, config, |_| {}).0
    }

    /// Same as [`Self::identify_opportunities_with_exclusions`], but invokes
    /// `on_progress` twice per calculator: once before running it and once
    /// after, per the §4.12 progress contract. `current <= total` always;
    /// when no calculators are enabled, `on_progress` is never called.
    pub fn identify_opportunities_with_progress(
        &self,
        ctx: &OpportunityContext,
        config: &PlannerConfig,
        mut on_progress: impl FnMut(ProgressUpdate),
    ) -> CategoryResults {
        self.run(ctx, config, &mut on_progress).0
    }

    /// Core execution loop shared by every public entry point. Returns the
    /// merged per-category results and the count of calculators actually
    /// executed (for callers that want to confirm none were skipped by
    /// cancellation, which this single-invocation API does not itself
    /// model — see §5 for the cancellation contract owned by the caller).
    fn run(
        &self,
        ctx: &OpportunityContext,
        config: &PlannerConfig,
        mut on_progress: impl FnMut(ProgressUpdate),
    ) -> (CategoryResults, usize) {
        let enabled = self.resolve_enabled(config);
        let total = enabled.len();
        let mut merged: CategoryResults = Vec::new();
        let mut cumulative_candidates = 0usize;
        let mut cumulative_pre_filtered = 0usize;

        for (index, name) in enabled.iter().enumerate() {
            let current = index + 1;

            on_progress(ProgressUpdate {
                phase: "opportunity_identification".to_string(),
                sub_phase: name.clone(),
                current,
                total,
                message: format!("Running {name}"),
                details: HashMap::from([
                    ("candidates_so_far".to_string(), cumulative_candidates),
                    ("pre_filtered_so_far".to_string(), cumulative_pre_filtered),
                ]),
            });

            let outcome = {
                let calculators = self.calculators.read().expect("registry lock poisoned");
                let calculator = calculators.get(name.as_str()).expect("resolved from enabled list");
                calculator.calculate(ctx, config)
            };

            let (category, result) = match outcome {
                Ok(result) => {
                    let category = self.category_of(name).expect("resolved from enabled list");
                    (category, result)
                }
                Err(err) => {
                    tracing::error!(calculator = %name, error = %err, "calculator failed, skipping");
                    continue;
                }
            };

            cumulative_candidates += result.candidates.len();
            cumulative_pre_filtered += result.pre_filtered.len();

            on_progress(ProgressUpdate {
                phase: "opportunity_identification".to_string(),
                sub_phase: name.clone(),
                current,
                total,
                message: format!("Completed {name}"),
                details: HashMap::from([
                    ("candidates".to_string(), result.candidates.len()),
                    ("pre_filtered".to_string(), result.pre_filtered.len()),
                    ("total_candidates".to_string(), cumulative_candidates),
                    ("total_pre_filtered".to_string(), cumulative_pre_filtered),
                ]),
            });

            merge_category(&mut merged, category, result);
        }

        (merged, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OpportunityContextBuilder;

    struct StubCalculator {
        name: &'static str,
        category: Category,
        fails: bool,
    }

    impl Calculator for StubCalculator {
        fn name(&self) -> &str {
            self.name
        }

        fn category(&self) -> Category {
            self.category
        }

        fn calculate(&self, _ctx: &OpportunityContext, _config: &PlannerConfig) -> Result<CalculatorResult, EngineError> {
            if self.fails {
                return Err(EngineError::TagFilterUnavailable {
                    calculator: self.name.to_string(),
                });
            }
            Ok(CalculatorResult::empty())
        }
    }

    fn ctx() -> OpportunityContext {
        OpportunityContextBuilder::new().build().unwrap()
    }

    #[test]
    fn register_then_lookup_by_name() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        assert!(registry.contains("profit_taking"));
        assert_eq!(registry.category_of("profit_taking"), Some(Category::ProfitTaking));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn unregistered_enabled_name_is_skipped_not_fatal() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["profit_taking".to_string(), "bogus".to_string()];
        let result = registry.identify_opportunities_with_exclusions(&ctx(), &config);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_enabled_list_fires_no_progress_callbacks() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        let config = PlannerConfig::default();
        let mut calls = 0;
        registry.identify_opportunities_with_progress(&ctx(), &config, |_| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn progress_fires_twice_per_calculator_with_current_never_decreasing() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        registry.register(Box::new(StubCalculator {
            name: "averaging_down",
            category: Category::AveragingDown,
            fails: false,
        }));
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["profit_taking".to_string(), "averaging_down".to_string()];

        let mut updates = Vec::new();
        registry.identify_opportunities_with_progress(&ctx(), &config, |update| updates.push(update));

        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].message, "Running profit_taking");
        assert_eq!(updates[1].message, "Completed profit_taking");
        assert_eq!(updates[2].message, "Running averaging_down");
        assert_eq!(updates[3].message, "Completed averaging_down");
        for window in updates.windows(2) {
            assert!(window[1].current >= window[0].current);
        }
        let last = updates.last().unwrap();
        assert_eq!(last.current, last.total);
    }

    #[test]
    fn failing_calculator_is_logged_and_skipped_not_fatal() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "broken",
            category: Category::OpportunityBuys,
            fails: true,
        }));
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["broken".to_string(), "profit_taking".to_string()];
        let result = registry.identify_opportunities_with_exclusions(&ctx(), &config);
        assert_eq!(result.len(), 1);
        assert!(result.iter().any(|(category, _)| *category == Category::ProfitTaking));
    }

    #[test]
    fn calculators_sharing_a_category_are_appended() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "a",
            category: Category::ProfitTaking,
            fails: false,
        }));
        registry.register(Box::new(StubCalculator {
            name: "b",
            category: Category::ProfitTaking,
            fails: false,
        }));
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec!["a".to_string(), "b".to_string()];
        let result = registry.identify_opportunities_with_exclusions(&ctx(), &config);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn category_order_matches_enabled_calculator_order_not_hash_order() {
        let registry = CalculatorRegistry::new();
        registry.register(Box::new(StubCalculator {
            name: "rebalance_buys",
            category: Category::RebalanceBuys,
            fails: false,
        }));
        registry.register(Box::new(StubCalculator {
            name: "profit_taking",
            category: Category::ProfitTaking,
            fails: false,
        }));
        registry.register(Box::new(StubCalculator {
            name: "averaging_down",
            category: Category::AveragingDown,
            fails: false,
        }));
        let mut config = PlannerConfig::default();
        config.enabled_calculators = vec![
            "rebalance_buys".to_string(),
            "profit_taking".to_string(),
            "averaging_down".to_string(),
        ];

        for _ in 0..8 {
            let result = registry.identify_opportunities_with_exclusions(&ctx(), &config);
            let categories: Vec<Category> = result.iter().map(|(c, _)| *c).collect();
            assert_eq!(
                categories,
                vec![Category::RebalanceBuys, Category::ProfitTaking, Category::AveragingDown]
            );
        }
    }

    #[test]
    fn with_default_calculators_registers_all_six() {
        let registry = CalculatorRegistry::with_default_calculators();
        assert!(registry.contains("profit_taking"));
        assert!(registry.contains("averaging_down"));
        assert!(registry.contains("opportunity_buys"));
        assert!(registry.contains("weight_based"));
        assert!(registry.contains("rebalance_sells"));
        assert!(registry.contains("rebalance_buys"));
    }
}
