//! Exclusion collector — accumulates structured pre-filtered-security
//! reports for a single calculator invocation.

use portfolio_core::Isin;
use std::collections::HashMap;

use crate::context::OpportunityContext;
use crate::data::{ExclusionReason, PreFilteredSecurity};

/// Accumulates rejection reasons for one calculator run.
///
/// Not thread-safe — each calculator owns its own collector for the
/// duration of its `calculate` call, matching the single-threaded,
/// sequential execution model of §5.
pub struct ExclusionCollector<'a> {
    calculator: String,
    ctx: &'a OpportunityContext,
    order: Vec<Isin>,
    entries: HashMap<Isin, PreFilteredSecurity>,
}

impl<'a> ExclusionCollector<'a> {
    /// Creates a collector for `calculator`, reading dismissed-filter
    /// overrides from `ctx`.
    pub fn new(calculator: impl Into<String>, ctx: &'a OpportunityContext) -> Self {
        Self {
            calculator: calculator.into(),
            ctx,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Records a rejection. A call with an empty `isin` is silently
    /// ignored. Duplicate `(isin, reason)` pairs are deduplicated; a
    /// security may still accumulate several distinct reasons.
    pub fn add(&mut self, isin: &Isin, symbol: &str, name: &str, reason: impl Into<String>) {
        if isin.is_empty() {
            return;
        }
        let reason = reason.into();
        let dismissed = self
            .ctx
            .dismissed_reasons(isin, &self.calculator)
            .iter()
            .any(|r| r == &reason);

        if !self.entries.contains_key(isin) {
            self.order.push(isin.clone());
            self.entries.insert(
                isin.clone(),
                PreFilteredSecurity {
                    isin: isin.clone(),
                    symbol: symbol.into(),
                    name: name.to_string(),
                    calculator: self.calculator.clone(),
                    reasons: Vec::new(),
                },
            );
        }
        let entry = self.entries.get_mut(isin).expect("just inserted above");

        if !entry.reasons.iter().any(|r| r.reason == reason) {
            entry.reasons.push(ExclusionReason { reason, dismissed });
        }
    }

    /// Returns the accumulated exclusions in first-seen ISIN order.
    pub fn result(self) -> Vec<PreFilteredSecurity> {
        self.order
            .into_iter()
            .filter_map(|isin| self.entries.get(&isin).cloned())
            .collect()
    }
}
