//! Calculator categories.

use serde::{Deserialize, Serialize};

/// The category a calculator's output belongs to.
///
/// Multiple calculators may share a category (none currently do, but the
/// registry supports it per §4.12): their results are appended together
/// rather than overwriting one another.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Trimming a position that has gained significantly.
    ProfitTaking,
    /// Adding to a position trading at a meaningful loss.
    AveragingDown,
    /// Opening or adding to a position on a high opportunity score.
    OpportunityBuys,
    /// Selling down an overweight geography.
    RebalanceSells,
    /// Buying into an underweight country group.
    RebalanceBuys,
    /// Trading toward an explicit per-security target weight.
    WeightBased,
}

impl Category {
    /// Stable string name used for configuration (`enabled_calculators`)
    /// and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ProfitTaking => "profit_taking",
            Category::AveragingDown => "averaging_down",
            Category::OpportunityBuys => "opportunity_buys",
            Category::RebalanceSells => "rebalance_sells",
            Category::RebalanceBuys => "rebalance_buys",
            Category::WeightBased => "weight_based",
        }
    }
}
