//! The `Calculator` trait and the six calculator implementations (§4.11).

mod averaging_down;
mod opportunity_buys;
mod profit_taking;
mod rebalance_buys;
mod rebalance_sells;
mod support;
mod weight_based;

pub use averaging_down::AveragingDownCalculator;
pub use opportunity_buys::OpportunityBuysCalculator;
pub use profit_taking::ProfitTakingCalculator;
pub use rebalance_buys::RebalanceBuysCalculator;
pub use rebalance_sells::RebalanceSellsCalculator;
pub use weight_based::WeightBasedCalculator;

use crate::config::PlannerConfig;
use crate::context::OpportunityContext;
use crate::data::{CalculatorResult, Category};
use crate::error::EngineError;

/// A single category's opportunity-identification logic.
///
/// Implementations never panic and never block: the context is fully
/// materialized before `calculate` is called, and the only error surface is
/// an unavailable tag-filter collaborator (§7).
pub trait Calculator: Send + Sync {
    /// Stable name used for `enabled_calculators` config and logging.
    fn name(&self) -> &str;

    /// The category this calculator's output belongs to.
    fn category(&self) -> Category;

    /// Runs the calculator against `ctx`, honoring `config`.
    fn calculate(&self, ctx: &OpportunityContext, config: &PlannerConfig) -> Result<CalculatorResult, EngineError>;
}
