//! Decision, consolidation and rebalance execution.

mod consolidation;
mod decision;
mod rebalance;

pub use consolidation::{BalanceConsolidator, ConsolidatedBalance};
pub use decision::{Decision, DecisionConfig, DecisionEngine};
pub use rebalance::{RebalanceOrchestrator, RebalanceResult};
