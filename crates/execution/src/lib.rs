//! Rebalance decision-and-execution engine.
//!
//! This crate provides the control loop for one concentrated-liquidity
//! position:
//! - Position state reading
//! - Rebalance decisions with boundary safety margins
//! - Balance record consolidation
//! - Transaction sequencing with bounded retries
//! - Timer-driven scheduling
//! - Position lifecycle tracking

/// Prelude module for convenient imports.
pub mod prelude;

/// Orchestrator configuration.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Position lifecycle tracking.
pub mod lifecycle;
/// Position state reading.
pub mod monitor;
/// Retry primitive shared by ledger-facing calls.
pub mod retry;
/// Scheduler driving check cycles.
pub mod scheduler;
/// Decision, consolidation and rebalance execution.
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;
