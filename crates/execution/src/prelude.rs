//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_rebalancer_execution::prelude::*;
//! ```

// Config
pub use crate::config::{RangePolicy, RebalanceConfig, SizingPolicy};

// Error
pub use crate::error::RebalanceError;

// Lifecycle
pub use crate::lifecycle::{
    EventData, LifecycleEvent, LifecycleEventType, LifecycleStats, LifecycleTracker,
    RebalanceReason,
};

// Monitor
pub use crate::monitor::{CheckSnapshot, PositionStateReader};

// Retry
pub use crate::retry::{RetryExhausted, RetryPolicy, retry_with_delay};

// Scheduler
pub use crate::scheduler::{BotStatus, RebalanceBot};

// Strategy
pub use crate::strategy::{
    BalanceConsolidator, Decision, DecisionConfig, DecisionEngine, RebalanceOrchestrator,
    RebalanceResult,
};
