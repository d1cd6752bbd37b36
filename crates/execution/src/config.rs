//! Orchestrator configuration.
//!
//! Built once at process start, validated, then handed to the orchestrator
//! by value. Nothing in the core reads configuration from the environment.

use crate::error::RebalanceError;
use crate::retry::RetryPolicy;
use clmm_rebalancer_domain::entities::PoolSnapshot;
use clmm_rebalancer_domain::math::calculate_optimal_range;
use clmm_rebalancer_domain::value_objects::TickRange;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the target range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    /// One tick-spacing unit anchored at or below the current tick.
    Tightest,
    /// A total width of ticks centred on the current tick.
    Centered {
        /// Total width in ticks.
        width: i32,
    },
    /// Always the same range.
    Fixed(TickRange),
}

impl RangePolicy {
    /// Computes the target range for the pool's current tick.
    pub fn target(&self, pool: &PoolSnapshot) -> Result<TickRange, RebalanceError> {
        let range = match self {
            Self::Tightest => calculate_optimal_range(pool.current_tick, pool.tick_spacing, None)?,
            Self::Centered { width } => {
                calculate_optimal_range(pool.current_tick, pool.tick_spacing, Some(*width))?
            }
            Self::Fixed(range) => {
                if !range.is_aligned(pool.tick_spacing) {
                    return Err(RebalanceError::Configuration(format!(
                        "fixed range {range} is not aligned to tick spacing {}",
                        pool.tick_spacing
                    )));
                }
                *range
            }
        };
        Ok(range)
    }
}

/// How much of each token goes into a new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizingPolicy {
    /// Operator-configured raw amounts.
    Fixed {
        /// Token A amount.
        amount_a: u64,
        /// Token B amount.
        amount_b: u64,
    },
    /// A fraction in (0, 1] of the consolidated wallet balance.
    BalanceFraction(Decimal),
}

impl SizingPolicy {
    /// Share of `balance` to deposit under a balance-fraction policy.
    #[must_use]
    pub fn fraction_of(fraction: Decimal, balance: u64) -> u64 {
        (Decimal::from(balance) * fraction)
            .floor()
            .to_u64()
            .unwrap_or(balance)
    }
}

/// Settings of the rebalance orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceConfig {
    /// Pool to manage.
    pub pool_id: String,
    /// Position to track. `None` selects the wallet's first position in the pool.
    pub position_id: Option<String>,
    /// Fraction of the range width treated as the boundary safety margin.
    pub rebalance_threshold: Decimal,
    /// Target range policy.
    pub range_policy: RangePolicy,
    /// Deposit sizing policy.
    pub sizing: SizingPolicy,
    /// Slippage tolerance in basis points.
    pub slippage_bps: u16,
    /// Retry policy for remove/add transactions.
    pub retry: RetryPolicy,
    /// Wait between a merge and each verification query.
    pub settle_delay: Duration,
    /// Compute and log the intended action without submitting anything.
    pub dry_run: bool,
}

impl RebalanceConfig {
    /// Creates a configuration with defaults for everything but the pool.
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            position_id: None,
            rebalance_threshold: Decimal::new(5, 2), // 5%
            range_policy: RangePolicy::Tightest,
            sizing: SizingPolicy::BalanceFraction(Decimal::new(9, 1)), // 90%
            slippage_bps: 100,
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(2),
            dry_run: false,
        }
    }

    /// Checks every setting once, before the control loop starts.
    pub fn validate(&self) -> Result<(), RebalanceError> {
        let invalid = |msg: String| Err(RebalanceError::Configuration(msg));

        if self.pool_id.trim().is_empty() {
            return invalid("pool address is required".to_string());
        }
        if let Some(id) = &self.position_id
            && id.trim().is_empty()
        {
            return invalid("position id must not be empty".to_string());
        }
        if self.rebalance_threshold <= Decimal::ZERO || self.rebalance_threshold >= Decimal::ONE {
            return invalid(format!(
                "rebalance threshold must be in (0, 1), got {}",
                self.rebalance_threshold
            ));
        }
        match self.range_policy {
            RangePolicy::Centered { width } if width <= 0 => {
                return invalid(format!("range width must be positive, got {width}"));
            }
            RangePolicy::Fixed(range) if range.lower >= range.upper => {
                return invalid(format!("fixed range {range} is empty"));
            }
            _ => {}
        }
        if let SizingPolicy::BalanceFraction(fraction) = self.sizing
            && (fraction <= Decimal::ZERO || fraction > Decimal::ONE)
        {
            return invalid(format!("balance fraction must be in (0, 1], got {fraction}"));
        }
        if self.slippage_bps > 10_000 {
            return invalid(format!(
                "slippage must not exceed 10000 bps, got {}",
                self.slippage_bps
            ));
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
