//! Rebalance decisions.

use crate::config::RangePolicy;
use crate::error::RebalanceError;
use crate::lifecycle::RebalanceReason;
use clmm_rebalancer_domain::entities::{PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::value_objects::TickRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings of the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Fraction of the range width treated as the boundary safety margin.
    pub rebalance_threshold: Decimal,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            rebalance_threshold: Decimal::new(5, 2), // 5%
        }
    }
}

/// What a check cycle should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The position is comfortably in range.
    Hold,
    /// The wallet has no position in the pool; open one at `target`.
    Open {
        /// Range of the new position.
        target: TickRange,
    },
    /// Move the position to `target`.
    Rebalance {
        /// Range of the replacement position.
        target: TickRange,
        /// Why the move is needed.
        reason: RebalanceReason,
    },
    /// A move is warranted but the fresh target is within one tick-spacing
    /// unit of the current range on both bounds.
    Unchanged {
        /// The position's current range.
        range: TickRange,
    },
}

/// Decides whether a position needs to move.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    /// Creates a decision engine.
    #[must_use]
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// Returns the reason to rebalance, if any.
    ///
    /// An out-of-range flag always wins. Otherwise the position is moved when
    /// the current tick is closer than `threshold * width` to either bound.
    #[must_use]
    pub fn rebalance_reason(
        &self,
        position: &PositionSnapshot,
        pool: &PoolSnapshot,
    ) -> Option<RebalanceReason> {
        if !position.in_range {
            return Some(RebalanceReason::OutOfRange);
        }

        let tick = i64::from(pool.current_tick);
        let lower = i64::from(position.tick_lower);
        let upper = i64::from(position.tick_upper);
        let margin = self.config.rebalance_threshold * Decimal::from(upper - lower);

        let to_lower = Decimal::from(tick - lower);
        let to_upper = Decimal::from(upper - tick);

        if to_lower < margin || to_upper < margin {
            debug!(
                tick,
                lower,
                upper,
                margin = %margin,
                "Current tick inside boundary margin"
            );
            return Some(RebalanceReason::NearBoundary);
        }
        None
    }

    /// Whether the position should be rebalanced.
    #[must_use]
    pub fn should_rebalance(&self, position: &PositionSnapshot, pool: &PoolSnapshot) -> bool {
        self.rebalance_reason(position, pool).is_some()
    }

    /// Full decision for one check, including the no-op skip.
    pub fn decide(
        &self,
        position: Option<&PositionSnapshot>,
        pool: &PoolSnapshot,
        policy: &RangePolicy,
    ) -> Result<Decision, RebalanceError> {
        let Some(position) = position else {
            return Ok(Decision::Open {
                target: policy.target(pool)?,
            });
        };

        let Some(reason) = self.rebalance_reason(position, pool) else {
            return Ok(Decision::Hold);
        };

        let current = position.range();
        let target = policy.target(pool)?;
        if current.is_within_spacing_of(&target, pool.tick_spacing) {
            return Ok(Decision::Unchanged { range: current });
        }

        Ok(Decision::Rebalance { target, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::position;
    use rust_decimal_macros::dec;

    fn pool_at(tick: i32) -> PoolSnapshot {
        PoolSnapshot::new("pool", tick, 1 << 64, 10, "mint-a", "mint-b").unwrap()
    }

    fn observed(lower: i32, upper: i32, tick: i32) -> PositionSnapshot {
        PositionSnapshot::observe("pos", "pool", lower, upper, 1_000, tick).unwrap()
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(DecisionConfig {
            rebalance_threshold: dec!(0.05),
        })
    }

    #[test]
    fn test_centered_position_holds() {
        assert!(!engine().should_rebalance(&observed(-1000, 1000, 0), &pool_at(0)));
    }

    #[test]
    fn test_near_lower_boundary_rebalances() {
        let reason = engine().rebalance_reason(&observed(-1000, 1000, -950), &pool_at(-950));
        assert_eq!(reason, Some(RebalanceReason::NearBoundary));
    }

    #[test]
    fn test_near_upper_boundary_rebalances() {
        assert!(engine().should_rebalance(&observed(-1000, 1000, 901), &pool_at(901)));
        assert!(!engine().should_rebalance(&observed(-1000, 1000, 900), &pool_at(900)));
    }

    #[test]
    fn test_out_of_range_flag_wins() {
        // Stale flag: tick is centred but the protocol says out of range.
        let mut stale = position("pos", "pool", -1000, 1000, 1_000);
        stale.in_range = false;
        let reason = engine().rebalance_reason(&stale, &pool_at(0));
        assert_eq!(reason, Some(RebalanceReason::OutOfRange));
    }

    #[test]
    fn test_decide_opens_without_position() {
        let decision = engine()
            .decide(None, &pool_at(15), &RangePolicy::Tightest)
            .unwrap();
        assert_eq!(
            decision,
            Decision::Open {
                target: TickRange::new(10, 20).unwrap()
            }
        );
    }

    #[test]
    fn test_decide_rebalances_to_tightest_range() {
        let decision = engine()
            .decide(
                Some(&observed(-1000, 1000, -950)),
                &pool_at(-950),
                &RangePolicy::Tightest,
            )
            .unwrap();
        assert_eq!(
            decision,
            Decision::Rebalance {
                target: TickRange::new(-950, -940).unwrap(),
                reason: RebalanceReason::NearBoundary,
            }
        );
    }

    #[test]
    fn test_decide_skips_negligible_move() {
        let range = TickRange::new(-1000, 1000).unwrap();
        let decision = engine()
            .decide(
                Some(&observed(-1000, 1000, -990)),
                &pool_at(-990),
                &RangePolicy::Fixed(range),
            )
            .unwrap();
        assert_eq!(decision, Decision::Unchanged { range });
    }

    #[test]
    fn test_decide_holds_when_centered() {
        let decision = engine()
            .decide(Some(&observed(-1000, 1000, 0)), &pool_at(0), &RangePolicy::Tightest)
            .unwrap();
        assert_eq!(decision, Decision::Hold);
    }
}
