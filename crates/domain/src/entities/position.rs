use crate::error::DomainError;
use crate::math::range::is_position_in_range;
use crate::value_objects::tick_range::TickRange;
use serde::{Deserialize, Serialize};

/// A wallet's liquidity position as observed during one check.
///
/// Read-only: the rebalancer never mutates positions directly, it only
/// submits transactions that cause the ledger to do so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Position address.
    pub position_id: String,
    /// Pool the position belongs to.
    pub pool_id: String,
    /// Lower tick bound.
    pub tick_lower: i32,
    /// Upper tick bound.
    pub tick_upper: i32,
    /// Liquidity currently deposited.
    pub liquidity: u128,
    /// Whether the pool's current tick lies inside the bounds.
    pub in_range: bool,
}

impl PositionSnapshot {
    /// Builds a snapshot and derives the in-range flag from the pool's tick.
    pub fn observe(
        position_id: impl Into<String>,
        pool_id: impl Into<String>,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
        current_tick: i32,
    ) -> Result<Self, DomainError> {
        if tick_lower >= tick_upper {
            return Err(DomainError::InvalidRange {
                lower: tick_lower,
                upper: tick_upper,
            });
        }
        Ok(Self {
            position_id: position_id.into(),
            pool_id: pool_id.into(),
            tick_lower,
            tick_upper,
            liquidity,
            in_range: is_position_in_range(tick_lower, tick_upper, current_tick),
        })
    }

    /// The position's tick range.
    #[must_use]
    pub fn range(&self) -> TickRange {
        TickRange {
            lower: self.tick_lower,
            upper: self.tick_upper,
        }
    }

    /// Whether liquidity has already been fully withdrawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
    }
}
