use crate::error::DomainError;
use crate::math::price_tick::sqrt_price_x64_to_price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool state fetched fresh on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool address.
    pub pool_id: String,
    /// Current price tick index.
    pub current_tick: i32,
    /// Current sqrt price as a Q64.64 fixed-point value.
    pub sqrt_price_x64: u128,
    /// Minimum distance between usable ticks. Always positive.
    pub tick_spacing: i32,
    /// Mint of token A.
    pub asset_a: String,
    /// Mint of token B.
    pub asset_b: String,
}

impl PoolSnapshot {
    /// Creates a pool snapshot, rejecting a non-positive tick spacing.
    pub fn new(
        pool_id: impl Into<String>,
        current_tick: i32,
        sqrt_price_x64: u128,
        tick_spacing: i32,
        asset_a: impl Into<String>,
        asset_b: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if tick_spacing <= 0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "tick spacing must be positive, got {tick_spacing}"
            )));
        }
        Ok(Self {
            pool_id: pool_id.into(),
            current_tick,
            sqrt_price_x64,
            tick_spacing,
            asset_a: asset_a.into(),
            asset_b: asset_b.into(),
        })
    }

    /// Current price of token A in units of token B, ignoring decimals.
    pub fn price(&self) -> Result<Decimal, DomainError> {
        sqrt_price_x64_to_price(self.sqrt_price_x64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_spacing() {
        assert!(PoolSnapshot::new("pool", 0, 1 << 64, 0, "a", "b").is_err());
        assert!(PoolSnapshot::new("pool", 0, 1 << 64, -10, "a", "b").is_err());
    }

    #[test]
    fn test_price_at_unit_sqrt_price() {
        let pool = PoolSnapshot::new("pool", 0, 1 << 64, 64, "a", "b").unwrap();
        assert_eq!(pool.price().unwrap(), Decimal::ONE);
    }
}
