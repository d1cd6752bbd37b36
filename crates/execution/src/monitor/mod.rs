//! Position state reading.
//!
//! Every check starts from fresh ledger state: the pool is queried first,
//! then the wallet's positions, and the in-range flag is re-derived from the
//! pool tick read in the same check.

use crate::error::RebalanceError;
use clmm_rebalancer_domain::entities::{PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::math::is_position_in_range;
use clmm_rebalancer_protocols::client::ProtocolClient;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Pool and position state observed by one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSnapshot {
    /// Pool state.
    pub pool: PoolSnapshot,
    /// The managed position, if the wallet has one in the pool.
    pub position: Option<PositionSnapshot>,
}

/// Reads pool and position state through a protocol client.
pub struct PositionStateReader<P: ProtocolClient> {
    protocol: Arc<P>,
}

impl<P: ProtocolClient> PositionStateReader<P> {
    /// Creates a reader over the given protocol client.
    pub fn new(protocol: Arc<P>) -> Self {
        Self { protocol }
    }

    /// Fetches the pool snapshot.
    pub async fn pool(&self, pool_id: &str) -> Result<PoolSnapshot, RebalanceError> {
        self.protocol
            .pool_state(pool_id)
            .await
            .map_err(|e| RebalanceError::StateRead(format!("pool {pool_id}: {e:#}")))
    }

    /// Fetches the pool and the managed position.
    ///
    /// With `tracked` set, that exact position must exist in the pool,
    /// otherwise [`RebalanceError::PositionNotFound`] is returned. Without it,
    /// the wallet's first position in the pool is used, and `None` means the
    /// wallet has no position there.
    pub async fn read(
        &self,
        pool_id: &str,
        owner: &str,
        tracked: Option<&str>,
    ) -> Result<CheckSnapshot, RebalanceError> {
        let pool = self.pool(pool_id).await?;

        let positions = self
            .protocol
            .positions(owner)
            .await
            .map_err(|e| RebalanceError::StateRead(format!("positions of {owner}: {e:#}")))?;

        let mut candidates = positions.into_iter().filter(|p| p.pool_id == pool.pool_id);
        let position = match tracked {
            Some(id) => Some(
                candidates
                    .find(|p| p.position_id == id)
                    .ok_or_else(|| RebalanceError::PositionNotFound(id.to_string()))?,
            ),
            None => candidates.next(),
        };

        let position = position.map(|mut p| {
            p.in_range = is_position_in_range(p.tick_lower, p.tick_upper, pool.current_tick);
            p
        });

        debug!(
            pool = %pool.pool_id,
            tick = pool.current_tick,
            position = position.as_ref().map(|p| p.position_id.as_str()),
            "Read position state"
        );

        Ok(CheckSnapshot { pool, position })
    }
}
