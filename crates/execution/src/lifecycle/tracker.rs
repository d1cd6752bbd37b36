//! Lifecycle tracker for position history.

use super::{
    ConsolidationData, EventData, FailureData, LifecycleEvent, LifecycleEventType,
    LiquidityRemovedData, PositionOpenedData, RebalanceData,
};
use crate::strategy::RebalanceResult;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Events kept before the oldest are dropped.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1_000;

/// Counters over everything recorded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleStats {
    /// Positions opened, including rebalance replacements.
    pub positions_opened: u32,
    /// Positions closed by liquidity removal.
    pub liquidity_removals: u32,
    /// Merge transactions that consolidated a balance.
    pub consolidations: u32,
    /// Completed rebalances.
    pub rebalances: u32,
    /// Failed cycles.
    pub failures: u32,
}

/// Tracks lifecycle events for the managed position.
pub struct LifecycleTracker {
    /// Events, oldest first.
    events: Arc<RwLock<VecDeque<LifecycleEvent>>>,
    /// Running counters.
    stats: Arc<RwLock<LifecycleStats>>,
    /// Outcome of the latest cycle that took or attempted an action.
    last_result: Arc<RwLock<Option<RebalanceResult>>>,
    capacity: usize,
}

impl LifecycleTracker {
    /// Creates a new lifecycle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a tracker keeping at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            stats: Arc::new(RwLock::new(LifecycleStats::default())),
            last_result: Arc::new(RwLock::new(None)),
            capacity: capacity.max(1),
        }
    }

    /// Records a position opened event.
    pub async fn record_position_opened(
        &self,
        position: Option<String>,
        pool: &str,
        reference: Option<String>,
        data: PositionOpenedData,
    ) {
        info!(
            position = ?position,
            tick_lower = data.tick_lower,
            tick_upper = data.tick_upper,
            "Position opened"
        );

        let event = LifecycleEvent::new(
            LifecycleEventType::PositionOpened,
            position,
            pool,
            EventData::PositionOpened(data),
        )
        .with_reference(reference);
        self.add_event(event).await;
        self.stats.write().await.positions_opened += 1;
    }

    /// Records a liquidity removal event.
    pub async fn record_liquidity_removed(
        &self,
        position: &str,
        pool: &str,
        reference: Option<String>,
        data: LiquidityRemovedData,
    ) {
        info!(
            position,
            liquidity = data.liquidity,
            "Liquidity removed"
        );

        let event = LifecycleEvent::new(
            LifecycleEventType::LiquidityRemoved,
            Some(position.to_string()),
            pool,
            EventData::LiquidityRemoved(data),
        )
        .with_reference(reference);
        self.add_event(event).await;
        self.stats.write().await.liquidity_removals += 1;
    }

    /// Records a balance consolidation event.
    pub async fn record_consolidated(&self, pool: &str, data: ConsolidationData) {
        let event = LifecycleEvent::new(
            LifecycleEventType::BalancesConsolidated,
            None,
            pool,
            EventData::BalancesConsolidated(data),
        );
        self.add_event(event).await;
        self.stats.write().await.consolidations += 1;
    }

    /// Records a rebalance event.
    pub async fn record_rebalance(
        &self,
        position: Option<String>,
        pool: &str,
        reference: Option<String>,
        data: RebalanceData,
    ) {
        info!(
            position = ?position,
            old_range = format!("[{}, {}]", data.old_tick_lower, data.old_tick_upper),
            new_range = format!("[{}, {}]", data.new_tick_lower, data.new_tick_upper),
            reason = ?data.reason,
            "Position rebalanced"
        );

        let event = LifecycleEvent::new(
            LifecycleEventType::Rebalanced,
            position,
            pool,
            EventData::Rebalance(data),
        )
        .with_reference(reference);
        self.add_event(event).await;
        self.stats.write().await.rebalances += 1;
    }

    /// Records a failed cycle.
    pub async fn record_failure(&self, position: Option<String>, pool: &str, message: &str) {
        error!(position = ?position, pool, error = message, "Check cycle failed");

        let event = LifecycleEvent::new(
            LifecycleEventType::CycleFailed,
            position,
            pool,
            EventData::CycleFailed(FailureData {
                error: message.to_string(),
            }),
        );
        self.add_event(event).await;
        self.stats.write().await.failures += 1;
    }

    /// Stores the outcome of the latest cycle.
    pub async fn record_result(&self, result: &RebalanceResult) {
        *self.last_result.write().await = Some(result.clone());
    }

    /// Adds an event, evicting the oldest once full.
    async fn add_event(&self, event: LifecycleEvent) {
        let mut events = self.events.write().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Gets all retained events, oldest first.
    pub async fn get_events(&self) -> Vec<LifecycleEvent> {
        self.events.read().await.iter().cloned().collect()
    }

    /// Gets the `limit` most recent events, newest first.
    pub async fn recent_events(&self, limit: usize) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Gets the counters.
    pub async fn stats(&self) -> LifecycleStats {
        self.stats.read().await.clone()
    }

    /// Gets the latest cycle outcome.
    pub async fn last_result(&self) -> Option<RebalanceResult> {
        self.last_result.read().await.clone()
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::RebalanceReason;

    fn opened() -> PositionOpenedData {
        PositionOpenedData {
            tick_lower: -1000,
            tick_upper: 1000,
            amount_a: 1_000,
            amount_b: 2_000,
        }
    }

    #[tokio::test]
    async fn test_lifecycle_tracker() {
        let tracker = LifecycleTracker::new();

        tracker
            .record_position_opened(Some("pos".to_string()), "pool", None, opened())
            .await;
        tracker
            .record_rebalance(
                Some("pos-2".to_string()),
                "pool",
                Some("sig".to_string()),
                RebalanceData {
                    old_tick_lower: -1000,
                    old_tick_upper: 1000,
                    new_tick_lower: -950,
                    new_tick_upper: -940,
                    old_liquidity: 10,
                    reason: RebalanceReason::NearBoundary,
                },
            )
            .await;
        tracker.record_failure(None, "pool", "boom").await;

        let events = tracker.get_events().await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, LifecycleEventType::PositionOpened);

        let recent = tracker.recent_events(1).await;
        assert_eq!(recent[0].event_type, LifecycleEventType::CycleFailed);

        let stats = tracker.stats().await;
        assert_eq!(stats.positions_opened, 1);
        assert_eq!(stats.rebalances, 1);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let tracker = LifecycleTracker::with_capacity(2);
        for _ in 0..5 {
            tracker.record_failure(None, "pool", "boom").await;
        }
        assert_eq!(tracker.get_events().await.len(), 2);
        assert_eq!(tracker.stats().await.failures, 5);
    }

    #[tokio::test]
    async fn test_last_result() {
        let tracker = LifecycleTracker::new();
        assert!(tracker.last_result().await.is_none());

        let result = RebalanceResult::failure("boom", None);
        tracker.record_result(&result).await;
        assert_eq!(tracker.last_result().await, Some(result));
    }
}
