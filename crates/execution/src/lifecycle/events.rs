//! Lifecycle events for position tracking.

use serde::{Deserialize, Serialize};

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// A new position was opened and funded.
    PositionOpened,
    /// Liquidity was withdrawn and the old position closed.
    LiquidityRemoved,
    /// Fragmented balance records were merged.
    BalancesConsolidated,
    /// A position was moved to a new range.
    Rebalanced,
    /// A check cycle ended in failure.
    CycleFailed,
}

/// A lifecycle event for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Position address, when one is involved.
    pub position: Option<String>,
    /// Pool address.
    pub pool: String,
    /// Transaction reference.
    pub reference: Option<String>,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event.
    pub fn new(
        event_type: LifecycleEventType,
        position: Option<String>,
        pool: impl Into<String>,
        data: EventData,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            position,
            pool: pool.into(),
            reference: None,
            timestamp: chrono::Utc::now(),
            data,
        }
    }

    /// Sets the transaction reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    /// Position opened data.
    PositionOpened(PositionOpenedData),
    /// Liquidity removal data.
    LiquidityRemoved(LiquidityRemovedData),
    /// Consolidation data.
    BalancesConsolidated(ConsolidationData),
    /// Rebalance data.
    Rebalance(RebalanceData),
    /// Failure data.
    CycleFailed(FailureData),
}

/// Data for position opened event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedData {
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
    /// Token A maximum deposited.
    pub amount_a: u64,
    /// Token B maximum deposited.
    pub amount_b: u64,
}

/// Data for liquidity removed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRemovedData {
    /// Liquidity withdrawn.
    pub liquidity: u128,
    /// Lower tick of the closed position.
    pub tick_lower: i32,
    /// Upper tick of the closed position.
    pub tick_upper: i32,
}

/// Data for balances consolidated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationData {
    /// Asset merged.
    pub asset: String,
    /// Surviving record.
    pub record: String,
    /// Amount held by the surviving record.
    pub amount: u64,
}

/// Data for rebalance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceData {
    /// Old lower tick.
    pub old_tick_lower: i32,
    /// Old upper tick.
    pub old_tick_upper: i32,
    /// New lower tick.
    pub new_tick_lower: i32,
    /// New upper tick.
    pub new_tick_upper: i32,
    /// Liquidity of the old position.
    pub old_liquidity: u128,
    /// Reason for rebalance.
    pub reason: RebalanceReason,
}

/// Reason for rebalancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceReason {
    /// The current tick left the range.
    OutOfRange,
    /// The current tick is inside the boundary safety margin.
    NearBoundary,
}

/// Data for cycle failed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureData {
    /// Error description.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_event_creation() {
        let event = LifecycleEvent::new(
            LifecycleEventType::PositionOpened,
            Some("pos".to_string()),
            "pool",
            EventData::PositionOpened(PositionOpenedData {
                tick_lower: -1000,
                tick_upper: 1000,
                amount_a: 1_000_000_000,
                amount_b: 100_000_000,
            }),
        );

        assert_eq!(event.event_type, LifecycleEventType::PositionOpened);
        assert!(event.reference.is_none());
        assert_eq!(event.id.len(), 36);

        let event = event.with_reference(Some("sig".to_string()));
        assert_eq!(event.reference.as_deref(), Some("sig"));
    }
}
