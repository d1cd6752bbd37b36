use async_trait::async_trait;
use clmm_rebalancer_execution::lifecycle::LifecycleTracker;
use clmm_rebalancer_execution::scheduler::{BotStatus, RebalanceBot};
use clmm_rebalancer_protocols::client::{LedgerClient, ProtocolClient};
use std::sync::Arc;

/// Anything able to report the bot's status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current status.
    async fn status(&self) -> BotStatus;
}

#[async_trait]
impl<P, L> StatusSource for RebalanceBot<P, L>
where
    P: ProtocolClient,
    L: LedgerClient<Transaction = P::Transaction>,
{
    async fn status(&self) -> BotStatus {
        RebalanceBot::status(self).await
    }
}

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bot status source.
    pub status: Arc<dyn StatusSource>,
    /// Lifecycle event history.
    pub lifecycle: Arc<LifecycleTracker>,
    /// Process start, for uptime reporting.
    pub started_at: std::time::Instant,
}

impl AppState {
    /// Creates the handler state.
    pub fn new(status: Arc<dyn StatusSource>, lifecycle: Arc<LifecycleTracker>) -> Self {
        Self {
            status,
            lifecycle,
            started_at: std::time::Instant::now(),
        }
    }
}
