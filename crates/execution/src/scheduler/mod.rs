//! Scheduler driving check cycles.
//!
//! One cycle at a time on a fixed interval. Stopping only prevents new
//! cycles; an in-flight cycle always runs to completion.

use crate::strategy::{RebalanceOrchestrator, RebalanceResult};
use clmm_rebalancer_protocols::client::{LedgerClient, ProtocolClient};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

/// Snapshot of the bot for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotStatus {
    /// Whether the loop is running.
    pub running: bool,
    /// Wallet acting on the ledger.
    pub wallet_address: String,
    /// Network name.
    pub network: String,
    /// Managed pool.
    pub pool_address: String,
    /// Position currently followed.
    pub tracked_position: Option<String>,
    /// Latest cycle outcome that took or attempted an action.
    pub last_result: Option<RebalanceResult>,
}

/// Timer loop around a [`RebalanceOrchestrator`].
pub struct RebalanceBot<P, L>
where
    P: ProtocolClient,
    L: LedgerClient<Transaction = P::Transaction>,
{
    orchestrator: Arc<RebalanceOrchestrator<P, L>>,
    check_interval: Duration,
    running: AtomicBool,
    stop_signal: Notify,
}

impl<P, L> RebalanceBot<P, L>
where
    P: ProtocolClient,
    L: LedgerClient<Transaction = P::Transaction>,
{
    /// Creates a stopped bot.
    pub fn new(orchestrator: Arc<RebalanceOrchestrator<P, L>>, check_interval: Duration) -> Self {
        Self {
            orchestrator,
            check_interval,
            running: AtomicBool::new(false),
            stop_signal: Notify::new(),
        }
    }

    /// The orchestrator driven by this bot.
    pub fn orchestrator(&self) -> &Arc<RebalanceOrchestrator<P, L>> {
        &self.orchestrator
    }

    /// Whether the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs the loop on the caller's task until [`stop`](Self::stop).
    ///
    /// The first check happens immediately. A slow cycle delays the next tick
    /// instead of causing a burst of catch-up cycles.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Bot already running");
            return;
        }

        let pool = &self.orchestrator.config().pool_id;
        info!(
            pool = %pool,
            wallet = %self.orchestrator.wallet_address(),
            network = %self.orchestrator.network(),
            interval_secs = self.check_interval.as_secs_f64(),
            dry_run = self.orchestrator.config().dry_run,
            "Starting rebalance bot"
        );

        let mut ticker = interval(self.check_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.is_running() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.stop_signal.notified() => {}
            }
            // A permit left by an earlier stop() may wake us while running.
            if !self.is_running() {
                break;
            }
            self.run_once().await;
        }

        info!("Rebalance bot stopped");
    }

    /// Runs a single check cycle and logs its outcome.
    pub async fn run_once(&self) -> Option<RebalanceResult> {
        let pool = &self.orchestrator.config().pool_id;
        let result = self.orchestrator.check_and_rebalance(pool).await;

        match &result {
            None => debug!(pool = %pool, "No action needed"),
            Some(r) if r.success => info!(
                pool = %pool,
                old_range = ?r.old_range,
                new_range = ?r.new_range,
                reference = ?r.tx_reference,
                dry_run = r.dry_run,
                "Check cycle completed"
            ),
            Some(r) => error!(
                pool = %pool,
                error = r.error.as_deref().unwrap_or("unknown"),
                "Check cycle failed"
            ),
        }
        result
    }

    /// Stops scheduling new cycles.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping rebalance bot");
            self.stop_signal.notify_one();
        }
    }

    /// Current status.
    pub async fn status(&self) -> BotStatus {
        BotStatus {
            running: self.is_running(),
            wallet_address: self.orchestrator.wallet_address(),
            network: self.orchestrator.network(),
            pool_address: self.orchestrator.config().pool_id.clone(),
            tracked_position: self.orchestrator.tracked_position().await,
            last_result: self.orchestrator.lifecycle().last_result().await,
        }
    }
}
