//! Rebalancing execution logic.

use crate::config::{RebalanceConfig, SizingPolicy};
use crate::error::RebalanceError;
use crate::lifecycle::{
    ConsolidationData, LifecycleTracker, LiquidityRemovedData, PositionOpenedData,
    RebalanceData, RebalanceReason,
};
use crate::monitor::PositionStateReader;
use crate::retry::retry_with_delay;
use crate::strategy::consolidation::BalanceConsolidator;
use crate::strategy::decision::{Decision, DecisionConfig, DecisionEngine};
use clmm_rebalancer_domain::entities::{BalanceRecord, PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::value_objects::TickRange;
use clmm_rebalancer_protocols::client::{
    AddLiquidityRequest, ExecutionResult, LedgerClient, LiquidityAmounts, ProtocolClient,
    RemoveLiquidityRequest,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceResult {
    /// Whether the cycle completed.
    pub success: bool,
    /// Reference of the last transaction executed.
    pub tx_reference: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
    /// Range of the position before the cycle.
    pub old_range: Option<TickRange>,
    /// Range of the position after the cycle.
    pub new_range: Option<TickRange>,
    /// Position managed after the cycle, when a new one was created.
    pub new_position: Option<String>,
    /// Whether the cycle only simulated its actions.
    pub dry_run: bool,
    /// When the cycle finished.
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl RebalanceResult {
    /// A failed cycle.
    pub fn failure(error: impl Into<String>, old_range: Option<TickRange>) -> Self {
        Self {
            success: false,
            tx_reference: None,
            error: Some(error.into()),
            old_range,
            new_range: None,
            new_position: None,
            dry_run: false,
            completed_at: chrono::Utc::now(),
        }
    }

    /// A skipped move: the target matches the current range.
    #[must_use]
    pub fn unchanged(range: TickRange) -> Self {
        Self {
            success: true,
            tx_reference: None,
            error: None,
            old_range: Some(range),
            new_range: Some(range),
            new_position: None,
            dry_run: false,
            completed_at: chrono::Utc::now(),
        }
    }

    fn planned(old_range: Option<TickRange>, new_range: TickRange) -> Self {
        Self {
            success: true,
            tx_reference: None,
            error: None,
            old_range,
            new_range: Some(new_range),
            new_position: None,
            dry_run: true,
            completed_at: chrono::Utc::now(),
        }
    }
}

/// Ranges known so far in a cycle, kept for failure reporting.
#[derive(Debug, Default)]
struct CycleProgress {
    position: Option<String>,
    old_range: Option<TickRange>,
    new_range: Option<TickRange>,
}

/// Sequences read, decide, remove, consolidate and add for one pool.
pub struct RebalanceOrchestrator<P, L>
where
    P: ProtocolClient,
    L: LedgerClient<Transaction = P::Transaction>,
{
    config: RebalanceConfig,
    protocol: Arc<P>,
    ledger: Arc<L>,
    reader: PositionStateReader<P>,
    engine: DecisionEngine,
    consolidator: BalanceConsolidator<L>,
    lifecycle: Arc<LifecycleTracker>,
    /// Position id followed across cycles.
    tracked_position: RwLock<Option<String>>,
    /// Held for the duration of a cycle.
    cycle: Mutex<()>,
}

impl<P, L> RebalanceOrchestrator<P, L>
where
    P: ProtocolClient,
    L: LedgerClient<Transaction = P::Transaction>,
{
    /// Creates an orchestrator after validating its configuration.
    pub fn new(
        config: RebalanceConfig,
        protocol: Arc<P>,
        ledger: Arc<L>,
        lifecycle: Arc<LifecycleTracker>,
    ) -> Result<Self, RebalanceError> {
        config.validate()?;

        Ok(Self {
            reader: PositionStateReader::new(Arc::clone(&protocol)),
            engine: DecisionEngine::new(DecisionConfig {
                rebalance_threshold: config.rebalance_threshold,
            }),
            consolidator: BalanceConsolidator::new(Arc::clone(&ledger), config.settle_delay),
            tracked_position: RwLock::new(config.position_id.clone()),
            cycle: Mutex::new(()),
            config,
            protocol,
            ledger,
            lifecycle,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Lifecycle tracker fed by this orchestrator.
    pub fn lifecycle(&self) -> &Arc<LifecycleTracker> {
        &self.lifecycle
    }

    /// Wallet address acting on the ledger.
    pub fn wallet_address(&self) -> String {
        self.ledger.owner()
    }

    /// Network name of the ledger.
    pub fn network(&self) -> String {
        self.ledger.network()
    }

    /// Position currently followed, if any.
    pub async fn tracked_position(&self) -> Option<String> {
        self.tracked_position.read().await.clone()
    }

    /// Runs one check cycle, turning every failure into a result.
    ///
    /// Returns `None` when no action was needed.
    pub async fn check_and_rebalance(&self, pool_id: &str) -> Option<RebalanceResult> {
        let mut progress = CycleProgress::default();

        let result = match self.run_cycle(pool_id, &mut progress).await {
            Ok(None) => return None,
            Ok(Some(result)) => result,
            Err(RebalanceError::CycleInProgress) => {
                warn!(pool = pool_id, "Check skipped, previous cycle still running");
                return Some(RebalanceResult::failure(
                    RebalanceError::CycleInProgress.to_string(),
                    None,
                ));
            }
            Err(e) => {
                let message = e.to_string();
                self.lifecycle
                    .record_failure(progress.position.clone(), pool_id, &message)
                    .await;
                let mut result = RebalanceResult::failure(message, progress.old_range);
                result.new_range = progress.new_range;
                result
            }
        };

        self.lifecycle.record_result(&result).await;
        Some(result)
    }

    /// Runs one check cycle, surfacing failures as typed errors.
    pub async fn try_check_and_rebalance(
        &self,
        pool_id: &str,
    ) -> Result<Option<RebalanceResult>, RebalanceError> {
        self.run_cycle(pool_id, &mut CycleProgress::default()).await
    }

    async fn run_cycle(
        &self,
        pool_id: &str,
        progress: &mut CycleProgress,
    ) -> Result<Option<RebalanceResult>, RebalanceError> {
        let _cycle = self
            .cycle
            .try_lock()
            .map_err(|_| RebalanceError::CycleInProgress)?;

        let owner = self.ledger.owner();
        let tracked = self.tracked_position().await;
        let snapshot = self.reader.read(pool_id, &owner, tracked.as_deref()).await?;
        let pool = &snapshot.pool;
        let position = snapshot.position.as_ref();

        if let Some(position) = position {
            progress.position = Some(position.position_id.clone());
            progress.old_range = Some(position.range());
        }

        let decision = self
            .engine
            .decide(position, pool, &self.config.range_policy)?;

        let (target, reason) = match decision {
            Decision::Hold => {
                debug!(
                    pool = %pool.pool_id,
                    tick = pool.current_tick,
                    "Position within safety margin"
                );
                return Ok(None);
            }
            Decision::Unchanged { range } => {
                info!(
                    pool = %pool.pool_id,
                    range = %range,
                    tick = pool.current_tick,
                    "Target range matches current range, skipping"
                );
                return Ok(Some(RebalanceResult::unchanged(range)));
            }
            Decision::Open { target } => (target, None),
            Decision::Rebalance { target, reason } => (target, Some(reason)),
        };
        progress.new_range = Some(target);

        info!(
            pool = %pool.pool_id,
            position = ?progress.position,
            old_range = ?progress.old_range,
            new_range = %target,
            tick = pool.current_tick,
            price = ?pool.price().ok(),
            reason = ?reason,
            dry_run = self.config.dry_run,
            "Executing rebalance"
        );

        if self.config.dry_run {
            info!("Dry run mode - no transaction submitted");
            return Ok(Some(RebalanceResult::planned(progress.old_range, target)));
        }

        self.execute_move(&owner, pool, position, target, reason)
            .await
            .map(Some)
    }

    async fn execute_move(
        &self,
        owner: &str,
        pool: &PoolSnapshot,
        position: Option<&PositionSnapshot>,
        target: TickRange,
        reason: Option<RebalanceReason>,
    ) -> Result<RebalanceResult, RebalanceError> {
        // Step 1: Withdraw and close the old position
        if let Some(position) = position {
            if position.is_empty() {
                info!(position = %position.position_id, "Position holds no liquidity, skipping removal");
            } else {
                self.remove_liquidity(pool, position).await?;
                // The old position is closed; later cycles must not look for it.
                *self.tracked_position.write().await = None;
            }
        }

        // Step 2: Consolidate once per cycle, never per retry
        let input_a = self.consolidate(owner, pool, &pool.asset_a).await?;
        let input_b = self.consolidate(owner, pool, &pool.asset_b).await?;

        // Step 3: Size and open the new position
        let amounts = self.size_deposit(&input_a, &input_b)?;
        let request = AddLiquidityRequest {
            pool_id: pool.pool_id.clone(),
            range: target,
            amounts,
            input_a,
            input_b,
            slippage_bps: self.config.slippage_bps,
        };
        let request = &request;
        let protocol = &self.protocol;
        let result = self
            .submit("add_liquidity", move || protocol.build_add_liquidity(request))
            .await?;

        let new_position = result.created_objects.first().cloned();
        if let Some(id) = &new_position {
            *self.tracked_position.write().await = Some(id.clone());
        } else {
            warn!("Add liquidity reported no created position");
        }

        let (amount_a, amount_b) = amounts.maxima();
        self.lifecycle
            .record_position_opened(
                new_position.clone(),
                &pool.pool_id,
                result.reference.clone(),
                PositionOpenedData {
                    tick_lower: target.lower,
                    tick_upper: target.upper,
                    amount_a,
                    amount_b,
                },
            )
            .await;

        if let (Some(position), Some(reason)) = (position, reason) {
            self.lifecycle
                .record_rebalance(
                    new_position.clone(),
                    &pool.pool_id,
                    result.reference.clone(),
                    RebalanceData {
                        old_tick_lower: position.tick_lower,
                        old_tick_upper: position.tick_upper,
                        new_tick_lower: target.lower,
                        new_tick_upper: target.upper,
                        old_liquidity: position.liquidity,
                        reason,
                    },
                )
                .await;
        }

        info!(
            new_position = ?new_position,
            reference = ?result.reference,
            "Rebalance completed successfully"
        );

        Ok(RebalanceResult {
            success: true,
            tx_reference: result.reference,
            error: None,
            old_range: position.map(PositionSnapshot::range),
            new_range: Some(target),
            new_position,
            dry_run: false,
            completed_at: chrono::Utc::now(),
        })
    }

    async fn remove_liquidity(
        &self,
        pool: &PoolSnapshot,
        position: &PositionSnapshot,
    ) -> Result<(), RebalanceError> {
        // Any settlement amount is accepted on the way out.
        let request = RemoveLiquidityRequest {
            position_id: position.position_id.clone(),
            pool_id: pool.pool_id.clone(),
            liquidity: position.liquidity,
            min_amount_a: 0,
            min_amount_b: 0,
        };
        let request = &request;
        let protocol = &self.protocol;
        let result = self
            .submit("remove_liquidity", move || protocol.build_remove_liquidity(request))
            .await?;

        self.lifecycle
            .record_liquidity_removed(
                &position.position_id,
                &pool.pool_id,
                result.reference,
                LiquidityRemovedData {
                    liquidity: position.liquidity,
                    tick_lower: position.tick_lower,
                    tick_upper: position.tick_upper,
                },
            )
            .await;
        Ok(())
    }

    async fn consolidate(
        &self,
        owner: &str,
        pool: &PoolSnapshot,
        asset: &str,
    ) -> Result<BalanceRecord, RebalanceError> {
        let balance = self.consolidator.consolidate(owner, asset).await?;
        let record = balance
            .record
            .ok_or_else(|| RebalanceError::InsufficientBalance {
                asset: asset.to_string(),
            })?;

        if balance.merged_records > 0 {
            self.lifecycle
                .record_consolidated(
                    &pool.pool_id,
                    ConsolidationData {
                        asset: asset.to_string(),
                        record: record.id.clone(),
                        amount: record.amount,
                    },
                )
                .await;
        }
        Ok(record)
    }

    fn size_deposit(
        &self,
        input_a: &BalanceRecord,
        input_b: &BalanceRecord,
    ) -> Result<LiquidityAmounts, RebalanceError> {
        let amounts = match self.config.sizing {
            SizingPolicy::Fixed { amount_a, amount_b } => {
                LiquidityAmounts::Fixed { amount_a, amount_b }
            }
            SizingPolicy::BalanceFraction(fraction) => LiquidityAmounts::FromBalances {
                amount_a: SizingPolicy::fraction_of(fraction, input_a.amount),
                amount_b: SizingPolicy::fraction_of(fraction, input_b.amount),
            },
        };

        if amounts.maxima() == (0, 0) {
            return Err(RebalanceError::InsufficientBalance {
                asset: format!("{} and {}", input_a.asset, input_b.asset),
            });
        }
        debug!(amounts = ?amounts, "Sized deposit");
        Ok(amounts)
    }

    /// Builds and executes a transaction under the retry policy.
    ///
    /// Only the ledger-reported execution status counts as success.
    async fn submit<F, Fut>(
        &self,
        operation: &'static str,
        build: F,
    ) -> Result<ExecutionResult, RebalanceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<P::Transaction>>,
    {
        let ledger = &self.ledger;
        retry_with_delay(&self.config.retry, operation, move |attempt| {
            let built = build();
            async move {
                debug!(operation, attempt, "Submitting transaction");
                let transaction = built.await.map_err(|e| format!("build failed: {e:#}"))?;
                let result = ledger
                    .execute(transaction)
                    .await
                    .map_err(|e| format!("{e:#}"))?;
                match result.error() {
                    Some(reason) => Err(reason.to_string()),
                    None => Ok(result),
                }
            }
        })
        .await
        .map_err(|e| RebalanceError::TransactionExecution {
            operation: e.operation,
            attempts: e.attempts,
            reason: e.last_error,
        })
    }
}
