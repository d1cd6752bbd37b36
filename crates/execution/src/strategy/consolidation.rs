//! Balance record consolidation.

use crate::error::RebalanceError;
use clmm_rebalancer_domain::entities::{BalanceRecord, largest_record};
use clmm_rebalancer_protocols::client::LedgerClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Verification queries made after a merge before giving up.
const VERIFY_ROUNDS: u32 = 2;

/// Outcome of consolidating one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedBalance {
    /// The single remaining record, or `None` when the wallet holds none.
    pub record: Option<BalanceRecord>,
    /// Records merged away. Zero when no transaction was issued.
    pub merged_records: usize,
    /// Merge transaction reference.
    pub reference: Option<String>,
}

impl ConsolidatedBalance {
    fn untouched(record: Option<BalanceRecord>) -> Self {
        Self {
            record,
            merged_records: 0,
            reference: None,
        }
    }
}

/// Merges fragmented balance records of one asset into a single record.
pub struct BalanceConsolidator<L: LedgerClient> {
    ledger: Arc<L>,
    settle_delay: Duration,
}

impl<L: LedgerClient> BalanceConsolidator<L> {
    /// Creates a consolidator that waits `settle_delay` before each
    /// post-merge verification query.
    pub fn new(ledger: Arc<L>, settle_delay: Duration) -> Self {
        Self {
            ledger,
            settle_delay,
        }
    }

    /// Ensures `owner` holds `asset` in at most one record and returns it.
    ///
    /// Safe to call when already consolidated: with zero or one record no
    /// transaction is issued. With several, the largest record is the merge
    /// target and every other record is merged into it in one transaction.
    pub async fn consolidate(
        &self,
        owner: &str,
        asset: &str,
    ) -> Result<ConsolidatedBalance, RebalanceError> {
        let records = self.records(owner, asset).await?;
        if records.len() <= 1 {
            debug!(asset, records = records.len(), "Balance already consolidated");
            return Ok(ConsolidatedBalance::untouched(records.into_iter().next()));
        }

        let failed = |reason: String| RebalanceError::ConsolidationFailed {
            asset: asset.to_string(),
            reason,
        };

        let Some(target) = largest_record(&records).cloned() else {
            return Ok(ConsolidatedBalance::untouched(None));
        };
        let sources: Vec<BalanceRecord> = records
            .into_iter()
            .filter(|r| r.id != target.id)
            .collect();

        info!(
            asset,
            target = %target.id,
            sources = sources.len(),
            "Merging balance records"
        );

        let result = self
            .ledger
            .merge_balance_records(&target, &sources)
            .await
            .map_err(|e| failed(format!("merge submission failed: {e:#}")))?;
        if let Some(reason) = result.error() {
            return Err(failed(format!("merge did not execute: {reason}")));
        }

        let mut remaining = 0;
        for round in 1..=VERIFY_ROUNDS {
            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }
            let records = self.records(owner, asset).await?;
            remaining = records.len();
            if remaining == 1 {
                info!(asset, reference = ?result.reference, "Balance records merged");
                return Ok(ConsolidatedBalance {
                    record: records.into_iter().next(),
                    merged_records: sources.len(),
                    reference: result.reference,
                });
            }
            warn!(asset, round, remaining, "Balance still fragmented after merge");
        }

        Err(failed(format!(
            "{remaining} records remain after {VERIFY_ROUNDS} verification rounds"
        )))
    }

    async fn records(&self, owner: &str, asset: &str) -> Result<Vec<BalanceRecord>, RebalanceError> {
        self.ledger
            .balance_records(owner, asset)
            .await
            .map_err(|e| RebalanceError::StateRead(format!("balances of {asset}: {e:#}")))
    }
}
