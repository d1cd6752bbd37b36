//! Collaborator traits and the request/response types that cross them.

use anyhow::Result;
use async_trait::async_trait;
use clmm_rebalancer_domain::entities::{BalanceRecord, PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::value_objects::TickRange;
use serde::{Deserialize, Serialize};

/// Request to withdraw liquidity from a position and close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityRequest {
    /// Position address.
    pub position_id: String,
    /// Pool address.
    pub pool_id: String,
    /// Liquidity to withdraw.
    pub liquidity: u128,
    /// Minimum token A accepted.
    pub min_amount_a: u64,
    /// Minimum token B accepted.
    pub min_amount_b: u64,
}

/// Token maxima for a deposit and where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityAmounts {
    /// Amounts set by the operator.
    Fixed {
        /// Token A amount.
        amount_a: u64,
        /// Token B amount.
        amount_b: u64,
    },
    /// Amounts derived from a fraction of the wallet's balances.
    FromBalances {
        /// Token A amount.
        amount_a: u64,
        /// Token B amount.
        amount_b: u64,
    },
}

impl LiquidityAmounts {
    /// Returns `(amount_a, amount_b)`.
    #[must_use]
    pub fn maxima(&self) -> (u64, u64) {
        match *self {
            Self::Fixed { amount_a, amount_b } | Self::FromBalances { amount_a, amount_b } => {
                (amount_a, amount_b)
            }
        }
    }
}

/// Request to open a position at a range and deposit into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityRequest {
    /// Pool address.
    pub pool_id: String,
    /// Target range.
    pub range: TickRange,
    /// Token maxima.
    pub amounts: LiquidityAmounts,
    /// Consolidated balance record funding token A.
    pub input_a: BalanceRecord,
    /// Consolidated balance record funding token B.
    pub input_b: BalanceRecord,
    /// Slippage tolerance in basis points.
    pub slippage_bps: u16,
}

/// Execution status reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// The transaction executed successfully.
    Success,
    /// The transaction was rejected or failed during execution.
    Failure(String),
}

/// Outcome of submitting a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Execution status field.
    pub status: ExecutionStatus,
    /// Transaction reference (signature), when one was produced.
    pub reference: Option<String>,
    /// Objects created by the transaction.
    pub created_objects: Vec<String>,
}

impl ExecutionResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(reference: impl Into<String>, created_objects: Vec<String>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            reference: Some(reference.into()),
            created_objects,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(reference: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failure(error.into()),
            reference,
            created_objects: Vec::new(),
        }
    }

    /// Whether the ledger reported successful execution.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ExecutionStatus::Success => None,
            ExecutionStatus::Failure(reason) => Some(reason),
        }
    }
}

/// Reads liquidity-protocol state and builds its transactions.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Transaction object produced by the builders.
    type Transaction: Send;

    /// Fetches the current state of a pool.
    async fn pool_state(&self, pool_id: &str) -> Result<PoolSnapshot>;

    /// Lists every open position owned by `owner`.
    async fn positions(&self, owner: &str) -> Result<Vec<PositionSnapshot>>;

    /// Builds a transaction that withdraws liquidity and closes the position.
    async fn build_remove_liquidity(
        &self,
        request: &RemoveLiquidityRequest,
    ) -> Result<Self::Transaction>;

    /// Builds a transaction that opens a position and deposits into it.
    async fn build_add_liquidity(&self, request: &AddLiquidityRequest)
    -> Result<Self::Transaction>;
}

/// Wallet-side access to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Transaction object accepted by [`LedgerClient::execute`].
    type Transaction: Send;

    /// Address of the wallet this client signs for.
    fn owner(&self) -> String;

    /// Name of the network this client is connected to.
    fn network(&self) -> String;

    /// Lists the balance records of `asset` held by `owner`.
    async fn balance_records(&self, owner: &str, asset: &str) -> Result<Vec<BalanceRecord>>;

    /// Merges every record in `sources` into `target` in one transaction.
    async fn merge_balance_records(
        &self,
        target: &BalanceRecord,
        sources: &[BalanceRecord],
    ) -> Result<ExecutionResult>;

    /// Signs, submits and waits for a transaction.
    async fn execute(&self, transaction: Self::Transaction) -> Result<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_result() {
        let success = ExecutionResult::success("sig", vec!["pos".to_string()]);
        assert!(success.is_success());
        assert_eq!(success.reference.as_deref(), Some("sig"));
        assert!(success.error().is_none());

        let failure = ExecutionResult::failure(Some("sig".to_string()), "aborted");
        assert!(!failure.is_success());
        assert_eq!(failure.error(), Some("aborted"));
        assert!(failure.created_objects.is_empty());
    }

    #[test]
    fn test_liquidity_amounts_maxima() {
        let fixed = LiquidityAmounts::Fixed {
            amount_a: 1,
            amount_b: 2,
        };
        assert_eq!(fixed.maxima(), (1, 2));

        let derived = LiquidityAmounts::FromBalances {
            amount_a: 3,
            amount_b: 4,
        };
        assert_eq!(derived.maxima(), (3, 4));
    }
}
