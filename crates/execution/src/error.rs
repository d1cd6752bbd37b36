use clmm_rebalancer_domain::DomainError;
use thiserror::Error;

/// Failures of a check cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebalanceError {
    /// Missing or invalid settings. Fatal before the loop starts.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Pool, position or balance query failed.
    #[error("failed to read state: {0}")]
    StateRead(String),
    /// Balances of an asset could not be merged into one record.
    #[error("consolidation of {asset} failed: {reason}")]
    ConsolidationFailed {
        /// Asset that stayed fragmented.
        asset: String,
        /// What went wrong.
        reason: String,
    },
    /// A ledger transaction did not execute successfully.
    #[error("{operation} failed after {attempts} attempt(s): {reason}")]
    TransactionExecution {
        /// Operation name.
        operation: String,
        /// Attempts made.
        attempts: u32,
        /// Last failure reason.
        reason: String,
    },
    /// The configured position does not exist for the wallet.
    #[error("position {0} not found for wallet")]
    PositionNotFound(String),
    /// The wallet holds no balance record for an asset.
    #[error("no balance of {asset} available")]
    InsufficientBalance {
        /// Asset without any balance record.
        asset: String,
    },
    /// Another check cycle is still running.
    #[error("a check cycle is already in progress")]
    CycleInProgress,
}

impl From<DomainError> for RebalanceError {
    fn from(e: DomainError) -> Self {
        Self::Configuration(e.to_string())
    }
}
