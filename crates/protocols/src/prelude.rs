//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use clmm_rebalancer_protocols::prelude::*;
//! ```

pub use crate::client::{
    AddLiquidityRequest, ExecutionResult, ExecutionStatus, LedgerClient, LiquidityAmounts,
    ProtocolClient, RemoveLiquidityRequest,
};
pub use crate::orca::{WhirlpoolClient, WHIRLPOOL_PROGRAM_ID};
pub use crate::rpc::{Network, RpcProvider};
pub use crate::token::TokenLedger;
pub use crate::transaction::SolanaTransaction;
pub use crate::wallet::Wallet;
