//! Orca Whirlpool protocol adapter.
//!
//! This module provides functionality to interact with Orca Whirlpool pools:
//! - Read pool state
//! - Discover the wallet's positions
//! - Build remove/add liquidity transactions

/// Protocol client implementation.
pub mod client;
/// Instruction builders for on-chain operations.
pub mod executor;
/// Whirlpool account layouts and PDAs.
pub mod whirlpool;

pub use client::WhirlpoolClient;
pub use whirlpool::WHIRLPOOL_PROGRAM_ID;
