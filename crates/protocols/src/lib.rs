//! Collaborator contracts and their Solana implementations.
//!
//! The rebalancer talks to two collaborators:
//! - a [`ProtocolClient`](client::ProtocolClient) that reads pool and
//!   position state and builds liquidity transactions
//! - a [`LedgerClient`](client::LedgerClient) that lists balance records,
//!   merges them and signs-and-executes transactions
//!
//! The Orca Whirlpool and SPL token adapters implement them on Solana.

/// Prelude module for convenient imports.
pub mod prelude;

/// Collaborator traits and request/response contracts.
pub mod client;
/// Orca Whirlpool protocol adapter.
pub mod orca;
/// Solana RPC provider.
pub mod rpc;
/// SPL token ledger adapter.
pub mod token;
/// Signed transaction container.
pub mod transaction;
/// Wallet loading.
pub mod wallet;
