//! Core domain types for the concentrated-liquidity rebalancer.
//!
//! Everything in this crate is pure: snapshots of pool and position state,
//! balance records, tick ranges and the math that turns a current tick into
//! an aligned target range. No I/O happens here.

/// Snapshots of on-chain state.
pub mod entities;
/// Domain error type.
pub mod error;
/// Tick, price and liquidity math.
pub mod math;
/// Value objects.
pub mod value_objects;

pub use error::DomainError;
