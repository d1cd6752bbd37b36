//! Position lifecycle tracking.
//!
//! Records every committed step of a check cycle:
//! - Position opening
//! - Liquidity removal
//! - Balance consolidation
//! - Rebalances and failed cycles

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
