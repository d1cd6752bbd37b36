/// Liquidity estimation from token amounts.
pub mod concentrated_liquidity;
/// Tick and price conversions.
pub mod price_tick;
/// Range construction and membership.
pub mod range;

pub use range::{calculate_optimal_range, is_position_in_range};
