pub mod balance;
pub mod pool;
pub mod position;

pub use balance::{BalanceRecord, largest_record};
pub use pool::PoolSnapshot;
pub use position::PositionSnapshot;
