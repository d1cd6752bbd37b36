pub mod tick_range;

pub use tick_range::TickRange;
