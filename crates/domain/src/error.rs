use thiserror::Error;

/// Errors raised by domain constructors and math.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A caller supplied a setting outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A tick range whose lower bound is not below its upper bound.
    #[error("invalid tick range [{lower}, {upper}]")]
    InvalidRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
    },
    /// A computed tick does not fit the tick index type.
    #[error("tick {0} is out of bounds")]
    TickOverflow(i64),
    /// Fixed-point or decimal arithmetic failed.
    #[error("math error: {0}")]
    Math(&'static str),
}
