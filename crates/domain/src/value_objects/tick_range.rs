use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `[lower, upper]` pair of tick indices with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    /// Lower tick.
    pub lower: i32,
    /// Upper tick.
    pub upper: i32,
}

impl TickRange {
    /// Creates a range, rejecting empty or inverted bounds.
    pub fn new(lower: i32, upper: i32) -> Result<Self, DomainError> {
        if lower >= upper {
            return Err(DomainError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Number of ticks covered.
    #[must_use]
    pub fn width(&self) -> i64 {
        i64::from(self.upper) - i64::from(self.lower)
    }

    /// Whether both bounds sit on the spacing grid.
    #[must_use]
    pub fn is_aligned(&self, tick_spacing: i32) -> bool {
        tick_spacing > 0 && self.lower % tick_spacing == 0 && self.upper % tick_spacing == 0
    }

    /// Whether `other` lies within one tick-spacing unit of `self` on both bounds.
    #[must_use]
    pub fn is_within_spacing_of(&self, other: &TickRange, tick_spacing: i32) -> bool {
        let spacing = i64::from(tick_spacing);
        (i64::from(self.lower) - i64::from(other.lower)).abs() < spacing
            && (i64::from(self.upper) - i64::from(other.upper)).abs() < spacing
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}
