//! Range calculator.
//!
//! Two conventions live here on purpose. Range construction is half-open:
//! a freshly computed range always satisfies `lower <= tick < upper`.
//! Membership is closed: a position counts as in range when
//! `lower <= tick <= upper`.

use crate::error::DomainError;
use crate::value_objects::tick_range::TickRange;

/// Computes a spacing-aligned range around `current_tick`.
///
/// Without a configured width the tightest range is returned: exactly one
/// spacing unit wide, anchored at the aligned tick at or below the current
/// tick. With a width `W`, `W / 2` ticks are placed on either side of the
/// current tick and each bound is rounded outward to the spacing grid.
///
/// # Errors
/// Returns [`DomainError::InvalidConfiguration`] when `tick_spacing <= 0` or
/// the width is not positive, and [`DomainError::TickOverflow`] if a bound
/// does not fit in an `i32`.
///
/// # Example
/// ```
/// use clmm_rebalancer_domain::math::calculate_optimal_range;
///
/// let range = calculate_optimal_range(-100, 60, None).unwrap();
/// assert_eq!((range.lower, range.upper), (-120, -60));
/// ```
pub fn calculate_optimal_range(
    current_tick: i32,
    tick_spacing: i32,
    configured_width: Option<i32>,
) -> Result<TickRange, DomainError> {
    if tick_spacing <= 0 {
        return Err(DomainError::InvalidConfiguration(format!(
            "tick spacing must be positive, got {tick_spacing}"
        )));
    }

    let tick = i64::from(current_tick);
    let spacing = i64::from(tick_spacing);

    let (lower, upper) = match configured_width {
        None => {
            let lower = floor_to_spacing(tick, spacing);
            (lower, lower + spacing)
        }
        Some(width) if width <= 0 => {
            return Err(DomainError::InvalidConfiguration(format!(
                "range width must be positive, got {width}"
            )));
        }
        Some(width) => {
            let half = i64::from(width) / 2;
            let lower = floor_to_spacing(tick - half, spacing);
            let mut upper = ceil_to_spacing(tick + half, spacing);
            // A width of 1 gives half = 0, which collapses onto an aligned tick.
            if upper <= tick {
                upper += spacing;
            }
            (lower, upper)
        }
    };

    Ok(TickRange {
        lower: to_tick(lower)?,
        upper: to_tick(upper)?,
    })
}

/// Whether `current_tick` lies within `[lower, upper]`, both ends inclusive.
#[must_use]
pub fn is_position_in_range(lower: i32, upper: i32, current_tick: i32) -> bool {
    lower <= current_tick && current_tick <= upper
}

fn floor_to_spacing(tick: i64, spacing: i64) -> i64 {
    tick.div_euclid(spacing) * spacing
}

fn ceil_to_spacing(tick: i64, spacing: i64) -> i64 {
    -(-tick).div_euclid(spacing) * spacing
}

fn to_tick(value: i64) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| DomainError::TickOverflow(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(tick: i32, spacing: i32, width: Option<i32>) -> (i32, i32) {
        let r = calculate_optimal_range(tick, spacing, width).unwrap();
        (r.lower, r.upper)
    }

    #[test]
    fn test_tightest_range() {
        assert_eq!(range(1000, 60, None), (960, 1020));
        assert_eq!(range(-100, 60, None), (-120, -60));
        assert_eq!(range(500, 1, None), (500, 501));
        assert_eq!(range(0, 10, None), (0, 10));
        assert_eq!(range(-60, 60, None), (-60, 0));
    }

    #[test]
    fn test_tightest_range_contains_tick() {
        for spacing in [1, 8, 60, 64, 128] {
            for tick in (-1000..1000).step_by(7) {
                let r = calculate_optimal_range(tick, spacing, None).unwrap();
                assert!(r.lower <= tick && tick < r.upper, "tick {tick} spacing {spacing}");
                assert!(r.is_aligned(spacing));
                assert_eq!(r.width(), i64::from(spacing));
            }
        }
    }

    #[test]
    fn test_centered_range() {
        assert_eq!(range(1000, 60, Some(600)), (660, 1320));
        assert_eq!(range(-1000, 60, Some(600)), (-1320, -660));
        assert_eq!(range(0, 10, Some(100)), (-50, 50));
    }

    #[test]
    fn test_centered_range_rounds_outward() {
        for width in [1, 2, 3, 59, 60, 61, 600, 1001] {
            for tick in (-500..500).step_by(13) {
                let r = calculate_optimal_range(tick, 60, Some(width)).unwrap();
                assert!(r.lower <= tick && tick < r.upper, "tick {tick} width {width}");
                assert!(r.is_aligned(60));
                assert!(r.width() >= i64::from(width / 2 * 2));
            }
        }
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(matches!(
            calculate_optimal_range(0, 0, None),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            calculate_optimal_range(0, -60, None),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            calculate_optimal_range(0, 60, Some(0)),
            Err(DomainError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            calculate_optimal_range(i32::MAX, 60, None),
            Err(DomainError::TickOverflow(_))
        ));
    }

    #[test]
    fn test_in_range_is_boundary_inclusive() {
        assert!(is_position_in_range(-100, 100, -100));
        assert!(is_position_in_range(-100, 100, 100));
        assert!(is_position_in_range(-100, 100, 0));
        assert!(!is_position_in_range(-100, 100, -101));
        assert!(!is_position_in_range(-100, 100, 101));
    }
}
