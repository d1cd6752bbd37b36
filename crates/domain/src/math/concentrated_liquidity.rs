use crate::error::DomainError;
use crate::math::price_tick::tick_to_sqrt_price;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Calculates liquidity for a given amount of token A over `[sqrt_a, sqrt_b]`.
/// L = amount_a * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount_a(
    amount_a: u64,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    let num = Decimal::from(amount_a)
        .checked_mul(lower)
        .and_then(|v| v.checked_mul(upper))
        .ok_or(DomainError::Math("liquidity overflow"))?;
    let liquidity = num
        .checked_div(upper - lower)
        .ok_or(DomainError::Math("division overflow"))?;
    liquidity
        .floor()
        .to_u128()
        .ok_or(DomainError::Math("liquidity out of range"))
}

/// Calculates liquidity for a given amount of token B over `[sqrt_a, sqrt_b]`.
/// L = amount_b / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount_b(
    amount_b: u64,
    sqrt_price_a: Decimal,
    sqrt_price_b: Decimal,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    let liquidity = Decimal::from(amount_b)
        .checked_div(upper - lower)
        .ok_or(DomainError::Math("division overflow"))?;
    liquidity
        .floor()
        .to_u128()
        .ok_or(DomainError::Math("liquidity out of range"))
}

/// Largest liquidity that both token maxima can fund at the current tick.
///
/// Below the range only token A is needed, above it only token B, inside
/// it the smaller of the two single-sided figures binds.
pub fn get_liquidity_for_amounts(
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
    amount_a: u64,
    amount_b: u64,
) -> Result<u128, DomainError> {
    if tick_lower >= tick_upper {
        return Err(DomainError::InvalidRange {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    let sqrt_lower = tick_to_sqrt_price(tick_lower)?;
    let sqrt_upper = tick_to_sqrt_price(tick_upper)?;

    if current_tick < tick_lower {
        get_liquidity_for_amount_a(amount_a, sqrt_lower, sqrt_upper)
    } else if current_tick >= tick_upper {
        get_liquidity_for_amount_b(amount_b, sqrt_lower, sqrt_upper)
    } else {
        let sqrt_current = tick_to_sqrt_price(current_tick)?;
        let from_a = get_liquidity_for_amount_a(amount_a, sqrt_current, sqrt_upper)?;
        let from_b = if sqrt_current == sqrt_lower {
            // Current price sits on the lower bound: the range needs no token B.
            from_a
        } else {
            get_liquidity_for_amount_b(amount_b, sqrt_lower, sqrt_current)?
        };
        Ok(from_a.min(from_b))
    }
}

fn ordered(a: Decimal, b: Decimal) -> Result<(Decimal, Decimal), DomainError> {
    if a <= Decimal::ZERO || b <= Decimal::ZERO {
        return Err(DomainError::Math("sqrt price must be positive"));
    }
    let (lower, upper) = if a < b { (a, b) } else { (b, a) };
    if lower == upper {
        return Err(DomainError::Math("empty price interval"));
    }
    Ok((lower, upper))
}
