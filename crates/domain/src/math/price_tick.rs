use crate::error::DomainError;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

const Q64: u128 = 1 << 64;

/// Returns the square root of the price at a given tick.
/// sqrt(P) = 1.0001 ^ (tick / 2)
pub fn tick_to_sqrt_price(tick: i32) -> Result<Decimal, DomainError> {
    let base = 1.0001f64;
    let sqrt_f64 = base.powf(f64::from(tick) / 2.0);
    Decimal::from_f64(sqrt_f64).ok_or(DomainError::Math("overflow converting sqrt price"))
}

/// Converts a Q64.64 sqrt price into a plain sqrt price.
pub fn sqrt_price_x64_to_sqrt_price(sqrt_price_x64: u128) -> Result<Decimal, DomainError> {
    let raw = Decimal::from_u128(sqrt_price_x64)
        .ok_or(DomainError::Math("sqrt price exceeds decimal range"))?;
    let scale = Decimal::from_u128(Q64).ok_or(DomainError::Math("invalid Q64 scale"))?;
    raw.checked_div(scale)
        .ok_or(DomainError::Math("division overflow"))
}

/// Converts a Q64.64 sqrt price into a price (token B per token A, raw units).
pub fn sqrt_price_x64_to_price(sqrt_price_x64: u128) -> Result<Decimal, DomainError> {
    let sqrt = sqrt_price_x64_to_sqrt_price(sqrt_price_x64)?;
    sqrt.checked_mul(sqrt)
        .ok_or(DomainError::Math("price overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_to_sqrt_price() {
        assert_eq!(tick_to_sqrt_price(0).unwrap(), Decimal::ONE);

        // sqrt(1.0001^200) = 1.0001^100 ~= 1.010049
        let sqrt = tick_to_sqrt_price(200).unwrap().to_f64().unwrap();
        assert!((sqrt - 1.01004966).abs() < 1e-6);
    }

    #[test]
    fn test_sqrt_price_conversions() {
        assert_eq!(sqrt_price_x64_to_price(Q64).unwrap(), Decimal::ONE);
        assert_eq!(sqrt_price_x64_to_price(2 * Q64).unwrap(), Decimal::from(4));
        assert_eq!(sqrt_price_x64_to_sqrt_price(Q64 / 2).unwrap(), Decimal::new(5, 1));
    }
}
