//! Wad fixed-point arithmetic.
//!
//! Values are `u128` integers scaled by 10^18. Products are formed in 256 bits
//! so `x * y` never overflows before the final division; only narrowing the
//! result back to `u128` can fail.

use alloy::primitives::U256;

use ledger_common::error::LedgerError;

/// 1.0 as a wad.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Direction to round a truncating division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `floor(x * y / 1e18)`
pub fn mul_down(x: u128, y: u128) -> Result<u128, LedgerError> {
    mul_div(x, y, WAD, Rounding::Down)
}

/// `ceil(x * y / 1e18)`
pub fn mul_up(x: u128, y: u128) -> Result<u128, LedgerError> {
    mul_div(x, y, WAD, Rounding::Up)
}

/// `floor(x * 1e18 / y)`
pub fn div_down(x: u128, y: u128) -> Result<u128, LedgerError> {
    mul_div(x, WAD, y, Rounding::Down)
}

/// `ceil(x * 1e18 / y)`
pub fn div_up(x: u128, y: u128) -> Result<u128, LedgerError> {
    mul_div(x, WAD, y, Rounding::Up)
}

/// Wad multiply with an explicit rounding direction.
pub fn mul(x: u128, y: u128, rounding: Rounding) -> Result<u128, LedgerError> {
    match rounding {
        Rounding::Down => mul_down(x, y),
        Rounding::Up => mul_up(x, y),
    }
}

/// Wad divide with an explicit rounding direction.
pub fn div(x: u128, y: u128, rounding: Rounding) -> Result<u128, LedgerError> {
    match rounding {
        Rounding::Down => div_down(x, y),
        Rounding::Up => div_up(x, y),
    }
}

/// `x * y / denominator` with a 256-bit intermediate.
pub fn mul_div(
    x: u128,
    y: u128,
    denominator: u128,
    rounding: Rounding,
) -> Result<u128, LedgerError> {
    if denominator == 0 {
        return Err(LedgerError::DivideByZero);
    }

    let product = U256::from(x) * U256::from(y);
    let denominator = U256::from(denominator);
    let quotient = product / denominator;
    let quotient = match rounding {
        Rounding::Down => quotient,
        Rounding::Up if (product % denominator).is_zero() => quotient,
        Rounding::Up => quotient + U256::from(1u8),
    };

    narrow(quotient)
}

/// `10^exponent` as a `u128`.
pub fn pow10(exponent: u32) -> Result<u128, LedgerError> {
    10u128.checked_pow(exponent).ok_or(LedgerError::Overflow)
}

fn narrow(value: U256) -> Result<u128, LedgerError> {
    u128::try_from(value).map_err(|_| LedgerError::Overflow)
}
