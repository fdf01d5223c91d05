//! Price capability and decimal-scale normalization.
//!
//! The feed quotes whole collateral units per whole debt unit. The engine works
//! in base units, so every read is rescaled through the two asset scales into a
//! wad of collateral base units per debt base unit before any comparison.

use std::sync::RwLock;

use ledger_common::error::LedgerError;
use ledger_common::types::Price;

use crate::math::{self, Rounding, WAD};

/// Source of the current exchange rate. Read once per health-dependent call.
pub trait PriceFeed: Send + Sync {
    fn current_price(&self) -> Price;
}

/// Decimal scales of the two assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetScales {
    pub collateral_decimals: u8,
    pub debt_decimals: u8,
}

impl AssetScales {
    pub fn new(collateral_decimals: u8, debt_decimals: u8) -> Self {
        Self {
            collateral_decimals,
            debt_decimals,
        }
    }

    /// Convert a feed price into a wad of collateral base units per debt base unit.
    ///
    /// Truncation rounds up: a larger price is the conservative side for
    /// required collateral, borrowing capacity and solvency alike.
    pub fn normalize(&self, price: Price) -> Result<u128, LedgerError> {
        let up = 18 + i32::from(self.collateral_decimals);
        let down = i32::from(self.debt_decimals) + i32::from(price.decimals);
        let exponent = up - down;

        if exponent >= 0 {
            price
                .mantissa
                .checked_mul(math::pow10(exponent as u32)?)
                .ok_or(LedgerError::Overflow)
        } else {
            let divisor = math::pow10(exponent.unsigned_abs())?;
            math::mul_div(price.mantissa, 1, divisor, Rounding::Up)
        }
    }
}

impl Default for AssetScales {
    fn default() -> Self {
        Self::new(18, 18)
    }
}

/// Price feed whose value is set explicitly (operator input, tests).
pub struct ManualPriceFeed {
    price: RwLock<Price>,
}

impl ManualPriceFeed {
    pub fn new(price: Price) -> Self {
        Self {
            price: RwLock::new(price),
        }
    }

    /// Shorthand for a price already expressed as a wad.
    pub fn from_wad(price_wad: u128) -> Self {
        Self::new(Price::new(price_wad, 18))
    }

    pub fn set_price(&self, price: Price) {
        let mut guard = self.price.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(old = %*guard, new = %price, "Price updated");
        *guard = price;
    }
}

impl PriceFeed for ManualPriceFeed {
    fn current_price(&self) -> Price {
        *self.price.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// `numerator / denominator` as a wad, rounded down. Convenience for quoting
/// prices such as 1/2000.
pub fn ratio_wad(numerator: u128, denominator: u128) -> Result<u128, LedgerError> {
    math::mul_div(numerator, WAD, denominator, Rounding::Down)
}
