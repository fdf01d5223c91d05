//! Conversion between debt-asset and collateral-asset units.
//!
//! `required_collateral` rounds up and `maximum_borrowing` rounds down, so the
//! two are not inverses: a round trip can tighten the bound, never loosen it.

use ledger_common::error::LedgerError;
use ledger_common::types::Price;

use crate::math::{self, WAD};
use crate::price::AssetScales;

/// Immutable market parameters fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerParams {
    collateralization_ratio: u128,
    scales: AssetScales,
}

impl LedgerParams {
    /// `collateralization_ratio` is a wad and must be strictly greater than 1.0.
    pub fn new(collateralization_ratio: u128, scales: AssetScales) -> Result<Self, LedgerError> {
        if collateralization_ratio <= WAD {
            return Err(LedgerError::InvalidParameter(format!(
                "collateralization ratio {} must exceed 1.0 ({})",
                collateralization_ratio, WAD
            )));
        }

        Ok(Self {
            collateralization_ratio,
            scales,
        })
    }

    pub fn collateralization_ratio(&self) -> u128 {
        self.collateralization_ratio
    }

    pub fn scales(&self) -> AssetScales {
        self.scales
    }

    /// Bind these parameters to a freshly read price.
    ///
    /// A zero price cannot bound borrowing in either direction and fails with
    /// `DivideByZero`.
    pub fn conversion(&self, price: Price) -> Result<PriceConversion, LedgerError> {
        let price_wad = self.scales.normalize(price)?;
        if price_wad == 0 {
            return Err(LedgerError::DivideByZero);
        }
        Ok(PriceConversion {
            price_wad,
            collateralization_ratio: self.collateralization_ratio,
        })
    }
}

/// Parameters plus one price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceConversion {
    /// Collateral base units per debt base unit, as a wad
    pub price_wad: u128,
    pub collateralization_ratio: u128,
}

impl PriceConversion {
    /// Collateral needed to back `debt_amount` with the full ratio margin. Rounds up.
    pub fn required_collateral(&self, debt_amount: u128) -> Result<u128, LedgerError> {
        let value = math::mul_up(debt_amount, self.price_wad)?;
        math::mul_up(value, self.collateralization_ratio)
    }

    /// Debt that `collateral_amount` can back with the full ratio margin. Rounds down.
    pub fn maximum_borrowing(&self, collateral_amount: u128) -> Result<u128, LedgerError> {
        let value = math::div_down(collateral_amount, self.price_wad)?;
        math::div_down(value, self.collateralization_ratio)
    }

    /// Break-even collateral value of `debt_amount`, no margin. Rounds up.
    pub fn collateral_value(&self, debt_amount: u128) -> Result<u128, LedgerError> {
        math::mul_up(debt_amount, self.price_wad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::ratio_wad;

    const RATIO: u128 = 1_500_000_000_000_000_000;

    fn conversion(numerator: u128, denominator: u128) -> PriceConversion {
        PriceConversion {
            price_wad: ratio_wad(numerator, denominator).unwrap(),
            collateralization_ratio: RATIO,
        }
    }

    #[test]
    fn test_ratio_must_exceed_one() {
        assert!(matches!(
            LedgerParams::new(WAD, AssetScales::default()),
            Err(LedgerError::InvalidParameter(_))
        ));
        assert!(LedgerParams::new(0, AssetScales::default()).is_err());
        assert!(LedgerParams::new(WAD + 1, AssetScales::default()).is_ok());
    }

    #[test]
    fn test_reference_example() {
        let conv = conversion(1, 2000);
        assert_eq!(conv.required_collateral(4000).unwrap(), 3);
        assert_eq!(conv.maximum_borrowing(3).unwrap(), 4000);
    }

    #[test]
    fn test_required_collateral_rounds_up() {
        let conv = conversion(1, 2000);
        // 1/2000 rounds to a whole unit, then 1.5 rounds to 2
        assert_eq!(conv.required_collateral(1).unwrap(), 2);
        assert_eq!(conv.required_collateral(4001).unwrap(), 5);
        assert_eq!(conv.required_collateral(0).unwrap(), 0);
    }

    #[test]
    fn test_maximum_borrowing_rounds_down() {
        let conv = conversion(1, 2000);
        assert_eq!(conv.maximum_borrowing(1).unwrap(), 1333);
        assert_eq!(conv.maximum_borrowing(0).unwrap(), 0);
    }

    #[test]
    fn test_round_trip_never_loosens() {
        let conv = conversion(1, 2000);
        for debt in [1u128, 2, 999, 1333, 1334, 4000, 4001, 123_456] {
            let collateral = conv.required_collateral(debt).unwrap();
            // Posting the required collateral always covers the debt
            assert!(conv.maximum_borrowing(collateral).unwrap() >= debt);
        }
    }

    #[test]
    fn test_asymmetry_is_observable() {
        let conv = conversion(1, 2000);
        let required = conv.required_collateral(1).unwrap();
        assert_eq!(required, 2);
        assert_eq!(conv.maximum_borrowing(required).unwrap(), 2666);
        // Exact multiples agree in both directions
        assert_eq!(conv.maximum_borrowing(conv.required_collateral(4000).unwrap()).unwrap(), 4000);
    }

    #[test]
    fn test_zero_price_cannot_bound_borrowing() {
        let conv = PriceConversion {
            price_wad: 0,
            collateralization_ratio: RATIO,
        };
        assert_eq!(conv.maximum_borrowing(3), Err(LedgerError::DivideByZero));
        assert_eq!(conv.required_collateral(4000).unwrap(), 0);
    }

    #[test]
    fn test_zero_price_rejected_when_bound() {
        let params = LedgerParams::new(RATIO, AssetScales::default()).unwrap();
        assert_eq!(
            params.conversion(Price::new(0, 18)),
            Err(LedgerError::DivideByZero)
        );
        // Tiny prices round up instead of collapsing to zero
        let conv = params.conversion(Price::new(1, 30)).unwrap();
        assert_eq!(conv.price_wad, 1);
    }

    #[test]
    fn test_collateral_value_has_no_margin() {
        let conv = conversion(1, 2000);
        assert_eq!(conv.collateral_value(4000).unwrap(), 2);
        assert_eq!(conv.collateral_value(4001).unwrap(), 3);
    }

    #[test]
    fn test_params_conversion_normalizes_price() {
        let params = LedgerParams::new(RATIO, AssetScales::new(18, 6)).unwrap();
        let conv = params.conversion(Price::new(50_000, 8)).unwrap();
        // 4000 whole debt units need 3 whole collateral units
        assert_eq!(
            conv.required_collateral(4_000_000_000).unwrap(),
            3 * WAD
        );
        assert_eq!(conv.maximum_borrowing(3 * WAD).unwrap(), 4_000_000_000);
    }
}
