//! Health and solvency predicates.
//!
//! Two thresholds, kept apart on purpose:
//! - healthy: collateral covers debt with the collateralization ratio applied.
//!   Gates borrow and withdraw, and decides liquidation eligibility.
//! - solvent: collateral value at least equals debt value, no margin.
//!
//! The gap between them is the protocol's safety margin. Both are pure
//! functions of balances and one price observation, and apply equally to a
//! single position or to the aggregate counters.

use serde::Serialize;

use ledger_common::error::LedgerError;

use crate::conversion::PriceConversion;
use crate::ledger::{Position, Totals};

/// `maximum_borrowing(collateral) >= debt`
pub fn is_healthy(
    conversion: &PriceConversion,
    collateral: u128,
    debt: u128,
) -> Result<bool, LedgerError> {
    Ok(conversion.maximum_borrowing(collateral)? >= debt)
}

/// `collateral >= mul_up(debt, price)`
pub fn is_solvent(
    conversion: &PriceConversion,
    collateral: u128,
    debt: u128,
) -> Result<bool, LedgerError> {
    Ok(collateral >= conversion.collateral_value(debt)?)
}

pub fn position_is_healthy(
    conversion: &PriceConversion,
    position: &Position,
) -> Result<bool, LedgerError> {
    is_healthy(
        conversion,
        position.deposited_collateral,
        position.borrowed_debt,
    )
}

pub fn position_is_solvent(
    conversion: &PriceConversion,
    position: &Position,
) -> Result<bool, LedgerError> {
    is_solvent(
        conversion,
        position.deposited_collateral,
        position.borrowed_debt,
    )
}

pub fn totals_are_healthy(
    conversion: &PriceConversion,
    totals: &Totals,
) -> Result<bool, LedgerError> {
    is_healthy(conversion, totals.total_deposits, totals.total_borrows)
}

pub fn totals_are_solvent(
    conversion: &PriceConversion,
    totals: &Totals,
) -> Result<bool, LedgerError> {
    is_solvent(conversion, totals.total_deposits, totals.total_borrows)
}

/// Read-only summary of one account at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountHealth {
    #[serde(with = "ledger_common::types::amount_string")]
    pub deposits: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub borrows: u128,
    /// Debt the current collateral can back
    #[serde(with = "ledger_common::types::amount_string")]
    pub maximum_borrowing: u128,
    /// Collateral the current debt requires
    #[serde(with = "ledger_common::types::amount_string")]
    pub required_collateral: u128,
    pub healthy: bool,
    pub solvent: bool,
}

impl AccountHealth {
    pub fn evaluate(
        conversion: &PriceConversion,
        position: &Position,
    ) -> Result<Self, LedgerError> {
        let maximum_borrowing = conversion.maximum_borrowing(position.deposited_collateral)?;
        Ok(Self {
            deposits: position.deposited_collateral,
            borrows: position.borrowed_debt,
            maximum_borrowing,
            required_collateral: conversion.required_collateral(position.borrowed_debt)?,
            healthy: maximum_borrowing >= position.borrowed_debt,
            solvent: position_is_solvent(conversion, position)?,
        })
    }
}
