//! Per-account balances and protocol aggregates.
//!
//! Transitions never touch the store while they validate. Each `stage_*` call
//! computes the complete post-state of one account and the aggregates into a
//! [`StagedUpdate`]; [`Ledger::commit`] installs it in one step. Dropping a
//! staged update discards it.

use std::collections::HashMap;

use serde::Serialize;

use ledger_common::error::LedgerError;
use ledger_common::types::AccountId;

/// One account's balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Units of the collateral asset
    #[serde(with = "ledger_common::types::amount_string")]
    pub deposited_collateral: u128,
    /// Units of the borrowable asset
    #[serde(with = "ledger_common::types::amount_string")]
    pub borrowed_debt: u128,
}

impl Position {
    pub fn is_zero(&self) -> bool {
        self.deposited_collateral == 0 && self.borrowed_debt == 0
    }
}

/// Ledger-wide sums of every account's balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    #[serde(with = "ledger_common::types::amount_string")]
    pub total_deposits: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub total_borrows: u128,
}

/// Post-state of a single transition, not yet visible to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpdate {
    pub account: AccountId,
    pub position: Position,
    pub totals: Totals,
}

/// Keyed store of positions plus the aggregate counters.
#[derive(Debug, Default)]
pub struct Ledger {
    positions: HashMap<AccountId, Position>,
    totals: Totals,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balances of `account`; zero for an account never seen.
    pub fn position(&self, account: &AccountId) -> Position {
        self.positions.get(account).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Every account that has ever held a position, including zeroed ones.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    pub fn stage_add_collateral(
        &self,
        account: &AccountId,
        amount: u128,
    ) -> Result<StagedUpdate, LedgerError> {
        let mut position = self.position(account);
        let mut totals = self.totals;
        position.deposited_collateral = position
            .deposited_collateral
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        totals.total_deposits = totals
            .total_deposits
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(self.staged(account, position, totals))
    }

    pub fn stage_remove_collateral(
        &self,
        account: &AccountId,
        amount: u128,
    ) -> Result<StagedUpdate, LedgerError> {
        let mut position = self.position(account);
        let mut totals = self.totals;
        position.deposited_collateral = position
            .deposited_collateral
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientCollateral)?;
        // Aggregate can only underflow if it has drifted from the sum.
        totals.total_deposits = totals
            .total_deposits
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientCollateral)?;
        Ok(self.staged(account, position, totals))
    }

    pub fn stage_add_debt(
        &self,
        account: &AccountId,
        amount: u128,
    ) -> Result<StagedUpdate, LedgerError> {
        let mut position = self.position(account);
        let mut totals = self.totals;
        position.borrowed_debt = position
            .borrowed_debt
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        totals.total_borrows = totals
            .total_borrows
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(self.staged(account, position, totals))
    }

    pub fn stage_remove_debt(
        &self,
        account: &AccountId,
        amount: u128,
    ) -> Result<StagedUpdate, LedgerError> {
        let mut position = self.position(account);
        let mut totals = self.totals;
        position.borrowed_debt = position
            .borrowed_debt
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDebt)?;
        totals.total_borrows = totals
            .total_borrows
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDebt)?;
        Ok(self.staged(account, position, totals))
    }

    /// Zero both balances of `account`, removing its contribution to the aggregates.
    pub fn stage_clear(&self, account: &AccountId) -> Result<StagedUpdate, LedgerError> {
        let current = self.position(account);
        let totals = Totals {
            total_deposits: self
                .totals
                .total_deposits
                .checked_sub(current.deposited_collateral)
                .ok_or(LedgerError::InsufficientCollateral)?,
            total_borrows: self
                .totals
                .total_borrows
                .checked_sub(current.borrowed_debt)
                .ok_or(LedgerError::InsufficientDebt)?,
        };
        Ok(self.staged(account, Position::default(), totals))
    }

    /// Install a staged post-state.
    pub fn commit(&mut self, update: StagedUpdate) {
        self.positions.insert(update.account, update.position);
        self.totals = update.totals;
        debug_assert!(self.verify_totals().is_ok(), "aggregate drifted from sum");
    }

    /// Recompute the per-account sums and compare them with the aggregates.
    pub fn verify_totals(&self) -> Result<(), Totals> {
        let mut sums = Totals::default();
        for position in self.positions.values() {
            sums.total_deposits = sums
                .total_deposits
                .saturating_add(position.deposited_collateral);
            sums.total_borrows = sums.total_borrows.saturating_add(position.borrowed_debt);
        }

        if sums == self.totals { Ok(()) } else { Err(sums) }
    }

    fn staged(&self, account: &AccountId, position: Position, totals: Totals) -> StagedUpdate {
        StagedUpdate {
            account: account.clone(),
            position,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn bob() -> AccountId {
        AccountId::new("bob")
    }

    #[test]
    fn test_unseen_account_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.position(&alice()), Position::default());
        assert!(ledger.position(&alice()).is_zero());
        assert_eq!(ledger.totals(), Totals::default());
    }

    #[test]
    fn test_staging_does_not_mutate() {
        let ledger = Ledger::new();
        let staged = ledger.stage_add_collateral(&alice(), 10).unwrap();
        assert_eq!(staged.position.deposited_collateral, 10);
        assert_eq!(staged.totals.total_deposits, 10);
        assert_eq!(ledger.position(&alice()).deposited_collateral, 0);
        assert_eq!(ledger.totals().total_deposits, 0);
    }

    #[test]
    fn test_commit_keeps_totals_in_sync() {
        let mut ledger = Ledger::new();
        let update = ledger.stage_add_collateral(&alice(), 10).unwrap();
        ledger.commit(update);
        let update = ledger.stage_add_collateral(&bob(), 5).unwrap();
        ledger.commit(update);
        let update = ledger.stage_add_debt(&bob(), 7).unwrap();
        ledger.commit(update);
        let update = ledger.stage_remove_collateral(&alice(), 4).unwrap();
        ledger.commit(update);

        assert_eq!(ledger.totals().total_deposits, 11);
        assert_eq!(ledger.totals().total_borrows, 7);
        assert!(ledger.verify_totals().is_ok());
    }

    #[test]
    fn test_subtraction_never_wraps() {
        let mut ledger = Ledger::new();
        let update = ledger.stage_add_collateral(&alice(), 3).unwrap();
        ledger.commit(update);

        assert_eq!(
            ledger.stage_remove_collateral(&alice(), 4),
            Err(LedgerError::InsufficientCollateral)
        );
        assert_eq!(
            ledger.stage_remove_debt(&alice(), 1),
            Err(LedgerError::InsufficientDebt)
        );
        // Another account's balance does not help
        assert_eq!(
            ledger.stage_remove_collateral(&bob(), 1),
            Err(LedgerError::InsufficientCollateral)
        );
    }

    #[test]
    fn test_addition_overflow() {
        let mut ledger = Ledger::new();
        let update = ledger.stage_add_debt(&alice(), u128::MAX).unwrap();
        ledger.commit(update);
        assert_eq!(ledger.stage_add_debt(&alice(), 1), Err(LedgerError::Overflow));
        // Aggregate overflows even when the new account's own field would not
        assert_eq!(ledger.stage_add_debt(&bob(), 1), Err(LedgerError::Overflow));
    }

    #[test]
    fn test_clear_removes_contribution() {
        let mut ledger = Ledger::new();
        for (account, collateral, debt) in [(alice(), 3, 4000), (bob(), 30, 100)] {
            let update = ledger.stage_add_collateral(&account, collateral).unwrap();
            ledger.commit(update);
            let update = ledger.stage_add_debt(&account, debt).unwrap();
            ledger.commit(update);
        }

        let update = ledger.stage_clear(&alice()).unwrap();
        ledger.commit(update);

        assert!(ledger.position(&alice()).is_zero());
        assert_eq!(
            ledger.totals(),
            Totals {
                total_deposits: 30,
                total_borrows: 100
            }
        );
        // Zeroed accounts stay in the store
        assert_eq!(ledger.accounts().count(), 2);
        assert!(ledger.verify_totals().is_ok());
    }
}
