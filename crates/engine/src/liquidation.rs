//! Liquidation of unhealthy positions.
//!
//! All or nothing: the liquidator pays the account's entire recorded debt and
//! receives its entire recorded collateral, and both balances are zeroed in one
//! commit. There is no partial liquidation and no seizure discount.

use ledger_common::error::LedgerError;
use ledger_common::types::{AccountId, Asset, LedgerEvent};

use crate::health;
use crate::vault::Vault;

/// Result of a successful liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationOutcome {
    /// Debt-asset units paid in by the liquidator
    pub debt_cleared: u128,
    /// Collateral-asset units released to the liquidator
    pub collateral_seized: u128,
}

impl Vault {
    /// Clear `account`'s debt with the caller's funds and hand its collateral
    /// to the caller.
    ///
    /// Fails with `Unauthorized` unless the policy admits `caller`, and with
    /// `PositionHealthy` unless `account` is below the ratio-padded threshold.
    /// A zeroed account is healthy, so liquidating it twice fails.
    pub fn liquidate(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<LiquidationOutcome, LedgerError> {
        if !self.liquidators.is_authorized_liquidator(caller) {
            tracing::warn!(caller = %caller, account = %account, "Unauthorized liquidation attempt");
            return Err(LedgerError::Unauthorized);
        }

        let position = self.position(account);
        if health::position_is_healthy(&self.conversion()?, &position)? {
            tracing::debug!(account = %account, "Liquidation rejected: position is healthy");
            return Err(LedgerError::PositionHealthy);
        }

        let update = self.ledger().stage_clear(account)?;
        let outcome = LiquidationOutcome {
            debt_cleared: position.borrowed_debt,
            collateral_seized: position.deposited_collateral,
        };

        self.transfer
            .transfer_from(Asset::Debt, caller, outcome.debt_cleared)?;
        if let Err(err) =
            self.transfer
                .transfer_to(Asset::Collateral, caller, outcome.collateral_seized)
        {
            return Err(self.refund_liquidator(caller, outcome.debt_cleared, err));
        }

        self.commit(update);

        tracing::warn!(
            liquidator = %caller,
            account = %account,
            debt_cleared = outcome.debt_cleared,
            collateral_seized = outcome.collateral_seized,
            "Position liquidated"
        );
        self.emit(LedgerEvent::liquidation(
            caller.clone(),
            account.clone(),
            outcome.debt_cleared,
            outcome.collateral_seized,
        ));

        Ok(outcome)
    }

    /// Accounts currently below the ratio-padded threshold, sorted by id.
    pub fn liquidatable_accounts(&self) -> Result<Vec<AccountId>, LedgerError> {
        let conversion = self.conversion()?;
        let mut accounts = Vec::new();
        for (account, position) in self.ledger().accounts() {
            if !health::position_is_healthy(&conversion, position)? {
                accounts.push(account.clone());
            }
        }
        accounts.sort();
        Ok(accounts)
    }

    /// Return the debt payment after a failed collateral release.
    ///
    /// Yields the error to surface: the release failure itself, or a combined
    /// `TransferFailed` naming the stranded payment if the refund fails too.
    fn refund_liquidator(&self, caller: &AccountId, amount: u128, cause: LedgerError) -> LedgerError {
        match self.transfer.transfer_to(Asset::Debt, caller, amount) {
            Ok(()) => {
                tracing::warn!(liquidator = %caller, amount, "Collateral release failed, debt payment refunded");
                cause
            }
            Err(refund_err) => {
                tracing::error!(
                    liquidator = %caller,
                    amount,
                    error = %refund_err,
                    "Collateral release failed and debt refund failed"
                );
                LedgerError::TransferFailed(format!(
                    "{}; refund of {} debt to {} also failed, payment held in custody: {}",
                    cause, amount, caller, refund_err
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::authorization::SingleLiquidator;
    use crate::conversion::LedgerParams;
    use crate::ledger::Totals;
    use crate::price::{AssetScales, ManualPriceFeed, ratio_wad};
    use crate::transfer::{AssetTransfer, InMemoryBank};
    use crate::vault::Collaborators;
    use ledger_common::types::{OperationKind, Price};

    const RATIO: u128 = 1_500_000_000_000_000_000;

    /// Bank whose payouts to the owner fail: collateral always, debt when
    /// `refunds_blocked` is set.
    struct StuckCollateral(InMemoryBank, bool);

    impl AssetTransfer for StuckCollateral {
        fn transfer_from(
            &self,
            asset: Asset,
            payer: &AccountId,
            amount: u128,
        ) -> Result<(), LedgerError> {
            self.0.transfer_from(asset, payer, amount)
        }

        fn transfer_to(
            &self,
            asset: Asset,
            payee: &AccountId,
            amount: u128,
        ) -> Result<(), LedgerError> {
            let blocked = asset == Asset::Collateral || self.1;
            if blocked && payee.as_str() == "owner" {
                return Err(LedgerError::TransferFailed("custody frozen".to_string()));
            }
            self.0.transfer_to(asset, payee, amount)
        }
    }

    fn owner() -> AccountId {
        AccountId::new("owner")
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn open_position(
        transfer: Arc<dyn AssetTransfer>,
        feed: Arc<ManualPriceFeed>,
        audit: Arc<MemoryAuditSink>,
    ) -> Vault {
        let mut vault = Vault::new(
            LedgerParams::new(RATIO, AssetScales::default()).unwrap(),
            Collaborators {
                transfer,
                price_feed: feed,
                liquidators: Arc::new(SingleLiquidator::new(owner())),
                audit,
            },
        );
        vault.deposit(&alice(), 3).unwrap();
        vault.borrow(&alice(), 4000).unwrap();
        vault
    }

    fn funded_bank() -> InMemoryBank {
        let bank = InMemoryBank::new(AccountId::new("vault"));
        bank.mint(Asset::Collateral, &alice(), 3).unwrap();
        bank.mint(Asset::Debt, bank.custody(), 10_000).unwrap();
        bank.mint(Asset::Debt, &owner(), 10_000).unwrap();
        bank
    }

    #[test]
    fn test_liquidation_after_price_drop() {
        let bank = Arc::new(funded_bank());
        let feed = Arc::new(ManualPriceFeed::from_wad(ratio_wad(1, 2000).unwrap()));
        let audit = Arc::new(MemoryAuditSink::new());
        let mut vault = open_position(bank.clone(), feed.clone(), audit.clone());

        assert_eq!(
            vault.liquidate(&owner(), &alice()),
            Err(LedgerError::PositionHealthy)
        );

        feed.set_price(Price::new(ratio_wad(1, 1000).unwrap(), 18));
        assert_eq!(vault.liquidatable_accounts().unwrap(), vec![alice()]);

        let outcome = vault.liquidate(&owner(), &alice()).unwrap();
        assert_eq!(
            outcome,
            LiquidationOutcome {
                debt_cleared: 4000,
                collateral_seized: 3
            }
        );
        assert_eq!(vault.deposits(&alice()), 0);
        assert_eq!(vault.borrows(&alice()), 0);
        assert_eq!(vault.totals(), Totals::default());
        assert_eq!(bank.balance_of(Asset::Collateral, &owner()), 3);
        assert_eq!(bank.balance_of(Asset::Debt, &owner()), 6000);

        let last = audit.events().pop().unwrap();
        assert_eq!(last.kind, OperationKind::Liquidate);
        assert_eq!(last.actor, Some(owner()));
        assert_eq!(last.seized_collateral, Some(3));

        // Nothing left to liquidate
        assert_eq!(
            vault.liquidate(&owner(), &alice()),
            Err(LedgerError::PositionHealthy)
        );
        assert!(vault.liquidatable_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_unauthorized_caller() {
        let bank = Arc::new(funded_bank());
        let feed = Arc::new(ManualPriceFeed::from_wad(ratio_wad(1, 2000).unwrap()));
        let mut vault = open_position(bank, feed.clone(), Arc::new(MemoryAuditSink::new()));
        feed.set_price(Price::new(ratio_wad(1, 1000).unwrap(), 18));

        assert_eq!(
            vault.liquidate(&AccountId::new("mallory"), &alice()),
            Err(LedgerError::Unauthorized)
        );
        assert_eq!(vault.borrows(&alice()), 4000);
    }

    #[test]
    fn test_liquidator_without_funds() {
        let bank = InMemoryBank::new(AccountId::new("vault"));
        bank.mint(Asset::Collateral, &alice(), 3).unwrap();
        bank.mint(Asset::Debt, bank.custody(), 10_000).unwrap();
        let bank = Arc::new(bank);
        let feed = Arc::new(ManualPriceFeed::from_wad(ratio_wad(1, 2000).unwrap()));
        let mut vault = open_position(bank, feed.clone(), Arc::new(MemoryAuditSink::new()));
        feed.set_price(Price::new(ratio_wad(1, 1000).unwrap(), 18));

        assert!(matches!(
            vault.liquidate(&owner(), &alice()),
            Err(LedgerError::TransferFailed(_))
        ));
        assert_eq!(vault.deposits(&alice()), 3);
        assert_eq!(vault.borrows(&alice()), 4000);
    }

    #[test]
    fn test_failed_collateral_release_refunds_liquidator() {
        let bank = Arc::new(StuckCollateral(funded_bank(), false));
        let feed = Arc::new(ManualPriceFeed::from_wad(ratio_wad(1, 2000).unwrap()));
        let audit = Arc::new(MemoryAuditSink::new());
        let mut vault = open_position(bank.clone(), feed.clone(), audit.clone());
        feed.set_price(Price::new(ratio_wad(1, 1000).unwrap(), 18));

        assert!(matches!(
            vault.liquidate(&owner(), &alice()),
            Err(LedgerError::TransferFailed(_))
        ));
        assert_eq!(bank.0.balance_of(Asset::Debt, &owner()), 10_000);
        assert_eq!(vault.deposits(&alice()), 3);
        assert_eq!(vault.borrows(&alice()), 4000);
        // Only the deposit and borrow were audited
        assert_eq!(audit.len(), 2);
    }

    #[test]
    fn test_failed_refund_reports_stranded_payment() {
        let bank = Arc::new(StuckCollateral(funded_bank(), true));
        let feed = Arc::new(ManualPriceFeed::from_wad(ratio_wad(1, 2000).unwrap()));
        let audit = Arc::new(MemoryAuditSink::new());
        let mut vault = open_position(bank.clone(), feed.clone(), audit.clone());
        feed.set_price(Price::new(ratio_wad(1, 1000).unwrap(), 18));

        let message = match vault.liquidate(&owner(), &alice()) {
            Err(LedgerError::TransferFailed(message)) => message,
            other => panic!("expected TransferFailed, got {:?}", other),
        };
        assert!(message.contains("custody frozen"));
        assert!(message.contains("refund of 4000 debt to owner also failed"));

        // Payment stays in custody, the ledger is untouched
        assert_eq!(bank.0.balance_of(Asset::Debt, &owner()), 6000);
        assert_eq!(vault.deposits(&alice()), 3);
        assert_eq!(vault.borrows(&alice()), 4000);
        assert_eq!(audit.len(), 2);
    }
}
