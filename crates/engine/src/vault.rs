//! The vault: position transitions and read-only queries.
//!
//! Every transition follows the same shape:
//! 1. stage the post-state against the ledger (balance and overflow checks)
//! 2. read the price once and validate the staged position where required
//! 3. move assets through the transfer capability
//! 4. commit, then notify the audit sink
//!
//! A failure at any step returns before commit, so the ledger is untouched.

use std::sync::Arc;

use ledger_common::error::LedgerError;
use ledger_common::types::{AccountId, Asset, LedgerEvent, OperationKind, Price};

use crate::audit::AuditSink;
use crate::authorization::LiquidatorPolicy;
use crate::conversion::{LedgerParams, PriceConversion};
use crate::health::{self, AccountHealth};
use crate::ledger::{Ledger, Position, StagedUpdate, Totals};
use crate::price::PriceFeed;
use crate::transfer::AssetTransfer;

/// Collaborators injected into a [`Vault`].
pub struct Collaborators {
    pub transfer: Arc<dyn AssetTransfer>,
    pub price_feed: Arc<dyn PriceFeed>,
    pub liquidators: Arc<dyn LiquidatorPolicy>,
    pub audit: Arc<dyn AuditSink>,
}

/// Collateralized-lending ledger for one collateral asset and one borrowable asset.
///
/// Transitions take `&mut self`; hosts that share a vault across tasks wrap it
/// in a single lock.
pub struct Vault {
    params: LedgerParams,
    ledger: Ledger,
    pub(crate) transfer: Arc<dyn AssetTransfer>,
    price_feed: Arc<dyn PriceFeed>,
    pub(crate) liquidators: Arc<dyn LiquidatorPolicy>,
    audit: Arc<dyn AuditSink>,
}

impl Vault {
    pub fn new(params: LedgerParams, collaborators: Collaborators) -> Self {
        Self {
            params,
            ledger: Ledger::new(),
            transfer: collaborators.transfer,
            price_feed: collaborators.price_feed,
            liquidators: collaborators.liquidators,
            audit: collaborators.audit,
        }
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Credit collateral. Never needs a health check.
    pub fn deposit(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let update = self.ledger.stage_add_collateral(account, amount)?;
        self.transfer
            .transfer_from(Asset::Collateral, account, amount)?;
        self.finish(update, OperationKind::Deposit, amount);
        Ok(())
    }

    /// Take on debt. Fails with `PositionUnhealthy` if the resulting position
    /// would exceed the borrowing limit at the current price.
    pub fn borrow(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let update = self.ledger.stage_add_debt(account, amount)?;
        self.require_healthy(&update, OperationKind::Borrow, amount)?;
        self.transfer.transfer_to(Asset::Debt, account, amount)?;
        self.finish(update, OperationKind::Borrow, amount);
        Ok(())
    }

    /// Pay down debt. Fails with `InsufficientDebt` if `amount` exceeds it.
    pub fn repay(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let update = self.ledger.stage_remove_debt(account, amount).inspect_err(|_| {
            tracing::debug!(account = %account, amount, "Repay rejected: exceeds debt");
        })?;
        self.transfer.transfer_from(Asset::Debt, account, amount)?;
        self.finish(update, OperationKind::Repay, amount);
        Ok(())
    }

    /// Release collateral. Fails with `InsufficientCollateral` if `amount`
    /// exceeds the deposit, or `PositionUnhealthy` if the remainder would not
    /// cover the debt.
    pub fn withdraw(&mut self, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let update = self
            .ledger
            .stage_remove_collateral(account, amount)
            .inspect_err(|_| {
                tracing::debug!(account = %account, amount, "Withdraw rejected: exceeds deposit");
            })?;
        self.require_healthy(&update, OperationKind::Withdraw, amount)?;
        self.transfer
            .transfer_to(Asset::Collateral, account, amount)?;
        self.finish(update, OperationKind::Withdraw, amount);
        Ok(())
    }

    pub fn deposits(&self, account: &AccountId) -> u128 {
        self.ledger.position(account).deposited_collateral
    }

    pub fn borrows(&self, account: &AccountId) -> u128 {
        self.ledger.position(account).borrowed_debt
    }

    pub fn position(&self, account: &AccountId) -> Position {
        self.ledger.position(account)
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    pub fn is_healthy(&self, account: &AccountId) -> Result<bool, LedgerError> {
        health::position_is_healthy(&self.conversion()?, &self.ledger.position(account))
    }

    pub fn is_solvent(&self, account: &AccountId) -> Result<bool, LedgerError> {
        health::position_is_solvent(&self.conversion()?, &self.ledger.position(account))
    }

    /// Ratio-padded check applied to the aggregate counters.
    pub fn protocol_is_healthy(&self) -> Result<bool, LedgerError> {
        health::totals_are_healthy(&self.conversion()?, &self.ledger.totals())
    }

    /// Break-even check applied to the aggregate counters.
    pub fn protocol_is_solvent(&self) -> Result<bool, LedgerError> {
        health::totals_are_solvent(&self.conversion()?, &self.ledger.totals())
    }

    pub fn required_collateral(&self, debt_amount: u128) -> Result<u128, LedgerError> {
        self.conversion()?.required_collateral(debt_amount)
    }

    pub fn maximum_borrowing(&self, collateral_amount: u128) -> Result<u128, LedgerError> {
        self.conversion()?.maximum_borrowing(collateral_amount)
    }

    pub fn account_health(&self, account: &AccountId) -> Result<AccountHealth, LedgerError> {
        AccountHealth::evaluate(&self.conversion()?, &self.ledger.position(account))
    }

    pub fn current_price(&self) -> Price {
        self.price_feed.current_price()
    }

    /// Read the feed and bind it to the vault parameters. Never cached.
    pub(crate) fn conversion(&self) -> Result<PriceConversion, LedgerError> {
        self.params.conversion(self.price_feed.current_price())
    }

    fn require_healthy(
        &self,
        update: &StagedUpdate,
        kind: OperationKind,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let conversion = self.conversion()?;
        if health::position_is_healthy(&conversion, &update.position)? {
            return Ok(());
        }

        tracing::debug!(
            account = %update.account,
            operation = %kind,
            amount,
            collateral = update.position.deposited_collateral,
            debt = update.position.borrowed_debt,
            "Transition rejected: position would be unhealthy"
        );
        Err(LedgerError::PositionUnhealthy)
    }

    pub(crate) fn commit(&mut self, update: StagedUpdate) {
        self.ledger.commit(update);
    }

    pub(crate) fn emit(&self, event: LedgerEvent) {
        self.audit.record(event);
    }

    fn finish(&mut self, update: StagedUpdate, kind: OperationKind, amount: u128) {
        let account = update.account.clone();
        self.commit(update);

        tracing::info!(account = %account, operation = %kind, amount, "Transition committed");
        self.emit(LedgerEvent::new(kind, account, amount));
    }
}
