//! Asset transfer capability.
//!
//! The engine only decides *whether* assets move; the transfer capability moves
//! them. Each call either fully succeeds or fails with `TransferFailed`.

use std::collections::HashMap;
use std::sync::Mutex;

use ledger_common::error::LedgerError;
use ledger_common::types::{AccountId, Asset};

/// Moves fungible balances between accounts and vault custody.
pub trait AssetTransfer: Send + Sync {
    /// Pull `amount` of `asset` from `payer` into custody.
    fn transfer_from(&self, asset: Asset, payer: &AccountId, amount: u128)
    -> Result<(), LedgerError>;

    /// Push `amount` of `asset` from custody to `payee`.
    fn transfer_to(&self, asset: Asset, payee: &AccountId, amount: u128)
    -> Result<(), LedgerError>;
}

/// In-process token balances with a single custody account.
///
/// Serves as the transfer capability for the API server and tests.
pub struct InMemoryBank {
    custody: AccountId,
    balances: Mutex<HashMap<(Asset, AccountId), u128>>,
}

impl InMemoryBank {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    /// Credit `amount` of `asset` to `account` out of thin air.
    pub fn mint(&self, asset: Asset, account: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let mut balances = self.lock()?;
        let balance = balances.entry((asset, account.clone())).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        tracing::debug!(%asset, account = %account, amount, "Minted balance");
        Ok(())
    }

    pub fn balance_of(&self, asset: Asset, account: &AccountId) -> u128 {
        self.lock()
            .map(|b| b.get(&(asset, account.clone())).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn move_balance(
        &self,
        asset: Asset,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let mut balances = self.lock()?;
        let available = balances.get(&(asset, from.clone())).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::TransferFailed(format!(
                "{} holds {} {} but {} was requested",
                from, available, asset, amount
            )));
        }
        let receiving = balances.get(&(asset, to.clone())).copied().unwrap_or(0);
        let credited = receiving.checked_add(amount).ok_or_else(|| {
            LedgerError::TransferFailed(format!("{} balance of {} would overflow", asset, to))
        })?;

        balances.insert((asset, from.clone()), available - amount);
        balances.insert((asset, to.clone()), credited);
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(Asset, AccountId), u128>>, LedgerError> {
        self.balances
            .lock()
            .map_err(|_| LedgerError::TransferFailed("balance store poisoned".to_string()))
    }
}

impl AssetTransfer for InMemoryBank {
    fn transfer_from(
        &self,
        asset: Asset,
        payer: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.move_balance(asset, payer, &self.custody, amount)
    }

    fn transfer_to(
        &self,
        asset: Asset,
        payee: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.move_balance(asset, &self.custody, payee, amount)
    }
}
