//! Liquidation authorization capability.

use std::collections::HashSet;

use ledger_common::types::AccountId;

/// Decides who may liquidate. Consulted only by `liquidate`.
pub trait LiquidatorPolicy: Send + Sync {
    fn is_authorized_liquidator(&self, caller: &AccountId) -> bool;
}

/// A single privileged operator.
pub struct SingleLiquidator {
    operator: AccountId,
}

impl SingleLiquidator {
    pub fn new(operator: AccountId) -> Self {
        Self { operator }
    }
}

impl LiquidatorPolicy for SingleLiquidator {
    fn is_authorized_liquidator(&self, caller: &AccountId) -> bool {
        *caller == self.operator
    }
}

/// A fixed set of operators. An empty allowlist authorizes nobody.
#[derive(Default)]
pub struct LiquidatorAllowlist {
    allowed: HashSet<AccountId>,
}

impl LiquidatorAllowlist {
    pub fn new(allowed: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl LiquidatorPolicy for LiquidatorAllowlist {
    fn is_authorized_liquidator(&self, caller: &AccountId) -> bool {
        self.allowed.contains(caller)
    }
}
