//! Accounting core of the collateral ledger.
//!
//! Leaf-first: [`math`] (wad arithmetic) → [`price`] / [`conversion`]
//! (unit conversion) → [`ledger`] (balances) → [`health`] (thresholds) →
//! [`vault`] and [`liquidation`] (transitions). Collaborators are injected
//! through the [`transfer`], [`price`], [`authorization`] and [`audit`] traits.

pub mod audit;
pub mod authorization;
pub mod conversion;
pub mod health;
pub mod ledger;
pub mod liquidation;
pub mod math;
pub mod price;
pub mod transfer;
pub mod vault;

pub use conversion::{LedgerParams, PriceConversion};
pub use ledger::{Position, Totals};
pub use liquidation::LiquidationOutcome;
pub use vault::{Collaborators, Vault};
