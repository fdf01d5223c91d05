//! Shared application state for the Axum API server.

use std::sync::Arc;

use tokio::sync::Mutex;

use ledger_common::config::AppConfig;
use ledger_common::error::AppError;
use ledger_common::types::Price;
use ledger_engine::audit::AuditSink;
use ledger_engine::authorization::LiquidatorAllowlist;
use ledger_engine::price::{AssetScales, ManualPriceFeed};
use ledger_engine::transfer::InMemoryBank;
use ledger_engine::{Collaborators, LedgerParams, Vault};

/// Application state shared across all route handlers via Axum `State`.
///
/// The vault sits behind one async mutex so transitions are serialized.
/// The price feed and bank are also held directly for the admin routes.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Mutex<Vault>>,
    pub price_feed: Arc<ManualPriceFeed>,
    pub bank: Arc<InMemoryBank>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, audit: Arc<dyn AuditSink>) -> Result<Self, AppError> {
        let params = LedgerParams::new(
            config.collateralization_ratio,
            AssetScales::new(config.collateral_decimals, config.debt_decimals),
        )?;
        let price_feed = Arc::new(ManualPriceFeed::new(Price::new(
            config.initial_price,
            config.price_decimals,
        )));
        let bank = Arc::new(InMemoryBank::new(config.custody_account.clone()));
        let liquidators = Arc::new(LiquidatorAllowlist::new(config.liquidators.iter().cloned()));

        if liquidators.is_empty() {
            tracing::warn!("No liquidators configured, unhealthy positions cannot be liquidated");
        }

        let vault = Vault::new(
            params,
            Collaborators {
                transfer: bank.clone(),
                price_feed: price_feed.clone(),
                liquidators,
                audit,
            },
        );

        Ok(Self {
            vault: Arc::new(Mutex::new(vault)),
            price_feed,
            bank,
            config,
        })
    }
}
