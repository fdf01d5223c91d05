//! Operator routes for the reference collaborators.

use axum::extract::State;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ledger_common::error::AppError;
use ledger_common::types::{AccountId, Asset, Price};

use crate::middleware::auth::AdminUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/price", put(set_price))
        .route("/api/admin/mint", post(mint))
}

#[derive(Debug, Deserialize)]
pub struct MintRequest {
    pub asset: Asset,
    pub account: AccountId,
    #[serde(deserialize_with = "ledger_common::types::amount_string::deserialize")]
    pub amount: u128,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub asset: Asset,
    pub account: AccountId,
    #[serde(with = "ledger_common::types::amount_string")]
    pub balance: u128,
}

/// PUT /api/admin/price: replace the price the vault reads.
///
/// Takes the vault lock so no transition observes the change mid-flight.
async fn set_price(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(price): Json<Price>,
) -> Result<Json<Price>, AppError> {
    let _vault = state.vault.lock().await;
    state.price_feed.set_price(price);
    tracing::info!(admin = %admin.account, price = %price, "Price updated by admin");
    Ok(Json(price))
}

/// POST /api/admin/mint: credit an account in the reference bank.
async fn mint(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<MintRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    state
        .bank
        .mint(request.asset, &request.account, request.amount)?;
    tracing::info!(
        admin = %admin.account,
        asset = %request.asset,
        account = %request.account,
        amount = request.amount,
        "Balance minted"
    );

    Ok(Json(BalanceResponse {
        asset: request.asset,
        balance: state.bank.balance_of(request.asset, &request.account),
        account: request.account,
    }))
}
