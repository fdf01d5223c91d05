//! Liquidation routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use ledger_common::error::AppError;
use ledger_common::types::AccountId;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/liquidations", get(list_liquidatable))
        .route("/api/liquidations/{account}", post(liquidate))
}

#[derive(Debug, Serialize)]
pub struct LiquidationResponse {
    pub account: AccountId,
    pub liquidator: AccountId,
    #[serde(with = "ledger_common::types::amount_string")]
    pub debt_cleared: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub collateral_seized: u128,
}

/// GET /api/liquidations: accounts currently eligible for liquidation.
async fn list_liquidatable(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountId>>, AppError> {
    let vault = state.vault.lock().await;
    Ok(Json(vault.liquidatable_accounts()?))
}

/// POST /api/liquidations/:account: liquidate `account` as the caller.
async fn liquidate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account): Path<String>,
) -> Result<Json<LiquidationResponse>, AppError> {
    let account = AccountId::new(account);
    let mut vault = state.vault.lock().await;
    let outcome = vault.liquidate(&auth.account, &account)?;

    Ok(Json(LiquidationResponse {
        account,
        liquidator: auth.account,
        debt_cleared: outcome.debt_cleared,
        collateral_seized: outcome.collateral_seized,
    }))
}
