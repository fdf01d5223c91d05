//! Per-account read routes.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use ledger_common::error::AppError;
use ledger_common::types::AccountId;
use ledger_engine::health::AccountHealth;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/accounts/{account}", get(get_account))
}

/// GET /api/accounts/:account: balances and health at the current price.
///
/// Unknown accounts report zero balances.
async fn get_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<AccountHealth>, AppError> {
    let vault = state.vault.lock().await;
    let health = vault.account_health(&AccountId::new(account))?;
    Ok(Json(health))
}
