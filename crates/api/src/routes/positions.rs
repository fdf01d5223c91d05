//! Position transitions for the authenticated account.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ledger_common::error::{AppError, LedgerError};
use ledger_common::types::{AccountId, OperationKind};
use ledger_engine::Vault;
use ledger_engine::health::AccountHealth;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/positions/deposit", post(deposit))
        .route("/api/positions/borrow", post(borrow))
        .route("/api/positions/repay", post(repay))
        .route("/api/positions/withdraw", post(withdraw))
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    #[serde(deserialize_with = "ledger_common::types::amount_string::deserialize")]
    pub amount: u128,
}

/// Committed balances after a transition.
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub account: AccountId,
    pub operation: OperationKind,
    #[serde(with = "ledger_common::types::amount_string")]
    pub deposits: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub borrows: u128,
    /// Absent when the current price cannot produce a report
    pub health: Option<AccountHealth>,
}

/// POST /api/positions/deposit: pledge collateral.
async fn deposit(
    state: State<AppState>,
    auth: AuthUser,
    body: Json<AmountRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    apply(state, auth, body, OperationKind::Deposit, Vault::deposit).await
}

/// POST /api/positions/borrow: draw debt against deposited collateral.
async fn borrow(
    state: State<AppState>,
    auth: AuthUser,
    body: Json<AmountRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    apply(state, auth, body, OperationKind::Borrow, Vault::borrow).await
}

/// POST /api/positions/repay: pay back outstanding debt.
async fn repay(
    state: State<AppState>,
    auth: AuthUser,
    body: Json<AmountRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    apply(state, auth, body, OperationKind::Repay, Vault::repay).await
}

/// POST /api/positions/withdraw: reclaim deposited collateral.
async fn withdraw(
    state: State<AppState>,
    auth: AuthUser,
    body: Json<AmountRequest>,
) -> Result<Json<PositionResponse>, AppError> {
    apply(state, auth, body, OperationKind::Withdraw, Vault::withdraw).await
}

/// Run one transition under the vault lock and report the committed position.
///
/// Once the transition returns `Ok` the response is a success. The health
/// report needs the price and is left out when it cannot be computed.
async fn apply(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<AmountRequest>,
    kind: OperationKind,
    transition: fn(&mut Vault, &AccountId, u128) -> Result<(), LedgerError>,
) -> Result<Json<PositionResponse>, AppError> {
    let mut vault = state.vault.lock().await;
    if let Err(e) = transition(&mut *vault, &auth.account, request.amount) {
        tracing::info!(
            account = %auth.account,
            operation = %kind,
            amount = request.amount,
            error = %e,
            "Position update rejected"
        );
        return Err(e.into());
    }

    let position = vault.position(&auth.account);
    let health = vault
        .account_health(&auth.account)
        .inspect_err(|e| {
            tracing::warn!(
                account = %auth.account,
                operation = %kind,
                error = %e,
                "Health report unavailable after committed update"
            );
        })
        .ok();

    Ok(Json(PositionResponse {
        account: auth.account,
        operation: kind,
        deposits: position.deposited_collateral,
        borrows: position.borrowed_debt,
        health,
    }))
}
