//! Protocol-wide state and conversion quotes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ledger_common::error::AppError;
use ledger_common::types::Price;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/protocol", get(get_protocol))
        .route(
            "/api/quotes/required-collateral",
            get(quote_required_collateral),
        )
        .route("/api/quotes/maximum-borrowing", get(quote_maximum_borrowing))
}

#[derive(Debug, Serialize)]
pub struct ProtocolResponse {
    #[serde(with = "ledger_common::types::amount_string")]
    pub total_deposits: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub total_borrows: u128,
    pub healthy: bool,
    pub solvent: bool,
    pub price: Price,
    #[serde(with = "ledger_common::types::amount_string")]
    pub collateralization_ratio: u128,
}

#[derive(Debug, Deserialize)]
pub struct DebtQuery {
    #[serde(deserialize_with = "ledger_common::types::amount_string::deserialize")]
    pub debt: u128,
}

#[derive(Debug, Deserialize)]
pub struct CollateralQuery {
    #[serde(deserialize_with = "ledger_common::types::amount_string::deserialize")]
    pub collateral: u128,
}

#[derive(Debug, Serialize)]
pub struct Quote {
    #[serde(with = "ledger_common::types::amount_string")]
    pub input: u128,
    #[serde(with = "ledger_common::types::amount_string")]
    pub output: u128,
}

/// GET /api/protocol: totals and aggregate health at the current price.
async fn get_protocol(State(state): State<AppState>) -> Result<Json<ProtocolResponse>, AppError> {
    let vault = state.vault.lock().await;
    let totals = vault.totals();

    Ok(Json(ProtocolResponse {
        total_deposits: totals.total_deposits,
        total_borrows: totals.total_borrows,
        healthy: vault.protocol_is_healthy()?,
        solvent: vault.protocol_is_solvent()?,
        price: vault.current_price(),
        collateralization_ratio: vault.params().collateralization_ratio(),
    }))
}

/// GET /api/quotes/required-collateral?debt=: collateral needed to back `debt`.
async fn quote_required_collateral(
    State(state): State<AppState>,
    Query(query): Query<DebtQuery>,
) -> Result<Json<Quote>, AppError> {
    let vault = state.vault.lock().await;
    Ok(Json(Quote {
        input: query.debt,
        output: vault.required_collateral(query.debt)?,
    }))
}

/// GET /api/quotes/maximum-borrowing?collateral=: debt `collateral` can back.
async fn quote_maximum_borrowing(
    State(state): State<AppState>,
    Query(query): Query<CollateralQuery>,
) -> Result<Json<Quote>, AppError> {
    let vault = state.vault.lock().await;
    Ok(Json(Quote {
        input: query.collateral,
        output: vault.maximum_borrowing(query.collateral)?,
    }))
}
