use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failure kinds of a ledger transition or query.
///
/// Every error leaves the ledger exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Position would be below the collateralization threshold")]
    PositionUnhealthy,

    #[error("Position is healthy and cannot be liquidated")]
    PositionHealthy,

    #[error("Repay amount exceeds outstanding debt")]
    InsufficientDebt,

    #[error("Withdraw amount exceeds deposited collateral")]
    InsufficientCollateral,

    #[error("Division by zero")]
    DivideByZero,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Asset transfer failed: {0}")]
    TransferFailed(String),

    #[error("Caller is not an authorized liquidator")]
    Unauthorized,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(err) => match err {
                LedgerError::PositionUnhealthy => "position_unhealthy",
                LedgerError::PositionHealthy => "position_healthy",
                LedgerError::InsufficientDebt => "insufficient_debt",
                LedgerError::InsufficientCollateral => "insufficient_collateral",
                LedgerError::DivideByZero => "divide_by_zero",
                LedgerError::Overflow => "overflow",
                LedgerError::TransferFailed(_) => "transfer_failed",
                LedgerError::Unauthorized => "unauthorized",
                LedgerError::InvalidParameter(_) => "invalid_parameter",
            },
            AppError::Config(_) => "config",
            AppError::Auth(_) => "auth",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Ledger(err) => match err {
                LedgerError::PositionUnhealthy
                | LedgerError::PositionHealthy
                | LedgerError::InsufficientDebt
                | LedgerError::InsufficientCollateral => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::Unauthorized => StatusCode::FORBIDDEN,
                LedgerError::TransferFailed(_) => StatusCode::BAD_GATEWAY,
                LedgerError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
                LedgerError::DivideByZero | LedgerError::Overflow => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({ "error": self.to_string(), "code": self.code() });
        (status, Json(body)).into_response()
    }
}
