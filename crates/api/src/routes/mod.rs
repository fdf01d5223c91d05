pub mod accounts;
pub mod admin;
pub mod health;
pub mod liquidations;
pub mod positions;
pub mod protocol;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(accounts::router())
        .merge(positions::router())
        .merge(liquidations::router())
        .merge(protocol::router())
        .merge(admin::router())
        .with_state(state)
}
