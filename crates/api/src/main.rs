//! Collateral ledger API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ledger_common::config::AppConfig;
use ledger_engine::price::PriceFeed;
use ledger_notifier::{AuditWorker, ChannelAuditSink, LogDelivery, WebhookDelivery};

use ledger_api::routes::create_router;
use ledger_api::state::AppState;

/// Request bodies are a single small JSON object.
const MAX_BODY_BYTES: usize = 16 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("ledger_api=debug,ledger_engine=debug,ledger_notifier=info,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting collateral ledger API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Start the audit worker
    let (sink, receiver) = ChannelAuditSink::new();
    match &config.audit_webhook_url {
        Some(url) => {
            let delivery = WebhookDelivery::new(url.clone())?;
            tracing::info!(url = %url, "Audit events will be posted to webhook");
            tokio::spawn(AuditWorker::new(receiver, delivery).run());
        }
        None => {
            tokio::spawn(AuditWorker::new(receiver, LogDelivery).run());
        }
    }

    // Build application state
    let port = config.api_port;
    let state = AppState::new(config, Arc::new(sink))?;
    tracing::info!(
        price = %state.price_feed.current_price(),
        liquidators = state.config.liquidators.len(),
        "Ledger initialized"
    );

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
