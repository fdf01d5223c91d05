use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use ledger_common::types::LedgerEvent;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Receiver responded with status {0}")]
    Status(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeliveryError {
    /// Network failures, throttling and server errors may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Http(_) => true,
            DeliveryError::Status(code) => *code == 429 || *code >= 500,
            DeliveryError::Serialization(_) => false,
        }
    }
}

/// Destination for audit events.
pub trait AuditDelivery: Send + Sync + 'static {
    fn deliver(
        &self,
        event: &LedgerEvent,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    fn name(&self) -> &'static str;
}

/// Writes each event to the log as a JSON payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

impl AuditDelivery for LogDelivery {
    async fn deliver(&self, event: &LedgerEvent) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            target: "ledger_audit",
            event_id = %event.id,
            kind = %event.kind,
            payload = %payload,
            "Audit event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// POSTs each event as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AuditDelivery for WebhookDelivery {
    async fn deliver(&self, event: &LedgerEvent) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.url).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        tracing::debug!(event_id = %event.id, url = %self.url, "Audit event delivered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
