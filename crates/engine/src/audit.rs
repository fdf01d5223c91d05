//! Audit sink capability.
//!
//! Called once per successful mutating operation, after commit. Recording is
//! fire-and-forget: a sink cannot fail or roll back a transition.

use std::sync::Mutex;

use ledger_common::types::LedgerEvent;

pub trait AuditSink: Send + Sync {
    fn record(&self, event: LedgerEvent);
}

/// Writes each event to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: LedgerEvent) {
        tracing::info!(
            event_id = %event.id,
            kind = %event.kind,
            account = %event.account,
            amount = %event.amount,
            actor = ?event.actor.as_ref().map(|a| a.as_str()),
            "Ledger event"
        );
    }
}

/// Keeps events in memory; used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
