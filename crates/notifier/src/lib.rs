//! Audit event delivery.
//!
//! The engine records events synchronously through [`ChannelAuditSink`], which
//! only pushes onto an unbounded channel. An [`AuditWorker`] task drains the
//! channel and hands each event to an [`AuditDelivery`] backend, retrying
//! transient failures with exponential backoff. Events that exhaust their
//! retries are logged as dead letters and dropped.

pub mod delivery;

use std::time::Duration;

use tokio::sync::mpsc;

use ledger_common::types::LedgerEvent;
use ledger_engine::audit::AuditSink;

pub use delivery::{AuditDelivery, DeliveryError, LogDelivery, WebhookDelivery};

/// Default number of delivery attempts per event.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry; doubles on each further attempt.
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Non-blocking audit sink feeding an [`AuditWorker`].
#[derive(Clone)]
pub struct ChannelAuditSink {
    sender: mpsc::UnboundedSender<LedgerEvent>,
}

impl ChannelAuditSink {
    /// Create a sink and the receiving end for its worker.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LedgerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: LedgerEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::warn!(event_id = %e.0.id, "Audit worker stopped, event dropped");
        }
    }
}

/// Retry policy for a worker.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

/// Counters reported when the worker shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub delivered: u64,
    pub dead_lettered: u64,
}

/// Drains audit events and delivers them.
pub struct AuditWorker<D: AuditDelivery> {
    receiver: mpsc::UnboundedReceiver<LedgerEvent>,
    delivery: D,
    retry: RetryPolicy,
}

impl<D: AuditDelivery> AuditWorker<D> {
    pub fn new(receiver: mpsc::UnboundedReceiver<LedgerEvent>, delivery: D) -> Self {
        Self {
            receiver,
            delivery,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run until every sink handle has been dropped and the channel is empty.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        tracing::info!(delivery = self.delivery.name(), "Audit worker started");

        while let Some(event) = self.receiver.recv().await {
            if self.deliver_with_retry(&event).await {
                stats.delivered += 1;
            } else {
                stats.dead_lettered += 1;
            }
        }

        tracing::info!(
            delivered = stats.delivered,
            dead_lettered = stats.dead_lettered,
            "Audit worker stopped"
        );
        stats
    }

    async fn deliver_with_retry(&self, event: &LedgerEvent) -> bool {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.delivery.deliver(event).await {
                Ok(()) => return true,
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        event_id = %event.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Audit delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        event_id = %event.id,
                        kind = %event.kind,
                        account = %event.account,
                        attempt,
                        error = %e,
                        "Audit event dead-lettered"
                    );
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use ledger_common::types::{AccountId, OperationKind};

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: u32,
        calls: Arc<AtomicU32>,
        retryable: bool,
    }

    impl AuditDelivery for Flaky {
        async fn deliver(&self, _event: &LedgerEvent) -> Result<(), DeliveryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.retryable {
                    Err(DeliveryError::Status(503))
                } else {
                    Err(DeliveryError::Status(400))
                }
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn event() -> LedgerEvent {
        LedgerEvent::new(OperationKind::Deposit, AccountId::new("alice"), 3)
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_sink_forwards_to_worker() {
        let (sink, receiver) = ChannelAuditSink::new();
        let calls = Arc::new(AtomicU32::new(0));
        let worker = AuditWorker::new(
            receiver,
            Flaky {
                failures: 0,
                calls: calls.clone(),
                retryable: true,
            },
        );

        sink.record(event());
        sink.record(event());
        drop(sink);

        let stats = worker.run().await;
        assert_eq!(stats.delivered, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (sink, receiver) = ChannelAuditSink::new();
        let calls = Arc::new(AtomicU32::new(0));
        let worker = AuditWorker::new(
            receiver,
            Flaky {
                failures: 2,
                calls: calls.clone(),
                retryable: true,
            },
        )
        .with_retry(fast_retry());

        sink.record(event());
        drop(sink);

        let stats = worker.run().await;
        assert_eq!(
            stats,
            WorkerStats {
                delivered: 1,
                dead_lettered: 0
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_dead_letter() {
        let (sink, receiver) = ChannelAuditSink::new();
        let calls = Arc::new(AtomicU32::new(0));
        let worker = AuditWorker::new(
            receiver,
            Flaky {
                failures: 10,
                calls: calls.clone(),
                retryable: true,
            },
        )
        .with_retry(fast_retry());

        sink.record(event());
        drop(sink);

        let stats = worker.run().await;
        assert_eq!(stats.dead_lettered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let (sink, receiver) = ChannelAuditSink::new();
        let calls = Arc::new(AtomicU32::new(0));
        let worker = AuditWorker::new(
            receiver,
            Flaky {
                failures: 1,
                calls: calls.clone(),
                retryable: false,
            },
        )
        .with_retry(fast_retry());

        sink.record(event());
        drop(sink);

        let stats = worker.run().await;
        assert_eq!(stats.dead_lettered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_record_after_worker_gone_does_not_panic() {
        let (sink, receiver) = ChannelAuditSink::new();
        drop(receiver);
        sink.record(event());
    }
}
