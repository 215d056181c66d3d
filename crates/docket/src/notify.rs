//! Terminal-state webhook notifications.
//!
//! Delivery is best-effort and asynchronous: the orchestrator hands the job
//! summary to a bounded queue and moves on. One background worker, owned by
//! the [`Notifier`] rather than detached, drains the queue and POSTs each
//! summary exactly once. Delivery failure is logged and never retried, and
//! never feeds back into job state. The bounded queue caps the number of
//! outstanding attempts; overflow drops the attempt with a warning.

use crate::error::{DocketError, Result};
use crate::types::JobSummary;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default ceiling on queued, undelivered notifications.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

struct Delivery {
    url: String,
    summary: JobSummary,
}

/// Best-effort webhook emitter with an explicitly owned worker task.
pub struct Notifier {
    tx: mpsc::Sender<Delivery>,
    worker: JoinHandle<()>,
}

impl Notifier {
    /// Spawn the delivery worker. Must be called from within a Tokio
    /// runtime.
    pub fn new(timeout: Duration, queue_capacity: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocketError::notification_with_source("failed to build webhook client", e))?;

        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let worker = tokio::spawn(deliver_loop(client, rx));
        Ok(Self { tx, worker })
    }

    /// Enqueue a notification without blocking.
    ///
    /// Called at most once per batch job, on its first terminal transition.
    /// A full queue or a stopped worker drops the attempt; the job's state
    /// is already final and is never affected by delivery.
    pub fn notify(&self, url: String, summary: JobSummary) {
        let job = summary.batch_job_id;
        match self.tx.try_send(Delivery { url, summary }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(batch_job = %job, "notification queue full, dropping delivery");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(batch_job = %job, "notification worker stopped, dropping delivery");
            }
        }
    }

    /// Close the queue and wait for in-flight deliveries to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::warn!("notification worker ended abnormally: {e}");
        }
    }
}

async fn deliver_loop(client: reqwest::Client, mut rx: mpsc::Receiver<Delivery>) {
    while let Some(delivery) = rx.recv().await {
        let job = delivery.summary.batch_job_id;
        match client.post(&delivery.url).json(&delivery.summary).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(batch_job = %job, "webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    batch_job = %job,
                    status = %response.status(),
                    "webhook target rejected notification"
                );
            }
            Err(e) => {
                tracing::warn!(batch_job = %job, "webhook delivery failed: {e}");
            }
        }
    }
}
