//! Batch orchestration.
//!
//! [`BatchProcessor`] drives a set of uploaded files through the per-file
//! pipeline — validate, fingerprint, dedup lookup, lock-guarded invocation,
//! persistence, accounting — under one wall-clock budget for the whole
//! batch, and reaches exactly one terminal job state.
//!
//! Guarantees:
//!
//! - Files process **sequentially, in upload order**, which bounds load on
//!   the extraction collaborator and keeps counter folds race-free without
//!   locking the job record.
//! - Any error inside one file's pipeline is caught at the file boundary
//!   and recorded as that file's failure; the loop continues.
//! - The deadline is checked between files. On expiry the job ends
//!   `partial` with all accumulated progress intact; the file in flight at
//!   detection time is never cancelled retroactively.
//! - The webhook notification fires at most once, on the first terminal
//!   transition, only when a target was supplied.

use crate::config::DocketConfig;
use crate::dedup::DedupIndex;
use crate::error::{DocketError, Result};
use crate::extract::{self, ExtractionService, InvocationOutcome, UploadValidator};
use crate::fingerprint;
use crate::inflight::InflightLocks;
use crate::notify::Notifier;
use crate::store::RecordStore;
use crate::types::{BatchJob, ContentFingerprint, ExtractionRecord, JobSummary, RecordStatus, UploadedFile};
use std::sync::Arc;
use uuid::Uuid;

pub mod reducer;

pub use reducer::FileEvent;

/// Coordinates batch submissions end to end.
pub struct BatchProcessor {
    store: Arc<dyn RecordStore>,
    dedup: DedupIndex,
    inflight: InflightLocks,
    service: Arc<dyn ExtractionService>,
    validator: Arc<dyn UploadValidator>,
    notifier: Arc<Notifier>,
    config: DocketConfig,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn RecordStore>,
        service: Arc<dyn ExtractionService>,
        validator: Arc<dyn UploadValidator>,
        notifier: Arc<Notifier>,
        config: DocketConfig,
    ) -> Self {
        Self {
            dedup: DedupIndex::new(Arc::clone(&store)),
            inflight: InflightLocks::new(),
            store,
            service,
            validator,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &DocketConfig {
        &self.config
    }

    /// Validate a submission and persist its job record (status `pending`).
    ///
    /// Failure to write the job record is fatal to the whole request; this
    /// is the one write the submitter is told about synchronously.
    pub async fn submit(&self, files: &[UploadedFile], webhook_url: Option<String>) -> Result<BatchJob> {
        if files.is_empty() {
            return Err(DocketError::validation("batch must contain at least one file"));
        }
        if files.len() > self.config.max_files_per_batch {
            return Err(DocketError::validation(format!(
                "batch of {} files exceeds the {} file limit",
                files.len(),
                self.config.max_files_per_batch
            )));
        }
        if let Some(url) = webhook_url.as_deref()
            && !url.starts_with("https://")
        {
            return Err(DocketError::validation("webhook URL must use HTTPS"));
        }

        let job = BatchJob::new(files.len() as u32, webhook_url);
        self.store.create_job(&job).await?;
        tracing::info!(batch_job = %job.id, total_files = job.total_files, "batch accepted");
        Ok(job)
    }

    /// Submit and process in the background; the caller gets the pending
    /// job back immediately and polls for progress.
    pub async fn submit_and_spawn(
        self: Arc<Self>,
        files: Vec<UploadedFile>,
        webhook_url: Option<String>,
    ) -> Result<BatchJob> {
        let job = self.submit(&files, webhook_url).await?;
        let this = Arc::clone(&self);
        let job_id = job.id;
        tokio::spawn(async move {
            if let Err(e) = this.run(job_id, files).await {
                tracing::error!(batch_job = %job_id, "batch processing aborted: {e}");
            }
        });
        Ok(job)
    }

    /// Process every file of a previously submitted job, sequentially and
    /// under the batch deadline, then finalize and notify.
    pub async fn run(&self, job_id: Uuid, files: Vec<UploadedFile>) -> Result<BatchJob> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| DocketError::storage(format!("batch job {job_id} not found")))?;

        let mut job = reducer::begin(job);
        self.persist_or_abandon(&mut job).await?;

        let deadline = tokio::time::Instant::now() + self.config.batch_deadline();
        let mut deadline_expired = false;

        for file in &files {
            if tokio::time::Instant::now() >= deadline {
                deadline_expired = true;
                tracing::warn!(
                    batch_job = %job.id,
                    processed = job.processed_files(),
                    total = job.total_files,
                    "batch deadline elapsed, halting"
                );
                break;
            }

            // Per-file failure isolation: nothing a single file does may
            // abort the batch.
            let event = match self.process_file(file).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(
                        batch_job = %job.id,
                        file = file.display_name(),
                        "file pipeline failed: {e}"
                    );
                    self.failed_placeholder(file, e.to_string()).await
                }
            };

            job = reducer::apply(job, &event);
            self.persist_or_abandon(&mut job).await?;
        }

        job = reducer::finalize(job, deadline_expired);
        self.persist_or_abandon(&mut job).await?;
        tracing::info!(
            batch_job = %job.id,
            status = ?job.status,
            completed = job.completed_files,
            failed = job.failed_files,
            savings = job.cost_savings,
            "batch finished"
        );

        self.emit(&job);
        Ok(job)
    }

    /// One file's trip through the pipeline. Scoped staging storage is
    /// released on every exit path via the temp-file guard.
    async fn process_file(&self, file: &UploadedFile) -> Result<FileEvent> {
        let fp = fingerprint::fingerprint(&file.content);

        if let Err(e) = self.validator.validate(file.file_name.as_deref(), &file.content) {
            tracing::debug!(file = file.display_name(), "upload rejected: {e}");
            return self.persist_failure(fp, e.to_string()).await;
        }

        if let Some(existing) = self.dedup.lookup(&fp).await? {
            tracing::debug!(file = file.display_name(), fingerprint = %fp, "dedup hit");
            return Ok(Self::reuse_event(&existing));
        }

        let _guard = self.inflight.acquire(&fp).await;

        // Re-check after acquisition: whoever held the lock before us has
        // usually just committed a record for this exact content.
        if let Some(existing) = self.dedup.lookup(&fp).await? {
            tracing::debug!(file = file.display_name(), fingerprint = %fp, "dedup hit after lock wait");
            return Ok(Self::reuse_event(&existing));
        }

        let staged = tempfile::NamedTempFile::new()?;
        tokio::fs::write(staged.path(), &file.content).await?;

        let outcome = extract::invoke(self.service.as_ref(), staged.path()).await;
        let attempts = self.store.prior_attempts(&fp).await?;

        match outcome {
            InvocationOutcome::Success { payload, metadata } => {
                let record = ExtractionRecord::completed(fp, payload, &metadata, attempts);
                let extraction_id = self.dedup.insert(record).await?;
                Ok(FileEvent::Extracted {
                    extraction_id,
                    method: metadata.method,
                    cost_estimate: metadata.cost_estimate,
                })
            }
            InvocationOutcome::Partial {
                payload,
                metadata,
                cause,
            } => {
                tracing::debug!(file = file.display_name(), "partial extraction: {cause}");
                let record = ExtractionRecord::partial(fp, payload, &metadata, cause, attempts);
                let extraction_id = self.dedup.insert(record).await?;
                Ok(FileEvent::Extracted {
                    extraction_id,
                    method: metadata.method,
                    cost_estimate: metadata.cost_estimate,
                })
            }
            InvocationOutcome::Failure { cause } => {
                tracing::debug!(file = file.display_name(), "extraction failed: {cause}");
                self.persist_failure(fp, cause).await
            }
        }
    }

    fn reuse_event(record: &ExtractionRecord) -> FileEvent {
        match record.status {
            RecordStatus::Completed => FileEvent::Reused {
                extraction_id: record.id,
                method: record.processing_method,
                cost_estimate: record.cost_estimate,
            },
            // The only other active status.
            _ => FileEvent::ReusedPending {
                extraction_id: record.id,
            },
        }
    }

    /// Persist a failed placeholder record and build the matching event.
    async fn persist_failure(&self, fp: ContentFingerprint, cause: String) -> Result<FileEvent> {
        let attempts = self.store.prior_attempts(&fp).await?;
        let record = ExtractionRecord::failed(fp, cause, attempts);
        let extraction_id = record.id;
        self.dedup.insert(record).await?;
        Ok(FileEvent::Failed { extraction_id })
    }

    /// Last-resort failure event when even the pipeline plumbing failed.
    /// The pre-assigned id is used whether or not the placeholder write
    /// landed, so the counters/ids invariant survives a store outage that
    /// is confined to one file.
    async fn failed_placeholder(&self, file: &UploadedFile, cause: String) -> FileEvent {
        let fp = fingerprint::fingerprint(&file.content);
        let record = ExtractionRecord::failed(fp, cause, 0);
        let extraction_id = record.id;
        if let Err(e) = self.dedup.insert(record).await {
            tracing::error!(
                file = file.display_name(),
                "failed to persist failure record: {e}"
            );
        }
        FileEvent::Failed { extraction_id }
    }

    /// Persist the running job. A failed job-record write is a batch-wide
    /// catastrophe: mark the job failed (best effort), notify, and abort.
    async fn persist_or_abandon(&self, job: &mut BatchJob) -> Result<()> {
        if let Err(e) = self.store.update_job(job).await {
            tracing::error!(batch_job = %job.id, "cannot persist batch job, abandoning: {e}");
            let failed = reducer::fail(job.clone());
            if let Err(e2) = self.store.update_job(&failed).await {
                tracing::error!(batch_job = %job.id, "failed-state write also lost: {e2}");
            }
            self.emit(&failed);
            *job = failed;
            return Err(e);
        }
        Ok(())
    }

    fn emit(&self, job: &BatchJob) {
        debug_assert!(job.status.is_terminal());
        if let Some(url) = &job.webhook_url {
            self.notifier.notify(url.clone(), JobSummary::from(job));
        }
    }
}
