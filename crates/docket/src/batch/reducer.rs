//! Pure folds from per-file outcomes into batch job state.
//!
//! Each processed file yields one immutable [`FileEvent`]; the orchestrator
//! folds events into the job with [`apply`] and persists the result. Keeping
//! the fold pure keeps counter aggregation trivially race-free under the
//! sequential per-batch loop and testable without any I/O.
//!
//! Status transitions are advance-only: `pending -> processing ->
//! {completed, failed, partial}`. A terminal job is never modified again.

use crate::types::{BatchJob, BatchStatus, ProcessingMethod};
use chrono::Utc;
use uuid::Uuid;

/// Reusing a cheap-method record recovers roughly the 80% the cheap path
/// already saved versus the expensive fallback, hence 4x its recorded cost.
pub const REUSE_SAVINGS_MULTIPLIER: f64 = 4.0;

/// Outcome of one file's trip through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    /// The extraction collaborator was invoked and produced a usable
    /// (complete or partial) result persisted under `extraction_id`.
    Extracted {
        extraction_id: Uuid,
        method: ProcessingMethod,
        cost_estimate: f64,
    },
    /// The file's content matched an already-completed record; no
    /// invocation happened.
    Reused {
        extraction_id: Uuid,
        method: Option<ProcessingMethod>,
        cost_estimate: f64,
    },
    /// The file's content matched a record another computation is still
    /// producing; its id is adopted as-is.
    ReusedPending { extraction_id: Uuid },
    /// Validation or extraction failed; a failed placeholder record exists
    /// (or was at least assigned) under `extraction_id`.
    Failed { extraction_id: Uuid },
}

impl FileEvent {
    pub fn extraction_id(&self) -> Uuid {
        match self {
            FileEvent::Extracted { extraction_id, .. }
            | FileEvent::Reused { extraction_id, .. }
            | FileEvent::ReusedPending { extraction_id }
            | FileEvent::Failed { extraction_id } => *extraction_id,
        }
    }
}

/// Move a freshly submitted job into `processing`.
pub fn begin(mut job: BatchJob) -> BatchJob {
    debug_assert_eq!(job.status, BatchStatus::Pending, "begin() on a started job");
    if job.status == BatchStatus::Pending {
        job.status = BatchStatus::Processing;
        job.updated_at = Utc::now();
    }
    job
}

/// Fold one file outcome into the job.
pub fn apply(mut job: BatchJob, event: &FileEvent) -> BatchJob {
    debug_assert_eq!(job.status, BatchStatus::Processing, "apply() outside processing");
    debug_assert!(job.processed_files() < job.total_files, "more events than files");

    job.extraction_ids.push(event.extraction_id());

    match event {
        FileEvent::Extracted {
            method, cost_estimate, ..
        } => {
            job.completed_files += 1;
            job.cost_estimate += cost_estimate;
            match method {
                ProcessingMethod::Hybrid => job.routing_stats.hybrid_count += 1,
                ProcessingMethod::Fallback => job.routing_stats.fallback_count += 1,
            }
        }
        FileEvent::Reused {
            method, cost_estimate, ..
        } => {
            job.completed_files += 1;
            // Reuse is free; the savings formula only credits records the
            // cheap path produced.
            if *method == Some(ProcessingMethod::Hybrid) {
                job.cost_savings += REUSE_SAVINGS_MULTIPLIER * cost_estimate;
            }
        }
        FileEvent::ReusedPending { .. } => {
            job.completed_files += 1;
            job.routing_stats.pending_count += 1;
        }
        FileEvent::Failed { .. } => {
            job.failed_files += 1;
        }
    }

    debug_assert!(job.processed_files() <= job.total_files);
    debug_assert_eq!(job.extraction_ids.len() as u32, job.processed_files());

    job.updated_at = Utc::now();
    job
}

/// Close out a job once the loop halts.
///
/// A deadline halt ends `partial` with everything accumulated so far left
/// exactly as is; a normal halt ends `completed` (individual file failures
/// do not demote the batch). Already-terminal jobs pass through untouched.
pub fn finalize(mut job: BatchJob, deadline_expired: bool) -> BatchJob {
    if job.status.is_terminal() {
        return job;
    }
    job.status = if deadline_expired {
        BatchStatus::Partial
    } else {
        BatchStatus::Completed
    };
    job.updated_at = Utc::now();
    job
}

/// Mark a job failed after a catastrophic, batch-wide error. Reserved for
/// failures outside any single file's pipeline (e.g. the job record itself
/// cannot be written). Terminal jobs are never demoted.
pub fn fail(mut job: BatchJob) -> BatchJob {
    if !job.status.is_terminal() {
        job.status = BatchStatus::Failed;
        job.updated_at = Utc::now();
    }
    job
}
