//! Core domain types shared across the crate.
//!
//! Two records matter here: [`ExtractionRecord`], the persistent unit of
//! deduplication (one active record per content fingerprint), and
//! [`BatchJob`], the aggregate a batch submission is tracked under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Deterministic content identity: lowercase hex SHA-256 of the raw bytes.
///
/// Equal bytes always produce equal fingerprints, across calls and across
/// processes. Name and upload metadata never participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Wrap a precomputed digest. Callers outside the crate should use
    /// [`crate::fingerprint::fingerprint`] instead.
    pub(crate) fn from_digest(digest: String) -> Self {
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an extraction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
    Partial,
}

impl RecordStatus {
    /// Active records are subject to the at-most-one-per-fingerprint
    /// constraint and are the only ones dedup lookups may return.
    /// Failed and partial records stay invisible, which is what permits
    /// silent retry on resubmission.
    pub fn is_active(self) -> bool {
        matches!(self, RecordStatus::Pending | RecordStatus::Completed)
    }
}

/// How the extraction collaborator processed a document.
///
/// `Hybrid` is the cheap routing path; `Fallback` is the expensive one.
/// Reuse of a hybrid-method record is what earns cost savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    Hybrid,
    Fallback,
}

impl ProcessingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingMethod::Hybrid => "hybrid",
            ProcessingMethod::Fallback => "fallback",
        }
    }
}

/// Metadata the extraction collaborator reports alongside a result.
///
/// `method` and `cost_estimate` are required by the accounting layer;
/// everything else the collaborator sends is kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub method: ProcessingMethod,
    pub cost_estimate: f64,
    #[serde(flatten, default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProcessingMetadata {
    pub fn new(method: ProcessingMethod, cost_estimate: f64) -> Self {
        Self {
            method,
            cost_estimate,
            extra: HashMap::new(),
        }
    }
}

/// Persistent record of one extraction attempt for one content fingerprint.
///
/// Created after the collaborator was invoked (or after a validation
/// failure, as a failed placeholder); mutated only through status updates;
/// never deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: Uuid,
    pub fingerprint: ContentFingerprint,
    pub status: RecordStatus,
    /// Structured result payload. `None` for failed placeholders.
    pub payload: Option<serde_json::Value>,
    pub processing_method: Option<ProcessingMethod>,
    pub cost_estimate: f64,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExtractionRecord {
    fn base(fingerprint: ContentFingerprint, status: RecordStatus, retry_count: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fingerprint,
            status,
            payload: None,
            processing_method: None,
            cost_estimate: 0.0,
            error_message: None,
            retry_count,
            created_at: now,
            updated_at: now,
        }
    }

    /// A successful extraction result.
    pub fn completed(
        fingerprint: ContentFingerprint,
        payload: serde_json::Value,
        metadata: &ProcessingMetadata,
        retry_count: u32,
    ) -> Self {
        Self {
            payload: Some(payload),
            processing_method: Some(metadata.method),
            cost_estimate: metadata.cost_estimate,
            ..Self::base(fingerprint, RecordStatus::Completed, retry_count)
        }
    }

    /// A recoverable partial result: the payload is kept alongside the
    /// error that interrupted the extraction.
    pub fn partial(
        fingerprint: ContentFingerprint,
        payload: serde_json::Value,
        metadata: &ProcessingMetadata,
        cause: String,
        retry_count: u32,
    ) -> Self {
        Self {
            payload: Some(payload),
            processing_method: Some(metadata.method),
            cost_estimate: metadata.cost_estimate,
            error_message: Some(cause),
            ..Self::base(fingerprint, RecordStatus::Partial, retry_count)
        }
    }

    /// A failed placeholder: no payload, only the failure cause.
    pub fn failed(fingerprint: ContentFingerprint, cause: String, retry_count: u32) -> Self {
        Self {
            error_message: Some(cause),
            ..Self::base(fingerprint, RecordStatus::Failed, retry_count)
        }
    }
}

/// Lifecycle status of a batch job.
///
/// Advances `pending -> processing -> {completed, failed, partial}` and
/// never regresses. The three right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Partial,
}

impl BatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Partial
        )
    }
}

/// Per-batch extraction routing counters.
///
/// `hybrid_count` and `fallback_count` count collaborator invocations this
/// batch performed, bucketed by the reported method; `pending_count` counts
/// dedup hits on records another in-flight computation had not yet finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub hybrid_count: u32,
    pub fallback_count: u32,
    pub pending_count: u32,
}

/// Aggregate state of one batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: Uuid,
    pub status: BatchStatus,
    pub total_files: u32,
    pub completed_files: u32,
    pub failed_files: u32,
    pub routing_stats: RoutingStats,
    /// One id per processed file, in upload order. Always exactly
    /// `completed_files + failed_files` entries once processing halts.
    pub extraction_ids: Vec<Uuid>,
    /// Cost of the invocations this batch paid for.
    pub cost_estimate: f64,
    /// Cost avoided by reusing prior cheap-method extractions.
    pub cost_savings: f64,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    /// A freshly submitted job, before any file has been scheduled.
    pub fn new(total_files: u32, webhook_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: BatchStatus::Pending,
            total_files,
            completed_files: 0,
            failed_files: 0,
            routing_stats: RoutingStats::default(),
            extraction_ids: Vec::new(),
            cost_estimate: 0.0,
            cost_savings: 0.0,
            webhook_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Files accounted for so far.
    pub fn processed_files(&self) -> u32 {
        self.completed_files + self.failed_files
    }
}

/// One file of a batch submission: the raw untrusted bytes plus whatever
/// name the uploader supplied.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: Option<String>, content: Vec<u8>) -> Self {
        Self { file_name, content }
    }

    /// Display name for logs; uploads are not required to carry one.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Terminal-state projection of a job, delivered to the webhook target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub batch_job_id: Uuid,
    pub status: BatchStatus,
    pub total_files: u32,
    pub completed_files: u32,
    pub failed_files: u32,
    pub routing_stats: RoutingStats,
    pub extraction_ids: Vec<Uuid>,
    pub cost_estimate: f64,
    pub cost_savings: f64,
}

impl From<&BatchJob> for JobSummary {
    fn from(job: &BatchJob) -> Self {
        Self {
            batch_job_id: job.id,
            status: job.status,
            total_files: job.total_files,
            completed_files: job.completed_files,
            failed_files: job.failed_files,
            routing_stats: job.routing_stats,
            extraction_ids: job.extraction_ids.clone(),
            cost_estimate: job.cost_estimate,
            cost_savings: job.cost_savings,
        }
    }
}
