//! Persistent store contract.
//!
//! The store's schema and query mechanics live outside this crate; what the
//! deduplication layer depends on is the contract below, most importantly
//! that **the storage layer itself enforces at most one active record per
//! fingerprint**. Application-level locking is never a substitute: the
//! in-flight lock registry is process-local and advisory, and only a
//! storage-side uniqueness constraint keeps the invariant under
//! multi-process deployment.

use crate::error::Result;
use crate::types::{BatchJob, ContentFingerprint, ExtractionRecord};
use async_trait::async_trait;
use uuid::Uuid;

mod memory;

pub use memory::MemoryStore;

/// Outcome of an insert attempt for an extraction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was created; its id is echoed back.
    Inserted(Uuid),
    /// An active record for the same fingerprint already exists. This is a
    /// benign race, not an error: callers re-run the lookup and converge on
    /// the winner. Only inserts of *active* records can conflict; failed and
    /// partial records accumulate freely.
    Conflict,
}

/// Record store operations the deduplication and batch layers require.
///
/// Implementations must be safe for concurrent use from many tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert an extraction record, detecting uniqueness conflicts on
    /// active statuses. Genuine storage failures (connectivity, malformed
    /// data) are errors; the expected conflict is not.
    async fn insert_record(&self, record: ExtractionRecord) -> Result<InsertOutcome>;

    /// Point lookup of the active (pending or completed) record for a
    /// fingerprint, if one exists. Failed and partial records are never
    /// returned.
    async fn find_active(&self, fingerprint: &ContentFingerprint) -> Result<Option<ExtractionRecord>>;

    /// Fetch a record by id.
    async fn get_record(&self, id: Uuid) -> Result<Option<ExtractionRecord>>;

    /// Number of prior failed or partial attempts recorded for a
    /// fingerprint. Seeds `retry_count` on the next attempt's record.
    async fn prior_attempts(&self, fingerprint: &ContentFingerprint) -> Result<u32>;

    /// Create a batch job record.
    async fn create_job(&self, job: &BatchJob) -> Result<()>;

    /// Persist the current state of a batch job.
    async fn update_job(&self, job: &BatchJob) -> Result<()>;

    /// Fetch a batch job by id.
    async fn get_job(&self, id: Uuid) -> Result<Option<BatchJob>>;
}
