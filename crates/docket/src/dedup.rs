//! Deduplication index.
//!
//! Thin layer over the record store that turns the storage-side uniqueness
//! constraint into the at-most-once guarantee callers rely on: two callers
//! racing to insert an extraction for the same fingerprint both end up
//! holding the *same* extraction id, and neither ever observes a duplicate
//! active record.

use crate::error::{DocketError, Result};
use crate::store::{InsertOutcome, RecordStore};
use crate::types::{ContentFingerprint, ExtractionRecord};
use std::sync::Arc;
use uuid::Uuid;

/// Fingerprint-keyed view of the record store.
#[derive(Clone)]
pub struct DedupIndex {
    store: Arc<dyn RecordStore>,
}

impl DedupIndex {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Look up the active record for a fingerprint.
    ///
    /// Returns a record only while its status is pending or completed.
    /// Failed and partial records are invisible here, which is what lets a
    /// resubmission of the same content silently retry.
    pub async fn lookup(&self, fingerprint: &ContentFingerprint) -> Result<Option<ExtractionRecord>> {
        self.store.find_active(fingerprint).await
    }

    /// Insert an extraction record, converging on the winner if a concurrent
    /// insert for the same fingerprint got there first.
    ///
    /// On a uniqueness conflict the lookup is re-run and the existing active
    /// record's id is returned; the conflict never surfaces to the caller.
    /// Genuine storage failures propagate.
    pub async fn insert(&self, record: ExtractionRecord) -> Result<Uuid> {
        let fingerprint = record.fingerprint.clone();
        match self.store.insert_record(record).await? {
            InsertOutcome::Inserted(id) => Ok(id),
            InsertOutcome::Conflict => {
                tracing::debug!(fingerprint = %fingerprint, "insert lost dedup race, reusing winner");
                match self.store.find_active(&fingerprint).await? {
                    Some(winner) => Ok(winner.id),
                    // The winner vanished between the conflict and the
                    // re-read. Active records are never deleted by this
                    // subsystem, so this indicates store corruption.
                    None => Err(DocketError::storage(format!(
                        "uniqueness conflict for {fingerprint} but no active record found"
                    ))),
                }
            }
        }
    }
}
