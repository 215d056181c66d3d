//! In-memory record store.
//!
//! Reference implementation of [`RecordStore`]: two `RwLock`-guarded tables
//! plus a fingerprint index. The uniqueness check and the insert happen
//! under one write lock, which is this store's equivalent of a database
//! uniqueness constraint — two racing inserts for the same fingerprint
//! observe each other and the loser gets [`InsertOutcome::Conflict`].

use super::{InsertOutcome, RecordStore};
use crate::error::{DocketError, Result};
use crate::types::{BatchJob, ContentFingerprint, ExtractionRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    records: HashMap<Uuid, ExtractionRecord>,
    /// fingerprint -> ids of every record ever created for it, in insertion
    /// order. Active-record uniqueness is checked against this index.
    by_fingerprint: HashMap<ContentFingerprint, Vec<Uuid>>,
    jobs: HashMap<Uuid, BatchJob>,
}

/// Thread-safe in-memory implementation of [`RecordStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records, active or not. Test and stats helper.
    pub fn record_count(&self) -> usize {
        self.tables.read().records.len()
    }

    /// Number of *active* records for a fingerprint. The at-most-one
    /// invariant means this is always 0 or 1.
    pub fn active_count(&self, fingerprint: &ContentFingerprint) -> usize {
        let tables = self.tables.read();
        tables
            .by_fingerprint
            .get(fingerprint)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.records.get(id))
                    .filter(|r| r.status.is_active())
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_record(&self, record: ExtractionRecord) -> Result<InsertOutcome> {
        let mut tables = self.tables.write();

        if record.status.is_active() {
            let has_active = tables
                .by_fingerprint
                .get(&record.fingerprint)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| tables.records.get(id))
                        .any(|r| r.status.is_active())
                })
                .unwrap_or(false);
            if has_active {
                return Ok(InsertOutcome::Conflict);
            }
        }

        let id = record.id;
        tables
            .by_fingerprint
            .entry(record.fingerprint.clone())
            .or_default()
            .push(id);
        tables.records.insert(id, record);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn find_active(&self, fingerprint: &ContentFingerprint) -> Result<Option<ExtractionRecord>> {
        let tables = self.tables.read();
        let record = tables.by_fingerprint.get(fingerprint).and_then(|ids| {
            ids.iter()
                .filter_map(|id| tables.records.get(id))
                .find(|r| r.status.is_active())
                .cloned()
        });
        Ok(record)
    }

    async fn get_record(&self, id: Uuid) -> Result<Option<ExtractionRecord>> {
        Ok(self.tables.read().records.get(&id).cloned())
    }

    async fn prior_attempts(&self, fingerprint: &ContentFingerprint) -> Result<u32> {
        let tables = self.tables.read();
        let count = tables
            .by_fingerprint
            .get(fingerprint)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.records.get(id))
                    .filter(|r| !r.status.is_active())
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u32)
    }

    async fn create_job(&self, job: &BatchJob) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.jobs.contains_key(&job.id) {
            return Err(DocketError::storage(format!("batch job {} already exists", job.id)));
        }
        tables.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn update_job(&self, job: &BatchJob) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(DocketError::storage(format!("batch job {} not found", job.id))),
        }
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<BatchJob>> {
        Ok(self.tables.read().jobs.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::types::{ProcessingMetadata, ProcessingMethod};

    fn completed_record(content: &[u8]) -> ExtractionRecord {
        let meta = ProcessingMetadata::new(ProcessingMethod::Hybrid, 0.01);
        ExtractionRecord::completed(fingerprint(content), serde_json::json!({"ok": true}), &meta, 0)
    }

    #[tokio::test]
    async fn test_insert_and_find_active() {
        let store = MemoryStore::new();
        let record = completed_record(b"doc");
        let fp = record.fingerprint.clone();

        let outcome = store.insert_record(record.clone()).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(record.id));

        let found = store.find_active(&fp).await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
    }

    #[tokio::test]
    async fn test_second_active_insert_conflicts() {
        let store = MemoryStore::new();
        let first = completed_record(b"doc");
        let second = completed_record(b"doc");

        store.insert_record(first).await.unwrap();
        let outcome = store.insert_record(second).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Conflict);
        assert_eq!(store.active_count(&fingerprint(b"doc")), 1);
    }

    #[tokio::test]
    async fn test_failed_records_accumulate_without_conflict() {
        let store = MemoryStore::new();
        let fp = fingerprint(b"doc");

        for attempt in 0..3 {
            let record = ExtractionRecord::failed(fp.clone(), "boom".to_string(), attempt);
            let outcome = store.insert_record(record).await.unwrap();
            assert!(matches!(outcome, InsertOutcome::Inserted(_)));
        }

        assert_eq!(store.prior_attempts(&fp).await.unwrap(), 3);
        assert!(store.find_active(&fp).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_then_active_insert_succeeds() {
        let store = MemoryStore::new();
        let fp = fingerprint(b"doc");

        store
            .insert_record(ExtractionRecord::failed(fp.clone(), "boom".to_string(), 0))
            .await
            .unwrap();
        let outcome = store.insert_record(completed_record(b"doc")).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
        assert_eq!(store.active_count(&fp), 1);
    }

    #[tokio::test]
    async fn test_job_crud() {
        let store = MemoryStore::new();
        let mut job = BatchJob::new(2, None);

        store.create_job(&job).await.unwrap();
        assert!(store.create_job(&job).await.is_err());

        job.completed_files = 1;
        store.update_job(&job).await.unwrap();

        let loaded = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.completed_files, 1);

        assert!(store.get_job(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_job_is_storage_error() {
        let store = MemoryStore::new();
        let job = BatchJob::new(1, None);
        let err = store.update_job(&job).await.unwrap_err();
        assert!(matches!(err, DocketError::Storage { .. }));
    }
}
