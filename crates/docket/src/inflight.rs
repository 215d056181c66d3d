//! In-flight computation locks.
//!
//! The dedup index only prevents duplicate *persisted* records. Two tasks in
//! the same process can still both miss the lookup and both pay for the same
//! extraction before either commits. This registry closes that window for
//! same-process concurrency: one mutex slot per fingerprint, held for the
//! duration of one extraction.
//!
//! The registry is advisory. Cross-process at-most-once comes from the
//! storage uniqueness constraint, never from here. A task that waited on a
//! slot must re-check the dedup index after acquisition, because the prior
//! holder usually just committed the record it was waiting for.
//!
//! Slots are reference counted: the map entry is removed when the last
//! holder releases and no acquirer is waiting, so the registry stays sized
//! to the current burst instead of growing with every fingerprint ever seen.

use crate::types::ContentFingerprint;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Process-local registry of per-fingerprint mutual-exclusion slots.
#[derive(Default)]
pub struct InflightLocks {
    slots: Arc<DashMap<ContentFingerprint, Slot>>,
}

impl InflightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the caller is the sole in-flight holder for the
    /// fingerprint. The returned guard releases on every exit path,
    /// including cancellation, via `Drop`.
    pub async fn acquire(&self, fingerprint: &ContentFingerprint) -> InflightGuard {
        // The get-or-create must be race free: DashMap's entry API holds the
        // shard lock across the check-and-insert. The shard lock is released
        // before the await below.
        let slot = self
            .slots
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = slot.clone().lock_owned().await;

        InflightGuard {
            slots: Arc::clone(&self.slots),
            fingerprint: fingerprint.clone(),
            slot,
            guard: Some(guard),
        }
    }

    /// Number of live slots. A slot exists only while some task holds or
    /// awaits it.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Scoped lock handle for one fingerprint.
pub struct InflightGuard {
    slots: Arc<DashMap<ContentFingerprint, Slot>>,
    fingerprint: ContentFingerprint,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        // Release the mutex first so a waiter can proceed immediately.
        self.guard.take();

        // Two strong references mean the map entry plus our own clone:
        // nobody else holds or awaits this slot, so it can be retired.
        // A waiter that cloned the slot keeps the count above two and the
        // entry alive; remove_if holds the shard lock, so no new clone can
        // slip in between the count check and the removal.
        self.slots.remove_if(&self.fingerprint, |_, slot| {
            Arc::ptr_eq(slot, &self.slot) && Arc::strong_count(slot) <= 2
        });
    }
}
