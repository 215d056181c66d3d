//! Docket - Content-Addressed Batch Extraction Orchestration
//!
//! Docket ingests untrusted document uploads and drives each one through an
//! expensive, externally provided extraction computation — exactly once per
//! distinct content. Identical bytes share a single extraction record, a
//! process-local lock registry keeps concurrent requests from paying twice
//! for the same content, and a batch coordinator processes file sets with
//! per-file failure isolation, a wall-clock deadline, and cost/savings
//! accounting.
//!
//! # Quick Start
//!
//! ```rust
//! use docket::fingerprint::fingerprint;
//!
//! // Identical bytes, identical identity - the basis of everything else.
//! let a = fingerprint(b"quarterly report");
//! let b = fingerprint(b"quarterly report");
//! assert_eq!(a, b);
//! ```
//!
//! # Architecture
//!
//! - **`fingerprint`**: deterministic SHA-256 content identity
//! - **`dedup`**: at-most-one active extraction record per fingerprint,
//!   backed by the store's uniqueness constraint
//! - **`inflight`**: process-local per-fingerprint mutual exclusion for
//!   concurrent requests
//! - **`extract`**: collaborator seam - invocation adapter, remote HTTP
//!   client, upload validation
//! - **`batch`**: sequential per-batch orchestration with deadline, failure
//!   isolation, and event-fold accounting
//! - **`notify`**: best-effort terminal-state webhooks
//! - **`store`**: persistence contract plus an in-memory implementation
//! - **`api`** (feature `api`): Axum HTTP surface

#![deny(unsafe_code)]

pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod inflight;
pub mod notify;
pub mod store;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{DocketError, Result};
pub use types::*;

pub use batch::BatchProcessor;
pub use config::DocketConfig;
pub use dedup::DedupIndex;
pub use inflight::InflightLocks;
pub use notify::Notifier;
pub use store::{InsertOutcome, MemoryStore, RecordStore};
