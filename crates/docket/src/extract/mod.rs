//! Extraction collaborator seam.
//!
//! The extraction computation itself lives outside this crate, behind
//! [`ExtractionService`]. What lives here is the invocation adapter: call
//! the collaborator, classify what came back (success / partial / failure),
//! and surface the processing metadata the accounting layer needs. The
//! adapter holds no state and never retries; retry policy belongs to the
//! collaborator or to resubmission.

use crate::error::Result;
use crate::types::ProcessingMetadata;
use async_trait::async_trait;
use std::path::Path;

pub mod remote;
pub mod validate;

pub use remote::RemoteExtractor;
pub use validate::{DefaultUploadValidator, ValidatedUpload};

/// A usable extraction result: structured payload plus the processing
/// metadata (method, cost estimate) the collaborator reports.
#[derive(Debug, Clone)]
pub struct StructuredResult {
    pub payload: serde_json::Value,
    pub metadata: ProcessingMetadata,
}

/// Failure modes of one collaborator call.
#[derive(Debug)]
pub enum ExtractionCallError {
    /// The collaborator produced a usable-but-incomplete result. The
    /// partial payload and its metadata are retained alongside the cause.
    Partial {
        payload: serde_json::Value,
        metadata: ProcessingMetadata,
        cause: String,
    },
    /// The collaborator failed outright; nothing usable came back.
    Failed { cause: String },
}

impl std::fmt::Display for ExtractionCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionCallError::Partial { cause, .. } => write!(f, "partial extraction: {cause}"),
            ExtractionCallError::Failed { cause } => write!(f, "extraction failed: {cause}"),
        }
    }
}

impl std::error::Error for ExtractionCallError {}

/// The external extraction computation.
///
/// Implementations turn a staged file into a [`StructuredResult`] or report
/// how they failed. The orchestrator never calls this directly; it goes
/// through [`invoke`] for outcome classification.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, path: &Path) -> std::result::Result<StructuredResult, ExtractionCallError>;
}

/// Upload validation collaborator.
///
/// Runs before fingerprinting; a rejection isolates to the one file and is
/// recorded as a failed outcome, never aborting the batch.
pub trait UploadValidator: Send + Sync {
    fn validate(&self, file_name: Option<&str>, content: &[u8]) -> Result<ValidatedUpload>;
}

/// Classified outcome of one extraction invocation.
#[derive(Debug)]
pub enum InvocationOutcome {
    Success {
        payload: serde_json::Value,
        metadata: ProcessingMetadata,
    },
    Partial {
        payload: serde_json::Value,
        metadata: ProcessingMetadata,
        cause: String,
    },
    Failure {
        cause: String,
    },
}

/// Invoke the collaborator for one staged file and classify the outcome.
pub async fn invoke(service: &dyn ExtractionService, path: &Path) -> InvocationOutcome {
    match service.extract(path).await {
        Ok(StructuredResult { payload, metadata }) => InvocationOutcome::Success { payload, metadata },
        Err(ExtractionCallError::Partial {
            payload,
            metadata,
            cause,
        }) => InvocationOutcome::Partial {
            payload,
            metadata,
            cause,
        },
        Err(ExtractionCallError::Failed { cause }) => InvocationOutcome::Failure { cause },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessingMethod;

    struct FixedService(std::sync::Mutex<Option<std::result::Result<StructuredResult, ExtractionCallError>>>);

    #[async_trait]
    impl ExtractionService for FixedService {
        async fn extract(&self, _path: &Path) -> std::result::Result<StructuredResult, ExtractionCallError> {
            self.0.lock().unwrap().take().expect("single call expected")
        }
    }

    fn metadata() -> ProcessingMetadata {
        ProcessingMetadata::new(ProcessingMethod::Hybrid, 0.01)
    }

    #[tokio::test]
    async fn test_invoke_classifies_success() {
        let service = FixedService(std::sync::Mutex::new(Some(Ok(StructuredResult {
            payload: serde_json::json!({"text": "hello"}),
            metadata: metadata(),
        }))));

        match invoke(&service, Path::new("/tmp/ignored")).await {
            InvocationOutcome::Success { payload, metadata } => {
                assert_eq!(payload["text"], "hello");
                assert_eq!(metadata.method, ProcessingMethod::Hybrid);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_classifies_partial() {
        let service = FixedService(std::sync::Mutex::new(Some(Err(ExtractionCallError::Partial {
            payload: serde_json::json!({"pages": 2}),
            metadata: metadata(),
            cause: "page 3 unreadable".to_string(),
        }))));

        match invoke(&service, Path::new("/tmp/ignored")).await {
            InvocationOutcome::Partial { payload, cause, .. } => {
                assert_eq!(payload["pages"], 2);
                assert_eq!(cause, "page 3 unreadable");
            }
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_classifies_failure() {
        let service = FixedService(std::sync::Mutex::new(Some(Err(ExtractionCallError::Failed {
            cause: "collaborator crashed".to_string(),
        }))));

        match invoke(&service, Path::new("/tmp/ignored")).await {
            InvocationOutcome::Failure { cause } => assert_eq!(cause, "collaborator crashed"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
