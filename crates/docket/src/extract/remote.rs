//! HTTP client for an external extraction service.
//!
//! Posts the staged file bytes to `{base_url}/extract` and maps the JSON
//! reply onto the invocation outcome taxonomy. Transport errors, non-2xx
//! statuses, and undecodable replies all classify as outright failures;
//! a 2xx reply flagged `partial` classifies as a partial result with its
//! payload retained.

use super::{ExtractionCallError, ExtractionService, StructuredResult};
use crate::error::{DocketError, Result};
use crate::types::ProcessingMetadata;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Wire shape of the extraction service reply.
#[derive(Debug, Deserialize)]
struct WireReply {
    payload: serde_json::Value,
    processing_metadata: ProcessingMetadata,
    #[serde(default)]
    partial: bool,
    #[serde(default)]
    error: Option<String>,
}

/// [`ExtractionService`] backed by a remote HTTP endpoint.
pub struct RemoteExtractor {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteExtractor {
    /// Build a client for the service at `base_url`.
    ///
    /// The timeout is the collaborator's internal budget for one document;
    /// there is no separate per-file timeout in the orchestrator.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocketError::extraction_with_source("failed to build extraction client", e))?;

        let base = base_url.into();
        Ok(Self {
            endpoint: format!("{}/extract", base.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl ExtractionService for RemoteExtractor {
    async fn extract(&self, path: &Path) -> std::result::Result<StructuredResult, ExtractionCallError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ExtractionCallError::Failed {
            cause: format!("failed to read staged file {}: {e}", path.display()),
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ExtractionCallError::Failed {
                cause: format!("extraction service unreachable: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionCallError::Failed {
                cause: format!("extraction service returned {status}: {}", truncate(&body, 200)),
            });
        }

        let reply: WireReply = response.json().await.map_err(|e| ExtractionCallError::Failed {
            cause: format!("undecodable extraction reply: {e}"),
        })?;

        let WireReply {
            payload,
            processing_metadata,
            partial,
            error,
        } = reply;

        if partial {
            return Err(ExtractionCallError::Partial {
                payload,
                metadata: processing_metadata,
                cause: error.unwrap_or_else(|| "unspecified partial failure".to_string()),
            });
        }

        Ok(StructuredResult {
            payload,
            metadata: processing_metadata,
        })
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
