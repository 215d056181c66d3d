//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::batch::BatchProcessor;
use crate::types::{BatchJob, BatchStatus, RoutingStats};

/// API server size limit configuration.
///
/// Default limits are 100 MB, sized for typical document batches. Override
/// via environment:
///
/// ```bash
/// # In bytes:
/// export DOCKET_MAX_REQUEST_BODY_BYTES=104857600
/// # Or in MB:
/// export DOCKET_MAX_UPLOAD_SIZE_MB=100
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of the entire request body in bytes (all files plus
    /// form data combined).
    pub max_request_body_bytes: usize,
}

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ApiSizeLimits {
    pub fn new(max_request_body_bytes: usize) -> Self {
        Self { max_request_body_bytes }
    }

    /// Convenience constructor from a megabyte count.
    pub fn from_mb(max_request_body_mb: usize) -> Self {
        Self {
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Server information response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    /// API version
    pub version: String,
    /// Upper bound on files per batch submission
    pub max_files_per_batch: usize,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type name
    pub error_type: String,
    /// Error message
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
}

/// Accepted-batch response returned from `POST /batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSubmitResponse {
    pub batch_job_id: Uuid,
    /// Where to poll for progress.
    pub status_url: String,
    pub total_files: u32,
    pub status: BatchStatus,
}

impl From<&BatchJob> for BatchSubmitResponse {
    fn from(job: &BatchJob) -> Self {
        Self {
            batch_job_id: job.id,
            status_url: format!("/batch/{}", job.id),
            total_files: job.total_files,
            status: job.status,
        }
    }
}

/// Full job projection returned from `GET /batch/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    pub id: Uuid,
    pub status: BatchStatus,
    pub total_files: u32,
    pub completed_files: u32,
    pub failed_files: u32,
    pub routing_stats: RoutingStats,
    pub extraction_ids: Vec<Uuid>,
    pub cost_estimate: f64,
    pub cost_savings: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BatchJob> for BatchStatusResponse {
    fn from(job: &BatchJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            total_files: job.total_files,
            completed_files: job.completed_files,
            failed_files: job.failed_files,
            routing_stats: job.routing_stats,
            extraction_ids: job.extraction_ids.clone(),
            cost_estimate: job.cost_estimate,
            cost_savings: job.cost_savings,
            webhook_url: job.webhook_url.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// API server state.
#[derive(Clone)]
pub struct ApiState {
    /// The batch orchestrator every handler works through.
    pub processor: Arc<BatchProcessor>,
}
