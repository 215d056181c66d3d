//! API request handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::DocketError;
use crate::types::UploadedFile;

use super::{
    error::ApiError,
    types::{ApiState, BatchStatusResponse, BatchSubmitResponse, HealthResponse, InfoResponse},
};

/// Batch submission handler.
///
/// POST /batch
///
/// Accepts multipart form data with:
/// - `files`: 1-100 files to process
/// - `webhook_url` (optional): HTTPS URL notified once the batch reaches a
///   terminal state
///
/// Always answers `202 Accepted` with the job id and a status URL when the
/// submission itself is admissible — even a batch whose every file later
/// fails gets a 202; callers poll `GET /batch/{id}` for outcomes. Rejects
/// with `400` for an empty or oversized file list or a non-HTTPS webhook
/// URL, before any processing starts.
pub async fn submit_batch_handler(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchSubmitResponse>), ApiError> {
    let mut files = Vec::new();
    let mut webhook_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(DocketError::validation(e.to_string())))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(DocketError::validation(e.to_string())))?;
                files.push(UploadedFile::new(file_name, data.to_vec()));
            }
            "webhook_url" => {
                let url = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(DocketError::validation(e.to_string())))?;
                if !url.is_empty() {
                    webhook_url = Some(url);
                }
            }
            _ => {}
        }
    }

    let job = Arc::clone(&state.processor).submit_and_spawn(files, webhook_url).await?;
    Ok((StatusCode::ACCEPTED, Json(BatchSubmitResponse::from(&job))))
}

/// Batch status handler.
///
/// GET /batch/{id}
pub async fn batch_status_handler(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchStatusResponse>, ApiError> {
    let job = state
        .processor
        .store()
        .get_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("batch job {id} not found")))?;

    Ok(Json(BatchStatusResponse::from(&job)))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Server info endpoint handler.
///
/// GET /info
pub async fn info_handler(State(state): State<ApiState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_files_per_batch: state.processor.config().max_files_per_batch,
    })
}
