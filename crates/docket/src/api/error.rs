//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::ErrorResponse;
use crate::error::DocketError;

/// An error ready to leave the API boundary: a status code plus the
/// serialized [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_type: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error_type: &str, message: String) -> Self {
        Self {
            status,
            error_type: error_type.to_string(),
            message,
        }
    }

    /// 400 for rejected input.
    pub fn validation(err: DocketError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", err.to_string())
    }

    /// 404 for unknown resources.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message.into())
    }

    /// 500 for everything the caller cannot fix.
    pub fn internal(err: DocketError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
    }
}

impl From<DocketError> for ApiError {
    fn from(err: DocketError) -> Self {
        match err {
            DocketError::Validation { .. } => Self::validation(err),
            _ => Self::internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error_type: self.error_type,
            message: self.message,
            status_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::from(DocketError::validation("bad upload"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("bad upload"));
    }

    #[test]
    fn test_storage_maps_to_500() {
        let err = ApiError::from(DocketError::storage("store down"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found() {
        let err = ApiError::not_found("no such batch");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
