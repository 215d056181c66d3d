//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{Result, batch::BatchProcessor};

use super::{
    handlers::{batch_status_handler, health_handler, info_handler, submit_batch_handler},
    types::{ApiSizeLimits, ApiState},
};

/// Parse size limits from environment variables.
///
/// `DOCKET_MAX_REQUEST_BODY_BYTES` wins over the MB-denominated
/// `DOCKET_MAX_UPLOAD_SIZE_MB`; both fall back to the 100 MB default when
/// unset or invalid.
fn parse_size_limits_from_env() -> ApiSizeLimits {
    if let Ok(value) = std::env::var("DOCKET_MAX_REQUEST_BODY_BYTES") {
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => {
                tracing::info!("Upload size limit configured from environment: {} bytes", bytes);
                return ApiSizeLimits::new(bytes);
            }
            _ => {
                tracing::warn!(
                    "Failed to parse DOCKET_MAX_REQUEST_BODY_BYTES='{}', must be a positive integer",
                    value
                );
            }
        }
    }

    if let Ok(value) = std::env::var("DOCKET_MAX_UPLOAD_SIZE_MB") {
        match value.parse::<usize>() {
            Ok(mb) if mb > 0 => {
                tracing::info!("Upload size limit configured from environment: {} MB", mb);
                return ApiSizeLimits::from_mb(mb);
            }
            _ => {
                tracing::warn!(
                    "Failed to parse DOCKET_MAX_UPLOAD_SIZE_MB='{}', must be a positive integer",
                    value
                );
            }
        }
    }

    let limits = ApiSizeLimits::default();
    tracing::info!(
        "Upload size limit: 100 MB (default, {} bytes)",
        limits.max_request_body_bytes
    );
    limits
}

/// Create the API router with all routes configured.
///
/// Public so the router can be embedded in a larger application.
pub fn create_router(processor: Arc<BatchProcessor>) -> Router {
    create_router_with_limits(processor, ApiSizeLimits::default())
}

/// Create the API router with custom size limits.
pub fn create_router_with_limits(processor: Arc<BatchProcessor>, limits: ApiSizeLimits) -> Router {
    let state = ApiState { processor };

    let cors_layer = if let Ok(origins_str) = std::env::var("DOCKET_CORS_ORIGINS") {
        let origins: Vec<_> = origins_str
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if !origins.is_empty() {
            tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            tracing::warn!("DOCKET_CORS_ORIGINS set but empty/invalid - falling back to permissive CORS");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
    } else {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set \
             DOCKET_CORS_ORIGINS to a comma-separated list of allowed origins"
        );
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/batch", post(submit_batch_handler))
        .route("/batch/{id}", get(batch_status_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .layer(DefaultBodyLimit::max(limits.max_request_body_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server with size limits taken from the environment.
///
/// # Arguments
///
/// * `host` - IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// * `port` - Port number to bind to
/// * `processor` - Fully wired batch orchestrator
pub async fn serve(host: impl AsRef<str>, port: u16, processor: Arc<BatchProcessor>) -> Result<()> {
    let limits = parse_size_limits_from_env();
    serve_with_limits(host, port, processor, limits).await
}

/// Start the API server with explicit size limits.
pub async fn serve_with_limits(
    host: impl AsRef<str>,
    port: u16,
    processor: Arc<BatchProcessor>,
    limits: ApiSizeLimits,
) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| crate::error::DocketError::validation(format!("Invalid host address: {e}")))?;

    let addr = SocketAddr::new(ip, port);
    let app = create_router_with_limits(processor, limits);

    tracing::info!("Starting Docket API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(crate::error::DocketError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::DocketError::Other(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocketConfig;
    use crate::extract::{DefaultUploadValidator, RemoteExtractor};
    use crate::notify::Notifier;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn test_processor() -> Arc<BatchProcessor> {
        let config = DocketConfig::default();
        Arc::new(BatchProcessor::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RemoteExtractor::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap()),
            Arc::new(DefaultUploadValidator::new(config.max_file_bytes)),
            Arc::new(Notifier::new(Duration::from_secs(1), 4).unwrap()),
            config,
        ))
    }

    #[tokio::test]
    async fn test_create_router() {
        let _router = create_router(test_processor());
    }

    #[tokio::test]
    async fn test_create_router_with_custom_limits() {
        let limits = ApiSizeLimits::from_mb(5);
        assert_eq!(limits.max_request_body_bytes, 5 * 1024 * 1024);
        let _router = create_router_with_limits(test_processor(), limits);
    }

    #[tokio::test]
    async fn test_serve_rejects_bad_host() {
        let result = serve("not-an-ip", 0, test_processor()).await;
        assert!(result.is_err());
    }
}
