//! REST API server for Docket batch submission.
//!
//! Axum-based HTTP surface over the batch orchestrator.
//!
//! # Endpoints
//!
//! - `POST /batch` - Submit 1-100 files (multipart form data) with an
//!   optional HTTPS `webhook_url`; answers `202 Accepted` immediately
//! - `GET /batch/{id}` - Poll a batch job's status and accounting
//! - `GET /health` - Health check endpoint
//! - `GET /info` - Server information
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use docket::api::serve;
//! use docket::batch::BatchProcessor;
//! use docket::config::DocketConfig;
//! use docket::extract::{DefaultUploadValidator, RemoteExtractor};
//! use docket::notify::Notifier;
//! use docket::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> docket::Result<()> {
//!     let config = DocketConfig::default();
//!     let processor = Arc::new(BatchProcessor::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(RemoteExtractor::new(
//!             config.extractor.base_url.clone(),
//!             config.extractor_timeout(),
//!         )?),
//!         Arc::new(DefaultUploadValidator::new(config.max_file_bytes)),
//!         Arc::new(Notifier::new(config.notify_timeout(), config.notifications.queue_capacity)?),
//!         config,
//!     ));
//!     serve("127.0.0.1", 8100, processor).await?;
//!     Ok(())
//! }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Submit a batch with a completion webhook
//! curl -F "files=@invoice.pdf" -F "files=@contract.pdf" \
//!      -F "webhook_url=https://example.com/hooks/docket" \
//!      http://localhost:8100/batch
//!
//! # Poll for progress
//! curl http://localhost:8100/batch/<batch_job_id>
//!
//! # Health check
//! curl http://localhost:8100/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{create_router, create_router_with_limits, serve, serve_with_limits};
pub use types::{
    ApiSizeLimits, ApiState, BatchStatusResponse, BatchSubmitResponse, ErrorResponse, HealthResponse, InfoResponse,
};
