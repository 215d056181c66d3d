//! Shared fixtures for integration tests: a scriptable extraction service,
//! a processor builder, and a minimal webhook capture server.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use docket::batch::BatchProcessor;
use docket::config::DocketConfig;
use docket::extract::{ExtractionCallError, ExtractionService, StructuredResult, UploadValidator};
use docket::extract::validate::ValidatedUpload;
use docket::notify::Notifier;
use docket::store::MemoryStore;
use docket::types::{ProcessingMetadata, ProcessingMethod};

/// Content markers the scripted service reacts to.
pub const HARD_FAIL_MARKER: &str = "HARD-FAIL";
pub const PARTIAL_MARKER: &str = "PARTIAL-RESULT";

/// Extraction collaborator scripted by file content.
///
/// Succeeds with the configured method and cost unless the staged content
/// contains one of the markers above. Counts every invocation, which is how
/// the tests assert the zero-extra-invocations reuse property.
pub struct ScriptedService {
    invocations: AtomicUsize,
    delay: Option<Duration>,
    method: ProcessingMethod,
    cost_estimate: f64,
}

impl ScriptedService {
    pub fn cheap() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            delay: None,
            method: ProcessingMethod::Hybrid,
            cost_estimate: 0.01,
        }
    }

    pub fn fallback(cost_estimate: f64) -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            delay: None,
            method: ProcessingMethod::Fallback,
            cost_estimate,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionService for ScriptedService {
    async fn extract(&self, path: &std::path::Path) -> Result<StructuredResult, ExtractionCallError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = tokio::fs::read(path).await.map_err(|e| ExtractionCallError::Failed {
            cause: format!("cannot read staged file: {e}"),
        })?;
        let text = String::from_utf8_lossy(&content).to_string();
        let metadata = ProcessingMetadata::new(self.method, self.cost_estimate);

        if text.contains(HARD_FAIL_MARKER) {
            return Err(ExtractionCallError::Failed {
                cause: "scripted hard failure".to_string(),
            });
        }
        if text.contains(PARTIAL_MARKER) {
            return Err(ExtractionCallError::Partial {
                payload: serde_json::json!({"text": text, "truncated": true}),
                metadata,
                cause: "scripted partial failure".to_string(),
            });
        }

        Ok(StructuredResult {
            payload: serde_json::json!({"text": text}),
            metadata,
        })
    }
}

/// Validator that accepts everything; for tests that script outcomes purely
/// through the extraction service.
pub struct AcceptAllValidator;

impl UploadValidator for AcceptAllValidator {
    fn validate(&self, _: Option<&str>, _: &[u8]) -> docket::Result<ValidatedUpload> {
        Ok(ValidatedUpload {
            mime_type: "text/plain".to_string(),
        })
    }
}

/// Build a processor around a scripted service and return it with its store
/// for direct assertions.
pub fn scripted_processor(
    service: Arc<ScriptedService>,
    config: DocketConfig,
) -> (Arc<BatchProcessor>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let validator = Arc::new(docket::extract::DefaultUploadValidator::new(config.max_file_bytes));
    let notifier = Arc::new(Notifier::new(Duration::from_millis(500), 8).expect("notifier"));
    let processor = Arc::new(BatchProcessor::new(
        store.clone() as Arc<dyn docket::store::RecordStore>,
        service,
        validator,
        notifier,
        config,
    ));
    (processor, store)
}

/// Minimal HTTP server that records every request body it receives and
/// answers 200. Returns the webhook URL and the captured bodies.
pub async fn capture_webhooks() -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind capture server");
    let addr = listener.local_addr().expect("local addr");
    let bodies: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&bodies);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let captured = Arc::clone(&captured);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    buf.extend_from_slice(&chunk[..n]);

                    let Some(header_end) = find_subsequence(&buf, b"\r\n\r\n") else {
                        continue;
                    };
                    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
                    let content_length = headers
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);

                    let body_start = header_end + 4;
                    if buf.len() >= body_start + content_length {
                        let body = String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string();
                        captured.lock().push(body);
                        let _ = socket
                            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                            .await;
                        break;
                    }
                }
            });
        }
    });

    (format!("http://{addr}/hook"), bodies)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Poll until `check` passes or the timeout elapses.
pub async fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
