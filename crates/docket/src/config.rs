//! Configuration loading and management.
//!
//! Configuration comes from a `docket.toml` file, discovered in the current
//! directory or any ancestor, or is constructed programmatically. Every
//! field has a default so a missing or sparse file is never an error.

use crate::{DocketError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level service configuration.
///
/// # Example
///
/// ```rust
/// use docket::config::DocketConfig;
///
/// // Defaults
/// let config = DocketConfig::default();
/// assert_eq!(config.max_files_per_batch, 100);
///
/// // From TOML
/// // let config = DocketConfig::from_toml_file("docket.toml")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocketConfig {
    /// Upper bound on files accepted per batch submission.
    #[serde(default = "default_max_files")]
    pub max_files_per_batch: usize,

    /// Upper bound on a single upload's size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    /// Wall-clock budget for one whole batch. When it elapses the
    /// orchestrator stops scheduling further files and the job ends
    /// `partial` with all accumulated progress intact.
    #[serde(default = "default_batch_deadline_secs")]
    pub batch_deadline_secs: u64,

    /// Extraction collaborator endpoint.
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Webhook notification settings.
    #[serde(default)]
    pub notifications: NotifyConfig,
}

/// Remote extraction service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Base URL of the extraction service.
    #[serde(default = "default_extractor_url")]
    pub base_url: String,

    /// Per-document timeout enforced by the HTTP client, in seconds.
    #[serde(default = "default_extractor_timeout_secs")]
    pub timeout_secs: u64,
}

/// Notification emitter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Ceiling on queued, undelivered notifications.
    #[serde(default = "default_notify_capacity")]
    pub queue_capacity: usize,

    /// Per-delivery timeout in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_files() -> usize {
    100
}

fn default_max_file_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_batch_deadline_secs() -> u64 {
    300
}

fn default_extractor_url() -> String {
    "http://127.0.0.1:9100".to_string()
}

fn default_extractor_timeout_secs() -> u64 {
    120
}

fn default_notify_capacity() -> usize {
    crate::notify::DEFAULT_QUEUE_CAPACITY
}

fn default_notify_timeout_secs() -> u64 {
    10
}

impl Default for DocketConfig {
    fn default() -> Self {
        Self {
            max_files_per_batch: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
            batch_deadline_secs: default_batch_deadline_secs(),
            extractor: ExtractorConfig::default(),
            notifications: NotifyConfig::default(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: default_extractor_url(),
            timeout_secs: default_extractor_timeout_secs(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_notify_capacity(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

impl DocketConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocketError::validation_with_source(format!("failed to read config file {}", path.display()), e)
        })?;
        let config = toml::from_str(&content)
            .map_err(|e: toml::de::Error| DocketError::validation(format!("invalid config file: {e}")))?;
        Ok(config)
    }

    /// Search the current directory and its ancestors for `docket.toml`.
    ///
    /// Returns `Ok(None)` when no file is found; callers fall back to
    /// defaults.
    pub fn discover() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        for dir in cwd.ancestors() {
            let candidate = dir.join("docket.toml");
            if candidate.is_file() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }
        Ok(None)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_secs(self.batch_deadline_secs)
    }

    pub fn extractor_timeout(&self) -> Duration {
        Duration::from_secs(self.extractor.timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notifications.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DocketConfig::default();
        assert_eq!(config.max_files_per_batch, 100);
        assert_eq!(config.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.batch_deadline(), Duration::from_secs(300));
        assert_eq!(config.extractor.base_url, "http://127.0.0.1:9100");
        assert_eq!(config.notifications.queue_capacity, 64);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
max_files_per_batch = 25
batch_deadline_secs = 60

[extractor]
base_url = "http://extract.internal:8080"
"#
        )
        .unwrap();

        let config = DocketConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_files_per_batch, 25);
        assert_eq!(config.batch_deadline_secs, 60);
        assert_eq!(config.extractor.base_url, "http://extract.internal:8080");
        // Unset sections and fields keep their defaults.
        assert_eq!(config.extractor.timeout_secs, 120);
        assert_eq!(config.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.notifications.timeout_secs, 10);
    }

    #[test]
    fn test_from_toml_file_empty_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.toml");
        std::fs::write(&path, "").unwrap();

        let config = DocketConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_files_per_batch, 100);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = DocketConfig::from_toml_file("/nonexistent/docket.toml");
        assert!(matches!(result.unwrap_err(), DocketError::Validation { .. }));
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docket.toml");
        std::fs::write(&path, "max_files_per_batch = \"many\"").unwrap();

        let result = DocketConfig::from_toml_file(&path);
        assert!(matches!(result.unwrap_err(), DocketError::Validation { .. }));
    }
}
