//! Error types for Docket.
//!
//! All fallible operations in the crate return [`Result`], with [`DocketError`]
//! as the single error enum. Conventions:
//!
//! - `thiserror` for the `Error` trait implementation
//! - error chains preserved with `#[source]` attributes
//! - context (fingerprints, ids, urls) carried in the message
//!
//! # Error Handling Philosophy
//!
//! **System errors bubble up unchanged:**
//! - `DocketError::Io` (from `std::io::Error`) - staging and filesystem errors
//! - These indicate real system problems and are never wrapped or suppressed
//!
//! **Application errors are wrapped with context:**
//! - `Validation` - malformed, oversized, or unrecognized uploads; bad parameters
//! - `Storage` - the record store is unreachable or rejected an operation for a
//!   reason other than the expected uniqueness conflict (the conflict itself is
//!   resolved internally and never surfaces as an error)
//! - `Extraction` - the extraction collaborator could not be invoked at all
//! - `Notification` - webhook emitter setup problems (delivery failures are
//!   logged, not raised)
use thiserror::Error;

/// Result type alias using `DocketError`.
pub type Result<T> = std::result::Result<T, DocketError>;

/// Main error type for all Docket operations.
///
/// # Variants
///
/// - `Io` - File system and I/O errors (always bubble up)
/// - `Validation` - Upload or parameter validation errors
/// - `Storage` - Record store failures other than benign uniqueness conflicts
/// - `Extraction` - Extraction collaborator invocation errors
/// - `Serialization` - JSON/TOML serialization errors
/// - `Notification` - Notification emitter errors
/// - `Other` - Catch-all for uncommon errors
#[derive(Debug, Error)]
pub enum DocketError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Notification error: {message}")]
    Notification {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DocketError {
    fn from(err: serde_json::Error) -> Self {
        DocketError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for DocketError {
    fn from(err: toml::de::Error) -> Self {
        DocketError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocketError {
    error_constructor!(validation, Validation);
    error_constructor!(storage, Storage);
    error_constructor!(extraction, Extraction);
    error_constructor!(serialization, Serialization);
    error_constructor!(notification, Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DocketError = io_err.into();
        assert!(matches!(err, DocketError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_validation_error() {
        let err = DocketError::validation("empty upload");
        assert_eq!(err.to_string(), "Validation error: empty upload");
    }

    #[test]
    fn test_validation_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad field");
        let err = DocketError::validation_with_source("empty upload", source);
        assert_eq!(err.to_string(), "Validation error: empty upload");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_storage_error() {
        let err = DocketError::storage("record store unreachable");
        assert_eq!(err.to_string(), "Storage error: record store unreachable");
    }

    #[test]
    fn test_extraction_error() {
        let err = DocketError::extraction("collaborator refused connection");
        assert_eq!(err.to_string(), "Extraction error: collaborator refused connection");
    }

    #[test]
    fn test_notification_error() {
        let err = DocketError::notification("emitter queue closed");
        assert_eq!(err.to_string(), "Notification error: emitter queue closed");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DocketError = json_err.into();
        assert!(matches!(err, DocketError::Serialization { .. }));
    }

    #[test]
    fn test_other_error() {
        let err = DocketError::Other("unexpected".to_string());
        assert_eq!(err.to_string(), "unexpected");
    }

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/docket-test-file")?;
            Ok(content)
        }

        let result = read_file();
        assert!(matches!(result.unwrap_err(), DocketError::Io(_)));
    }
}
