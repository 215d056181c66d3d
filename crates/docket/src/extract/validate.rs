//! Default upload validation.
//!
//! Uploads are untrusted: the validator rejects empty bodies, bodies over
//! the configured size ceiling, and content whose sniffed type is not an
//! accepted document format. Type detection works on the bytes (via
//! `infer`), never on the supplied file name, with a UTF-8 plain-text
//! fallback for unrecognized content.

use super::UploadValidator;
use crate::error::{DocketError, Result};

/// Content types accepted by default, matched by prefix against the
/// sniffed MIME type.
const ACCEPTED_MIME_PREFIXES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument",
    "application/vnd.oasis.opendocument",
    "application/rtf",
    "application/epub+zip",
    "image/",
    "text/",
];

/// Outcome of a successful validation: the content is admissible and its
/// sniffed MIME type is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub mime_type: String,
}

/// Size- and type-checking [`UploadValidator`].
pub struct DefaultUploadValidator {
    max_file_bytes: usize,
}

impl DefaultUploadValidator {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    fn sniff(content: &[u8]) -> Option<String> {
        if let Some(kind) = infer::get(content) {
            return Some(kind.mime_type().to_string());
        }
        // No magic-byte match: readable text is still a document.
        if std::str::from_utf8(content).is_ok() {
            return Some("text/plain".to_string());
        }
        None
    }
}

impl UploadValidator for DefaultUploadValidator {
    fn validate(&self, file_name: Option<&str>, content: &[u8]) -> Result<ValidatedUpload> {
        let name = file_name.unwrap_or("<unnamed>");

        if content.is_empty() {
            return Err(DocketError::validation(format!("upload '{name}' is empty")));
        }

        if content.len() > self.max_file_bytes {
            return Err(DocketError::validation(format!(
                "upload '{name}' is {} bytes, over the {} byte limit",
                content.len(),
                self.max_file_bytes
            )));
        }

        let mime_type = Self::sniff(content).ok_or_else(|| {
            DocketError::validation(format!("upload '{name}' has unrecognized binary content"))
        })?;

        if !ACCEPTED_MIME_PREFIXES.iter().any(|p| mime_type.starts_with(p)) {
            return Err(DocketError::validation(format!(
                "upload '{name}' has unsupported type {mime_type}"
            )));
        }

        Ok(ValidatedUpload { mime_type })
    }
}
