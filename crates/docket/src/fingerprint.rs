//! Content fingerprinting.
//!
//! The fingerprint is the deduplication key for everything downstream, so it
//! has to be a stable, collision-resistant function of the raw bytes alone:
//! SHA-256, rendered as 64 lowercase hex digits. Upload names, MIME types,
//! and timestamps never feed the digest.

use crate::types::ContentFingerprint;
use sha2::{Digest, Sha256};

/// Fingerprint hex width (SHA-256 = 32 bytes = 64 hex digits).
const FINGERPRINT_HEX_WIDTH: usize = 64;

/// Compute the content fingerprint of a byte sequence.
///
/// Deterministic across repeated calls and across processes: equal bytes
/// always yield equal fingerprints.
pub fn fingerprint(content: &[u8]) -> ContentFingerprint {
    let digest = Sha256::digest(content);
    ContentFingerprint::from_digest(hex::encode(digest))
}

/// Check that a string has the shape of a fingerprint digest.
///
/// Useful at trust boundaries (API parameters, store contents) before a
/// value is used as a lookup key.
pub fn validate_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_HEX_WIDTH && value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint(b"the same bytes");
        let b = fingerprint(b"the same bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_content() {
        let a = fingerprint(b"content A");
        let b = fingerprint(b"content B");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_known_vector() {
        // SHA-256 of the empty string is a fixed, well-known value.
        let fp = fingerprint(b"");
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint(b"shape check");
        assert_eq!(fp.as_str().len(), 64);
        assert!(validate_fingerprint(fp.as_str()));
    }

    #[test]
    fn test_validate_fingerprint_rejects_bad_shapes() {
        assert!(!validate_fingerprint("abc123"));
        assert!(!validate_fingerprint(&"g".repeat(64)));
        assert!(!validate_fingerprint(&"A".repeat(64)));
        assert!(!validate_fingerprint(&"0".repeat(63)));
        assert!(!validate_fingerprint(&"0".repeat(65)));
    }

    #[test]
    fn test_fingerprint_ignores_nothing_but_bytes() {
        // Same bytes delivered as different "files" still collide, which is
        // exactly the point.
        let a = fingerprint(&[0u8, 1, 2, 3]);
        let b = fingerprint(&[0u8, 1, 2, 3]);
        assert_eq!(a.to_string(), b.to_string());
    }
}
