//! SHA-256 content verification.
//!
//! Blobs are addressed by the digest of their bytes; every read is checked
//! against the address it was requested under.

use sha2::{Digest, Sha256};
use snapmount_common::error::{Result, SnapmountError};
use snapmount_common::types::BlobId;

/// Computes the content address of a byte slice.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> BlobId {
    let id = BlobId::from_digest(Sha256::digest(data).as_slice());
    tracing::trace!(len = data.len(), hash = %id, "computed SHA-256");
    id
}

/// Validates that `data` matches the expected blob ID.
///
/// # Errors
///
/// Returns `SnapmountError::HashMismatch` if the hashes do not match.
pub fn validate_hash(data: &[u8], expected: &BlobId) -> Result<()> {
    let actual = hash_bytes(data);
    if &actual != expected {
        return Err(SnapmountError::HashMismatch {
            resource: format!("blob {expected}"),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_of_empty_input_is_well_known() {
        assert_eq!(
            hash_bytes(b"").as_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn validate_accepts_matching_content() {
        let id = hash_bytes(b"hello");
        validate_hash(b"hello", &id).expect("should match");
    }

    #[test]
    fn validate_rejects_tampered_content() {
        let id = hash_bytes(b"hello");
        let err = validate_hash(b"hellO", &id).unwrap_err();
        assert!(matches!(err, SnapmountError::HashMismatch { .. }));
    }
}
