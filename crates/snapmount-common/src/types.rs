//! Domain primitive types used across the snapmount workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{SHA256_HEX_LENGTH, SHORT_ID_LENGTH};
use crate::error::{Result, SnapmountError};

/// Identifier of a snapshot record inside a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Creates a snapshot ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form shown in listings.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LENGTH).unwrap_or(&self.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content address of a blob: the hex-encoded SHA-256 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    /// Creates a blob ID from a hex-encoded SHA-256 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != SHA256_HEX_LENGTH || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SnapmountError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Creates a blob ID from raw digest bytes.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        let hex = digest.iter().fold(String::with_capacity(digest.len() * 2), |mut acc, b| {
            acc.push_str(&format!("{b:02x}"));
            acc
        });
        Self(hex)
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
