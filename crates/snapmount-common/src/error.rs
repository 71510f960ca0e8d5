//! Unified error types for the snapmount workspace.
//!
//! Every lifecycle step of a mount reports through [`SnapmountError`], so the
//! command layer can print whatever surfaced without re-wrapping it.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum SnapmountError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The command was invoked with missing or malformed arguments.
    #[error("{message}")]
    Argument {
        /// Description of the argument problem.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A blob's content does not match its identifier.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Resource that failed validation.
        resource: String,
        /// Expected hash value.
        expected: String,
        /// Actual computed hash value.
        actual: String,
    },

    /// Blob lookup was attempted before the repository index was loaded.
    #[error("repository index has not been loaded")]
    IndexNotLoaded,

    /// The host refused to establish the filesystem session.
    #[error("mounting {path} failed: {source}")]
    Mount {
        /// Mountpoint that could not be mounted.
        path: PathBuf,
        /// Underlying error reported by the host.
        source: std::io::Error,
    },

    /// Releasing a mount failed.
    #[error("unmounting {path} failed: {message}")]
    Unmount {
        /// Mountpoint that could not be released.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The session failed while answering filesystem requests.
    #[error("serving {path} failed: {source}")]
    Serve {
        /// Mountpoint being served.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SnapmountError>;
