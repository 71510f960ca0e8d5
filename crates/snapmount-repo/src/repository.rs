//! Repository abstraction the mount is served from.

use snapmount_common::error::Result;
use snapmount_common::types::BlobId;

use crate::snapshot::Snapshot;

/// Read access to a backup repository.
///
/// The index is loaded once, through exclusive access, before the
/// repository is shared with the served tree. After that every method takes
/// `&self` and may be called from several request threads at once.
pub trait Repository: Send + Sync {
    /// Loads the blob index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    fn load_index(&mut self) -> Result<()>;

    /// Lists every snapshot in the repository, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot record cannot be read or parsed.
    fn snapshots(&self) -> Result<Vec<Snapshot>>;

    /// Returns the size in bytes of a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is not loaded or the blob is unknown.
    fn blob_size(&self, id: &BlobId) -> Result<u64>;

    /// Reads and verifies a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is not loaded, the blob is unknown,
    /// cannot be read, or fails verification.
    fn load_blob(&self, id: &BlobId) -> Result<Vec<u8>>;
}
