//! Directory-backed repository.
//!
//! Layout under the repository root:
//!
//! ```text
//! config               JSON: { "version": 1, "id": "<uuid>" }
//! snapshots/<id>       one JSON snapshot record per file
//! data/<sha256-hex>    content blobs, named by their digest
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snapmount_common::constants::{
    REPO_CONFIG_FILE, REPO_DATA_DIR, REPO_SNAPSHOTS_DIR, REPOSITORY_VERSION,
};
use snapmount_common::error::{Result, SnapmountError};
use snapmount_common::types::{BlobId, SnapshotId};

use crate::hash;
use crate::repository::Repository;
use crate::snapshot::Snapshot;

/// Contents of the repository `config` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RepoConfig {
    version: u32,
    id: String,
}

/// Location and size of an indexed blob.
#[derive(Debug, Clone)]
struct IndexEntry {
    path: PathBuf,
    size: u64,
}

/// A repository stored in a local directory.
#[derive(Debug)]
pub struct LocalRepository {
    root: PathBuf,
    id: String,
    index: Option<HashMap<BlobId, IndexEntry>>,
}

impl LocalRepository {
    /// Creates an empty repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` already holds a repository or the layout
    /// cannot be written.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(REPO_CONFIG_FILE);
        if config_path.exists() {
            return Err(SnapmountError::Config {
                message: format!("repository already exists at {}", root.display()),
            });
        }

        for dir in [REPO_SNAPSHOTS_DIR, REPO_DATA_DIR] {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| SnapmountError::Io { path, source: e })?;
        }

        let config = RepoConfig {
            version: REPOSITORY_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
        };
        write_file(&config_path, serde_json::to_string_pretty(&config)?.as_bytes())?;
        tracing::info!(path = %root.display(), id = %config.id, "repository initialized");

        Ok(Self {
            root,
            id: config.id,
            index: None,
        })
    }

    /// Opens an existing repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns `SnapmountError::NotFound` if `root` holds no repository and
    /// `SnapmountError::Config` if its layout version is unsupported.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(REPO_CONFIG_FILE);
        if !config_path.is_file() {
            return Err(SnapmountError::NotFound {
                kind: "repository",
                id: root.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| SnapmountError::Io {
            path: config_path.clone(),
            source: e,
        })?;
        let config: RepoConfig = serde_json::from_str(&content)?;
        if config.version != REPOSITORY_VERSION {
            return Err(SnapmountError::Config {
                message: format!(
                    "unsupported repository version {} (expected {REPOSITORY_VERSION})",
                    config.version
                ),
            });
        }

        tracing::debug!(path = %root.display(), id = %config.id, "repository opened");
        Ok(Self {
            root,
            id: config.id,
            index: None,
        })
    }

    /// Returns the repository root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the repository's unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[cfg(test)]
    const fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Stores a blob and returns its content address.
    ///
    /// Storing content that is already present is a no-op. A loaded index is
    /// updated in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    pub fn save_blob(&mut self, data: &[u8]) -> Result<BlobId> {
        let id = hash::hash_bytes(data);
        let path = self.blob_path(&id);
        if !path.exists() {
            write_file(&path, data)?;
        }
        if let Some(index) = self.index.as_mut() {
            let _ = index.insert(
                id.clone(),
                IndexEntry {
                    path,
                    size: data.len() as u64,
                },
            );
        }
        Ok(id)
    }

    /// Stores a snapshot record and returns its identifier.
    ///
    /// The identifier is the SHA-256 of the serialized record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<SnapshotId> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let id = SnapshotId::new(hash::hash_bytes(&json).as_hex());
        let path = self.root.join(REPO_SNAPSHOTS_DIR).join(id.as_str());
        write_file(&path, &json)?;
        tracing::debug!(id = %id, "snapshot saved");
        Ok(id)
    }

    fn blob_path(&self, id: &BlobId) -> PathBuf {
        self.root.join(REPO_DATA_DIR).join(id.as_hex())
    }

    fn index_entry(&self, id: &BlobId) -> Result<&IndexEntry> {
        let index = self.index.as_ref().ok_or(SnapmountError::IndexNotLoaded)?;
        index.get(id).ok_or_else(|| SnapmountError::NotFound {
            kind: "blob",
            id: id.to_string(),
        })
    }

    fn read_snapshot(path: &Path, id: SnapshotId) -> Result<Snapshot> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapmountError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut snapshot: Snapshot = serde_json::from_str(&content)?;
        snapshot.id = id;
        Ok(snapshot)
    }
}

impl Repository for LocalRepository {
    fn load_index(&mut self) -> Result<()> {
        let data_dir = self.root.join(REPO_DATA_DIR);
        let entries = std::fs::read_dir(&data_dir).map_err(|e| SnapmountError::Io {
            path: data_dir.clone(),
            source: e,
        })?;

        let mut index = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapmountError::Io {
                path: data_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| BlobId::from_hex(name).ok())
            else {
                tracing::debug!(path = %path.display(), "skipping non-blob file in data directory");
                continue;
            };
            let size = entry
                .metadata()
                .map_err(|e| SnapmountError::Io {
                    path: path.clone(),
                    source: e,
                })?
                .len();
            let _ = index.insert(id, IndexEntry { path, size });
        }

        tracing::info!(blobs = index.len(), "repository index loaded");
        self.index = Some(index);
        Ok(())
    }

    fn snapshots(&self) -> Result<Vec<Snapshot>> {
        let dir = self.root.join(REPO_SNAPSHOTS_DIR);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SnapmountError::Io { path: dir, source: e }),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapmountError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let id = SnapshotId::new(entry.file_name().to_string_lossy());
            match Self::read_snapshot(&path, id) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping unreadable snapshot record"
                ),
            }
        }

        snapshots.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
        Ok(snapshots)
    }

    fn blob_size(&self, id: &BlobId) -> Result<u64> {
        Ok(self.index_entry(id)?.size)
    }

    fn load_blob(&self, id: &BlobId) -> Result<Vec<u8>> {
        let entry = self.index_entry(id)?;
        let data = std::fs::read(&entry.path).map_err(|e| SnapmountError::Io {
            path: entry.path.clone(),
            source: e,
        })?;
        hash::validate_hash(&data, id)?;
        Ok(data)
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| SnapmountError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_repository_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = LocalRepository::open(dir.path()).unwrap_err();
        assert!(matches!(err, SnapmountError::NotFound { kind: "repository", .. }));
    }

    #[test]
    fn init_then_open_returns_same_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = LocalRepository::init(dir.path()).expect("init");
        let opened = LocalRepository::open(dir.path()).expect("open");
        assert_eq!(created.id(), opened.id());
        assert_eq!(opened.root(), dir.path());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = LocalRepository::init(dir.path()).expect("init");
        assert!(LocalRepository::init(dir.path()).is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config"), r#"{"version": 99, "id": "x"}"#).expect("write");
        let err = LocalRepository::open(dir.path()).unwrap_err();
        assert!(matches!(err, SnapmountError::Config { .. }));
    }

    #[test]
    fn blob_access_requires_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut repo = LocalRepository::init(dir.path()).expect("init");
        let id = repo.save_blob(b"content").expect("save");
        assert!(!repo.is_indexed());
        assert!(matches!(repo.load_blob(&id), Err(SnapmountError::IndexNotLoaded)));
    }

    #[test]
    fn load_index_finds_saved_blobs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut repo = LocalRepository::init(dir.path()).expect("init");
        let id = repo.save_blob(b"content").expect("save");
        repo.load_index().expect("index");
        assert_eq!(repo.blob_size(&id).expect("size"), 7);
        assert_eq!(repo.load_blob(&id).expect("load"), b"content");
    }

    #[test]
    fn unknown_blob_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut repo = LocalRepository::init(dir.path()).expect("init");
        repo.load_index().expect("index");
        let missing = hash::hash_bytes(b"never stored");
        assert!(matches!(
            repo.load_blob(&missing),
            Err(SnapmountError::NotFound { kind: "blob", .. })
        ));
    }

    #[test]
    fn corrupted_blob_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut repo = LocalRepository::init(dir.path()).expect("init");
        let id = repo.save_blob(b"original").expect("save");
        std::fs::write(dir.path().join("data").join(id.as_hex()), b"tampered").expect("write");
        repo.load_index().expect("index");
        assert!(matches!(
            repo.load_blob(&id),
            Err(SnapmountError::HashMismatch { .. })
        ));
    }

    #[test]
    fn stray_files_are_not_indexed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut repo = LocalRepository::init(dir.path()).expect("init");
        std::fs::write(dir.path().join("data").join("README"), b"x").expect("write");
        repo.load_index().expect("index");
        assert!(repo.index.as_ref().is_some_and(HashMap::is_empty));
    }
}
