//! Snapshot records and their file trees.
//!
//! A snapshot is stored as one JSON document holding its metadata and the
//! complete directory tree it captured. File contents are referenced by
//! blob ID and live in the repository's data directory.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use snapmount_common::types::{BlobId, SnapshotId};

/// A point-in-time backup record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identifier, taken from the record's file name.
    #[serde(skip)]
    pub id: SnapshotId,
    /// When the backup was taken.
    pub time: DateTime<Utc>,
    /// Host the backup was taken on.
    pub hostname: String,
    /// User that ran the backup.
    #[serde(default)]
    pub username: String,
    /// Absolute paths that were backed up.
    pub paths: Vec<PathBuf>,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Top-level entries of the captured tree.
    #[serde(default)]
    pub tree: Vec<TreeNode>,
}

impl Snapshot {
    /// Returns whether the snapshot carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns whether the snapshot carries every tag in `tags`.
    #[must_use]
    pub fn has_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.has_tag(t))
    }

    /// Returns whether the snapshot backed up every path in `paths`.
    #[must_use]
    pub fn has_paths(&self, paths: &[PathBuf]) -> bool {
        paths.iter().all(|p| self.paths.iter().any(|own| own == p))
    }

    /// Timestamp rendered as RFC 3339 with second precision.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// One entry of a snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Entry name within its parent directory.
    pub name: String,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub content: NodeContent,
    /// Unix permission bits.
    pub mode: u32,
    /// Last modification time.
    pub mtime: DateTime<Utc>,
    /// Owning user ID.
    #[serde(default)]
    pub uid: u32,
    /// Owning group ID.
    #[serde(default)]
    pub gid: u32,
}

/// Payload of a [`TreeNode`], tagged by `type` in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeContent {
    /// A directory with its children.
    Dir {
        /// Child entries.
        #[serde(default)]
        nodes: Vec<TreeNode>,
    },
    /// A regular file split into content blobs.
    File {
        /// Total size in bytes.
        size: u64,
        /// Ordered blob IDs making up the content.
        #[serde(default)]
        content: Vec<BlobId>,
    },
    /// A symbolic link.
    Symlink {
        /// Link target, stored verbatim.
        target: PathBuf,
    },
}
