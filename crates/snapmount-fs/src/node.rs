//! Filesystem node abstraction.
//!
//! Every entry reachable from a served root implements [`Node`]. Nodes are
//! shared across request threads, so implementations must be `Send + Sync`
//! and treat `&self` access as concurrent reads.

use std::os::raw::c_int;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use snapmount_common::error::SnapmountError;
use thiserror::Error;

/// Errors a node can answer a request with.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The entry does not exist.
    #[error("no such entry: {0}")]
    NotFound(String),

    /// A directory operation was sent to something else.
    #[error("not a directory")]
    NotDirectory,

    /// A file operation was sent to a directory.
    #[error("is a directory")]
    IsDirectory,

    /// `readlink` was sent to something other than a symlink.
    #[error("not a symbolic link")]
    NotSymlink,

    /// Reading from the repository failed.
    #[error("repository error: {0}")]
    Repository(#[from] SnapmountError),
}

impl NodeError {
    /// Maps the error onto the errno returned to the kernel.
    #[must_use]
    pub const fn errno(&self) -> c_int {
        match self {
            Self::NotFound(_) => libc::ENOENT,
            Self::NotDirectory => libc::ENOTDIR,
            Self::IsDirectory => libc::EISDIR,
            Self::NotSymlink => libc::EINVAL,
            Self::Repository(_) => libc::EIO,
        }
    }
}

/// Kind of a filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
    /// A symbolic link.
    Symlink,
}

/// Attributes reported for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttr {
    /// Node kind.
    pub kind: NodeKind,
    /// Size in bytes.
    pub size: u64,
    /// Permission bits.
    pub perm: u16,
    /// Owning user ID.
    pub uid: u32,
    /// Owning group ID.
    pub gid: u32,
    /// Modification time, also used for access and change times.
    pub mtime: SystemTime,
}

impl NodeAttr {
    /// Attributes of a read-only directory.
    #[must_use]
    pub const fn directory(perm: u16, uid: u32, gid: u32, mtime: SystemTime) -> Self {
        Self {
            kind: NodeKind::Directory,
            size: 0,
            perm,
            uid,
            gid,
            mtime,
        }
    }

    /// Link count reported to the kernel.
    #[must_use]
    pub const fn nlink(&self) -> u32 {
        match self.kind {
            NodeKind::Directory => 2,
            NodeKind::File | NodeKind::Symlink => 1,
        }
    }
}

/// A named child of a directory node.
#[derive(Clone)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// The child node.
    pub node: Arc<dyn Node>,
}

impl std::fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.name)
            .field("kind", &self.node.attr().kind)
            .finish()
    }
}

/// A node of the served tree.
pub trait Node: Send + Sync {
    /// Returns the node's attributes.
    fn attr(&self) -> NodeAttr;

    /// Lists a directory's children.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::NotDirectory` for non-directories.
    fn read_dir(&self) -> Result<Vec<DirEntry>, NodeError> {
        Err(NodeError::NotDirectory)
    }

    /// Resolves one child of a directory by name.
    ///
    /// The default scans [`Node::read_dir`].
    ///
    /// # Errors
    ///
    /// Returns `NodeError::NotFound` if no child has that name.
    fn lookup(&self, name: &str) -> Result<Arc<dyn Node>, NodeError> {
        self.read_dir()?
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.node)
            .ok_or_else(|| NodeError::NotFound(name.to_owned()))
    }

    /// Reads up to `size` bytes of a file starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::IsDirectory` for directories.
    fn read(&self, _offset: u64, _size: u32) -> Result<Vec<u8>, NodeError> {
        Err(NodeError::IsDirectory)
    }

    /// Returns a symlink's target.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::NotSymlink` for anything but symlinks.
    fn read_link(&self) -> Result<PathBuf, NodeError> {
        Err(NodeError::NotSymlink)
    }
}

#[cfg(test)]
impl std::fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node").field("attr", &self.attr()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;

    impl Node for Leaf {
        fn attr(&self) -> NodeAttr {
            NodeAttr {
                kind: NodeKind::File,
                size: 0,
                perm: 0o444,
                uid: 0,
                gid: 0,
                mtime: SystemTime::UNIX_EPOCH,
            }
        }
    }

    #[test]
    fn defaults_reject_wrong_kind_operations() {
        let leaf = Leaf;
        assert_eq!(leaf.read_dir().unwrap_err().errno(), libc::ENOTDIR);
        assert_eq!(leaf.lookup("x").unwrap_err().errno(), libc::ENOTDIR);
        assert_eq!(leaf.read_link().unwrap_err().errno(), libc::EINVAL);
    }

    #[test]
    fn repository_errors_map_to_eio() {
        let err = NodeError::from(SnapmountError::IndexNotLoaded);
        assert_eq!(err.errno(), libc::EIO);
    }

    #[test]
    fn directories_report_two_links() {
        let attr = NodeAttr::directory(0o555, 0, 0, SystemTime::UNIX_EPOCH);
        assert_eq!(attr.nlink(), 2);
        assert_eq!(Leaf.attr().nlink(), 1);
    }
}
