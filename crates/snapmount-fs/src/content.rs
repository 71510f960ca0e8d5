//! Nodes over the contents of a single snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use snapmount_common::types::BlobId;
use snapmount_repo::{NodeContent, Repository, TreeNode};

use crate::node::{DirEntry, Node, NodeAttr, NodeError, NodeKind};

/// Resolves the reported owner of an entry.
pub(crate) const fn owner(owner_root: bool, uid: u32, gid: u32) -> (u32, u32) {
    if owner_root { (0, 0) } else { (uid, gid) }
}

/// Builds the node for one entry of a snapshot tree.
pub fn node_for(repo: &Arc<dyn Repository>, entry: &TreeNode, owner_root: bool) -> Arc<dyn Node> {
    let (uid, gid) = owner(owner_root, entry.uid, entry.gid);
    let mtime = SystemTime::from(entry.mtime);
    let perm = permission_bits(entry.mode);

    match &entry.content {
        NodeContent::Dir { nodes } => Arc::new(DirNode::new(
            Arc::clone(repo),
            NodeAttr::directory(perm, uid, gid, mtime),
            nodes.clone(),
            owner_root,
        )),
        NodeContent::File { size, content } => Arc::new(FileNode {
            repo: Arc::clone(repo),
            attr: NodeAttr {
                kind: NodeKind::File,
                size: *size,
                perm,
                uid,
                gid,
                mtime,
            },
            content: content.clone(),
        }),
        NodeContent::Symlink { target } => Arc::new(LinkNode {
            attr: NodeAttr {
                kind: NodeKind::Symlink,
                size: target.as_os_str().len() as u64,
                perm,
                uid,
                gid,
                mtime,
            },
            target: target.clone(),
        }),
    }
}

fn permission_bits(mode: u32) -> u16 {
    u16::try_from(mode & 0o7777).unwrap_or(0o555)
}

/// A directory inside a snapshot.
pub struct DirNode {
    repo: Arc<dyn Repository>,
    attr: NodeAttr,
    children: Vec<TreeNode>,
    owner_root: bool,
}

impl DirNode {
    /// Creates a directory over the given child entries.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        attr: NodeAttr,
        children: Vec<TreeNode>,
        owner_root: bool,
    ) -> Self {
        Self {
            repo,
            attr,
            children,
            owner_root,
        }
    }
}

impl Node for DirNode {
    fn attr(&self) -> NodeAttr {
        self.attr.clone()
    }

    fn read_dir(&self) -> Result<Vec<DirEntry>, NodeError> {
        Ok(self
            .children
            .iter()
            .map(|child| DirEntry {
                name: child.name.clone(),
                node: node_for(&self.repo, child, self.owner_root),
            })
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Node>, NodeError> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .map(|c| node_for(&self.repo, c, self.owner_root))
            .ok_or_else(|| NodeError::NotFound(name.to_owned()))
    }
}

/// A regular file whose content is a sequence of blobs.
pub struct FileNode {
    repo: Arc<dyn Repository>,
    attr: NodeAttr,
    content: Vec<BlobId>,
}

impl Node for FileNode {
    fn attr(&self) -> NodeAttr {
        self.attr.clone()
    }

    fn read(&self, offset: u64, size: u32) -> Result<Vec<u8>, NodeError> {
        let end = offset.saturating_add(u64::from(size)).min(self.attr.size);
        if offset >= end {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(to_usize(end - offset));
        let mut pos = 0u64;
        for id in &self.content {
            let blob_end = pos + self.repo.blob_size(id)?;
            if blob_end > offset {
                let data = self.repo.load_blob(id)?;
                let start = to_usize(offset.saturating_sub(pos));
                let stop = to_usize(end.min(blob_end) - pos);
                out.extend_from_slice(data.get(start..stop).unwrap_or_default());
            }
            pos = blob_end;
            if pos >= end {
                break;
            }
        }

        tracing::trace!(offset, size, returned = out.len(), "file read");
        Ok(out)
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// A symbolic link.
pub struct LinkNode {
    attr: NodeAttr,
    target: PathBuf,
}

impl Node for LinkNode {
    fn attr(&self) -> NodeAttr {
        self.attr.clone()
    }

    fn read_link(&self) -> Result<PathBuf, NodeError> {
        Ok(self.target.clone())
    }
}
