//! Bridge between kernel FUSE requests and the [`Node`] tree.
//!
//! The adapter is handed to the session before the tree exists, so the
//! root is read from a shared slot when the kernel sends `init`. Inode
//! numbers are assigned on first sight of a `(parent, name)` pair and
//! stay stable for the lifetime of the session.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::os::raw::c_int;
use std::path::PathBuf;
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use fuser::{
    FUSE_ROOT_ID, FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyData,
    ReplyDirectory, ReplyEntry, ReplyOpen, Request,
};
use snapmount_common::constants::ATTR_TTL_SECS;
use snapmount_common::error::{Result, SnapmountError};

use crate::node::{Node, NodeAttr, NodeError, NodeKind};

/// Slot the served root is installed into once it has been built.
pub type RootSlot = Arc<OnceLock<Arc<dyn Node>>>;

const TTL: Duration = Duration::from_secs(ATTR_TTL_SECS);
const BLOCK_SIZE: u32 = 512;

/// Inode bookkeeping for one session.
pub(crate) struct InodeTable {
    nodes: HashMap<u64, Arc<dyn Node>>,
    children: HashMap<(u64, String), u64>,
    parents: HashMap<u64, u64>,
    next: u64,
}

impl InodeTable {
    pub(crate) fn new(root: Arc<dyn Node>) -> Self {
        Self {
            nodes: HashMap::from([(FUSE_ROOT_ID, root)]),
            children: HashMap::new(),
            parents: HashMap::from([(FUSE_ROOT_ID, FUSE_ROOT_ID)]),
            next: FUSE_ROOT_ID + 1,
        }
    }

    pub(crate) fn get(&self, ino: u64) -> Option<Arc<dyn Node>> {
        self.nodes.get(&ino).cloned()
    }

    pub(crate) fn parent(&self, ino: u64) -> u64 {
        self.parents.get(&ino).copied().unwrap_or(FUSE_ROOT_ID)
    }

    /// Returns the inode of `name` under `parent`, allocating one on first
    /// sight. The stored node is refreshed so later requests see the
    /// latest view.
    pub(crate) fn assign(&mut self, parent: u64, name: &str, node: Arc<dyn Node>) -> u64 {
        let key = (parent, name.to_owned());
        let ino = if let Some(ino) = self.children.get(&key) {
            *ino
        } else {
            let ino = self.next;
            self.next += 1;
            let _ = self.children.insert(key, ino);
            let _ = self.parents.insert(ino, parent);
            ino
        };
        let _ = self.nodes.insert(ino, node);
        ino
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// `fuser` filesystem serving a read-only node tree.
pub struct SnapshotFs {
    root: RootSlot,
    inodes: Option<InodeTable>,
    outcome: SyncSender<Result<()>>,
    mountpoint: PathBuf,
}

impl SnapshotFs {
    /// Creates the adapter. `outcome` receives the session's final status.
    #[must_use]
    pub fn new(root: RootSlot, outcome: SyncSender<Result<()>>, mountpoint: PathBuf) -> Self {
        Self {
            root,
            inodes: None,
            outcome,
            mountpoint,
        }
    }

    fn record(&self, result: Result<()>) {
        // First recorded outcome wins.
        let _ = self.outcome.try_send(result);
    }

    fn node(&self, ino: u64) -> std::result::Result<Arc<dyn Node>, c_int> {
        self.inodes
            .as_ref()
            .and_then(|table| table.get(ino))
            .ok_or(libc::ENOENT)
    }
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::File => FileType::RegularFile,
        NodeKind::Symlink => FileType::Symlink,
    }
}

fn to_file_attr(ino: u64, attr: &NodeAttr) -> FileAttr {
    FileAttr {
        ino,
        size: attr.size,
        blocks: attr.size.div_ceil(u64::from(BLOCK_SIZE)),
        atime: attr.mtime,
        mtime: attr.mtime,
        ctime: attr.mtime,
        crtime: attr.mtime,
        kind: file_type(attr.kind),
        perm: attr.perm,
        nlink: attr.nlink(),
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: BLOCK_SIZE,
        flags: 0,
    }
}

fn reject(op: &'static str, ino: u64, err: &NodeError) -> c_int {
    let errno = err.errno();
    if errno == libc::ENOENT {
        tracing::trace!(op, ino, error = %err, "request rejected");
    } else {
        tracing::warn!(op, ino, error = %err, "request failed");
    }
    errno
}

impl Filesystem for SnapshotFs {
    fn init(
        &mut self,
        _req: &Request<'_>,
        _config: &mut KernelConfig,
    ) -> std::result::Result<(), c_int> {
        let Some(root) = self.root.get() else {
            self.record(Err(SnapmountError::Serve {
                path: self.mountpoint.clone(),
                source: std::io::Error::other("no root tree installed"),
            }));
            return Err(libc::EIO);
        };
        self.inodes = Some(InodeTable::new(Arc::clone(root)));
        tracing::debug!(mountpoint = %self.mountpoint.display(), "session initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        tracing::debug!(mountpoint = %self.mountpoint.display(), "session destroyed");
        self.record(Ok(()));
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        let dir = match self.node(parent) {
            Ok(dir) => dir,
            Err(errno) => return reply.error(errno),
        };
        match dir.lookup(name) {
            Ok(node) => {
                let attr = node.attr();
                let Some(table) = self.inodes.as_mut() else {
                    return reply.error(libc::EIO);
                };
                let ino = table.assign(parent, name, node);
                reply.entry(&TTL, &to_file_attr(ino, &attr), 0);
            }
            Err(err) => reply.error(reject("lookup", parent, &err)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.node(ino) {
            Ok(node) => reply.attr(&TTL, &to_file_attr(ino, &node.attr())),
            Err(errno) => reply.error(errno),
        }
    }

    fn readlink(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyData) {
        let node = match self.node(ino) {
            Ok(node) => node,
            Err(errno) => return reply.error(errno),
        };
        match node.read_link() {
            Ok(target) => reply.data(target.as_os_str().as_encoded_bytes()),
            Err(err) => reply.error(reject("readlink", ino, &err)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            tracing::debug!(ino, flags, "write open refused");
            return reply.error(libc::EROFS);
        }
        match self.node(ino) {
            Ok(_) => reply.opened(0, 0),
            Err(errno) => reply.error(errno),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Ok(offset) = u64::try_from(offset) else {
            return reply.error(libc::EINVAL);
        };
        let node = match self.node(ino) {
            Ok(node) => node,
            Err(errno) => return reply.error(errno),
        };
        match node.read(offset, size) {
            Ok(data) => reply.data(&data),
            Err(err) => reply.error(reject("read", ino, &err)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let dir = match self.node(ino) {
            Ok(dir) => dir,
            Err(errno) => return reply.error(errno),
        };
        let children = match dir.read_dir() {
            Ok(children) => children,
            Err(err) => return reply.error(reject("readdir", ino, &err)),
        };
        let Some(table) = self.inodes.as_mut() else {
            return reply.error(libc::EIO);
        };

        let mut listing = vec![
            (ino, FileType::Directory, ".".to_owned()),
            (table.parent(ino), FileType::Directory, "..".to_owned()),
        ];
        for child in children {
            let kind = file_type(child.node.attr().kind);
            let child_ino = table.assign(ino, &child.name, child.node);
            listing.push((child_ino, kind, child.name));
        }

        let skip = usize::try_from(offset).unwrap_or(0);
        for (index, (entry_ino, kind, name)) in listing.into_iter().enumerate().skip(skip) {
            let next = i64::try_from(index + 1).unwrap_or(i64::MAX);
            if reply.add(entry_ino, next, kind, name) {
                break;
            }
        }
        reply.ok();
    }
}
