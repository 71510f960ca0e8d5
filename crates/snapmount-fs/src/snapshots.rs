//! The `snapshots` directory: one subdirectory per selected snapshot.
//!
//! The listing is recomputed from the repository on every request, so
//! snapshots added while the mount is live show up without remounting.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use snapmount_repo::{Repository, Snapshot, SnapshotFilter};

use crate::content::{DirNode, owner};
use crate::node::{DirEntry, Node, NodeAttr, NodeError};

/// Permission bits of the synthetic directories.
const DIR_PERM: u16 = 0o555;

/// Builds the directory node bound to the `snapshots` root entry.
pub trait SnapshotTreeBuilder {
    /// Constructs the snapshots directory.
    ///
    /// The filter arguments are taken as-is: no host, tags, or paths
    /// means no filtering on that criterion.
    fn build(
        &self,
        repo: Arc<dyn Repository>,
        owner_root: bool,
        paths: &[PathBuf],
        tags: &[String],
        host: Option<&str>,
    ) -> Arc<dyn Node>;
}

/// Builder producing a [`SnapshotsDir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotsDirBuilder;

impl SnapshotTreeBuilder for SnapshotsDirBuilder {
    fn build(
        &self,
        repo: Arc<dyn Repository>,
        owner_root: bool,
        paths: &[PathBuf],
        tags: &[String],
        host: Option<&str>,
    ) -> Arc<dyn Node> {
        Arc::new(SnapshotsDir::new(
            repo,
            owner_root,
            SnapshotFilter::new(host, tags, paths),
        ))
    }
}

/// Directory listing the repository's snapshots that pass a filter.
pub struct SnapshotsDir {
    repo: Arc<dyn Repository>,
    owner_root: bool,
    filter: SnapshotFilter,
    attr: NodeAttr,
}

impl SnapshotsDir {
    /// Creates the directory.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, owner_root: bool, filter: SnapshotFilter) -> Self {
        let (uid, gid) = process_owner(owner_root);
        Self {
            repo,
            owner_root,
            filter,
            attr: NodeAttr::directory(DIR_PERM, uid, gid, SystemTime::now()),
        }
    }

    #[cfg(test)]
    const fn owner_root(&self) -> bool {
        self.owner_root
    }

    #[cfg(test)]
    const fn filter(&self) -> &SnapshotFilter {
        &self.filter
    }

    /// Returns the selected snapshots paired with their entry names.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot list its snapshots.
    pub fn entries(&self) -> Result<Vec<(String, Snapshot)>, NodeError> {
        let selected = self.filter.apply(self.repo.snapshots()?);
        tracing::debug!(selected = selected.len(), "listing snapshots");
        Ok(name_snapshots(selected))
    }

    fn snapshot_dir(&self, snapshot: Snapshot) -> Arc<dyn Node> {
        let (uid, gid) = process_owner(self.owner_root);
        Arc::new(DirNode::new(
            Arc::clone(&self.repo),
            NodeAttr::directory(DIR_PERM, uid, gid, SystemTime::from(snapshot.time)),
            snapshot.tree,
            self.owner_root,
        ))
    }
}

impl Node for SnapshotsDir {
    fn attr(&self) -> NodeAttr {
        self.attr.clone()
    }

    fn read_dir(&self) -> Result<Vec<DirEntry>, NodeError> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|(name, snapshot)| DirEntry {
                name,
                node: self.snapshot_dir(snapshot),
            })
            .collect())
    }
}

/// Names snapshots by their timestamp, suffixing `-1`, `-2`, ... on collisions.
fn name_snapshots(snapshots: Vec<Snapshot>) -> Vec<(String, Snapshot)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    snapshots
        .into_iter()
        .map(|snapshot| {
            let label = snapshot.time_label();
            let count = seen.entry(label.clone()).or_insert(0);
            let name = if *count == 0 {
                label
            } else {
                format!("{label}-{count}")
            };
            *count += 1;
            (name, snapshot)
        })
        .collect()
}

fn process_owner(owner_root: bool) -> (u32, u32) {
    owner(
        owner_root,
        nix::unistd::getuid().as_raw(),
        nix::unistd::getgid().as_raw(),
    )
}
