//! Root of a mounted repository.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use snapmount_common::config::MountConfig;
use snapmount_common::constants::SNAPSHOTS_DIR;
use snapmount_repo::Repository;

use crate::node::{DirEntry, Node, NodeAttr, NodeError};
use crate::snapshots::SnapshotTreeBuilder;

/// A fixed mapping from names to nodes, served as the mount's root directory.
pub struct RootTree {
    entries: BTreeMap<String, Arc<dyn Node>>,
    attr: NodeAttr,
}

impl RootTree {
    /// Creates an empty root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            attr: NodeAttr::directory(0o555, 0, 0, SystemTime::now()),
        }
    }

    /// Binds `node` under `name`, replacing any previous binding.
    pub fn add(&mut self, name: impl Into<String>, node: Arc<dyn Node>) {
        let _ = self.entries.insert(name.into(), node);
    }

    /// Returns the node bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.entries.get(name)
    }

    /// Entry names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the root has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RootTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for RootTree {
    fn attr(&self) -> NodeAttr {
        self.attr.clone()
    }

    fn read_dir(&self) -> Result<Vec<DirEntry>, NodeError> {
        Ok(self
            .entries
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                node: Arc::clone(node),
            })
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Node>, NodeError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::NotFound(name.to_owned()))
    }
}

/// Builds the root of a mount: a single `snapshots` entry bound to the
/// directory `builder` constructs from `repo` and the configuration's
/// owner and filter options, passed through unchanged.
pub fn build_root_tree(
    repo: Arc<dyn Repository>,
    config: &MountConfig,
    builder: &dyn SnapshotTreeBuilder,
) -> RootTree {
    let snapshots = builder.build(
        repo,
        config.owner_root(),
        config.paths(),
        config.tags(),
        config.host(),
    );

    let mut root = RootTree::new();
    root.add(SNAPSHOTS_DIR, snapshots);
    root
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use snapmount_common::error::Result;
    use snapmount_common::types::BlobId;
    use snapmount_repo::Snapshot;

    use super::*;

    struct Empty;

    impl Repository for Empty {
        fn load_index(&mut self) -> Result<()> {
            Ok(())
        }

        fn snapshots(&self) -> Result<Vec<Snapshot>> {
            Ok(Vec::new())
        }

        fn blob_size(&self, _id: &BlobId) -> Result<u64> {
            Ok(0)
        }

        fn load_blob(&self, _id: &BlobId) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    /// Arguments seen by [`Recorder`].
    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    struct Recorded {
        owner_root: bool,
        paths: Vec<PathBuf>,
        tags: Vec<String>,
        host: Option<String>,
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Recorded>>);

    impl SnapshotTreeBuilder for Recorder {
        fn build(
            &self,
            _repo: Arc<dyn Repository>,
            owner_root: bool,
            paths: &[PathBuf],
            tags: &[String],
            host: Option<&str>,
        ) -> Arc<dyn Node> {
            self.0.lock().unwrap().push(Recorded {
                owner_root,
                paths: paths.to_vec(),
                tags: tags.to_vec(),
                host: host.map(ToOwned::to_owned),
            });
            Arc::new(RootTree::new())
        }
    }

    #[test]
    fn root_has_exactly_one_snapshots_entry() {
        let config = MountConfig::builder().build().expect("config");
        let root = build_root_tree(Arc::new(Empty), &config, &Recorder::default());
        assert_eq!(root.names(), ["snapshots"]);
        assert_eq!(root.len(), 1);
        assert_eq!(root.read_dir().expect("list").len(), 1);
        assert!(root.get("snapshots").is_some());
        assert!(root.lookup("snapshots").is_ok());
        assert_eq!(root.lookup("other").unwrap_err().errno(), libc::ENOENT);
    }

    #[test]
    fn builder_receives_config_fields_unmodified() {
        let config = MountConfig::builder()
            .owner_root(true)
            .host("db1")
            .tags(["daily", "pg"])
            .path("/var/lib/postgresql")
            .build()
            .expect("config");
        let builder = Recorder::default();
        let _ = build_root_tree(Arc::new(Empty), &config, &builder);

        let calls = builder.0.lock().unwrap().clone();
        assert_eq!(
            calls,
            [Recorded {
                owner_root: true,
                paths: vec![PathBuf::from("/var/lib/postgresql")],
                tags: vec!["daily".into(), "pg".into()],
                host: Some("db1".into()),
            }]
        );
    }

    #[test]
    fn empty_filters_stay_empty() {
        let config = MountConfig::builder().host("").build().expect("config");
        let builder = Recorder::default();
        let _ = build_root_tree(Arc::new(Empty), &config, &builder);

        let calls = builder.0.lock().unwrap().clone();
        assert_eq!(calls, [Recorded::default()]);
    }
}
