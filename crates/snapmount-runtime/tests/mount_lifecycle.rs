//! End-to-end mount lifecycle over a local repository, with the kernel
//! session replaced by an in-process host.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use snapmount_common::config::MountConfig;
use snapmount_common::error::Result;
use snapmount_common::types::SnapshotId;
use snapmount_fs::{MountFlags, MountHost, MountSession, Node, RootTree, Unmounter};
use snapmount_repo::{LocalRepository, NodeContent, Repository, Snapshot, TreeNode};
use snapmount_runtime::{Orchestrator, Reporter, ShutdownHooks};

/// What a session saw of the tree it served.
#[derive(Default)]
struct Seen {
    snapshots: Vec<String>,
    file: Vec<u8>,
}

struct InProcessSession(Arc<Mutex<Seen>>);

impl MountSession for InProcessSession {
    fn serve(&mut self, root: RootTree) -> Result<()> {
        let dir = root.lookup("snapshots").expect("snapshots entry");
        let entries = dir.read_dir().expect("list");
        let mut seen = self.0.lock();
        seen.snapshots = entries.iter().map(|e| e.name.clone()).collect();
        if let Some(first) = entries.first() {
            let file = first.node.lookup("notes.txt").expect("file");
            seen.file = file.read(0, 64).expect("read");
        }
        Ok(())
    }

    fn completion(self) -> Result<()> {
        Ok(())
    }
}

struct Noop;

impl Unmounter for Noop {
    fn unmount(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

struct InProcessHost(Arc<Mutex<Seen>>);

impl MountHost for InProcessHost {
    type Session = InProcessSession;

    fn mount(&self, _path: &Path, _flags: &MountFlags) -> Result<InProcessSession> {
        Ok(InProcessSession(Arc::clone(&self.0)))
    }

    fn unmounter(&self) -> Arc<dyn Unmounter> {
        Arc::new(Noop)
    }
}

struct Quiet;

impl Reporter for Quiet {
    fn verbose(&self, _message: &str) {}
    fn print(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("timestamp")
        .with_timezone(&Utc)
}

fn seed(repo: &mut LocalRepository, time: &str, tag: &str) {
    let blob = repo.save_blob(tag.as_bytes()).expect("blob");
    let file = TreeNode {
        name: "notes.txt".into(),
        content: NodeContent::File {
            size: tag.len() as u64,
            content: vec![blob],
        },
        mode: 0o644,
        mtime: at(time),
        uid: 1000,
        gid: 1000,
    };
    let _ = repo
        .save_snapshot(&Snapshot {
            id: SnapshotId::default(),
            time: at(time),
            hostname: "db1".into(),
            username: "backup".into(),
            paths: vec![PathBuf::from("/srv")],
            tags: vec![tag.into()],
            tree: vec![file],
        })
        .expect("snapshot");
}

#[test]
fn tag_filter_limits_the_served_listing() {
    let repo_dir = tempfile::tempdir().expect("tempdir");
    let mut repo = LocalRepository::init(repo_dir.path()).expect("init");
    seed(&mut repo, "2024-03-01T02:00:00Z", "daily");
    seed(&mut repo, "2024-03-03T02:00:00Z", "weekly");
    seed(&mut repo, "2024-03-02T02:00:00Z", "daily");

    let mnt_dir = tempfile::tempdir().expect("tempdir");
    let mountpoint = mnt_dir.path().join("mnt");
    let hooks = Arc::new(ShutdownHooks::new());
    let seen = Arc::new(Mutex::new(Seen::default()));
    let orchestrator = Orchestrator::new(
        InProcessHost(Arc::clone(&seen)),
        Arc::clone(&hooks),
        Arc::new(Quiet),
    );

    let config = MountConfig::builder()
        .tag("daily")
        .host("")
        .build()
        .expect("config");
    let root = repo_dir.path().to_path_buf();
    orchestrator
        .mount(&config, Some(&mountpoint), move || {
            Ok(Box::new(LocalRepository::open(&root)?) as Box<dyn Repository>)
        })
        .expect("mount");

    let seen = seen.lock();
    assert_eq!(
        seen.snapshots,
        ["2024-03-01T02:00:00Z", "2024-03-02T02:00:00Z"]
    );
    assert_eq!(seen.file, b"daily");
    assert!(mountpoint.is_dir());
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks.run(), 1);
}

#[test]
fn missing_repository_aborts_before_the_mountpoint_is_created() {
    let repo_dir = tempfile::tempdir().expect("tempdir");
    let mnt_dir = tempfile::tempdir().expect("tempdir");
    let mountpoint = mnt_dir.path().join("mnt");
    let hooks = Arc::new(ShutdownHooks::new());
    let orchestrator = Orchestrator::new(
        InProcessHost(Arc::default()),
        Arc::clone(&hooks),
        Arc::new(Quiet),
    );

    let root = repo_dir.path().join("absent");
    let result = orchestrator.mount(
        &MountConfig::default(),
        Some(&mountpoint),
        move || Ok(Box::new(LocalRepository::open(&root)?) as Box<dyn Repository>),
    );

    assert!(result.is_err());
    assert!(!mountpoint.exists());
    assert!(hooks.is_empty());
}
