//! # snapmount-fs
//!
//! Read-only filesystem view of a repository's snapshots.
//!
//! This crate provides:
//! - **Nodes**: the [`Node`] trait and the snapshot tree built on it.
//! - **Root tree**: the single-entry root handed to a session.
//! - **Flags**: translation of a [`MountConfig`] into host mount flags.
//! - **Adapter**: the `fuser::Filesystem` bridge from kernel requests to nodes.
//! - **Host**: establishing, serving, and releasing FUSE sessions.
//!
//! [`MountConfig`]: snapmount_common::config::MountConfig

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod adapter;
pub mod content;
pub mod flags;
pub mod host;
pub mod node;
pub mod snapshots;
pub mod tree;

pub use flags::{MountFlag, MountFlags};
pub use host::{FuseHost, FuseSession, MountHost, MountSession, SystemUnmounter, Unmounter};
pub use node::{DirEntry, Node, NodeAttr, NodeError, NodeKind};
pub use snapshots::{SnapshotTreeBuilder, SnapshotsDir, SnapshotsDirBuilder};
pub use tree::{RootTree, build_root_tree};
