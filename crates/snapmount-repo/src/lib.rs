//! # snapmount-repo
//!
//! Read access to a snapmount repository.
//!
//! Handles:
//! - **Repository**: the [`Repository`] trait the mount is served from.
//! - **Local layout**: a directory-backed repository with a blob index.
//! - **Snapshots**: snapshot records and their inline file trees.
//! - **Filtering**: host/tag/path selection of snapshots.
//! - **Hashing**: SHA-256 content verification.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filter;
pub mod hash;
pub mod local;
pub mod repository;
pub mod snapshot;

pub use filter::SnapshotFilter;
pub use local::LocalRepository;
pub use repository::Repository;
pub use snapshot::{NodeContent, Snapshot, TreeNode};
