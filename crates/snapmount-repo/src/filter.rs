//! Snapshot selection by host, tags, and paths.

use std::path::PathBuf;

use crate::snapshot::Snapshot;

/// Criteria a snapshot must meet to be exposed.
///
/// Every criterion is optional: no host, no tags, and no paths select
/// every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFilter {
    host: Option<String>,
    tags: Vec<String>,
    paths: Vec<PathBuf>,
}

impl SnapshotFilter {
    /// Creates a filter from its three criteria.
    #[must_use]
    pub fn new(host: Option<&str>, tags: &[String], paths: &[PathBuf]) -> Self {
        Self {
            host: host.map(ToOwned::to_owned),
            tags: tags.to_vec(),
            paths: paths.to_vec(),
        }
    }

    /// Host criterion.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Tag criterion.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Path criterion.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns whether `snapshot` meets every criterion.
    #[must_use]
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        if self.host.as_deref().is_some_and(|h| h != snapshot.hostname) {
            return false;
        }
        snapshot.has_tags(&self.tags) && snapshot.has_paths(&self.paths)
    }

    /// Keeps the matching snapshots, preserving order.
    #[must_use]
    pub fn apply(&self, snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
        snapshots.into_iter().filter(|s| self.matches(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use snapmount_common::types::SnapshotId;

    use super::*;

    fn snapshot(host: &str, tags: &[&str], paths: &[&str]) -> Snapshot {
        Snapshot {
            id: SnapshotId::new(format!("{host}-{}", tags.join("-"))),
            time: Utc::now(),
            hostname: host.into(),
            username: String::new(),
            paths: paths.iter().map(PathBuf::from).collect(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            tree: Vec::new(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SnapshotFilter::default();
        assert!(filter.matches(&snapshot("a", &[], &[])));
        assert!(filter.matches(&snapshot("b", &["x"], &["/y"])));
    }

    #[test]
    fn host_filter_is_exact() {
        let filter = SnapshotFilter::new(Some("server"), &[], &[]);
        assert!(filter.matches(&snapshot("server", &[], &[])));
        assert!(!filter.matches(&snapshot("server2", &[], &[])));
    }

    #[test]
    fn tag_filter_keeps_only_tagged() {
        let filter = SnapshotFilter::new(None, &["daily".into()], &[]);
        let kept = filter.apply(vec![
            snapshot("h", &["daily"], &[]),
            snapshot("h", &["weekly"], &[]),
            snapshot("h", &["daily", "db"], &[]),
        ]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|s| s.has_tag("daily")));
    }

    #[test]
    fn path_filter_requires_all_paths() {
        let filter = SnapshotFilter::new(None, &[], &["/srv".into(), "/etc".into()]);
        assert!(filter.matches(&snapshot("h", &[], &["/etc", "/srv"])));
        assert!(!filter.matches(&snapshot("h", &[], &["/srv"])));
    }

    #[test]
    fn criteria_combine() {
        let filter = SnapshotFilter::new(Some("db"), &["daily".into()], &["/var".into()]);
        assert!(filter.matches(&snapshot("db", &["daily"], &["/var"])));
        assert!(!filter.matches(&snapshot("web", &["daily"], &["/var"])));
        assert!(!filter.matches(&snapshot("db", &["weekly"], &["/var"])));
    }
}
