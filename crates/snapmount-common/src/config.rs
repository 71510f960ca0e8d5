//! Mount configuration model.
//!
//! A [`MountConfig`] is built once from parsed command-line input and then
//! only ever handed out by shared reference. Empty filter collections mean
//! "no filtering", never "match nothing".

use std::path::PathBuf;

use crate::error::{Result, SnapmountError};

/// User-selected options controlling mount behavior and snapshot filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountConfig {
    owner_root: bool,
    allow_root: bool,
    allow_other: bool,
    host: Option<String>,
    tags: Vec<String>,
    paths: Vec<PathBuf>,
}

impl MountConfig {
    /// Starts a new builder with every option off and no filters.
    #[must_use]
    pub fn builder() -> MountConfigBuilder {
        MountConfigBuilder::default()
    }

    /// Whether files and directories are reported as owned by root.
    #[must_use]
    pub const fn owner_root(&self) -> bool {
        self.owner_root
    }

    /// Whether the root user may access the mounted data.
    #[must_use]
    pub const fn allow_root(&self) -> bool {
        self.allow_root
    }

    /// Whether all other users may access the mounted data.
    #[must_use]
    pub const fn allow_other(&self) -> bool {
        self.allow_other
    }

    /// Host filter, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Tag filters; a snapshot must carry all of them.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Absolute path filters; a snapshot must contain all of them.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Fluent builder for [`MountConfig`].
#[derive(Debug, Clone, Default)]
pub struct MountConfigBuilder {
    owner_root: bool,
    allow_root: bool,
    allow_other: bool,
    host: Option<String>,
    tags: Vec<String>,
    paths: Vec<PathBuf>,
}

impl MountConfigBuilder {
    /// Reports root as the owner of every file and directory.
    #[must_use]
    pub const fn owner_root(mut self, enabled: bool) -> Self {
        self.owner_root = enabled;
        self
    }

    /// Lets the root user access the mounted data.
    #[must_use]
    pub const fn allow_root(mut self, enabled: bool) -> Self {
        self.allow_root = enabled;
        self
    }

    /// Lets all other users access the mounted data.
    #[must_use]
    pub const fn allow_other(mut self, enabled: bool) -> Self {
        self.allow_other = enabled;
        self
    }

    /// Only considers snapshots taken on this host. An empty string clears the filter.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.host = (!host.is_empty()).then_some(host);
        self
    }

    /// Adds a tag filter.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds several tag filters.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds an absolute path filter.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Adds several absolute path filters.
    #[must_use]
    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Validates the options and freezes them into a [`MountConfig`].
    ///
    /// # Errors
    ///
    /// Returns `SnapmountError::Config` if a path filter is not absolute.
    pub fn build(self) -> Result<MountConfig> {
        if let Some(relative) = self.paths.iter().find(|p| !p.is_absolute()) {
            return Err(SnapmountError::Config {
                message: format!("path filter must be absolute: {}", relative.display()),
            });
        }

        Ok(MountConfig {
            owner_root: self.owner_root,
            allow_root: self.allow_root,
            allow_other: self.allow_other,
            host: self.host,
            tags: self.tags,
            paths: self.paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_filters() {
        let config = MountConfig::builder().build().expect("build");
        assert!(!config.owner_root());
        assert!(!config.allow_root());
        assert!(!config.allow_other());
        assert_eq!(config.host(), None);
        assert!(config.tags().is_empty());
        assert!(config.paths().is_empty());
    }

    #[test]
    fn empty_host_means_no_filter() {
        let config = MountConfig::builder().host("").build().expect("build");
        assert_eq!(config.host(), None);
    }

    #[test]
    fn builder_keeps_filters_in_order() {
        let config = MountConfig::builder()
            .host("server")
            .tags(["daily", "db"])
            .path("/srv")
            .path("/etc")
            .build()
            .expect("build");
        assert_eq!(config.host(), Some("server"));
        assert_eq!(config.tags(), ["daily".to_string(), "db".to_string()]);
        assert_eq!(config.paths(), [PathBuf::from("/srv"), PathBuf::from("/etc")]);
    }

    #[test]
    fn relative_path_filter_is_rejected() {
        let err = MountConfig::builder().path("home/user").build().unwrap_err();
        assert!(matches!(err, SnapmountError::Config { .. }));
    }

    #[test]
    fn access_flags_are_independent() {
        let config = MountConfig::builder()
            .allow_root(true)
            .build()
            .expect("build");
        assert!(config.allow_root());
        assert!(!config.allow_other());
    }
}
