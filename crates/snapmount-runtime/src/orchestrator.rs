//! The mount lifecycle.
//!
//! A mount runs its steps strictly in order: open and index the
//! repository, prepare the mountpoint, translate flags, establish the
//! session, register cleanup, build the root tree, serve, and finally
//! return the session's recorded outcome. A failure before the session
//! exists leaves no cleanup behind.

use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::sync::Arc;

use snapmount_common::config::MountConfig;
use snapmount_common::constants::MOUNTPOINT_MODE;
use snapmount_common::error::{Result, SnapmountError};
use snapmount_fs::{
    MountFlags, MountHost, MountSession, SnapshotTreeBuilder, SnapshotsDirBuilder, Unmounter,
    build_root_tree,
};
use snapmount_repo::Repository;

use crate::shutdown::ShutdownHooks;

/// Destination of user-facing status lines.
pub trait Reporter: Send + Sync {
    /// Informational detail, suppressed in quiet mode.
    fn verbose(&self, message: &str);

    /// A status line always shown.
    fn print(&self, message: &str);

    /// A non-fatal problem.
    fn warn(&self, message: &str);
}

/// Drives one mount from configuration to final outcome.
pub struct Orchestrator<H: MountHost> {
    host: H,
    hooks: Arc<ShutdownHooks>,
    reporter: Arc<dyn Reporter>,
    tree_builder: Box<dyn SnapshotTreeBuilder>,
}

impl<H: MountHost> Orchestrator<H> {
    /// Creates an orchestrator serving the default snapshots directory.
    pub fn new(host: H, hooks: Arc<ShutdownHooks>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            host,
            hooks,
            reporter,
            tree_builder: Box::new(SnapshotsDirBuilder),
        }
    }

    /// Replaces the builder of the `snapshots` directory.
    #[must_use]
    pub fn with_tree_builder(mut self, builder: impl SnapshotTreeBuilder + 'static) -> Self {
        self.tree_builder = Box::new(builder);
        self
    }

    /// Mounts the repository opened by `open_repository` at `mountpoint`
    /// and serves it until the mount is released.
    ///
    /// # Errors
    ///
    /// Returns [`SnapmountError::Argument`] when no mountpoint is given,
    /// before the repository is touched. Repository, mountpoint, mount,
    /// and serve failures are returned unchanged.
    pub fn mount<F>(
        &self,
        config: &MountConfig,
        mountpoint: Option<&Path>,
        open_repository: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Result<Box<dyn Repository>>,
    {
        let Some(mountpoint) = mountpoint else {
            return Err(SnapmountError::Argument {
                message: "wrong number of parameters".into(),
            });
        };
        tracing::debug!(mountpoint = %mountpoint.display(), "start mount");

        let mut repo = open_repository()?;
        repo.load_index()?;
        let repo: Arc<dyn Repository> = Arc::from(repo);

        prepare_mountpoint(mountpoint, self.reporter.as_ref())?;

        let flags = MountFlags::from_config(config);
        let mut session = self.host.mount(mountpoint, &flags)?;

        self.register_cleanup(mountpoint);

        self.reporter.print(&format!(
            "Now serving the repository at {}",
            mountpoint.display()
        ));
        self.reporter.print("Don't forget to umount after quitting!");

        let root = build_root_tree(repo, config, self.tree_builder.as_ref());
        tracing::debug!(mountpoint = %mountpoint.display(), "serving mount");
        session.serve(root)?;

        let outcome = session.completion();
        tracing::debug!(mountpoint = %mountpoint.display(), ok = outcome.is_ok(), "finish mount");
        outcome
    }

    fn register_cleanup(&self, mountpoint: &Path) {
        let path = mountpoint.to_path_buf();
        let unmounter = self.host.unmounter();
        let reporter = Arc::clone(&self.reporter);
        self.hooks.register(format!("umount {}", path.display()), move || {
            unmount_cleanup(unmounter.as_ref(), &path, reporter.as_ref())
        });
    }
}

/// Makes sure `path` exists, creating it with owner-only permissions if absent.
///
/// An existing path is left alone whatever its type.
///
/// # Errors
///
/// Returns [`SnapmountError::Io`] if the path cannot be inspected or created.
pub fn prepare_mountpoint(path: &Path, reporter: &dyn Reporter) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            reporter.verbose(&format!(
                "Mountpoint {} doesn't exist, creating it",
                path.display()
            ));
            std::fs::DirBuilder::new()
                .mode(MOUNTPOINT_MODE)
                .create(path)
                .map_err(|source| SnapmountError::Io {
                    path: path.to_path_buf(),
                    source,
                })
        }
        Err(source) => Err(SnapmountError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Shutdown action for one mount. Never fails: an unmount error is
/// reported as a warning only.
fn unmount_cleanup(unmounter: &dyn Unmounter, path: &Path, reporter: &dyn Reporter) -> Result<()> {
    tracing::debug!(path = %path.display(), "running umount cleanup handler");
    if let Err(e) = unmounter.unmount(path) {
        tracing::warn!(path = %path.display(), error = %e, "unable to umount");
        reporter.warn(&format!("unable to umount (maybe already umounted?): {e}"));
    }
    Ok(())
}
