//! Host mount integration: establishing, serving, and releasing sessions.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, OnceLock};

use fuser::Session;
use snapmount_common::error::{Result, SnapmountError};

use crate::adapter::{RootSlot, SnapshotFs};
use crate::flags::MountFlags;
use crate::tree::RootTree;

/// One live session bound to a mountpoint.
pub trait MountSession {
    /// Serves `root` until the session is torn down.
    ///
    /// # Errors
    ///
    /// Returns an error if the session fails while answering requests.
    fn serve(&mut self, root: RootTree) -> Result<()>;

    /// Consumes the session and returns its recorded final outcome.
    ///
    /// # Errors
    ///
    /// Returns the error the session recorded while running, if any.
    fn completion(self) -> Result<()>;
}

/// Releases a mount at a path.
pub trait Unmounter: Send + Sync {
    /// Unmounts `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is mounted there or the host refuses.
    fn unmount(&self, path: &Path) -> Result<()>;
}

/// Establishes sessions on the host.
pub trait MountHost {
    /// Session type produced by [`MountHost::mount`].
    type Session: MountSession;

    /// Opens a session at `path` with `flags`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapmountError::Mount`] if the host rejects the mount.
    fn mount(&self, path: &Path, flags: &MountFlags) -> Result<Self::Session>;

    /// Unmounter able to release paths mounted by this host.
    fn unmounter(&self) -> Arc<dyn Unmounter>;
}

/// Host backed by the kernel FUSE interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuseHost;

impl MountHost for FuseHost {
    type Session = FuseSession;

    fn mount(&self, path: &Path, flags: &MountFlags) -> Result<FuseSession> {
        let slot: RootSlot = Arc::new(OnceLock::new());
        let (outcome, completion) = mpsc::sync_channel(1);
        let fs = SnapshotFs::new(Arc::clone(&slot), outcome, path.to_path_buf());

        let session =
            Session::new(fs, path, &flags.to_fuse_options()).map_err(|source| {
                SnapmountError::Mount {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        tracing::info!(mountpoint = %path.display(), flags = flags.len(), "session established");

        Ok(FuseSession {
            session,
            slot,
            completion,
            mountpoint: path.to_path_buf(),
        })
    }

    fn unmounter(&self) -> Arc<dyn Unmounter> {
        Arc::new(SystemUnmounter)
    }
}

/// A FUSE session created by [`FuseHost`].
pub struct FuseSession {
    session: Session<SnapshotFs>,
    slot: RootSlot,
    completion: Receiver<Result<()>>,
    mountpoint: PathBuf,
}

impl FuseSession {
    fn serve_error(&self, source: std::io::Error) -> SnapmountError {
        SnapmountError::Serve {
            path: self.mountpoint.clone(),
            source,
        }
    }
}

impl MountSession for FuseSession {
    fn serve(&mut self, root: RootTree) -> Result<()> {
        if self.slot.set(Arc::new(root)).is_err() {
            return Err(self.serve_error(std::io::Error::other("session already served")));
        }
        tracing::debug!(mountpoint = %self.mountpoint.display(), "serving");
        self.session.run().map_err(|e| self.serve_error(e))?;
        tracing::info!(mountpoint = %self.mountpoint.display(), "session ended");
        Ok(())
    }

    fn completion(self) -> Result<()> {
        let Self {
            session,
            completion,
            ..
        } = self;
        drop(session);
        // Nothing recorded means the session shut down without incident.
        completion.try_recv().unwrap_or(Ok(()))
    }
}

/// Unmounts through the host's system interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUnmounter;

impl Unmounter for SystemUnmounter {
    #[cfg(target_os = "linux")]
    fn unmount(&self, path: &Path) -> Result<()> {
        match nix::mount::umount2(path, nix::mount::MntFlags::empty()) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "unmounted");
                Ok(())
            }
            // Unprivileged users release FUSE mounts through the setuid helper.
            Err(nix::errno::Errno::EPERM) => fusermount(path),
            Err(e) => Err(SnapmountError::Unmount {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn unmount(&self, path: &Path) -> Result<()> {
        run_unmount_command("umount", &[], path)
    }
}

#[cfg(target_os = "linux")]
fn fusermount(path: &Path) -> Result<()> {
    match run_unmount_command("fusermount3", &["-u"], path) {
        Err(SnapmountError::Unmount { message, .. }) if message.contains("not installed") => {
            run_unmount_command("fusermount", &["-u"], path)
        }
        other => other,
    }
}

fn run_unmount_command(program: &str, args: &[&str], path: &Path) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| SnapmountError::Unmount {
            path: path.to_path_buf(),
            message: if e.kind() == std::io::ErrorKind::NotFound {
                format!("{program} not installed")
            } else {
                format!("failed to run {program}: {e}")
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SnapmountError::Unmount {
            path: path.to_path_buf(),
            message: format!("{program} failed: {}", stderr.trim()),
        });
    }

    tracing::info!(path = %path.display(), program, "unmounted");
    Ok(())
}
