//! CLI command definitions and dispatch.

pub mod mount;
pub mod snapshots;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use snapmount_common::constants::{BIN_NAME, REPOSITORY_ENV};
use snapmount_common::error::{Result, SnapmountError};
use snapmount_repo::{LocalRepository, Repository};
use snapmount_runtime::ShutdownHooks;

/// snapmount: browse backup snapshots through a read-only mount.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Repository directory.
    #[arg(short, long, global = true, env = REPOSITORY_ENV)]
    pub repo: Option<PathBuf>,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Opens the repository selected by `--repo`.
    ///
    /// # Errors
    ///
    /// Returns an argument error when no repository is given, or the
    /// error from opening it.
    pub fn open_repository(&self) -> Result<Box<dyn Repository>> {
        let Some(root) = &self.repo else {
            return Err(SnapmountError::Argument {
                message: format!("no repository given, use --repo or {REPOSITORY_ENV}"),
            });
        };
        Ok(Box::new(LocalRepository::open(root)?))
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mount the repository read-only and serve it until unmounted.
    Mount(mount::MountArgs),
    /// List the snapshots a mount would show.
    Snapshots(snapshots::SnapshotsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli, hooks: &Arc<ShutdownHooks>) -> anyhow::Result<()> {
    match cli.command {
        Command::Mount(args) => mount::execute(args, &cli.global, hooks),
        Command::Snapshots(args) => snapshots::execute(args, &cli.global),
    }
}
