//! `snapmount mount`: Serve the repository's snapshots at a mountpoint.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use snapmount_common::config::MountConfig;
use snapmount_common::error::Result;
use snapmount_fs::FuseHost;
use snapmount_runtime::{Orchestrator, ShutdownHooks};

use super::GlobalArgs;
use crate::output::TerminalReporter;

/// Arguments for the `mount` command.
#[derive(Args, Debug, Clone, Default)]
pub struct MountArgs {
    /// Directory to mount at; created if missing.
    pub mountpoint: Option<PathBuf>,

    /// Report all files and directories as owned by root.
    #[arg(long)]
    pub owner_root: bool,

    /// Allow root to access the mounted data.
    #[arg(long)]
    pub allow_root: bool,

    /// Allow other users to access the mounted data.
    #[arg(long)]
    pub allow_other: bool,

    /// Only show snapshots taken on this host.
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Only show snapshots carrying this tag (repeatable).
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Only show snapshots containing this absolute path (repeatable).
    #[arg(long = "path", value_delimiter = ',')]
    pub paths: Vec<PathBuf>,
}

impl MountArgs {
    /// Builds the mount configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a path filter is not absolute.
    pub fn to_config(&self) -> Result<MountConfig> {
        let mut builder = MountConfig::builder()
            .owner_root(self.owner_root)
            .allow_root(self.allow_root)
            .allow_other(self.allow_other)
            .tags(self.tags.iter().cloned())
            .paths(self.paths.iter().cloned());
        if let Some(host) = &self.host {
            builder = builder.host(host.clone());
        }
        builder.build()
    }
}

/// Executes the `mount` command.
///
/// # Errors
///
/// Returns an error if any mount lifecycle step fails.
pub fn execute(
    args: MountArgs,
    global: &GlobalArgs,
    hooks: &Arc<ShutdownHooks>,
) -> anyhow::Result<()> {
    let config = args.to_config()?;
    tracing::debug!(?config, "mount requested");

    let reporter = Arc::new(TerminalReporter::new(global.quiet));
    let orchestrator = Orchestrator::new(FuseHost, Arc::clone(hooks), reporter);
    orchestrator.mount(&config, args.mountpoint.as_deref(), || global.open_repository())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    fn parse(args: &[&str]) -> MountArgs {
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Command::Mount(args) => args,
            Command::Snapshots(_) => panic!("expected mount"),
        }
    }

    #[test]
    fn bare_mount_has_no_filters() {
        let args = parse(&["snapmount", "mount", "/mnt/backup"]);
        let config = args.to_config().expect("config");
        assert_eq!(args.mountpoint, Some(PathBuf::from("/mnt/backup")));
        assert_eq!(config, MountConfig::default());
    }

    #[test]
    fn mountpoint_is_optional_at_parse_time() {
        let args = parse(&["snapmount", "mount"]);
        assert!(args.mountpoint.is_none());
    }

    #[test]
    fn filters_accept_repeats_and_commas() {
        let args = parse(&[
            "snapmount",
            "mount",
            "--tag",
            "daily,pg",
            "--tag",
            "weekly",
            "--path",
            "/srv",
            "-H",
            "db1",
            "--owner-root",
            "--allow-root",
            "--allow-other",
            "/mnt",
        ]);
        let config = args.to_config().expect("config");
        assert_eq!(config.tags(), ["daily", "pg", "weekly"]);
        assert_eq!(config.paths(), [PathBuf::from("/srv")]);
        assert_eq!(config.host(), Some("db1"));
        assert!(config.owner_root() && config.allow_root() && config.allow_other());
    }

    #[test]
    fn relative_path_filter_is_rejected() {
        let args = parse(&["snapmount", "mount", "--path", "srv", "/mnt"]);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn empty_host_means_no_host_filter() {
        let args = parse(&["snapmount", "mount", "--host", "", "/mnt"]);
        assert_eq!(args.to_config().expect("config").host(), None);
    }
}
