//! `snapmount snapshots`: List the snapshots a mount would show.

use std::path::PathBuf;

use clap::Args;
use snapmount_repo::{Snapshot, SnapshotFilter};

use super::GlobalArgs;
use crate::output::join_or_dash;

/// Arguments for the `snapshots` command.
#[derive(Args, Debug, Clone, Default)]
pub struct SnapshotsArgs {
    /// Only list snapshots taken on this host.
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Only list snapshots carrying this tag (repeatable).
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Only list snapshots containing this path (repeatable).
    #[arg(long = "path", value_delimiter = ',')]
    pub paths: Vec<PathBuf>,
}

impl SnapshotsArgs {
    fn filter(&self) -> SnapshotFilter {
        let host = self.host.as_deref().filter(|h| !h.is_empty());
        SnapshotFilter::new(host, &self.tags, &self.paths)
    }
}

/// Executes the `snapshots` command.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened or listed.
pub fn execute(args: SnapshotsArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let repo = global.open_repository()?;
    let snapshots = args.filter().apply(repo.snapshots()?);
    tracing::debug!(count = snapshots.len(), "snapshots selected");

    if snapshots.is_empty() {
        println!("No snapshots found.");
        return Ok(());
    }

    println!("ID\tTIME\tHOST\tTAGS\tPATHS");
    for snapshot in &snapshots {
        println!("{}", format_row(snapshot));
    }
    Ok(())
}

fn format_row(snapshot: &Snapshot) -> String {
    let paths: Vec<String> = snapshot
        .paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    format!(
        "{}\t{}\t{}\t{}\t{}",
        snapshot.id.short(),
        snapshot.time_label(),
        snapshot.hostname,
        join_or_dash(&snapshot.tags),
        join_or_dash(&paths),
    )
}
