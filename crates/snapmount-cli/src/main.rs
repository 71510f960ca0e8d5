//! # snapmount
//!
//! Browse the snapshots of a backup repository through a read-only
//! FUSE mount.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod output;

use std::sync::Arc;

use clap::Parser;
use snapmount_runtime::{ShutdownGuard, ShutdownHooks, install_panic_hook, install_signal_handler};

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let hooks = Arc::new(ShutdownHooks::new());
    install_signal_handler(Arc::clone(&hooks))?;
    install_panic_hook(Arc::clone(&hooks));
    let _guard = ShutdownGuard::new(Arc::clone(&hooks));

    commands::execute(cli, &hooks)
}
