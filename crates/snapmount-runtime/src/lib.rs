//! Mount lifecycle management for snapmount.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod orchestrator;
pub mod shutdown;

pub use orchestrator::{Orchestrator, Reporter, prepare_mountpoint};
pub use shutdown::{
    ShutdownGuard, ShutdownHooks, install_panic_hook, install_signal_handler, on_termination,
};
