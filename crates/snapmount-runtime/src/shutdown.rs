//! Process shutdown hooks.
//!
//! Hooks are registered while the process runs and fire once when it
//! ends, whether through a normal return, a panic, or SIGINT/SIGTERM.
//! Running drains the collection, so a hook never fires twice even when
//! several of those paths race.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use snapmount_common::constants::SIGNAL_EXIT_CODE;
use snapmount_common::error::Result;

type Hook = Box<dyn FnOnce() -> Result<()> + Send>;

/// Named handlers run at process shutdown.
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<(String, Hook)>>,
}

impl ShutdownHooks {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` under `name`.
    pub fn register<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!(hook = %name, "shutdown hook registered");
        self.hooks.lock().push((name, Box::new(hook)));
    }

    /// Number of hooks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    /// Whether no hooks are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.lock().is_empty()
    }

    /// Names of the waiting hooks in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.hooks.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Runs every waiting hook in registration order and returns how many
    /// this call ran.
    ///
    /// Hooks are taken off the list one at a time, so a nested call (the
    /// panic hook firing inside a panicking hook) carries on with the
    /// remaining ones. A failing or panicking hook is logged and does not
    /// stop the others.
    pub fn run(&self) -> usize {
        let mut count = 0;
        while let Some((name, hook)) = self.next_hook() {
            count += 1;
            tracing::debug!(hook = %name, "running shutdown hook");
            match panic::catch_unwind(AssertUnwindSafe(hook)) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(hook = %name, error = %e, "shutdown hook failed"),
                Err(_) => tracing::warn!(hook = %name, "shutdown hook panicked"),
            }
        }
        count
    }

    fn next_hook(&self) -> Option<(String, Hook)> {
        let mut hooks = self.hooks.lock();
        (!hooks.is_empty()).then(|| hooks.remove(0))
    }
}

impl std::fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHooks")
            .field("hooks", &self.names())
            .finish()
    }
}

/// Runs the hooks when dropped.
#[derive(Debug)]
pub struct ShutdownGuard(Arc<ShutdownHooks>);

impl ShutdownGuard {
    /// Guards `hooks` for the current scope.
    #[must_use]
    pub const fn new(hooks: Arc<ShutdownHooks>) -> Self {
        Self(hooks)
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        let _ = self.0.run();
    }
}

/// Runs the hooks on SIGINT or SIGTERM, then exits with [`SIGNAL_EXIT_CODE`].
///
/// # Errors
///
/// Returns an error if a handler is already installed.
pub fn install_signal_handler(
    hooks: Arc<ShutdownHooks>,
) -> std::result::Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || std::process::exit(on_termination(&hooks)))
}

/// Signal path body: runs the hooks and returns the exit status to use.
pub fn on_termination(hooks: &ShutdownHooks) -> i32 {
    tracing::info!("termination signal received");
    let ran = hooks.run();
    tracing::debug!(ran, "shutdown hooks finished");
    SIGNAL_EXIT_CODE
}

/// Chains a panic hook that runs the shutdown hooks before the previous one.
///
/// Release builds abort on panic, which skips [`ShutdownGuard`]'s drop.
pub fn install_panic_hook(hooks: Arc<ShutdownHooks>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = hooks.run();
        previous(info);
    }));
}
