//! Terminal output for CLI commands.

use snapmount_runtime::Reporter;

/// Writes status lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    /// Creates a reporter; `quiet` drops verbose lines.
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

#[allow(clippy::print_stderr)]
impl Reporter for TerminalReporter {
    fn verbose(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    fn print(&self, message: &str) {
        eprintln!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("Warning: {message}");
    }
}

/// Joins a list for a table cell, `-` when empty.
pub fn join_or_dash<T: AsRef<str>>(items: &[T]) -> String {
    if items.is_empty() {
        "-".to_owned()
    } else {
        items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
    }
}
