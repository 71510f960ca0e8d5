//! System-wide constants.

/// Binary name for the CLI.
pub const BIN_NAME: &str = "snapmount";

/// Filesystem name reported to the host for every mount.
pub const FS_NAME: &str = "snapmount";

/// Name of the single entry at the root of a mounted repository.
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Permission bits for a mountpoint created on demand (owner-only).
pub const MOUNTPOINT_MODE: u32 = 0o700;

/// Environment variable holding the default repository location.
pub const REPOSITORY_ENV: &str = "SNAPMOUNT_REPOSITORY";

/// Repository layout version understood by this build.
pub const REPOSITORY_VERSION: u32 = 1;

/// Name of the repository configuration file.
pub const REPO_CONFIG_FILE: &str = "config";

/// Directory holding snapshot records inside a repository.
pub const REPO_SNAPSHOTS_DIR: &str = "snapshots";

/// Directory holding content blobs inside a repository.
pub const REPO_DATA_DIR: &str = "data";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Number of hex characters shown for abbreviated identifiers.
pub const SHORT_ID_LENGTH: usize = 8;

/// Seconds the kernel may cache attributes and entries of the read-only tree.
pub const ATTR_TTL_SECS: u64 = 1;

/// Process exit code used after a termination signal ran the shutdown hooks.
///
/// The signal handler fires for both SIGINT and SIGTERM without saying
/// which one arrived, so both exit with the interrupt status (128 + 2).
pub const SIGNAL_EXIT_CODE: i32 = 130;
