//! Translation of mount options into host mount flags.

use std::collections::BTreeSet;

use fuser::MountOption;
use snapmount_common::config::MountConfig;
use snapmount_common::constants::FS_NAME;

/// A single host-level mount flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MountFlag {
    /// Mount read-only.
    ReadOnly,
    /// Filesystem name reported in the mount table.
    FsName(String),
    /// Let the root user access the mount.
    AllowRoot,
    /// Let every other user access the mount.
    AllowOther,
}

/// The flag set a session is established with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountFlags(BTreeSet<MountFlag>);

impl MountFlags {
    /// Translates a configuration into flags.
    ///
    /// The result always holds [`MountFlag::ReadOnly`] and the fixed
    /// filesystem name. `AllowRoot` and `AllowOther` are each added iff
    /// the matching option is set.
    #[must_use]
    pub fn from_config(config: &MountConfig) -> Self {
        let mut flags = BTreeSet::from([MountFlag::ReadOnly, MountFlag::FsName(FS_NAME.into())]);
        if config.allow_root() {
            let _ = flags.insert(MountFlag::AllowRoot);
        }
        if config.allow_other() {
            let _ = flags.insert(MountFlag::AllowOther);
        }
        Self(flags)
    }

    /// Whether `flag` is part of the set.
    #[must_use]
    pub fn contains(&self, flag: &MountFlag) -> bool {
        self.0.contains(flag)
    }

    /// Iterates the flags in order.
    pub fn iter(&self) -> impl Iterator<Item = &MountFlag> {
        self.0.iter()
    }

    /// Number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the set into `fuser` mount options.
    ///
    /// `fuser` rejects `allow_root` next to `allow_other`; the latter
    /// already grants root access, so only it is passed when both are set.
    #[must_use]
    pub fn to_fuse_options(&self) -> Vec<MountOption> {
        let allow_other = self.contains(&MountFlag::AllowOther);
        self.iter()
            .filter_map(|flag| match flag {
                MountFlag::ReadOnly => Some(MountOption::RO),
                MountFlag::FsName(name) => Some(MountOption::FSName(name.clone())),
                MountFlag::AllowOther => Some(MountOption::AllowOther),
                MountFlag::AllowRoot if allow_other => None,
                MountFlag::AllowRoot => Some(MountOption::AllowRoot),
            })
            .collect()
    }
}
