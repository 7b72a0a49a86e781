//! Kernel UAPI records for the Landlock syscalls.
//!
//! Layouts mirror `include/uapi/linux/landlock.h` field for field.

use std::os::fd::RawFd;

/// `struct landlock_ruleset_attr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RulesetAttr {
    /// Filesystem kinds this ruleset handles.
    pub handled_access_fs: u64,
    /// Network kinds this ruleset handles (ABI 4+).
    pub handled_access_net: u64,
    /// IPC scopes this ruleset restricts (ABI 6+).
    pub scoped: u64,
}

/// `struct landlock_path_beneath_attr`, which the kernel declares packed.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBeneathAttr {
    /// Filesystem kinds granted beneath `parent_fd`.
    pub allowed_access: u64,
    /// `O_PATH` descriptor of the directory (or file) being granted.
    pub parent_fd: RawFd,
}

/// `struct landlock_net_port_attr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetPortAttr {
    /// Network kinds granted for `port`.
    pub allowed_access: u64,
    /// TCP port in host byte order.
    pub port: u64,
}
