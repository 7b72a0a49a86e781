//! Kernel ABI constants for the Landlock syscall interface.
//!
//! Values come from `include/uapi/linux/landlock.h` and the generic
//! syscall table shared by every architecture listed in
//! [`SUPPORTED_ARCHES`].

/// `landlock_create_ruleset(2)` on the generic syscall table.
pub const SYS_LANDLOCK_CREATE_RULESET: i64 = 444;
/// `landlock_add_rule(2)` on the generic syscall table.
pub const SYS_LANDLOCK_ADD_RULE: i64 = 445;
/// `landlock_restrict_self(2)` on the generic syscall table.
pub const SYS_LANDLOCK_RESTRICT_SELF: i64 = 446;

/// Flag asking `landlock_create_ruleset` to report the ABI version
/// instead of creating a ruleset.
pub const LANDLOCK_CREATE_RULESET_VERSION: u32 = 1 << 0;

/// Rule type for a directory-subtree grant.
pub const LANDLOCK_RULE_PATH_BENEATH: u32 = 1;
/// Rule type for a TCP port grant (ABI 4+).
pub const LANDLOCK_RULE_NET_PORT: u32 = 2;

/// Highest ABI generation known to the capability table.
pub const LATEST_KNOWN_ABI: u32 = 6;

/// Architectures on which the Landlock syscalls use numbers 444–446.
pub const SUPPORTED_ARCHES: &[&str] = &[
    "x86_64",
    "x86",
    "aarch64",
    "arm",
    "riscv64",
    "s390x",
    "powerpc64",
    "loongarch64",
];

/// Application name used in CLI output.
pub const APP_NAME: &str = "sandlock";
