//! Symbolic restriction kinds and ABI versions.
//!
//! The three enumerations are closed: every variant maps to one bit the
//! kernel knows about, except [`AccessFs::Core`], which is an alias for the
//! whole ABI 1 filesystem set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SandlockError;

/// Landlock ABI generation reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiVersion(u32);

impl AbiVersion {
    /// Linux 5.13: basic filesystem access.
    pub const V1: Self = Self(1);
    /// Linux 5.19: `refer`.
    pub const V2: Self = Self(2);
    /// Linux 6.2: `truncate`.
    pub const V3: Self = Self(3);
    /// Linux 6.7: TCP bind/connect.
    pub const V4: Self = Self(4);
    /// Linux 6.10: `ioctl-dev`.
    pub const V5: Self = Self(5);
    /// Linux 6.12: abstract unix socket and signal scoping.
    pub const V6: Self = Self(6);
    /// Highest generation the capability table describes.
    pub const LATEST: Self = Self(crate::constants::LATEST_KNOWN_ABI);

    /// Wraps a raw version number.
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Returns the raw version number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three restriction categories a ruleset can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Filesystem access.
    Filesystem,
    /// TCP network access.
    Network,
    /// IPC scoping.
    Scope,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem => write!(f, "filesystem"),
            Self::Network => write!(f, "network"),
            Self::Scope => write!(f, "scope"),
        }
    }
}

/// Filesystem access kinds.
///
/// Declaration order is the kernel bit order and the canonical output
/// order of filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessFs {
    /// Execute a file.
    Execute,
    /// Open a file with write access.
    WriteFile,
    /// Open a file with read access.
    ReadFile,
    /// Open a directory or list its content.
    ReadDir,
    /// Remove an empty directory or rename one.
    RemoveDir,
    /// Unlink or rename a file.
    RemoveFile,
    /// Create a character device.
    MakeChar,
    /// Create a directory.
    MakeDir,
    /// Create a regular file.
    MakeReg,
    /// Create a UNIX domain socket.
    MakeSock,
    /// Create a named pipe.
    MakeFifo,
    /// Create a block device.
    MakeBlock,
    /// Create a symbolic link.
    MakeSym,
    /// Link or rename a file from or to a different directory.
    Refer,
    /// Truncate a file.
    Truncate,
    /// Invoke `ioctl(2)` on a device file.
    IoctlDev,
    /// Alias for every ABI 1 kind (`Execute` through `MakeSym`).
    Core,
}

impl AccessFs {
    /// Every concrete kind in canonical order. Excludes [`Self::Core`].
    pub const ALL: &'static [Self] = &[
        Self::Execute,
        Self::WriteFile,
        Self::ReadFile,
        Self::ReadDir,
        Self::RemoveDir,
        Self::RemoveFile,
        Self::MakeChar,
        Self::MakeDir,
        Self::MakeReg,
        Self::MakeSock,
        Self::MakeFifo,
        Self::MakeBlock,
        Self::MakeSym,
        Self::Refer,
        Self::Truncate,
        Self::IoctlDev,
    ];

    /// The kinds [`Self::Core`] stands for.
    pub const CORE: &'static [Self] = &[
        Self::Execute,
        Self::WriteFile,
        Self::ReadFile,
        Self::ReadDir,
        Self::RemoveDir,
        Self::RemoveFile,
        Self::MakeChar,
        Self::MakeDir,
        Self::MakeReg,
        Self::MakeSock,
        Self::MakeFifo,
        Self::MakeBlock,
        Self::MakeSym,
    ];

    /// Kinds that only observe files.
    pub const READ: &'static [Self] = &[Self::Execute, Self::ReadFile, Self::ReadDir];

    /// Kebab-case name used in configuration and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::WriteFile => "write-file",
            Self::ReadFile => "read-file",
            Self::ReadDir => "read-dir",
            Self::RemoveDir => "remove-dir",
            Self::RemoveFile => "remove-file",
            Self::MakeChar => "make-char",
            Self::MakeDir => "make-dir",
            Self::MakeReg => "make-reg",
            Self::MakeSock => "make-sock",
            Self::MakeFifo => "make-fifo",
            Self::MakeBlock => "make-block",
            Self::MakeSym => "make-sym",
            Self::Refer => "refer",
            Self::Truncate => "truncate",
            Self::IoctlDev => "ioctl-dev",
            Self::Core => "core",
        }
    }
}

/// Network access kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessNet {
    /// Bind a TCP socket to a local port.
    BindTcp,
    /// Connect a TCP socket to a remote port.
    ConnectTcp,
}

impl AccessNet {
    /// Every kind in canonical order.
    pub const ALL: &'static [Self] = &[Self::BindTcp, Self::ConnectTcp];

    /// Kebab-case name used in configuration and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BindTcp => "bind-tcp",
            Self::ConnectTcp => "connect-tcp",
        }
    }
}

/// IPC scoping kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Deny connecting to abstract unix sockets created outside the domain.
    AbstractUnixSocket,
    /// Deny sending signals to processes outside the domain.
    Signal,
}

impl Scope {
    /// Every kind in canonical order.
    pub const ALL: &'static [Self] = &[Self::AbstractUnixSocket, Self::Signal];

    /// Kebab-case name used in configuration and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AbstractUnixSocket => "abstract-unix-socket",
            Self::Signal => "signal",
        }
    }
}

fn parse_kind<K: Copy>(
    s: &str,
    candidates: &[K],
    name: fn(K) -> &'static str,
    category: Category,
) -> Result<K, SandlockError> {
    candidates
        .iter()
        .copied()
        .find(|k| name(*k) == s)
        .ok_or_else(|| SandlockError::Config {
            message: format!("unknown {category} access kind: {s}"),
        })
}

impl FromStr for AccessFs {
    type Err = SandlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::Core.name() {
            return Ok(Self::Core);
        }
        parse_kind(s, Self::ALL, Self::name, Category::Filesystem)
    }
}

impl FromStr for AccessNet {
    type Err = SandlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_kind(s, Self::ALL, Self::name, Category::Network)
    }
}

impl FromStr for Scope {
    type Err = SandlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_kind(s, Self::ALL, Self::name, Category::Scope)
    }
}

impl fmt::Display for AccessFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for AccessNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_names_roundtrip_through_from_str() {
        for kind in AccessFs::ALL.iter().chain(&[AccessFs::Core]) {
            assert_eq!(kind.name().parse::<AccessFs>().expect("parse"), *kind);
        }
    }

    #[test]
    fn unknown_kind_is_config_error() {
        let err = "chmod".parse::<AccessFs>().unwrap_err();
        assert!(err.to_string().contains("unknown filesystem access kind"));
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Scope::AbstractUnixSocket).expect("serialize");
        assert_eq!(json, "\"abstract-unix-socket\"");
        let kind: AccessNet = serde_json::from_str("\"connect-tcp\"").expect("deserialize");
        assert_eq!(kind, AccessNet::ConnectTcp);
    }

    #[test]
    fn canonical_order_matches_declaration() {
        let mut sorted = AccessFs::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, AccessFs::ALL);
        assert!(AccessFs::CORE.iter().all(|k| *k < AccessFs::Refer));
    }

    #[test]
    fn abi_versions_are_ordered() {
        assert!(AbiVersion::V1 < AbiVersion::V6);
        assert_eq!(AbiVersion::LATEST, AbiVersion::V6);
        assert_eq!(AbiVersion::new(4).to_string(), "4");
    }
}
