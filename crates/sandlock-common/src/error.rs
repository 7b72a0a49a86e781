//! Unified error types for the sandlock workspace.

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum SandlockError {
    /// The host OS or CPU architecture cannot run Landlock through the
    /// configured syscall numbers. Raised before any syscall is attempted.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Operating system reported by the build target.
        os: String,
        /// CPU architecture reported by the build target.
        arch: String,
    },

    /// A kernel primitive returned a negative value.
    #[error("{operation} failed: {errno}")]
    Syscall {
        /// Name of the primitive that failed.
        operation: &'static str,
        /// Error number reported by the kernel.
        errno: Errno,
    },

    /// Opening a directory-scope handle for a path-beneath rule failed.
    #[error("cannot open {path}: {errno}")]
    Path {
        /// Path that could not be opened.
        path: PathBuf,
        /// Error number reported by `open(2)`.
        errno: Errno,
    },

    /// A mutation was attempted on a ruleset that is already enforced.
    #[error("{operation} rejected: ruleset is already enforced")]
    InvalidState {
        /// Operation that was rejected.
        operation: &'static str,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl SandlockError {
    /// Returns the kernel error number carried by this error, if any.
    #[must_use]
    pub const fn errno(&self) -> Option<Errno> {
        match self {
            Self::Syscall { errno, .. } | Self::Path { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Whether this error means Landlock cannot be used on this host at all.
    ///
    /// Callers decide their own fallback; this only classifies.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. }
                | Self::Syscall {
                    errno: Errno::ENOSYS | Errno::EOPNOTSUPP,
                    ..
                }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SandlockError>;
