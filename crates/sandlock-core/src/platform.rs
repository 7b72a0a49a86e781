//! Platform check performed before any Landlock syscall.

use sandlock_common::config::SandlockConfig;
use sandlock_common::constants::SUPPORTED_ARCHES;
use sandlock_common::error::{Result, SandlockError};

/// Operating system and CPU architecture of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Value of `std::env::consts::OS` on that host.
    pub os: &'static str,
    /// Value of `std::env::consts::ARCH` on that host.
    pub arch: &'static str,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    /// Whether Landlock can be reached on this platform.
    ///
    /// Requires Linux, and either an architecture on the generic syscall
    /// table or explicitly configured syscall numbers.
    #[must_use]
    pub fn supports_landlock(&self, config: &SandlockConfig) -> bool {
        self.os == "linux" && (config.syscalls.is_some() || SUPPORTED_ARCHES.contains(&self.arch))
    }

    /// Fails with [`SandlockError::UnsupportedPlatform`] unless
    /// [`Self::supports_landlock`] holds.
    ///
    /// # Errors
    ///
    /// Returns an error on an unsupported OS or architecture.
    pub fn ensure_supported(&self, config: &SandlockConfig) -> Result<()> {
        if self.supports_landlock(config) {
            Ok(())
        } else {
            Err(SandlockError::UnsupportedPlatform {
                os: self.os.to_string(),
                arch: self.arch.to_string(),
            })
        }
    }
}

/// Whether the current platform can use Landlock with the default
/// syscall numbers. Performs no syscall.
#[must_use]
pub fn is_supported() -> bool {
    Platform::current().supports_landlock(&SandlockConfig::default())
}
