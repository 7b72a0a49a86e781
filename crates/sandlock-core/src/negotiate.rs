//! ABI negotiation with the running kernel.

use sandlock_common::config::SandlockConfig;
use sandlock_common::constants::LANDLOCK_CREATE_RULESET_VERSION;
use sandlock_common::error::{Result, SandlockError};
use sandlock_common::types::AbiVersion;

use crate::kernel::{Kernel, LinuxKernel};
use crate::platform::Platform;

/// Probes `kernel` for the highest Landlock ABI it implements.
///
/// Issues `landlock_create_ruleset(NULL, 0, LANDLOCK_CREATE_RULESET_VERSION)`,
/// which reports a version and creates no object.
///
/// # Errors
///
/// Returns [`SandlockError::Syscall`] when the probe fails, typically
/// `ENOSYS` (kernel without Landlock) or `EOPNOTSUPP` (disabled at boot).
pub fn probe<K: Kernel + ?Sized>(kernel: &K) -> Result<AbiVersion> {
    let raw = kernel
        .create_ruleset(None, 0, LANDLOCK_CREATE_RULESET_VERSION)
        .map_err(|errno| SandlockError::Syscall {
            operation: "landlock_create_ruleset",
            errno,
        })?;
    let version = u32::try_from(raw)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or(SandlockError::Syscall {
            operation: "landlock_create_ruleset",
            errno: nix::errno::Errno::EOPNOTSUPP,
        })?;
    tracing::debug!(abi = version, "negotiated landlock ABI");
    Ok(AbiVersion::new(version))
}

/// Negotiates the ABI version of the running kernel with default settings.
///
/// # Errors
///
/// Returns [`SandlockError::UnsupportedPlatform`] before any syscall on a
/// non-Linux host or unknown architecture, otherwise the errors of
/// [`probe`].
pub fn negotiate_abi_version() -> Result<AbiVersion> {
    let config = SandlockConfig::default();
    Platform::current().ensure_supported(&config)?;
    probe(&LinuxKernel::with_numbers(config.syscall_numbers()))
}
