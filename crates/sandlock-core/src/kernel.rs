//! Syscall boundary for the Landlock primitives.
//!
//! [`Kernel`] is the seam between the ruleset state machine and the
//! operating system. [`LinuxKernel`] issues the real calls; tests swap in
//! a recording double.

#![allow(unsafe_code)]

use std::os::fd::RawFd;
use std::path::Path;

use nix::errno::Errno;
use sandlock_common::config::SyscallNumbers;
use sandlock_common::constants::{LANDLOCK_RULE_NET_PORT, LANDLOCK_RULE_PATH_BENEATH};

use crate::uapi::{NetPortAttr, PathBeneathAttr, RulesetAttr};

/// A rule record handed to `landlock_add_rule`.
#[derive(Debug, Clone, Copy)]
pub enum RuleAttr<'a> {
    /// Grant beneath a directory.
    PathBeneath(&'a PathBeneathAttr),
    /// Grant on a TCP port.
    NetPort(&'a NetPortAttr),
}

impl RuleAttr<'_> {
    /// The kernel's `enum landlock_rule_type` value.
    #[must_use]
    pub const fn rule_type(&self) -> u32 {
        match self {
            Self::PathBeneath(_) => LANDLOCK_RULE_PATH_BENEATH,
            Self::NetPort(_) => LANDLOCK_RULE_NET_PORT,
        }
    }

    /// The mask the rule grants.
    #[must_use]
    pub const fn allowed_access(&self) -> u64 {
        match self {
            Self::PathBeneath(attr) => attr.allowed_access,
            Self::NetPort(attr) => attr.allowed_access,
        }
    }
}

/// Raw kernel primitives used by rulesets.
///
/// Every method maps one system call; a negative return becomes the
/// `Err` variant carrying `errno`. Descriptors are plain integers so the
/// caller decides when they are released, through [`Kernel::close`].
pub trait Kernel {
    /// `landlock_create_ruleset(attr, size, flags)`.
    ///
    /// Returns a new ruleset descriptor, or the ABI version when `flags`
    /// carries `LANDLOCK_CREATE_RULESET_VERSION`.
    ///
    /// # Errors
    ///
    /// Returns the kernel's `errno` on a negative return.
    fn create_ruleset(
        &self,
        attr: Option<&RulesetAttr>,
        size: usize,
        flags: u32,
    ) -> Result<i64, Errno>;

    /// `landlock_add_rule(ruleset_fd, rule_type, rule_attr, flags)`.
    ///
    /// # Errors
    ///
    /// Returns the kernel's `errno` on a negative return.
    fn add_rule(&self, ruleset_fd: RawFd, rule: RuleAttr<'_>, flags: u32) -> Result<(), Errno>;

    /// `landlock_restrict_self(ruleset_fd, flags)`.
    ///
    /// # Errors
    ///
    /// Returns the kernel's `errno` on a negative return.
    fn restrict_self(&self, ruleset_fd: RawFd, flags: u32) -> Result<(), Errno>;

    /// `prctl(PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns the kernel's `errno` on a negative return.
    fn set_no_new_privs(&self) -> Result<(), Errno>;

    /// Opens `path` with `O_PATH | O_CLOEXEC`: identity only, no read or
    /// write capability.
    ///
    /// # Errors
    ///
    /// Returns the `errno` reported by `open(2)`.
    fn open_path(&self, path: &Path) -> Result<RawFd, Errno>;

    /// Releases a descriptor previously returned by this kernel.
    fn close(&self, fd: RawFd);
}

/// The running Linux kernel, reached through `libc::syscall`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxKernel {
    numbers: SyscallNumbers,
}

impl LinuxKernel {
    /// Uses the given syscall numbers instead of the generic table.
    #[must_use]
    pub const fn with_numbers(numbers: SyscallNumbers) -> Self {
        Self { numbers }
    }

    /// Syscall numbers in use.
    #[must_use]
    pub const fn numbers(&self) -> SyscallNumbers {
        self.numbers
    }
}

#[cfg(target_os = "linux")]
#[allow(clippy::cast_possible_truncation)]
const fn nr(number: i64) -> libc::c_long {
    number as libc::c_long
}

#[cfg(target_os = "linux")]
fn check(ret: libc::c_long) -> Result<i64, Errno> {
    if ret < 0 {
        Err(Errno::last())
    } else {
        Ok(i64::from(ret))
    }
}

#[cfg(target_os = "linux")]
impl Kernel for LinuxKernel {
    fn create_ruleset(
        &self,
        attr: Option<&RulesetAttr>,
        size: usize,
        flags: u32,
    ) -> Result<i64, Errno> {
        let ptr = attr.map_or(std::ptr::null(), std::ptr::from_ref);
        // SAFETY: `ptr` is null (with size 0 for the version probe) or
        // points to a live `RulesetAttr` of at least `size` bytes.
        let ret = unsafe { libc::syscall(nr(self.numbers.create_ruleset), ptr, size, flags) };
        check(ret)
    }

    fn add_rule(&self, ruleset_fd: RawFd, rule: RuleAttr<'_>, flags: u32) -> Result<(), Errno> {
        let ptr: *const libc::c_void = match rule {
            RuleAttr::PathBeneath(attr) => std::ptr::from_ref(attr).cast(),
            RuleAttr::NetPort(attr) => std::ptr::from_ref(attr).cast(),
        };
        // SAFETY: `ptr` points to a live record whose layout matches the
        // kernel struct selected by `rule_type`.
        let ret = unsafe {
            libc::syscall(
                nr(self.numbers.add_rule),
                ruleset_fd,
                rule.rule_type(),
                ptr,
                flags,
            )
        };
        check(ret).map(drop)
    }

    fn restrict_self(&self, ruleset_fd: RawFd, flags: u32) -> Result<(), Errno> {
        // SAFETY: the syscall reads only its two integer arguments.
        let ret = unsafe { libc::syscall(nr(self.numbers.restrict_self), ruleset_fd, flags) };
        check(ret).map(drop)
    }

    fn set_no_new_privs(&self) -> Result<(), Errno> {
        nix::sys::prctl::set_no_new_privs()
    }

    fn open_path(&self, path: &Path) -> Result<RawFd, Errno> {
        use std::os::fd::IntoRawFd;

        use nix::fcntl::OFlag;
        use nix::sys::stat::Mode;

        nix::fcntl::open(path, OFlag::O_PATH | OFlag::O_CLOEXEC, Mode::empty())
            .map(IntoRawFd::into_raw_fd)
    }

    fn close(&self, fd: RawFd) {
        use std::os::fd::{FromRawFd, OwnedFd};

        // SAFETY: `fd` came from `create_ruleset` or `open_path` on this
        // kernel and is released exactly once by its `KernelFd` guard.
        drop(unsafe { OwnedFd::from_raw_fd(fd) });
    }
}

/// Stub for non-Linux platforms: every primitive reports `ENOSYS`.
#[cfg(not(target_os = "linux"))]
impl Kernel for LinuxKernel {
    fn create_ruleset(
        &self,
        _attr: Option<&RulesetAttr>,
        _size: usize,
        _flags: u32,
    ) -> Result<i64, Errno> {
        Err(Errno::ENOSYS)
    }

    fn add_rule(&self, _ruleset_fd: RawFd, _rule: RuleAttr<'_>, _flags: u32) -> Result<(), Errno> {
        Err(Errno::ENOSYS)
    }

    fn restrict_self(&self, _ruleset_fd: RawFd, _flags: u32) -> Result<(), Errno> {
        Err(Errno::ENOSYS)
    }

    fn set_no_new_privs(&self) -> Result<(), Errno> {
        Err(Errno::ENOSYS)
    }

    fn open_path(&self, _path: &Path) -> Result<RawFd, Errno> {
        Err(Errno::ENOSYS)
    }

    fn close(&self, _fd: RawFd) {}
}

/// A descriptor released through its kernel when dropped.
pub(crate) struct KernelFd<'k, K: Kernel + ?Sized> {
    kernel: &'k K,
    fd: RawFd,
}

impl<'k, K: Kernel + ?Sized> KernelFd<'k, K> {
    pub(crate) const fn new(kernel: &'k K, fd: RawFd) -> Self {
        Self { kernel, fd }
    }

    pub(crate) const fn raw(&self) -> RawFd {
        self.fd
    }
}

impl<K: Kernel + ?Sized> Drop for KernelFd<'_, K> {
    fn drop(&mut self) {
        self.kernel.close(self.fd);
        tracing::trace!(fd = self.fd, "descriptor released");
    }
}

impl<K: Kernel + ?Sized> std::fmt::Debug for KernelFd<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KernelFd").field(&self.fd).finish()
    }
}
