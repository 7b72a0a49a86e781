//! Ruleset creation, rule attachment, and enforcement.
//!
//! A [`Ruleset`] moves through two states: [`RulesetState::Building`]
//! while rules are attached, and [`RulesetState::Enforced`] once bound to
//! the calling thread. There is no way back.
//!
//! A ruleset needs exclusive access for every mutation (`&mut self`), so
//! concurrent use from several threads requires external synchronization.

use std::fmt;
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::OnceLock;

use sandlock_common::config::SandlockConfig;
use sandlock_common::error::{Result, SandlockError};
use sandlock_common::types::{AbiVersion, AccessFs, AccessNet, Scope};

use crate::abi::{self, AccessKind};
use crate::kernel::{Kernel, KernelFd, LinuxKernel, RuleAttr};
use crate::mask;
use crate::negotiate;
use crate::platform::Platform;
use crate::uapi::{NetPortAttr, PathBeneathAttr, RulesetAttr};

/// Which access kinds a new ruleset handles, per category.
///
/// A category left as `None` is unmanaged: the ruleset does not govern
/// it at all, which is different from denying every kind in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesetRequest {
    fs: Option<Vec<AccessFs>>,
    net: Option<Vec<AccessNet>>,
    scope: Option<Vec<Scope>>,
}

impl RulesetRequest {
    /// An empty request: every category unmanaged.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fs: None,
            net: None,
            scope: None,
        }
    }

    /// Handles the given filesystem kinds.
    #[must_use]
    pub fn handle_fs(mut self, kinds: &[AccessFs]) -> Self {
        self.fs = Some(kinds.to_vec());
        self
    }

    /// Handles the given network kinds.
    #[must_use]
    pub fn handle_net(mut self, kinds: &[AccessNet]) -> Self {
        self.net = Some(kinds.to_vec());
        self
    }

    /// Restricts the given IPC scopes.
    #[must_use]
    pub fn scope(mut self, kinds: &[Scope]) -> Self {
        self.scope = Some(kinds.to_vec());
        self
    }

    /// Filters and encodes every category for `abi`.
    #[must_use]
    pub fn attr_for(&self, abi: AbiVersion) -> RulesetAttr {
        RulesetAttr {
            handled_access_fs: filtered_mask(self.fs.as_deref(), abi),
            handled_access_net: filtered_mask(self.net.as_deref(), abi),
            scoped: filtered_mask(self.scope.as_deref(), abi),
        }
    }
}

fn filtered_mask<K: AccessKind>(kinds: Option<&[K]>, abi: AbiVersion) -> u64 {
    let Some(kinds) = kinds else {
        return 0;
    };
    let kept = abi::filter(kinds, abi);
    let requested = mask::encode(kinds);
    let encoded = mask::encode(&kept);
    if encoded != requested {
        tracing::warn!(
            category = %K::CATEGORY,
            %abi,
            dropped = ?mask::decode::<K>(requested & !encoded),
            "access kinds not supported by the running kernel were dropped"
        );
    }
    encoded
}

fn granted_mask<K: AccessKind>(kinds: &[K], abi: AbiVersion, handled: u64) -> u64 {
    let requested = mask::encode(kinds);
    let granted = mask::encode(&abi::filter(kinds, abi)) & handled;
    if granted != requested {
        tracing::warn!(
            category = %K::CATEGORY,
            %abi,
            dropped = ?mask::decode::<K>(requested & !granted),
            "granted access kinds the kernel lacks or the ruleset does not handle were dropped"
        );
    }
    granted
}

/// Lifecycle state of a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulesetState {
    /// Accepting rules; the kernel descriptor is open.
    Building,
    /// Bound to the calling thread; the descriptor has been released.
    Enforced,
}

impl fmt::Display for RulesetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Enforced => write!(f, "enforced"),
        }
    }
}

enum Phase<'k, K: Kernel + ?Sized> {
    Building(KernelFd<'k, K>),
    Enforced,
}

/// A Landlock ruleset owned by its creator.
pub struct Ruleset<'k, K: Kernel + ?Sized = LinuxKernel> {
    kernel: &'k K,
    phase: Phase<'k, K>,
    abi: AbiVersion,
    attr: RulesetAttr,
    rules: usize,
}

impl<K: Kernel + ?Sized> fmt::Debug for Ruleset<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ruleset")
            .field("state", &self.state())
            .field("abi", &self.abi)
            .field("attr", &self.attr)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<'k, K: Kernel + ?Sized> Ruleset<'k, K> {
    /// Creates a kernel ruleset for `abi`, which must come from
    /// negotiation with the running kernel.
    ///
    /// # Errors
    ///
    /// Returns [`SandlockError::Syscall`] if `landlock_create_ruleset`
    /// fails, for instance `ENOMSG` when every category encodes to zero.
    pub(crate) fn create(kernel: &'k K, abi: AbiVersion, request: &RulesetRequest) -> Result<Self> {
        let attr = request.attr_for(abi);
        let raw = kernel
            .create_ruleset(Some(&attr), size_of::<RulesetAttr>(), 0)
            .map_err(|errno| SandlockError::Syscall {
                operation: "landlock_create_ruleset",
                errno,
            })?;
        let fd = RawFd::try_from(raw).map_err(|_| SandlockError::Syscall {
            operation: "landlock_create_ruleset",
            errno: nix::errno::Errno::EBADF,
        })?;
        tracing::info!(
            fd,
            %abi,
            handled_fs = format_args!("{:#x}", attr.handled_access_fs),
            handled_net = format_args!("{:#x}", attr.handled_access_net),
            scoped = format_args!("{:#x}", attr.scoped),
            "ruleset created"
        );
        Ok(Self {
            kernel,
            phase: Phase::Building(KernelFd::new(kernel, fd)),
            abi,
            attr,
            rules: 0,
        })
    }

    fn building_fd(&self, operation: &'static str) -> Result<RawFd> {
        match &self.phase {
            Phase::Building(fd) => Ok(fd.raw()),
            Phase::Enforced => Err(SandlockError::InvalidState { operation }),
        }
    }

    /// Grants `kinds` beneath `path`.
    ///
    /// The path is opened `O_PATH` for the duration of the call only. Kinds
    /// the negotiated ABI lacks, or the ruleset does not handle, are dropped
    /// before encoding. When nothing is left the rule is skipped and the
    /// ruleset is unchanged.
    ///
    /// # Errors
    ///
    /// - [`SandlockError::InvalidState`] if the ruleset is enforced.
    /// - [`SandlockError::Path`] if `path` cannot be opened.
    /// - [`SandlockError::Syscall`] if `landlock_add_rule` fails.
    pub fn add_path_beneath_rule(
        &mut self,
        path: impl AsRef<Path>,
        kinds: &[AccessFs],
    ) -> Result<&mut Self> {
        let ruleset_fd = self.building_fd("add_path_beneath_rule")?;
        let path = path.as_ref();
        let parent = self
            .kernel
            .open_path(path)
            .map(|fd| KernelFd::new(self.kernel, fd))
            .map_err(|errno| SandlockError::Path {
                path: path.to_path_buf(),
                errno,
            })?;

        let allowed = granted_mask(kinds, self.abi, self.attr.handled_access_fs);
        if allowed == 0 {
            tracing::warn!(path = %path.display(), "path-beneath rule grants nothing, skipped");
            return Ok(self);
        }
        let attr = PathBeneathAttr {
            allowed_access: allowed,
            parent_fd: parent.raw(),
        };
        self.kernel
            .add_rule(ruleset_fd, RuleAttr::PathBeneath(&attr), 0)
            .map_err(|errno| SandlockError::Syscall {
                operation: "landlock_add_rule",
                errno,
            })?;

        self.rules += 1;
        tracing::debug!(
            path = %path.display(),
            allowed = format_args!("{:#x}", { attr.allowed_access }),
            "path-beneath rule added"
        );
        Ok(self)
    }

    /// Grants `kinds` on TCP `port`. Kinds are filtered like
    /// [`Ruleset::add_path_beneath_rule`]; a grant left empty is skipped.
    ///
    /// # Errors
    ///
    /// - [`SandlockError::InvalidState`] if the ruleset is enforced.
    /// - [`SandlockError::Syscall`] if `landlock_add_rule` fails.
    pub fn add_net_port_rule(&mut self, port: u16, kinds: &[AccessNet]) -> Result<&mut Self> {
        let ruleset_fd = self.building_fd("add_net_port_rule")?;
        let allowed = granted_mask(kinds, self.abi, self.attr.handled_access_net);
        if allowed == 0 {
            tracing::warn!(port, "net-port rule grants nothing, skipped");
            return Ok(self);
        }
        let attr = NetPortAttr {
            allowed_access: allowed,
            port: u64::from(port),
        };
        self.kernel
            .add_rule(ruleset_fd, RuleAttr::NetPort(&attr), 0)
            .map_err(|errno| SandlockError::Syscall {
                operation: "landlock_add_rule",
                errno,
            })?;

        self.rules += 1;
        tracing::debug!(
            port,
            allowed = format_args!("{:#x}", attr.allowed_access),
            "net-port rule added"
        );
        Ok(self)
    }

    /// Binds the ruleset to the calling thread. Calling it again once
    /// enforced does nothing.
    ///
    /// Sets `no_new_privs` first; that attribute stays set even if the
    /// restriction itself then fails. On failure the ruleset remains
    /// [`RulesetState::Building`].
    ///
    /// # Errors
    ///
    /// Returns [`SandlockError::Syscall`] if `prctl` or
    /// `landlock_restrict_self` fails.
    pub fn enforce(&mut self) -> Result<()> {
        let Phase::Building(fd) = &self.phase else {
            tracing::debug!("ruleset already enforced");
            return Ok(());
        };
        let ruleset_fd = fd.raw();

        self.kernel
            .set_no_new_privs()
            .map_err(|errno| SandlockError::Syscall {
                operation: "prctl(PR_SET_NO_NEW_PRIVS)",
                errno,
            })?;
        self.kernel
            .restrict_self(ruleset_fd, 0)
            .map_err(|errno| SandlockError::Syscall {
                operation: "landlock_restrict_self",
                errno,
            })?;

        self.phase = Phase::Enforced;
        tracing::info!(
            abi = %self.abi,
            rules = self.rules,
            filesystem = self.attr.handled_access_fs != 0,
            network = self.attr.handled_access_net != 0,
            scoped = self.attr.scoped != 0,
            "ruleset enforced on calling thread"
        );
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RulesetState {
        match &self.phase {
            Phase::Building(_) => RulesetState::Building,
            Phase::Enforced => RulesetState::Enforced,
        }
    }

    /// Whether [`Self::enforce`] has succeeded.
    #[must_use]
    pub const fn is_enforced(&self) -> bool {
        matches!(&self.phase, Phase::Enforced)
    }

    /// ABI version the masks were filtered for.
    #[must_use]
    pub const fn abi(&self) -> AbiVersion {
        self.abi
    }

    /// Handled filesystem mask.
    #[must_use]
    pub const fn handled_fs(&self) -> u64 {
        self.attr.handled_access_fs
    }

    /// Handled network mask.
    #[must_use]
    pub const fn handled_net(&self) -> u64 {
        self.attr.handled_access_net
    }

    /// Scope mask.
    #[must_use]
    pub const fn scoped(&self) -> u64 {
        self.attr.scoped
    }

    /// Number of rules attached successfully.
    #[must_use]
    pub const fn rules(&self) -> usize {
        self.rules
    }
}

/// Entry point binding a kernel, a platform, and a configuration.
///
/// The negotiated ABI version is cached after the first successful probe.
#[derive(Debug)]
pub struct Landlock<K: Kernel = LinuxKernel> {
    kernel: K,
    platform: Platform,
    config: SandlockConfig,
    abi: OnceLock<AbiVersion>,
}

impl Landlock<LinuxKernel> {
    /// Uses the running kernel with the generic syscall numbers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SandlockConfig::default())
    }

    /// Uses the running kernel with the configured syscall numbers.
    #[must_use]
    pub fn with_config(config: SandlockConfig) -> Self {
        let kernel = LinuxKernel::with_numbers(config.syscall_numbers());
        Self::with_kernel(kernel, Platform::current(), config)
    }
}

impl Default for Landlock<LinuxKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> Landlock<K> {
    /// Uses an arbitrary kernel implementation and platform.
    #[must_use]
    pub const fn with_kernel(kernel: K, platform: Platform, config: SandlockConfig) -> Self {
        Self {
            kernel,
            platform,
            config,
            abi: OnceLock::new(),
        }
    }

    /// Whether the platform can reach Landlock. Performs no syscall.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.platform.supports_landlock(&self.config)
    }

    /// Highest ABI version the kernel implements.
    ///
    /// # Errors
    ///
    /// Returns [`SandlockError::UnsupportedPlatform`] before any syscall
    /// on an unsupported platform, or [`SandlockError::Syscall`] if the
    /// probe fails. Failures are not cached.
    pub fn negotiate_abi_version(&self) -> Result<AbiVersion> {
        self.platform.ensure_supported(&self.config)?;
        if let Some(abi) = self.abi.get() {
            return Ok(*abi);
        }
        let abi = negotiate::probe(&self.kernel)?;
        Ok(*self.abi.get_or_init(|| abi))
    }

    /// Negotiates the ABI and creates a ruleset handling `request`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::negotiate_abi_version`], or
    /// [`SandlockError::Syscall`] if `landlock_create_ruleset` fails, for
    /// instance `ENOMSG` when every category encodes to zero.
    pub fn create_ruleset(&self, request: &RulesetRequest) -> Result<Ruleset<'_, K>> {
        let abi = self.negotiate_abi_version()?;
        Ruleset::create(&self.kernel, abi, request)
    }

    /// The kernel implementation in use.
    #[must_use]
    pub const fn kernel(&self) -> &K {
        &self.kernel
    }
}
