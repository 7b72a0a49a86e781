//! # sandlock-core
//!
//! Unprivileged filesystem, network, and IPC sandboxing on Linux through
//! the Landlock syscall interface.
//!
//! This crate provides:
//! - **ABI capability table**: which access kinds each kernel generation knows.
//! - **Filtering and encoding**: symbolic kinds to the kernel's bitmasks.
//! - **Rulesets**: creation, path-beneath and net-port rules, and
//!   irreversible enforcement on the calling thread.
//!
//! All raw system calls sit behind the [`kernel::Kernel`] trait; the
//! Linux implementation carries the `// SAFETY:` notes.
//!
//! # Example
//!
//! ```rust,no_run
//! use sandlock_common::types::AccessFs;
//! use sandlock_core::{Landlock, RulesetRequest};
//!
//! let landlock = Landlock::new();
//! let mut ruleset = landlock.create_ruleset(&RulesetRequest::new().handle_fs(&[AccessFs::Core]))?;
//! ruleset
//!     .add_path_beneath_rule("/usr", &[AccessFs::ReadFile, AccessFs::ReadDir, AccessFs::Execute])?
//!     .add_path_beneath_rule("/tmp", &[AccessFs::Core])?;
//! ruleset.enforce()?;
//! # Ok::<(), sandlock_common::error::SandlockError>(())
//! ```
//!
//! Enforcement applies to the calling thread and the threads and processes
//! it creates afterwards. Other threads of the process are untouched.

pub mod abi;
pub mod kernel;
pub mod mask;
pub mod negotiate;
pub mod platform;
pub mod ruleset;
pub mod uapi;

#[cfg(test)]
pub(crate) mod fake;

pub use negotiate::negotiate_abi_version;
pub use platform::is_supported;
pub use ruleset::{Landlock, Ruleset, RulesetRequest, RulesetState};
