//! `sandlock exec` — Run a command confined by a Landlock ruleset.
//!
//! Every filesystem kind the kernel supports is handled, so anything not
//! granted with `--ro`/`--rw` is denied. TCP is handled only when a port
//! flag or `--no-net` is given.

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use clap::Args;
use sandlock_common::config::SandlockConfig;
use sandlock_common::types::{AbiVersion, AccessFs, AccessNet, Scope};
use sandlock_core::{Landlock, RulesetRequest};

/// Kinds valid on a regular file for a read-only grant.
const FILE_READ: &[AccessFs] = &[AccessFs::Execute, AccessFs::ReadFile];

/// Kinds valid on a regular file for a read-write grant.
const FILE_WRITE: &[AccessFs] = &[
    AccessFs::Execute,
    AccessFs::ReadFile,
    AccessFs::WriteFile,
    AccessFs::Truncate,
    AccessFs::IoctlDev,
];

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Grant read and execute access beneath PATH.
    #[arg(long = "ro", value_name = "PATH")]
    pub read_only: Vec<PathBuf>,

    /// Grant full access beneath PATH.
    #[arg(long = "rw", value_name = "PATH")]
    pub read_write: Vec<PathBuf>,

    /// Allow binding TCP PORT (handles TCP).
    #[arg(long, value_name = "PORT")]
    pub bind: Vec<u16>,

    /// Allow connecting to TCP PORT (handles TCP).
    #[arg(long, value_name = "PORT")]
    pub connect: Vec<u16>,

    /// Deny all TCP bind/connect.
    #[arg(long)]
    pub no_net: bool,

    /// Restrict an IPC scope: `signal` or `abstract-unix-socket`.
    #[arg(long = "scope", value_name = "KIND")]
    pub scopes: Vec<Scope>,

    /// Command and arguments to run.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl ExecArgs {
    fn handles_net(&self) -> bool {
        self.no_net || !self.bind.is_empty() || !self.connect.is_empty()
    }

    fn request(&self) -> RulesetRequest {
        let mut request = RulesetRequest::new().handle_fs(AccessFs::ALL);
        if self.handles_net() {
            request = request.handle_net(AccessNet::ALL);
        }
        if !self.scopes.is_empty() {
            request = request.scope(&self.scopes);
        }
        request
    }
}

/// Access kinds to grant on `path`. Directory-only kinds are rejected by
/// the kernel on non-directories.
fn grant_for(path: &Path, writable: bool) -> &'static [AccessFs] {
    let is_dir = path.is_dir();
    match (is_dir, writable) {
        (true, true) => AccessFs::ALL,
        (true, false) => AccessFs::READ,
        (false, true) => FILE_WRITE,
        (false, false) => FILE_READ,
    }
}

/// Executes the `exec` command.
///
/// Only returns on failure: on success the process image is replaced by
/// the confined command.
///
/// # Errors
///
/// Returns an error if Landlock is unavailable, a rule cannot be added,
/// enforcement fails, or the command cannot be executed.
pub fn execute(args: &ExecArgs, config: SandlockConfig) -> anyhow::Result<()> {
    let landlock = Landlock::with_config(config);
    let abi = landlock
        .negotiate_abi_version()
        .context("landlock is not available on this system")?;

    let mut ruleset = landlock.create_ruleset(&args.request())?;
    for path in &args.read_only {
        let _ = ruleset.add_path_beneath_rule(path, grant_for(path, false))?;
    }
    for path in &args.read_write {
        let _ = ruleset.add_path_beneath_rule(path, grant_for(path, true))?;
    }

    if abi >= AbiVersion::V4 {
        for port in &args.bind {
            let _ = ruleset.add_net_port_rule(*port, &[AccessNet::BindTcp])?;
        }
        for port in &args.connect {
            let _ = ruleset.add_net_port_rule(*port, &[AccessNet::ConnectTcp])?;
        }
    } else if args.handles_net() {
        tracing::warn!(%abi, "kernel cannot restrict TCP; network stays unrestricted");
    }

    ruleset.enforce()?;

    let (program, rest) = args.command.split_first().context("no command given")?;
    let err = Command::new(program).args(rest).exec();
    Err(err).with_context(|| format!("failed to execute {program}"))
}
