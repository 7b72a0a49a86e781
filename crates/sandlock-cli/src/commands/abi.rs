//! `sandlock abi` — Show the Landlock ABI of the running kernel.

use clap::Args;
use sandlock_common::config::SandlockConfig;
use sandlock_common::types::{AbiVersion, AccessFs, AccessNet, Scope};
use sandlock_core::Landlock;
use sandlock_core::abi::{AccessKind, supported};
use sandlock_core::mask;
use serde::Serialize;

use crate::output::{format_kinds, format_mask};

/// Arguments for the `abi` command.
#[derive(Args, Debug)]
pub struct AbiArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// What the running kernel supports, per category.
#[derive(Debug, Serialize)]
pub struct AbiReport {
    /// Negotiated ABI version.
    pub abi: AbiVersion,
    /// Supported filesystem kinds.
    pub filesystem: Vec<AccessFs>,
    /// Supported network kinds.
    pub network: Vec<AccessNet>,
    /// Supported scopes.
    pub scope: Vec<Scope>,
}

impl AbiReport {
    /// Builds the report for `abi` from the capability table.
    #[must_use]
    pub fn for_abi(abi: AbiVersion) -> Self {
        Self {
            abi,
            filesystem: supported(abi),
            network: supported(abi),
            scope: supported(abi),
        }
    }
}

fn print_row<K: AccessKind>(kinds: &[K]) {
    println!(
        "{:<12} {:<8} {}",
        K::CATEGORY.to_string(),
        format_mask(mask::encode(kinds)),
        format_kinds(kinds)
    );
}

/// Executes the `abi` command.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or the kernel probe
/// fails.
pub fn execute(args: &AbiArgs, config: SandlockConfig) -> anyhow::Result<()> {
    let landlock = Landlock::with_config(config);
    let report = AbiReport::for_abi(landlock.negotiate_abi_version()?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("landlock ABI {}", report.abi);
    if report.abi > AbiVersion::LATEST {
        println!("(newer than ABI {}; extra kinds are not used)", AbiVersion::LATEST);
    }
    println!("{:<12} {:<8} KINDS", "CATEGORY", "MASK");
    print_row(&report.filesystem);
    print_row(&report.network);
    print_row(&report.scope);
    Ok(())
}
