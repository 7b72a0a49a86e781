//! CLI command definitions and dispatch.

pub mod abi;
pub mod exec;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sandlock_common::config::SandlockConfig;

/// sandlock — unprivileged sandboxing with Landlock.
#[derive(Parser, Debug)]
#[command(name = "sandlock", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file (syscall number overrides).
    #[arg(long, global = true, env = "SANDLOCK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the Landlock ABI of the running kernel and what it supports.
    Abi(abi::AbiArgs),
    /// Run a command confined to the granted paths and ports.
    Exec(exec::ExecArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => SandlockConfig::load(path)?,
        None => SandlockConfig::default(),
    };
    match cli.command {
        Command::Abi(args) => abi::execute(&args, config),
        Command::Exec(args) => exec::execute(&args, config),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exec_collects_trailing_command() {
        let cli = Cli::try_parse_from([
            "sandlock", "exec", "--ro", "/usr", "--rw", "/tmp", "--connect", "443", "--",
            "/bin/ls", "-l",
        ])
        .expect("parse");
        let Command::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert_eq!(args.read_only, vec![PathBuf::from("/usr")]);
        assert_eq!(args.read_write, vec![PathBuf::from("/tmp")]);
        assert_eq!(args.connect, vec![443]);
        assert_eq!(args.command, vec!["/bin/ls", "-l"]);
    }

    #[test]
    fn exec_parses_scope_names() {
        let cli = Cli::try_parse_from([
            "sandlock", "exec", "--scope", "signal", "--scope", "abstract-unix-socket", "--",
            "true",
        ])
        .expect("parse");
        let Command::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert_eq!(args.scopes.len(), 2);
    }

    #[test]
    fn exec_rejects_unknown_scope() {
        let args = ["sandlock", "exec", "--scope", "ptrace", "--", "true"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn exec_requires_a_command() {
        assert!(Cli::try_parse_from(["sandlock", "exec", "--ro", "/usr"]).is_err());
    }
}
