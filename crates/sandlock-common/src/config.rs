//! Configuration model for the sandlock runtime.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    SYS_LANDLOCK_ADD_RULE, SYS_LANDLOCK_CREATE_RULESET, SYS_LANDLOCK_RESTRICT_SELF,
};
use crate::error::{Result, SandlockError};

/// Syscall numbers used to reach the Landlock primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyscallNumbers {
    /// Number of `landlock_create_ruleset`.
    pub create_ruleset: i64,
    /// Number of `landlock_add_rule`.
    pub add_rule: i64,
    /// Number of `landlock_restrict_self`.
    pub restrict_self: i64,
}

impl Default for SyscallNumbers {
    fn default() -> Self {
        Self {
            create_ruleset: SYS_LANDLOCK_CREATE_RULESET,
            add_rule: SYS_LANDLOCK_ADD_RULE,
            restrict_self: SYS_LANDLOCK_RESTRICT_SELF,
        }
    }
}

/// Root configuration for sandlock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandlockConfig {
    /// Explicit syscall numbers. When set, the platform check accepts any
    /// Linux architecture.
    pub syscalls: Option<SyscallNumbers>,
}

impl SandlockConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// names a non-positive syscall number.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| SandlockError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that configured values can be handed to the kernel.
    ///
    /// # Errors
    ///
    /// Returns [`SandlockError::Config`] for a non-positive syscall number.
    pub fn validate(&self) -> Result<()> {
        if let Some(nr) = &self.syscalls {
            for (name, value) in [
                ("create_ruleset", nr.create_ruleset),
                ("add_rule", nr.add_rule),
                ("restrict_self", nr.restrict_self),
            ] {
                if value <= 0 {
                    return Err(SandlockError::Config {
                        message: format!("syscall number {name} must be positive, got {value}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Syscall numbers in effect: the configured ones or the generic table.
    #[must_use]
    pub fn syscall_numbers(&self) -> SyscallNumbers {
        self.syscalls.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_generic_table() {
        let config = SandlockConfig::default();
        assert_eq!(config.syscall_numbers().create_ruleset, 444);
        assert_eq!(config.syscall_numbers().restrict_self, 446);
    }

    #[test]
    fn load_reads_explicit_numbers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sandlock.json");
        std::fs::write(
            &path,
            r#"{"syscalls":{"create_ruleset":554,"add_rule":555,"restrict_self":556}}"#,
        )
        .expect("write config");

        let config = SandlockConfig::load(&path).expect("should load");
        assert_eq!(config.syscall_numbers().add_rule, 555);
    }

    #[test]
    fn load_rejects_negative_number() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"syscalls":{"create_ruleset":-1,"add_rule":445,"restrict_self":446}}"#,
        )
        .expect("write config");

        let err = SandlockConfig::load(&path).unwrap_err();
        assert!(matches!(err, SandlockError::Config { .. }), "got: {err}");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = SandlockConfig::load(Path::new("/nonexistent/sandlock.json")).unwrap_err();
        assert!(matches!(err, SandlockError::Io { .. }));
    }

    #[test]
    fn empty_object_is_default() {
        let config: SandlockConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, SandlockConfig::default());
    }
}
