//! Formatted output helpers for CLI commands.

use std::fmt::Display;

/// Joins kind names with commas, or `-` when there are none.
#[must_use]
pub fn format_kinds<K: Display>(kinds: &[K]) -> String {
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a kernel mask as fixed-width hex.
#[must_use]
pub fn format_mask(mask: u64) -> String {
    format!("{mask:#06x}")
}
