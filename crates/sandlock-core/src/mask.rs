//! Mask encoder.
//!
//! Positions come from the capability table and are never reassigned
//! across ABI versions. Callers filter before encoding; see
//! [`crate::abi::filter`].

use crate::abi::AccessKind;

/// Folds a sequence of kinds into the category's packed bitmask.
///
/// Empty input yields zero. Order and duplicates do not matter.
pub fn encode<K: AccessKind>(kinds: &[K]) -> u64 {
    kinds
        .iter()
        .flat_map(|k| k.expand())
        .filter_map(K::entry)
        .fold(0, |mask, c| mask | (1u64 << c.bit))
}

/// Lists the kinds whose bits are set in `mask`, in canonical order.
pub fn decode<K: AccessKind>(mask: u64) -> Vec<K> {
    K::table()
        .iter()
        .filter(|c| mask & (1u64 << c.bit) != 0)
        .map(|c| c.kind)
        .collect()
}
