//! ABI capability table and filter.
//!
//! Every concrete access kind has exactly one entry: its bit position and
//! the ABI generation that introduced it. Filtering against the negotiated
//! version is the only way kinds reach the encoder, so a ruleset never
//! names a bit the running kernel would reject.
//!
//! | ABI | Kernel | Introduced |
//! |-----|--------|------------|
//! | 1 | 5.13 | filesystem `execute` .. `make-sym` |
//! | 2 | 5.19 | `refer` |
//! | 3 | 6.2  | `truncate` |
//! | 4 | 6.7  | `bind-tcp`, `connect-tcp` |
//! | 5 | 6.10 | `ioctl-dev` |
//! | 6 | 6.12 | `abstract-unix-socket`, `signal` scopes |

use std::collections::BTreeSet;
use std::fmt;

use sandlock_common::types::{AbiVersion, AccessFs, AccessNet, Category, Scope};

/// One row of the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability<K> {
    /// The access kind.
    pub kind: K,
    /// Bit position in the category's mask.
    pub bit: u32,
    /// First ABI generation recognising the kind.
    pub since: AbiVersion,
}

const fn cap<K>(kind: K, bit: u32, since: AbiVersion) -> Capability<K> {
    Capability { kind, bit, since }
}

/// Filesystem rows, in canonical order.
pub const FS_TABLE: &[Capability<AccessFs>] = &[
    cap(AccessFs::Execute, 0, AbiVersion::V1),
    cap(AccessFs::WriteFile, 1, AbiVersion::V1),
    cap(AccessFs::ReadFile, 2, AbiVersion::V1),
    cap(AccessFs::ReadDir, 3, AbiVersion::V1),
    cap(AccessFs::RemoveDir, 4, AbiVersion::V1),
    cap(AccessFs::RemoveFile, 5, AbiVersion::V1),
    cap(AccessFs::MakeChar, 6, AbiVersion::V1),
    cap(AccessFs::MakeDir, 7, AbiVersion::V1),
    cap(AccessFs::MakeReg, 8, AbiVersion::V1),
    cap(AccessFs::MakeSock, 9, AbiVersion::V1),
    cap(AccessFs::MakeFifo, 10, AbiVersion::V1),
    cap(AccessFs::MakeBlock, 11, AbiVersion::V1),
    cap(AccessFs::MakeSym, 12, AbiVersion::V1),
    cap(AccessFs::Refer, 13, AbiVersion::V2),
    cap(AccessFs::Truncate, 14, AbiVersion::V3),
    cap(AccessFs::IoctlDev, 15, AbiVersion::V5),
];

/// Network rows, in canonical order.
pub const NET_TABLE: &[Capability<AccessNet>] = &[
    cap(AccessNet::BindTcp, 0, AbiVersion::V4),
    cap(AccessNet::ConnectTcp, 1, AbiVersion::V4),
];

/// Scope rows, in canonical order.
pub const SCOPE_TABLE: &[Capability<Scope>] = &[
    cap(Scope::AbstractUnixSocket, 0, AbiVersion::V6),
    cap(Scope::Signal, 1, AbiVersion::V6),
];

/// A symbolic access kind belonging to one restriction category.
pub trait AccessKind: Copy + Ord + fmt::Debug + fmt::Display + 'static {
    /// Category the kind belongs to.
    const CATEGORY: Category;

    /// The category's capability table, in canonical order.
    fn table() -> &'static [Capability<Self>];

    /// Concrete kinds this value stands for. Aliases expand to several;
    /// a kind without a table entry expands to none.
    fn expand(self) -> Vec<Self> {
        Self::entry(self).map(|c| vec![c.kind]).unwrap_or_default()
    }

    /// Table entry of a concrete kind.
    fn entry(self) -> Option<&'static Capability<Self>> {
        Self::table().iter().find(|c| c.kind == self)
    }

    /// Minimum ABI version of a concrete kind. `None` means the kind is
    /// never supported directly.
    fn min_abi(self) -> Option<AbiVersion> {
        Self::entry(self).map(|c| c.since)
    }
}

impl AccessKind for AccessFs {
    const CATEGORY: Category = Category::Filesystem;

    fn table() -> &'static [Capability<Self>] {
        FS_TABLE
    }

    fn expand(self) -> Vec<Self> {
        if self == Self::Core {
            return Self::CORE.to_vec();
        }
        Self::entry(self).map(|c| vec![c.kind]).unwrap_or_default()
    }
}

impl AccessKind for AccessNet {
    const CATEGORY: Category = Category::Network;

    fn table() -> &'static [Capability<Self>] {
        NET_TABLE
    }
}

impl AccessKind for Scope {
    const CATEGORY: Category = Category::Scope;

    fn table() -> &'static [Capability<Self>] {
        SCOPE_TABLE
    }
}

/// Keeps only the requested kinds the given ABI supports.
///
/// Aliases are expanded first. The result follows the table's canonical
/// order, never the request order, and contains no duplicates.
pub fn filter<K: AccessKind>(requested: &[K], abi: AbiVersion) -> Vec<K> {
    let wanted: BTreeSet<K> = requested.iter().flat_map(|k| k.expand()).collect();
    K::table()
        .iter()
        .filter(|c| c.since <= abi && wanted.contains(&c.kind))
        .map(|c| c.kind)
        .collect()
}

/// Every kind of the category the given ABI supports.
pub fn supported<K: AccessKind>(abi: AbiVersion) -> Vec<K> {
    K::table()
        .iter()
        .filter(|c| c.since <= abi)
        .map(|c| c.kind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_versions() -> impl Iterator<Item = AbiVersion> {
        (1..=AbiVersion::LATEST.get()).map(AbiVersion::new)
    }

    #[test]
    fn filter_matches_table_for_every_version() {
        for abi in all_versions() {
            let kept = filter(AccessFs::ALL, abi);
            for kind in AccessFs::ALL {
                let since = kind.min_abi().expect("concrete kind has an entry");
                assert_eq!(kept.contains(kind), since <= abi, "{kind} at ABI {abi}");
            }

            let kept = filter(AccessNet::ALL, abi);
            assert_eq!(kept.len(), if abi >= AbiVersion::V4 { 2 } else { 0 });

            let kept = filter(Scope::ALL, abi);
            assert_eq!(kept.len(), if abi >= AbiVersion::V6 { 2 } else { 0 });
        }
    }

    #[test]
    fn core_expands_to_abi1_set() {
        assert_eq!(filter(&[AccessFs::Core], AbiVersion::V1), AccessFs::CORE);
        assert_eq!(filter(&[AccessFs::Core], AbiVersion::V6), AccessFs::CORE);
        assert_eq!(AccessFs::Core.min_abi(), None);
        assert_eq!(supported::<AccessFs>(AbiVersion::V1), AccessFs::CORE);
    }

    #[test]
    fn output_is_canonical_not_insertion_order() {
        let kept = filter(
            &[AccessFs::Truncate, AccessFs::ReadDir, AccessFs::Execute, AccessFs::ReadDir],
            AbiVersion::V3,
        );
        assert_eq!(kept, vec![AccessFs::Execute, AccessFs::ReadDir, AccessFs::Truncate]);
    }

    #[test]
    fn unsupported_kinds_are_dropped_silently() {
        let kept = filter(&[AccessFs::IoctlDev, AccessFs::Refer], AbiVersion::V4);
        assert_eq!(kept, vec![AccessFs::Refer]);
        assert!(filter::<Scope>(&[], AbiVersion::V6).is_empty());
    }

    #[test]
    fn versions_beyond_table_keep_everything() {
        let future = AbiVersion::new(9);
        assert_eq!(filter(AccessFs::ALL, future), AccessFs::ALL);
        assert_eq!(supported::<Scope>(future), Scope::ALL);
    }

    #[test]
    fn table_covers_every_concrete_kind_once() {
        assert_eq!(FS_TABLE.len(), AccessFs::ALL.len());
        for (row, kind) in FS_TABLE.iter().zip(AccessFs::ALL) {
            assert_eq!(row.kind, *kind);
        }
        let bits: BTreeSet<u32> = FS_TABLE.iter().map(|c| c.bit).collect();
        assert_eq!(bits.len(), FS_TABLE.len());
    }
}
