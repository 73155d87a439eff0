//! Inventory row types.

use dai_types::{AssetId, EmbedMethod, EntityRef, MediaCategory, OrphanReason, OriginKind};
use serde::{Deserialize, Serialize};

/// One unique asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub name: String,
    pub origin: OriginKind,
    pub category: MediaCategory,
    /// Byte size; unknown for remote and external references.
    pub size: Option<u64>,
    /// Canonical location string.
    pub location: String,
    pub mime: Option<String>,
    /// Managed-file registry id, for registered files.
    pub file_id: Option<u64>,
    /// `true` while the row belongs to an unpromoted staging generation.
    #[serde(default)]
    pub staged: bool,
}

impl AssetRecord {
    /// Fold another observation of the same asset into this record.
    ///
    /// The more authoritative origin wins, and its metadata takes precedence;
    /// otherwise known values are never replaced by unknown ones.
    pub fn merge(&mut self, other: AssetRecord) {
        debug_assert_eq!(self.id, other.id);
        if other.origin < self.origin {
            let prior = std::mem::replace(self, other);
            self.size = self.size.or(prior.size);
            self.mime = self.mime.take().or(prior.mime);
            self.file_id = self.file_id.or(prior.file_id);
            self.staged = self.staged || prior.staged;
        } else {
            self.size = self.size.or(other.size);
            self.mime = self.mime.take().or(other.mime);
            self.file_id = self.file_id.or(other.file_id);
        }
    }
}

/// Identity of a usage row: one per asset, root entity and field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageKey {
    pub asset: AssetId,
    pub root: EntityRef,
    pub field: String,
}

/// A reachable reference from a live root entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub asset: AssetId,
    pub root: EntityRef,
    pub field: String,
    pub method: EmbedMethod,
    pub occurrences: u32,
}

impl UsageRecord {
    pub fn key(&self) -> UsageKey {
        UsageKey {
            asset: self.asset,
            root: self.root.clone(),
            field: self.field.clone(),
        }
    }
}

/// Identity of an orphan row: one per asset and source entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrphanKey {
    pub asset: AssetId,
    pub source: EntityRef,
}

/// A reference whose host does not resolve to a live root.
///
/// Never counts as usage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReference {
    pub asset: AssetId,
    /// The entity the reference was found in.
    pub source: EntityRef,
    pub field: String,
    pub method: EmbedMethod,
    pub reason: OrphanReason,
    /// The entity whose parent link failed.
    pub broken_at: EntityRef,
}

impl OrphanReference {
    pub fn key(&self) -> OrphanKey {
        OrphanKey {
            asset: self.asset,
            source: self.source.clone(),
        }
    }
}

/// How an asset is used in the live inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageClass {
    /// At least one reachable usage.
    InUse,
    /// Only orphan references.
    OrphanOnly,
    Unused,
}

impl UsageClass {
    pub fn from_counts(usages: usize, orphans: usize) -> Self {
        match (usages, orphans) {
            (0, 0) => Self::Unused,
            (0, _) => Self::OrphanOnly,
            _ => Self::InUse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InUse => "in-use",
            Self::OrphanOnly => "orphan-only",
            Self::Unused => "unused",
        }
    }
}

impl std::fmt::Display for UsageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
