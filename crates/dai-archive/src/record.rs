//! Archive records and their append-only notes.

use std::fmt;

use dai_types::{
    ArchiveId, ArchiveReason, ArchiveStatus, AssetId, ComplianceCategory, MediaCategory, Timestamp,
    Visibility,
};
use serde::{Deserialize, Serialize};

/// Kind of a manually entered resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManualKind {
    /// A page on this site.
    Page,
    /// A resource on another site.
    External,
}

impl ManualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::External => "external",
        }
    }
}

/// What an archive record is about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ArchiveTarget {
    /// A file asset from the live inventory.
    Asset {
        asset: AssetId,
        location: String,
        category: MediaCategory,
    },
    /// A manually entered page or URL.
    Manual { url: String, kind: ManualKind },
}

impl ArchiveTarget {
    /// Identity of the underlying resource, shared by every archival
    /// episode for it.
    pub fn subject(&self) -> AssetId {
        match self {
            Self::Asset { asset, .. } => *asset,
            Self::Manual { url, .. } => AssetId::from_location(url),
        }
    }

    /// The reference as originally given.
    pub fn reference(&self) -> &str {
        match self {
            Self::Asset { location, .. } => location,
            Self::Manual { url, .. } => url,
        }
    }

    /// Type label for reports.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Asset { category, .. } => category.as_str(),
            Self::Manual { kind, .. } => kind.as_str(),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

/// Audit warnings carried by a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningFlags {
    /// Executed while the asset still had live usages.
    pub archived_while_in_use: bool,
    /// Content changed after archiving a post-deadline record.
    pub content_modified: bool,
    /// Downgraded to post-deadline because an earlier record was voided.
    pub forced_post_deadline: bool,
}

impl WarningFlags {
    /// Names of the raised flags.
    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.archived_while_in_use {
            out.push("archived_while_in_use");
        }
        if self.content_modified {
            out.push("content_modified");
        }
        if self.forced_post_deadline {
            out.push("forced_post_deadline");
        }
        out
    }
}

/// The action that ended a record in `archived-deleted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionAction {
    Unarchived,
    UnderlyingDeleted,
    EntryRemoved,
    ContentModified,
}

impl DeletionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unarchived => "unarchived",
            Self::UnderlyingDeleted => "underlying-deleted",
            Self::EntryRemoved => "entry-removed",
            Self::ContentModified => "content-modified",
        }
    }
}

impl fmt::Display for DeletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionInfo {
    pub action: DeletionAction,
    pub at: Timestamp,
    pub actor: String,
}

/// An append-only note on a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveNote {
    pub at: Timestamp,
    pub actor: String,
    pub text: String,
}

/// One archival episode for an asset or manual entry.
///
/// Once `classified_at` is set it never changes. Terminal records accept
/// nothing but new notes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: ArchiveId,
    /// Bumped on every write; used for optimistic concurrency.
    pub version: u64,
    pub name: String,
    pub target: ArchiveTarget,
    pub status: ArchiveStatus,
    pub visibility: Option<Visibility>,
    pub reason: ArchiveReason,
    pub description: String,
    pub classified_at: Option<Timestamp>,
    pub category: Option<ComplianceCategory>,
    /// BLAKE3 hex digest of the file content at execution.
    pub checksum: Option<String>,
    pub flags: WarningFlags,
    pub created_at: Timestamp,
    pub created_by: String,
    pub updated_at: Timestamp,
    /// Actor of the most recent write.
    pub actor: String,
    pub deletion: Option<DeletionInfo>,
    #[serde(default)]
    pub notes: Vec<ArchiveNote>,
}

impl ArchiveRecord {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_manual(&self) -> bool {
        self.target.is_manual()
    }

    /// Stamp the classification time and category.
    ///
    /// Returns `false` and changes nothing if already classified.
    pub(crate) fn classify(&mut self, at: Timestamp, deadline: Timestamp) -> bool {
        if self.classified_at.is_some() {
            return false;
        }
        self.classified_at = Some(at);
        self.category = Some(if self.flags.forced_post_deadline {
            ComplianceCategory::PostDeadline
        } else {
            ComplianceCategory::classify(at, deadline)
        });
        true
    }
}

/// BLAKE3 hex digest of file content.
pub fn content_checksum(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    fn record() -> ArchiveRecord {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        ArchiveRecord {
            id: ArchiveId::new(),
            version: 1,
            name: "a.pdf".into(),
            target: ArchiveTarget::Asset {
                asset: AssetId::from_location("public://a.pdf"),
                location: "public://a.pdf".into(),
                category: MediaCategory::Document,
            },
            status: ArchiveStatus::Queued,
            visibility: None,
            reason: ArchiveReason::Reference,
            description: String::new(),
            classified_at: None,
            category: None,
            checksum: None,
            flags: WarningFlags::default(),
            created_at: now,
            created_by: "alice".into(),
            updated_at: now,
            actor: "alice".into(),
            deletion: None,
            notes: vec![],
        }
    }

    #[test]
    fn classification_is_write_once() {
        let deadline = Utc.with_ymd_and_hms(2026, 4, 24, 0, 0, 0).unwrap();
        let mut r = record();
        let first = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(r.classify(first, deadline));
        assert_eq!(r.category, Some(ComplianceCategory::PreDeadline));

        let later = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert!(!r.classify(later, deadline));
        assert_eq!(r.classified_at, Some(first));
        assert_eq!(r.category, Some(ComplianceCategory::PreDeadline));
    }

    #[test]
    fn forced_records_are_post_deadline() {
        let deadline = Utc.with_ymd_and_hms(2026, 4, 24, 0, 0, 0).unwrap();
        let mut r = record();
        r.flags.forced_post_deadline = true;
        r.classify(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), deadline);
        assert_eq!(r.category, Some(ComplianceCategory::PostDeadline));
    }

    #[test]
    fn manual_subject_is_the_url_identity() {
        let t = ArchiveTarget::Manual {
            url: "https://example.org/old".into(),
            kind: ManualKind::External,
        };
        assert_eq!(t.subject(), AssetId::from_location("https://example.org/old"));
        assert_eq!(t.type_label(), "external");
        assert!(t.is_manual());
    }

    #[test]
    fn targets_serialize_with_a_type_tag() {
        let asset = ArchiveTarget::Asset {
            asset: AssetId::from_location("public://a.pdf"),
            location: "public://a.pdf".into(),
            category: MediaCategory::Document,
        };
        let manual = ArchiveTarget::Manual {
            url: "/about".into(),
            kind: ManualKind::Page,
        };

        let json = serde_json::to_value(&manual).unwrap();
        assert_eq!(json["type"], "manual");
        assert_eq!(json["kind"], "page");
        assert_eq!(serde_json::to_value(&asset).unwrap()["type"], "asset");

        for target in [asset, manual] {
            let text = serde_json::to_string(&target).unwrap();
            let back: ArchiveTarget = serde_json::from_str(&text).unwrap();
            assert_eq!(back, target);
        }
    }

    #[test]
    fn records_survive_json() {
        let mut r = record();
        r.notes.push(ArchiveNote {
            at: r.created_at,
            actor: "bob".into(),
            text: "checked".into(),
        });
        let text = serde_json::to_string(&r).unwrap();
        assert_eq!(serde_json::from_str::<ArchiveRecord>(&text).unwrap(), r);
    }

    #[test]
    fn checksum_is_blake3_hex() {
        let sum = content_checksum(b"hello");
        assert_eq!(sum.len(), 64);
        assert_eq!(sum, content_checksum(b"hello"));
        assert_ne!(sum, content_checksum(b"hello!"));
    }

    #[test]
    fn warning_names() {
        let flags = WarningFlags {
            archived_while_in_use: true,
            forced_post_deadline: true,
            ..WarningFlags::default()
        };
        assert_eq!(flags.names(), vec!["archived_while_in_use", "forced_post_deadline"]);
    }
}
