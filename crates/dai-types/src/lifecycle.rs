use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wall-clock instant used for every recorded event.
pub type Timestamp = DateTime<Utc>;

/// The current instant.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Lifecycle status of an archive record.
///
/// `ArchivedDeleted` and `ExemptionVoid` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveStatus {
    Queued,
    ArchivedPublic,
    ArchivedAdmin,
    ArchivedDeleted,
    ExemptionVoid,
}

impl ArchiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::ArchivedPublic => "archived-public",
            Self::ArchivedAdmin => "archived-admin",
            Self::ArchivedDeleted => "archived-deleted",
            Self::ExemptionVoid => "exemption-void",
        }
    }

    /// Returns `true` if no transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ArchivedDeleted | Self::ExemptionVoid)
    }

    /// Returns `true` for the two visible archived states.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ArchivedPublic | Self::ArchivedAdmin)
    }

    /// The status an active record enters for the given visibility.
    pub fn for_visibility(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => Self::ArchivedPublic,
            Visibility::Admin => Self::ArchivedAdmin,
        }
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may see an archived record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Admin,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Public => Self::Admin,
            Self::Admin => Self::Public,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "admin" => Ok(Self::Admin),
            other => Err(TypeError::UnknownVariant {
                kind: "visibility",
                value: other.to_string(),
            }),
        }
    }
}

/// Compliance bucket derived from the classification timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceCategory {
    /// Classified before the configured deadline; eligible for exemption.
    PreDeadline,
    /// Classified on or after the deadline, or forcibly downgraded.
    PostDeadline,
}

impl ComplianceCategory {
    /// Bucket a classification instant against a deadline.
    pub fn classify(classified_at: Timestamp, deadline: Timestamp) -> Self {
        if classified_at < deadline {
            Self::PreDeadline
        } else {
            Self::PostDeadline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreDeadline => "pre-deadline",
            Self::PostDeadline => "post-deadline",
        }
    }
}

impl fmt::Display for ComplianceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stated purpose for keeping an archived resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveReason {
    Reference,
    Research,
    Recordkeeping,
    /// Requires a free-text description.
    Other,
}

impl ArchiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Research => "research",
            Self::Recordkeeping => "recordkeeping",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ArchiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveReason {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Self::Reference),
            "research" => Ok(Self::Research),
            "recordkeeping" => Ok(Self::Recordkeeping),
            "other" => Ok(Self::Other),
            other => Err(TypeError::UnknownVariant {
                kind: "archive reason",
                value: other.to_string(),
            }),
        }
    }
}
