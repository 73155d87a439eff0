use chrono::DateTime;
use dai_types::Timestamp;
use serde::{Deserialize, Serialize};

/// 2026-04-24T00:00:00Z.
const DEFAULT_DEADLINE_SECS: i64 = 1_776_988_800;

/// Configuration for the archive lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Records classified strictly before this instant are pre-deadline.
    pub deadline: Timestamp,
    /// Permit archiving file assets that still have live usages.
    pub allow_in_use_archiving: bool,
    /// URL schemes accepted for manual entries. Site-relative paths are
    /// always accepted.
    pub manual_url_schemes: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            deadline: DateTime::from_timestamp(DEFAULT_DEADLINE_SECS, 0).unwrap_or_default(),
            allow_in_use_archiving: false,
            manual_url_schemes: vec!["http".into(), "https".into()],
        }
    }
}

impl ArchiveConfig {
    /// Default settings with a different deadline.
    pub fn with_deadline(deadline: Timestamp) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadline() {
        let c = ArchiveConfig::default();
        assert_eq!(c.deadline.to_rfc3339(), "2026-04-24T00:00:00+00:00");
        assert!(!c.allow_in_use_archiving);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: ArchiveConfig =
            serde_json::from_str(r#"{"allow_in_use_archiving": true}"#).unwrap();
        assert!(c.allow_in_use_archiving);
        assert_eq!(c.manual_url_schemes, vec!["http", "https"]);
    }
}
