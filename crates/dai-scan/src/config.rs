use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::denylist::DEFAULT_DENY_FRAGMENTS;
use crate::retry::RetryPolicy;
use crate::scanner::ScanPhase;

/// Default cap on parent hops during reachability resolution.
pub const DEFAULT_PARENT_DEPTH: usize = 32;

/// Records fetched per chunk, per source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSizes {
    pub managed_files: usize,
    pub loose_files: usize,
    pub content_fields: usize,
    pub remote_media: usize,
    pub menu_links: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            managed_files: 50,
            loose_files: 100,
            content_fields: 10,
            remote_media: 50,
            menu_links: 50,
        }
    }
}

impl BatchSizes {
    /// Batch size for a phase. Never zero.
    pub fn for_phase(&self, phase: ScanPhase) -> usize {
        let size = match phase {
            ScanPhase::ManagedFiles => self.managed_files,
            ScanPhase::LooseFiles => self.loose_files,
            ScanPhase::ContentFields => self.content_fields,
            ScanPhase::RemoteMedia => self.remote_media,
            ScanPhase::MenuLinks => self.menu_links,
        };
        size.max(1)
    }
}

/// Scan configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub batch: BatchSizes,
    /// Path fragments of system-generated files that are never inventoried.
    pub deny_list: Vec<String>,
    /// Retries per source read before a transient error becomes fatal.
    pub max_retries: u32,
    /// Base delay between retries; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    pub max_parent_depth: usize,
    /// Wall-clock limit for a whole scan. `None` disables the limit.
    pub timeout_secs: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch: BatchSizes::default(),
            deny_list: DEFAULT_DENY_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
            max_retries: 3,
            retry_backoff_ms: 250,
            max_parent_depth: DEFAULT_PARENT_DEPTH,
            timeout_secs: None,
        }
    }
}

impl ScanConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_sources_use_smaller_batches() {
        let b = BatchSizes::default();
        assert!(b.for_phase(ScanPhase::ContentFields) < b.for_phase(ScanPhase::ManagedFiles));
        assert_eq!(b.for_phase(ScanPhase::LooseFiles), 100);
    }

    #[test]
    fn zero_batch_is_clamped() {
        let b = BatchSizes {
            menu_links: 0,
            ..BatchSizes::default()
        };
        assert_eq!(b.for_phase(ScanPhase::MenuLinks), 1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ScanConfig = serde_json::from_str(r#"{"max_retries": 7}"#).unwrap();
        assert_eq!(cfg.max_retries, 7);
        assert_eq!(cfg.batch, BatchSizes::default());
        assert!(cfg.deny_list.iter().any(|f| f == "styles/"));
        assert_eq!(cfg.timeout(), None);
    }
}
