//! High-level SDK for the digital asset inventory.
//!
//! [`Dai`] wires the normalizer, content graph, scanners, inventory and
//! archive lifecycle together over a [`SiteSnapshot`]. It is the main entry
//! point for applications embedding the inventory.

pub mod config;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod state;

pub use config::EngineConfig;
pub use engine::{AssetUsage, Dai, ScanTask};
pub use error::{SdkError, SdkResult};
pub use snapshot::{FileRoot, SiteSnapshot};
pub use state::EngineState;

// Re-export key types
pub use dai_archive::{ArchiveRecord, ArchiveService, IntegrityCheck, ManualEdit, ManualEntry, QueueRequest};
pub use dai_inventory::{Generation, ScanHandle, ScanStatus, SwapSummary, UsageClass};
pub use dai_types::{ArchiveId, ArchiveReason, ArchiveStatus, AssetId, EntityRef, Visibility};
