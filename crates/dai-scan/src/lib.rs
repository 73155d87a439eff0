//! Source scanners for the digital asset inventory.
//!
//! Five independent scanners each read one source of truth in bounded
//! chunks and emit candidate asset [`Sighting`]s:
//!
//! | Phase | Scanner | Source |
//! |-------|---------|--------|
//! | 1 | [`ManagedFileScanner`] | managed-file registry and file fields |
//! | 2 | [`LooseFileScanner`] | files on disk unknown to the registry |
//! | 3 | [`ContentFieldScanner`] | formatted text and link fields |
//! | 4 | [`RemoteMediaScanner`] | remote-media entities |
//! | 5 | [`MenuLinkScanner`] | navigation-menu links |
//!
//! Every raw reference passes through the [`dai_normalize::Normalizer`];
//! unclassifiable and system-generated references are dropped, malformed
//! ones are logged and skipped. Only a source that keeps failing after
//! [`RetryPolicy`] is exhausted aborts the scan.
//!
//! # Modules
//!
//! - [`scanner`] -- [`Scanner`] trait, [`SourceScanner`] chunk driver, [`ScanPhase`]
//! - [`scanners`] -- The five [`RecordScanner`] implementations
//! - [`traits`] -- [`RecordSource`] boundary; [`memory`] and [`fs`] implement it
//! - [`extract`] -- Reference extraction from markup
//! - [`denylist`] -- System-generated path filter

pub mod config;
pub mod denylist;
pub mod error;
pub mod extract;
pub mod fs;
pub mod memory;
pub mod record;
pub mod retry;
pub mod scanner;
pub mod scanners;
pub mod sighting;
pub mod traits;

pub use config::{BatchSizes, ScanConfig, DEFAULT_PARENT_DEPTH};
pub use denylist::{DenyList, DEFAULT_DENY_FRAGMENTS};
pub use error::{MalformedRecord, ScanError, ScanResult, SourceError, SourceResult};
pub use extract::{decode_entities, extract_references, ExtractedReference};
pub use fs::FilesystemSource;
pub use memory::InMemorySource;
pub use record::{ContentField, FieldUsage, FieldValue, LooseFile, ManagedFile, MenuLink, RemoteMedia};
pub use retry::RetryPolicy;
pub use scanner::{scan_all, Chunk, Chunks, Emitter, RecordScanner, ScanContext, ScanPhase, Scanner, SourceScanner};
pub use scanners::{
    ContentFieldScanner, LooseFileScanner, ManagedFileScanner, MenuLinkScanner, RemoteMediaScanner,
    MENU_LINK_FIELD,
};
pub use sighting::{AssetMeta, HostSlot, Sighting};
pub use traits::{RecordSource, SourceRecord};
