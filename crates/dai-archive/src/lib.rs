//! Archive lifecycle for the digital asset inventory.
//!
//! Each archival episode is an [`ArchiveRecord`] that moves through a fixed
//! state machine:
//!
//! - `queued` (file assets only) is executed into `archived-public` or
//!   `archived-admin`, which toggle between each other
//! - unarchive, delete-underlying and remove end in `archived-deleted`
//! - a content change ends a pre-deadline record in `exemption-void` and a
//!   post-deadline record in `archived-deleted`
//!
//! # Design Rules
//!
//! 1. The classification timestamp is written once, on entry to an active
//!    state, and never recomputed.
//! 2. Terminal records reject every status or classification change. Notes
//!    may still be appended.
//! 3. Once any episode for a resource is voided, every later episode for it
//!    is post-deadline.
//! 4. The in-use gate reads live usage counts; archiving never writes to
//!    the inventory.
//! 5. Actions are all-or-nothing and checked against the record version.

pub mod config;
pub mod error;
pub mod export;
pub mod memory;
pub mod record;
pub mod service;
pub mod traits;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, ArchiveResult};
pub use export::{audit_row, write_audit_csv, AUDIT_COLUMNS};
pub use memory::InMemoryArchiveStore;
pub use record::{
    content_checksum, ArchiveNote, ArchiveRecord, ArchiveTarget, DeletionAction, DeletionInfo,
    ManualKind, WarningFlags,
};
pub use service::{ArchiveService, IntegrityCheck, ManualEdit, ManualEntry, QueueRequest};
pub use traits::{ArchiveStore, LiveInventory, StoreInventory};
