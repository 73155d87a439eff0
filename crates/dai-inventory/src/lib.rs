//! Staged inventory generations for the digital asset inventory.
//!
//! A scan never edits the live inventory. It writes a complete new
//! [`Generation`] into staging and, once every phase has finished, the
//! [`SwapManager`] replaces the live generation in one step. Cancellation,
//! timeouts and fatal source errors all discard staging instead, so readers
//! only ever see the previous scan or the next one.
//!
//! # Key Types
//!
//! - [`AssetRecord`] -- one row per distinct asset identity
//! - [`UsageRecord`] -- a reachable use of an asset, attributed to its root
//! - [`OrphanReference`] -- a reference from a component cut off from any root
//! - [`Generation`] -- an immutable set of the three row kinds
//! - [`ScanCoordinator`] -- runs the five phases with a single writer
//!
//! # Design Rules
//!
//! 1. At most one scan writes at a time.
//! 2. Usage is counted only for live roots; orphans never count as usage.
//! 3. One orphan row per (asset, source) per generation.
//! 4. Retired rows go dependents first: orphans, usages, assets.

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod generation;
pub mod memory;
pub mod record;
pub mod session;
pub mod swap;
pub mod traits;

pub use builder::{BuildStats, Ingested, InventoryBuilder};
pub use coordinator::{ScanCoordinator, ScanSources};
pub use error::{InventoryError, InventoryResult};
pub use generation::{Generation, GenerationStats};
pub use memory::InMemoryInventoryStore;
pub use record::{AssetRecord, OrphanKey, OrphanReference, UsageClass, UsageKey, UsageRecord};
pub use session::{ScanHandle, ScanSession, ScanStatus};
pub use swap::SwapManager;
pub use traits::{InventoryStore, SwapSummary};
