//! Foundation types for the digital asset inventory (DAI).
//!
//! Every other DAI crate depends on `dai-types`. The types here carry no
//! behavior beyond identity, formatting, and parsing.
//!
//! # Key Types
//!
//! - [`AssetId`] -- Canonical asset identity (BLAKE3 of the canonical location)
//! - [`ArchiveId`] -- UUID v7 archive record identifier
//! - [`EntityRef`] -- `(entity type, id)` pair addressing a content entity
//! - [`OriginKind`] -- Where an asset was discovered
//! - [`MediaCategory`] -- Derived media classification
//! - [`EmbedMethod`] -- How a host entity references an asset
//! - [`OrphanReason`] -- Why a sighting did not resolve to a live root
//! - [`ArchiveStatus`], [`Visibility`], [`ComplianceCategory`], [`ArchiveReason`] --
//!   Archive lifecycle vocabulary
//! - [`Timestamp`] -- UTC instant used for every recorded event

pub mod archive_id;
pub mod asset;
pub mod entity;
pub mod error;
pub mod lifecycle;

pub use archive_id::ArchiveId;
pub use asset::{AssetId, EmbedMethod, MediaCategory, OriginKind, OrphanReason};
pub use entity::EntityRef;
pub use error::TypeError;
pub use lifecycle::{now, ArchiveReason, ArchiveStatus, ComplianceCategory, Timestamp, Visibility};
