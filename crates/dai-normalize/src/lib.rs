//! Path/URL normalization for the digital asset inventory.
//!
//! Raw references come in many spellings: absolute URLs on the site's own
//! host, site-relative paths, storage-scheme URIs (`public://`, `private://`),
//! protocol-relative URLs, and external URLs. The [`Normalizer`] reduces every
//! spelling to one canonical location string, from which the asset identity
//! ([`dai_types::AssetId`]) is derived.
//!
//! This crate is pure: no I/O, no logging, no shared state.
//!
//! # Outcomes
//!
//! - `Ok(Some(reference))` -- a classifiable asset reference
//! - `Ok(None)` -- not an asset (internal page link, `mailto:`, unknown file type)
//! - `Err(_)` -- the raw string is malformed and the record should be skipped

pub mod category;
pub mod config;
pub mod error;
pub mod normalizer;

pub use category::{classify_extension, classify_mime, classify_url_pattern, extension_of};
pub use config::NormalizerConfig;
pub use error::{NormalizeError, NormalizeResult};
pub use normalizer::{Location, NormalizedReference, Normalizer, StorageScheme};
