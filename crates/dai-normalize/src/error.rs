//! Error types for reference normalization.

use thiserror::Error;

/// A raw reference that cannot be turned into a canonical location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The string looks like a URL but does not parse as one.
    #[error("malformed url {raw:?}: {reason}")]
    MalformedUrl { raw: String, reason: String },

    /// Percent-encoding in the path is invalid UTF-8.
    #[error("invalid percent-encoding in {0:?}")]
    InvalidEncoding(String),

    /// The path escapes its storage root with `..` segments.
    #[error("path traversal in {0:?}")]
    PathTraversal(String),
}

/// Convenience alias for normalization results.
pub type NormalizeResult<T> = Result<T, NormalizeError>;
