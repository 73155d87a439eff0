//! Error types for content graph access.

/// Failures of the graph backend itself.
///
/// Resolution outcomes (reachable, orphaned, not found) are never errors;
/// they are variants of [`crate::Reachability`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The backend could not answer right now; the caller may retry.
    #[error("content graph unavailable: {0}")]
    Unavailable(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("content graph lock poisoned")]
    LockPoisoned,
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
