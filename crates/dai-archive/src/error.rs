use dai_types::{ArchiveId, ArchiveStatus, AssetId};

/// Errors produced by archive lifecycle operations.
///
/// Every error leaves the record exactly as it was: actions never apply
/// partially.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The action is not allowed from the record's current status.
    #[error("cannot {action} archive record {id} in status {status}")]
    InvalidTransition {
        id: ArchiveId,
        status: ArchiveStatus,
        action: &'static str,
    },

    /// The caller acted on an outdated copy of the record.
    #[error("archive record {id} is at version {actual}, expected {expected}")]
    StaleVersion {
        id: ArchiveId,
        expected: u64,
        actual: u64,
    },

    /// Malformed input to an archive action.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("archive record {0} not found")]
    NotFound(ArchiveId),

    /// The asset still has live usages and in-use archiving is disabled.
    #[error("asset {} is still used in {usages} place(s)", .asset.short_hex())]
    InUse { asset: AssetId, usages: usize },

    /// The archive store or the live inventory could not be read or written.
    #[error("archive store error: {0}")]
    Store(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
