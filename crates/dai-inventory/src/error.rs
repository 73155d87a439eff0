use dai_graph::GraphError;
use dai_scan::ScanError;

/// Errors from inventory storage and building.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A staging generation is already open.
    #[error("staging generation {0} is already open")]
    StagingOpen(u64),

    /// No staging generation is open.
    #[error("no staging generation is open")]
    NoStaging,

    /// The content graph could not be read.
    #[error("content graph error: {0}")]
    Graph(#[from] GraphError),

    /// A lock guarding inventory state was poisoned.
    #[error("inventory lock poisoned")]
    LockPoisoned,

    /// Backend failure.
    #[error("inventory backend error: {0}")]
    Backend(String),
}

impl From<InventoryError> for ScanError {
    fn from(value: InventoryError) -> Self {
        ScanError::Fatal(value.to_string())
    }
}

/// Result alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
