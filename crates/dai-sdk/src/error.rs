use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("invalid reference: {0}")]
    Normalize(#[from] dai_normalize::NormalizeError),

    #[error("scan error: {0}")]
    Scan(#[from] dai_scan::ScanError),

    #[error("inventory error: {0}")]
    Inventory(#[from] dai_inventory::InventoryError),

    #[error("content graph error: {0}")]
    Graph(#[from] dai_graph::GraphError),

    #[error("archive error: {0}")]
    Archive(#[from] dai_archive::ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
