use std::sync::Arc;

use dai_inventory::{AssetRecord, InventoryStore};
use dai_types::{ArchiveId, AssetId};

use crate::error::{ArchiveError, ArchiveResult};
use crate::record::ArchiveRecord;

/// Storage for archive records.
///
/// Implementations must satisfy:
/// - Records are never deleted.
/// - [`insert`](Self::insert) rejects an id that already exists.
/// - [`update`](Self::update) succeeds only if the stored version equals
///   `expected`, and stores the record with version `expected + 1`.
pub trait ArchiveStore: Send + Sync {
    fn get(&self, id: &ArchiveId) -> ArchiveResult<Option<ArchiveRecord>>;

    fn insert(&self, record: ArchiveRecord) -> ArchiveResult<()>;

    /// Compare-and-swap write. Returns the stored record.
    fn update(&self, record: ArchiveRecord, expected: u64) -> ArchiveResult<ArchiveRecord>;

    /// Every record, oldest first.
    fn list(&self) -> ArchiveResult<Vec<ArchiveRecord>>;

    /// Every record for one underlying resource, oldest first.
    fn history(&self, subject: &AssetId) -> ArchiveResult<Vec<ArchiveRecord>>;
}

/// Read-only view of the live inventory used by archive gating.
pub trait LiveInventory: Send + Sync {
    fn asset(&self, id: &AssetId) -> ArchiveResult<Option<AssetRecord>>;

    /// Number of live usage slots for an asset.
    fn usage_count(&self, id: &AssetId) -> ArchiveResult<usize>;
}

/// [`LiveInventory`] over an [`InventoryStore`]'s live generation.
#[derive(Clone)]
pub struct StoreInventory {
    store: Arc<dyn InventoryStore>,
}

impl StoreInventory {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }
}

impl LiveInventory for StoreInventory {
    fn asset(&self, id: &AssetId) -> ArchiveResult<Option<AssetRecord>> {
        let live = self
            .store
            .live()
            .map_err(|e| ArchiveError::Store(e.to_string()))?;
        Ok(live.asset(id).cloned())
    }

    fn usage_count(&self, id: &AssetId) -> ArchiveResult<usize> {
        let live = self
            .store
            .live()
            .map_err(|e| ArchiveError::Store(e.to_string()))?;
        Ok(live.usage_count(id))
    }
}
