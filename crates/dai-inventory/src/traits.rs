use std::sync::Arc;

use dai_types::AssetId;
use serde::Serialize;

use crate::error::InventoryResult;
use crate::generation::{Generation, GenerationStats};
use crate::record::{AssetRecord, OrphanReference, UsageRecord};

/// Result of promoting a staging generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SwapSummary {
    pub retired: GenerationStats,
    pub promoted: GenerationStats,
}

/// Storage for the live inventory and at most one staging generation.
///
/// Implementations must satisfy:
/// - The live generation is replaced only by [`promote`](Self::promote),
///   in one step; readers of [`live`](Self::live) see one whole generation.
/// - Staging writes never touch the live generation.
/// - [`discard`](Self::discard) leaves the live generation untouched.
/// - Retired rows are removed dependents first: orphans, then usages, then
///   assets.
pub trait InventoryStore: Send + Sync {
    /// The current live generation.
    fn live(&self) -> InventoryResult<Arc<Generation>>;

    /// Marker of the live generation; 0 before the first promotion.
    fn live_generation(&self) -> InventoryResult<u64> {
        Ok(self.live()?.number())
    }

    /// Open a new staging generation and return its number.
    fn open_staging(&self) -> InventoryResult<u64>;

    /// Number of the open staging generation, if any.
    fn staging_generation(&self) -> InventoryResult<Option<u64>>;

    /// Insert or merge an asset into staging.
    fn stage_asset(&self, record: AssetRecord) -> InventoryResult<()>;

    /// Add a usage occurrence to staging.
    fn stage_usage(&self, usage: UsageRecord) -> InventoryResult<()>;

    /// Add an orphan to staging. Returns `false` if it was a duplicate.
    fn stage_orphan(&self, orphan: OrphanReference) -> InventoryResult<bool>;

    /// A staged asset, if present.
    fn staged_asset(&self, id: &AssetId) -> InventoryResult<Option<AssetRecord>>;

    /// Row counts of the open staging generation.
    fn staging_stats(&self) -> InventoryResult<Option<GenerationStats>>;

    /// Replace the live generation with staging.
    fn promote(&self) -> InventoryResult<SwapSummary>;

    /// Drop staging. Returns its row counts, or `None` if nothing was open.
    fn discard(&self) -> InventoryResult<Option<GenerationStats>>;
}
