//! The atomic swap manager: promote staging or discard it.

use std::sync::Arc;

use dai_scan::ScanError;
use tracing::{info, warn};

use crate::error::InventoryResult;
use crate::generation::GenerationStats;
use crate::traits::{InventoryStore, SwapSummary};

/// Promotes a finished staging generation to live, or discards it.
///
/// Cancellation, timeouts and fatal errors all take the same discard path.
#[derive(Clone)]
pub struct SwapManager {
    store: Arc<dyn InventoryStore>,
}

impl SwapManager {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Replace the live generation with staging in one step.
    pub fn promote(&self) -> InventoryResult<SwapSummary> {
        let summary = self.store.promote()?;
        info!(
            generation = summary.promoted.generation,
            assets = summary.promoted.assets,
            usages = summary.promoted.usages,
            orphans = summary.promoted.orphans,
            retired_generation = summary.retired.generation,
            retired_orphans = summary.retired.orphans,
            retired_usages = summary.retired.usages,
            retired_assets = summary.retired.assets,
            "promoted inventory generation"
        );
        Ok(summary)
    }

    /// Drop staging, leaving live untouched.
    pub fn discard(&self, cause: &ScanError) -> InventoryResult<Option<GenerationStats>> {
        let dropped = self.store.discard()?;
        match &dropped {
            Some(stats) => warn!(
                generation = stats.generation,
                assets = stats.assets,
                usages = stats.usages,
                orphans = stats.orphans,
                cause = %cause,
                "discarded staging generation"
            ),
            None => warn!(cause = %cause, "scan ended with nothing staged"),
        }
        Ok(dropped)
    }
}
