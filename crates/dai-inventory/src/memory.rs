//! In-memory inventory store.
//!
//! [`InMemoryInventoryStore`] keeps the live generation as an
//! `Arc<Generation>` behind a `RwLock`; promotion swaps the pointer.

use std::sync::{Arc, Mutex, RwLock};

use dai_types::AssetId;

use crate::error::{InventoryError, InventoryResult};
use crate::generation::{Generation, GenerationStats};
use crate::record::{AssetRecord, OrphanReference, UsageRecord};
use crate::traits::{InventoryStore, SwapSummary};

/// An in-memory implementation of [`InventoryStore`].
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    live: RwLock<Arc<Generation>>,
    staging: Mutex<Option<Generation>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose live generation is `generation`, e.g. loaded from disk.
    pub fn with_live(generation: Generation) -> Self {
        Self {
            live: RwLock::new(Arc::new(generation)),
            staging: Mutex::new(None),
        }
    }

    fn with_staging<T>(&self, f: impl FnOnce(&mut Generation) -> T) -> InventoryResult<T> {
        let mut staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        let generation = staging.as_mut().ok_or(InventoryError::NoStaging)?;
        Ok(f(generation))
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn live(&self) -> InventoryResult<Arc<Generation>> {
        let live = self.live.read().map_err(|_| InventoryError::LockPoisoned)?;
        Ok(Arc::clone(&live))
    }

    fn open_staging(&self) -> InventoryResult<u64> {
        let mut staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        if let Some(open) = staging.as_ref() {
            return Err(InventoryError::StagingOpen(open.number()));
        }
        let number = self.live()?.number() + 1;
        *staging = Some(Generation::new(number));
        Ok(number)
    }

    fn staging_generation(&self) -> InventoryResult<Option<u64>> {
        let staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        Ok(staging.as_ref().map(Generation::number))
    }

    fn stage_asset(&self, record: AssetRecord) -> InventoryResult<()> {
        self.with_staging(|g| {
            g.upsert_asset(AssetRecord {
                staged: true,
                ..record
            })
        })
    }

    fn stage_usage(&self, usage: UsageRecord) -> InventoryResult<()> {
        self.with_staging(|g| g.add_usage(usage))
    }

    fn stage_orphan(&self, orphan: OrphanReference) -> InventoryResult<bool> {
        self.with_staging(|g| g.add_orphan(orphan))
    }

    fn staged_asset(&self, id: &AssetId) -> InventoryResult<Option<AssetRecord>> {
        self.with_staging(|g| g.asset(id).cloned())
    }

    fn staging_stats(&self) -> InventoryResult<Option<GenerationStats>> {
        let staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        Ok(staging.as_ref().map(Generation::stats))
    }

    fn promote(&self) -> InventoryResult<SwapSummary> {
        let mut staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        let mut next = staging.take().ok_or(InventoryError::NoStaging)?;
        next.mark_live();
        let promoted = next.stats();
        let next = Arc::new(next);

        let retired = {
            let mut live = self.live.write().map_err(|_| InventoryError::LockPoisoned)?;
            std::mem::replace(&mut *live, next)
        };
        let retired_stats = retired.stats();
        // Readers still holding the old generation keep it alive; the last
        // one out drops it.
        drop(retired);

        Ok(SwapSummary {
            retired: retired_stats,
            promoted,
        })
    }

    fn discard(&self) -> InventoryResult<Option<GenerationStats>> {
        let mut staging = self.staging.lock().map_err(|_| InventoryError::LockPoisoned)?;
        Ok(staging.take().map(|g| g.stats()))
    }
}

#[cfg(test)]
mod tests {
    use dai_types::{MediaCategory, OriginKind};

    use super::*;

    fn asset(loc: &str) -> AssetRecord {
        AssetRecord {
            id: AssetId::from_location(loc),
            name: loc.into(),
            origin: OriginKind::LooseFile,
            category: MediaCategory::Document,
            size: None,
            location: loc.into(),
            mime: None,
            file_id: None,
            staged: false,
        }
    }

    #[test]
    fn staging_is_invisible_until_promoted() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(store.open_staging().unwrap(), 1);
        store.stage_asset(asset("public://a.pdf")).unwrap();
        assert!(store.live().unwrap().is_empty());

        let staged = store
            .staged_asset(&AssetId::from_location("public://a.pdf"))
            .unwrap()
            .unwrap();
        assert!(staged.staged);

        let summary = store.promote().unwrap();
        assert_eq!(summary.promoted.assets, 1);
        assert_eq!(summary.retired.generation, 0);
        let live = store.live().unwrap();
        assert_eq!(live.number(), 1);
        assert!(live.assets().all(|a| !a.staged));
    }

    #[test]
    fn discard_keeps_live_untouched() {
        let store = InMemoryInventoryStore::new();
        store.open_staging().unwrap();
        store.stage_asset(asset("public://a.pdf")).unwrap();
        store.promote().unwrap();

        store.open_staging().unwrap();
        store.stage_asset(asset("public://b.pdf")).unwrap();
        let dropped = store.discard().unwrap().unwrap();
        assert_eq!(dropped.generation, 2);

        let live = store.live().unwrap();
        assert_eq!(live.number(), 1);
        assert_eq!(live.stats().assets, 1);
        assert_eq!(store.staging_generation().unwrap(), None);
    }

    #[test]
    fn only_one_staging_generation_at_a_time() {
        let store = InMemoryInventoryStore::new();
        store.open_staging().unwrap();
        assert!(matches!(
            store.open_staging(),
            Err(InventoryError::StagingOpen(1))
        ));
        assert!(matches!(store.discard(), Ok(Some(_))));
        assert!(matches!(store.promote(), Err(InventoryError::NoStaging)));
        assert!(matches!(
            store.stage_asset(asset("public://a.pdf")),
            Err(InventoryError::NoStaging)
        ));
    }

    #[test]
    fn readers_keep_their_generation_across_a_swap() {
        let store = InMemoryInventoryStore::new();
        store.open_staging().unwrap();
        store.stage_asset(asset("public://a.pdf")).unwrap();
        store.promote().unwrap();

        let reader = store.live().unwrap();
        store.open_staging().unwrap();
        store.promote().unwrap();

        assert_eq!(reader.stats().assets, 1);
        assert_eq!(store.live().unwrap().stats().assets, 0);
    }
}
