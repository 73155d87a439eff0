use std::io;
use std::sync::Arc;

use dai_archive::{write_audit_csv, ArchiveService, InMemoryArchiveStore, StoreInventory};
use dai_inventory::{
    AssetRecord, Generation, InMemoryInventoryStore, InventoryStore, OrphanReference,
    ScanCoordinator, ScanHandle, ScanStatus, SwapSummary, UsageClass, UsageRecord,
};
use dai_normalize::Normalizer;
use dai_scan::{ScanContext, ScanResult};
use dai_types::AssetId;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{SdkError, SdkResult};
use crate::snapshot::SiteSnapshot;
use crate::state::EngineState;

/// Everything the live inventory knows about one asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetUsage {
    pub asset: AssetRecord,
    pub class: UsageClass,
    pub usages: Vec<UsageRecord>,
    pub orphans: Vec<OrphanReference>,
}

/// A scan running on the blocking thread pool.
pub struct ScanTask {
    pub handle: ScanHandle,
    join: JoinHandle<ScanResult<SwapSummary>>,
}

impl ScanTask {
    /// Wait for the scan to promote or discard.
    pub async fn wait(self) -> SdkResult<SwapSummary> {
        let outcome = self
            .join
            .await
            .map_err(|e| SdkError::Internal(format!("scan task failed: {e}")))?;
        Ok(outcome?)
    }
}

/// High-level inventory API.
pub struct Dai {
    normalizer: Normalizer,
    inventory: Arc<InMemoryInventoryStore>,
    coordinator: Arc<ScanCoordinator>,
    archive: ArchiveService,
}

impl Dai {
    /// An engine over `snapshot` with an empty inventory and no archive
    /// records.
    pub fn new(snapshot: &SiteSnapshot, config: EngineConfig) -> SdkResult<Self> {
        Self::with_state(snapshot, config, EngineState::default())
    }

    /// An engine over `snapshot`, resuming from saved state.
    pub fn with_state(
        snapshot: &SiteSnapshot,
        config: EngineConfig,
        state: EngineState,
    ) -> SdkResult<Self> {
        let normalizer = Normalizer::new(config.normalizer.clone());
        let inventory = Arc::new(InMemoryInventoryStore::with_live(state.inventory));

        let coordinator = ScanCoordinator::new(
            inventory.clone(),
            Arc::new(snapshot.graph()?),
            snapshot.sources(),
            ScanContext::from_config(normalizer.clone(), &config.scan),
            config.scan,
        );
        let archive = ArchiveService::new(
            Arc::new(InMemoryArchiveStore::from_records(state.archive)),
            Arc::new(StoreInventory::new(inventory.clone())),
            config.archive,
        );

        Ok(Self {
            normalizer,
            inventory,
            coordinator: Arc::new(coordinator),
            archive,
        })
    }

    // ---- Scanning ----

    /// Run a full scan on the calling thread.
    pub fn scan(&self) -> SdkResult<SwapSummary> {
        Ok(self.coordinator.scan()?)
    }

    /// Start a scan on tokio's blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn spawn_scan(&self) -> SdkResult<ScanTask> {
        let handle = self.coordinator.start_scan()?;
        let coordinator = Arc::clone(&self.coordinator);
        let join = tokio::task::spawn_blocking(move || coordinator.run(handle));
        info!(%handle, "scan spawned");
        Ok(ScanTask { handle, join })
    }

    pub fn status(&self, handle: ScanHandle) -> SdkResult<ScanStatus> {
        Ok(self.coordinator.status(handle)?)
    }

    pub fn cancel(&self, handle: ScanHandle) -> SdkResult<()> {
        Ok(self.coordinator.cancel(handle)?)
    }

    // ---- Inventory queries ----

    pub fn live(&self) -> SdkResult<Arc<Generation>> {
        Ok(self.inventory.live()?)
    }

    pub fn live_generation(&self) -> SdkResult<u64> {
        Ok(self.inventory.live_generation()?)
    }

    /// Resolve a hex asset id, a storage URI, a site path or a URL to an
    /// asset id.
    pub fn asset_id_for(&self, reference: &str) -> SdkResult<AssetId> {
        if let Ok(id) = AssetId::from_hex(reference) {
            return Ok(id);
        }
        self.normalizer
            .canonicalize(reference)?
            .map(|canonical| AssetId::from_location(&canonical))
            .ok_or_else(|| SdkError::AssetNotFound(reference.to_string()))
    }

    pub fn usage(&self, id: &AssetId) -> SdkResult<AssetUsage> {
        let live = self.live()?;
        let asset = live
            .asset(id)
            .cloned()
            .ok_or_else(|| SdkError::AssetNotFound(id.to_hex()))?;
        Ok(AssetUsage {
            asset,
            class: live.usage_class(id),
            usages: live.usages_of(id).cloned().collect(),
            orphans: live.orphans_of(id).cloned().collect(),
        })
    }

    pub fn orphans(&self) -> SdkResult<Vec<OrphanReference>> {
        Ok(self.live()?.orphans().cloned().collect())
    }

    // ---- Archive ----

    pub fn archive(&self) -> &ArchiveService {
        &self.archive
    }

    /// Write the audit CSV. Returns the number of rows.
    pub fn export_audit<W: io::Write>(&self, out: W) -> SdkResult<usize> {
        let records = self.archive.list()?;
        Ok(write_audit_csv(&records, out)?)
    }

    /// Current state for persistence.
    pub fn state(&self) -> SdkResult<EngineState> {
        Ok(EngineState {
            inventory: self.live()?.as_ref().clone(),
            archive: self.archive.list()?,
        })
    }
}
