//! The inventory builder: sightings in, staged rows out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dai_graph::{GraphError, Reachability, ReachabilityResolver};
use dai_scan::{RetryPolicy, ScanResult, Sighting, SourceError};
use dai_types::{AssetId, EntityRef, OriginKind};
use tracing::debug;

use crate::record::{AssetRecord, OrphanReference, UsageRecord};
use crate::traits::InventoryStore;

/// Counters for one build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub sightings: usize,
    pub usages: usize,
    pub orphans: usize,
    /// Orphan sightings that repeated an existing (asset, source) row.
    pub duplicate_orphans: usize,
    /// Hosted sightings whose host no longer exists.
    pub vanished_hosts: usize,
}

/// What happened to one sighting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ingested {
    /// An asset registration with no host.
    Registered(AssetId),
    /// A usage attributed to a live root.
    Usage { asset: AssetId, root: EntityRef },
    /// An orphan reference.
    Orphan(AssetId),
    /// The host no longer exists; nothing was written.
    Dropped,
}

/// Turns sightings into staged asset, usage and orphan rows.
///
/// Host reachability is resolved once per host per build and memoized; the
/// graph is assumed stable for the duration of a scan.
pub struct InventoryBuilder {
    store: Arc<dyn InventoryStore>,
    resolver: ReachabilityResolver,
    retry: RetryPolicy,
    memo: HashMap<EntityRef, Reachability>,
    registered: HashSet<AssetId>,
    stats: BuildStats,
}

impl InventoryBuilder {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        resolver: ReachabilityResolver,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            resolver,
            retry,
            memo: HashMap::new(),
            registered: HashSet::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Identities registered by the managed-file phase so far.
    pub fn registered_ids(&self) -> &HashSet<AssetId> {
        &self.registered
    }

    /// Stage one sighting.
    pub fn ingest(&mut self, sighting: &Sighting) -> ScanResult<Ingested> {
        self.stats.sightings += 1;
        let asset = sighting.asset_id();

        let Some(host) = &sighting.host else {
            self.store.stage_asset(asset_record(sighting))?;
            if sighting.origin == OriginKind::RegisteredFile {
                self.registered.insert(asset);
            }
            return Ok(Ingested::Registered(asset));
        };

        match self.reachability(&host.entity)? {
            Reachability::Reachable { root, .. } => {
                self.store.stage_asset(asset_record(sighting))?;
                self.store.stage_usage(UsageRecord {
                    asset,
                    root: root.clone(),
                    field: host.field.clone(),
                    method: host.method,
                    occurrences: 1,
                })?;
                self.stats.usages += 1;
                Ok(Ingested::Usage { asset, root })
            }
            Reachability::Orphan { reason, at } => {
                self.store.stage_asset(asset_record(sighting))?;
                let inserted = self.store.stage_orphan(OrphanReference {
                    asset,
                    source: host.entity.clone(),
                    field: host.field.clone(),
                    method: host.method,
                    reason,
                    broken_at: at,
                })?;
                if inserted {
                    self.stats.orphans += 1;
                } else {
                    self.stats.duplicate_orphans += 1;
                }
                Ok(Ingested::Orphan(asset))
            }
            Reachability::NotFound => {
                debug!(host = %host.entity, asset = %asset.short_hex(), "host vanished");
                self.stats.vanished_hosts += 1;
                Ok(Ingested::Dropped)
            }
        }
    }

    fn reachability(&mut self, host: &EntityRef) -> ScanResult<Reachability> {
        if let Some(known) = self.memo.get(host) {
            return Ok(known.clone());
        }
        let resolver = &self.resolver;
        let outcome = self
            .retry
            .run("content graph", || resolver.resolve(host).map_err(graph_to_source))?;
        self.memo.insert(host.clone(), outcome.clone());
        Ok(outcome)
    }
}

fn graph_to_source(err: GraphError) -> SourceError {
    match err {
        GraphError::Unavailable(msg) => SourceError::Unavailable(msg),
        other => SourceError::Failed(other.to_string()),
    }
}

fn asset_record(sighting: &Sighting) -> AssetRecord {
    let reference = &sighting.reference;
    AssetRecord {
        id: sighting.asset_id(),
        name: sighting
            .meta
            .name
            .clone()
            .unwrap_or_else(|| reference.file_name.clone()),
        origin: sighting.origin,
        category: reference.category,
        size: sighting.meta.size,
        location: reference.canonical.clone(),
        mime: sighting.meta.mime.clone(),
        file_id: sighting.meta.file_id,
        staged: true,
    }
}
