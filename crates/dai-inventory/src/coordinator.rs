//! The scan coordinator: one writer, sequential phases, promote or discard.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dai_graph::{ContentGraph, ReachabilityResolver};
use dai_scan::{
    Chunks, ContentField, ContentFieldScanner, InMemorySource, LooseFile, LooseFileScanner,
    ManagedFile, ManagedFileScanner, MenuLink, MenuLinkScanner, RecordSource, RemoteMedia,
    RemoteMediaScanner, RetryPolicy, ScanConfig, ScanContext, ScanError, ScanPhase, ScanResult, Scanner,
    SourceScanner,
};
use tracing::{info, warn};

use crate::builder::InventoryBuilder;
use crate::error::InventoryError;
use crate::generation::Generation;
use crate::session::{ScanHandle, ScanSession, ScanStatus, SessionShared};
use crate::swap::SwapManager;
use crate::traits::{InventoryStore, SwapSummary};

/// The five sources of truth a scan reads.
#[derive(Clone)]
pub struct ScanSources {
    pub managed: Arc<dyn RecordSource<ManagedFile>>,
    /// One source per storage scheme root.
    pub loose: Vec<Arc<dyn RecordSource<LooseFile>>>,
    pub content: Arc<dyn RecordSource<ContentField>>,
    pub remote: Arc<dyn RecordSource<RemoteMedia>>,
    pub menu: Arc<dyn RecordSource<MenuLink>>,
}

impl ScanSources {
    /// Tell every source a new scan is starting.
    fn begin_scan(&self, retry: &RetryPolicy) -> ScanResult<()> {
        retry.run(self.managed.name(), || self.managed.begin_scan())?;
        for source in &self.loose {
            retry.run(source.name(), || source.begin_scan())?;
        }
        retry.run(self.content.name(), || self.content.begin_scan())?;
        retry.run(self.remote.name(), || self.remote.begin_scan())?;
        retry.run(self.menu.name(), || self.menu.begin_scan())?;
        Ok(())
    }
}

impl Default for ScanSources {
    fn default() -> Self {
        Self {
            managed: Arc::new(InMemorySource::empty("managed files")),
            loose: Vec::new(),
            content: Arc::new(InMemorySource::empty("content fields")),
            remote: Arc::new(InMemorySource::empty("remote media")),
            menu: Arc::new(InMemorySource::empty("menu links")),
        }
    }
}

/// Finished sessions kept for status queries.
pub const FINISHED_SESSIONS_KEPT: usize = 16;

/// The scan holding the writer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveScan {
    handle: ScanHandle,
    /// Set once [`ScanCoordinator::run`] has claimed the scan.
    running: bool,
}

/// Releases the writer slot when a run ends, unwinding included.
struct SlotGuard<'a> {
    slot: &'a Mutex<Option<ActiveScan>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Runs scans against an [`InventoryStore`].
///
/// At most one scan is active at a time. A scan either promotes a complete
/// new generation or discards everything it staged. Only the most recent
/// [`FINISHED_SESSIONS_KEPT`] finished scans can still be queried.
pub struct ScanCoordinator {
    store: Arc<dyn InventoryStore>,
    graph: Arc<dyn ContentGraph>,
    sources: ScanSources,
    ctx: Arc<ScanContext>,
    config: ScanConfig,
    swap: SwapManager,
    active: Mutex<Option<ActiveScan>>,
    sessions: Mutex<HashMap<ScanHandle, SessionShared>>,
    next_handle: AtomicU64,
}

impl ScanCoordinator {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        graph: Arc<dyn ContentGraph>,
        sources: ScanSources,
        ctx: ScanContext,
        config: ScanConfig,
    ) -> Self {
        Self {
            swap: SwapManager::new(Arc::clone(&store)),
            store,
            graph,
            sources,
            ctx: Arc::new(ctx),
            config,
            active: Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    /// The current live generation.
    pub fn live(&self) -> ScanResult<Arc<Generation>> {
        Ok(self.store.live()?)
    }

    /// Handle of the running scan, if any.
    pub fn active(&self) -> ScanResult<Option<ScanHandle>> {
        let active = self.active.lock().map_err(|_| InventoryError::LockPoisoned)?;
        Ok(active.map(|a| a.handle))
    }

    /// Reserve the single writer slot and open a staging generation.
    pub fn start_scan(&self) -> ScanResult<ScanHandle> {
        let mut active = self.active.lock().map_err(|_| InventoryError::LockPoisoned)?;
        if let Some(running) = *active {
            return Err(ScanError::AlreadyRunning(running.handle.0));
        }

        if let Some(stale) = self.store.staging_generation()? {
            warn!(generation = stale, "discarding staging left by an earlier scan");
            self.store.discard()?;
        }
        let generation = self.store.open_staging()?;
        let handle = ScanHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));

        let mut sessions = self.sessions.lock().map_err(|_| InventoryError::LockPoisoned)?;
        prune_finished(&mut sessions);
        sessions.insert(handle, SessionShared::new(ScanStatus::new(handle, generation)));
        *active = Some(ActiveScan {
            handle,
            running: false,
        });
        info!(%handle, generation, "scan started");
        Ok(handle)
    }

    /// Progress of a scan, running or finished.
    pub fn status(&self, handle: ScanHandle) -> ScanResult<ScanStatus> {
        let sessions = self.sessions.lock().map_err(|_| InventoryError::LockPoisoned)?;
        sessions
            .get(&handle)
            .map(SessionShared::snapshot)
            .ok_or(ScanError::UnknownHandle(handle.0))
    }

    /// Ask a scan to stop at its next checkpoint. A started scan that no
    /// one has run yet is discarded on the spot and frees the writer slot.
    /// Cancelling a finished scan has no effect.
    pub fn cancel(&self, handle: ScanHandle) -> ScanResult<()> {
        let mut active = self.active.lock().map_err(|_| InventoryError::LockPoisoned)?;
        let sessions = self.sessions.lock().map_err(|_| InventoryError::LockPoisoned)?;
        let shared = sessions
            .get(&handle)
            .ok_or(ScanError::UnknownHandle(handle.0))?;
        shared.cancel.store(true, Ordering::SeqCst);

        let idle = *active
            == Some(ActiveScan {
                handle,
                running: false,
            });
        if idle {
            self.swap.discard(&ScanError::Cancelled)?;
            shared.update(|s| {
                s.done = true;
                s.error = Some(ScanError::Cancelled.to_string());
            });
            *active = None;
            info!(%handle, "scan cancelled before it ran");
        } else {
            info!(%handle, "scan cancellation requested");
        }
        Ok(())
    }

    /// Start and run a scan to completion on the calling thread.
    pub fn scan(&self) -> ScanResult<SwapSummary> {
        let handle = self.start_scan()?;
        self.run(handle)
    }

    /// Run a started scan to completion on the calling thread.
    ///
    /// Each started scan can be run once. The writer slot is freed when the
    /// run ends, by any path.
    pub fn run(&self, handle: ScanHandle) -> ScanResult<SwapSummary> {
        {
            let mut active = self.active.lock().map_err(|_| InventoryError::LockPoisoned)?;
            match active.as_mut() {
                Some(slot) if slot.handle == handle && !slot.running => slot.running = true,
                Some(slot) if slot.handle == handle => {
                    return Err(ScanError::AlreadyRunning(handle.0))
                }
                _ => return Err(self.unrunnable(handle)),
            }
        }
        let _slot = SlotGuard { slot: &self.active };

        let shared = {
            let sessions = self.sessions.lock().map_err(|_| InventoryError::LockPoisoned)?;
            sessions
                .get(&handle)
                .cloned()
                .ok_or(ScanError::UnknownHandle(handle.0))?
        };
        let generation = shared.snapshot().generation;
        let session = ScanSession::new(handle, generation, self.config.timeout(), shared);

        let outcome = self
            .execute(&session)
            .and_then(|()| Ok(self.swap.promote()?));
        let status = match &outcome {
            Ok(_) => session.finish(None),
            Err(err) => {
                if let Err(discard_err) = self.swap.discard(err) {
                    warn!(error = %discard_err, "discard failed");
                }
                session.finish(Some(err))
            }
        };

        info!(
            %handle,
            generation,
            sightings = status.sightings,
            malformed = status.malformed,
            error = status.error.as_deref().unwrap_or("none"),
            "scan finished"
        );
        outcome
    }

    /// Why `handle` cannot be run: it was cancelled before it ran, or it is
    /// not the started scan.
    fn unrunnable(&self, handle: ScanHandle) -> ScanError {
        let cancelled = self
            .sessions
            .lock()
            .map(|sessions| {
                sessions.get(&handle).is_some_and(|shared| {
                    let status = shared.snapshot();
                    status.done && shared.cancel.load(Ordering::SeqCst)
                })
            })
            .unwrap_or(false);
        if cancelled {
            ScanError::Cancelled
        } else {
            ScanError::UnknownHandle(handle.0)
        }
    }

    fn execute(&self, session: &ScanSession) -> ScanResult<()> {
        self.sources.begin_scan(&self.config.retry_policy())?;
        let resolver =
            ReachabilityResolver::with_max_depth(Arc::clone(&self.graph), self.config.max_parent_depth);
        let mut builder =
            InventoryBuilder::new(Arc::clone(&self.store), resolver, self.config.retry_policy());

        for phase in ScanPhase::ALL {
            session.checkpoint()?;
            let scanners = self.scanners_for(phase, &builder);
            let mut total = 0;
            for scanner in &scanners {
                total += scanner.total()?;
            }
            session.begin_phase(phase, total);
            info!(handle = %session.handle(), %phase, total, "phase started");

            for scanner in &scanners {
                for chunk in Chunks::new(scanner.as_ref()) {
                    session.checkpoint()?;
                    let chunk = chunk?;
                    for sighting in &chunk.sightings {
                        builder.ingest(sighting)?;
                    }
                    session.record_chunk(&chunk);
                }
            }
        }

        let stats = builder.stats();
        info!(
            handle = %session.handle(),
            sightings = stats.sightings,
            usages = stats.usages,
            orphans = stats.orphans,
            duplicate_orphans = stats.duplicate_orphans,
            vanished_hosts = stats.vanished_hosts,
            "all phases complete"
        );
        Ok(())
    }

    fn scanners_for(&self, phase: ScanPhase, builder: &InventoryBuilder) -> Vec<Box<dyn Scanner>> {
        let ctx = || Arc::clone(&self.ctx);
        let cfg = &self.config;
        match phase {
            ScanPhase::ManagedFiles => vec![Box::new(SourceScanner::new(
                ManagedFileScanner,
                Arc::clone(&self.sources.managed),
                ctx(),
                cfg,
            ))],
            ScanPhase::LooseFiles => self
                .sources
                .loose
                .iter()
                .map(|source| {
                    Box::new(SourceScanner::new(
                        LooseFileScanner::skipping(builder.registered_ids().clone()),
                        Arc::clone(source),
                        ctx(),
                        cfg,
                    )) as Box<dyn Scanner>
                })
                .collect(),
            ScanPhase::ContentFields => vec![Box::new(SourceScanner::new(
                ContentFieldScanner,
                Arc::clone(&self.sources.content),
                ctx(),
                cfg,
            ))],
            ScanPhase::RemoteMedia => vec![Box::new(SourceScanner::new(
                RemoteMediaScanner,
                Arc::clone(&self.sources.remote),
                ctx(),
                cfg,
            ))],
            ScanPhase::MenuLinks => vec![Box::new(SourceScanner::new(
                MenuLinkScanner,
                Arc::clone(&self.sources.menu),
                ctx(),
                cfg,
            ))],
        }
    }
}

/// Drop the oldest finished sessions beyond [`FINISHED_SESSIONS_KEPT`].
fn prune_finished(sessions: &mut HashMap<ScanHandle, SessionShared>) {
    let mut finished: Vec<ScanHandle> = sessions
        .iter()
        .filter(|(_, shared)| shared.snapshot().done)
        .map(|(handle, _)| *handle)
        .collect();
    if finished.len() <= FINISHED_SESSIONS_KEPT {
        return;
    }
    finished.sort_unstable();
    let excess = finished.len() - FINISHED_SESSIONS_KEPT;
    for handle in &finished[..excess] {
        sessions.remove(handle);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::mpsc;

    use dai_graph::{ComponentEntity, InMemoryContentGraph, ParentLink, RootEntity};
    use dai_normalize::StorageScheme;
    use dai_scan::{FieldUsage, FieldValue, FilesystemSource};
    use dai_types::{AssetId, EntityRef, OriginKind};

    use super::*;
    use crate::memory::InMemoryInventoryStore;
    use crate::record::UsageClass;

    fn e(t: &str, id: &str) -> EntityRef {
        EntityRef::new(t, id)
    }

    fn config() -> ScanConfig {
        ScanConfig {
            retry_backoff_ms: 0,
            max_retries: 1,
            ..ScanConfig::default()
        }
    }

    /// node/1 hosts paragraph/10; paragraph/11 was dropped from node/1.
    fn graph() -> Arc<InMemoryContentGraph> {
        Arc::new(InMemoryContentGraph::from_nodes([
            RootEntity::new(e("node", "1"))
                .with_child("field_sections", e("paragraph", "10"))
                .into(),
            ComponentEntity::new(
                e("paragraph", "10"),
                Some(ParentLink::new(e("node", "1"), "field_sections")),
            )
            .into(),
            ComponentEntity::new(
                e("paragraph", "11"),
                Some(ParentLink::new(e("node", "1"), "field_sections")),
            )
            .into(),
            RootEntity::new(e("menu_link_content", "1")).into(),
        ]))
    }

    fn text(host: EntityRef, markup: &str) -> ContentField {
        ContentField {
            host,
            field: "field_text".into(),
            value: FieldValue::Text {
                value: markup.into(),
            },
        }
    }

    fn managed_files(n: u64) -> Vec<ManagedFile> {
        (0..n)
            .map(|i| ManagedFile {
                file_id: i,
                uri: format!("public://bulk/{i}.pdf"),
                filename: format!("{i}.pdf"),
                mime: Some("application/pdf".into()),
                size: Some(100),
                usages: vec![],
            })
            .collect()
    }

    fn coordinator(
        store: Arc<InMemoryInventoryStore>,
        sources: ScanSources,
        config: ScanConfig,
    ) -> ScanCoordinator {
        ScanCoordinator::new(store, graph(), sources, ScanContext::default(), config)
    }

    fn scenario_sources() -> ScanSources {
        let link = r#"<a href="/sites/default/files/shared.pdf">Shared</a>"#;
        ScanSources {
            managed: Arc::new(InMemorySource::new(
                "managed",
                [ManagedFile {
                    file_id: 1,
                    uri: "public://shared.pdf".into(),
                    filename: "shared.pdf".into(),
                    mime: Some("application/pdf".into()),
                    size: Some(2048),
                    usages: vec![],
                }],
            )),
            content: Arc::new(InMemorySource::new(
                "content",
                [text(e("paragraph", "10"), link), text(e("paragraph", "11"), link)],
            )),
            menu: Arc::new(InMemorySource::new(
                "menu",
                [MenuLink {
                    link: e("menu_link_content", "1"),
                    uri: "https://example.org/brochure.pdf".into(),
                    title: "Brochure".into(),
                }],
            )),
            ..ScanSources::default()
        }
    }

    #[test]
    fn reachable_plus_detached_reference_is_in_use() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let c = coordinator(store.clone(), scenario_sources(), config());
        let summary = c.scan().unwrap();
        assert_eq!(summary.promoted.generation, 1);

        let live = store.live().unwrap();
        let id = AssetId::from_location("public://shared.pdf");
        assert_eq!(live.usage_count(&id), 1);
        assert_eq!(live.orphan_count(&id), 1);
        assert_eq!(live.usage_class(&id), UsageClass::InUse);
        assert_eq!(live.asset(&id).unwrap().origin, OriginKind::RegisteredFile);

        let brochure = AssetId::from_location("https://example.org/brochure.pdf");
        assert_eq!(live.usage_class(&brochure), UsageClass::InUse);
    }

    #[test]
    fn failure_midway_leaves_live_untouched() {
        let store = Arc::new(InMemoryInventoryStore::new());
        coordinator(store.clone(), scenario_sources(), config())
            .scan()
            .unwrap();
        let before = store.live().unwrap();

        let failing = ScanSources {
            managed: Arc::new(InMemorySource::new("managed", managed_files(1000)).failing_from(600)),
            ..ScanSources::default()
        };
        let c = coordinator(store.clone(), failing, config());
        let handle = c.start_scan().unwrap();
        let err = c.run(handle).unwrap_err();
        assert!(matches!(err, ScanError::Fatal(_)));

        let status = c.status(handle).unwrap();
        assert!(status.done);
        assert_eq!(status.processed, 600);
        assert!(status.error.is_some());

        let after = store.live().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.stats(), before.stats());
        assert_eq!(store.staging_generation().unwrap(), None);

        // The writer slot is free again.
        assert!(c.start_scan().is_ok());
    }

    #[test]
    fn rescanning_unchanged_sources_is_idempotent() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let c = coordinator(store.clone(), scenario_sources(), config());
        c.scan().unwrap();
        let first = store.live().unwrap();
        c.scan().unwrap();
        let second = store.live().unwrap();

        assert_eq!(second.number(), first.number() + 1);
        assert!(first.assets().eq(second.assets()));
        assert!(first.usages().eq(second.usages()));
        assert!(first.orphans().eq(second.orphans()));
    }

    #[test]
    fn second_start_while_running_is_rejected() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let c = coordinator(store, ScanSources::default(), config());
        let handle = c.start_scan().unwrap();
        assert_eq!(c.start_scan(), Err(ScanError::AlreadyRunning(handle.0)));
        c.run(handle).unwrap();
        assert_eq!(c.active().unwrap(), None);
    }

    /// Blocks its first fetch until released, reporting when it got there.
    struct GatedSource {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl RecordSource<ManagedFile> for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        fn total(&self) -> dai_scan::SourceResult<usize> {
            Ok(1)
        }

        fn fetch(
            &self,
            offset: usize,
            _: usize,
        ) -> dai_scan::SourceResult<Vec<dai_scan::SourceRecord<ManagedFile>>> {
            if offset > 0 {
                return Ok(vec![]);
            }
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(managed_files(1).into_iter().map(Ok).collect())
        }
    }

    #[test]
    fn cancellation_during_a_run_takes_the_discard_path() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(InMemoryInventoryStore::new());
        let sources = ScanSources {
            managed: Arc::new(GatedSource {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            }),
            ..ScanSources::default()
        };
        let c = coordinator(store.clone(), sources, config());
        let handle = c.start_scan().unwrap();

        std::thread::scope(|scope| {
            let run = scope.spawn(|| c.run(handle));
            entered_rx.recv().unwrap();
            c.cancel(handle).unwrap();
            assert_eq!(c.active().unwrap(), Some(handle));
            release_tx.send(()).unwrap();
            assert_eq!(run.join().unwrap(), Err(ScanError::Cancelled));
        });

        assert_eq!(store.live().unwrap().number(), 0);
        assert_eq!(store.staging_generation().unwrap(), None);
        assert_eq!(c.active().unwrap(), None);
        assert_eq!(c.status(handle).unwrap().error.as_deref(), Some("scan cancelled"));
    }

    #[test]
    fn timeout_takes_the_discard_path() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let cfg = ScanConfig {
            timeout_secs: Some(0),
            ..config()
        };
        let c = coordinator(store.clone(), scenario_sources(), cfg);
        assert!(matches!(c.scan(), Err(ScanError::TimedOut(_))));
        assert!(store.live().unwrap().is_empty());
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let c = coordinator(
            Arc::new(InMemoryInventoryStore::new()),
            ScanSources::default(),
            config(),
        );
        assert_eq!(c.status(ScanHandle(99)), Err(ScanError::UnknownHandle(99)));
        assert_eq!(c.cancel(ScanHandle(99)), Err(ScanError::UnknownHandle(99)));
        assert!(matches!(c.run(ScanHandle(99)), Err(ScanError::UnknownHandle(99))));
    }

    #[test]
    fn loose_files_already_registered_are_not_duplicated() {
        let dir = public_disk();
        let store = Arc::new(InMemoryInventoryStore::new());
        let sources = ScanSources {
            loose: vec![dir],
            ..scenario_sources()
        };
        coordinator(store.clone(), sources, config()).scan().unwrap();
        let live = store.live().unwrap();
        let shared = live
            .asset(&AssetId::from_location("public://shared.pdf"))
            .unwrap();
        assert_eq!(shared.origin, OriginKind::RegisteredFile);
        let stray = live
            .asset(&AssetId::from_location("public://stray.docx"))
            .unwrap();
        assert_eq!(stray.origin, OriginKind::LooseFile);
        assert_eq!(live.usage_class(&stray.id), UsageClass::Unused);
    }

    #[test]
    fn rescan_relists_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"a").unwrap();
        let store = Arc::new(InMemoryInventoryStore::new());
        let sources = ScanSources {
            loose: vec![Arc::new(FilesystemSource::new(dir.path(), StorageScheme::Public))
                as Arc<dyn RecordSource<LooseFile>>],
            ..ScanSources::default()
        };
        let c = coordinator(store.clone(), sources, config());
        c.scan().unwrap();
        let a = AssetId::from_location("public://a.pdf");
        let b = AssetId::from_location("public://b.pdf");
        assert!(store.live().unwrap().asset(&a).is_some());

        std::fs::remove_file(dir.path().join("a.pdf")).unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        c.scan().unwrap();
        let live = store.live().unwrap();
        assert_eq!(live.number(), 2);
        assert!(live.asset(&a).is_none());
        assert!(live.asset(&b).is_some());
    }

    #[test]
    fn cancelling_an_unrun_scan_frees_the_writer_slot() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let c = coordinator(store.clone(), scenario_sources(), config());
        let handle = c.start_scan().unwrap();
        c.cancel(handle).unwrap();

        assert_eq!(c.active().unwrap(), None);
        assert_eq!(store.staging_generation().unwrap(), None);
        let status = c.status(handle).unwrap();
        assert!(status.done);
        assert_eq!(status.error.as_deref(), Some("scan cancelled"));
        assert_eq!(c.run(handle), Err(ScanError::Cancelled));

        let next = c.start_scan().unwrap();
        c.run(next).unwrap();
        assert_eq!(store.live().unwrap().number(), 1);
    }

    #[test]
    fn a_scan_runs_once() {
        let c = coordinator(
            Arc::new(InMemoryInventoryStore::new()),
            ScanSources::default(),
            config(),
        );
        let handle = c.start_scan().unwrap();
        c.run(handle).unwrap();
        assert!(matches!(c.run(handle), Err(ScanError::UnknownHandle(_))));
    }

    struct PanickingSource;

    impl RecordSource<ManagedFile> for PanickingSource {
        fn name(&self) -> &str {
            "panicking"
        }

        fn total(&self) -> dai_scan::SourceResult<usize> {
            Ok(1)
        }

        fn fetch(
            &self,
            _: usize,
            _: usize,
        ) -> dai_scan::SourceResult<Vec<dai_scan::SourceRecord<ManagedFile>>> {
            panic!("source blew up");
        }
    }

    #[test]
    fn writer_slot_is_freed_when_a_run_unwinds() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let sources = ScanSources {
            managed: Arc::new(PanickingSource),
            ..ScanSources::default()
        };
        let c = coordinator(store.clone(), sources, config());
        let handle = c.start_scan().unwrap();
        let unwound =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.run(handle)));
        assert!(unwound.is_err());
        assert_eq!(c.active().unwrap(), None);
        // The next start discards what the failed run staged.
        assert!(c.start_scan().is_ok());
        assert_eq!(store.live().unwrap().number(), 0);
    }

    #[test]
    fn only_recent_finished_sessions_are_kept() {
        let c = coordinator(
            Arc::new(InMemoryInventoryStore::new()),
            ScanSources::default(),
            config(),
        );
        let mut handles = Vec::new();
        for _ in 0..FINISHED_SESSIONS_KEPT + 4 {
            let handle = c.start_scan().unwrap();
            c.run(handle).unwrap();
            handles.push(handle);
        }
        let retained = handles
            .iter()
            .filter(|h| c.status(**h).is_ok())
            .count();
        // The pruning runs at start, before the newest session is added.
        assert!(retained <= FINISHED_SESSIONS_KEPT + 1);
        assert_eq!(c.status(handles[0]), Err(ScanError::UnknownHandle(handles[0].0)));
        assert!(c.status(*handles.last().unwrap()).unwrap().succeeded());
    }

    fn public_disk() -> Arc<dyn RecordSource<LooseFile>> {
        Arc::new(InMemorySource::new(
            "public disk",
            [
                LooseFile {
                    scheme: StorageScheme::Public,
                    path: "shared.pdf".into(),
                    size: 2048,
                },
                LooseFile {
                    scheme: StorageScheme::Public,
                    path: "stray.docx".into(),
                    size: 10,
                },
                LooseFile {
                    scheme: StorageScheme::Public,
                    path: "css/aggregate.css".into(),
                    size: 10,
                },
            ],
        ))
    }

    #[test]
    fn media_usages_resolve_through_components() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let sources = ScanSources {
            remote: Arc::new(InMemorySource::new(
                "media",
                [RemoteMedia {
                    media: e("media", "5"),
                    url: "https://vimeo.com/76979871".into(),
                    name: Some("Tour".into()),
                    usages: vec![FieldUsage::new(e("paragraph", "10"), "field_media")],
                }],
            )),
            ..ScanSources::default()
        };
        coordinator(store.clone(), sources, config()).scan().unwrap();
        let live = store.live().unwrap();
        let id = AssetId::from_location("https://vimeo.com/76979871");
        let usage = live.usages_of(&id).next().unwrap();
        assert_eq!(usage.root, e("node", "1"));
        assert_eq!(live.asset(&id).unwrap().name, "Tour");
    }

    #[test]
    fn readers_never_observe_a_mixed_generation() {
        let store = Arc::new(InMemoryInventoryStore::new());
        let c = coordinator(store.clone(), scenario_sources(), config());
        c.scan().unwrap();
        let old = store.live().unwrap().stats();

        let big = ScanSources {
            managed: Arc::new(InMemorySource::new("managed", managed_files(500))),
            ..scenario_sources()
        };
        let c = coordinator(store.clone(), big, config());

        std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                let mut seen = HashSet::new();
                for _ in 0..2_000 {
                    let g = store.live().unwrap();
                    let assets: HashSet<AssetId> = g.assets().map(|a| a.id).collect();
                    assert!(g.usages().all(|u| assets.contains(&u.asset)));
                    assert!(g.orphans().all(|o| assets.contains(&o.asset)));
                    assert!(g.assets().all(|a| !a.staged));
                    seen.insert((g.number(), g.stats().assets));
                }
                seen
            });
            c.scan().unwrap();
            let seen = reader.join().unwrap();
            for (number, assets) in seen {
                match number {
                    1 => assert_eq!(assets, old.assets),
                    2 => assert_eq!(assets, old.assets + 500),
                    other => panic!("unexpected generation {other}"),
                }
            }
        });
    }
}
