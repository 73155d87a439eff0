//! The [`Scanner`] abstraction and the generic chunked driver behind the
//! five source scanners.

use std::fmt;
use std::sync::Arc;

use dai_normalize::{Location, NormalizedReference, Normalizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::denylist::DenyList;
use crate::error::{ScanError, ScanResult};
use crate::retry::RetryPolicy;
use crate::sighting::Sighting;
use crate::traits::RecordSource;

/// Scan phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPhase {
    ManagedFiles,
    LooseFiles,
    ContentFields,
    RemoteMedia,
    MenuLinks,
}

impl ScanPhase {
    pub const ALL: [ScanPhase; 5] = [
        Self::ManagedFiles,
        Self::LooseFiles,
        Self::ContentFields,
        Self::RemoteMedia,
        Self::MenuLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManagedFiles => "managed-files",
            Self::LooseFiles => "loose-files",
            Self::ContentFields => "content-fields",
            Self::RemoteMedia => "remote-media",
            Self::MenuLinks => "menu-links",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only state every scanner resolves references through.
#[derive(Clone, Debug, Default)]
pub struct ScanContext {
    normalizer: Normalizer,
    deny: DenyList,
}

impl ScanContext {
    pub fn new(normalizer: Normalizer, deny: DenyList) -> Self {
        Self { normalizer, deny }
    }

    pub fn from_config(normalizer: Normalizer, config: &ScanConfig) -> Self {
        Self::new(normalizer, DenyList::new(&config.deny_list))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns `true` if the reference is a system-generated stored file.
    pub fn is_denied(&self, reference: &NormalizedReference) -> bool {
        match &reference.location {
            Location::Stored { path, .. } => self.deny.is_denied(path),
            Location::External { .. } => false,
        }
    }
}

/// Collects sightings for one record and tallies what was dropped.
pub struct Emitter<'a> {
    ctx: &'a ScanContext,
    key: String,
    sightings: Vec<Sighting>,
    malformed: usize,
    discarded: usize,
}

impl<'a> Emitter<'a> {
    fn new(ctx: &'a ScanContext) -> Self {
        Self {
            ctx,
            key: String::new(),
            sightings: Vec::new(),
            malformed: 0,
            discarded: 0,
        }
    }

    fn start(&mut self, key: String) {
        self.key = key;
    }

    /// Normalize `raw`. Unclassifiable and denied references are discarded;
    /// malformed ones are logged and counted.
    pub fn resolve(&mut self, raw: &str) -> Option<NormalizedReference> {
        match self.ctx.normalizer.normalize(raw) {
            Ok(Some(reference)) if self.ctx.is_denied(&reference) => {
                debug!(record = %self.key, raw, "denied path");
                self.discarded += 1;
                None
            }
            Ok(Some(reference)) => Some(reference),
            Ok(None) => {
                self.discarded += 1;
                None
            }
            Err(e) => {
                let err = ScanError::MalformedReference {
                    key: self.key.clone(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "skipping reference");
                self.malformed += 1;
                None
            }
        }
    }

    pub fn push(&mut self, sighting: Sighting) {
        self.sightings.push(sighting);
    }
}

/// Per-source record handling plugged into [`SourceScanner`].
pub trait RecordScanner: Send + Sync {
    type Record: Send + Sync;

    fn phase(&self) -> ScanPhase;

    /// Stable key identifying a record in logs.
    fn key(&self, record: &Self::Record) -> String;

    /// Emit every sighting in `record`.
    fn emit(&self, record: &Self::Record, out: &mut Emitter<'_>);
}

/// One chunk of scanner output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    pub sightings: Vec<Sighting>,
    /// Records read, malformed ones included.
    pub read: usize,
    /// Records and references skipped as malformed.
    pub malformed: usize,
    /// References dropped as unclassifiable or system-generated.
    pub discarded: usize,
    /// Cursor of the next chunk, or `None` when the source is exhausted.
    pub next_cursor: Option<usize>,
}

/// A producer of sightings over bounded chunks of one source.
pub trait Scanner: Send + Sync {
    fn phase(&self) -> ScanPhase;

    fn batch_size(&self) -> usize;

    /// Records in the source, for progress reporting.
    fn total(&self) -> ScanResult<usize>;

    /// Scan the chunk starting at `cursor`.
    fn scan_chunk(&self, cursor: usize) -> ScanResult<Chunk>;
}

/// Lazy iterator over a scanner's chunks. Stops after the first error.
pub struct Chunks<'a> {
    scanner: &'a dyn Scanner,
    cursor: Option<usize>,
}

impl<'a> Chunks<'a> {
    pub fn new(scanner: &'a dyn Scanner) -> Self {
        Self::resume(scanner, 0)
    }

    /// Resume from a checkpointed cursor.
    pub fn resume(scanner: &'a dyn Scanner, cursor: usize) -> Self {
        Self {
            scanner,
            cursor: Some(cursor),
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = ScanResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let result = self.scanner.scan_chunk(cursor);
        if let Ok(chunk) = &result {
            self.cursor = chunk.next_cursor;
        }
        Some(result)
    }
}

/// Drain a scanner into one vector of sightings.
pub fn scan_all(scanner: &dyn Scanner) -> ScanResult<Vec<Sighting>> {
    let mut out = Vec::new();
    for chunk in Chunks::new(scanner) {
        out.extend(chunk?.sightings);
    }
    Ok(out)
}

/// Drives a [`RecordScanner`] over a [`RecordSource`] in bounded chunks.
pub struct SourceScanner<R: RecordScanner> {
    inner: R,
    source: Arc<dyn RecordSource<R::Record>>,
    ctx: Arc<ScanContext>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl<R: RecordScanner> SourceScanner<R> {
    pub fn new(
        inner: R,
        source: Arc<dyn RecordSource<R::Record>>,
        ctx: Arc<ScanContext>,
        config: &ScanConfig,
    ) -> Self {
        let batch_size = config.batch.for_phase(inner.phase());
        Self {
            inner,
            source,
            ctx,
            retry: config.retry_policy(),
            batch_size,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: RecordScanner> Scanner for SourceScanner<R> {
    fn phase(&self) -> ScanPhase {
        self.inner.phase()
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn total(&self) -> ScanResult<usize> {
        self.retry.run(self.source.name(), || self.source.total())
    }

    fn scan_chunk(&self, cursor: usize) -> ScanResult<Chunk> {
        let records = self.retry.run(self.source.name(), || {
            self.source.fetch(cursor, self.batch_size)
        })?;

        let mut emitter = Emitter::new(&self.ctx);
        let mut malformed_records = 0;
        for record in &records {
            match record {
                Ok(record) => {
                    emitter.start(self.inner.key(record));
                    self.inner.emit(record, &mut emitter);
                }
                Err(bad) => {
                    let err = ScanError::from(bad.clone());
                    warn!(phase = %self.phase(), error = %err, "skipping record");
                    malformed_records += 1;
                }
            }
        }

        let read = records.len();
        let next_cursor = (read >= self.batch_size).then_some(cursor + read);
        debug!(
            phase = %self.phase(),
            cursor,
            read,
            sightings = emitter.sightings.len(),
            "scanned chunk"
        );
        Ok(Chunk {
            sightings: emitter.sightings,
            read,
            malformed: malformed_records + emitter.malformed,
            discarded: emitter.discarded,
            next_cursor,
        })
    }
}
