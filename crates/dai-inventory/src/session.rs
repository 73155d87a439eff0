//! Per-scan session state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use dai_scan::{Chunk, ScanError, ScanPhase, ScanResult};
use serde::{Deserialize, Serialize};

/// Opaque handle to a started scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanHandle(pub u64);

impl fmt::Display for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// Progress snapshot of one scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatus {
    pub handle: ScanHandle,
    /// Staging generation being built.
    pub generation: u64,
    /// Current phase; `None` before the first phase starts.
    pub phase: Option<ScanPhase>,
    /// Records read in the current phase.
    pub processed: usize,
    /// Records in the current phase.
    pub total: usize,
    pub sightings: usize,
    pub malformed: usize,
    pub done: bool,
    /// Set when the scan ended without promoting.
    pub error: Option<String>,
}

impl ScanStatus {
    pub(crate) fn new(handle: ScanHandle, generation: u64) -> Self {
        Self {
            handle,
            generation,
            phase: None,
            processed: 0,
            total: 0,
            sightings: 0,
            malformed: 0,
            done: false,
            error: None,
        }
    }

    /// Returns `true` if the scan finished and was promoted.
    pub fn succeeded(&self) -> bool {
        self.done && self.error.is_none()
    }
}

/// Cancellation flag and status cell shared between a session and the
/// coordinator.
#[derive(Clone, Debug)]
pub(crate) struct SessionShared {
    pub(crate) cancel: Arc<AtomicBool>,
    pub(crate) status: Arc<RwLock<ScanStatus>>,
}

impl SessionShared {
    pub(crate) fn new(status: ScanStatus) -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(status)),
        }
    }

    pub(crate) fn snapshot(&self) -> ScanStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut ScanStatus)) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
    }
}

/// The state of one running scan, passed through every phase.
///
/// Created by the coordinator when the scan starts and consumed when it
/// commits or discards.
#[derive(Debug)]
pub struct ScanSession {
    handle: ScanHandle,
    generation: u64,
    started: Instant,
    timeout: Option<Duration>,
    shared: SessionShared,
}

impl ScanSession {
    pub(crate) fn new(
        handle: ScanHandle,
        generation: u64,
        timeout: Option<Duration>,
        shared: SessionShared,
    ) -> Self {
        Self {
            handle,
            generation,
            started: Instant::now(),
            timeout,
            shared,
        }
    }

    pub fn handle(&self) -> ScanHandle {
        self.handle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail if the scan was cancelled or ran out of time.
    pub fn checkpoint(&self) -> ScanResult<()> {
        if self.shared.cancel.load(Ordering::SeqCst) {
            return Err(ScanError::Cancelled);
        }
        if let Some(limit) = self.timeout {
            if self.started.elapsed() >= limit {
                return Err(ScanError::TimedOut(limit));
            }
        }
        Ok(())
    }

    pub fn begin_phase(&self, phase: ScanPhase, total: usize) {
        self.shared.update(|s| {
            s.phase = Some(phase);
            s.processed = 0;
            s.total = total;
        });
    }

    pub fn record_chunk(&self, chunk: &Chunk) {
        self.shared.update(|s| {
            s.processed += chunk.read;
            s.sightings += chunk.sightings.len();
            s.malformed += chunk.malformed;
        });
    }

    pub(crate) fn finish(self, error: Option<&ScanError>) -> ScanStatus {
        self.shared.update(|s| {
            s.done = true;
            s.error = error.map(ToString::to_string);
        });
        self.shared.snapshot()
    }

    pub fn status(&self) -> ScanStatus {
        self.shared.snapshot()
    }
}
