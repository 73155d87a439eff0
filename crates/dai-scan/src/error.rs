use std::time::Duration;

/// Errors raised by a record source while reading.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backend is temporarily unavailable. Retried by [`crate::RetryPolicy`].
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The backend failed in a way retrying cannot fix.
    #[error("source failed: {0}")]
    Failed(String),

    /// I/O error from a filesystem-backed source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Returns `true` if the operation may succeed when retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            Self::Failed(_) => false,
        }
    }
}

/// A single source record that could not be decoded.
///
/// Sources hand these back in place of the record so scanners can log and
/// skip them without aborting the chunk.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed record {key}: {reason}")]
pub struct MalformedRecord {
    pub key: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a scan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// One failed attempt against a source. Logged while retrying; never
    /// returned once retries are exhausted.
    #[error("transient error from {source_name} (attempt {attempt}): {message}")]
    TransientSource {
        source_name: String,
        attempt: u32,
        message: String,
    },

    /// A single reference or record could not be parsed. Skipped.
    #[error("malformed reference in {key}: {reason}")]
    MalformedReference { key: String, reason: String },

    /// The scan cannot continue; staging must be discarded.
    #[error("fatal scan error: {0}")]
    Fatal(String),

    /// The scan was cancelled by request.
    #[error("scan cancelled")]
    Cancelled,

    /// The scan exceeded its configured time limit.
    #[error("scan timed out after {0:?}")]
    TimedOut(Duration),

    /// A scan start was requested while another scan is running.
    #[error("scan {0} is already running")]
    AlreadyRunning(u64),

    /// No scan with this handle is known.
    #[error("unknown scan handle {0}")]
    UnknownHandle(u64),
}

impl ScanError {
    /// Returns `true` if this error ends the scan and routes to discard.
    pub fn aborts_scan(&self) -> bool {
        matches!(self, Self::Fatal(_) | Self::Cancelled | Self::TimedOut(_))
    }
}

impl From<MalformedRecord> for ScanError {
    fn from(value: MalformedRecord) -> Self {
        Self::MalformedReference {
            key: value.key,
            reason: value.reason,
        }
    }
}

/// Result alias for source reads.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
