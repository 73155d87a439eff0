use crate::error::{MalformedRecord, SourceResult};

/// One decoded record, or the reason it could not be decoded.
pub type SourceRecord<T> = Result<T, MalformedRecord>;

/// A chunked, read-only source of records.
///
/// Implementations must return records in a stable order so that a chunk
/// cursor means the same thing across calls. Reads past the end return an
/// empty vector.
pub trait RecordSource<T>: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Total number of records, malformed ones included.
    fn total(&self) -> SourceResult<usize>;

    /// Called once before a scan reads the source. Sources that snapshot
    /// their records drop the previous snapshot here.
    fn begin_scan(&self) -> SourceResult<()> {
        Ok(())
    }

    /// Up to `limit` records starting at `offset`.
    fn fetch(&self, offset: usize, limit: usize) -> SourceResult<Vec<SourceRecord<T>>>;
}
