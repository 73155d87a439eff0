//! In-memory record source with fault injection.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::error::{MalformedRecord, SourceError, SourceResult};
use crate::traits::{RecordSource, SourceRecord};

/// An in-memory implementation of [`RecordSource`].
///
/// Two faults can be injected: a number of initial fetches that fail
/// transiently, and an offset from which every fetch fails.
#[derive(Debug)]
pub struct InMemorySource<T> {
    name: String,
    records: Vec<SourceRecord<T>>,
    flaky_fetches: AtomicU32,
    fail_from: Option<usize>,
    fetches: AtomicUsize,
}

impl<T> InMemorySource<T> {
    pub fn new(name: impl Into<String>, records: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: name.into(),
            records: records.into_iter().map(Ok).collect(),
            flaky_fetches: AtomicU32::new(0),
            fail_from: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// An empty source.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty())
    }

    /// Append a record that fails to decode.
    pub fn with_malformed(mut self, key: impl Into<String>, reason: impl Into<String>) -> Self {
        self.records.push(Err(MalformedRecord::new(key, reason)));
        self
    }

    /// The next `n` fetches fail with a transient error.
    pub fn flaky(self, n: u32) -> Self {
        self.flaky_fetches.store(n, Ordering::SeqCst);
        self
    }

    /// Every fetch at or past `offset` fails with a transient error.
    pub fn failing_from(mut self, offset: usize) -> Self {
        self.fail_from = Some(offset);
        self
    }

    /// Number of `fetch` calls made so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Clone + Send + Sync> RecordSource<T> for InMemorySource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn total(&self) -> SourceResult<usize> {
        Ok(self.records.len())
    }

    fn fetch(&self, offset: usize, limit: usize) -> SourceResult<Vec<SourceRecord<T>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let flaky = self
            .flaky_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if flaky.is_ok() {
            return Err(SourceError::Unavailable(format!("{} is busy", self.name)));
        }
        if self.fail_from.is_some_and(|from| offset >= from) {
            return Err(SourceError::Unavailable(format!(
                "{} went away at offset {offset}",
                self.name
            )));
        }
        Ok(self
            .records
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_pages_in_order() {
        let src = InMemorySource::new("numbers", 0..7u32);
        let page: Vec<u32> = src
            .fetch(5, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(page, vec![5, 6]);
        assert!(src.fetch(7, 10).unwrap().is_empty());
        assert_eq!(src.total().unwrap(), 7);
    }

    #[test]
    fn flaky_fetches_recover() {
        let src = InMemorySource::new("numbers", 0..3u32).flaky(2);
        assert!(src.fetch(0, 3).is_err());
        assert!(src.fetch(0, 3).is_err());
        assert_eq!(src.fetch(0, 3).unwrap().len(), 3);
        assert_eq!(src.fetch_count(), 3);
    }

    #[test]
    fn failing_from_is_permanent() {
        let src = InMemorySource::new("numbers", 0..10u32).failing_from(6);
        assert!(src.fetch(0, 6).is_ok());
        for _ in 0..3 {
            assert!(src.fetch(6, 4).unwrap_err().is_transient());
        }
    }

    #[test]
    fn malformed_records_are_counted() {
        let src = InMemorySource::new("numbers", 0..2u32).with_malformed("row-9", "bad utf-8");
        assert_eq!(src.total().unwrap(), 3);
        let page = src.fetch(0, 10).unwrap();
        assert_eq!(page[2], Err(MalformedRecord::new("row-9", "bad utf-8")));
    }
}
