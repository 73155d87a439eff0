use std::collections::HashMap;
use std::sync::RwLock;

use dai_types::{ArchiveId, AssetId};

use crate::error::{ArchiveError, ArchiveResult};
use crate::record::ArchiveRecord;
use crate::traits::ArchiveStore;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<ArchiveId, ArchiveRecord>,
    /// Insertion order.
    order: Vec<ArchiveId>,
}

impl Records {
    fn ordered(&self) -> impl Iterator<Item = &ArchiveRecord> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// In-memory archive store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryArchiveStore {
    records: RwLock<Records>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with existing records, e.g. from a state file.
    /// Records keep the order they are given in.
    pub fn from_records(records: impl IntoIterator<Item = ArchiveRecord>) -> Self {
        let mut inner = Records::default();
        for record in records {
            if inner.by_id.insert(record.id.clone(), record.clone()).is_none() {
                inner.order.push(record.id);
            }
        }
        Self {
            records: RwLock::new(inner),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> ArchiveError {
    ArchiveError::Store("archive store lock poisoned".into())
}

impl ArchiveStore for InMemoryArchiveStore {
    fn get(&self, id: &ArchiveId) -> ArchiveResult<Option<ArchiveRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.by_id.get(id).cloned())
    }

    fn insert(&self, record: ArchiveRecord) -> ArchiveResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.by_id.contains_key(&record.id) {
            return Err(ArchiveError::Store(format!(
                "archive record {} already exists",
                record.id
            )));
        }
        records.order.push(record.id.clone());
        records.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    fn update(&self, mut record: ArchiveRecord, expected: u64) -> ArchiveResult<ArchiveRecord> {
        let mut records = self.records.write().map_err(poisoned)?;
        let current = records
            .by_id
            .get_mut(&record.id)
            .ok_or_else(|| ArchiveError::NotFound(record.id.clone()))?;
        if current.version != expected {
            return Err(ArchiveError::StaleVersion {
                id: record.id.clone(),
                expected,
                actual: current.version,
            });
        }
        record.version = expected + 1;
        *current = record.clone();
        Ok(record)
    }

    fn list(&self) -> ArchiveResult<Vec<ArchiveRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.ordered().cloned().collect())
    }

    fn history(&self, subject: &AssetId) -> ArchiveResult<Vec<ArchiveRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .ordered()
            .filter(|r| &r.target.subject() == subject)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use dai_types::{now, ArchiveReason, ArchiveStatus, MediaCategory};

    use super::*;
    use crate::record::{ArchiveTarget, WarningFlags};

    fn record(loc: &str) -> ArchiveRecord {
        let at = now();
        ArchiveRecord {
            id: ArchiveId::new(),
            version: 1,
            name: loc.into(),
            target: ArchiveTarget::Asset {
                asset: AssetId::from_location(loc),
                location: loc.into(),
                category: MediaCategory::Document,
            },
            status: ArchiveStatus::Queued,
            visibility: None,
            reason: ArchiveReason::Research,
            description: String::new(),
            classified_at: None,
            category: None,
            checksum: None,
            flags: WarningFlags::default(),
            created_at: at,
            created_by: "alice".into(),
            updated_at: at,
            actor: "alice".into(),
            deletion: None,
            notes: vec![],
        }
    }

    #[test]
    fn update_is_compare_and_swap() {
        let store = InMemoryArchiveStore::new();
        let r = record("public://a.pdf");
        store.insert(r.clone()).unwrap();

        let mut next = r.clone();
        next.name = "renamed".into();
        let stored = store.update(next, 1).unwrap();
        assert_eq!(stored.version, 2);

        let err = store.update(r.clone(), 1).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::StaleVersion { expected: 1, actual: 2, .. }
        ));
        assert_eq!(store.get(&r.id).unwrap().unwrap().name, "renamed");
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryArchiveStore::new();
        let r = record("public://a.pdf");
        store.insert(r.clone()).unwrap();
        assert!(store.insert(r).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn history_filters_by_subject_in_insertion_order() {
        let store = InMemoryArchiveStore::new();
        let a1 = record("public://a.pdf");
        let b = record("public://b.pdf");
        let a2 = record("public://a.pdf");
        for r in [a1.clone(), b, a2.clone()] {
            store.insert(r).unwrap();
        }
        let ids: Vec<_> = store
            .history(&AssetId::from_location("public://a.pdf"))
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![a1.id, a2.id]);
    }
}
