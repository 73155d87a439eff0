//! A complete, self-consistent inventory generation.

use std::collections::BTreeMap;

use dai_types::AssetId;
use serde::{Deserialize, Serialize};

use crate::record::{AssetRecord, OrphanKey, OrphanReference, UsageClass, UsageKey, UsageRecord};

/// Row counts of one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub assets: usize,
    pub usages: usize,
    pub orphans: usize,
}

/// One inventory generation: every asset, usage and orphan row from a
/// single scan.
///
/// Readers always hold a whole generation behind an `Arc`, so they see
/// either the previous scan or the next one, never a mixture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GenerationSnapshot", into = "GenerationSnapshot")]
pub struct Generation {
    number: u64,
    // Field order is drop order: dependents go before the assets they name.
    orphans: BTreeMap<OrphanKey, OrphanReference>,
    usages: BTreeMap<UsageKey, UsageRecord>,
    assets: BTreeMap<AssetId, AssetRecord>,
}

impl Generation {
    /// An empty generation.
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.number,
            assets: self.assets.len(),
            usages: self.usages.len(),
            orphans: self.orphans.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.usages.is_empty() && self.orphans.is_empty()
    }

    // -- Writes (staging only) ---------------------------------------------

    /// Insert an asset, merging with any existing row of the same identity.
    pub fn upsert_asset(&mut self, record: AssetRecord) {
        match self.assets.get_mut(&record.id) {
            Some(existing) => existing.merge(record),
            None => {
                self.assets.insert(record.id, record);
            }
        }
    }

    /// Record one occurrence of a usage, merging by [`UsageKey`].
    pub fn add_usage(&mut self, usage: UsageRecord) {
        self.usages
            .entry(usage.key())
            .and_modify(|existing| {
                existing.occurrences = existing.occurrences.saturating_add(usage.occurrences)
            })
            .or_insert(usage);
    }

    /// Insert an orphan unless one already exists for the same asset and
    /// source. Returns `true` if inserted.
    pub fn add_orphan(&mut self, orphan: OrphanReference) -> bool {
        let key = orphan.key();
        if self.orphans.contains_key(&key) {
            return false;
        }
        self.orphans.insert(key, orphan);
        true
    }

    /// Clear the staging flag on every asset.
    pub(crate) fn mark_live(&mut self) {
        for asset in self.assets.values_mut() {
            asset.staged = false;
        }
    }

    // -- Reads -------------------------------------------------------------

    pub fn asset(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.assets.get(id)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.values()
    }

    pub fn usages(&self) -> impl Iterator<Item = &UsageRecord> {
        self.usages.values()
    }

    pub fn orphans(&self) -> impl Iterator<Item = &OrphanReference> {
        self.orphans.values()
    }

    /// Usage rows for one asset.
    pub fn usages_of<'a>(&'a self, id: &'a AssetId) -> impl Iterator<Item = &'a UsageRecord> {
        self.usages.values().filter(move |u| &u.asset == id)
    }

    /// Orphan rows for one asset.
    pub fn orphans_of<'a>(
        &'a self,
        id: &'a AssetId,
    ) -> impl Iterator<Item = &'a OrphanReference> {
        self.orphans.values().filter(move |o| &o.asset == id)
    }

    /// Number of distinct reachable usage slots for an asset.
    pub fn usage_count(&self, id: &AssetId) -> usize {
        self.usages_of(id).count()
    }

    /// Number of orphan references for an asset.
    pub fn orphan_count(&self, id: &AssetId) -> usize {
        self.orphans_of(id).count()
    }

    pub fn usage_class(&self, id: &AssetId) -> UsageClass {
        UsageClass::from_counts(self.usage_count(id), self.orphan_count(id))
    }
}

/// Serialized form of a [`Generation`]: flat row lists.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct GenerationSnapshot {
    number: u64,
    #[serde(default)]
    assets: Vec<AssetRecord>,
    #[serde(default)]
    usages: Vec<UsageRecord>,
    #[serde(default)]
    orphans: Vec<OrphanReference>,
}

impl From<GenerationSnapshot> for Generation {
    fn from(snapshot: GenerationSnapshot) -> Self {
        let mut generation = Generation::new(snapshot.number);
        for asset in snapshot.assets {
            generation.upsert_asset(asset);
        }
        for usage in snapshot.usages {
            generation.add_usage(usage);
        }
        for orphan in snapshot.orphans {
            generation.add_orphan(orphan);
        }
        generation
    }
}

impl From<Generation> for GenerationSnapshot {
    fn from(generation: Generation) -> Self {
        Self {
            number: generation.number,
            assets: generation.assets.into_values().collect(),
            usages: generation.usages.into_values().collect(),
            orphans: generation.orphans.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use dai_types::{EmbedMethod, EntityRef, MediaCategory, OrphanReason, OriginKind};

    use super::*;

    fn asset(loc: &str) -> AssetRecord {
        AssetRecord {
            id: AssetId::from_location(loc),
            name: loc.rsplit('/').next().unwrap_or(loc).into(),
            origin: OriginKind::RegisteredFile,
            category: MediaCategory::Document,
            size: Some(1),
            location: loc.into(),
            mime: None,
            file_id: None,
            staged: true,
        }
    }

    fn usage(loc: &str, root: &str) -> UsageRecord {
        UsageRecord {
            asset: AssetId::from_location(loc),
            root: EntityRef::new("node", root),
            field: "body".into(),
            method: EmbedMethod::TextLink,
            occurrences: 1,
        }
    }

    fn orphan(loc: &str, source: &str) -> OrphanReference {
        OrphanReference {
            asset: AssetId::from_location(loc),
            source: EntityRef::new("paragraph", source),
            field: "field_text".into(),
            method: EmbedMethod::TextEmbed,
            reason: OrphanReason::Detached,
            broken_at: EntityRef::new("paragraph", source),
        }
    }

    #[test]
    fn usage_occurrences_accumulate_per_slot() {
        let mut g = Generation::new(1);
        g.add_usage(usage("public://a.pdf", "1"));
        g.add_usage(usage("public://a.pdf", "1"));
        g.add_usage(usage("public://a.pdf", "2"));
        let id = AssetId::from_location("public://a.pdf");
        assert_eq!(g.usage_count(&id), 2);
        let first = g.usages_of(&id).next().unwrap();
        assert_eq!(first.occurrences, 2);
    }

    #[test]
    fn duplicate_orphans_are_rejected() {
        let mut g = Generation::new(1);
        assert!(g.add_orphan(orphan("public://a.pdf", "9")));
        assert!(!g.add_orphan(orphan("public://a.pdf", "9")));
        assert_eq!(g.stats().orphans, 1);
    }

    #[test]
    fn usage_class_reflects_counts() {
        let mut g = Generation::new(1);
        let a = AssetId::from_location("public://a.pdf");
        g.upsert_asset(asset("public://a.pdf"));
        assert_eq!(g.usage_class(&a), UsageClass::Unused);
        g.add_orphan(orphan("public://a.pdf", "9"));
        assert_eq!(g.usage_class(&a), UsageClass::OrphanOnly);
        g.add_usage(usage("public://a.pdf", "1"));
        assert_eq!(g.usage_class(&a), UsageClass::InUse);
    }

    #[test]
    fn json_snapshot_round_trips() {
        let mut g = Generation::new(4);
        g.upsert_asset(asset("public://a.pdf"));
        g.add_usage(usage("public://a.pdf", "1"));
        g.add_orphan(orphan("public://a.pdf", "9"));
        let json = serde_json::to_string(&g).unwrap();
        let back: Generation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert_eq!(back.number(), 4);
    }
}
