//! The archive lifecycle state machine.
//!
//! ```text
//! queued ──execute──▶ archived-public ◀─toggle─▶ archived-admin
//!   │                        │                          │
//!   └─remove─▶ archived-deleted ◀─unarchive / delete / remove / modified (post)
//!                                  exemption-void ◀─ modified (pre)
//! ```

use std::sync::Arc;

use dai_types::{
    now, ArchiveId, ArchiveReason, ArchiveStatus, AssetId, ComplianceCategory, Timestamp,
    Visibility,
};
use tracing::{info, warn};
use url::Url;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, ArchiveResult};
use crate::record::{
    content_checksum, ArchiveNote, ArchiveRecord, ArchiveTarget, DeletionAction, DeletionInfo,
    ManualKind, WarningFlags,
};
use crate::traits::{ArchiveStore, LiveInventory};

/// Request to queue a file asset for archiving.
#[derive(Clone, Debug)]
pub struct QueueRequest {
    pub asset: AssetId,
    pub reason: ArchiveReason,
    pub description: String,
}

/// A manually entered page or URL, archived directly into an active state.
#[derive(Clone, Debug)]
pub struct ManualEntry {
    pub url: String,
    pub title: String,
    pub kind: ManualKind,
    pub visibility: Visibility,
    pub reason: ArchiveReason,
    pub description: String,
}

/// Editable fields of a manual entry. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ManualEdit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Outcome of an integrity check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityCheck {
    /// The content matches the checksum taken at execution.
    Intact,
    /// The content changed; the record moved to a terminal state.
    Changed(ArchiveRecord),
    /// No checksum was captured, so nothing can be compared.
    Unverified,
}

/// Drives archive records through their lifecycle.
///
/// Each action either commits in full (status, timestamp and flags) or
/// fails and leaves the record untouched. Actions name the version they
/// were based on and fail with [`ArchiveError::StaleVersion`] if the
/// record has moved on.
pub struct ArchiveService {
    store: Arc<dyn ArchiveStore>,
    inventory: Arc<dyn LiveInventory>,
    config: ArchiveConfig,
}

impl ArchiveService {
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        inventory: Arc<dyn LiveInventory>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            config,
        }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    // -- Creation ------------------------------------------------------------

    /// Queue a file asset from the live inventory.
    pub fn queue(&self, request: QueueRequest, actor: &str) -> ArchiveResult<ArchiveRecord> {
        validate_reason(request.reason, &request.description)?;
        let asset = self.inventory.asset(&request.asset)?.ok_or_else(|| {
            ArchiveError::Validation(format!(
                "asset {} is not in the live inventory",
                request.asset.short_hex()
            ))
        })?;
        if !asset.origin.is_file() {
            return Err(ArchiveError::Validation(format!(
                "{} is not a file; archive it as a manual entry",
                asset.location
            )));
        }

        let target = ArchiveTarget::Asset {
            asset: asset.id,
            location: asset.location.clone(),
            category: asset.category,
        };
        let forced = self.open_history_check(&target)?;
        let record = new_record(
            asset.name,
            target,
            ArchiveStatus::Queued,
            request.reason,
            request.description,
            forced,
            actor,
        );
        self.store.insert(record.clone())?;
        info!(id = %record.id, asset = %asset.id.short_hex(), forced_post_deadline = forced, "archive queued");
        Ok(record)
    }

    /// Archive a page or external URL directly into an active state.
    pub fn manual_entry(&self, entry: ManualEntry, actor: &str) -> ArchiveResult<ArchiveRecord> {
        validate_reason(entry.reason, &entry.description)?;
        let url = self.validate_url(&entry.url)?;
        let title = entry.title.trim();
        if title.is_empty() {
            return Err(ArchiveError::Validation("title is required".into()));
        }

        let target = ArchiveTarget::Manual {
            url,
            kind: entry.kind,
        };
        let forced = self.open_history_check(&target)?;
        let mut record = new_record(
            title.to_string(),
            target,
            ArchiveStatus::for_visibility(entry.visibility),
            entry.reason,
            entry.description,
            forced,
            actor,
        );
        record.visibility = Some(entry.visibility);
        record.classify(record.created_at, self.config.deadline);
        self.store.insert(record.clone())?;
        info!(id = %record.id, to = %record.status, "manual entry archived");
        Ok(record)
    }

    // -- Transitions ---------------------------------------------------------

    /// Move a queued record into an active state.
    ///
    /// Blocked while the asset has live usages unless in-use archiving is
    /// enabled. Stamps the classification time.
    pub fn execute(
        &self,
        id: &ArchiveId,
        version: u64,
        visibility: Visibility,
        checksum: Option<String>,
        actor: &str,
    ) -> ArchiveResult<ArchiveRecord> {
        self.transition(id, version, actor, "execute", |record, at| {
            if record.status != ArchiveStatus::Queued {
                return Err(invalid(record, "execute"));
            }
            if let ArchiveTarget::Asset { asset, .. } = &record.target {
                let usages = self.inventory.usage_count(asset)?;
                if usages > 0 {
                    if !self.config.allow_in_use_archiving {
                        return Err(ArchiveError::InUse {
                            asset: *asset,
                            usages,
                        });
                    }
                    record.flags.archived_while_in_use = true;
                }
            }
            record.classify(at, self.config.deadline);
            record.status = ArchiveStatus::for_visibility(visibility);
            record.visibility = Some(visibility);
            record.checksum = checksum;
            Ok(())
        })
    }

    /// Switch an active record between public and admin visibility.
    pub fn toggle_visibility(
        &self,
        id: &ArchiveId,
        version: u64,
        actor: &str,
    ) -> ArchiveResult<ArchiveRecord> {
        self.transition(id, version, actor, "toggle visibility of", |record, _| {
            let current = match record.status {
                ArchiveStatus::ArchivedPublic => Visibility::Public,
                ArchiveStatus::ArchivedAdmin => Visibility::Admin,
                _ => return Err(invalid(record, "toggle visibility of")),
            };
            let next = current.toggled();
            record.status = ArchiveStatus::for_visibility(next);
            record.visibility = Some(next);
            Ok(())
        })
    }

    /// Withdraw an active record.
    pub fn unarchive(&self, id: &ArchiveId, version: u64, actor: &str) -> ArchiveResult<ArchiveRecord> {
        self.transition(id, version, actor, "unarchive", |record, at| {
            if !record.status.is_active() {
                return Err(invalid(record, "unarchive"));
            }
            end(record, DeletionAction::Unarchived, at, actor);
            Ok(())
        })
    }

    /// Record that the underlying file of an active record was deleted.
    pub fn delete_underlying(
        &self,
        id: &ArchiveId,
        version: u64,
        actor: &str,
    ) -> ArchiveResult<ArchiveRecord> {
        self.transition(id, version, actor, "delete the file of", |record, at| {
            if !record.status.is_active() {
                return Err(invalid(record, "delete the file of"));
            }
            if record.is_manual() {
                return Err(ArchiveError::Validation(
                    "manual entries have no underlying file".into(),
                ));
            }
            end(record, DeletionAction::UnderlyingDeleted, at, actor);
            Ok(())
        })
    }

    /// Remove a queued or active entry.
    pub fn remove_entry(&self, id: &ArchiveId, version: u64, actor: &str) -> ArchiveResult<ArchiveRecord> {
        self.transition(id, version, actor, "remove", |record, at| {
            end(record, DeletionAction::EntryRemoved, at, actor);
            Ok(())
        })
    }

    /// Apply a content change to an active record.
    ///
    /// A pre-deadline record is voided. A post-deadline record has no
    /// exemption to void and is deleted with the content-modified flag.
    pub fn integrity_changed(
        &self,
        id: &ArchiveId,
        version: u64,
        actor: &str,
    ) -> ArchiveResult<ArchiveRecord> {
        let record = self.transition(id, version, actor, "apply a content change to", |record, at| {
            if !record.status.is_active() {
                return Err(invalid(record, "apply a content change to"));
            }
            match record.category {
                Some(ComplianceCategory::PreDeadline) => {
                    record.status = ArchiveStatus::ExemptionVoid;
                }
                _ => {
                    record.flags.content_modified = true;
                    end(record, DeletionAction::ContentModified, at, actor);
                }
            }
            Ok(())
        })?;
        if record.status == ArchiveStatus::ExemptionVoid {
            warn!(id = %record.id, subject = %record.target.subject().short_hex(), "exemption voided");
        }
        Ok(record)
    }

    /// Compare current content against the checksum taken at execution.
    pub fn check_integrity(
        &self,
        id: &ArchiveId,
        version: u64,
        content: &[u8],
        actor: &str,
    ) -> ArchiveResult<IntegrityCheck> {
        let record = self.get(id)?;
        if !record.status.is_active() {
            return Err(invalid(&record, "check the integrity of"));
        }
        let Some(expected) = &record.checksum else {
            return Ok(IntegrityCheck::Unverified);
        };
        if *expected == content_checksum(content) {
            return Ok(IntegrityCheck::Intact);
        }
        self.integrity_changed(id, version, actor)
            .map(IntegrityCheck::Changed)
    }

    /// Edit the descriptive fields of a non-terminal manual entry.
    pub fn edit(
        &self,
        id: &ArchiveId,
        version: u64,
        edit: ManualEdit,
        actor: &str,
    ) -> ArchiveResult<ArchiveRecord> {
        let url = edit.url.as_deref().map(|u| self.validate_url(u)).transpose()?;
        self.transition(id, version, actor, "edit", |record, _| {
            if !record.is_manual() {
                return Err(invalid(record, "edit"));
            }
            if let Some(url) = url {
                let ArchiveTarget::Manual { kind, .. } = record.target else {
                    return Err(invalid(record, "edit"));
                };
                let moved = ArchiveTarget::Manual { url, kind };
                if moved.subject() != record.target.subject() {
                    self.retarget_check(&moved)?;
                }
                record.target = moved;
            }
            if let Some(title) = edit.title {
                let title = title.trim();
                if title.is_empty() {
                    return Err(ArchiveError::Validation("title is required".into()));
                }
                record.name = title.to_string();
            }
            if let Some(description) = edit.description {
                validate_reason(record.reason, &description)?;
                record.description = description;
            }
            Ok(())
        })
    }

    /// Append a note. Allowed in every status, terminal ones included.
    pub fn add_note(&self, id: &ArchiveId, text: &str, actor: &str) -> ArchiveResult<ArchiveRecord> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ArchiveError::Validation("note text is required".into()));
        }
        let mut record = self.get(id)?;
        let version = record.version;
        record.notes.push(ArchiveNote {
            at: now(),
            actor: actor.to_string(),
            text: text.to_string(),
        });
        self.store.update(record, version)
    }

    // -- Reads ---------------------------------------------------------------

    pub fn get(&self, id: &ArchiveId) -> ArchiveResult<ArchiveRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| ArchiveError::NotFound(id.clone()))
    }

    pub fn list(&self) -> ArchiveResult<Vec<ArchiveRecord>> {
        self.store.list()
    }

    /// Every archival episode for one underlying resource.
    pub fn history(&self, subject: &AssetId) -> ArchiveResult<Vec<ArchiveRecord>> {
        self.store.history(subject)
    }

    // -- Internals -----------------------------------------------------------

    fn transition<F>(
        &self,
        id: &ArchiveId,
        version: u64,
        actor: &str,
        action: &'static str,
        apply: F,
    ) -> ArchiveResult<ArchiveRecord>
    where
        F: FnOnce(&mut ArchiveRecord, Timestamp) -> ArchiveResult<()>,
    {
        let current = self.get(id)?;
        if current.version != version {
            return Err(ArchiveError::StaleVersion {
                id: id.clone(),
                expected: version,
                actual: current.version,
            });
        }
        if current.is_terminal() {
            return Err(invalid(&current, action));
        }

        let mut next = current.clone();
        let at = now();
        apply(&mut next, at)?;
        next.updated_at = at;
        next.actor = actor.to_string();

        let stored = self.store.update(next, version)?;
        info!(
            id = %stored.id,
            action,
            from = %current.status,
            to = %stored.status,
            version = stored.version,
            "archive transition"
        );
        Ok(stored)
    }

    /// Reject a new episode while another is open, and report whether an
    /// earlier episode was voided.
    fn open_history_check(&self, target: &ArchiveTarget) -> ArchiveResult<bool> {
        let history = self.store.history(&target.subject())?;
        if let Some(open) = history.iter().find(|r| !r.is_terminal()) {
            return Err(ArchiveError::Validation(format!(
                "{} already has open archive record {}",
                target.reference(),
                open.id
            )));
        }
        Ok(history
            .iter()
            .any(|r| r.status == ArchiveStatus::ExemptionVoid))
    }

    /// A record may only move to a resource with no open episode and no
    /// voided exemption in its history.
    fn retarget_check(&self, target: &ArchiveTarget) -> ArchiveResult<()> {
        if self.open_history_check(target)? {
            return Err(ArchiveError::Validation(format!(
                "{} has a voided exemption; archive it as a new entry",
                target.reference()
            )));
        }
        Ok(())
    }

    /// Accept a site-relative path or an absolute URL with an allowed
    /// scheme and a host.
    fn validate_url(&self, raw: &str) -> ArchiveResult<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ArchiveError::Validation("url is required".into()));
        }
        if raw.starts_with('/') && !raw.starts_with("//") {
            return Ok(raw.to_string());
        }
        let parsed = Url::parse(raw)
            .map_err(|e| ArchiveError::Validation(format!("{raw:?} is not a valid url: {e}")))?;
        if !self
            .config
            .manual_url_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(parsed.scheme()))
        {
            return Err(ArchiveError::Validation(format!(
                "scheme {:?} is not allowed",
                parsed.scheme()
            )));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ArchiveError::Validation(format!("{raw:?} has no host")));
        }
        Ok(raw.to_string())
    }
}

fn new_record(
    name: String,
    target: ArchiveTarget,
    status: ArchiveStatus,
    reason: ArchiveReason,
    description: String,
    forced: bool,
    actor: &str,
) -> ArchiveRecord {
    let at = now();
    ArchiveRecord {
        id: ArchiveId::new(),
        version: 1,
        name,
        target,
        status,
        visibility: None,
        reason,
        description,
        classified_at: None,
        category: None,
        checksum: None,
        flags: WarningFlags {
            forced_post_deadline: forced,
            ..WarningFlags::default()
        },
        created_at: at,
        created_by: actor.to_string(),
        updated_at: at,
        actor: actor.to_string(),
        deletion: None,
        notes: Vec::new(),
    }
}

fn validate_reason(reason: ArchiveReason, description: &str) -> ArchiveResult<()> {
    if reason == ArchiveReason::Other && description.trim().is_empty() {
        return Err(ArchiveError::Validation(
            "reason \"other\" requires a description".into(),
        ));
    }
    Ok(())
}

fn invalid(record: &ArchiveRecord, action: &'static str) -> ArchiveError {
    ArchiveError::InvalidTransition {
        id: record.id.clone(),
        status: record.status,
        action,
    }
}

fn end(record: &mut ArchiveRecord, action: DeletionAction, at: Timestamp, actor: &str) {
    record.status = ArchiveStatus::ArchivedDeleted;
    record.deletion = Some(DeletionInfo {
        action,
        at,
        actor: actor.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use dai_inventory::{AssetRecord, Generation, InMemoryInventoryStore, UsageRecord};
    use dai_types::{EmbedMethod, EntityRef, MediaCategory, OriginKind};

    use super::*;
    use crate::memory::InMemoryArchiveStore;
    use crate::traits::StoreInventory;

    const USED: &str = "public://used.pdf";
    const SPARE: &str = "public://spare.pdf";
    const REMOTE: &str = "https://example.org/remote.pdf";

    fn asset(loc: &str, origin: OriginKind) -> AssetRecord {
        AssetRecord {
            id: AssetId::from_location(loc),
            name: loc.rsplit('/').next().unwrap_or(loc).into(),
            origin,
            category: MediaCategory::Document,
            size: Some(10),
            location: loc.into(),
            mime: None,
            file_id: None,
            staged: false,
        }
    }

    fn inventory() -> Arc<StoreInventory> {
        let mut g = Generation::new(1);
        g.upsert_asset(asset(USED, OriginKind::RegisteredFile));
        g.upsert_asset(asset(SPARE, OriginKind::LooseFile));
        g.upsert_asset(asset(REMOTE, OriginKind::ExternalUrl));
        g.add_usage(UsageRecord {
            asset: AssetId::from_location(USED),
            root: EntityRef::new("node", "1"),
            field: "body".into(),
            method: EmbedMethod::TextLink,
            occurrences: 1,
        });
        Arc::new(StoreInventory::new(Arc::new(InMemoryInventoryStore::with_live(g))))
    }

    /// Deadline one year out: everything classified now is pre-deadline.
    fn service() -> ArchiveService {
        service_with(ArchiveConfig::with_deadline(now() + Duration::days(365)))
    }

    fn service_with(config: ArchiveConfig) -> ArchiveService {
        ArchiveService::new(Arc::new(InMemoryArchiveStore::new()), inventory(), config)
    }

    fn queue(svc: &ArchiveService, loc: &str) -> ArchiveResult<ArchiveRecord> {
        svc.queue(
            QueueRequest {
                asset: AssetId::from_location(loc),
                reason: ArchiveReason::Recordkeeping,
                description: String::new(),
            },
            "alice",
        )
    }

    fn archived(svc: &ArchiveService, loc: &str, content: &[u8]) -> ArchiveRecord {
        let r = queue(svc, loc).unwrap();
        svc.execute(
            &r.id,
            r.version,
            Visibility::Public,
            Some(content_checksum(content)),
            "alice",
        )
        .unwrap()
    }

    fn manual(url: &str) -> ManualEntry {
        ManualEntry {
            url: url.into(),
            title: "Old policy page".into(),
            kind: ManualKind::Page,
            visibility: Visibility::Admin,
            reason: ArchiveReason::Reference,
            description: String::new(),
        }
    }

    #[test]
    fn execute_stamps_classification_once() {
        let svc = service();
        let r = archived(&svc, SPARE, b"v1");
        assert_eq!(r.status, ArchiveStatus::ArchivedPublic);
        assert_eq!(r.version, 2);
        assert_eq!(r.category, Some(ComplianceCategory::PreDeadline));
        let stamped = r.classified_at.unwrap();

        let r = svc.toggle_visibility(&r.id, r.version, "bob").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedAdmin);
        assert_eq!(r.visibility, Some(Visibility::Admin));
        assert_eq!(r.actor, "bob");
        let r = svc.toggle_visibility(&r.id, r.version, "bob").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedPublic);
        assert_eq!(r.classified_at, Some(stamped));

        let r = svc.unarchive(&r.id, r.version, "bob").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedDeleted);
        assert_eq!(r.classified_at, Some(stamped));
        assert_eq!(r.deletion.unwrap().action, DeletionAction::Unarchived);
    }

    #[test]
    fn in_use_gate_blocks_unless_enabled() {
        let svc = service();
        let r = queue(&svc, USED).unwrap();
        let err = svc
            .execute(&r.id, r.version, Visibility::Public, None, "alice")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InUse { usages: 1, .. }));
        let unchanged = svc.get(&r.id).unwrap();
        assert_eq!(unchanged, r);

        let svc = service_with(ArchiveConfig {
            allow_in_use_archiving: true,
            ..ArchiveConfig::with_deadline(now() + Duration::days(365))
        });
        let r = queue(&svc, USED).unwrap();
        let r = svc
            .execute(&r.id, r.version, Visibility::Public, None, "alice")
            .unwrap();
        assert!(r.flags.archived_while_in_use);
    }

    #[test]
    fn terminal_records_reject_every_transition() {
        let svc = service();
        let r = archived(&svc, SPARE, b"v1");
        let r = svc.delete_underlying(&r.id, r.version, "alice").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedDeleted);
        let v = r.version;

        let attempts = [
            svc.execute(&r.id, v, Visibility::Admin, None, "x"),
            svc.toggle_visibility(&r.id, v, "x"),
            svc.unarchive(&r.id, v, "x"),
            svc.delete_underlying(&r.id, v, "x"),
            svc.remove_entry(&r.id, v, "x"),
            svc.integrity_changed(&r.id, v, "x"),
            svc.edit(&r.id, v, ManualEdit::default(), "x"),
        ];
        for attempt in attempts {
            assert!(matches!(
                attempt,
                Err(ArchiveError::InvalidTransition {
                    status: ArchiveStatus::ArchivedDeleted,
                    ..
                })
            ));
        }
        assert_eq!(svc.get(&r.id).unwrap(), r);

        let noted = svc.add_note(&r.id, "file purged by request", "alice").unwrap();
        assert_eq!(noted.notes.len(), 1);
        assert_eq!(noted.version, v + 1);
        assert_eq!(noted.status, ArchiveStatus::ArchivedDeleted);
        assert_eq!(noted.classified_at, r.classified_at);
    }

    #[test]
    fn stale_versions_are_rejected() {
        let svc = service();
        let r = archived(&svc, SPARE, b"v1");
        let err = svc.toggle_visibility(&r.id, 1, "bob").unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::StaleVersion {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(svc.get(&r.id).unwrap().status, ArchiveStatus::ArchivedPublic);
    }

    #[test]
    fn pre_deadline_change_voids_and_downgrades_later_episodes() {
        let svc = service();
        let first = archived(&svc, SPARE, b"v1");
        assert_eq!(
            svc.check_integrity(&first.id, first.version, b"v1", "cron").unwrap(),
            IntegrityCheck::Intact
        );
        let IntegrityCheck::Changed(voided) =
            svc.check_integrity(&first.id, first.version, b"v2", "cron").unwrap()
        else {
            panic!("expected a change");
        };
        assert_eq!(voided.status, ArchiveStatus::ExemptionVoid);
        assert_eq!(voided.classified_at, first.classified_at);

        let second = archived(&svc, SPARE, b"v2");
        assert_ne!(second.id, first.id);
        assert!(second.flags.forced_post_deadline);
        assert_eq!(second.category, Some(ComplianceCategory::PostDeadline));
        assert_eq!(svc.history(&AssetId::from_location(SPARE)).unwrap().len(), 2);
        assert_eq!(svc.get(&first.id).unwrap(), voided);
    }

    #[test]
    fn post_deadline_change_deletes_with_flag() {
        let svc = service_with(ArchiveConfig::with_deadline(now() - Duration::days(1)));
        let r = archived(&svc, SPARE, b"v1");
        assert_eq!(r.category, Some(ComplianceCategory::PostDeadline));
        let r = svc.integrity_changed(&r.id, r.version, "cron").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedDeleted);
        assert!(r.flags.content_modified);
        assert_eq!(r.deletion.unwrap().action, DeletionAction::ContentModified);

        let again = archived(&svc, SPARE, b"v2");
        assert!(!again.flags.forced_post_deadline);
    }

    #[test]
    fn missing_checksum_is_unverified() {
        let svc = service();
        let r = queue(&svc, SPARE).unwrap();
        let r = svc
            .execute(&r.id, r.version, Visibility::Admin, None, "alice")
            .unwrap();
        assert_eq!(
            svc.check_integrity(&r.id, r.version, b"anything", "cron").unwrap(),
            IntegrityCheck::Unverified
        );
    }

    #[test]
    fn queue_validation() {
        let svc = service();
        assert!(matches!(
            queue(&svc, "public://nowhere.pdf"),
            Err(ArchiveError::Validation(_))
        ));
        assert!(matches!(queue(&svc, REMOTE), Err(ArchiveError::Validation(_))));
        let other = svc.queue(
            QueueRequest {
                asset: AssetId::from_location(SPARE),
                reason: ArchiveReason::Other,
                description: "  ".into(),
            },
            "alice",
        );
        assert!(matches!(other, Err(ArchiveError::Validation(_))));

        queue(&svc, SPARE).unwrap();
        assert!(matches!(queue(&svc, SPARE), Err(ArchiveError::Validation(_))));
    }

    #[test]
    fn removing_a_queued_entry_leaves_it_unclassified() {
        let svc = service();
        let r = queue(&svc, SPARE).unwrap();
        let r = svc.remove_entry(&r.id, r.version, "alice").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedDeleted);
        assert_eq!(r.classified_at, None);
        assert_eq!(r.category, None);
        assert_eq!(r.deletion.unwrap().action, DeletionAction::EntryRemoved);
    }

    #[test]
    fn manual_entries_are_active_immediately_and_editable() {
        let svc = service();
        let r = svc.manual_entry(manual("/about/history"), "alice").unwrap();
        assert_eq!(r.status, ArchiveStatus::ArchivedAdmin);
        assert!(r.classified_at.is_some());
        assert_eq!(r.target.reference(), "/about/history");

        let edited = svc
            .edit(
                &r.id,
                r.version,
                ManualEdit {
                    title: Some("History (2019)".into()),
                    url: Some("https://example.org/about/history".into()),
                    description: None,
                },
                "bob",
            )
            .unwrap();
        assert_eq!(edited.name, "History (2019)");
        assert_eq!(edited.target.reference(), "https://example.org/about/history");
        assert_eq!(edited.status, r.status);
        assert_eq!(edited.classified_at, r.classified_at);

        assert!(matches!(
            svc.delete_underlying(&edited.id, edited.version, "bob"),
            Err(ArchiveError::Validation(_))
        ));
    }

    #[test]
    fn edits_cannot_move_a_record_onto_voided_or_open_history() {
        let svc = service();
        let policy = svc.manual_entry(manual("/policy"), "alice").unwrap();
        svc.integrity_changed(&policy.id, policy.version, "cron").unwrap();

        let other = svc.manual_entry(manual("/other"), "alice").unwrap();
        let to = |url: &str| ManualEdit {
            url: Some(url.into()),
            ..ManualEdit::default()
        };
        assert!(matches!(
            svc.edit(&other.id, other.version, to("/policy"), "bob"),
            Err(ArchiveError::Validation(_))
        ));

        let open = svc.manual_entry(manual("/open"), "alice").unwrap();
        assert!(matches!(
            svc.edit(&other.id, other.version, to("/open"), "bob"),
            Err(ArchiveError::Validation(_))
        ));
        assert_eq!(svc.get(&other.id).unwrap(), other);
        assert_eq!(svc.history(&open.target.subject()).unwrap().len(), 1);

        let kept = svc
            .edit(&other.id, other.version, to("/other"), "bob")
            .unwrap();
        assert_eq!(kept.target.reference(), "/other");
        let moved = svc
            .edit(&kept.id, kept.version, to("/elsewhere"), "bob")
            .unwrap();
        assert_eq!(moved.target.reference(), "/elsewhere");
        assert_eq!(moved.category, Some(ComplianceCategory::PreDeadline));
    }

    #[test]
    fn manual_urls_are_validated() {
        let svc = service();
        for bad in ["", "ftp://example.org/a", "javascript:alert(1)", "//example.org/x", "not a url"] {
            assert!(
                matches!(svc.manual_entry(manual(bad), "alice"), Err(ArchiveError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(svc.manual_entry(manual("https://example.org/a"), "alice").is_ok());
    }

    #[test]
    fn asset_records_are_not_editable() {
        let svc = service();
        let r = queue(&svc, SPARE).unwrap();
        assert!(matches!(
            svc.edit(&r.id, r.version, ManualEdit::default(), "alice"),
            Err(ArchiveError::InvalidTransition { action: "edit", .. })
        ));
    }
}
