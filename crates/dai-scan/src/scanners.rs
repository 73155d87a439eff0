//! The five source scanners.

use std::collections::HashSet;

use dai_normalize::{classify_mime, Location, NormalizedReference};
use dai_types::{AssetId, EmbedMethod, OriginKind};
use tracing::debug;

use crate::extract::extract_references;
use crate::record::{ContentField, FieldValue, LooseFile, ManagedFile, MenuLink, RemoteMedia};
use crate::scanner::{Emitter, RecordScanner, ScanPhase};
use crate::sighting::{AssetMeta, HostSlot, Sighting};

/// Field name recorded for a menu link's own target.
pub const MENU_LINK_FIELD: &str = "link";

/// Origin of a reference found in content rather than in a registry.
fn content_origin(reference: &NormalizedReference) -> OriginKind {
    match reference.location {
        Location::Stored { .. } => OriginKind::LooseFile,
        Location::External { .. } => OriginKind::ExternalUrl,
    }
}

fn hosted(
    raw: &str,
    reference: NormalizedReference,
    origin: OriginKind,
    host: HostSlot,
    meta: AssetMeta,
) -> Sighting {
    Sighting {
        raw: raw.to_string(),
        reference,
        origin,
        host: Some(host),
        meta,
    }
}

/// Managed-file registry entries and the file fields that use them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManagedFileScanner;

impl RecordScanner for ManagedFileScanner {
    type Record = ManagedFile;

    fn phase(&self) -> ScanPhase {
        ScanPhase::ManagedFiles
    }

    fn key(&self, record: &ManagedFile) -> String {
        format!("file/{}", record.file_id)
    }

    fn emit(&self, record: &ManagedFile, out: &mut Emitter<'_>) {
        let Some(mut reference) = out.resolve(&record.uri) else {
            return;
        };
        if let Some(category) = record.mime.as_deref().and_then(classify_mime) {
            reference.category = category;
        }
        let meta = AssetMeta {
            name: Some(record.filename.clone()),
            size: record.size,
            mime: record.mime.clone(),
            file_id: Some(record.file_id),
        };
        for usage in &record.usages {
            out.push(hosted(
                &record.uri,
                reference.clone(),
                OriginKind::RegisteredFile,
                HostSlot::new(usage.host.clone(), &usage.field, EmbedMethod::FieldReference),
                meta.clone(),
            ));
        }
        out.push(Sighting {
            raw: record.uri.clone(),
            reference,
            origin: OriginKind::RegisteredFile,
            host: None,
            meta,
        });
    }
}

/// Files on disk that the registry does not know about.
#[derive(Clone, Debug, Default)]
pub struct LooseFileScanner {
    registered: HashSet<AssetId>,
}

impl LooseFileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip files whose identity is already registered.
    pub fn skipping(registered: HashSet<AssetId>) -> Self {
        Self { registered }
    }
}

impl RecordScanner for LooseFileScanner {
    type Record = LooseFile;

    fn phase(&self) -> ScanPhase {
        ScanPhase::LooseFiles
    }

    fn key(&self, record: &LooseFile) -> String {
        record.uri()
    }

    fn emit(&self, record: &LooseFile, out: &mut Emitter<'_>) {
        let uri = record.uri();
        let Some(reference) = out.resolve(&uri) else {
            return;
        };
        if self.registered.contains(&reference.asset_id()) {
            debug!(uri = %uri, "already registered");
            return;
        }
        out.push(Sighting {
            raw: uri,
            reference,
            origin: OriginKind::LooseFile,
            host: None,
            meta: AssetMeta {
                size: Some(record.size),
                ..AssetMeta::default()
            },
        });
    }
}

/// Formatted text and link fields on content entities.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentFieldScanner;

impl RecordScanner for ContentFieldScanner {
    type Record = ContentField;

    fn phase(&self) -> ScanPhase {
        ScanPhase::ContentFields
    }

    fn key(&self, record: &ContentField) -> String {
        format!("{}:{}", record.host, record.field)
    }

    fn emit(&self, record: &ContentField, out: &mut Emitter<'_>) {
        match &record.value {
            FieldValue::Text { value } => {
                for found in extract_references(value) {
                    let Some(reference) = out.resolve(&found.raw) else {
                        continue;
                    };
                    let origin = content_origin(&reference);
                    out.push(hosted(
                        &found.raw,
                        reference,
                        origin,
                        HostSlot::new(record.host.clone(), &record.field, found.method),
                        AssetMeta::default(),
                    ));
                }
            }
            FieldValue::Link { uri, .. } => {
                let Some(reference) = out.resolve(uri) else {
                    return;
                };
                let origin = content_origin(&reference);
                out.push(hosted(
                    uri,
                    reference,
                    origin,
                    HostSlot::new(record.host.clone(), &record.field, EmbedMethod::RawLink),
                    AssetMeta::default(),
                ));
            }
        }
    }
}

/// Remote-media entities and the media fields that reference them.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteMediaScanner;

impl RecordScanner for RemoteMediaScanner {
    type Record = RemoteMedia;

    fn phase(&self) -> ScanPhase {
        ScanPhase::RemoteMedia
    }

    fn key(&self, record: &RemoteMedia) -> String {
        record.media.to_string()
    }

    fn emit(&self, record: &RemoteMedia, out: &mut Emitter<'_>) {
        let Some(reference) = out.resolve(&record.url) else {
            return;
        };
        let meta = AssetMeta {
            name: record.name.clone(),
            ..AssetMeta::default()
        };
        for usage in &record.usages {
            out.push(hosted(
                &record.url,
                reference.clone(),
                OriginKind::RemoteReference,
                HostSlot::new(usage.host.clone(), &usage.field, EmbedMethod::MediaReference),
                meta.clone(),
            ));
        }
        out.push(Sighting {
            raw: record.url.clone(),
            reference,
            origin: OriginKind::RemoteReference,
            host: None,
            meta,
        });
    }
}

/// Navigation-menu links pointing at assets.
#[derive(Clone, Copy, Debug, Default)]
pub struct MenuLinkScanner;

impl RecordScanner for MenuLinkScanner {
    type Record = MenuLink;

    fn phase(&self) -> ScanPhase {
        ScanPhase::MenuLinks
    }

    fn key(&self, record: &MenuLink) -> String {
        record.link.to_string()
    }

    fn emit(&self, record: &MenuLink, out: &mut Emitter<'_>) {
        let Some(reference) = out.resolve(&record.uri) else {
            return;
        };
        let origin = content_origin(&reference);
        out.push(hosted(
            &record.uri,
            reference,
            origin,
            HostSlot::new(record.link.clone(), MENU_LINK_FIELD, EmbedMethod::MenuLink),
            AssetMeta::default(),
        ));
    }
}
