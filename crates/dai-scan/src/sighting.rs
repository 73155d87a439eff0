use dai_normalize::NormalizedReference;
use dai_types::{AssetId, EmbedMethod, EntityRef, OriginKind};

/// The entity field a sighting was found in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostSlot {
    pub entity: EntityRef,
    pub field: String,
    pub method: EmbedMethod,
}

impl HostSlot {
    pub fn new(entity: EntityRef, field: impl Into<String>, method: EmbedMethod) -> Self {
        Self {
            entity,
            field: field.into(),
            method,
        }
    }
}

/// Source metadata carried along with a sighting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMeta {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub mime: Option<String>,
    /// Managed-file registry id, for registered files.
    pub file_id: Option<u64>,
}

/// One candidate asset observation emitted by a scanner.
///
/// A sighting without a host registers the asset's existence (registry
/// entries, files on disk, media entities). A sighting with a host is a
/// reference that still has to pass reachability resolution before it
/// counts as usage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sighting {
    pub raw: String,
    pub reference: NormalizedReference,
    pub origin: OriginKind,
    pub host: Option<HostSlot>,
    pub meta: AssetMeta,
}

impl Sighting {
    pub fn asset_id(&self) -> AssetId {
        self.reference.asset_id()
    }

    pub fn is_registration(&self) -> bool {
        self.host.is_none()
    }
}
