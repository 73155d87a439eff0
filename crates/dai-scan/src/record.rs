//! Record shapes read from each source of truth.

use dai_normalize::StorageScheme;
use dai_types::EntityRef;
use serde::{Deserialize, Serialize};

/// A host entity field that references an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUsage {
    pub host: EntityRef,
    pub field: String,
}

impl FieldUsage {
    pub fn new(host: EntityRef, field: impl Into<String>) -> Self {
        Self {
            host,
            field: field.into(),
        }
    }
}

/// An entry in the managed-file registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    pub file_id: u64,
    /// Storage URI, e.g. `public://docs/report.pdf`.
    pub uri: String,
    pub filename: String,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// File and image fields that reference this file.
    #[serde(default)]
    pub usages: Vec<FieldUsage>,
}

/// A file found on disk under a storage scheme root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LooseFile {
    pub scheme: StorageScheme,
    /// Path relative to the scheme root, `/`-separated.
    pub path: String,
    pub size: u64,
}

impl LooseFile {
    /// The storage URI for this file.
    pub fn uri(&self) -> String {
        format!("{}{}", self.scheme.uri_prefix(), self.path)
    }
}

/// The value of a structured-content field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    /// Formatted text (markup).
    Text { value: String },
    /// A link field.
    Link {
        uri: String,
        #[serde(default)]
        title: String,
    },
}

/// One field value on a content entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentField {
    pub host: EntityRef,
    pub field: String,
    pub value: FieldValue,
}

/// A remote-media entity (hosted video, audio, etc.).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMedia {
    pub media: EntityRef,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Media-reference fields that point at this media entity.
    #[serde(default)]
    pub usages: Vec<FieldUsage>,
}

/// A navigation-menu link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLink {
    pub link: EntityRef,
    pub uri: String,
    #[serde(default)]
    pub title: String,
}
