//! Site snapshots: the content graph and scan sources as one JSON document.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dai_graph::{ComponentEntity, ContentNode, InMemoryContentGraph, RootEntity};
use dai_inventory::ScanSources;
use dai_normalize::StorageScheme;
use dai_scan::{
    ContentField, FilesystemSource, InMemorySource, LooseFile, ManagedFile, MenuLink, RecordSource,
    RemoteMedia,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// A directory holding the files of one storage scheme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRoot {
    pub scheme: StorageScheme,
    pub path: PathBuf,
}

/// Everything a scan reads from a site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSnapshot {
    pub roots: Vec<RootEntity>,
    pub components: Vec<ComponentEntity>,
    pub managed_files: Vec<ManagedFile>,
    pub content_fields: Vec<ContentField>,
    pub remote_media: Vec<RemoteMedia>,
    pub menu_links: Vec<MenuLink>,
    pub file_roots: Vec<FileRoot>,
}

impl SiteSnapshot {
    /// Read a snapshot from a JSON file. Relative file roots are resolved
    /// against the snapshot's directory.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)?;
        let mut snapshot: SiteSnapshot = serde_json::from_str(&text)
            .map_err(|e| SdkError::Snapshot(format!("{}: {e}", path.display())))?;
        if let Some(dir) = path.parent() {
            for root in &mut snapshot.file_roots {
                if root.path.is_relative() {
                    root.path = dir.join(&root.path);
                }
            }
        }
        Ok(snapshot)
    }

    /// Build the content graph.
    ///
    /// Menu links and media entities are roots in their own right; any not
    /// listed among `roots` are added.
    pub fn graph(&self) -> SdkResult<InMemoryContentGraph> {
        let graph = InMemoryContentGraph::from_nodes(
            self.roots
                .iter()
                .cloned()
                .map(ContentNode::from)
                .chain(self.components.iter().cloned().map(ContentNode::from)),
        );
        let implicit = self
            .menu_links
            .iter()
            .map(|m| &m.link)
            .chain(self.remote_media.iter().map(|m| &m.media));
        for entity in implicit {
            if graph.get(entity)?.is_none() {
                debug!(%entity, "adding implicit root");
                graph.insert(RootEntity::new(entity.clone()))?;
            }
        }
        Ok(graph)
    }

    /// Build the five scan sources.
    pub fn sources(&self) -> ScanSources {
        ScanSources {
            managed: Arc::new(InMemorySource::new(
                "managed files",
                self.managed_files.clone(),
            )),
            loose: self
                .file_roots
                .iter()
                .map(|root| {
                    Arc::new(FilesystemSource::new(root.path.clone(), root.scheme))
                        as Arc<dyn RecordSource<LooseFile>>
                })
                .collect(),
            content: Arc::new(InMemorySource::new(
                "content fields",
                self.content_fields.clone(),
            )),
            remote: Arc::new(InMemorySource::new("remote media", self.remote_media.clone())),
            menu: Arc::new(InMemorySource::new("menu links", self.menu_links.clone())),
        }
    }
}
