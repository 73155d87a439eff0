//! Filesystem-backed source of loose files.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dai_normalize::StorageScheme;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{MalformedRecord, SourceError, SourceResult};
use crate::record::LooseFile;
use crate::traits::{RecordSource, SourceRecord};

/// Walks a storage scheme root and lists every regular file.
///
/// The directory is walked once per scan, on first use, and the sorted
/// listing is reused for every chunk so cursors stay stable for the whole
/// scan. [`RecordSource::begin_scan`] drops the listing.
#[derive(Debug)]
pub struct FilesystemSource {
    name: String,
    root: PathBuf,
    scheme: StorageScheme,
    listing: Mutex<Option<Arc<Vec<SourceRecord<LooseFile>>>>>,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>, scheme: StorageScheme) -> Self {
        let root = root.into();
        Self {
            name: format!("{scheme} files at {}", root.display()),
            root,
            scheme,
            listing: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn listing(&self) -> SourceResult<Arc<Vec<SourceRecord<LooseFile>>>> {
        let mut guard = self
            .listing
            .lock()
            .map_err(|_| SourceError::Failed("listing lock poisoned".into()))?;
        if let Some(listing) = guard.as_ref() {
            return Ok(Arc::clone(listing));
        }
        let listing = Arc::new(self.walk()?);
        debug!(root = %self.root.display(), files = listing.len(), "listed files");
        *guard = Some(Arc::clone(&listing));
        Ok(listing)
    }

    fn walk(&self) -> SourceResult<Vec<SourceRecord<LooseFile>>> {
        if !self.root.is_dir() {
            return Err(SourceError::Failed(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let key = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    out.push(Err(MalformedRecord::new(key, e.to_string())));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            out.push(self.record(entry.path()));
        }
        Ok(out)
    }

    fn record(&self, path: &Path) -> SourceRecord<LooseFile> {
        let key = path.display().to_string();
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|e| MalformedRecord::new(&key, e.to_string()))?;
        let mut segments = Vec::new();
        for part in rel.components() {
            let part = part
                .as_os_str()
                .to_str()
                .ok_or_else(|| MalformedRecord::new(&key, "path is not valid UTF-8"))?;
            segments.push(part);
        }
        let size = std::fs::metadata(path)
            .map_err(|e| MalformedRecord::new(&key, e.to_string()))?
            .len();
        Ok(LooseFile {
            scheme: self.scheme,
            path: segments.join("/"),
            size,
        })
    }
}

impl RecordSource<LooseFile> for FilesystemSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_scan(&self) -> SourceResult<()> {
        let mut guard = self
            .listing
            .lock()
            .map_err(|_| SourceError::Failed("listing lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }

    fn total(&self) -> SourceResult<usize> {
        Ok(self.listing()?.len())
    }

    fn fetch(&self, offset: usize, limit: usize) -> SourceResult<Vec<SourceRecord<LooseFile>>> {
        Ok(self
            .listing()?
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
