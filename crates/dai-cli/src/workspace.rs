//! Loading and saving the files a CLI invocation works on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dai_archive::{ArchiveRecord, ArchiveTarget};
use dai_sdk::{Dai, EngineConfig, EngineState, SiteSnapshot};
use tracing::debug;

use crate::cli::Cli;

/// An engine opened from the snapshot, state and config named on the
/// command line.
pub struct Workspace {
    pub dai: Dai,
    snapshot: SiteSnapshot,
    state_path: PathBuf,
}

impl Workspace {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        Self::open_with(cli, |_| {})
    }

    /// Like [`Workspace::open`], letting the caller override loaded settings.
    pub fn open_with(cli: &Cli, adjust: impl FnOnce(&mut EngineConfig)) -> anyhow::Result<Self> {
        let mut config = load_config(cli.config.as_deref())?;
        adjust(&mut config);
        let snapshot = SiteSnapshot::load(&cli.site)
            .with_context(|| format!("failed to load site snapshot {}", cli.site.display()))?;
        let state = EngineState::load(&cli.state)
            .with_context(|| format!("failed to load state {}", cli.state.display()))?;
        let dai = Dai::with_state(&snapshot, config, state)?;
        Ok(Self {
            dai,
            snapshot,
            state_path: cli.state.clone(),
        })
    }

    /// Persist the live inventory and archive records.
    pub fn save(&self) -> anyhow::Result<()> {
        self.dai
            .state()?
            .save(&self.state_path)
            .with_context(|| format!("failed to write state {}", self.state_path.display()))?;
        debug!(path = %self.state_path.display(), "state saved");
        Ok(())
    }

    /// Path on disk of the file behind an asset record, if a file root
    /// covers its storage scheme.
    pub fn local_path(&self, record: &ArchiveRecord) -> Option<PathBuf> {
        let ArchiveTarget::Asset { location, .. } = &record.target else {
            return None;
        };
        self.snapshot.file_roots.iter().find_map(|root| {
            location
                .strip_prefix(root.scheme.uri_prefix())
                .map(|rel| root.path.join(rel))
        })
    }

    /// Content of the file behind an asset record.
    pub fn read_content(&self, record: &ArchiveRecord) -> anyhow::Result<Option<Vec<u8>>> {
        match self.local_path(record) {
            Some(path) if path.is_file() => {
                let bytes = fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok(Some(bytes))
            }
            _ => Ok(None),
        }
    }
}

/// Read engine settings from a TOML file; defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}
