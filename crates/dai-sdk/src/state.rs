//! Persisted engine state: the live inventory and every archive record.

use std::fs;
use std::path::Path;

use dai_archive::ArchiveRecord;
use dai_inventory::Generation;
use serde::{Deserialize, Serialize};

use crate::error::SdkResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineState {
    pub inventory: Generation,
    pub archive: Vec<ArchiveRecord>,
}

impl EngineState {
    /// Read state from `path`; a missing file is an empty state.
    pub fn load(path: &Path) -> SdkResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write state to `path`, replacing the old file only once the new one
    /// is complete.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
