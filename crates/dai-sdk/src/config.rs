use dai_archive::ArchiveConfig;
use dai_normalize::NormalizerConfig;
use dai_scan::ScanConfig;
use serde::{Deserialize, Serialize};

/// Settings for every subsystem, each section optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub scan: ScanConfig,
    pub archive: ArchiveConfig,
}
