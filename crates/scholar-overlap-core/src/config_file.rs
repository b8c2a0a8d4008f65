use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::normalize::Normalization;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub detection: Option<DetectionConfig>,
    pub matching: Option<MatchingConfig>,
    pub recency: Option<RecencyConfig>,
    pub archive: Option<ArchiveConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub marker: Option<String>,
    pub skip_detection: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub normalization: Option<Normalization>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecencyConfig {
    pub enabled: Option<bool>,
    pub window_years: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub max_archive_size_mb: Option<u32>,
}

/// Platform config directory path: `<config_dir>/scholar-overlap/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scholar-overlap").join("config.toml"))
}

/// Load config by cascading CWD `.scholar-overlap.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".scholar-overlap.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        detection: Some(DetectionConfig {
            marker: overlay
                .detection
                .as_ref()
                .and_then(|d| d.marker.clone())
                .or_else(|| base.detection.as_ref().and_then(|d| d.marker.clone())),
            skip_detection: overlay
                .detection
                .as_ref()
                .and_then(|d| d.skip_detection)
                .or_else(|| base.detection.as_ref().and_then(|d| d.skip_detection)),
        }),
        matching: Some(MatchingConfig {
            normalization: overlay
                .matching
                .as_ref()
                .and_then(|m| m.normalization)
                .or_else(|| base.matching.as_ref().and_then(|m| m.normalization)),
        }),
        recency: Some(RecencyConfig {
            enabled: overlay
                .recency
                .as_ref()
                .and_then(|r| r.enabled)
                .or_else(|| base.recency.as_ref().and_then(|r| r.enabled)),
            window_years: overlay
                .recency
                .as_ref()
                .and_then(|r| r.window_years)
                .or_else(|| base.recency.as_ref().and_then(|r| r.window_years)),
        }),
        archive: Some(ArchiveConfig {
            max_archive_size_mb: overlay
                .archive
                .as_ref()
                .and_then(|a| a.max_archive_size_mb)
                .or_else(|| base.archive.as_ref().and_then(|a| a.max_archive_size_mb)),
        }),
    }
}
