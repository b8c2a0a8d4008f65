use scholar_overlap_core::config_file::ConfigFile;
use scholar_overlap_core::{
    DEFAULT_MARKER, DEFAULT_WINDOW_YEARS, FormatDetector, Normalization, RecencyFilter,
};
use scholar_overlap_ingest::{DEFAULT_MAX_ARCHIVE_SIZE, IngestOptions};

/// Flags that override file and environment configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub marker: Option<String>,
    pub skip_detection: bool,
    pub fuzzy: bool,
    /// `Some(None)` for a bare `--recent`, `Some(Some(n))` for `--recent=n`.
    pub recent: Option<Option<i32>>,
    pub current_year: Option<i32>,
}

/// Environment values, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub marker: Option<String>,
    pub recent_years: Option<i32>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            marker: std::env::var("SCHOLAR_OVERLAP_MARKER")
                .ok()
                .filter(|m| !m.trim().is_empty()),
            recent_years: std::env::var("SCHOLAR_OVERLAP_RECENT_YEARS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub marker: String,
    pub skip_detection: bool,
    pub normalization: Normalization,
    pub recency: Option<RecencyFilter>,
    pub max_archive_size: u64,
}

impl Settings {
    /// Resolve configuration: CLI flags > env vars > config file > defaults.
    pub fn resolve(
        overrides: &Overrides,
        env: &EnvConfig,
        config: &ConfigFile,
        this_year: i32,
    ) -> anyhow::Result<Self> {
        let detection = config.detection.clone().unwrap_or_default();
        let recency = config.recency.clone().unwrap_or_default();

        let marker = overrides
            .marker
            .clone()
            .or_else(|| env.marker.clone())
            .or(detection.marker)
            .unwrap_or_else(|| DEFAULT_MARKER.to_string());

        let normalization = if overrides.fuzzy {
            Normalization::StripWhitespace
        } else {
            config
                .matching
                .as_ref()
                .and_then(|m| m.normalization)
                .unwrap_or_default()
        };

        let recency_enabled = overrides.recent.is_some()
            || env.recent_years.is_some()
            || recency.enabled.unwrap_or(false);
        let window = overrides
            .recent
            .flatten()
            .or(env.recent_years)
            .or(recency.window_years)
            .unwrap_or(DEFAULT_WINDOW_YEARS);
        if window < 0 {
            anyhow::bail!("Recency window must not be negative (got {})", window);
        }
        let current_year = overrides.current_year.unwrap_or(this_year);

        let max_archive_size = config
            .archive
            .as_ref()
            .and_then(|a| a.max_archive_size_mb)
            .map(|mb| mb as u64 * 1024 * 1024)
            .unwrap_or(DEFAULT_MAX_ARCHIVE_SIZE);

        Ok(Self {
            marker,
            skip_detection: overrides.skip_detection || detection.skip_detection.unwrap_or(false),
            normalization,
            recency: recency_enabled.then(|| RecencyFilter::new(current_year, window)),
            max_archive_size,
        })
    }

    pub fn ingest_options(&self) -> IngestOptions {
        let options = IngestOptions::default()
            .with_detector(FormatDetector::new(self.marker.clone()))
            .with_skip_detection(self.skip_detection)
            .with_max_archive_size(self.max_archive_size);
        match self.recency {
            Some(filter) => options.with_recency(filter),
            None => options,
        }
    }
}
