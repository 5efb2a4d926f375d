//! Pipeline configuration.
//!
//! Built-in defaults, optionally overridden by a TOML file, then by
//! `FIRE_MAP_*` environment variables, then by command-line flags. The
//! resulting [`PipelineConfig`] is immutable and handed to every stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fire_map_geography::ConfigurationError;
use fire_map_geography_models::Crs;
use fire_map_source::DEFAULT_FIRMS_URL;
use serde::{Deserialize, Serialize};

/// Overrides [`PipelineConfig::firms_url`].
pub const ENV_FIRMS_URL: &str = "FIRE_MAP_FIRMS_URL";
/// Overrides [`PipelineConfig::punjab_boundaries`].
pub const ENV_PUNJAB_BOUNDARIES: &str = "FIRE_MAP_PUNJAB_BOUNDARIES";
/// Overrides [`PipelineConfig::haryana_boundaries`].
pub const ENV_HARYANA_BOUNDARIES: &str = "FIRE_MAP_HARYANA_BOUNDARIES";
/// Overrides [`PipelineConfig::daily_output`].
pub const ENV_DAILY_OUTPUT: &str = "FIRE_MAP_DAILY_OUTPUT";
/// Overrides [`PipelineConfig::summary_output`].
pub const ENV_SUMMARY_OUTPUT: &str = "FIRE_MAP_SUMMARY_OUTPUT";
/// Overrides [`PipelineConfig::district_column`].
pub const ENV_DISTRICT_COLUMN: &str = "FIRE_MAP_DISTRICT_COLUMN";
/// Overrides [`PipelineConfig::points`].
pub const ENV_POINTS: &str = "FIRE_MAP_POINTS";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// FIRMS zipped shapefile archive to download.
    pub firms_url: String,
    /// Punjab district boundaries (`.shp` or `.geojson`).
    pub punjab_boundaries: PathBuf,
    /// Haryana district boundaries (`.shp` or `.geojson`).
    pub haryana_boundaries: PathBuf,
    /// Per-day document path.
    pub daily_output: PathBuf,
    /// Whole-period summary document path.
    pub summary_output: PathBuf,
    /// Boundary attribute holding the district name.
    pub district_column: String,
    /// Point attribute holding the acquisition date.
    pub date_column: String,
    /// Upper bound on the archive download.
    pub download_timeout_secs: u64,
    /// Directory the archive is extracted into.
    pub work_dir: PathBuf,
    /// Local point file; when set, nothing is downloaded.
    pub points: Option<PathBuf>,
    /// Reference system for a point file that declares none.
    pub points_crs: Option<Crs>,
    /// Reference system for boundary files that declare none.
    pub boundaries_crs: Option<Crs>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            firms_url: DEFAULT_FIRMS_URL.to_string(),
            punjab_boundaries: PathBuf::from("shapefiles/Punjab_District.shp"),
            haryana_boundaries: PathBuf::from("shapefiles/Haryana_District.shp"),
            daily_output: PathBuf::from("data/fire_counts.json"),
            summary_output: PathBuf::from("data/fire_counts_summary.json"),
            district_column: "dtname".to_string(),
            date_column: "ACQ_DATE".to_string(),
            download_timeout_secs: 120,
            work_dir: PathBuf::from("temp_fire_data"),
            points: None,
            points_crs: None,
            boundaries_crs: None,
        }
    }
}

impl PipelineConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] on malformed TOML, unknown
    /// keys, or unrecognized reference systems.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigurationError> {
        toml::de::from_str(contents).map_err(|e| ConfigurationError::Invalid {
            message: e.to_string(),
        })
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the file is missing, unreadable,
    /// or invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Err(ConfigurationError::MissingFile {
                subject: "Configuration file".to_string(),
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Invalid {
            message: format!("{}: {e}", path.display()),
        })?;

        log::info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Applies `FIRE_MAP_*` overrides looked up through `var`.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup(ENV_FIRMS_URL) {
            self.firms_url = v;
        }
        if let Some(v) = lookup(ENV_PUNJAB_BOUNDARIES) {
            self.punjab_boundaries = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_HARYANA_BOUNDARIES) {
            self.haryana_boundaries = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DAILY_OUTPUT) {
            self.daily_output = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_SUMMARY_OUTPUT) {
            self.summary_output = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DISTRICT_COLUMN) {
            self.district_column = v;
        }
        if let Some(v) = lookup(ENV_POINTS) {
            self.points = Some(PathBuf::from(v));
        }

        self
    }

    /// Builds the configuration for a run of the binary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `config_path` cannot be loaded.
    pub fn resolve(
        config_path: Option<&Path>,
        points: Option<PathBuf>,
    ) -> Result<Self, ConfigurationError> {
        let base = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let mut config = base.with_env_overrides(|name| std::env::var(name).ok());
        if points.is_some() {
            config.points = points;
        }

        Ok(config)
    }

    /// Download timeout as a [`Duration`].
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
