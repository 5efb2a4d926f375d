#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District boundary loading and reference system reconciliation.
//!
//! [`loader`] combines the Punjab and Haryana boundary sources into one
//! region-tagged [`DistrictCollection`](fire_map_geography_models::DistrictCollection),
//! and [`reconcile`] moves fire detections into the districts' reference
//! system before spatial matching. The transforms themselves live in
//! [`projection`].

pub mod loader;
pub mod projection;
pub mod reconcile;

use fire_map_geography_models::{ReferenceSystemError, Region};
use fire_map_source_models::SourceError;
use thiserror::Error;

/// A configured input is missing or unusable.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An input file does not exist.
    #[error("{subject} not found: {path}")]
    MissingFile {
        /// What the file holds, e.g. `Punjab boundaries`.
        subject: String,
        /// Configured path.
        path: String,
    },

    /// The district name column is absent from a boundary collection.
    #[error(
        "Column '{column}' not found in {region} boundaries ({source_name}). Available columns: {available:?}"
    )]
    MissingColumn {
        /// Region whose boundaries lack the column.
        region: Region,
        /// Configured district name column.
        column: String,
        /// Description of the boundary source.
        source_name: String,
        /// Columns that the source does have.
        available: Vec<String>,
    },

    /// An input file exists but could not be read.
    #[error("Failed to read {subject}: {source}")]
    Unreadable {
        /// What the file holds, e.g. `Fire detections`.
        subject: String,
        /// Underlying source error.
        source: SourceError,
    },

    /// A configuration value is malformed.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

impl ConfigurationError {
    /// Classifies a failure to read `subject` from its source.
    #[must_use]
    pub fn from_source(subject: &str, error: SourceError) -> Self {
        match error {
            SourceError::NotFound { path } => Self::MissingFile {
                subject: subject.to_string(),
                path,
            },
            other => Self::Unreadable {
                subject: subject.to_string(),
                source: other,
            },
        }
    }
}

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// A configured input is missing or unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Reference systems are missing or cannot be reconciled.
    #[error(transparent)]
    ReferenceSystem(#[from] ReferenceSystemError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_becomes_missing_file() {
        let err = ConfigurationError::from_source(
            "Fire detections",
            SourceError::NotFound {
                path: "temp_fire_data/fires.shp".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Fire detections not found: temp_fire_data/fires.shp"
        );
    }

    #[test]
    fn other_source_errors_become_unreadable() {
        let err = ConfigurationError::from_source(
            "Punjab boundaries",
            SourceError::Decode {
                path: "p.shp".to_string(),
                message: "bad header".to_string(),
            },
        );
        assert!(matches!(err, ConfigurationError::Unreadable { .. }));
        assert!(err.to_string().starts_with("Failed to read Punjab boundaries"));
    }
}
