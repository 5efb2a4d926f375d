#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! File-backed fire detection and district boundary sources.
//!
//! Implements the [`FirePointSource`] and [`BoundarySource`] traits for
//! shapefiles and GeoJSON feature collections, and retrieves the FIRMS
//! archive that the point source reads from.

pub mod dates;
pub mod firms;
pub mod geojson_source;
pub mod shapefile_source;

use std::path::Path;

use fire_map_source_models::{BoundarySource, FirePointSource, SourceError};

pub use firms::{DEFAULT_FIRMS_URL, RetrievalError, fetch_firms_archive};
pub use geojson_source::{GeoJsonBoundarySource, GeoJsonPointSource};
pub use shapefile_source::{ShapefileBoundarySource, ShapefilePointSource};

/// On-disk vector formats understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// ESRI shapefile (`.shp` with `.dbf` and optional `.prj`).
    Shapefile,
    /// GeoJSON feature collection (`.geojson` or `.json`).
    GeoJson,
}

impl FileFormat {
    /// Detects the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Decode`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("shp") => Ok(Self::Shapefile),
            Some("geojson" | "json") => Ok(Self::GeoJson),
            _ => Err(SourceError::Decode {
                path: path.display().to_string(),
                message: "unsupported file type (expected .shp, .geojson or .json)".to_string(),
            }),
        }
    }
}

/// Opens a fire detection file, choosing the reader by extension.
///
/// # Errors
///
/// Returns [`SourceError::Decode`] if the extension is not supported.
pub fn open_points(path: &Path, date_column: &str) -> Result<Box<dyn FirePointSource>, SourceError> {
    Ok(match FileFormat::from_path(path)? {
        FileFormat::Shapefile => Box::new(ShapefilePointSource::new(path, date_column)),
        FileFormat::GeoJson => Box::new(GeoJsonPointSource::new(path, date_column)),
    })
}

/// Opens a district boundary file, choosing the reader by extension.
///
/// # Errors
///
/// Returns [`SourceError::Decode`] if the extension is not supported.
pub fn open_boundaries(path: &Path) -> Result<Box<dyn BoundarySource>, SourceError> {
    Ok(match FileFormat::from_path(path)? {
        FileFormat::Shapefile => Box::new(ShapefileBoundarySource::new(path)),
        FileFormat::GeoJson => Box::new(GeoJsonBoundarySource::new(path)),
    })
}
