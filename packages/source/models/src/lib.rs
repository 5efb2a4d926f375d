#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source traits for fire detections and district boundaries.
//!
//! The pipeline never reads files itself. It asks a [`FirePointSource`]
//! for detections and two [`BoundarySource`]s for district polygons, and
//! only consumes the structured collections they return. File-backed
//! implementations live in `fire_map_source`; tests use in-memory ones.

use std::collections::BTreeMap;

use fire_map_geography_models::{Crs, FirePoint, ReferenceSystemError};
use geo::MultiPolygon;

/// Errors that can occur while reading a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing file does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// Path that was expected to exist.
        path: String,
    },

    /// I/O error reading the backing file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but its contents could not be decoded.
    #[error("Failed to decode {path}: {message}")]
    Decode {
        /// Path that failed to decode.
        path: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Fire detections read from a point source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCollection {
    /// Reference system of every point location, if the source declares one.
    pub crs: Option<Crs>,
    /// A declared reference system that could not be identified.
    pub unrecognized_crs: Option<String>,
    /// Detections, ordered by acquisition date.
    pub points: Vec<FirePoint>,
    /// Records dropped at ingestion (no usable date or geometry).
    pub skipped: usize,
}

/// A district polygon with its attribute row, before region tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBoundary {
    /// Non-null attribute values, stringified, keyed by column name.
    pub attributes: BTreeMap<String, String>,
    /// Boundary geometry.
    pub geometry: MultiPolygon<f64>,
}

/// District polygons read from a boundary source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    /// Reference system of every geometry, if the source declares one.
    pub crs: Option<Crs>,
    /// A declared reference system that could not be identified.
    pub unrecognized_crs: Option<String>,
    /// Attribute column names, in source order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<RawBoundary>,
}

impl PointCollection {
    /// The reference system of the points, or `fallback` if none is
    /// declared.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceSystemError`] if neither is available.
    pub fn resolve_crs(
        &self,
        fallback: Option<Crs>,
        subject: &str,
    ) -> Result<Crs, ReferenceSystemError> {
        resolve_crs(self.crs, self.unrecognized_crs.as_deref(), fallback, subject)
    }
}

impl BoundaryCollection {
    /// Whether `column` is one of the collection's attribute columns.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The reference system of the geometries, or `fallback` if none is
    /// declared.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceSystemError`] if neither is available.
    pub fn resolve_crs(
        &self,
        fallback: Option<Crs>,
        subject: &str,
    ) -> Result<Crs, ReferenceSystemError> {
        resolve_crs(self.crs, self.unrecognized_crs.as_deref(), fallback, subject)
    }
}

/// A declaration that could not be identified is reported as unsupported
/// rather than undefined.
fn resolve_crs(
    declared: Option<Crs>,
    unrecognized: Option<&str>,
    fallback: Option<Crs>,
    subject: &str,
) -> Result<Crs, ReferenceSystemError> {
    declared.or(fallback).ok_or_else(|| match unrecognized {
        Some(text) => ReferenceSystemError::Unsupported(format!("{text} (declared by {subject})")),
        None => ReferenceSystemError::Undefined {
            subject: subject.to_string(),
        },
    })
}

/// Supplies raw fire detections with an acquisition date and location.
pub trait FirePointSource {
    /// Returns a human-readable description (usually the file path).
    fn name(&self) -> &str;

    /// Reads every detection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the backing data cannot be read.
    fn load_points(&self) -> Result<PointCollection, SourceError>;
}

/// Supplies district polygons with their attribute columns.
pub trait BoundarySource {
    /// Returns a human-readable description (usually the file path).
    fn name(&self) -> &str;

    /// Reads every boundary row.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the backing data cannot be read.
    fn load_boundaries(&self) -> Result<BoundaryCollection, SourceError>;
}
