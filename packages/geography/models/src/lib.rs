#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region, district and fire detection types.
//!
//! These are the records that flow through the pipeline: raw fire
//! detections ([`FirePoint`]), district boundaries tagged with their
//! state ([`District`]), and detections attributed to a district
//! ([`MatchedFire`]). Geometry uses `geo` types throughout.

pub mod crs;

use chrono::NaiveDate;
use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};

pub use crs::{Crs, ReferenceSystemError};

/// One of the two state-level regions covered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Punjab.
    Punjab,
    /// Haryana.
    Haryana,
}

impl Region {
    /// All regions in load order (Punjab boundaries are loaded first).
    pub const ALL: [Self; 2] = [Self::Punjab, Self::Haryana];

    /// Human-readable label, as used in the `state` field of the summary.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Punjab => "Punjab",
            Self::Haryana => "Haryana",
        }
    }

    /// Lowercase JSON key used by the output documents.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Punjab => "punjab",
            Self::Haryana => "haryana",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single satellite fire detection.
///
/// The acquisition date is normalized to a calendar date at ingestion;
/// the location is expressed in whatever reference system its source
/// collection declares.
#[derive(Debug, Clone, PartialEq)]
pub struct FirePoint {
    /// Calendar date the hotspot was detected.
    pub acquisition_date: NaiveDate,
    /// Detection location.
    pub location: Point<f64>,
}

/// A district polygon stamped with its region.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    /// Region the district belongs to.
    pub region: Region,
    /// District name, unique within its region.
    pub name: String,
    /// District boundary.
    pub geometry: MultiPolygon<f64>,
}

/// Districts of both regions in one reference system.
///
/// Rows keep load order: every Punjab district precedes every Haryana
/// district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictCollection {
    /// Reference system shared by every district geometry.
    pub crs: Crs,
    /// Tagged districts.
    pub districts: Vec<District>,
}

impl DistrictCollection {
    /// Number of districts in `region`.
    #[must_use]
    pub fn count_in(&self, region: Region) -> usize {
        self.districts.iter().filter(|d| d.region == region).count()
    }
}

/// A fire detection attributed to the district that encloses it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedFire {
    /// Calendar date the hotspot was detected.
    pub acquisition_date: NaiveDate,
    /// Detection location, in the district collection's reference system.
    pub location: Point<f64>,
    /// Region of the enclosing district.
    pub region: Region,
    /// Name of the enclosing district.
    pub district: String,
}
