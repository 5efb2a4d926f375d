#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for district attribution.
//!
//! Builds an R-tree over the district envelopes once per run and answers
//! point-in-polygon lookups against it. Containment is boundary-exclusive:
//! a detection lying exactly on a district edge or vertex belongs to no
//! district.

use fire_map_geography_models::{DistrictCollection, FirePoint, MatchedFire};
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

/// A district envelope stored in the R-tree, pointing back at its row.
struct DistrictEntry {
    row: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for DistrictEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Result of looking up one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Lowest collection row whose polygon contains the point.
    pub row: usize,
    /// Number of polygons that contain the point (at least 1).
    pub enclosing: usize,
}

/// Pre-built spatial index over a district collection.
pub struct DistrictIndex<'a> {
    districts: &'a DistrictCollection,
    tree: RTree<DistrictEntry>,
}

impl<'a> DistrictIndex<'a> {
    /// Bulk-loads an R-tree over every district envelope.
    #[must_use]
    pub fn build(districts: &'a DistrictCollection) -> Self {
        let entries = districts
            .districts
            .iter()
            .enumerate()
            .map(|(row, district)| DistrictEntry {
                row,
                envelope: compute_envelope(&district.geometry),
            })
            .collect();

        Self {
            districts,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Looks up the district containing `point`.
    ///
    /// Districts can overlap when the two boundary sources disagree along
    /// the state border; the lowest row wins, so Punjab takes precedence
    /// over Haryana. [`Lookup::enclosing`] reports how many polygons
    /// matched.
    #[must_use]
    pub fn lookup(&self, point: Point<f64>) -> Option<Lookup> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut best: Option<Lookup> = None;

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            if !self.districts.districts[entry.row].geometry.contains(&point) {
                continue;
            }
            best = Some(match best {
                None => Lookup {
                    row: entry.row,
                    enclosing: 1,
                },
                Some(current) => Lookup {
                    row: current.row.min(entry.row),
                    enclosing: current.enclosing + 1,
                },
            });
        }

        best
    }
}

/// Counts produced by [`match_points`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// Points offered to the matcher.
    pub total: usize,
    /// Points attributed to a district.
    pub matched: usize,
    /// Points inside no district.
    pub unmatched: usize,
    /// Matched points that more than one district contained.
    pub ambiguous: usize,
}

/// Attributes every point to its enclosing district.
///
/// Points in no district are dropped. Each matched point appears exactly
/// once in the output, in input order, even when overlapping districts
/// both contain it.
#[must_use]
pub fn match_points(
    points: &[FirePoint],
    districts: &DistrictCollection,
) -> (Vec<MatchedFire>, MatchReport) {
    log::info!(
        "Performing spatial join of {} points against {} districts",
        points.len(),
        districts.districts.len()
    );

    let index = DistrictIndex::build(districts);
    let mut report = MatchReport {
        total: points.len(),
        ..MatchReport::default()
    };
    let mut matched = Vec::new();

    for point in points {
        let Some(lookup) = index.lookup(point.location) else {
            report.unmatched += 1;
            continue;
        };

        if lookup.enclosing > 1 {
            report.ambiguous += 1;
        }

        let district = &districts.districts[lookup.row];
        matched.push(MatchedFire {
            acquisition_date: point.acquisition_date,
            location: point.location,
            region: district.region,
            district: district.name.clone(),
        });
    }

    report.matched = matched.len();

    log::info!(
        "Spatial join complete: {} fires matched to districts, {} outside all districts",
        report.matched,
        report.unmatched
    );
    if report.ambiguous > 0 {
        log::warn!(
            "{} fires fall inside more than one district; each was counted once, in the first district loaded",
            report.ambiguous
        );
    }
    if report.total > 0 && report.matched == 0 {
        log::warn!("No fires matched any district. Check the CRS and geometry of the inputs");
    }

    (matched, report)
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
