#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregated fire count types.
//!
//! An [`Aggregation`] holds everything the output documents are rendered
//! from: the grouped per-day table, per-region totals, and the
//! whole-period district ranking.

use chrono::NaiveDate;
use fire_map_geography_models::Region;
use serde::{Deserialize, Serialize};

/// Maximum number of entries in the whole-period district ranking.
pub const TOP_DISTRICTS_LIMIT: usize = 20;

/// Fire count for one (date, region, district) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// Acquisition date shared by every counted fire.
    pub acquisition_date: NaiveDate,
    /// Region of the district.
    pub region: Region,
    /// District name.
    pub district: String,
    /// Number of matched fires with this key.
    pub fire_count: u64,
}

/// Whole-period fire count for one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictTotal {
    /// Region of the district.
    pub region: Region,
    /// District name.
    pub district: String,
    /// Fires across every date.
    pub total_fires: u64,
}

/// Fire totals for each region. A region with no fires is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTotals {
    /// Punjab total.
    pub punjab: u64,
    /// Haryana total.
    pub haryana: u64,
}

impl RegionTotals {
    /// Total for `region`.
    #[must_use]
    pub const fn get(&self, region: Region) -> u64 {
        match region {
            Region::Punjab => self.punjab,
            Region::Haryana => self.haryana,
        }
    }

    /// Adds `count` to `region`'s total.
    pub const fn add(&mut self, region: Region, count: u64) {
        match region {
            Region::Punjab => self.punjab += count,
            Region::Haryana => self.haryana += count,
        }
    }

    /// Sum over both regions.
    #[must_use]
    pub const fn combined(&self) -> u64 {
        self.punjab + self.haryana
    }
}

/// Result of aggregating matched fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Grouped counts, ordered by date ascending, region label ascending,
    /// count descending, then district name ascending.
    pub records: Vec<AggregateRecord>,
    /// Whole-period totals per region.
    pub region_totals: RegionTotals,
    /// Up to [`TOP_DISTRICTS_LIMIT`] districts by whole-period count,
    /// descending. Ties keep their first appearance in `records`.
    pub top_districts: Vec<DistrictTotal>,
    /// Number of distinct districts with at least one fire.
    pub affected_districts: usize,
}

impl Aggregation {
    /// Sum of every grouped count.
    #[must_use]
    pub fn total_fire_count(&self) -> u64 {
        self.records.iter().map(|r| r.fire_count).sum()
    }

    /// Earliest and latest acquisition dates, or `None` when empty.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.records.iter().map(|r| r.acquisition_date).min()?;
        let end = self.records.iter().map(|r| r.acquisition_date).max()?;
        Some((start, end))
    }

    /// Distinct acquisition dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.acquisition_date).collect();
        dates.dedup();
        dates
    }

    /// Whether no fire was matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
