//! Output document shapes.
//!
//! Field names and order are read by the dashboard and must not change.

use chrono::NaiveDate;
use fire_map_analytics_models::RegionTotals;
use serde::{Deserialize, Serialize};

/// Value of the daily document's `data_source` field.
pub const DATA_SOURCE: &str = "NASA FIRMS VIIRS (NOAA-20)";

/// Value of the daily document's `time_period` field.
pub const TIME_PERIOD: &str = "7 days";

/// Per-day fire counts (`fire_counts.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDocument {
    /// UTC generation time, ISO 8601 with a trailing `Z`.
    pub last_updated: String,
    /// Always [`DATA_SOURCE`].
    pub data_source: String,
    /// Always [`TIME_PERIOD`].
    pub time_period: String,
    /// One entry per acquisition date, ascending.
    pub daily_data: Vec<DailyEntry>,
}

/// Counts for a single acquisition date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Acquisition date.
    pub date: NaiveDate,
    /// Punjab districts.
    pub punjab: RegionBreakdown,
    /// Haryana districts.
    pub haryana: RegionBreakdown,
    /// `punjab.total + haryana.total`.
    pub combined_total: u64,
}

/// One region's districts on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    /// Districts with at least one fire, in grouped-table order.
    pub districts: Vec<DistrictCount>,
    /// Sum of the district counts.
    pub total: u64,
}

/// A district's count on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCount {
    /// District name.
    pub district: String,
    /// Fires on that date.
    pub fire_count: u64,
}

/// Whole-period summary (`fire_counts_summary.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryDocument {
    /// UTC generation time, ISO 8601 with a trailing `Z`.
    pub last_updated: String,
    /// Every matched fire.
    pub total_fire_count: u64,
    /// First and last acquisition dates.
    pub date_range: DateRange,
    /// Highest whole-period district counts, descending.
    pub top_districts: Vec<TopDistrict>,
    /// Per-region totals keyed `punjab` and `haryana`.
    pub state_totals: RegionTotals,
}

/// Inclusive acquisition date range; both ends are `null` without data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest date.
    pub start: Option<NaiveDate>,
    /// Latest date.
    pub end: Option<NaiveDate>,
}

/// A ranked district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDistrict {
    /// Region label (`Punjab` or `Haryana`).
    pub state: String,
    /// District name.
    pub district: String,
    /// Fires across the whole period.
    pub total_fires: u64,
}
