#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fire count aggregation.
//!
//! Groups matched fires by (date, region, district) with an explicit map
//! and an explicit sort, then derives region totals and the whole-period
//! district ranking from the grouped table.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use fire_map_analytics_models::{
    AggregateRecord, Aggregation, DistrictTotal, RegionTotals, TOP_DISTRICTS_LIMIT,
};
use fire_map_geography_models::{MatchedFire, Region};

/// Aggregates matched fires into grouped counts and whole-period totals.
///
/// Empty input yields an empty [`Aggregation`] with zero totals.
#[must_use]
pub fn aggregate(matched: &[MatchedFire]) -> Aggregation {
    log::info!("Aggregating fire counts by district and date...");

    let records = group_counts(matched);
    let region_totals = region_totals(&records);
    let top_districts = top_districts(&records, TOP_DISTRICTS_LIMIT);
    let affected_districts = records
        .iter()
        .map(|r| (r.region, r.district.as_str()))
        .collect::<BTreeSet<_>>()
        .len();

    log::info!("Generated {} district-date records", records.len());
    log::info!("Total fires: {}", region_totals.combined());
    log::info!("Affected districts: {affected_districts}");
    for region in Region::ALL {
        log::info!("{region} fires: {}", region_totals.get(region));
    }

    Aggregation {
        records,
        region_totals,
        top_districts,
        affected_districts,
    }
}

/// Counts fires per (date, region, district) and sorts the table.
///
/// Order: date ascending, region label ascending, count descending, then
/// district name ascending.
fn group_counts(matched: &[MatchedFire]) -> Vec<AggregateRecord> {
    let mut counts: HashMap<(NaiveDate, Region, &str), u64> = HashMap::new();
    for fire in matched {
        *counts
            .entry((fire.acquisition_date, fire.region, fire.district.as_str()))
            .or_default() += 1;
    }

    let mut records: Vec<AggregateRecord> = counts
        .into_iter()
        .map(|((acquisition_date, region, district), fire_count)| AggregateRecord {
            acquisition_date,
            region,
            district: district.to_string(),
            fire_count,
        })
        .collect();

    records.sort_by(|a, b| {
        a.acquisition_date
            .cmp(&b.acquisition_date)
            .then_with(|| a.region.label().cmp(b.region.label()))
            .then_with(|| b.fire_count.cmp(&a.fire_count))
            .then_with(|| a.district.cmp(&b.district))
    });

    records
}

fn region_totals(records: &[AggregateRecord]) -> RegionTotals {
    let mut totals = RegionTotals::default();
    for record in records {
        totals.add(record.region, record.fire_count);
    }
    totals
}

/// Ranks districts by whole-period count, keeping at most `limit`.
///
/// Districts are first listed in the order they appear in `records`, so
/// the stable sort leaves equal totals in that order.
fn top_districts(records: &[AggregateRecord], limit: usize) -> Vec<DistrictTotal> {
    let mut positions: HashMap<(Region, &str), usize> = HashMap::new();
    let mut totals: Vec<DistrictTotal> = Vec::new();

    for record in records {
        let key = (record.region, record.district.as_str());
        if let Some(&i) = positions.get(&key) {
            totals[i].total_fires += record.fire_count;
        } else {
            positions.insert(key, totals.len());
            totals.push(DistrictTotal {
                region: record.region,
                district: record.district.clone(),
                total_fires: record.fire_count,
            });
        }
    }

    totals.sort_by(|a, b| b.total_fires.cmp(&a.total_fires));
    totals.truncate(limit);
    totals
}
