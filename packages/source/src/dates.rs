//! Acquisition date normalization.
//!
//! FIRMS archives store `ACQ_DATE` as a dBase date, but re-exported files
//! carry it as text in a handful of layouts. Every layout is reduced to a
//! [`NaiveDate`] here so nothing downstream ever compares date strings.

use chrono::{DateTime, NaiveDate};

/// Text layouts accepted for an acquisition date, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parses a textual acquisition date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, and RFC 3339
/// timestamps (the date part is kept as written, without shifting time
/// zones). Returns `None` for anything else, including empty strings.
#[must_use]
pub fn parse_acquisition_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Builds a date from dBase year/month/day components.
#[must_use]
pub fn from_components(year: u32, month: u32, day: u32) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
