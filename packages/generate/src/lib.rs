#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Renders an [`Aggregation`] into the daily and summary JSON documents
//! and writes them to disk.
//!
//! Both documents are rendered in memory first. Writing then goes through
//! a `.tmp` file next to each target followed by a rename, so a reader
//! never sees a half-written document.

pub mod documents;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use fire_map_analytics_models::Aggregation;
use fire_map_geography_models::Region;

pub use documents::{
    DATA_SOURCE, DailyDocument, DailyEntry, DateRange, DistrictCount, RegionBreakdown,
    SummaryDocument, TIME_PERIOD, TopDistrict,
};

/// Errors that can occur while persisting output documents.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// A document could not be encoded.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An output directory or file could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Formats a generation timestamp as ISO 8601 with microseconds and `Z`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Builds the per-day document.
#[must_use]
pub fn daily_document(aggregation: &Aggregation, last_updated: &str) -> DailyDocument {
    let daily_data = aggregation
        .dates()
        .into_iter()
        .map(|date| {
            let breakdown = |region: Region| {
                let districts: Vec<DistrictCount> = aggregation
                    .records
                    .iter()
                    .filter(|r| r.acquisition_date == date && r.region == region)
                    .map(|r| DistrictCount {
                        district: r.district.clone(),
                        fire_count: r.fire_count,
                    })
                    .collect();
                let total = districts.iter().map(|d| d.fire_count).sum();
                RegionBreakdown { districts, total }
            };

            let punjab = breakdown(Region::Punjab);
            let haryana = breakdown(Region::Haryana);
            let combined_total = punjab.total + haryana.total;
            log::info!("  {date}: {combined_total} fires");

            DailyEntry {
                date,
                punjab,
                haryana,
                combined_total,
            }
        })
        .collect();

    DailyDocument {
        last_updated: last_updated.to_string(),
        data_source: DATA_SOURCE.to_string(),
        time_period: TIME_PERIOD.to_string(),
        daily_data,
    }
}

/// Builds the whole-period summary document.
#[must_use]
pub fn summary_document(aggregation: &Aggregation, last_updated: &str) -> SummaryDocument {
    let date_range = aggregation
        .date_range()
        .map_or_else(DateRange::default, |(start, end)| DateRange {
            start: Some(start),
            end: Some(end),
        });

    SummaryDocument {
        last_updated: last_updated.to_string(),
        total_fire_count: aggregation.total_fire_count(),
        date_range,
        top_districts: aggregation
            .top_districts
            .iter()
            .map(|d| TopDistrict {
                state: d.region.label().to_string(),
                district: d.district.clone(),
                total_fires: d.total_fires,
            })
            .collect(),
        state_totals: aggregation.region_totals,
    }
}

/// Both documents, encoded and ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutputs {
    /// Pretty-printed daily document.
    pub daily: String,
    /// Pretty-printed summary document.
    pub summary: String,
}

/// Renders both documents as two-space indented JSON.
///
/// # Errors
///
/// Returns [`SerializationError::Json`] if a document cannot be encoded.
pub fn render(
    aggregation: &Aggregation,
    generated_at: DateTime<Utc>,
) -> Result<RenderedOutputs, SerializationError> {
    let last_updated = format_timestamp(generated_at);

    if aggregation.is_empty() {
        log::warn!("No fire data to process, creating empty dataset");
    } else {
        log::info!("Processing {} dates...", aggregation.dates().len());
    }

    let daily = serde_json::to_string_pretty(&daily_document(aggregation, &last_updated))?;
    let summary = serde_json::to_string_pretty(&summary_document(aggregation, &last_updated))?;

    Ok(RenderedOutputs { daily, summary })
}

/// Writes both documents, replacing any previous versions.
///
/// Parent directories are created and no target may be a directory.
/// Both `.tmp` files are then written, which also proves each directory
/// is writable. Existing targets are copied to `.bak` files, and both
/// documents are renamed over their targets. If a rename fails, targets
/// already replaced are restored from their backups and every `.tmp`
/// file is removed, so on error no output is modified.
///
/// # Errors
///
/// Returns [`SerializationError::Io`] if a directory or file cannot be
/// written.
pub fn write_outputs(
    outputs: &RenderedOutputs,
    daily_path: &Path,
    summary_path: &Path,
) -> Result<(), SerializationError> {
    let targets = [(daily_path, &outputs.daily), (summary_path, &outputs.summary)];

    for (path, _) in &targets {
        ensure_writable_target(path)?;
    }

    let mut staged: Vec<Staged<'_>> = Vec::with_capacity(targets.len());
    for (path, contents) in targets {
        let tmp_path = tmp_path_for(path);
        if let Err(e) = std::fs::write(&tmp_path, contents) {
            discard(&staged);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(io_error(&tmp_path, e));
        }
        staged.push(Staged {
            tmp_path,
            target: path,
            backup: None,
        });
    }

    if let Err(e) = back_up(&mut staged) {
        discard(&staged);
        return Err(e);
    }

    for (i, entry) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(&entry.tmp_path, entry.target) {
            log::error!(
                "Failed to replace {}, restoring previous outputs",
                entry.target.display()
            );
            roll_back(&staged[..i]);
            discard(&staged[i..]);
            return Err(io_error(entry.target, e));
        }
    }

    for entry in &staged {
        if let Some(backup) = &entry.backup {
            let _ = std::fs::remove_file(backup);
        }
        log::info!("Saved: {}", entry.target.display());
    }

    Ok(())
}

/// A document written to its `.tmp` file but not yet in place.
struct Staged<'a> {
    tmp_path: PathBuf,
    target: &'a Path,
    backup: Option<PathBuf>,
}

/// Copies every existing target to its `.bak` path.
fn back_up(staged: &mut [Staged<'_>]) -> Result<(), SerializationError> {
    for entry in staged.iter_mut() {
        if !entry.target.exists() {
            continue;
        }
        let backup = backup_path_for(entry.target);
        if let Err(e) = std::fs::copy(entry.target, &backup) {
            let _ = std::fs::remove_file(&backup);
            return Err(io_error(&backup, e));
        }
        entry.backup = Some(backup);
    }

    Ok(())
}

/// Removes the `.tmp` files and backups of documents that were never
/// renamed into place.
fn discard(staged: &[Staged<'_>]) {
    for entry in staged {
        let _ = std::fs::remove_file(&entry.tmp_path);
        if let Some(backup) = &entry.backup {
            let _ = std::fs::remove_file(backup);
        }
    }
}

/// Puts back what `replaced` targets held before they were renamed over.
fn roll_back(replaced: &[Staged<'_>]) {
    for entry in replaced {
        let restored = match &entry.backup {
            Some(backup) => std::fs::rename(backup, entry.target),
            None => std::fs::remove_file(entry.target),
        };
        if let Err(e) = restored {
            log::error!("Failed to restore {}: {e}", entry.target.display());
        }
    }
}

fn ensure_writable_target(path: &Path) -> Result<(), SerializationError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    if path.is_dir() {
        return Err(io_error(
            path,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "output path is a directory",
            ),
        ));
    }

    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> SerializationError {
    SerializationError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `data/fire_counts.json` -> `data/fire_counts.json.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

/// `data/fire_counts.json` -> `data/fire_counts.json.bak`
fn backup_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
