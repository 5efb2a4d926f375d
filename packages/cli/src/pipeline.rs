//! Stage sequencing for one batch run.
//!
//! Retrieve points, load boundaries, read points, reconcile reference
//! systems, match, aggregate, render, write. The first failing stage ends
//! the run; nothing is written unless every earlier stage succeeded.

use chrono::{DateTime, NaiveDate, Utc};
use fire_map_analytics::aggregate;
use fire_map_analytics_models::RegionTotals;
use fire_map_generate::{render, write_outputs};
use fire_map_geography::ConfigurationError;
use fire_map_geography::loader::load_districts;
use fire_map_geography::reconcile::reconcile_points;
use fire_map_source::{fetch_firms_archive, open_boundaries, open_points};
use fire_map_source_models::{BoundarySource, FirePointSource, SourceError};
use fire_map_spatial::{MatchReport, match_points};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// The three inputs of a run.
pub struct Sources<'a> {
    /// Fire detections.
    pub points: &'a dyn FirePointSource,
    /// Punjab district boundaries.
    pub punjab: &'a dyn BoundarySource,
    /// Haryana district boundaries.
    pub haryana: &'a dyn BoundarySource,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Spatial join counts.
    pub matches: MatchReport,
    /// Point records dropped at ingestion.
    pub skipped_points: usize,
    /// Sum of every grouped count.
    pub total_fire_count: u64,
    /// First and last acquisition dates of matched fires.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Whole-period totals per region.
    pub region_totals: RegionTotals,
}

/// Runs every stage after retrieval against the given sources.
///
/// `generated_at` becomes the documents' `last_updated` value.
///
/// # Errors
///
/// Returns [`PipelineError`] naming the first stage that failed. No
/// output file is created or modified in that case.
pub fn run_with_sources(
    config: &PipelineConfig,
    sources: &Sources<'_>,
    generated_at: DateTime<Utc>,
) -> Result<RunSummary, PipelineError> {
    log::info!("Loading district boundaries");
    let districts = load_districts(
        sources.punjab,
        sources.haryana,
        &config.district_column,
        config.boundaries_crs,
    )?;

    log::info!("Reading fire detection points from: {}", sources.points.name());
    let collection = sources
        .points
        .load_points()
        .map_err(|e| points_error(sources.points.name(), e))?;
    log::info!("Total fire points detected: {}", collection.points.len());

    match (collection.points.first(), collection.points.last()) {
        (Some(first), Some(last)) => log::info!(
            "Date range: {} to {}",
            first.acquisition_date,
            last.acquisition_date
        ),
        _ => log::warn!("No fire points found in dataset"),
    }

    let points_crs = collection.resolve_crs(config.points_crs, "Fire detections")?;
    let points = reconcile_points(collection.points, Some(points_crs), Some(districts.crs))?;

    let (matched, matches) = match_points(&points, &districts);
    let aggregation = aggregate(&matched);

    let rendered = render(&aggregation, generated_at)?;
    write_outputs(&rendered, &config.daily_output, &config.summary_output)?;

    let summary = RunSummary {
        matches,
        skipped_points: collection.skipped,
        total_fire_count: aggregation.total_fire_count(),
        date_range: aggregation.date_range(),
        region_totals: aggregation.region_totals,
    };
    log_summary(&summary);

    Ok(summary)
}

/// Runs the whole pipeline from configuration.
///
/// Downloads the FIRMS archive unless [`PipelineConfig::points`] names a
/// local file, then opens every source by file extension.
///
/// # Errors
///
/// Returns [`PipelineError`] naming the first stage that failed.
pub async fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let points_path = if let Some(path) = &config.points {
        log::info!("Using local fire data: {}", path.display());
        path.clone()
    } else {
        log::info!("Downloading VIIRS fire data from NASA FIRMS");
        fetch_firms_archive(
            &config.firms_url,
            config.download_timeout(),
            &config.work_dir,
        )
        .await?
    };

    let points = open_points(&points_path, &config.date_column)
        .map_err(|e| points_error(&points_path.display().to_string(), e))?;
    let punjab = open_boundaries(&config.punjab_boundaries)
        .map_err(|e| ConfigurationError::from_source("Punjab boundaries", e))?;
    let haryana = open_boundaries(&config.haryana_boundaries)
        .map_err(|e| ConfigurationError::from_source("Haryana boundaries", e))?;

    let sources = Sources {
        points: points.as_ref(),
        punjab: punjab.as_ref(),
        haryana: haryana.as_ref(),
    };

    run_with_sources(config, &sources, Utc::now())
}

fn points_error(name: &str, error: SourceError) -> PipelineError {
    log::error!("Failed to read fire detections from {name}");
    ConfigurationError::from_source("Fire detections", error).into()
}

fn log_summary(summary: &RunSummary) {
    log::info!("Processing complete");
    log::info!("Total fires detected: {}", summary.total_fire_count);
    match summary.date_range {
        Some((start, end)) => log::info!("Date range: {start} to {end}"),
        None => log::info!("Date range: none"),
    }
    log::info!("Punjab: {} fires", summary.region_totals.punjab);
    log::info!("Haryana: {} fires", summary.region_totals.haryana);
}
