//! Brings fire detections into the district collection's reference
//! system.

use fire_map_geography_models::{Crs, FirePoint, ReferenceSystemError};

use crate::projection::transform_point;

/// Returns `points` expressed in `target`.
///
/// When `points_crs` already equals `target` the points are returned
/// as-is without touching a coordinate. Otherwise every location is
/// reprojected; dates and order are preserved and no point is dropped.
///
/// # Errors
///
/// Returns [`ReferenceSystemError::Undefined`] if either side lacks a
/// reference system, or [`ReferenceSystemError::NonFinite`] if a point
/// cannot be transformed.
pub fn reconcile_points(
    points: Vec<FirePoint>,
    points_crs: Option<Crs>,
    target: Option<Crs>,
) -> Result<Vec<FirePoint>, ReferenceSystemError> {
    let from = points_crs.ok_or_else(|| ReferenceSystemError::Undefined {
        subject: "Fire detections".to_string(),
    })?;
    let to = target.ok_or_else(|| ReferenceSystemError::Undefined {
        subject: "District boundaries".to_string(),
    })?;

    log::info!("Fire points CRS: {from}");
    log::info!("Districts CRS: {to}");

    if from == to {
        return Ok(points);
    }

    log::warn!(
        "CRS mismatch detected, reprojecting {} fire points from {from} to {to}",
        points.len()
    );

    let reprojected = points
        .into_iter()
        .map(|point| {
            Ok(FirePoint {
                location: transform_point(from, to, point.location)?,
                ..point
            })
        })
        .collect::<Result<Vec<_>, ReferenceSystemError>>()?;

    log::info!("Reprojection complete");

    Ok(reprojected)
}
