//! GeoJSON readers for fire detections and district boundaries.
//!
//! Only `FeatureCollection` documents are accepted. The reference system
//! is taken from the legacy top-level `crs` member when present and is
//! WGS 84 otherwise.

use std::path::{Path, PathBuf};

use fire_map_geography_models::{Crs, FirePoint};
use fire_map_source_models::{
    BoundaryCollection, BoundarySource, FirePointSource, PointCollection, RawBoundary,
    SourceError,
};
use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::dates;

/// Fire detections stored as a GeoJSON point feature collection.
#[derive(Debug, Clone)]
pub struct GeoJsonPointSource {
    path: PathBuf,
    name: String,
    date_column: String,
}

impl GeoJsonPointSource {
    /// Creates a source reading `path`, taking acquisition dates from the
    /// `date_column` property.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, date_column: &str) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
            date_column: date_column.to_string(),
        }
    }
}

impl FirePointSource for GeoJsonPointSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_points(&self) -> Result<PointCollection, SourceError> {
        let collection = read_feature_collection(&self.path)?;
        let crs = collection_crs(&collection, &self.name)?;

        let mut points = Vec::with_capacity(collection.features.len());
        let mut skipped = 0usize;

        for feature in collection.features {
            let date = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(&self.date_column))
                .and_then(json_to_date);
            let location = feature
                .geometry
                .and_then(|g| geo::Geometry::<f64>::try_from(g).ok())
                .and_then(|g| geo::Point::try_from(g).ok());

            match (location, date) {
                (Some(location), Some(acquisition_date)) => points.push(FirePoint {
                    acquisition_date,
                    location,
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {skipped} features in {} without a usable '{}' date or point geometry",
                self.name,
                self.date_column
            );
        }

        points.sort_by_key(|p| p.acquisition_date);

        Ok(PointCollection {
            crs: Some(crs),
            unrecognized_crs: None,
            points,
            skipped,
        })
    }
}

/// District polygons stored as a GeoJSON feature collection.
#[derive(Debug, Clone)]
pub struct GeoJsonBoundarySource {
    path: PathBuf,
    name: String,
}

impl GeoJsonBoundarySource {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
        }
    }
}

impl BoundarySource for GeoJsonBoundarySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_boundaries(&self) -> Result<BoundaryCollection, SourceError> {
        let collection = read_feature_collection(&self.path)?;
        let crs = collection_crs(&collection, &self.name)?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(collection.features.len());
        let mut skipped = 0usize;

        for feature in collection.features {
            if let Some(props) = &feature.properties {
                for key in props.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }

            let geometry = match feature
                .geometry
                .and_then(|g| geo::Geometry::<f64>::try_from(g).ok())
            {
                Some(geo::Geometry::Polygon(polygon)) => MultiPolygon(vec![polygon]),
                Some(geo::Geometry::MultiPolygon(multi)) => multi,
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            rows.push(RawBoundary {
                attributes: feature
                    .properties
                    .as_ref()
                    .map(stringify_properties)
                    .unwrap_or_default(),
                geometry,
            });
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} non-polygon features in {}", self.name);
        }

        Ok(BoundaryCollection {
            crs: Some(crs),
            unrecognized_crs: None,
            columns,
            rows,
        })
    }
}

fn read_feature_collection(path: &Path) -> Result<FeatureCollection, SourceError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(SourceError::NotFound { path: display });
    }

    let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: display.clone(),
        source: e,
    })?;

    match text.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
        Ok(_) => Err(SourceError::Decode {
            path: display,
            message: "expected a FeatureCollection".to_string(),
        }),
        Err(e) => Err(SourceError::Decode {
            path: display,
            message: e.to_string(),
        }),
    }
}

/// Reads the legacy `crs` member, defaulting to WGS 84.
fn collection_crs(collection: &FeatureCollection, name: &str) -> Result<Crs, SourceError> {
    let declared = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str);

    let Some(declared) = declared else {
        return Ok(Crs::Wgs84);
    };

    declared.parse().map_err(|e| SourceError::Decode {
        path: name.to_string(),
        message: format!("{e}"),
    })
}

fn json_to_date(value: &JsonValue) -> Option<chrono::NaiveDate> {
    match value {
        JsonValue::String(s) => dates::parse_acquisition_date(s),
        JsonValue::Number(n) => dates::parse_acquisition_date(&n.to_string()),
        _ => None,
    }
}

fn stringify_properties(props: &JsonObject) -> std::collections::BTreeMap<String, String> {
    props
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                JsonValue::Null => return None,
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
