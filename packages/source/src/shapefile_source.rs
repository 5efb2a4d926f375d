//! ESRI shapefile readers for fire detections and district boundaries.
//!
//! Geometry comes from the `.shp`, attributes from the `.dbf`, and the
//! reference system from the `.prj` sidecar when one exists.

use std::path::{Path, PathBuf};

use fire_map_geography_models::{Crs, FirePoint, ReferenceSystemError};
use fire_map_source_models::{
    BoundaryCollection, BoundarySource, FirePointSource, PointCollection, RawBoundary,
    SourceError,
};
use geo::{MultiPolygon, Point};
use shapefile::Shape;
use shapefile::dbase::{FieldValue, Record};

use crate::dates;

/// dBase bookkeeping column that is not a real attribute.
const DELETION_FLAG: &str = "DeletionFlag";

/// Fire detections stored as a point shapefile.
#[derive(Debug, Clone)]
pub struct ShapefilePointSource {
    path: PathBuf,
    name: String,
    date_column: String,
}

impl ShapefilePointSource {
    /// Creates a source reading `path`, taking acquisition dates from
    /// `date_column`.
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

impl FirePointSource for ShapefilePointSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_points(&self) -> Result<PointCollection, SourceError> {
        let table = read_table(&self.path)?;

        if !table.columns.iter().any(|c| c == &self.date_column) {
            return Err(SourceError::Decode {
                path: self.name.clone(),
                message: format!(
                    "date column '{}' not found. Available columns: {:?}",
                    self.date_column, table.columns
                ),
            });
        }

        let mut points = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for (shape, record) in table.rows {
            let location = shape_to_point(&shape);
            let date = record.get(&self.date_column).and_then(field_to_date);

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
                "Skipped {skipped} records in {} without a usable date or point geometry",
                self.name
            );
        }

        points.sort_by_key(|p| p.acquisition_date);

        Ok(PointCollection {
            crs: table.crs,
            unrecognized_crs: table.unrecognized_crs,
            points,
            skipped,
        })
    }
}

/// District polygons stored as a polygon shapefile.
#[derive(Debug, Clone)]
pub struct ShapefileBoundarySource {
    path: PathBuf,
    name: String,
}

impl ShapefileBoundarySource {
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

impl BoundarySource for ShapefileBoundarySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_boundaries(&self) -> Result<BoundaryCollection, SourceError> {
        let table = read_table(&self.path)?;
        let mut rows = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for (shape, record) in table.rows {
            let Some(geometry) = shape_to_multi_polygon(shape) else {
                skipped += 1;
                continue;
            };

            let attributes = table
                .columns
                .iter()
                .filter_map(|column| {
                    record
                        .get(column)
                        .and_then(field_to_string)
                        .map(|value| (column.clone(), value))
                })
                .collect();

            rows.push(RawBoundary {
                attributes,
                geometry,
            });
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} non-polygon shapes in {}", self.name);
        }

        Ok(BoundaryCollection {
            crs: table.crs,
            unrecognized_crs: table.unrecognized_crs,
            columns: table.columns,
            rows,
        })
    }
}

struct Table {
    crs: Option<Crs>,
    unrecognized_crs: Option<String>,
    columns: Vec<String>,
    rows: Vec<(Shape, Record)>,
}

fn read_table(path: &Path) -> Result<Table, SourceError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(SourceError::NotFound { path: display });
    }

    let decode = |message: String| SourceError::Decode {
        path: display.clone(),
        message,
    };

    let shapes = shapefile::ShapeReader::from_path(path)
        .and_then(shapefile::ShapeReader::read)
        .map_err(|e| decode(e.to_string()))?;

    let dbf_path = path.with_extension("dbf");
    let mut dbf = shapefile::dbase::Reader::from_path(&dbf_path)
        .map_err(|e| decode(format!("{}: {e}", dbf_path.display())))?;
    let columns: Vec<String> = dbf
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .filter(|name| name != DELETION_FLAG)
        .collect();
    let records = dbf
        .read()
        .map_err(|e| decode(format!("{}: {e}", dbf_path.display())))?;

    if shapes.len() != records.len() {
        return Err(decode(format!(
            "{} shapes but {} attribute records",
            shapes.len(),
            records.len()
        )));
    }

    let (crs, unrecognized_crs) = read_prj(path)?;

    Ok(Table {
        crs,
        unrecognized_crs,
        columns,
        rows: shapes.into_iter().zip(records).collect(),
    })
}

/// Reads the `.prj` sidecar next to `path`.
///
/// Returns the identified system, or the unidentified declaration. A
/// missing sidecar yields neither; the caller then needs an explicit
/// override.
fn read_prj(path: &Path) -> Result<(Option<Crs>, Option<String>), SourceError> {
    let prj_path = path.with_extension("prj");
    if !prj_path.exists() {
        log::warn!("No .prj sidecar for {}", path.display());
        return Ok((None, None));
    }

    let wkt = std::fs::read_to_string(&prj_path).map_err(|e| SourceError::Io {
        path: prj_path.display().to_string(),
        source: e,
    })?;

    Ok(identify_prj(&wkt, &prj_path.display().to_string()))
}

fn identify_prj(wkt: &str, prj_name: &str) -> (Option<Crs>, Option<String>) {
    match Crs::from_wkt(wkt) {
        Ok(crs) => (Some(crs), None),
        Err(ReferenceSystemError::Unsupported(declared)) => {
            log::warn!("Unrecognized reference system in {prj_name}: {declared}");
            (None, Some(format!("{declared} in {prj_name}")))
        }
        Err(e) => {
            log::warn!("Unrecognized reference system in {prj_name}: {e}");
            (None, Some(format!("{e} in {prj_name}")))
        }
    }
}

fn shape_to_point(shape: &Shape) -> Option<Point<f64>> {
    match shape {
        Shape::Point(p) => Some(Point::new(p.x, p.y)),
        Shape::PointM(p) => Some(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Some(Point::new(p.x, p.y)),
        _ => None,
    }
}

fn shape_to_multi_polygon(shape: Shape) -> Option<MultiPolygon<f64>> {
    match geo::Geometry::<f64>::try_from(shape).ok()? {
        geo::Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        geo::Geometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    }
}

fn field_to_date(value: &FieldValue) -> Option<chrono::NaiveDate> {
    match value {
        FieldValue::Date(Some(d)) => dates::from_components(d.year(), d.month(), d.day()),
        FieldValue::Character(Some(s)) => dates::parse_acquisition_date(s),
        _ => None,
    }
}

/// Stringifies a non-null attribute value.
fn field_to_string(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(s) => s.clone(),
        FieldValue::Memo(s) => Some(s.clone()),
        FieldValue::Numeric(n) => n.map(format_number),
        FieldValue::Float(f) => f.map(|f| format_number(f64::from(f))),
        FieldValue::Double(d) => Some(format_number(*d)),
        FieldValue::Currency(c) => Some(format_number(*c)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Logical(b) => b.map(|b| b.to_string()),
        FieldValue::Date(d) => d
            .as_ref()
            .and_then(|d| dates::from_components(d.year(), d.month(), d.day()))
            .map(|d| d.format("%Y-%m-%d").to_string()),
        other => Some(format!("{other:?}")),
    }
}

/// Formats integral values without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let source = ShapefileBoundarySource::new("does/not/exist/Punjab_District.shp");
        let err = source.load_boundaries().unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert!(err.to_string().contains("Punjab_District.shp"));
    }

    #[test]
    fn unrecognized_prj_is_kept_as_declared_text() {
        let wkt = r#"PROJCS["Kalianpur_1975_UTM_Zone_43N",GEOGCS["GCS_Kalianpur_1975"]]"#;
        let (crs, unrecognized) = identify_prj(wkt, "shapefiles/Punjab_District.prj");

        assert_eq!(crs, None);
        let unrecognized = unrecognized.unwrap();
        assert!(unrecognized.contains("Kalianpur_1975"), "{unrecognized}");
        assert!(unrecognized.contains("Punjab_District.prj"), "{unrecognized}");
    }

    #[test]
    fn recognized_prj_has_no_leftover_text() {
        let wkt = r#"PROJCS["WGS_1984_UTM_Zone_43N",GEOGCS["GCS_WGS_1984"]]"#;
        assert_eq!(
            identify_prj(wkt, "fires.prj"),
            (Some(Crs::Utm { zone: 43, north: true }), None)
        );
    }

    #[test]
    fn points_come_from_point_shapes_only() {
        let point = Shape::Point(shapefile::Point::new(75.85, 30.9));
        assert_eq!(shape_to_point(&point), Some(Point::new(75.85, 30.9)));

        let line = Shape::Polyline(shapefile::Polyline::new(vec![
            shapefile::Point::new(0.0, 0.0),
            shapefile::Point::new(1.0, 1.0),
        ]));
        assert_eq!(shape_to_point(&line), None);
    }

    #[test]
    fn dates_come_from_date_and_text_fields() {
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 11, 1);
        let dbase_date = FieldValue::Date(Some(shapefile::dbase::Date::new(1, 11, 2024)));
        assert_eq!(field_to_date(&dbase_date), expected);
        assert_eq!(
            field_to_date(&FieldValue::Character(Some("2024-11-01".to_string()))),
            expected
        );
        assert_eq!(field_to_date(&FieldValue::Character(None)), None);
        assert_eq!(field_to_date(&FieldValue::Numeric(Some(1.0))), None);
    }

    #[test]
    fn attribute_values_are_stringified() {
        assert_eq!(
            field_to_string(&FieldValue::Character(Some("Ludhiana".to_string()))),
            Some("Ludhiana".to_string())
        );
        assert_eq!(field_to_string(&FieldValue::Character(None)), None);
        assert_eq!(field_to_string(&FieldValue::Numeric(Some(3.0))), Some("3".to_string()));
        assert_eq!(
            field_to_string(&FieldValue::Numeric(Some(3.5))),
            Some("3.5".to_string())
        );
        assert_eq!(field_to_string(&FieldValue::Integer(12)), Some("12".to_string()));
    }
}
