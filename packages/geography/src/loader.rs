//! Combines the Punjab and Haryana boundary sources into one
//! region-tagged district collection.
//!
//! Both sources are read before the district column is checked in
//! either of them.

use fire_map_geography_models::{Crs, District, DistrictCollection, ReferenceSystemError, Region};
use fire_map_source_models::{BoundaryCollection, BoundarySource};

use crate::projection::transform_multi_polygon;
use crate::{ConfigurationError, GeoError};

/// Loads both boundary sources and tags every row with its region.
///
/// Rows keep their source order, Punjab first. No row is dropped or
/// duplicated; a row with no value in `district_column` keeps an empty
/// name and is logged. When the two sources declare different reference
/// systems the Haryana geometries are reprojected into the Punjab system.
/// `crs_override` stands in for a source that declares no system.
///
/// # Errors
///
/// Returns [`GeoError::Configuration`] if a source file is missing,
/// unreadable, or lacks `district_column`, and
/// [`GeoError::ReferenceSystem`] if a source has no usable reference
/// system.
pub fn load_districts(
    punjab: &dyn BoundarySource,
    haryana: &dyn BoundarySource,
    district_column: &str,
    crs_override: Option<Crs>,
) -> Result<DistrictCollection, GeoError> {
    let sources: [(Region, &dyn BoundarySource); 2] =
        [(Region::Punjab, punjab), (Region::Haryana, haryana)];

    let mut loaded = Vec::with_capacity(sources.len());
    for (region, source) in sources {
        log::info!("Loading {region} districts from: {}", source.name());
        let collection = source
            .load_boundaries()
            .map_err(|e| ConfigurationError::from_source(&format!("{region} boundaries"), e))?;
        log::info!("  Found {} {region} districts", collection.rows.len());
        loaded.push((region, source, collection));
    }

    for (region, source, collection) in &loaded {
        if !collection.has_column(district_column) {
            log::error!(
                "Column '{district_column}' not found in {region} boundaries. Available columns: {:?}",
                collection.columns
            );
            return Err(ConfigurationError::MissingColumn {
                region: *region,
                column: district_column.to_string(),
                source_name: source.name().to_string(),
                available: collection.columns.clone(),
            }
            .into());
        }
    }

    let mut target: Option<Crs> = None;
    let mut districts = Vec::new();

    for (region, source, collection) in loaded {
        let crs = collection
            .resolve_crs(crs_override, &format!("{region} boundaries ({})", source.name()))?;
        let target_crs = *target.get_or_insert(crs);

        if crs != target_crs {
            log::warn!("{region} boundaries are in {crs}, reprojecting to {target_crs}");
        }

        districts.extend(tag_rows(region, collection, district_column, crs, target_crs)?);
    }

    let crs = target.unwrap_or(Crs::Wgs84);
    let collection = DistrictCollection { crs, districts };
    log::info!("Total districts loaded: {}", collection.districts.len());
    for region in Region::ALL {
        log::info!("  {region}: {}", collection.count_in(region));
    }
    log::info!("  CRS: {crs}");

    Ok(collection)
}

fn tag_rows(
    region: Region,
    collection: BoundaryCollection,
    district_column: &str,
    from: Crs,
    to: Crs,
) -> Result<Vec<District>, ReferenceSystemError> {
    let mut unnamed = 0usize;

    let districts = collection
        .rows
        .into_iter()
        .map(|row| {
            let name = row
                .attributes
                .get(district_column)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            if name.is_empty() {
                unnamed += 1;
            }

            Ok(District {
                region,
                name,
                geometry: transform_multi_polygon(from, to, &row.geometry)?,
            })
        })
        .collect::<Result<Vec<_>, ReferenceSystemError>>()?;

    if unnamed > 0 {
        log::warn!("{unnamed} {region} districts have no '{district_column}' value");
    }

    Ok(districts)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fire_map_source_models::{RawBoundary, SourceError};
    use geo::{MultiPolygon, polygon};

    use super::*;
    use crate::projection::to_geographic;

    struct FakeBoundaries {
        name: String,
        result: fn() -> Result<BoundaryCollection, SourceError>,
    }

    impl BoundarySource for FakeBoundaries {
        fn name(&self) -> &str {
            &self.name
        }

        fn load_boundaries(&self) -> Result<BoundaryCollection, SourceError> {
            (self.result)()
        }
    }

    fn fake(name: &str, result: fn() -> Result<BoundaryCollection, SourceError>) -> FakeBoundaries {
        FakeBoundaries {
            name: name.to_string(),
            result,
        }
    }

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![geo::polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
        ]])
    }

    fn row(name: Option<&str>, geometry: MultiPolygon<f64>) -> RawBoundary {
        let mut attributes = BTreeMap::new();
        attributes.insert("stname".to_string(), "X".to_string());
        if let Some(name) = name {
            attributes.insert("dtname".to_string(), name.to_string());
        }
        RawBoundary {
            attributes,
            geometry,
        }
    }

    fn columns() -> Vec<String> {
        vec!["stname".to_string(), "dtname".to_string()]
    }

    fn punjab_ok() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: Some(Crs::Wgs84),
            unrecognized_crs: None,
            columns: columns(),
            rows: vec![
                row(Some("Ludhiana"), square(75.0, 30.0)),
                row(Some("Patiala"), square(76.0, 30.0)),
            ],
        })
    }

    fn haryana_ok() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: Some(Crs::Wgs84),
            unrecognized_crs: None,
            columns: columns(),
            rows: vec![row(Some(" Karnal "), square(76.5, 29.5))],
        })
    }

    fn haryana_utm() -> Result<BoundaryCollection, SourceError> {
        let utm = Crs::Utm {
            zone: 43,
            north: true,
        };
        let geometry = transform_multi_polygon(Crs::Wgs84, utm, &square(76.5, 29.5)).unwrap();
        Ok(BoundaryCollection {
            crs: Some(utm),
            unrecognized_crs: None,
            columns: columns(),
            rows: vec![row(Some("Karnal"), geometry)],
        })
    }

    fn haryana_wrong_column() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: Some(Crs::Wgs84),
            unrecognized_crs: None,
            columns: vec!["DISTRICT".to_string(), "STATE".to_string()],
            rows: Vec::new(),
        })
    }

    fn haryana_no_crs() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: None,
            ..haryana_ok()?
        })
    }

    fn haryana_unrecognized_crs() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: None,
            unrecognized_crs: Some("PROJCS[\"Kalianpur_1975_UTM_Zone_43N\"]".to_string()),
            ..haryana_ok()?
        })
    }

    fn haryana_unnamed() -> Result<BoundaryCollection, SourceError> {
        Ok(BoundaryCollection {
            crs: Some(Crs::Wgs84),
            unrecognized_crs: None,
            columns: columns(),
            rows: vec![row(None, square(76.5, 29.5))],
        })
    }

    fn missing() -> Result<BoundaryCollection, SourceError> {
        Err(SourceError::NotFound {
            path: "shapefiles/Haryana_District.shp".to_string(),
        })
    }

    #[test]
    fn tags_and_concatenates_in_order() {
        let collection = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_ok),
            "dtname",
            None,
        )
        .unwrap();

        assert_eq!(collection.crs, Crs::Wgs84);
        assert_eq!(collection.count_in(Region::Punjab), 2);
        assert_eq!(collection.count_in(Region::Haryana), 1);
        let tagged: Vec<(Region, &str)> = collection
            .districts
            .iter()
            .map(|d| (d.region, d.name.as_str()))
            .collect();
        assert_eq!(
            tagged,
            vec![
                (Region::Punjab, "Ludhiana"),
                (Region::Punjab, "Patiala"),
                (Region::Haryana, "Karnal"),
            ]
        );
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", missing),
            "dtname",
            None,
        )
        .unwrap_err();

        match &err {
            GeoError::Configuration(ConfigurationError::MissingFile { subject, path }) => {
                assert_eq!(subject, "Haryana boundaries");
                assert_eq!(path, "shapefiles/Haryana_District.shp");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let err = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana.shp", haryana_wrong_column),
            "dtname",
            None,
        )
        .unwrap_err();

        match &err {
            GeoError::Configuration(ConfigurationError::MissingColumn {
                region,
                column,
                available,
                ..
            }) => {
                assert_eq!(*region, Region::Haryana);
                assert_eq!(column, "dtname");
                assert_eq!(available, &vec!["DISTRICT".to_string(), "STATE".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let message = err.to_string();
        assert!(message.contains("DISTRICT"), "{message}");
        assert!(message.contains("STATE"), "{message}");
    }

    #[test]
    fn second_collection_is_reprojected_into_first_system() {
        let collection = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_utm),
            "dtname",
            None,
        )
        .unwrap();

        assert_eq!(collection.crs, Crs::Wgs84);
        let karnal = &collection.districts[2];
        let first = karnal.geometry.0[0].exterior().0[0];
        assert!((first.x - 76.5).abs() < 1e-8, "{first:?}");
        assert!((first.y - 29.5).abs() < 1e-8, "{first:?}");
    }

    #[test]
    fn undefined_system_without_override_is_an_error() {
        let err = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_no_crs),
            "dtname",
            None,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            GeoError::ReferenceSystem(ReferenceSystemError::Undefined { .. })
        ));
    }

    #[test]
    fn unrecognized_system_without_override_is_unsupported() {
        let err = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_unrecognized_crs),
            "dtname",
            None,
        )
        .unwrap_err();

        match &err {
            GeoError::ReferenceSystem(ReferenceSystemError::Unsupported(declared)) => {
                assert!(declared.contains("Kalianpur_1975"), "{declared}");
                assert!(declared.contains("Haryana boundaries"), "{declared}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn override_fills_in_undefined_system() {
        let utm = Crs::Utm {
            zone: 43,
            north: true,
        };
        let collection = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_no_crs),
            "dtname",
            Some(utm),
        )
        .unwrap();

        // Punjab declares WGS 84, so the override only applies to Haryana,
        // whose geometry is then moved from UTM into WGS 84.
        assert_eq!(collection.crs, Crs::Wgs84);
        let expected = to_geographic(utm, geo::Coord { x: 76.5, y: 29.5 });
        let first = collection.districts[2].geometry.0[0].exterior().0[0];
        assert!((first.x - expected.x).abs() < 1e-8);
        assert!((first.y - expected.y).abs() < 1e-8);
    }

    #[test]
    fn unnamed_rows_are_kept() {
        let collection = load_districts(
            &fake("punjab", punjab_ok),
            &fake("haryana", haryana_unnamed),
            "dtname",
            None,
        )
        .unwrap();

        assert_eq!(collection.districts.len(), 3);
        assert_eq!(collection.districts[2].name, "");
    }
}
