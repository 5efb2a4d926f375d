//! Coordinate reference system identification.
//!
//! Only the systems that district and hotspot files are published in are
//! recognized: WGS 84 geographic, Web Mercator, and the WGS 84 UTM zones.
//! A [`Crs`] can be parsed from an EPSG code (`"EPSG:32643"`), an OGC URN,
//! or the WKT found in a shapefile `.prj` sidecar.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// EPSG code of WGS 84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;

/// EPSG code of Web Mercator (Pseudo-Mercator).
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// First EPSG code of the northern WGS 84 UTM zones (zone 1 = 32601).
const EPSG_UTM_NORTH_BASE: u32 = 32600;

/// First EPSG code of the southern WGS 84 UTM zones (zone 1 = 32701).
const EPSG_UTM_SOUTH_BASE: u32 = 32700;

/// A supported coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// WGS 84 longitude/latitude in degrees (EPSG:4326).
    Wgs84,
    /// Spherical Web Mercator in metres (EPSG:3857).
    WebMercator,
    /// WGS 84 Universal Transverse Mercator in metres.
    Utm {
        /// Zone number, 1 through 60.
        zone: u8,
        /// Northern hemisphere (false northing 0) or southern (10,000 km).
        north: bool,
    },
}

impl Crs {
    /// Resolves an EPSG code.
    #[must_use]
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            EPSG_WGS84 => Some(Self::Wgs84),
            EPSG_WEB_MERCATOR | 900_913 | 102_100 => Some(Self::WebMercator),
            c if (EPSG_UTM_NORTH_BASE + 1..=EPSG_UTM_NORTH_BASE + 60).contains(&c) => {
                u8::try_from(c - EPSG_UTM_NORTH_BASE)
                    .ok()
                    .map(|zone| Self::Utm { zone, north: true })
            }
            c if (EPSG_UTM_SOUTH_BASE + 1..=EPSG_UTM_SOUTH_BASE + 60).contains(&c) => {
                u8::try_from(c - EPSG_UTM_SOUTH_BASE)
                    .ok()
                    .map(|zone| Self::Utm { zone, north: false })
            }
            _ => None,
        }
    }

    /// The canonical EPSG code.
    #[must_use]
    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => EPSG_WGS84,
            Self::WebMercator => EPSG_WEB_MERCATOR,
            Self::Utm { zone, north: true } => EPSG_UTM_NORTH_BASE + u32::from(zone),
            Self::Utm { zone, north: false } => EPSG_UTM_SOUTH_BASE + u32::from(zone),
        }
    }

    /// Identifies a reference system from OGC WKT (version 1 or 2).
    ///
    /// An `AUTHORITY["EPSG",...]` / `ID["EPSG",...]` directly on the root
    /// node wins when present. Otherwise the system is recognized by name, which covers
    /// the ESRI-flavoured WKT that most `.prj` files contain.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceSystemError::Unsupported`] if the WKT does not
    /// describe one of the supported systems.
    pub fn from_wkt(wkt: &str) -> Result<Self, ReferenceSystemError> {
        let wkt = wkt.trim();
        let unsupported = || ReferenceSystemError::Unsupported(truncate(wkt, 120));

        if let Some(code) = outermost_epsg_code(wkt) {
            return Self::from_epsg(code).ok_or_else(unsupported);
        }

        let normalized = wkt.to_ascii_uppercase().replace('_', " ");

        if normalized.starts_with("PROJCS") || normalized.starts_with("PROJCRS") {
            if !normalized.contains("WGS") {
                return Err(unsupported());
            }
            if let Some(utm) = parse_utm_zone(&normalized) {
                return Ok(utm);
            }
            if ["MERCATOR AUXILIARY SPHERE", "PSEUDO-MERCATOR", "PSEUDO MERCATOR", "WEB MERCATOR"]
                .iter()
                .any(|name| normalized.contains(name))
            {
                return Ok(Self::WebMercator);
            }
            return Err(unsupported());
        }

        if (normalized.starts_with("GEOGCS") || normalized.starts_with("GEOGCRS"))
            && (normalized.contains("WGS 1984")
                || normalized.contains("WGS 84")
                || normalized.contains("WGS84"))
        {
            return Ok(Self::Wgs84);
        }

        Err(unsupported())
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = ReferenceSystemError;

    /// Accepts `EPSG:<code>`, bare codes, OGC URNs
    /// (`urn:ogc:def:crs:EPSG::4326`, `urn:ogc:def:crs:OGC:1.3:CRS84`)
    /// and WKT.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ReferenceSystemError::Unsupported(String::new()));
        }

        let upper = trimmed.to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }
        if upper.starts_with("PROJ") || upper.starts_with("GEOG") {
            return Self::from_wkt(trimmed);
        }

        let code = upper
            .rsplit(':')
            .next()
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| ReferenceSystemError::Unsupported(trimmed.to_string()))?;

        Self::from_epsg(code).ok_or_else(|| ReferenceSystemError::Unsupported(trimmed.to_string()))
    }
}

impl TryFrom<String> for Crs {
    type Error = ReferenceSystemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

/// Errors raised when reference systems are missing or cannot be
/// reconciled.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceSystemError {
    /// A geometry collection carries no reference system at all.
    #[error("{subject} has no defined reference system")]
    Undefined {
        /// Which collection is missing its reference system.
        subject: String,
    },

    /// The reference system is not one this tool can transform.
    #[error("Unsupported reference system: {0}")]
    Unsupported(String),

    /// A transformed coordinate came out as NaN or infinite.
    #[error("Reprojection from {from} to {to} failed at ({x}, {y})")]
    NonFinite {
        /// Source reference system.
        from: Crs,
        /// Target reference system.
        to: Crs,
        /// Input x / longitude.
        x: f64,
        /// Input y / latitude.
        y: f64,
    },
}

/// Finds the EPSG code attached to the outermost WKT node.
///
/// Only an `AUTHORITY`/`ID` that is a direct child of the root node
/// counts. Nested datum, unit and base-CRS authorities are ignored.
fn outermost_epsg_code(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mut depth = 0usize;
    let mut in_quotes = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'[' | b'(' if !in_quotes => depth += 1,
            b']' | b')' if !in_quotes => depth = depth.saturating_sub(1),
            b'A' | b'I' if !in_quotes && depth == 1 => {
                let at_token_start =
                    i > 0 && (bytes[i - 1] == b',' || bytes[i - 1].is_ascii_whitespace());
                if !at_token_start {
                    continue;
                }
                let rest = &upper[i..];
                let Some(args) = ["AUTHORITY[", "ID["]
                    .iter()
                    .find_map(|keyword| rest.strip_prefix(keyword))
                else {
                    continue;
                };
                if let Some(code) = epsg_code_argument(args) {
                    return Some(code);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parses `"EPSG","32643"` / `"EPSG",32643` at the start of `args`.
fn epsg_code_argument(args: &str) -> Option<u32> {
    let rest = args.trim_start().strip_prefix("\"EPSG\"")?;
    let rest = rest.trim_start().strip_prefix(',')?;
    let digits: String = rest
        .chars()
        .skip_while(|c| *c == '"' || c.is_whitespace())
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse().ok()
}

/// Parses `UTM ZONE 43N` style names (already uppercased, `_` replaced).
fn parse_utm_zone(normalized: &str) -> Option<Crs> {
    let idx = normalized.find("UTM ZONE")?;
    let rest = normalized[idx + "UTM ZONE".len()..].trim_start();

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let zone: u8 = digits.parse().ok()?;
    if !(1..=60).contains(&zone) {
        return None;
    }

    let north = match rest[digits.len()..].chars().next() {
        Some('S') => false,
        Some('N') => true,
        _ => return None,
    };

    Some(Crs::Utm { zone, north })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let end = (0..=max_len).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESRI_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    const ESRI_UTM_43N: &str = r#"PROJCS["WGS_1984_UTM_Zone_43N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",75.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    const OGC_UTM_43N: &str = r#"PROJCS["WGS 84 / UTM zone 43N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32643"]]"#;

    const ESRI_WEB_MERCATOR: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],UNIT["Meter",1.0]]"#;

    #[test]
    fn epsg_roundtrip() {
        for code in [4326, 3857, 32601, 32643, 32660, 32701, 32760] {
            let crs = Crs::from_epsg(code).unwrap();
            assert_eq!(crs.epsg(), code, "roundtrip failed for {code}");
        }
        assert_eq!(Crs::from_epsg(32600), None);
        assert_eq!(Crs::from_epsg(32661), None);
        assert_eq!(Crs::from_epsg(27700), None);
    }

    #[test]
    fn parses_epsg_strings_and_urns() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!("epsg:3857".parse::<Crs>().unwrap(), Crs::WebMercator);
        assert_eq!(
            "urn:ogc:def:crs:EPSG::32643".parse::<Crs>().unwrap(),
            Crs::Utm { zone: 43, north: true }
        );
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap(),
            Crs::Wgs84
        );
        assert!("EPSG:27700".parse::<Crs>().is_err());
        assert!("".parse::<Crs>().is_err());
    }

    #[test]
    fn parses_esri_prj_files() {
        assert_eq!(Crs::from_wkt(ESRI_WGS84).unwrap(), Crs::Wgs84);
        assert_eq!(
            Crs::from_wkt(ESRI_UTM_43N).unwrap(),
            Crs::Utm { zone: 43, north: true }
        );
        assert_eq!(Crs::from_wkt(ESRI_WEB_MERCATOR).unwrap(), Crs::WebMercator);
    }

    #[test]
    fn outermost_authority_wins() {
        assert_eq!(
            Crs::from_wkt(OGC_UTM_43N).unwrap(),
            Crs::Utm { zone: 43, north: true }
        );
    }

    #[test]
    fn nested_authorities_do_not_identify_the_root() {
        // GEOGCS carries EPSG:4326 but the PROJCS itself has no authority.
        let wkt = r#"PROJCS["WGS 84 / UTM zone 43N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",75],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1]]"#;
        assert_eq!(
            Crs::from_wkt(wkt).unwrap(),
            Crs::Utm { zone: 43, north: true }
        );

        let with_unit_authority = wkt.replace(
            r#"UNIT["metre",1]]"#,
            r#"UNIT["metre",1,AUTHORITY["EPSG","9001"]]]"#,
        );
        assert_eq!(
            Crs::from_wkt(&with_unit_authority).unwrap(),
            Crs::Utm { zone: 43, north: true }
        );
    }

    #[test]
    fn wkt2_root_id_wins() {
        let wkt = r#"PROJCRS["WGS 84 / UTM zone 44N",BASEGEOGCRS["WGS 84",ID["EPSG",4326]],CONVERSION["UTM zone 44N",METHOD["Transverse Mercator",ID["EPSG",9807]]],ID["EPSG",32644]]"#;
        assert_eq!(
            Crs::from_wkt(wkt).unwrap(),
            Crs::Utm { zone: 44, north: true }
        );
    }

    #[test]
    fn southern_utm_by_name() {
        let wkt = r#"PROJCS["WGS_1984_UTM_Zone_55S",GEOGCS["GCS_WGS_1984"]]"#;
        assert_eq!(
            Crs::from_wkt(wkt).unwrap(),
            Crs::Utm { zone: 55, north: false }
        );
    }

    #[test]
    fn rejects_other_datums() {
        let wkt = r#"PROJCS["Kalianpur_1975_UTM_Zone_43N",GEOGCS["GCS_Kalianpur_1975"]]"#;
        assert!(matches!(
            Crs::from_wkt(wkt),
            Err(ReferenceSystemError::Unsupported(_))
        ));
    }

    #[test]
    fn display_is_epsg() {
        assert_eq!(Crs::Utm { zone: 43, north: true }.to_string(), "EPSG:32643");
        assert_eq!(Crs::Wgs84.to_string(), "EPSG:4326");
    }
}
