//! Forward and inverse map projections on the WGS 84 ellipsoid.
//!
//! Every transform goes through geographic coordinates: the source
//! projection is inverted to longitude/latitude, then the target
//! projection is applied. UTM uses the third-order Krüger series, which
//! stays within a millimetre of the exact transverse Mercator inside a
//! zone. Web Mercator is the spherical variant used by web maps.
//!
//! Implemented directly rather than through PROJ so the binary has no
//! native dependencies.

use std::sync::LazyLock;

use fire_map_geography_models::{Crs, ReferenceSystemError};
use geo::{Coord, MapCoords as _, MultiPolygon, Point};

/// WGS 84 semi-major axis in metres.
const WGS84_A: f64 = 6_378_137.0;

/// WGS 84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central scale factor.
const UTM_K0: f64 = 0.9996;

/// UTM false easting in metres.
const UTM_FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for the southern hemisphere in metres.
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude limit of the square Web Mercator world.
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Harmonic multipliers of the three series terms.
const HARMONICS: [f64; 3] = [2.0, 4.0, 6.0];

/// Krüger series coefficients derived from the WGS 84 flattening.
struct KruegerSeries {
    /// `k0 * A`, the scaled rectifying radius.
    k0_a: f64,
    /// `2 * sqrt(n) / (1 + n)`.
    c: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

static KRUEGER: LazyLock<KruegerSeries> = LazyLock::new(|| {
    let n = WGS84_F / (2.0 - WGS84_F);
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n2 * n2;

    let a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);

    KruegerSeries {
        k0_a: UTM_K0 * a,
        c: 2.0 * n.sqrt() / (1.0 + n),
        alpha: [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
            61.0 / 240.0 * n3,
        ],
        beta: [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3,
            17.0 / 480.0 * n3,
        ],
        delta: [
            2.0 * n - 2.0 / 3.0 * n2 - 2.0 * n3,
            7.0 / 3.0 * n2 - 8.0 / 5.0 * n3,
            56.0 / 15.0 * n3,
        ],
    }
});

/// Central meridian of a UTM zone in degrees.
fn central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

/// Projects WGS 84 longitude/latitude (degrees) into `crs`.
#[must_use]
pub fn from_geographic(crs: Crs, lon_lat: Coord<f64>) -> Coord<f64> {
    match crs {
        Crs::Wgs84 => lon_lat,
        Crs::WebMercator => {
            let lat = lon_lat
                .y
                .clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT)
                .to_radians();
            Coord {
                x: WGS84_A * lon_lat.x.to_radians(),
                y: WGS84_A * lat.tan().asinh(),
            }
        }
        Crs::Utm { zone, north } => utm_forward(zone, north, lon_lat),
    }
}

/// Converts coordinates in `crs` back to WGS 84 longitude/latitude.
#[must_use]
pub fn to_geographic(crs: Crs, xy: Coord<f64>) -> Coord<f64> {
    match crs {
        Crs::Wgs84 => xy,
        Crs::WebMercator => Coord {
            x: (xy.x / WGS84_A).to_degrees(),
            y: (xy.y / WGS84_A).sinh().atan().to_degrees(),
        },
        Crs::Utm { zone, north } => utm_inverse(zone, north, xy),
    }
}

fn utm_forward(zone: u8, north: bool, lon_lat: Coord<f64>) -> Coord<f64> {
    let k = &*KRUEGER;

    let phi = lon_lat.y.to_radians();
    let d_lambda = (lon_lat.x - central_meridian(zone)).to_radians();

    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - k.c * (k.c * sin_phi).atanh()).sinh();

    let xi_p = (t / d_lambda.cos()).atan();
    let eta_p = (d_lambda.sin() / t.mul_add(t, 1.0).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (m, alpha) in HARMONICS.iter().zip(k.alpha) {
        xi += alpha * (m * xi_p).sin() * (m * eta_p).cosh();
        eta += alpha * (m * xi_p).cos() * (m * eta_p).sinh();
    }

    let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };

    Coord {
        x: k.k0_a.mul_add(eta, UTM_FALSE_EASTING),
        y: k.k0_a.mul_add(xi, false_northing),
    }
}

fn utm_inverse(zone: u8, north: bool, xy: Coord<f64>) -> Coord<f64> {
    let k = &*KRUEGER;

    let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    let xi = (xy.y - false_northing) / k.k0_a;
    let eta = (xy.x - UTM_FALSE_EASTING) / k.k0_a;

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (m, beta) in HARMONICS.iter().zip(k.beta) {
        xi_p -= beta * (m * xi).sin() * (m * eta).cosh();
        eta_p -= beta * (m * xi).cos() * (m * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();

    let mut phi = chi;
    for (m, delta) in HARMONICS.iter().zip(k.delta) {
        phi += delta * (m * chi).sin();
    }

    let lambda = (eta_p.sinh() / xi_p.cos()).atan();

    Coord {
        x: central_meridian(zone) + lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

/// Transforms a single coordinate from `from` to `to`.
///
/// # Errors
///
/// Returns [`ReferenceSystemError::NonFinite`] if the result is NaN or
/// infinite (e.g. a latitude beyond the poles).
pub fn transform_coord(
    from: Crs,
    to: Crs,
    coord: Coord<f64>,
) -> Result<Coord<f64>, ReferenceSystemError> {
    if from == to {
        return Ok(coord);
    }

    let out = from_geographic(to, to_geographic(from, coord));

    if out.x.is_finite() && out.y.is_finite() {
        Ok(out)
    } else {
        Err(ReferenceSystemError::NonFinite {
            from,
            to,
            x: coord.x,
            y: coord.y,
        })
    }
}

/// Transforms a point from `from` to `to`.
///
/// # Errors
///
/// Returns [`ReferenceSystemError::NonFinite`] if the result is not finite.
pub fn transform_point(
    from: Crs,
    to: Crs,
    point: Point<f64>,
) -> Result<Point<f64>, ReferenceSystemError> {
    transform_coord(from, to, point.0).map(Point)
}

/// Transforms every vertex of a multipolygon from `from` to `to`.
///
/// # Errors
///
/// Returns [`ReferenceSystemError::NonFinite`] if any vertex fails.
pub fn transform_multi_polygon(
    from: Crs,
    to: Crs,
    geometry: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, ReferenceSystemError> {
    if from == to {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|coord| transform_coord(from, to, coord))
}
