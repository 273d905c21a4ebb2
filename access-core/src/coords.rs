//! Geodetic (DMS) and planar (meter) coordinates and the fixed projection
//! between them.
//!
//! The projection is a Gauss-Krüger / Transverse Mercator configuration
//! with the SWEREF99TM constants. All projection math is done
//! in `f64` and only rounded to `i32` at the DMS -> meter boundary, as
//! required for grid-aligned people data to round-trip exactly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A fixed Transverse Mercator-family projection's ellipsoid and grid
/// parameters. `Sweref99Tm` is the only configuration this crate needs,
/// but keeping the constants on a trait documents which numbers come from
/// the ellipsoid (GRS80) vs. the particular zone (SWEREF99TM).
trait Projection {
    fn equatorial_radius(&self) -> f64;
    fn flattening(&self) -> f64;
    fn central_meridian(&self) -> f64;
    fn scale(&self) -> f64;
    fn false_northing(&self) -> f64;
    fn false_easting(&self) -> f64;
}

struct Sweref99Tm;

impl Projection for Sweref99Tm {
    fn equatorial_radius(&self) -> f64 {
        6_378_137.0
    }
    fn flattening(&self) -> f64 {
        1.0 / 298.257222101
    }
    fn central_meridian(&self) -> f64 {
        15.0
    }
    fn scale(&self) -> f64 {
        0.9996
    }
    fn false_northing(&self) -> f64 {
        0.0
    }
    fn false_easting(&self) -> f64 {
        500_000.0
    }
}

/// Geodetic coordinate: latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmsCoord {
    pub lat: f64,
    pub lon: f64,
}

impl DmsCoord {
    pub fn new(lat: f64, lon: f64) -> DmsCoord {
        DmsCoord { lat, lon }
    }

    /// Projects to planar meters, rounding to the nearest integer meter.
    pub fn to_meter(self) -> MeterCoord {
        let (x, y) = geodetic_to_grid(&Sweref99Tm, self.lat, self.lon);
        MeterCoord {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

impl PartialOrd for DmsCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(
            self.lat
                .partial_cmp(&other.lat)?
                .then(self.lon.partial_cmp(&other.lon)?),
        )
    }
}

/// Planar coordinate in meters under the fixed projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeterCoord {
    pub x: i32,
    pub y: i32,
}

impl MeterCoord {
    pub fn new(x: i32, y: i32) -> MeterCoord {
        MeterCoord { x, y }
    }

    pub fn to_dms(self) -> DmsCoord {
        let (lat, lon) = grid_to_geodetic(&Sweref99Tm, self.x as f64, self.y as f64);
        DmsCoord { lat, lon }
    }

    /// Euclidean distance in meters, `f32` precision.
    pub fn distance_to(self, other: MeterCoord) -> f32 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt() as f32
    }

    /// `true` iff the distance to `other` is <= `d`, computed without a
    /// sqrt using `i64` arithmetic to avoid overflow at regional scale.
    pub fn distance_to_leq(self, other: MeterCoord, d: i32) -> bool {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let d = d as i64;
        dx * dx + dy * dy <= d * d
    }

    /// The center of the `step`-sized grid cell (offset by `offset` in
    /// both axes) that contains this coordinate. Used to validate the
    /// people-grid assumption that homes lie on a grid offset by
    /// +50m, i.e. `grid_cell(100, 50) == self` for every resident home.
    pub fn grid_cell(self, step: i32, offset: i32) -> MeterCoord {
        MeterCoord {
            x: div_floor(self.x - offset, step) * step + offset,
            y: div_floor(self.y - offset, step) * step + offset,
        }
    }
}

pub(crate) fn div_floor(a: i32, b: i32) -> i32 {
    let q = a / b;
    let r = a % b;
    if (r != 0) && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn geodetic_to_grid(proj: &dyn Projection, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let f = proj.flattening();
    let e2 = f * (2.0 - f);
    let n = f / (2.0 - f);
    let a_roof = proj.equatorial_radius() / (1.0 + n) * (1.0 + n * n / 4.0 + n.powi(4) / 64.0);

    let a = e2;
    let b = (5.0 * e2 * e2 - e2.powi(3)) / 6.0;
    let c = (104.0 * e2.powi(3) - 45.0 * e2.powi(4)) / 120.0;
    let d = 1237.0 * e2.powi(4) / 1260.0;

    let beta1 = n / 2.0 - (2.0 / 3.0) * n.powi(2) + (37.0 / 96.0) * n.powi(3) - (1.0 / 360.0) * n.powi(4);
    let beta2 = (1.0 / 48.0) * n.powi(2) + (1.0 / 15.0) * n.powi(3) - (437.0 / 1440.0) * n.powi(4);
    let beta3 = (17.0 / 480.0) * n.powi(3) - (37.0 / 840.0) * n.powi(4);
    let beta4 = (4397.0 / 161280.0) * n.powi(4);

    let lat = lat_deg.to_radians();
    let delta_lon = (lon_deg - proj.central_meridian()).to_radians();

    let lat_star = lat
        - lat.sin() * lat.cos() * (a + b * lat.sin().powi(2) + c * lat.sin().powi(4) + d * lat.sin().powi(6));

    let xi = (lat_star.tan() / delta_lon.cos()).atan();
    let eta = (lat_star.cos() * delta_lon.sin()).atanh();

    let x = proj.scale()
        * a_roof
        * (xi
            + beta1 * (2.0 * xi).sin() * (2.0 * eta).cosh()
            + beta2 * (4.0 * xi).sin() * (4.0 * eta).cosh()
            + beta3 * (6.0 * xi).sin() * (6.0 * eta).cosh()
            + beta4 * (8.0 * xi).sin() * (8.0 * eta).cosh())
        + proj.false_northing();

    let y = proj.scale()
        * a_roof
        * (eta
            + beta1 * (2.0 * xi).cos() * (2.0 * eta).sinh()
            + beta2 * (4.0 * xi).cos() * (4.0 * eta).sinh()
            + beta3 * (6.0 * xi).cos() * (6.0 * eta).sinh()
            + beta4 * (8.0 * xi).cos() * (8.0 * eta).sinh())
        + proj.false_easting();

    (x, y)
}

fn grid_to_geodetic(proj: &dyn Projection, x: f64, y: f64) -> (f64, f64) {
    let f = proj.flattening();
    let e2 = f * (2.0 - f);
    let n = f / (2.0 - f);
    let a_roof = proj.equatorial_radius() / (1.0 + n) * (1.0 + n * n / 4.0 + n.powi(4) / 64.0);

    let delta1 = n / 2.0 - (2.0 / 3.0) * n.powi(2) + (37.0 / 96.0) * n.powi(3) - (1.0 / 360.0) * n.powi(4);
    let delta2 = (1.0 / 48.0) * n.powi(2) + (1.0 / 15.0) * n.powi(3) - (437.0 / 1440.0) * n.powi(4);
    let delta3 = (17.0 / 480.0) * n.powi(3) - (37.0 / 840.0) * n.powi(4);
    let delta4 = (4397.0 / 161280.0) * n.powi(4);

    let xi = (x - proj.false_northing()) / (proj.scale() * a_roof);
    let eta = (y - proj.false_easting()) / (proj.scale() * a_roof);

    let xi_prime = xi
        - delta1 * (2.0 * xi).sin() * (2.0 * eta).cosh()
        - delta2 * (4.0 * xi).sin() * (4.0 * eta).cosh()
        - delta3 * (6.0 * xi).sin() * (6.0 * eta).cosh()
        - delta4 * (8.0 * xi).sin() * (8.0 * eta).cosh();
    let eta_prime = eta
        - delta1 * (2.0 * xi).cos() * (2.0 * eta).sinh()
        - delta2 * (4.0 * xi).cos() * (4.0 * eta).sinh()
        - delta3 * (6.0 * xi).cos() * (6.0 * eta).sinh()
        - delta4 * (8.0 * xi).cos() * (8.0 * eta).sinh();

    let phi_star = (xi_prime.sin() / eta_prime.cosh()).asin();
    let delta_lambda = (eta_prime.sinh() / xi_prime.cos()).atan();

    let lon = proj.central_meridian().to_radians() + delta_lambda;

    let a = e2;
    let b = (5.0 * e2 * e2 - e2.powi(3)) / 6.0;
    let c = (104.0 * e2.powi(3) - 45.0 * e2.powi(4)) / 120.0;
    let d = 1237.0 * e2.powi(4) / 1260.0;

    let lat = phi_star
        + phi_star.sin()
            * phi_star.cos()
            * (a + b * phi_star.sin().powi(2) + c * phi_star.sin().powi(4) + d * phi_star.sin().powi(6));

    (lat.to_degrees(), lon.to_degrees())
}
