//! Planar projections for station coordinates
//!
//! Pure-Rust WGS84 → planar transforms (Snyder 1987, USGS Prof. Paper 1395).
//! Supported targets:
//! - EPSG 32601–32660: WGS84 / UTM north
//! - EPSG 32701–32760: WGS84 / UTM south
//! - EPSG 26901–26923: NAD83 / UTM north (GRS80 ellipsoid)
//! - EPSG 3857: Web Mercator
//!
//! The caller picks the projection. A UTM zone far from the stations still
//! projects, but distances get distorted; nothing here checks that.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// NAD83 / UTM zone 17N, used when the caller does not pick a projection.
pub const DEFAULT_EPSG: u32 = 26917;

const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Reference ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major axis (m)
    pub semi_major: f64,
    /// Inverse flattening
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    /// Eccentricity squared
    #[inline]
    pub fn e2(&self) -> f64 {
        let f = 1.0 / self.inverse_flattening;
        2.0 * f - f * f
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Method {
    Utm {
        zone: u32,
        north: bool,
        ellipsoid: Ellipsoid,
    },
    WebMercator,
}

/// A resolved planar projection.
///
/// Built once from an EPSG identifier and passed by reference into the
/// reprojection step; it carries no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    epsg: u32,
    method: Method,
}

impl Projection {
    /// Resolve an EPSG code into a projection.
    ///
    /// Fails with [`Error::InvalidProjection`] for geographic or unsupported codes.
    pub fn from_epsg(code: u32) -> Result<Self> {
        let method = if let Some((zone, north)) = parse_utm_epsg(code) {
            Method::Utm {
                zone,
                north,
                ellipsoid: Ellipsoid::WGS84,
            }
        } else if (26901..=26923).contains(&code) {
            Method::Utm {
                zone: code - 26900,
                north: true,
                ellipsoid: Ellipsoid::GRS80,
            }
        } else if code == 3857 {
            Method::WebMercator
        } else if code == 4326 {
            return Err(Error::InvalidProjection {
                id: format!("EPSG:{}", code),
                reason: "geographic CRS, distances would not be planar".into(),
            });
        } else {
            return Err(Error::InvalidProjection {
                id: format!("EPSG:{}", code),
                reason: "unsupported EPSG code".into(),
            });
        };

        Ok(Self { epsg: code, method })
    }

    /// EPSG code this projection was built from
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// UTM zone and hemisphere, if this is a UTM projection
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        match self.method {
            Method::Utm { zone, north, .. } => Some((zone, north)),
            Method::WebMercator => None,
        }
    }

    /// Project WGS84 (longitude, latitude) in degrees to planar (x, y) in metres.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        match self.method {
            Method::Utm {
                zone,
                north,
                ellipsoid,
            } => transverse_mercator(lon_deg, lat_deg, zone, north, &ellipsoid),
            Method::WebMercator => web_mercator(lon_deg, lat_deg),
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            epsg: DEFAULT_EPSG,
            method: Method::Utm {
                zone: DEFAULT_EPSG - 26900,
                north: true,
                ellipsoid: Ellipsoid::GRS80,
            },
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Projection {
    type Err = Error;

    /// Accepts `"26917"`, `"EPSG:26917"` or `"epsg:26917"`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code.trim(),
            Some(_) => {
                return Err(Error::InvalidProjection {
                    id: s.to_string(),
                    reason: "only EPSG identifiers are supported".into(),
                })
            }
            None => trimmed,
        };

        let code: u32 = digits.parse().map_err(|_| Error::InvalidProjection {
            id: s.to_string(),
            reason: "malformed EPSG code".into(),
        })?;

        Self::from_epsg(code)
    }
}

/// Parse a WGS84 UTM EPSG code into `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

// ── Core projections (Snyder 1987, pp. 61-64) ───────────────────────────

fn transverse_mercator(
    lon_deg: f64,
    lat_deg: f64,
    zone: u32,
    north: bool,
    ellipsoid: &Ellipsoid,
) -> (f64, f64) {
    let a = ellipsoid.semi_major;
    let e2 = ellipsoid.e2();
    let e_prime2 = e2 / (1.0 - e2);

    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    // Central meridian of the zone
    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = e_prime2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    let m = meridional_arc(lat, a, e2);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * e_prime2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * e_prime2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// Meridional arc from equator to latitude `lat` (radians). Snyder eq. 3-21.
fn meridional_arc(lat: f64, a: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Spherical Web Mercator. Latitudes near the poles blow up; callers with
/// polar stations should use UTM.
fn web_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let r = Ellipsoid::WGS84.semi_major;
    let x = r * lon_deg.to_radians();
    let y = r * (std::f64::consts::FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln();
    (x, y)
}
