//! Geographic coordinates and their projection onto the globe.
//!
//! The globe is Y-up. Longitude is offset by 180° so that the projected
//! points line up with an equirectangular texture whose U origin sits on the
//! antimeridian.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
///
/// Values outside [-90, 90] and [-180, 180] are not rejected; they project to
/// a well-defined (if geographically meaningless) point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Projects this coordinate onto a sphere. See [`project`].
    pub fn project(self, radius: f64, altitude: f64) -> DVec3 {
        project(self.latitude, self.longitude, radius, altitude)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Errors from parsing a `lat,lon` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoParseError {
    /// The input did not contain exactly two comma-separated parts.
    WrongComponentCount { found: usize },
    /// A component was not a finite number.
    InvalidNumber {
        component: &'static str,
        value: String,
    },
}

impl fmt::Display for GeoParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongComponentCount { found } => {
                write!(f, "expected LAT,LON but found {found} component(s)")
            }
            Self::InvalidNumber { component, value } => {
                write!(f, "invalid {component}: '{value}'")
            }
        }
    }
}

impl std::error::Error for GeoParseError {}

impl FromStr for GeoCoordinate {
    type Err = GeoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [lat, lon] = parts.as_slice() else {
            return Err(GeoParseError::WrongComponentCount { found: parts.len() });
        };

        let parse = |component: &'static str, value: &str| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| GeoParseError::InvalidNumber {
                    component,
                    value: value.to_string(),
                })
        };

        Ok(Self::new(parse("latitude", *lat)?, parse("longitude", *lon)?))
    }
}

/// Projects a latitude/longitude (degrees) onto a sphere of `radius`, raised
/// by `altitude` along the surface normal.
///
/// Pure; callers that need the result every frame should memoise it
/// themselves (see [`AnchorCache`]).
pub fn project(lat_deg: f64, lon_deg: f64, radius: f64, altitude: f64) -> DVec3 {
    let r = radius + altitude;
    // Polar angle from +Y, azimuth offset to the texture seam.
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lon_deg + 180.0).to_radians();
    DVec3::new(
        -r * phi.sin() * theta.cos(),
        r * phi.cos(),
        r * phi.sin() * theta.sin(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnchorKey {
    coordinate: GeoCoordinate,
    radius: f64,
    altitude: f64,
}

/// Memoised anchor position, recomputed only when one of its four inputs
/// changes.
#[derive(Debug, Clone, Default)]
pub struct AnchorCache {
    key: Option<AnchorKey>,
    position: DVec3,
}

impl AnchorCache {
    /// Returns the projected anchor, recomputing it if any input differs from
    /// the previous call.
    pub fn resolve(&mut self, coordinate: GeoCoordinate, radius: f64, altitude: f64) -> DVec3 {
        let key = AnchorKey {
            coordinate,
            radius,
            altitude,
        };
        if self.key != Some(key) {
            self.position = coordinate.project(radius, altitude);
            self.key = Some(key);
        }
        self.position
    }

    /// Forgets the cached position.
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_equator_lies_on_sphere() {
        let p = project(0.0, 0.0, 3.0, 0.0);
        assert!((p.length() - 3.0).abs() < EPS);
        // lon 0 sits at theta = 180°, i.e. +X.
        assert!((p - DVec3::new(3.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_north_pole_ignores_longitude() {
        for lon in [-180.0, -90.0, 0.0, 45.0, 179.9] {
            let p = project(90.0, lon, 2.0, 0.0);
            assert!((p - DVec3::new(0.0, 2.0, 0.0)).length() < EPS, "lon {lon}: {p}");
        }
    }

    #[test]
    fn test_altitude_extends_radius() {
        let surface = project(35.0, 139.0, 2.0, 0.0);
        let raised = project(35.0, 139.0, 2.0, 0.5);
        assert!((raised.length() - 2.5).abs() < EPS);
        assert!(surface.normalize().dot(raised.normalize()) > 1.0 - EPS);
    }

    #[test]
    fn test_chichen_itza_fixture() {
        let p = project(20.6843, -88.5678, 2.0, 0.015);
        let expected = DVec3::new(0.047_116_564_571_991_14, 0.711_735_284_013_898, 1.884_525_912_486_371_1);
        assert!((p - expected).length() < 1e-12, "{p}");
    }

    #[test]
    fn test_out_of_range_latitude_is_well_defined() {
        let p = project(120.0, 10.0, 1.0, 0.0);
        assert!(p.is_finite());
        assert!((p.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_anchor_cache_recomputes_on_change() {
        let mut cache = AnchorCache::default();
        let coord = GeoCoordinate::new(10.0, 20.0);
        let a = cache.resolve(coord, 2.0, 0.0);
        assert_eq!(a, coord.project(2.0, 0.0));

        let b = cache.resolve(coord, 2.0, 0.1);
        assert!((b.length() - 2.1).abs() < EPS);

        let c = cache.resolve(GeoCoordinate::new(-10.0, 20.0), 2.0, 0.1);
        assert!(c.y < 0.0);
    }

    #[test]
    fn test_parse_coordinate() {
        let c: GeoCoordinate = "20.6843, -88.5678".parse().unwrap();
        assert_eq!(c, GeoCoordinate::new(20.6843, -88.5678));

        assert_eq!(
            "1,2,3".parse::<GeoCoordinate>(),
            Err(GeoParseError::WrongComponentCount { found: 3 })
        );
        assert!(matches!(
            "north,2".parse::<GeoCoordinate>(),
            Err(GeoParseError::InvalidNumber {
                component: "latitude",
                ..
            })
        ));
        assert!("1,NaN".parse::<GeoCoordinate>().is_err());
    }
}
