//! Spherical (Web) Mercator projection, EPSG:3857.
//!
//! Coordinates are meters on a sphere with the WGS84 semi-major axis.
//! Latitudes beyond the square-world limit are clamped so the poles map to
//! the edge of the tile pyramid instead of infinity.

use std::f64::consts::PI;

use crate::error::{ProjectionError, ProjectionResult};

/// Sphere radius used by Web Mercator (meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the projected world becomes square.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Half the projected world width (meters).
pub const MAX_EXTENT: f64 = 20037508.342789244;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Geographic (lon/lat degrees) to Web Mercator meters.
    pub fn forward(&self, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }

        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    /// Web Mercator meters to geographic (lon/lat degrees).
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }

        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Ok((lon, lat))
    }
}
