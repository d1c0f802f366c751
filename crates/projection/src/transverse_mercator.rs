//! Transverse Mercator projection (UTM).
//!
//! Norwegian forecast regions are frequently delivered in ETRS89 / UTM
//! zone 32, 33 or 35. This implements the ellipsoidal series from Snyder,
//! "Map Projections: A Working Manual" (USGS PP 1395), pp. 60-64, which is
//! accurate to well under a millimeter within a UTM zone.
//!
//! ETRS89 (GRS80) and WGS84 ellipsoids differ by 0.1 mm in the semi-minor
//! axis, so both share the WGS84 constants here.

use crate::error::{ProjectionError, ProjectionResult};

/// WGS84 semi-major axis (meters)
const SEMI_MAJOR_AXIS: f64 = 6378137.0;
/// WGS84 flattening
const FLATTENING: f64 = 1.0 / 298.257223563;
/// UTM scale factor on the central meridian
const UTM_SCALE_FACTOR: f64 = 0.9996;
/// UTM false easting (meters)
const UTM_FALSE_EASTING: f64 = 500000.0;
/// UTM false northing for the southern hemisphere (meters)
const UTM_FALSE_NORTHING_SOUTH: f64 = 10000000.0;

#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    a: f64,
    e2: f64,
    ep2: f64,
}

impl TransverseMercator {
    /// UTM zone projection (zones 1-60).
    pub fn utm(zone: u8, north: bool) -> Self {
        let central_meridian = zone as f64 * 6.0 - 183.0;
        let e2 = FLATTENING * (2.0 - FLATTENING);

        Self {
            lon0: central_meridian.to_radians(),
            k0: UTM_SCALE_FACTOR,
            false_easting: UTM_FALSE_EASTING,
            false_northing: if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH },
            a: SEMI_MAJOR_AXIS,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Meridional arc length from the equator to latitude `phi` (radians).
    fn meridional_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Geographic (lon/lat degrees) to easting/northing meters.
    pub fn forward(&self, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 90.0 {
            return Err(ProjectionError::OutOfDomain { x: lon, y: lat });
        }

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = (lon.to_radians() - self.lon0) * cos_phi;
        let m = self.meridional_arc(phi);

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a.powi(5) / 120.0);
        let y = self.k0
            * (m + n
                * tan_phi
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a.powi(6)
                        / 720.0));

        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// Easting/northing meters to geographic (lon/lat degrees).
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::OutOfDomain { x, y });
        }

        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let x = x - self.false_easting;
        let m = (y - self.false_northing) / self.k0;

        // Footpoint latitude
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let w = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / w.sqrt();
        let r1 = self.a * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * self.k0);

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lambda = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        Ok((lambda.to_degrees(), phi.to_degrees()))
    }
}
