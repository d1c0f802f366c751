//! CRS-to-CRS coordinate transforms and whole-collection reprojection.
//!
//! Every supported CRS is related to geographic WGS84, so a transform goes
//! source -> lon/lat -> target. Identical source and target short-circuit.

use forecast_common::{CrsCode, FeatureCollection};
use tracing::debug;

use crate::error::{ProjectionError, ProjectionResult};
use crate::mercator::WebMercator;
use crate::transverse_mercator::TransverseMercator;

/// Projection backing a CRS code.
#[derive(Debug, Clone)]
enum Projection {
    Geographic,
    WebMercator(WebMercator),
    TransverseMercator(TransverseMercator),
}

impl Projection {
    fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator),
            CrsCode::Etrs89Utm(zone) | CrsCode::Wgs84UtmNorth(zone) => {
                Projection::TransverseMercator(TransverseMercator::utm(zone, true))
            }
        }
    }

    fn unproject(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        match self {
            Projection::Geographic => Ok((x, y)),
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::TransverseMercator(p) => p.inverse(x, y),
        }
    }

    fn project(&self, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        match self {
            Projection::Geographic => Ok((lon, lat)),
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::TransverseMercator(p) => p.forward(lon, lat),
        }
    }
}

/// Transform between two supported CRSs.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    pub source: CrsCode,
    pub target: CrsCode,
    source_projection: Projection,
    target_projection: Projection,
}

impl CoordinateTransform {
    pub fn new(source: CrsCode, target: CrsCode) -> Self {
        Self {
            source,
            target,
            source_projection: Projection::for_crs(source),
            target_projection: Projection::for_crs(target),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Transform a single coordinate pair.
    pub fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.source_projection.unproject(x, y)?;
        self.target_projection.project(lon, lat)
    }

    /// Transform a position in place, keeping any z value.
    pub fn transform_position(&self, position: &mut [f64]) -> ProjectionResult<()> {
        if position.len() < 2 {
            return Err(ProjectionError::InvalidPosition(position.len()));
        }
        let (x, y) = self.transform(position[0], position[1])?;
        position[0] = x;
        position[1] = y;
        Ok(())
    }
}

/// Reproject every feature of a collection into `target`.
///
/// The source CRS comes from the collection's `crs` member (EPSG:4326 when
/// absent). The returned collection declares `target`.
pub fn reproject_collection(
    collection: &FeatureCollection,
    target: CrsCode,
) -> ProjectionResult<FeatureCollection> {
    let source = collection.source_crs()?;
    let transform = CoordinateTransform::new(source, target);

    let mut projected = collection.clone();
    if !transform.is_identity() {
        for geometry in projected
            .features
            .iter_mut()
            .filter_map(|f| f.geometry.as_mut())
        {
            for position in geometry.positions_mut() {
                transform.transform_position(position)?;
            }
        }
    }

    debug!(
        source = %source,
        target = %target,
        features = projected.features.len(),
        "Reprojected feature collection"
    );

    Ok(projected.with_crs(target))
}
