//! Coordinate reference system transformations.
//!
//! Implements the handful of map projections forecast geometry arrives in
//! (geographic, UTM) and the Web Mercator target used for map tiles,
//! without external dependencies.

pub mod error;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use error::{ProjectionError, ProjectionResult};
pub use mercator::WebMercator;
pub use transform::{reproject_collection, CoordinateTransform};
pub use transverse_mercator::TransverseMercator;
