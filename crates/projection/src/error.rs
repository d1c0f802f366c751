//! Projection errors.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(#[from] forecast_common::CrsParseError),

    #[error("Coordinate out of projection domain: ({x}, {y})")]
    OutOfDomain { x: f64, y: f64 },

    #[error("Position needs at least 2 coordinates, got {0}")]
    InvalidPosition(usize),
}
