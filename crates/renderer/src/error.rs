//! Error types for artifact generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while emitting a day's artifacts.
///
/// Only `DirectoryCreation` aborts an emission run; the others are recorded
/// against the day or file they belong to.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Failed to create output directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Day identifier {day:?} cannot be used as a file name")]
    InvalidDay { day: String },

    #[error("Missing forecast data for {day}")]
    MissingForecastData { day: String },

    #[error("Failed to write shapefile for {day}: {source}")]
    ShapeWrite {
        day: String,
        #[source]
        source: ShapefileError,
    },

    #[error("Failed to write {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while encoding or writing a shapefile.
#[derive(Debug, Error)]
pub enum ShapefileError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reprojection failed: {0}")]
    Projection(#[from] projection::ProjectionError),

    #[error("Feature {feature} has unsupported geometry type {kind}")]
    UnsupportedGeometry { feature: usize, kind: &'static str },

    #[error("Feature {feature} has a position with {len} coordinates")]
    InvalidPosition { feature: usize, len: usize },

    #[error("Too many attribute fields: {0}")]
    TooManyFields(usize),
}
