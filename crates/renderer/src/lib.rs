//! Artifact generation for avalanche forecast map layers.
//!
//! For every forecast day this crate produces:
//! - A Web Mercator shapefile of the problem polygons
//! - A Mapnik style document colouring each problem
//! - An HTML legend describing the danger level and problems
//!
//! Style rules and legend swatches are built in one pass over the legend so
//! each problem gets the same colour in both documents.

pub mod dbf;
pub mod documents;
pub mod emitter;
pub mod error;
pub mod legend;
pub mod mapnik;
mod markup;
pub mod shapefile;

pub use documents::LayerDocuments;
pub use emitter::{
    emit, ArtifactStatus, DayArtifacts, DayOutcome, DayReport, EmissionReport, Emitter,
    DEFAULT_OUTPUT_DIR, TARGET_CRS,
};
pub use error::{EmitError, ShapefileError};
pub use legend::{build_legend, build_legend_at, LegendDocumentBuilder};
pub use mapnik::{build_style, StyleDocumentBuilder};
pub use shapefile::{write_shapefile, ShapefileSummary};
