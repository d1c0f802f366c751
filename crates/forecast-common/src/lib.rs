//! Common types shared across the avalanche forecast layer crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod geojson;
pub mod ordered;
pub mod palette;
pub mod record;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use error::{ForecastError, ForecastResult};
pub use geojson::{Feature, FeatureCollection, Geometry, Position};
pub use ordered::OrderedMap;
pub use palette::{color_for_index, COLORS};
pub use record::{ColoredEntry, Forecast, ForecastResults, Legend, LegendEntry, ResultRecord};
pub use time::{Timestamp, TimestampParseError};
