//! Per-day forecast result records.
//!
//! A results document maps a day identifier to a [`ResultRecord`]. Records
//! are built by the forecast fetcher and only read by the layer pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ForecastError, ForecastResult};
use crate::geojson::FeatureCollection;
use crate::ordered::OrderedMap;
use crate::palette::color_for_index;

/// Day identifier to result record, in input order.
pub type ForecastResults = OrderedMap<ResultRecord>;

/// Problem id to legend entry, in legend order.
pub type Legend = OrderedMap<LegendEntry>;

/// Everything fetched for one forecast day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    /// Problem polygons in their source CRS.
    #[serde(default, alias = "gdf")]
    pub geometry: Option<FeatureCollection>,

    /// Forecast attributes. A record without them cannot be rendered.
    #[serde(default)]
    pub forecast: Option<Forecast>,

    #[serde(default)]
    pub legend: Option<Legend>,

    /// Link to the forecast page on the publisher's site.
    #[serde(default)]
    pub url: Option<String>,
}

/// Text shown for one avalanche problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LegendEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            description: Some(description.into()),
        }
    }
}

/// A legend entry paired with its palette colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredEntry<'a> {
    pub index: usize,
    pub problem_id: &'a str,
    pub entry: &'a LegendEntry,
    pub color: &'static str,
}

impl OrderedMap<LegendEntry> {
    /// Entries with their positional colours.
    pub fn colored_entries(&self) -> impl Iterator<Item = ColoredEntry<'_>> {
        self.iter()
            .enumerate()
            .map(|(index, (problem_id, entry))| ColoredEntry {
                index,
                problem_id,
                entry,
                color: color_for_index(index),
            })
    }
}

/// Raw forecast attributes as published.
///
/// Only a few attributes drive rendering; the rest are carried so nothing
/// the fetcher produced is lost when records are re-serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Forecast {
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Forecast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// String attribute; `null` and non-string values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_str())
    }

    /// Danger level name, e.g. "3 Considerable". Empty counts as absent.
    pub fn danger_level_name(&self) -> Option<&str> {
        self.text("DangerLevelName").filter(|s| !s.trim().is_empty())
    }

    /// Token naming the danger level icon: the first word of the level name.
    pub fn danger_level_token(&self) -> &str {
        self.danger_level_name()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("0")
    }

    pub fn main_text(&self) -> Option<&str> {
        self.text("MainText")
    }

    pub fn publish_time(&self) -> Option<&str> {
        self.text("PublishTime")
    }

    pub fn valid_from(&self) -> Option<&str> {
        self.text("ValidFrom")
    }
}

impl OrderedMap<ResultRecord> {
    /// Parse a results document (a JSON object keyed by day).
    pub fn from_json(json: &str) -> ForecastResult<ForecastResults> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a results document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> ForecastResult<ForecastResults> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ForecastError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}
