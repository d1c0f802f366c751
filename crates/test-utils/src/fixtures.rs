//! Common test fixtures for forecast layer tests.
//!
//! This module provides pre-defined records that represent the common
//! shapes a forecast day arrives in.

use forecast_common::{
    CrsCode, Feature, FeatureCollection, Forecast, Legend, LegendEntry, ResultRecord,
};
use serde_json::json;

use crate::generators::square_polygon;

/// Day identifiers used across tests.
pub mod days {
    pub const SCENARIO: &str = "2024-01-10";
    pub const NEXT: &str = "2024-01-11";
    pub const REGION_DAY: &str = "3003_2024-01-12";
}

/// Links to forecast pages.
pub mod urls {
    pub const SCENARIO: &str = "https://varsom.no/x";
}

/// Common forecast timestamps as published.
pub mod time {
    /// Publish time with fractional seconds and no offset
    pub const PUBLISH_TIME: &str = "2024-01-09T15:52:37.35";
    pub const PUBLISH_TIME_MINUTES: &str = "2024-01-09 15:52";

    pub const VALID_FROM: &str = "2024-01-10T00:00:00";
    pub const VALID_FROM_DAY: &str = "2024-01-10";
}

/// Forecast attributes with every rendered field present.
pub fn scenario_forecast() -> Forecast {
    Forecast::new()
        .with("DangerLevelName", "3 Considerable")
        .with("MainText", "Wind loading")
        .with("PublishTime", time::PUBLISH_TIME)
        .with("ValidFrom", time::VALID_FROM)
}

/// One wind slab problem keyed "10".
pub fn scenario_legend() -> Legend {
    let mut legend = Legend::new();
    legend.insert("10", LegendEntry::new("Wind slab", "Upper elevations"));
    legend
}

/// One polygon near Tromsø tagged `problem_id = 10`, in WGS84.
pub fn scenario_geometry() -> FeatureCollection {
    FeatureCollection::new()
        .with_crs(CrsCode::Epsg4326)
        .with_feature(
            Feature::new(Some(square_polygon(18.9, 69.6, 0.2)))
                .with_property("problem_id", json!(10))
                .with_property("name", json!("Tromsø")),
        )
}

/// The reference day: danger level 3, one wind slab problem, one polygon.
pub fn scenario_record() -> ResultRecord {
    ResultRecord {
        geometry: Some(scenario_geometry()),
        forecast: Some(scenario_forecast()),
        legend: Some(scenario_legend()),
        url: Some(urls::SCENARIO.to_string()),
    }
}

/// A record carrying nothing but an empty forecast.
pub fn bare_record() -> ResultRecord {
    ResultRecord {
        forecast: Some(Forecast::new()),
        ..ResultRecord::default()
    }
}
