//! HTML legend documents.
//!
//! The legend is an HTML fragment with inline styles, embedded by the map
//! client next to the layer: the danger level block, one swatch per
//! avalanche problem in style-rule order, and a footer stating when the
//! layer was built and which forecast it reflects.

use chrono::{DateTime, Utc};
use forecast_common::palette::FILL_OPACITY;
use forecast_common::{Forecast, LegendEntry, ResultRecord, Timestamp};

use crate::markup::escape;

pub const DANGER_ICON_BASE: &str = "https://www.varsom.no/Content/Images/AvalancheDangerLevels";

pub const NOT_RATED: &str = "Not Rated / NA";
pub const NOT_AVAILABLE: &str = "NA";
pub const UNKNOWN: &str = "Unknown";
pub const MISSING_URL: &str = "#";

const SWATCH_BORDER: &str = "#998100";
const UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M";
const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const VALID_FORMAT: &str = "%Y-%m-%d";

/// Incrementally builds the legend for one day.
#[derive(Debug, Clone)]
pub struct LegendDocumentBuilder {
    html: String,
    generated_at: DateTime<Utc>,
    publish_time: Timestamp,
    valid_from: Timestamp,
    entries: usize,
}

impl LegendDocumentBuilder {
    /// Start a legend with the danger level block for `forecast`.
    pub fn new(forecast: &Forecast, generated_at: DateTime<Utc>) -> Self {
        let mut html = String::new();

        html.push_str(&format!(
            r#"<div class="avalanche-legend">
  <div class="danger-level">
    <img src="{}/level-{}.svg" alt="Danger level icon">
    <p>Danger level {}</p>
    <p>{}</p>
  </div>
"#,
            DANGER_ICON_BASE,
            escape(forecast.danger_level_token()),
            escape(forecast.danger_level_name().unwrap_or(NOT_RATED)),
            escape(forecast.main_text().unwrap_or(NOT_AVAILABLE)),
        ));

        Self {
            html,
            generated_at,
            publish_time: Timestamp::parse(forecast.publish_time()),
            valid_from: Timestamp::parse(forecast.valid_from()),
            entries: 0,
        }
    }

    /// Add a swatch block for one legend entry.
    pub fn push_entry(&mut self, entry: &LegendEntry, color: &str) {
        self.html.push_str(&format!(
            r#"  <div class="legend-item" style="display: flex; align-items: flex-start; gap: 0.75rem">
    <div style="width: 1.25rem; height: 1.25rem; flex-shrink: 0; background-color: {}; opacity: {}; border: 1px solid {}; border-radius: 2px"></div>
    <span style="font-size: 0.875rem">{}</span>
    <p>{}</p>
  </div>
"#,
            escape(color),
            FILL_OPACITY,
            SWATCH_BORDER,
            escape(entry.label.as_deref().unwrap_or(UNKNOWN)),
            escape(entry.description.as_deref().unwrap_or(UNKNOWN)),
        ));
        self.entries += 1;
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Append the footer and link to `url`, and return the document.
    pub fn finish(mut self, url: Option<&str>) -> String {
        self.html.push_str(&format!(
            r#"  <div style="font-size: 0.875rem; color: #6b7280; padding-top: 1rem; padding-bottom: 1rem">
    This layer was updated on <strong>{} UTC</strong> based on the avalanche forecast published by <strong>Varsom.no</strong> and the <strong>Norwegian Meteorological Institute</strong> on the <strong>{}</strong>. It is valid for the <strong>{}</strong>
  </div>
  <a href="{}" target="_blank" rel="noopener noreferrer" style="font-size: 0.75rem; color: #3b82f6; text-decoration: none">View on Varsom &rarr;</a>
</div>
"#,
            self.generated_at.format(UPDATED_FORMAT),
            self.publish_time.format_or(PUBLISHED_FORMAT, NOT_AVAILABLE),
            self.valid_from.format_or(VALID_FORMAT, NOT_AVAILABLE),
            escape(url.unwrap_or(MISSING_URL)),
        ));

        self.html
    }
}

/// Build the legend for a record on its own, stamped with the current time.
///
/// Returns `None` when the record has no forecast.
pub fn build_legend(record: &ResultRecord) -> Option<String> {
    build_legend_at(record, Utc::now())
}

/// As [`build_legend`], with a fixed "updated on" time.
pub fn build_legend_at(record: &ResultRecord, generated_at: DateTime<Utc>) -> Option<String> {
    let forecast = record.forecast.as_ref()?;

    let mut builder = LegendDocumentBuilder::new(forecast, generated_at);
    if let Some(legend) = &record.legend {
        for entry in legend.colored_entries() {
            builder.push_entry(entry.entry, entry.color);
        }
    }
    Some(builder.finish(record.url.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 6, 30, 0).unwrap()
    }

    #[test]
    fn test_danger_block() {
        let forecast = Forecast::new()
            .with("DangerLevelName", "3 Considerable")
            .with("MainText", "Wind loading");
        let html = LegendDocumentBuilder::new(&forecast, generated_at()).finish(None);

        assert!(html.contains("/level-3.svg"));
        assert!(html.contains("<p>Danger level 3 Considerable</p>"));
        assert!(html.contains("<p>Wind loading</p>"));
    }

    #[test]
    fn test_fallbacks() {
        let html = LegendDocumentBuilder::new(&Forecast::new(), generated_at()).finish(None);

        assert!(html.contains("/level-0.svg"));
        assert!(html.contains("<p>Danger level Not Rated / NA</p>"));
        assert!(html.contains("<p>NA</p>"));
        assert!(html.contains("on the <strong>NA</strong>"));
        assert!(html.contains("valid for the <strong>NA</strong>"));
        assert!(html.contains(r##"href="#""##));
    }

    #[test]
    fn test_footer_timestamps() {
        let forecast = Forecast::new()
            .with("PublishTime", "2024-01-09T15:52:37.35")
            .with("ValidFrom", "2024-01-10T00:00:00");
        let html =
            LegendDocumentBuilder::new(&forecast, generated_at()).finish(Some("https://varsom.no/x"));

        assert!(html.contains("<strong>2024-01-10 06:30 UTC</strong>"));
        assert!(html.contains("<strong>2024-01-09 15:52 UTC</strong>"));
        assert!(html.contains("valid for the <strong>2024-01-10</strong>"));
        assert!(html.contains(r#"href="https://varsom.no/x""#));
    }

    #[test]
    fn test_unparsable_time_falls_back() {
        let forecast = Forecast::new().with("PublishTime", "yesterday");
        let html = LegendDocumentBuilder::new(&forecast, generated_at()).finish(None);
        assert!(html.contains("on the <strong>NA</strong>"));
    }

    #[test]
    fn test_entry_text_is_escaped() {
        let mut builder = LegendDocumentBuilder::new(&Forecast::new(), generated_at());
        builder.push_entry(
            &LegendEntry {
                label: Some("<b>Slab</b>".to_string()),
                description: None,
            },
            "#9B2226",
        );
        assert_eq!(builder.entry_count(), 1);

        let html = builder.finish(None);
        assert!(html.contains("&lt;b&gt;Slab&lt;/b&gt;"));
        assert!(html.contains("<p>Unknown</p>"));
        assert!(html.contains("background-color: #9B2226; opacity: 0.5"));
    }

    #[test]
    fn test_build_legend_requires_forecast() {
        assert!(build_legend(&ResultRecord::default()).is_none());
    }
}
