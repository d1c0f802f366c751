//! Style and legend documents built together.

use chrono::{DateTime, Utc};
use forecast_common::{Forecast, ResultRecord};

use crate::legend::LegendDocumentBuilder;
use crate::mapnik::StyleDocumentBuilder;

/// The two text documents of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDocuments {
    /// Mapnik style (`{day}.xml`)
    pub style: String,
    /// HTML legend (`{day}.html`)
    pub legend: String,
    /// Number of problems coloured in both documents.
    pub entries: usize,
}

impl LayerDocuments {
    /// Build both documents from a single pass over the record's legend, so
    /// each style rule and its swatch take the same colour.
    pub fn build(
        day: &str,
        forecast: &Forecast,
        record: &ResultRecord,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut style = StyleDocumentBuilder::new(day);
        let mut legend = LegendDocumentBuilder::new(forecast, generated_at);

        if let Some(entries) = &record.legend {
            for entry in entries.colored_entries() {
                style.push_rule(entry.problem_id, entry.color);
                legend.push_entry(entry.entry, entry.color);
            }
        }

        let entries = style.rule_count();
        debug_assert_eq!(entries, legend.entry_count());

        Self {
            style: style.finish(),
            legend: legend.finish(record.url.as_deref()),
            entries,
        }
    }

    /// Build from a record, or `None` when it has no forecast.
    pub fn from_record(day: &str, record: &ResultRecord, generated_at: DateTime<Utc>) -> Option<Self> {
        record
            .forecast
            .as_ref()
            .map(|forecast| Self::build(day, forecast, record, generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_style, legend::build_legend_at};
    use chrono::TimeZone;
    use forecast_common::{Legend, LegendEntry};

    #[test]
    fn test_matches_single_document_builders() {
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        let mut legend = Legend::new();
        legend.insert("10", LegendEntry::new("Wind slab", "Upper elevations"));
        legend.insert("wet", LegendEntry::new("Wet snow", "All elevations"));

        let record = ResultRecord {
            forecast: Some(Forecast::new().with("DangerLevelName", "2 Moderate")),
            legend: Some(legend),
            url: Some("https://varsom.no/x".to_string()),
            ..Default::default()
        };

        let docs = LayerDocuments::from_record("2024-01-10", &record, generated_at).unwrap();
        assert_eq!(docs.entries, 2);
        assert_eq!(docs.style, build_style("2024-01-10", record.legend.as_ref()));
        assert_eq!(
            Some(docs.legend),
            build_legend_at(&record, generated_at)
        );
    }

    #[test]
    fn test_missing_forecast() {
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        assert!(LayerDocuments::from_record("d", &ResultRecord::default(), generated_at).is_none());
    }
}
