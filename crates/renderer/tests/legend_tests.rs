//! Tests for HTML legend generation.

use chrono::{DateTime, TimeZone, Utc};
use forecast_common::{color_for_index, Forecast, LegendEntry, ResultRecord};
use forecast_renderer::{build_legend, build_legend_at, build_style, LayerDocuments};
use test_utils::{bare_record, days, generate_legend, scenario_record, time, urls};

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 5, 45, 12).unwrap()
}

/// Swatch colours in document order.
fn swatch_colors(html: &str) -> Vec<String> {
    html.split(r#"class="legend-item""#)
        .skip(1)
        .map(|item| {
            let start = item.find("background-color: ").unwrap() + "background-color: ".len();
            let end = start + item[start..].find(';').unwrap();
            item[start..end].to_string()
        })
        .collect()
}

/// Rule fills in document order.
fn rule_fills(xml: &str) -> Vec<String> {
    xml.split("<PolygonSymbolizer fill=\"")
        .skip(1)
        .map(|rest| rest[..rest.find('"').unwrap()].to_string())
        .collect()
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn test_scenario_legend() {
    let html = build_legend_at(&scenario_record(), generated_at()).unwrap();

    assert!(html.contains("Wind slab"));
    assert!(html.contains("Upper elevations"));
    assert!(html.contains("AvalancheDangerLevels/level-3.svg"));
    assert!(html.contains("Danger level 3 Considerable"));
    assert!(html.contains("Wind loading"));
    assert!(html.contains(&format!(r#"href="{}""#, urls::SCENARIO)));
    assert_eq!(swatch_colors(&html), vec!["#9B2226"]);
}

#[test]
fn test_scenario_timestamps() {
    let html = build_legend_at(&scenario_record(), generated_at()).unwrap();

    assert!(html.contains("<strong>2024-01-10 05:45 UTC</strong>"));
    assert!(html.contains(&format!("<strong>{} UTC</strong>", time::PUBLISH_TIME_MINUTES)));
    assert!(html.contains(&format!("valid for the <strong>{}</strong>", time::VALID_FROM_DAY)));
}

// ============================================================================
// Fallback tests
// ============================================================================

#[test]
fn test_bare_record_fallbacks() {
    let html = build_legend_at(&bare_record(), generated_at()).unwrap();

    assert!(html.contains("level-0.svg"));
    assert!(html.contains("Danger level Not Rated / NA"));
    assert!(html.contains("<p>NA</p>"));
    assert!(html.contains("on the <strong>NA</strong>"));
    assert!(html.contains("valid for the <strong>NA</strong>"));
    assert!(html.contains(r##"href="#""##));
    assert!(swatch_colors(&html).is_empty());
}

#[test]
fn test_invalid_timestamps_fall_back() {
    let record = ResultRecord {
        forecast: Some(
            Forecast::new()
                .with("PublishTime", "not a time")
                .with("ValidFrom", serde_json::Value::Null),
        ),
        ..Default::default()
    };
    let html = build_legend_at(&record, generated_at()).unwrap();

    assert!(html.contains("on the <strong>NA</strong>"));
    assert!(html.contains("valid for the <strong>NA</strong>"));
}

#[test]
fn test_offset_publish_time_converted_to_utc() {
    let record = ResultRecord {
        forecast: Some(Forecast::new().with("PublishTime", "2024-01-09T16:52:00+01:00")),
        ..Default::default()
    };
    let html = build_legend_at(&record, generated_at()).unwrap();
    assert!(html.contains("<strong>2024-01-09 15:52 UTC</strong>"));
}

#[test]
fn test_entry_fallbacks() {
    let mut record = bare_record();
    let mut legend = forecast_common::Legend::new();
    legend.insert("1", LegendEntry::default());
    record.legend = Some(legend);

    let html = build_legend_at(&record, generated_at()).unwrap();
    assert_eq!(html.matches("Unknown").count(), 2);
}

#[test]
fn test_missing_forecast_builds_nothing() {
    let record = ResultRecord {
        forecast: None,
        ..scenario_record()
    };
    assert!(build_legend(&record).is_none());
}

// ============================================================================
// Style/legend agreement tests
// ============================================================================

#[test]
fn test_swatches_match_rules() {
    for count in [0, 1, 8, 9, 17] {
        let record = ResultRecord {
            legend: Some(generate_legend(count)),
            ..bare_record()
        };
        let docs = LayerDocuments::from_record(days::SCENARIO, &record, generated_at()).unwrap();

        let swatches = swatch_colors(&docs.legend);
        let fills = rule_fills(&docs.style);
        assert_eq!(swatches.len(), count);
        assert_eq!(fills, swatches);
        for (i, color) in swatches.iter().enumerate() {
            assert_eq!(color, color_for_index(i));
        }
    }
}

#[test]
fn test_documents_match_standalone_builders() {
    let record = scenario_record();
    let docs = LayerDocuments::from_record(days::SCENARIO, &record, generated_at()).unwrap();

    assert_eq!(docs.entries, 1);
    assert_eq!(docs.style, build_style(days::SCENARIO, record.legend.as_ref()));
    assert_eq!(Some(docs.legend), build_legend_at(&record, generated_at()));
}

#[test]
fn test_markup_in_text_is_escaped() {
    let record = ResultRecord {
        forecast: Some(Forecast::new().with("MainText", "Snow < 20 cm & wind")),
        url: Some("https://varsom.no/?a=1&b=\"2\"".to_string()),
        ..Default::default()
    };
    let html = build_legend_at(&record, generated_at()).unwrap();

    assert!(html.contains("Snow &lt; 20 cm &amp; wind"));
    assert!(html.contains(r#"href="https://varsom.no/?a=1&amp;b=&quot;2&quot;""#));
}
