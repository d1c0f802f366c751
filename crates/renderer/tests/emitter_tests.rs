//! End-to-end tests for per-day artifact emission.

use chrono::{DateTime, TimeZone, Utc};
use forecast_common::{CrsCode, FeatureCollection, ForecastResults, ResultRecord};
use forecast_renderer::{emit, ArtifactStatus, DayOutcome, EmitError, Emitter, ShapefileError};
use std::fs;
use test_utils::{bare_record, days, output_dir, scenario_geometry, scenario_record, urls};

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap()
}

fn results(days: Vec<(&str, ResultRecord)>) -> ForecastResults {
    days.into_iter().collect()
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn test_scenario_day() {
    let dir = output_dir();
    let input = results(vec![(days::SCENARIO, scenario_record())]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.written_files().len(), 3);

    for ext in ["shp", "shx", "dbf", "prj", "cpg", "xml", "html"] {
        assert!(dir.path().join(format!("2024-01-10.{}", ext)).exists(), "missing .{}", ext);
    }

    let xml = fs::read_to_string(dir.path().join("2024-01-10.xml")).unwrap();
    assert!(xml.contains("<Filter><![CDATA[([problem_id] = 10)]]></Filter>"));
    assert!(xml.contains(r##"<PolygonSymbolizer fill="#9B2226""##));

    let html = fs::read_to_string(dir.path().join("2024-01-10.html")).unwrap();
    assert!(html.contains("Wind slab"));
    assert!(html.contains("level-3.svg"));
    assert!(html.contains(urls::SCENARIO));
}

#[test]
fn test_free_function_emit() {
    let dir = output_dir();
    let input = results(vec![(days::SCENARIO, scenario_record())]);

    let report = emit(&input, dir.path()).unwrap();
    assert_eq!(report.days.len(), 1);
    assert!(dir.path().join("2024-01-10.xml").exists());
}

#[test]
fn test_creates_nested_output_directory() {
    let dir = output_dir();
    let nested = dir.path().join("data").join("avalanche-forecast");
    let input = results(vec![(days::SCENARIO, bare_record())]);

    Emitter::new(&nested).emit_at(&input, generated_at()).unwrap();
    assert!(nested.join("2024-01-10.html").exists());
}

// ============================================================================
// Isolation tests
// ============================================================================

#[test]
fn test_missing_forecast_skips_only_that_day() {
    let dir = output_dir();
    let broken = ResultRecord {
        forecast: None,
        ..scenario_record()
    };
    let input = results(vec![(days::SCENARIO, broken), (days::NEXT, scenario_record())]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();

    assert!(matches!(
        report.days[0].outcome,
        DayOutcome::Skipped(EmitError::MissingForecastData { .. })
    ));
    assert!(report.days[1].artifacts().is_some());
    assert!(!report.is_complete());
    assert_eq!(report.failures().len(), 1);

    let produced: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.starts_with(days::SCENARIO))
        .collect();
    assert!(produced.is_empty(), "unexpected files {:?}", produced);
    assert!(dir.path().join("2024-01-11.html").exists());
}

#[test]
fn test_absent_geometry_still_writes_documents() {
    let dir = output_dir();
    let record = ResultRecord {
        geometry: None,
        ..scenario_record()
    };
    let input = results(vec![(days::SCENARIO, record)]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();
    let artifacts = report.days[0].artifacts().unwrap();

    assert!(matches!(artifacts.shapefile, ArtifactStatus::NotProduced));
    assert!(artifacts.legend.is_written());
    assert!(artifacts.style.is_written());
    assert!(report.is_complete());

    assert!(!dir.path().join("2024-01-10.shp").exists());
    let xml = fs::read_to_string(dir.path().join("2024-01-10.xml")).unwrap();
    assert!(xml.contains("./2024-01-10.shp"));
}

#[test]
fn test_shapefile_failure_keeps_documents() {
    let dir = output_dir();
    let mut geometry = scenario_geometry();
    geometry.features[0].geometry = Some(forecast_common::Geometry::Point {
        coordinates: vec![18.9, 69.6],
    });
    let record = ResultRecord {
        geometry: Some(geometry),
        ..scenario_record()
    };
    let input = results(vec![(days::SCENARIO, record), (days::NEXT, scenario_record())]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();
    let artifacts = report.days[0].artifacts().unwrap();

    assert!(matches!(
        artifacts.shapefile,
        ArtifactStatus::Failed(EmitError::ShapeWrite {
            source: ShapefileError::UnsupportedGeometry { .. },
            ..
        })
    ));
    assert!(artifacts.legend.is_written());
    assert!(artifacts.style.is_written());
    assert!(report.days[1].artifacts().unwrap().shapefile.is_written());
}

#[test]
fn test_document_write_failure_is_per_file() {
    let dir = output_dir();
    // A directory where the legend should go makes that one write fail
    fs::create_dir(dir.path().join("2024-01-10.html")).unwrap();
    let input = results(vec![(days::SCENARIO, scenario_record())]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();
    let artifacts = report.days[0].artifacts().unwrap();

    assert!(matches!(
        artifacts.legend,
        ArtifactStatus::Failed(EmitError::DocumentWrite { .. })
    ));
    assert!(artifacts.style.is_written());
    assert!(artifacts.shapefile.is_written());
    assert_eq!(report.failures().len(), 1);
}

#[test]
fn test_path_like_day_is_skipped() {
    let dir = output_dir();
    let out = dir.path().join("out");
    let input = results(vec![
        ("../escaped", scenario_record()),
        ("nested/day", scenario_record()),
        (days::SCENARIO, scenario_record()),
    ]);

    let report = Emitter::new(&out).emit_at(&input, generated_at()).unwrap();

    for skipped in &report.days[..2] {
        assert!(matches!(
            &skipped.outcome,
            DayOutcome::Skipped(EmitError::InvalidDay { day }) if *day == skipped.day
        ));
    }
    assert!(report.days[2].artifacts().unwrap().shapefile.is_written());
    assert_eq!(report.failures().len(), 2);

    assert!(!dir.path().join("escaped.html").exists());
    assert!(!dir.path().join("escaped.shp").exists());
    assert!(!out.join("nested").exists());
    assert!(out.join("2024-01-10.xml").exists());
}

#[test]
fn test_output_directory_failure_aborts() {
    let dir = output_dir();
    let blocker = dir.path().join("taken");
    fs::write(&blocker, b"").unwrap();
    let input = results(vec![(days::SCENARIO, scenario_record())]);

    let err = Emitter::new(&blocker).emit_at(&input, generated_at()).unwrap_err();
    assert!(matches!(err, EmitError::DirectoryCreation { .. }));
}

// ============================================================================
// Ordering, projection and idempotence tests
// ============================================================================

#[test]
fn test_days_reported_in_input_order() {
    let dir = output_dir();
    let input = results(vec![
        (days::NEXT, bare_record()),
        (days::SCENARIO, bare_record()),
        (days::REGION_DAY, bare_record()),
    ]);

    let report = Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();
    let order: Vec<_> = report.days.iter().map(|d| d.day.as_str()).collect();
    assert_eq!(order, vec![days::NEXT, days::SCENARIO, days::REGION_DAY]);
}

#[test]
fn test_utm_geometry_is_reprojected() {
    let dir = output_dir();
    let mut geometry = FeatureCollection::new()
        .with_feature(forecast_common::Feature::new(Some(test_utils::square_polygon(
            653210.089, 7731796.831, 1000.0,
        ))))
        .with_crs(CrsCode::Etrs89Utm(33));
    geometry.features[0] = geometry.features[0]
        .clone()
        .with_property("problem_id", serde_json::json!(10));

    let record = ResultRecord {
        geometry: Some(geometry),
        ..scenario_record()
    };
    let input = results(vec![(days::SCENARIO, record)]);
    Emitter::new(dir.path()).emit_at(&input, generated_at()).unwrap();

    let shp = fs::read(dir.path().join("2024-01-10.shp")).unwrap();
    let min_x = f64::from_le_bytes(shp[36..44].try_into().unwrap());
    let min_y = f64::from_le_bytes(shp[44..52].try_into().unwrap());
    let (ex, ey) = projection::WebMercator.forward(18.95, 69.65).unwrap();
    assert!((min_x - ex).abs() < 500.0, "min_x {} vs {}", min_x, ex);
    assert!((min_y - ey).abs() < 500.0, "min_y {} vs {}", min_y, ey);
}

#[test]
fn test_idempotent_with_fixed_time() {
    let dir = output_dir();
    let input = results(vec![(days::SCENARIO, scenario_record())]);
    let emitter = Emitter::new(dir.path());

    emitter.emit_at(&input, generated_at()).unwrap();
    let first: Vec<_> = ["xml", "html", "shp", "dbf"]
        .iter()
        .map(|ext| fs::read(dir.path().join(format!("2024-01-10.{}", ext))).unwrap())
        .collect();

    emitter.emit_at(&input, generated_at()).unwrap();
    let second: Vec<_> = ["xml", "html", "shp", "dbf"]
        .iter()
        .map(|ext| fs::read(dir.path().join(format!("2024-01-10.{}", ext))).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_only_timestamp_line_changes_between_runs() {
    let dir = output_dir();
    let input = results(vec![(days::SCENARIO, scenario_record())]);
    let emitter = Emitter::new(dir.path());

    emitter.emit_at(&input, generated_at()).unwrap();
    let first = fs::read_to_string(dir.path().join("2024-01-10.html")).unwrap();
    emitter
        .emit_at(&input, Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap())
        .unwrap();
    let second = fs::read_to_string(dir.path().join("2024-01-10.html")).unwrap();

    let differing: Vec<_> = first
        .lines()
        .zip(second.lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(differing.len(), 1);
    assert!(differing[0].0.contains("This layer was updated on"));
}
