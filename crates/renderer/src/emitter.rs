//! Per-day artifact emission.
//!
//! For each day of a results document the emitter writes `{day}.shp` (with
//! sidecars), `{day}.html` and `{day}.xml` into the output directory.
//! Failures are contained at the narrowest scope: a failed file does not
//! stop the other files of its day, and a bad day does not stop the run.
//! Only failing to create the output directory aborts emission.

use chrono::{DateTime, Utc};
use forecast_common::{CrsCode, ForecastResults, ResultRecord};
use std::path::{Component, Path, PathBuf};
use tracing::{error, info, info_span, warn};

use crate::documents::LayerDocuments;
use crate::error::{EmitError, ShapefileError};
use crate::shapefile::write_shapefile;

pub const DEFAULT_OUTPUT_DIR: &str = "./data/avalanche-forecast/";

/// CRS every shapefile is written in.
pub const TARGET_CRS: CrsCode = CrsCode::Epsg3857;

/// Result of one artifact.
#[derive(Debug)]
pub enum ArtifactStatus {
    Written(PathBuf),
    /// Nothing to write (no geometry for the day).
    NotProduced,
    Failed(EmitError),
}

impl ArtifactStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactStatus::Written(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactStatus::Written(path) => Some(path),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EmitError> {
        match self {
            ArtifactStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Status of the three artifacts of a processed day.
#[derive(Debug)]
pub struct DayArtifacts {
    pub shapefile: ArtifactStatus,
    pub legend: ArtifactStatus,
    pub style: ArtifactStatus,
}

impl DayArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactStatus> {
        [&self.shapefile, &self.legend, &self.style].into_iter()
    }
}

#[derive(Debug)]
pub enum DayOutcome {
    /// The day could not be processed at all.
    Skipped(EmitError),
    Processed(DayArtifacts),
}

#[derive(Debug)]
pub struct DayReport {
    pub day: String,
    pub outcome: DayOutcome,
}

impl DayReport {
    pub fn artifacts(&self) -> Option<&DayArtifacts> {
        match &self.outcome {
            DayOutcome::Processed(artifacts) => Some(artifacts),
            DayOutcome::Skipped(_) => None,
        }
    }
}

/// Outcome of one emission run, one report per day in input order.
#[derive(Debug)]
pub struct EmissionReport {
    pub output_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<DayReport>,
}

impl EmissionReport {
    /// Paths of every main file written (`.shp`, `.html`, `.xml`).
    pub fn written_files(&self) -> Vec<&Path> {
        self.days
            .iter()
            .filter_map(DayReport::artifacts)
            .flat_map(DayArtifacts::iter)
            .filter_map(ArtifactStatus::path)
            .collect()
    }

    /// Every error recorded, with the day it belongs to.
    pub fn failures(&self) -> Vec<(&str, &EmitError)> {
        let mut failures = Vec::new();
        for report in &self.days {
            match &report.outcome {
                DayOutcome::Skipped(e) => failures.push((report.day.as_str(), e)),
                DayOutcome::Processed(artifacts) => failures.extend(
                    artifacts
                        .iter()
                        .filter_map(ArtifactStatus::error)
                        .map(|e| (report.day.as_str(), e)),
                ),
            }
        }
        failures
    }

    /// True when no day was skipped and no file failed.
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn day(&self, day: &str) -> Option<&DayReport> {
        self.days.iter().find(|r| r.day == day)
    }
}

/// Writes forecast layer artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct Emitter {
    output_dir: PathBuf,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl Emitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Emit every day, stamping documents with the current time.
    pub fn emit(&self, results: &ForecastResults) -> Result<EmissionReport, EmitError> {
        self.emit_at(results, Utc::now())
    }

    /// Emit every day with a fixed "updated on" time.
    pub fn emit_at(
        &self,
        results: &ForecastResults,
        generated_at: DateTime<Utc>,
    ) -> Result<EmissionReport, EmitError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| {
            error!(
                path = %self.output_dir.display(),
                error = %source,
                "Failed to create output directory"
            );
            EmitError::DirectoryCreation {
                path: self.output_dir.clone(),
                source,
            }
        })?;
        info!(path = %self.output_dir.display(), "Output directory ready");

        let days = results
            .iter()
            .map(|(day, record)| {
                let _span = info_span!("day", day = %day).entered();
                DayReport {
                    day: day.to_string(),
                    outcome: self.emit_day(day, record, generated_at),
                }
            })
            .collect();

        Ok(EmissionReport {
            output_dir: self.output_dir.clone(),
            generated_at,
            days,
        })
    }

    fn emit_day(&self, day: &str, record: &ResultRecord, generated_at: DateTime<Utc>) -> DayOutcome {
        if !is_file_stem(day) {
            error!(day = ?day, "Day identifier is not a plain file name, skipping day");
            return DayOutcome::Skipped(EmitError::InvalidDay {
                day: day.to_string(),
            });
        }

        let Some(forecast) = record.forecast.as_ref() else {
            error!(day = %day, "Missing forecast data, skipping day");
            return DayOutcome::Skipped(EmitError::MissingForecastData {
                day: day.to_string(),
            });
        };

        let shapefile = self.write_geometry(day, record, generated_at);

        let documents = LayerDocuments::build(day, forecast, record, generated_at);
        let legend = self.write_document(&format!("{}.html", day), &documents.legend);
        let style = self.write_document(&format!("{}.xml", day), &documents.style);

        DayOutcome::Processed(DayArtifacts {
            shapefile,
            legend,
            style,
        })
    }

    fn write_geometry(
        &self,
        day: &str,
        record: &ResultRecord,
        generated_at: DateTime<Utc>,
    ) -> ArtifactStatus {
        let Some(geometry) = record.geometry.as_ref() else {
            warn!(day = %day, "No geometry, shapefile not produced");
            return ArtifactStatus::NotProduced;
        };

        let written = projection::reproject_collection(geometry, TARGET_CRS)
            .map_err(ShapefileError::from)
            .and_then(|projected| {
                write_shapefile(
                    self.output_dir.join(day),
                    &projected,
                    generated_at.date_naive(),
                )
            });

        match written {
            Ok(summary) => ArtifactStatus::Written(summary.path),
            Err(source) => {
                error!(day = %day, error = %source, "Failed to write shapefile");
                ArtifactStatus::Failed(EmitError::ShapeWrite {
                    day: day.to_string(),
                    source,
                })
            }
        }
    }

    fn write_document(&self, file_name: &str, contents: &str) -> ArtifactStatus {
        let path = self.output_dir.join(file_name);
        match std::fs::write(&path, contents) {
            Ok(()) => {
                info!(path = %path.display(), "Wrote document");
                ArtifactStatus::Written(path)
            }
            Err(source) => {
                error!(path = %path.display(), error = %source, "Failed to write document");
                ArtifactStatus::Failed(EmitError::DocumentWrite { path, source })
            }
        }
    }
}

/// True when `day` names a single file inside the output directory.
fn is_file_stem(day: &str) -> bool {
    if day.contains(&['/', '\\', '\0'][..]) {
        return false;
    }
    let mut components = Path::new(day).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Emit `results` into `output_dir`.
pub fn emit(
    results: &ForecastResults,
    output_dir: impl Into<PathBuf>,
) -> Result<EmissionReport, EmitError> {
    Emitter::new(output_dir).emit(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use forecast_common::Forecast;

    #[test]
    fn test_report_helpers() {
        let report = EmissionReport {
            output_dir: PathBuf::from("/out"),
            generated_at: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            days: vec![
                DayReport {
                    day: "a".to_string(),
                    outcome: DayOutcome::Skipped(EmitError::MissingForecastData {
                        day: "a".to_string(),
                    }),
                },
                DayReport {
                    day: "b".to_string(),
                    outcome: DayOutcome::Processed(DayArtifacts {
                        shapefile: ArtifactStatus::NotProduced,
                        legend: ArtifactStatus::Written(PathBuf::from("/out/b.html")),
                        style: ArtifactStatus::Written(PathBuf::from("/out/b.xml")),
                    }),
                },
            ],
        };

        assert_eq!(
            report.written_files(),
            vec![Path::new("/out/b.html"), Path::new("/out/b.xml")]
        );
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "a");
        assert!(!report.is_complete());
    }

    #[test]
    fn test_is_file_stem() {
        assert!(is_file_stem("2024-01-10"));
        assert!(is_file_stem("3003_2024-01-12"));
        assert!(is_file_stem("..x"));

        for day in ["", ".", "..", "../x", "a/b", "/etc/x", "a\\b", "a\0b"] {
            assert!(!is_file_stem(day), "accepted {:?}", day);
        }
    }

    #[test]
    fn test_directory_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let mut results = ForecastResults::new();
        results.insert(
            "2024-01-10",
            ResultRecord {
                forecast: Some(Forecast::new()),
                ..Default::default()
            },
        );

        let err = Emitter::new(blocker.join("sub")).emit(&results).unwrap_err();
        assert!(matches!(err, EmitError::DirectoryCreation { .. }));
    }
}
