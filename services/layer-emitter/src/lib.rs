//! Avalanche forecast layer emitter.
//!
//! Loads a results document, writes each day's shapefile, style and legend,
//! then touches the tile server's reload trigger.

pub mod config;
pub mod trigger;

use anyhow::{bail, Context, Result};
use forecast_common::ForecastResults;
use forecast_renderer::{EmissionReport, Emitter};
use tracing::{error, info, warn};

pub use config::{ConfigFile, EmitterConfig, Overrides};

/// Load the configured results document, keeping only `days` when given.
pub fn load_results(config: &EmitterConfig, days: &[String]) -> Result<ForecastResults> {
    let Some(path) = config.results_path.as_ref() else {
        bail!(
            "No results document configured (set {} or pass --results)",
            config::RESULTS_VAR
        );
    };

    let mut results = ForecastResults::from_file(path)
        .with_context(|| format!("Failed to load results from {:?}", path))?;
    info!(path = %path.display(), days = results.len(), "Loaded results document");

    if !days.is_empty() {
        results.retain_keys(|day| days.iter().any(|d| d == day));
        for missing in days.iter().filter(|d| results.get(d).is_none()) {
            warn!(day = %missing, "Requested day not in results document");
        }
    }

    Ok(results)
}

/// Emit every loaded day and signal the tile server.
///
/// Fails only when results cannot be loaded or the output directory cannot
/// be created; per-day problems are logged and left in the report.
pub fn run(config: &EmitterConfig, days: &[String]) -> Result<EmissionReport> {
    let results = load_results(config, days)?;

    let report = Emitter::new(&config.output_dir).emit(&results)?;

    if let Some(trigger) = &config.reload_trigger {
        if let Err(e) = trigger::touch(trigger) {
            error!(path = %trigger.display(), error = %e, "Failed to touch reload trigger");
        }
    }

    let failures = report.failures();
    for (day, e) in &failures {
        warn!(day = %day, error = %e, "Day not fully emitted");
    }
    info!(
        days = report.days.len(),
        files = report.written_files().len(),
        failures = failures.len(),
        output_dir = %report.output_dir.display(),
        "Emission complete"
    );

    Ok(report)
}
