//! Layer emitter configuration.
//!
//! Settings are resolved in three layers, later ones winning:
//! environment variables (with defaults), an optional YAML file, and
//! command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use forecast_renderer::DEFAULT_OUTPUT_DIR;

pub const RESULTS_VAR: &str = "FORECAST_RESULTS";
pub const OUTPUT_DIR_VAR: &str = "FORECAST_OUTPUT_DIR";
pub const RELOAD_TRIGGER_VAR: &str = "FORECAST_RELOAD_TRIGGER";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolved emitter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// JSON results document to render
    pub results_path: Option<PathBuf>,

    /// Directory the layer files are written to
    pub output_dir: PathBuf,

    /// File touched after emission so the tile server reloads
    pub reload_trigger: Option<PathBuf>,

    pub log_level: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            results_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            reload_trigger: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// YAML configuration file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub results_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub reload_trigger: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub results_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub reload_trigger: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl EmitterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from a variable lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            results_path: get(RESULTS_VAR).map(PathBuf::from),
            output_dir: get(OUTPUT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            reload_trigger: get(RELOAD_TRIGGER_VAR).map(PathBuf::from),
            log_level: get(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
        }
    }

    /// Overlay settings from a YAML file.
    pub fn merge_yaml_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        self.merge_yaml(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn merge_yaml(self, yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping
        let file: ConfigFile = if yaml.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        Ok(self.merge(file))
    }

    pub fn merge(self, file: ConfigFile) -> Self {
        Self {
            results_path: file.results_path.or(self.results_path),
            output_dir: file.output_dir.unwrap_or(self.output_dir),
            reload_trigger: file.reload_trigger.or(self.reload_trigger),
            log_level: file.log_level.unwrap_or(self.log_level),
        }
    }

    /// Apply command-line values.
    pub fn with_overrides(self, overrides: Overrides) -> Self {
        self.merge(ConfigFile {
            results_path: overrides.results_path,
            output_dir: overrides.output_dir,
            reload_trigger: overrides.reload_trigger,
            log_level: overrides.log_level,
        })
    }
}
