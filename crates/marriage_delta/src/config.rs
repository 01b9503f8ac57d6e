//! Application configuration
//!
//! Directory structure:
//! ~/.marriage_delta/
//!   config.yaml          # Engine command, defaults for year and sweep
//!   marriage_delta.log   # Written only with --log-file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use marriage_delta_core::SweepSpec;
use marriage_delta_core::model::Year;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// How to launch the calculation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Bound on each engine response
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default sweep, overridable per `grid` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub count: usize,
    pub min: i64,
    pub max: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let spec = SweepSpec::default();
        Self {
            count: spec.count,
            min: spec.min,
            max: spec.max,
        }
    }
}

impl From<SweepConfig> for SweepSpec {
    fn from(config: SweepConfig) -> Self {
        SweepSpec::new(config.count, config.min, config.max)
    }
}

/// Configuration stored in config.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,
    /// Category catalog replacing the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<PathBuf>,
    pub sweep: SweepConfig,
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Load `config.yaml` from the data directory; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Command-line year, then the configured year, then the current year
    pub fn resolve_year(&self, cli: Option<Year>) -> Year {
        cli.or(self.year).unwrap_or_else(current_year)
    }
}

fn current_year() -> Year {
    jiff::Zoned::now().year()
}

/// Default data directory (~/.marriage_delta/)
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marriage_delta")
}
