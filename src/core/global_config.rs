//! Global configuration management
//!
//! Reads optional settings from `config.toml` in the config directory (or a
//! path given on the command line). Every field is optional; command-line
//! flags take precedence over the file, and the file over built-in defaults.

use crate::config::defaults;
use crate::infra::dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for flake-matrix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Evaluator settings
    #[serde(default)]
    pub eval: EvalConfig,

    /// Packaging scaffold settings
    #[serde(default)]
    pub package: PackageConfig,
}

/// Evaluator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Flake reference to evaluate
    pub flake: Option<String>,

    /// Evaluation worker count
    pub workers: Option<usize>,

    /// Abort the evaluator after this many seconds
    pub timeout_secs: Option<u64>,

    /// Set `NO_COLOR=1` for the evaluator
    pub no_color: Option<bool>,
}

/// Packaging scaffold settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Where the scaffold config is kept
    pub config_file: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load configuration from the config directory
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is
    /// an error.
    pub fn load(dirs: &AppDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Effective flake reference
    #[must_use]
    pub fn flake(&self) -> &str {
        self.eval.flake.as_deref().unwrap_or(defaults::DEFAULT_FLAKE)
    }

    /// Effective worker count; defaults to the number of logical CPUs
    #[must_use]
    pub fn workers(&self) -> usize {
        self.eval.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Evaluator timeout, if any
    #[must_use]
    pub fn eval_timeout(&self) -> Option<Duration> {
        self.eval.timeout_secs.map(Duration::from_secs)
    }

    /// Whether colour is disabled for the evaluator
    #[must_use]
    pub fn no_color(&self) -> bool {
        self.eval.no_color.unwrap_or(true)
    }

    /// Effective scaffold config path
    #[must_use]
    pub fn scaffold_config_file(&self) -> PathBuf {
        self.package
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::SCAFFOLD_CONFIG_FILE))
    }
}
