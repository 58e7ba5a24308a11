//! Platform-specific directory management
//!
//! Locates the configuration directory, honouring the
//! `FLAKE_MATRIX_CONFIG_DIR` override before platform defaults
//! (`$XDG_CONFIG_HOME/flake-matrix`, `~/Library/Application Support/flake-matrix`).

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "FLAKE_MATRIX_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "flake-matrix";

/// Config file name inside the config directory
const CONFIG_FILE: &str = "config.toml";

/// Directory provider for flake-matrix
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
}

impl AppDirs {
    /// Resolve directories from the environment, then platform defaults
    #[must_use]
    pub fn new() -> Self {
        let config_dir = env::var_os(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::platform_config_dir);
        Self { config_dir }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path of `config.toml`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for AppDirs {
    fn default() -> Self {
        Self::new()
    }
}
