//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::AppDirs;
use commands::Commands;

/// Version plus build provenance recorded by `build.rs`
fn long_version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        format!(
            "{}\ncommit: {}\nbuilt: {}\ntarget: {}",
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
            option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
            option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown"),
        )
    })
}

/// flake-matrix - build matrices from nix-eval-jobs
///
/// Evaluates flake outputs, orders not-yet-built derivations by their
/// closures and publishes a per-platform GitHub Actions matrix.
#[derive(Parser, Debug)]
#[command(name = "flake-matrix")]
#[command(author, version, about, long_about = None, long_version = long_version())]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to config.toml in the config directory)
    #[arg(long, global = true, env = "FLAKE_MATRIX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config file path in effect
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppDirs::new().config_path())
    }

    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config_path = self.config_path();
        let Some(cmd) = self.command else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let config = GlobalConfig::load_from_path(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        cmd.run(&config, &config_path).await
    }
}
