//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod doctor;
pub mod matrix;
pub mod package;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;

use crate::core::global_config::GlobalConfig;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate flake outputs and publish the build matrix
    Matrix {
        /// Flake outputs to evaluate (e.g. packages checks)
        #[arg(required = true)]
        flake_outputs: Vec<String>,

        /// Flake reference to evaluate
        #[arg(long)]
        flake: Option<String>,

        /// Number of evaluation workers (defaults to CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Abort evaluation after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Read evaluator stdout from a file instead of running nix-eval-jobs
        #[arg(long, value_name = "FILE")]
        stdout_file: Option<PathBuf>,

        /// Read evaluator stderr from a file (with --stdout-file)
        #[arg(long, value_name = "FILE", requires = "stdout_file")]
        stderr_file: Option<PathBuf>,
    },

    /// Packaging scaffolds
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },

    /// Check system dependencies
    Doctor,
}

/// Package subcommands
#[derive(Subcommand, Debug)]
pub enum PackageCommands {
    /// Scaffold a Go service package
    Go {
        /// Package name
        #[arg(long)]
        name: Option<String>,

        /// One-line description
        #[arg(long)]
        description: Option<String>,

        /// GitHub URL (github.com/owner/repo)
        #[arg(long)]
        url: Option<String>,

        /// Git tag or commit to package
        #[arg(long = "ref", value_name = "REF")]
        git_ref: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, config: &GlobalConfig, config_path: &Path) -> Result<()> {
        match self {
            Self::Matrix {
                flake_outputs,
                flake,
                workers,
                timeout,
                stdout_file,
                stderr_file,
            } => {
                let options = matrix::MatrixOptions {
                    flake_outputs,
                    flake,
                    workers,
                    timeout,
                    stdout_file,
                    stderr_file,
                };
                matrix::execute(config, options).await
            }
            Self::Package { command } => match command {
                PackageCommands::Go {
                    name,
                    description,
                    url,
                    git_ref,
                    yes,
                } => {
                    let current_dir = std::env::current_dir()?;
                    let options = package::GoOptions {
                        name,
                        description,
                        url,
                        git_ref,
                        yes,
                    };
                    package::execute_go(&current_dir, config, options).await
                }
            },
            Self::Doctor => doctor::execute(config_path).await,
        }
    }
}
