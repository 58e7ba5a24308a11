//! Matrix command implementation
//!
//! Implements `flake-matrix matrix`: run (or replay) `nix-eval-jobs`, build
//! the matrix and publish it through GitHub Actions workflow commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::output::{create_spinner, print_info, print_success};
use crate::core::generate::{generate, publish, RunOutcome};
use crate::core::global_config::GlobalConfig;
use crate::error::MatrixError;
use crate::infra::eval::{load_captured, EvalCommand};
use crate::infra::github::GithubActions;

/// Matrix options
#[derive(Debug, Default)]
pub struct MatrixOptions {
    /// Flake outputs to evaluate
    pub flake_outputs: Vec<String>,
    /// Flake reference override
    pub flake: Option<String>,
    /// Worker count override
    pub workers: Option<usize>,
    /// Evaluation timeout override (seconds)
    pub timeout: Option<u64>,
    /// Replay captured stdout instead of evaluating
    pub stdout_file: Option<PathBuf>,
    /// Replay captured stderr
    pub stderr_file: Option<PathBuf>,
}

/// Execute the matrix command
pub async fn execute(config: &GlobalConfig, options: MatrixOptions) -> Result<()> {
    let output = if let Some(stdout_file) = &options.stdout_file {
        print_info(&format!("Replaying evaluator output from {}", stdout_file.display()));
        load_captured(stdout_file, options.stderr_file.as_deref())?
    } else {
        let mut command = EvalCommand::new(
            options.flake_outputs.clone(),
            options.workers.unwrap_or_else(|| config.workers()).max(1),
        );
        command.flake = options.flake.clone().unwrap_or_else(|| config.flake().to_string());
        command.no_color = config.no_color();
        let timeout = options
            .timeout
            .map(Duration::from_secs)
            .or_else(|| config.eval_timeout());

        tracing::info!(
            "Evaluating {} of {} with {} workers",
            command.outputs.join(", "),
            command.flake,
            command.workers
        );
        let spinner = create_spinner(&format!("Evaluating {}", command.outputs.join(" ")));
        let result = command.run(timeout).await;
        spinner.finish_and_clear();
        result.context("Failed to run nix-eval-jobs")?
    };

    let mut sink = GithubActions::from_env();
    let report = generate(&output, &mut sink)?;

    match publish(&report, &mut sink)? {
        RunOutcome::Success => {
            print_success(&format!(
                "Matrix published with {} jobs ({} units evaluated)",
                report.matrix.job_count(),
                report.build_order.len()
            ));
            Ok(())
        }
        RunOutcome::EvaluationFailed { failed } => {
            Err(MatrixError::EvaluationFailed { count: failed }.into())
        }
    }
}
