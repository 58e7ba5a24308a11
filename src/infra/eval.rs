//! Evaluator subprocess
//!
//! Builds the `nix-eval-jobs` command line, runs it to completion and hands
//! back its buffered output. Captured output can also be replayed from disk.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::defaults;
use crate::core::generate::EvalOutput;
use crate::error::EvalRunError;

/// A configured `nix-eval-jobs` invocation
#[derive(Debug, Clone)]
pub struct EvalCommand {
    /// Evaluator binary
    pub program: String,
    /// Flake reference
    pub flake: String,
    /// Evaluation worker count
    pub workers: usize,
    /// Flake outputs to evaluate (`packages`, `checks`, ...)
    pub outputs: Vec<String>,
    /// Set `NO_COLOR=1` on the child
    pub no_color: bool,
}

impl EvalCommand {
    /// Command for `outputs` of the flake in the current directory
    pub fn new(outputs: Vec<String>, workers: usize) -> Self {
        Self {
            program: defaults::EVAL_PROGRAM.to_string(),
            flake: defaults::DEFAULT_FLAKE.to_string(),
            workers,
            outputs,
            no_color: true,
        }
    }

    /// Argument list after the program name
    pub fn args(&self) -> Vec<String> {
        let workers = self.workers.to_string();
        let select = format!("outputs: {{ inherit (outputs) {}; }}", self.outputs.join(" "));
        [
            "--flake",
            self.flake.as_str(),
            "--check-cache-status",
            "--force-recurse",
            "--quiet",
            "--option",
            "eval-cache",
            "false",
            "--option",
            "accept-flake-config",
            "true",
            "--workers",
            workers.as_str(),
            "--select",
            select.as_str(),
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    /// Shell-like rendering for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, buffering both streams
    ///
    /// A non-zero exit is not an error here; it is recorded in
    /// [`EvalOutput::success`] so whatever was captured still gets parsed.
    pub async fn run(&self, timeout: Option<Duration>) -> Result<EvalOutput, EvalRunError> {
        tracing::debug!("Running command: {}", self.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.no_color {
            cmd.env("NO_COLOR", "1");
        }

        let child = cmd.output();
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| EvalRunError::Timeout {
                    program: self.program.clone(),
                    seconds: limit.as_secs(),
                })?,
            None => child.await,
        }
        .map_err(|e| EvalRunError::Spawn {
            program: self.program.clone(),
            error: e.to_string(),
        })?;

        if !output.status.success() {
            tracing::warn!("{} exited with {}", self.program, output.status);
        }

        Ok(EvalOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }
}

/// Load previously captured evaluator output
///
/// Replayed output always counts as a successful run.
pub fn load_captured(stdout: &Path, stderr: Option<&Path>) -> Result<EvalOutput, EvalRunError> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|e| EvalRunError::ReadCapture {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    };

    Ok(EvalOutput {
        stdout: read(stdout)?,
        stderr: stderr.map(read).transpose()?.unwrap_or_default(),
        success: true,
    })
}
