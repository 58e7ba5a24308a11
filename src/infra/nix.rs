//! Nix command wrappers for the packaging scaffold

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::config::defaults;
use crate::error::ScaffoldError;

/// Run `program args` to completion with captured output and a time limit
pub async fn run_captured(program: &str, args: &[&str], timeout_secs: u64) -> Result<Output, ScaffoldError> {
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!("Running {command}");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    tokio::time::timeout(Duration::from_secs(timeout_secs), child)
        .await
        .map_err(|_| ScaffoldError::CommandTimeout {
            command: command.clone(),
            seconds: timeout_secs,
        })?
        .map_err(|e| ScaffoldError::CommandFailed {
            command,
            stderr: e.to_string(),
        })
}

fn checked(program: &str, output: Output) -> Result<String, ScaffoldError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(ScaffoldError::CommandFailed {
            command: program.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Prefetch and unpack `url`, returning its SRI sha256 hash
pub async fn prefetch_source(url: &str) -> Result<String, ScaffoldError> {
    let output = run_captured(
        "nix-prefetch-url",
        &["--unpack", "--type", "sha256", url],
        defaults::PREFETCH_TIMEOUT,
    )
    .await?;
    let stdout = checked("nix-prefetch-url", output)?;
    let nix_hash = stdout.trim().lines().last().unwrap_or_default().trim().to_string();

    let output = run_captured(
        "nix",
        &["hash", "convert", "--to", "sri", "--hash-algo", "sha256", &nix_hash],
        defaults::HASH_CONVERT_TIMEOUT,
    )
    .await?;
    Ok(checked("nix hash convert", output)?.trim().to_string())
}

/// `nix build <attr> --no-link` with captured output
pub async fn build_captured(flake_attr: &str) -> Result<Output, ScaffoldError> {
    run_captured(
        "nix",
        &["build", flake_attr, "--no-link"],
        defaults::NIX_BUILD_TIMEOUT,
    )
    .await
}

/// `nix build <attr> --no-link` streaming to the terminal; true on success
pub async fn build_streaming(flake_attr: &str) -> Result<bool, ScaffoldError> {
    let command = format!("nix build {flake_attr} --no-link");
    let child = Command::new("nix")
        .args(["build", flake_attr, "--no-link"])
        .kill_on_drop(true)
        .status();

    let status = tokio::time::timeout(Duration::from_secs(defaults::NIX_BUILD_TIMEOUT), child)
        .await
        .map_err(|_| ScaffoldError::CommandTimeout {
            command: command.clone(),
            seconds: defaults::NIX_BUILD_TIMEOUT,
        })?
        .map_err(|e| ScaffoldError::CommandFailed {
            command,
            stderr: e.to_string(),
        })?;

    Ok(status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captured_reports_missing_program() {
        let err = run_captured("definitely-not-a-real-nix", &["--version"], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_checked_surfaces_stderr() {
        use std::os::unix::process::ExitStatusExt;
        let output = Output {
            status: std::process::ExitStatus::from_raw(256),
            stdout: Vec::new(),
            stderr: b"  boom \n".to_vec(),
        };
        match checked("nix", output) {
            Err(ScaffoldError::CommandFailed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
