//! Common test utilities and helpers
//!
//! Shared helpers for integration tests: a temporary working directory,
//! evaluator record builders and a runner for the compiled binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;
use tempfile::TempDir;

/// Test project context
///
/// A temporary directory holding captured evaluator output, the step output
/// file and (for packaging tests) the scaffold config.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A store path unique to `name`
pub fn drv(name: &str) -> String {
    format!("/nix/store/{:0>32}-{name}.drv", name.len())
}

/// Record line for a not-built unit under `<group>.<system>.<name>`
pub fn unit_line(group: &str, system: &str, name: &str, needs: &[&str]) -> String {
    json!({
        "attr": format!("{group}.{system}.{name}"),
        "attrPath": [group, system, name],
        "drvPath": drv(name),
        "name": name,
        "system": system,
        "cacheStatus": "notBuilt",
        "neededBuilds": needs.iter().map(|n| drv(n)).collect::<Vec<_>>(),
        "neededSubstitutes": [],
        "requiredSystemFeatures": [],
    })
    .to_string()
}

/// Record line for a unit that is already cached
pub fn cached_line(group: &str, system: &str, name: &str) -> String {
    json!({
        "attr": format!("{group}.{system}.{name}"),
        "attrPath": [group, system, name],
        "drvPath": drv(name),
        "name": name,
        "system": system,
        "cacheStatus": "cached",
    })
    .to_string()
}

/// Record line for an attribute that failed to evaluate
pub fn error_line(attr: &str, error: &str) -> String {
    json!({ "attr": attr, "attrPath": attr.split('.').collect::<Vec<_>>(), "error": error })
        .to_string()
}

/// Join record lines into a stdout capture
pub fn stream(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Run the compiled binary in `dir` with an isolated config directory
pub fn run_cli(dir: &Path, args: &[&str], envs: &[(&str, &Path)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flake-matrix"));
    cmd.current_dir(dir)
        .env("FLAKE_MATRIX_CONFIG_DIR", dir.join("config"))
        .env_remove("FLAKE_MATRIX_CONFIG")
        .env_remove("GITHUB_OUTPUT")
        .env_remove("RUST_LOG")
        .args(args);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute flake-matrix")
}
