//! Doctor command logic
//!
//! Checks that the external nix tools flake-matrix shells out to are
//! installed, and that the configuration file parses.

use std::path::Path;

use crate::core::global_config::GlobalConfig;

/// Result of a single dependency check
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Add a configuration issue
    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Version of `command` if it is on `PATH` and answers `--version`
pub fn check_command_available(command: &str) -> Option<String> {
    which::which(command).ok()?;
    std::process::Command::new(command)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            extract_version(&format!("{stdout}{stderr}")).or_else(|| Some(String::from("unknown")))
        })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    let version_regex = regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:pre\w*|-\w+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn check_tool(command: &str, label: &str, suggestion: &str, required: bool) -> CheckResult {
    match check_command_available(command) {
        Some(version) => CheckResult::pass(label, Some(version), required),
        None => CheckResult::fail(
            label,
            &format!("{command} not found in PATH"),
            Some(suggestion),
            required,
        ),
    }
}

/// Check the evaluator used for matrix generation
pub fn check_eval_jobs() -> CheckResult {
    check_tool(
        "nix-eval-jobs",
        "nix-eval-jobs",
        "Install with `nix profile install nixpkgs#nix-eval-jobs`",
        true,
    )
}

/// Check the nix CLI (hash conversion and builds)
pub fn check_nix() -> CheckResult {
    check_tool(
        "nix",
        "Nix",
        "Install Nix from https://nixos.org/download/",
        true,
    )
}

/// Check `nix-prefetch-url` (optional, used by `package go`)
pub fn check_prefetch() -> CheckResult {
    check_tool(
        "nix-prefetch-url",
        "nix-prefetch-url (packaging)",
        "Ships with Nix; only needed for `flake-matrix package go`",
        false,
    )
}

/// Check that the config file, if any, parses
pub fn check_config(config_path: &Path) -> Vec<String> {
    match GlobalConfig::load_from_path(config_path) {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    }
}

/// Run all checks
pub fn run_doctor(config_path: &Path) -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_eval_jobs());
    report.add_check(check_nix());
    report.add_check(check_prefetch());

    for issue in check_config(config_path) {
        report.add_config_issue(issue);
    }

    report
}
