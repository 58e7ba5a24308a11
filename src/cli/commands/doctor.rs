//! CLI command for `flake-matrix doctor`
//!
//! Checks the external nix tools and the configuration file.

use std::path::Path;

use anyhow::Result;

use crate::cli::output::{is_json, is_quiet, print_detail, print_info, print_success, print_warning, status};
use crate::core::doctor::{run_doctor, DoctorReport};

fn json_report(report: &DoctorReport) -> serde_json::Value {
    let overall = if report.all_passed() {
        "success"
    } else if report.failed_required().is_empty() {
        "warning"
    } else {
        "error"
    };
    serde_json::json!({
        "status": overall,
        "checks": report.checks.iter().map(|c| serde_json::json!({
            "name": c.name,
            "passed": c.passed,
            "required": c.required,
            "version": c.version,
            "error": c.error,
            "suggestion": c.suggestion
        })).collect::<Vec<_>>(),
        "config_issues": report.config_issues,
        "passed_count": report.passed_count(),
        "total_count": report.checks.len()
    })
}

/// Execute the doctor command
pub async fn execute(config_path: &Path) -> Result<()> {
    let report = run_doctor(config_path);
    let missing = || anyhow::anyhow!("Missing required dependencies");

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&json_report(&report))?);
        if !report.failed_required().is_empty() {
            return Err(missing());
        }
        return Ok(());
    }

    if is_quiet() {
        let failed_required = report.failed_required();
        if failed_required.is_empty() {
            return Ok(());
        }
        for check in failed_required {
            eprintln!("{} Missing required: {}", status::ERROR, check.name);
        }
        return Err(missing());
    }

    print_info("Checking system dependencies...");
    for check in &report.checks {
        let version = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();
        let optional = if check.required { "" } else { " [optional]" };

        if check.passed {
            eprintln!("  {} {}{version}{optional}", status::SUCCESS, check.name);
        } else {
            eprintln!("  {} {}{optional}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    if !report.config_issues.is_empty() {
        print_warning(&format!("Configuration issues in {}:", config_path.display()));
        for issue in &report.config_issues {
            print_detail(&format!("• {issue}"));
        }
    }

    let passed = report.passed_count();
    let total = report.checks.len();
    let failed_required = report.failed_required();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
    } else if failed_required.is_empty() {
        print_warning(&format!(
            "{passed}/{total} checks passed (optional dependencies missing)"
        ));
        print_detail("Matrix generation will work; `package go` may not.");
    } else {
        eprintln!("{} {passed}/{total} checks passed", status::ERROR);
        return Err(anyhow::anyhow!(
            "Missing required dependencies. Run 'flake-matrix doctor' for details."
        ));
    }

    Ok(())
}
