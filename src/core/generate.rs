//! Matrix generation
//!
//! Runs captured evaluator output through parsing, closure ordering and
//! matrix assembly, then publishes the result and diagnostics to a sink.

use crate::config::defaults;
use crate::core::diagnostics::{escape_newlines, titles, AnnotationKind, AnnotationSink, Diagnostics};
use crate::core::matrix::{assemble, Matrix};
use crate::core::platform::Platform;
use crate::core::record::{parse_stream, parse_warnings};
use crate::core::resolver::sort_by_closure;
use crate::error::MatrixError;

/// Fully buffered output of one evaluator run
#[derive(Debug, Clone, Default)]
pub struct EvalOutput {
    /// Record stream
    pub stdout: String,
    /// Diagnostic channel
    pub stderr: String,
    /// Whether the evaluator exited with status 0
    pub success: bool,
}

/// Matrix plus everything worth reporting about how it was built
#[derive(Debug, Clone)]
pub struct MatrixReport {
    pub matrix: Matrix,
    pub diagnostics: Diagnostics,
    /// Derivation paths of all parsed units in closure order
    pub build_order: Vec<String>,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Matrix published
    Success,
    /// At least one attribute failed to evaluate; nothing published
    EvaluationFailed { failed: usize },
}

/// Build the matrix for one evaluation
///
/// A failed evaluator process and undecodable lines are reported to `sink`
/// first, so they survive a fatal error later on. Cycles among the parsed
/// units and systems without a runner abort the run; evaluation errors are
/// collected into the report instead.
pub fn generate(output: &EvalOutput, sink: &mut dyn AnnotationSink) -> Result<MatrixReport, MatrixError> {
    let parsed = parse_stream(&output.stdout);
    let warnings = parse_warnings(&output.stderr);
    let diagnostics = Diagnostics::new(!output.success, parsed.malformed, &warnings, &parsed.errors);
    diagnostics.report_collection(sink)?;

    let ordered = sort_by_closure(parsed.units)?;
    let matrix = assemble(&ordered, &Platform::ALL)?;
    tracing::info!("Matrix has {} jobs", matrix.job_count());

    Ok(MatrixReport {
        matrix,
        diagnostics,
        build_order: ordered.into_iter().map(|u| u.drv_path).collect(),
    })
}

/// Report evaluation diagnostics and, when evaluation succeeded, the matrix
///
/// Expects the same sink [`generate`] already reported collection problems to.
pub fn publish(report: &MatrixReport, sink: &mut dyn AnnotationSink) -> Result<RunOutcome, MatrixError> {
    report.diagnostics.report_evaluation(sink)?;

    if report.diagnostics.has_errors() {
        return Ok(RunOutcome::EvaluationFailed {
            failed: report.diagnostics.failed_attr_count(),
        });
    }

    let pretty = serde_json::to_string_pretty(&report.matrix)?;
    sink.report(
        AnnotationKind::Notice,
        &escape_newlines(&format!("Generated GitHub Actions matrix: {pretty}")),
        Some(titles::MATRIX),
    )?;
    sink.emit(
        defaults::PACKAGES_OUTPUT,
        &serde_json::to_string(&report.matrix.packages)?,
    )?;
    sink.emit(
        defaults::CHECKS_OUTPUT,
        &serde_json::to_string(&report.matrix.checks)?,
    )?;

    Ok(RunOutcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::RecordingSink;

    fn line(attr: &str, drv: &str, deps: &[&str]) -> String {
        serde_json::json!({
            "attr": attr,
            "drvPath": drv,
            "name": attr.rsplit('.').next().unwrap(),
            "system": "x86_64-linux",
            "cacheStatus": "notBuilt",
            "neededBuilds": deps,
        })
        .to_string()
    }

    #[test]
    fn test_generate_orders_dependencies_first() {
        let stdout = [
            line("packages.x86_64-linux.z", "/z.drv", &["/y.drv"]),
            line("packages.x86_64-linux.y", "/y.drv", &["/x.drv"]),
            line("packages.x86_64-linux.x", "/x.drv", &[]),
        ]
        .join("\n");
        let report = generate(
            &EvalOutput {
                stdout,
                stderr: String::new(),
                success: true,
            },
            &mut RecordingSink::new(),
        )
        .unwrap();
        assert_eq!(report.build_order, ["/x.drv", "/y.drv", "/z.drv"]);
    }

    #[test]
    fn test_cycle_aborts_generation() {
        let stdout = [
            line("packages.x86_64-linux.a", "/a.drv", &["/b.drv"]),
            line("packages.x86_64-linux.b", "/b.drv", &["/a.drv"]),
        ]
        .join("\n");
        let err = generate(
            &EvalOutput {
                stdout,
                stderr: String::new(),
                success: true,
            },
            &mut RecordingSink::new(),
        )
        .unwrap_err();
        assert!(matches!(err, MatrixError::Resolver(_)));
    }

    #[test]
    fn test_process_failure_is_reported_before_a_cycle_aborts() {
        let stdout = [
            "{ truncated".to_string(),
            line("packages.x86_64-linux.a", "/a.drv", &["/b.drv"]),
            line("packages.x86_64-linux.b", "/b.drv", &["/a.drv"]),
        ]
        .join("\n");
        let mut sink = RecordingSink::new();
        let err = generate(
            &EvalOutput {
                stdout,
                stderr: "warning: later\n".to_string(),
                success: false,
            },
            &mut sink,
        )
        .unwrap_err();

        assert!(matches!(err, MatrixError::Resolver(_)));
        let reported: Vec<_> = sink
            .annotations
            .iter()
            .map(|a| a.title.as_deref().unwrap())
            .collect();
        assert_eq!(reported, [titles::PROCESS_FAILURE, titles::PARSE_WARNING]);
    }

    #[test]
    fn test_process_failure_is_reported_before_a_missing_runner_aborts() {
        let stdout = serde_json::json!({
            "attr": "packages.riscv64-linux.odd",
            "drvPath": "/odd.drv",
            "name": "odd",
            "system": "riscv64-linux",
            "cacheStatus": "notBuilt",
        })
        .to_string();
        let mut sink = RecordingSink::new();
        let err = generate(
            &EvalOutput {
                stdout,
                stderr: String::new(),
                success: false,
            },
            &mut sink,
        )
        .unwrap_err();

        assert!(matches!(err, MatrixError::Classify(_)));
        assert_eq!(sink.of_kind(AnnotationKind::Error).len(), 1);
        assert_eq!(
            sink.annotations[0].title.as_deref(),
            Some(titles::PROCESS_FAILURE)
        );
    }

    #[test]
    fn test_publish_emits_outputs_on_success() {
        let mut sink = RecordingSink::new();
        let report = generate(
            &EvalOutput {
                stdout: line("checks.x86_64-linux.fmt", "/fmt.drv", &[]),
                stderr: "warning: dirty tree\n".to_string(),
                success: true,
            },
            &mut sink,
        )
        .unwrap();

        assert_eq!(publish(&report, &mut sink).unwrap(), RunOutcome::Success);
        let checks: serde_json::Value =
            serde_json::from_str(sink.output(defaults::CHECKS_OUTPUT).unwrap()).unwrap();
        assert_eq!(checks["x86_64_linux"]["include"][0]["name"], "fmt");
        assert!(sink.output(defaults::PACKAGES_OUTPUT).is_some());
        assert_eq!(sink.of_kind(AnnotationKind::Notice).len(), 1);
        assert_eq!(sink.of_kind(AnnotationKind::Warning).len(), 1);
    }

    #[test]
    fn test_publish_withholds_matrix_on_eval_error() {
        let stdout = format!(
            "{}\n{}",
            line("packages.x86_64-linux.ok", "/ok.drv", &[]),
            serde_json::json!({"attr": "packages.x86_64-linux.bad", "error": "error: nope"})
        );
        let mut sink = RecordingSink::new();
        let report = generate(
            &EvalOutput {
                stdout,
                stderr: String::new(),
                success: false,
            },
            &mut sink,
        )
        .unwrap();

        assert_eq!(
            publish(&report, &mut sink).unwrap(),
            RunOutcome::EvaluationFailed { failed: 1 }
        );
        assert!(sink.outputs.is_empty());
        assert!(sink.of_kind(AnnotationKind::Notice).is_empty());
        assert_eq!(sink.of_kind(AnnotationKind::Error).len(), 2);
    }
}
