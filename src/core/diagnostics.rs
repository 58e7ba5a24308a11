//! Evaluation diagnostics
//!
//! Collapses repeated warnings, groups evaluation errors that share a
//! message and writes both to an [`AnnotationSink`].

use std::collections::HashMap;
use std::fmt;
use std::io;

use crate::core::record::EvalError;

/// Annotation titles
pub mod titles {
    pub const WARNING: &str = "Nix Evaluation Warning";
    pub const ERROR: &str = "Nix Evaluation Error";
    pub const PARSE_WARNING: &str = "JSON Parse Warning";
    pub const PROCESS_FAILURE: &str = "Process Failure";
    pub const MATRIX: &str = "GitHub Actions Matrix";
}

/// Severity of a CI annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Debug,
    Notice,
    Warning,
    Error,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Where annotations and named outputs go
pub trait AnnotationSink {
    /// Report a message with an optional title
    fn report(&mut self, kind: AnnotationKind, message: &str, title: Option<&str>) -> io::Result<()>;

    /// Publish a named output value
    fn emit(&mut self, name: &str, value: &str) -> io::Result<()>;
}

/// A recorded [`AnnotationSink::report`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub message: String,
    pub title: Option<String>,
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub annotations: Vec<Annotation>,
    pub outputs: Vec<(String, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations of one kind, in report order
    pub fn of_kind(&self, kind: AnnotationKind) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.kind == kind).collect()
    }

    /// Value of a named output, if emitted
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl AnnotationSink for RecordingSink {
    fn report(&mut self, kind: AnnotationKind, message: &str, title: Option<&str>) -> io::Result<()> {
        self.annotations.push(Annotation {
            kind,
            message: message.to_string(),
            title: title.map(String::from),
        });
        Ok(())
    }

    fn emit(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.outputs.push((name.to_string(), value.to_string()));
        Ok(())
    }
}

/// Newlines as the `%0A` sequence workflow commands expect
pub fn escape_newlines(message: &str) -> String {
    message.replace('\n', "%0A")
}

/// A distinct warning and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningGroup {
    pub message: String,
    pub count: usize,
}

impl WarningGroup {
    /// `msg` for singletons, `msg (occurred N times)` otherwise
    pub fn render(&self) -> String {
        if self.count > 1 {
            format!("{} (occurred {} times)", self.message, self.count)
        } else {
            self.message.clone()
        }
    }
}

/// Group identical warnings, in order of first occurrence
pub fn group_warnings(warnings: &[String]) -> Vec<WarningGroup> {
    let mut groups: Vec<WarningGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for warning in warnings {
        if let Some(&i) = index.get(warning.as_str()) {
            groups[i].count += 1;
        } else {
            index.insert(warning, groups.len());
            groups.push(WarningGroup {
                message: warning.clone(),
                count: 1,
            });
        }
    }

    groups
}

/// Attributes that failed with the same message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorGroup {
    pub message: String,
    pub attrs: Vec<String>,
}

impl ErrorGroup {
    /// Attribute list, a blank line, then the message; newlines escaped
    pub fn render(&self) -> String {
        let header = match self.attrs.as_slice() {
            [single] => format!("Attribute: {single}"),
            attrs => format!(
                "Affected attributes ({}): {}",
                attrs.len(),
                attrs.join(", ")
            ),
        };
        escape_newlines(&format!("{header}\n\n{}", self.message))
    }
}

/// Group evaluation errors by message, in order of first occurrence
pub fn group_errors(errors: &[EvalError]) -> Vec<ErrorGroup> {
    let mut groups: Vec<ErrorGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for error in errors {
        if let Some(&i) = index.get(error.message.as_str()) {
            groups[i].attrs.push(error.attr.clone());
        } else {
            index.insert(&error.message, groups.len());
            groups.push(ErrorGroup {
                message: error.message.clone(),
                attrs: vec![error.attr.clone()],
            });
        }
    }

    groups
}

/// Everything to report about one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// The evaluator exited unsuccessfully
    pub process_failed: bool,
    /// Undecodable stdout lines
    pub malformed: Vec<String>,
    pub warnings: Vec<WarningGroup>,
    pub errors: Vec<ErrorGroup>,
}

impl Diagnostics {
    /// Aggregate raw warnings and errors
    pub fn new(process_failed: bool, malformed: Vec<String>, warnings: &[String], errors: &[EvalError]) -> Self {
        Self {
            process_failed,
            malformed,
            warnings: group_warnings(warnings),
            errors: group_errors(errors),
        }
    }

    /// Check if any attribute failed to evaluate
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of failed attributes across all groups
    pub fn failed_attr_count(&self) -> usize {
        self.errors.iter().map(|g| g.attrs.len()).sum()
    }

    /// Write every diagnostic to `sink`
    pub fn report(&self, sink: &mut dyn AnnotationSink) -> io::Result<()> {
        self.report_collection(sink)?;
        self.report_evaluation(sink)
    }

    /// Problems with the evaluator run itself: a failed process and
    /// undecodable lines. These are known before any ordering starts.
    pub fn report_collection(&self, sink: &mut dyn AnnotationSink) -> io::Result<()> {
        if self.process_failed {
            sink.report(
                AnnotationKind::Error,
                "nix-eval-jobs process failed with non-zero exit code",
                Some(titles::PROCESS_FAILURE),
            )?;
        }
        for line in &self.malformed {
            sink.report(
                AnnotationKind::Warning,
                &format!("Skipping invalid JSON line: {line}"),
                Some(titles::PARSE_WARNING),
            )?;
        }
        Ok(())
    }

    /// Grouped evaluation warnings, then grouped evaluation errors
    pub fn report_evaluation(&self, sink: &mut dyn AnnotationSink) -> io::Result<()> {
        for group in &self.warnings {
            sink.report(AnnotationKind::Warning, &group.render(), Some(titles::WARNING))?;
        }
        for group in &self.errors {
            sink.report(AnnotationKind::Error, &group.render(), Some(titles::ERROR))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn eval_error(attr: &str, message: &str) -> EvalError {
        EvalError {
            attr: attr.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_repeated_warning_is_counted_once() {
        let rendered: Vec<String> = group_warnings(&strings(&["A", "A", "B"]))
            .iter()
            .map(WarningGroup::render)
            .collect();
        assert_eq!(rendered, vec!["A (occurred 2 times)", "B"]);
    }

    #[test]
    fn test_errors_with_same_message_share_a_report() {
        let groups = group_errors(&[
            eval_error("pkg.a", "build failed"),
            eval_error("pkg.b", "build failed"),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].render(),
            "Affected attributes (2): pkg.a, pkg.b%0A%0Abuild failed"
        );
    }

    #[test]
    fn test_single_error_names_its_attribute() {
        let groups = group_errors(&[eval_error("pkg.a", "error: x\n  at y")]);
        assert_eq!(groups[0].render(), "Attribute: pkg.a%0A%0Aerror: x%0A  at y");
    }

    #[test]
    fn test_distinct_errors_keep_first_occurrence_order() {
        let groups = group_errors(&[
            eval_error("a", "two"),
            eval_error("b", "one"),
            eval_error("c", "two"),
        ]);
        let messages: Vec<_> = groups.iter().map(|g| g.message.as_str()).collect();
        assert_eq!(messages, ["two", "one"]);
        assert_eq!(groups[0].attrs, ["a", "c"]);
    }

    #[test]
    fn test_report_order_and_titles() {
        let diagnostics = Diagnostics::new(
            true,
            strings(&["oops"]),
            &strings(&["w"]),
            &[eval_error("a", "e")],
        );
        let mut sink = RecordingSink::new();
        diagnostics.report(&mut sink).unwrap();

        let reported: Vec<_> = sink
            .annotations
            .iter()
            .map(|a| a.title.as_deref().unwrap())
            .collect();
        assert_eq!(
            reported,
            [
                titles::PROCESS_FAILURE,
                titles::PARSE_WARNING,
                titles::WARNING,
                titles::ERROR
            ]
        );
        assert_eq!(diagnostics.failed_attr_count(), 1);
    }
}
