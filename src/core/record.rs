//! Evaluator record parsing
//!
//! Decodes the line-oriented JSON stream written by `nix-eval-jobs` into
//! [`BuildUnit`]s and [`EvalError`]s, dropping duplicates and units excluded
//! by policy. Warnings from the diagnostic channel are collected separately
//! by [`parse_warnings`].

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::defaults;
use crate::error::RecordError;

/// Whether a derivation's outputs already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheStatus {
    /// Must be built
    NotBuilt,
    /// Available from a binary cache
    Cached,
    /// Already in the local store
    Local,
    /// Any status this tool does not know about
    #[serde(other)]
    Unknown,
}

/// One successfully evaluated derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    /// Dotted attribute (`packages.x86_64-linux.foo`)
    pub attr: String,
    /// Attribute path segments
    pub attr_path: Vec<String>,
    /// Store path of the derivation; unique per unit
    pub drv_path: String,
    /// Display name
    pub name: String,
    /// Nix system string
    pub system: String,
    pub cache_status: Option<CacheStatus>,
    /// Derivations that must be built first
    pub needed_builds: Vec<String>,
    /// Derivations that must be substituted first
    pub needed_substitutes: Vec<String>,
    pub required_system_features: Vec<String>,
}

impl BuildUnit {
    /// Attribute path segments, falling back to splitting `attr` on dots
    pub fn segments(&self) -> Vec<&str> {
        if self.attr_path.is_empty() {
            self.attr.split('.').collect()
        } else {
            self.attr_path.iter().map(String::as_str).collect()
        }
    }

    /// True when the unit has to be built by CI
    pub fn is_not_built(&self) -> bool {
        self.cache_status == Some(CacheStatus::NotBuilt)
    }

    /// Every declared predecessor, builds and substitutes alike
    pub fn predecessors(&self) -> impl Iterator<Item = &str> {
        self.needed_builds
            .iter()
            .chain(&self.needed_substitutes)
            .map(String::as_str)
    }
}

/// An attribute whose evaluation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    /// Dotted attribute that failed
    pub attr: String,
    /// Normalized error text (may span lines)
    pub message: String,
}

/// Classification of a single stream line before deduplication
#[derive(Debug)]
pub enum LineRecord {
    /// Empty or whitespace-only
    Blank,
    /// Could not be decoded; skipped with a warning
    Malformed(RecordError),
    /// The evaluator reported an error for this attribute
    Failed(EvalError),
    /// A decoded unit
    Unit(BuildUnit),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default)]
    attr: String,
    #[serde(default)]
    attr_path: Vec<String>,
    drv_path: Option<String>,
    name: Option<String>,
    system: Option<String>,
    cache_status: Option<CacheStatus>,
    #[serde(default)]
    needed_builds: Vec<String>,
    #[serde(default)]
    needed_substitutes: Vec<String>,
    #[serde(default)]
    required_system_features: Vec<String>,
    /// Any value under `error`, `null` included, marks a failed attribute
    #[serde(default, deserialize_with = "present")]
    error: Option<serde_json::Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl RawRecord {
    fn into_line_record(self) -> Result<LineRecord, RecordError> {
        if let Some(error) = self.error {
            let message = match error {
                serde_json::Value::String(text) => core_error_message(&text),
                other => other.to_string(),
            };
            return Ok(LineRecord::Failed(EvalError {
                message,
                attr: self.attr,
            }));
        }

        let attr = self.attr;
        let missing = |field| RecordError::MissingField {
            attr: attr.clone(),
            field,
        };
        let drv_path = self.drv_path.ok_or_else(|| missing("drvPath"))?;
        let name = self.name.ok_or_else(|| missing("name"))?;
        let system = self.system.ok_or_else(|| missing("system"))?;

        Ok(LineRecord::Unit(BuildUnit {
            attr,
            attr_path: self.attr_path,
            drv_path,
            name,
            system,
            cache_status: self.cache_status,
            needed_builds: self.needed_builds,
            needed_substitutes: self.needed_substitutes,
            required_system_features: self.required_system_features,
        }))
    }
}

/// Decode one line without applying deduplication or exclusion
pub fn decode_line(line: &str) -> LineRecord {
    if line.trim().is_empty() {
        return LineRecord::Blank;
    }

    match serde_json::from_str::<RawRecord>(line)
        .map_err(RecordError::from)
        .and_then(RawRecord::into_line_record)
    {
        Ok(record) => record,
        Err(e) => LineRecord::Malformed(e),
    }
}

/// Parse one line of evaluator output
///
/// Returns `Ok(None)` for blank, malformed, duplicate and excluded lines,
/// `Ok(Some(unit))` for a new unit and `Err` when the attribute failed to
/// evaluate. `seen` holds the derivation paths admitted so far.
pub fn parse_line(line: &str, seen: &mut HashSet<String>) -> Result<Option<BuildUnit>, EvalError> {
    match decode_line(line) {
        LineRecord::Blank => Ok(None),
        LineRecord::Malformed(e) => {
            tracing::warn!("Skipping invalid JSON line ({e}): {line}");
            Ok(None)
        }
        LineRecord::Failed(err) => Err(err),
        LineRecord::Unit(unit) => Ok(admit(unit, seen)),
    }
}

/// Everything recovered from the evaluator's stdout
#[derive(Debug, Default)]
pub struct ParsedStream {
    /// Unique, non-excluded units in stream order
    pub units: Vec<BuildUnit>,
    /// Evaluation failures in stream order
    pub errors: Vec<EvalError>,
    /// Lines that were skipped as undecodable
    pub malformed: Vec<String>,
}

/// Parse a complete captured stdout
pub fn parse_stream(stdout: &str) -> ParsedStream {
    let mut parsed = ParsedStream::default();
    let mut seen = HashSet::new();

    for line in stdout.lines() {
        match decode_line(line) {
            LineRecord::Blank => {}
            LineRecord::Malformed(e) => {
                tracing::warn!("Skipping invalid JSON line ({e}): {line}");
                parsed.malformed.push(line.to_string());
            }
            LineRecord::Failed(err) => {
                tracing::debug!("Evaluation failed for {}", err.attr);
                parsed.errors.push(err);
            }
            LineRecord::Unit(unit) => {
                if let Some(unit) = admit(unit, &mut seen) {
                    parsed.units.push(unit);
                }
            }
        }
    }

    tracing::info!(
        "Parsed {} units, {} evaluation errors, {} malformed lines",
        parsed.units.len(),
        parsed.errors.len(),
        parsed.malformed.len()
    );
    parsed
}

fn admit(unit: BuildUnit, seen: &mut HashSet<String>) -> Option<BuildUnit> {
    if seen.contains(&unit.drv_path) {
        tracing::trace!("Duplicate derivation {}", unit.drv_path);
        return None;
    }
    if is_excluded_vm_test(&unit) {
        tracing::debug!("Excluding VM test {} on {}", unit.attr, unit.system);
        return None;
    }
    seen.insert(unit.drv_path.clone());
    Some(unit)
}

/// VM tests evaluated for x86_64-linux are a cross-evaluation artifact and
/// never enter the matrix.
pub fn is_excluded_vm_test(unit: &BuildUnit) -> bool {
    unit.system == "x86_64-linux"
        && unit
            .required_system_features
            .iter()
            .any(|f| f == defaults::NIXOS_TEST_FEATURE)
}

/// Reduce a nix error trace to its last `error:` line plus a little context
///
/// Messages without any `error:` line are returned verbatim.
pub fn core_error_message(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    match lines
        .iter()
        .rposition(|l| l.trim().starts_with(defaults::ERROR_MARKER))
    {
        Some(idx) => {
            let end = (idx + 1 + defaults::ERROR_CONTEXT_LINES).min(lines.len());
            lines[idx..end].join("\n").trim().to_string()
        }
        None => raw.to_string(),
    }
}

/// Collect warnings from the evaluator's diagnostic channel
pub fn parse_warnings(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            defaults::WARNING_PREFIXES
                .iter()
                .find_map(|prefix| line.strip_prefix(prefix))
                .map(|rest| rest.trim().to_string())
        })
        .collect()
}
