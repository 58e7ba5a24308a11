//! Error types for flake-matrix
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// A line of evaluator output that could not be turned into a record
#[derive(Error, Debug)]
pub enum RecordError {
    /// Not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Valid JSON but a required field is absent
    #[error("Record for '{attr}' is missing required field '{field}'")]
    MissingField { attr: String, field: &'static str },
}

/// Dependency ordering errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
}

/// Runner classification errors
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The evaluator produced a platform the runner table does not cover
    #[error("No runner configuration for system: {system} (attribute '{attr}')")]
    NoRunner { system: String, attr: String },
}

/// Evaluator subprocess errors
#[derive(Error, Debug)]
pub enum EvalRunError {
    /// The evaluator binary could not be started
    #[error("Failed to spawn '{program}': {error}")]
    Spawn { program: String, error: String },

    /// The evaluator did not finish in time
    #[error("'{program}' did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// Reading captured output from disk failed
    #[error("Failed to read evaluator output '{}': {error}", path.display())]
    ReadCapture { path: PathBuf, error: String },
}

/// Go packaging scaffold errors
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Not a github.com/owner/repo URL
    #[error("Invalid GitHub URL '{url}'. Expected format: github.com/owner/repo")]
    InvalidGithubUrl { url: String },

    /// The tarball for the ref does not resolve
    #[error("Could not resolve {owner}/{repo} at ref '{git_ref}'")]
    UnresolvedRef {
        owner: String,
        repo: String,
        git_ref: String,
    },

    /// HTTP failure while validating a ref
    #[error("Network error checking '{url}': {error}")]
    Network { url: String, error: String },

    /// An external nix command failed
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// An external nix command timed out
    #[error("'{command}' timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    /// Reading or writing the scaffold config failed
    #[error("Scaffold config error for '{}': {error}", path.display())]
    Config { path: PathBuf, error: String },
}

/// Top-level flake-matrix error type
#[derive(Error, Debug)]
pub enum MatrixError {
    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Classification error
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// Evaluator error
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalRunError),

    /// Scaffold error
    #[error("Package scaffold error: {0}")]
    Scaffold(#[from] ScaffoldError),

    /// One or more attributes failed to evaluate
    #[error("{count} attribute(s) failed to evaluate")]
    EvaluationFailed { count: usize },

    /// Serialization of the matrix failed
    #[error("Failed to serialize matrix: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
