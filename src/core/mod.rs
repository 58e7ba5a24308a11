//! Core business logic module
//!
//! This module contains the matrix pipeline and the pure parts of the
//! packaging scaffold. Subprocesses and network access belong in
//! [`crate::infra`].
//!
//! # Submodules
//!
//! - [`record`] - Evaluator stream parsing, deduplication and exclusion
//! - [`resolver`] - Closure ordering of build units
//! - [`platform`] - Supported systems and their runners
//! - [`classify`] - Matrix entry classification
//! - [`matrix`] - Per-platform matrix assembly
//! - [`diagnostics`] - Warning/error aggregation and the annotation sink
//! - [`generate`] - Pipeline from evaluator output to published matrix
//! - [`global_config`] - Configuration file
//! - [`scaffold`] - Go packaging scaffold
//! - [`doctor`] - System dependency checks

pub mod classify;
pub mod diagnostics;
pub mod doctor;
pub mod generate;
pub mod global_config;
pub mod matrix;
pub mod platform;
pub mod record;
pub mod resolver;
pub mod scaffold;
