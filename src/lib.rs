//! flake-matrix - GitHub Actions build matrices from nix-eval-jobs
//!
//! Turns the line-delimited JSON stream of `nix-eval-jobs` into per-platform
//! matrices of derivations that still need building, ordered so that
//! dependencies come before their dependents, and reports evaluation
//! problems as workflow annotations.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (no I/O operations)
//! - [`infra`] - Infrastructure layer (processes, network, workflow commands)
//! - [`config`] - Constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
