//! Infrastructure layer
//!
//! Handles all I/O operations: subprocesses, network, filesystem and the
//! CI annotation sink. This module is the only place where side effects occur.

pub mod dirs;
pub mod eval;
pub mod github;
pub mod http;
pub mod nix;
