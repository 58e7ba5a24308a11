//! Configuration and constants
//!
//! - [`defaults`] - Compiled-in defaults and wire-format markers
//! - [`urls`] - Remote endpoints

pub mod defaults;
pub mod urls;
