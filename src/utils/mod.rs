//! Utilities Module
//!
//! Logging and process-wide configuration.

pub mod config;
pub mod logging;

pub use config::{get_compiler_config, CompilerConfig};
