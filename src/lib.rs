//! Deploycheck core library.
//!
//! Reconciles OS-paired deployment scripts with the source repository they
//! deploy: referenced paths must exist, repository files must be referenced,
//! separators must match the declared target OS, and the Windows and Linux
//! script variants must invoke the same set of external utilities.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: YAML configuration model and loader.
//! - `logger`: leveled template logger with optional file sink.
//! - `paths`: separator conversion and referenced-path existence checks.
//! - `content`: pattern matching, repository traversal, orphan comparison.
//! - `parser`: script line classification and executable tracking.
//! - `stylesheet`: stylesheet-import manifest resolution.
//! - `engine`: per-script pipeline orchestration and the parity check.
//! - `models`: per-script analysis result structs.
//! - `error`: error types.

pub mod cli;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod logger;
pub mod models;
pub mod parser;
pub mod paths;
pub mod stylesheet;
