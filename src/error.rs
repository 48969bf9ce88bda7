//! Error types for configuration loading and per-script validation.
//!
//! Only configuration errors are fatal; everything else is recovered at the
//! line, import, or script granularity and reported through the logger.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read configuration file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file '{path}' is not valid YAML: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration file '{path}' defines no scripts to check")]
    NoScripts { path: PathBuf },

    /// The `target_os` of a script definition is neither `windows` nor `linux`.
    #[error("incorrect specification of script target_os for '{script}': must be 'linux' or 'windows', got '{value}'")]
    InvalidTargetOs { script: String, value: String },

    /// A referenced path uses separators that do not match the script's target OS.
    #[error("line {line}: path '{path}' contains {detail}")]
    SeparatorMismatch {
        line: usize,
        path: String,
        detail: &'static str,
    },

    #[error("error opening '{path}': {source}")]
    ManifestOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-fatal traversal errors were encountered; the walk still produced
    /// a partial file set which callers are expected to use.
    #[error("encountered {0} errors during directory traversal (see log for details)")]
    Traversal(usize),
}
