//! Configuration loading.
//!
//! The run is driven by a single YAML file (default `config.yaml`):
//!
//! ```yaml
//! scripts:
//!   - filename: deploy.bat
//!     target_os: windows
//!   - filename: deploy.sh
//!     target_os: linux
//! path_parameters: [R, xml_file, file]
//! source_code_root: /path/to/repo
//! ignore_patterns:
//!   global: ["*.md", "900-Automation/"]
//!   stylesheets_folder: ["*.txt"]
//! logfile: deploycheck.log
//! ```
//!
//! Configuration errors are fatal; `target_os` values are kept as free text
//! here and validated per script during the run so that one bad script
//! definition does not abort the others.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::paths::Conversion;

/// One deployment script to validate.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptDefinition {
    pub filename: String,
    pub target_os: String,
}

/// Gitignore-style exclusion lists, separator-localized per script run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnorePatterns {
    #[serde(default)]
    pub global: Vec<String>,
    #[serde(default)]
    pub stylesheets_folder: Vec<String>,
}

impl IgnorePatterns {
    /// Returns a copy with the separator conversion applied to every pattern.
    pub fn localized(&self, conversion: &Conversion) -> IgnorePatterns {
        IgnorePatterns {
            global: self.global.iter().map(|p| conversion.apply(p)).collect(),
            stylesheets_folder: self
                .stylesheets_folder
                .iter()
                .map(|p| conversion.apply(p))
                .collect(),
        }
    }
}

/// Resolved run configuration consumed by the reconciliation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    pub scripts: Vec<ScriptDefinition>,
    /// Flag names to search for, in first-match priority order.
    #[serde(default)]
    pub path_parameters: Vec<String>,
    pub source_code_root: String,
    #[serde(default)]
    pub ignore_patterns: IgnorePatterns,
    #[serde(default)]
    pub logfile: Option<String>,
}

impl Parameters {
    /// Logfile destination, treating an empty string as "stdout only".
    pub fn logfile_path(&self) -> Option<&Path> {
        match self.logfile.as_deref() {
            Some("") | None => None,
            Some(p) => Some(Path::new(p)),
        }
    }
}

/// Loads and validates the configuration file.
pub fn load_parameters(path: &Path) -> Result<Parameters, Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let params: Parameters = serde_yaml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    if params.scripts.is_empty() {
        return Err(Error::NoScripts {
            path: path.to_path_buf(),
        });
    }
    Ok(params)
}
