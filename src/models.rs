//! Per-script analysis results.

use std::collections::BTreeMap;

/// A script line that invokes the stylesheet-import utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetImport {
    /// Original line text.
    pub line: String,
    /// Value of the `-input` flag (manifest file), empty when absent.
    pub input_file: String,
    /// Value of the `-filepath` flag (stylesheets folder), empty when absent.
    pub xmls_filepath: String,
}

/// Classification buckets for one analyzed script.
///
/// A line number appears in at most one of `valid`/`invalid`/`skipped`;
/// stylesheet-import entries are additive to `valid`. `BTreeMap` keys keep
/// every report iteration sorted by line number.
#[derive(Debug, Default)]
pub struct ScriptAnalysis {
    /// Line number to extracted file path.
    pub valid: BTreeMap<usize, String>,
    /// Line number to original text annotated with the violated rule.
    pub invalid: BTreeMap<usize, String>,
    /// Line number to original text, for lines matching no tracked flag.
    pub skipped: BTreeMap<usize, String>,
    pub stylesheet_imports: BTreeMap<usize, StylesheetImport>,
    /// Executables absent from the counterpart OS scripts; filled by the
    /// parity check after all scripts are processed.
    pub missing: Vec<String>,
}

impl ScriptAnalysis {
    /// Line texts of the stylesheet-import entries, keyed by line number.
    pub fn stylesheet_lines(&self) -> BTreeMap<usize, String> {
        self.stylesheet_imports
            .iter()
            .map(|(line_no, import)| (*line_no, import.line.clone()))
            .collect()
    }
}
