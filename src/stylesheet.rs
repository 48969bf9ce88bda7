//! Resolution of stylesheet-import manifests.
//!
//! A stylesheet-import line names a CSV-like manifest (`-input`) and the
//! folder holding the XML stylesheets (`-filepath`). The second column of
//! each manifest line is an XML filename; every one of them must exist
//! under the stylesheets folder, and the folder must not hold files the
//! manifest does not list.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::content::{self, PatternList};
use crate::error::Error;
use crate::logger::Logger;
use crate::models::StylesheetImport;
use crate::paths::{self, Conversion};

struct ManifestEntry {
    /// Bare filename, the identity used by the orphan check.
    relative: String,
    /// Source-root-relative join of the stylesheets folder and the filename.
    absolute: String,
}

/// Resolves every stylesheet import of a script. A failing import is logged
/// and does not abort the remaining ones.
pub fn resolve_all(
    script: &str,
    imports: &BTreeMap<usize, StylesheetImport>,
    root: &Path,
    conversion: &Conversion,
    patterns: &PatternList,
    log: &Logger,
) {
    log.debug(
        "checking stylesheet import paths for '{s}'",
        &[("s", &script)],
    );
    let total = imports.len();
    for (index, import) in imports.values().enumerate() {
        let input_file = conversion.apply(&import.input_file);
        let position = index + 1;
        log.debug(
            "input file '{i}' of '{n}' is '{f}'",
            &[("i", &position), ("n", &total), ("f", &input_file)],
        );
        if let Err(err) = resolve(import, root, conversion, patterns, log) {
            log.error(
                "Error processing stylesheet import file '{f}': {e}",
                &[("f", &input_file), ("e", &err)],
            );
        }
    }
}

/// Resolves one stylesheet import: reads the manifest, existence-checks
/// every listed XML, and compares the stylesheets folder on disk against
/// the manifest-listed names.
pub fn resolve(
    import: &StylesheetImport,
    root: &Path,
    conversion: &Conversion,
    patterns: &PatternList,
    log: &Logger,
) -> Result<(), Error> {
    let input_file = conversion.apply(&import.input_file);
    let xmls_filepath = conversion.apply(&import.xmls_filepath);
    let manifest_path = root.join(&input_file);

    let text = fs::read_to_string(&manifest_path).map_err(|source| Error::ManifestOpen {
        path: manifest_path.clone(),
        source,
    })?;

    let mut entries: BTreeMap<usize, ManifestEntry> = BTreeMap::new();
    let mut total_lines = 0usize;
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        total_lines = line_no;
        if line.trim().is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split(',').collect();
        if columns.len() < 2 {
            log.error("Line '{l}' is of invalid format", &[("l", &line)]);
            continue;
        }
        let filename = columns[1].trim().to_string();
        let absolute = Path::new(&xmls_filepath)
            .join(&filename)
            .to_string_lossy()
            .to_string();
        log.debug("stylesheet XML absolute path: '{p}'", &[("p", &absolute)]);
        log.debug("stylesheet XML relative path: '{p}'", &[("p", &filename)]);
        entries.insert(
            line_no,
            ManifestEntry {
                relative: filename,
                absolute,
            },
        );
    }
    log.info(
        "Read '{n}' lines from '{f}'",
        &[("n", &total_lines), ("f", &input_file)],
    );

    let listed = entries.len();
    log.debug(
        "Checking whether all '{n}' stylesheet XMLs referenced in '{f}' exist...",
        &[("n", &listed), ("f", &input_file)],
    );
    let absolute_paths: BTreeMap<usize, String> = entries
        .iter()
        .map(|(line_no, entry)| (*line_no, entry.absolute.clone()))
        .collect();
    paths::check_referenced_paths(&import.input_file, &absolute_paths, root, conversion, log);

    let referenced: BTreeSet<String> = entries
        .values()
        .map(|entry| entry.relative.clone())
        .collect();
    let xmls_root = root.join(&xmls_filepath);
    log.debug(
        "Comparing the stylesheets folder '{d}' with the manifest '{input}'",
        &[("d", &xmls_filepath), ("input", &input_file)],
    );
    let outcome =
        content::compare_directory_contents(&input_file, &referenced, &xmls_root, patterns, log);
    if !outcome.traversal_errors.is_empty() {
        return Err(Error::Traversal(outcome.traversal_errors.len()));
    }

    Ok(())
}
