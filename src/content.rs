//! Gitignore-style pattern matching, best-effort repository traversal, and
//! the directory-content comparison.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::logger::Logger;

/// Ordered list of independently compiled gitignore-style patterns.
///
/// Each configured pattern is compiled on its own, so exclusion is a
/// first-match scan in configured order. `*` wildcards and trailing-`/`
/// directory anchors behave as in gitignore. A leading `!` yields a
/// whitelist match in gitignore semantics; since a lone negated pattern can
/// only whitelist, it never causes exclusion here.
pub struct PatternList {
    patterns: Vec<(String, Gitignore)>,
}

impl PatternList {
    pub fn new(patterns: &[String]) -> PatternList {
        let patterns = patterns
            .iter()
            .map(|text| {
                let mut builder = GitignoreBuilder::new("");
                let _ = builder.add_line(None, text);
                let compiled = builder.build().unwrap_or_else(|_| Gitignore::empty());
                (text.clone(), compiled)
            })
            .collect();
        PatternList { patterns }
    }

    /// True iff `rel_path` matches any pattern in the list.
    pub fn should_ignore(&self, rel_path: &Path, is_dir: bool, log: &Logger) -> bool {
        for (text, compiled) in &self.patterns {
            if compiled.matched(rel_path, is_dir).is_ignore() {
                let shown = rel_path.display().to_string();
                log.debug(
                    "Excluding path '{path}' as it matches ignore pattern '{p}'",
                    &[("path", &shown), ("p", &text)],
                );
                return true;
            }
        }
        false
    }

    /// The configured pattern texts, for reporting.
    pub fn texts(&self) -> Vec<&str> {
        self.patterns.iter().map(|(text, _)| text.as_str()).collect()
    }
}

/// Outcome of a best-effort repository walk: the files that could be
/// collected plus every access error encountered on the way. The file set
/// is usable even when errors are present.
pub struct CollectedFiles {
    pub files: BTreeSet<String>,
    pub errors: Vec<String>,
}

/// Walks the tree at `root` depth-first and collects root-relative file
/// paths, excluding everything the pattern list matches. Directories that
/// match a pattern are pruned whole and never contribute entries. Access
/// errors are logged and accumulated; traversal continues on siblings.
pub fn collect_files(root: &Path, patterns: &PatternList, log: &Logger) -> CollectedFiles {
    let mut files = BTreeSet::new();
    let mut errors = Vec::new();

    let mut walker = WalkDir::new(root).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                log.error(
                    "Error accessing path '{p}': {e}",
                    &[("p", &path), ("e", &err)],
                );
                // an unreadable directory is not descended into, so the
                // sibling entries keep coming
                errors.push(format!("{path}: {err}"));
                continue;
            }
        };

        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if rel.as_os_str().is_empty() {
            continue; // the root itself
        }

        let is_dir = entry.file_type().is_dir();
        let shown = rel.display().to_string();
        if patterns.should_ignore(rel, is_dir, log) {
            if is_dir {
                log.debug(
                    "Skipping directory '{relPath}' (matches ignore pattern)",
                    &[("relPath", &shown)],
                );
                walker.skip_current_dir();
            }
            continue;
        }

        if is_dir {
            log.debug(
                "Excluding path '{relPath}' as it is a directory",
                &[("relPath", &shown)],
            );
        } else {
            log.debug(
                "Path '{relPath}' should be checked if existing in the script file.",
                &[("relPath", &shown)],
            );
            files.insert(shown);
        }
    }

    CollectedFiles { files, errors }
}

/// Result of the orphan check: `orphaned = collected \ referenced`.
pub struct DirectoryComparison {
    pub orphaned: Vec<String>,
    pub traversal_errors: Vec<String>,
}

/// Compares the repository files under `root` (minus ignored ones) with the
/// path values referenced by `script`. Every collected file absent from the
/// referenced set is reported as orphaned. Traversal errors do not abort
/// the comparison; the partial file set is still compared.
pub fn compare_directory_contents(
    script: &str,
    referenced: &BTreeSet<String>,
    root: &Path,
    patterns: &PatternList,
    log: &Logger,
) -> DirectoryComparison {
    let shown_root = root.display().to_string();
    let shown_patterns = patterns.texts().join(", ");
    log.info(
        "Comparison whether all repository files are referenced in the script started for '{script}'",
        &[("script", &script)],
    );
    log.info("Repository root is '{r}'", &[("r", &shown_root)]);
    log.info("Ignore patterns are '{p}'", &[("p", &shown_patterns)]);

    let collected = collect_files(root, patterns, log);
    let found = collected.files.len();
    log.info(
        "'{files}' files found in the repository after applying the ignore patterns",
        &[("files", &found)],
    );
    for file in &collected.files {
        log.debug("\t'{f}'", &[("f", &file)]);
    }
    if !collected.errors.is_empty() {
        let count = collected.errors.len();
        log.error(
            "Errors occurred during directory traversal: '{n}' paths were inaccessible",
            &[("n", &count)],
        );
        // keep going with the partial file set
    }

    let referenced_count = referenced.len();
    log.info(
        "'{valid}' referenced paths found in script '{s}'",
        &[("valid", &referenced_count), ("s", &script)],
    );
    for value in referenced {
        log.debug("\t'{v}'", &[("v", &value)]);
    }

    let mut orphaned = Vec::new();
    for item in &collected.files {
        if referenced.contains(item) {
            log.info(
                "'{item}' is found in the script file '{script}'",
                &[("item", &item), ("script", &script)],
            );
        } else {
            log.error(
                "Filepath '{item}' does not exist in the script file '{script}'",
                &[("item", &item), ("script", &script)],
            );
            orphaned.push(item.clone());
        }
    }

    if orphaned.is_empty() && !collected.files.is_empty() {
        log.info("All repository files are referenced in the script", &[]);
    } else if collected.files.is_empty() {
        log.info("No files found in repository to check", &[]);
    }

    DirectoryComparison {
        orphaned,
        traversal_errors: collected.errors,
    }
}
