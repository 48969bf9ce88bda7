//! Reconciliation engine.
//!
//! Drives the per-script pipeline — separator-conversion resolution, syntax
//! pass, path-existence pass, stylesheet resolution, directory-content
//! comparison — and finishes with the cross-script executable parity check.
//! Scripts are processed strictly one at a time in configured order; every
//! script owns its conversion context, so a failure in one never bleeds
//! into the next.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::config::{Parameters, ScriptDefinition};
use crate::content::{self, PatternList};
use crate::logger::Logger;
use crate::models::ScriptAnalysis;
use crate::parser::{ExecutableRegistry, FlagMatcher, LineOutcome};
use crate::paths::{self, TargetOs};
use crate::stylesheet;

/// Runs the full check matrix over every configured script. Reconciliation
/// mismatches are reported through the logger; the run always completes.
pub fn run(params: &Parameters, log: &Logger) -> BTreeMap<String, ScriptAnalysis> {
    run_on(params, std::env::consts::OS, log)
}

/// Same as [`run`] with an explicit running OS, so tests can pin the
/// separator-conversion behavior.
pub fn run_on(
    params: &Parameters,
    running_os: &str,
    log: &Logger,
) -> BTreeMap<String, ScriptAnalysis> {
    let matcher = FlagMatcher::new(&params.path_parameters);
    let mut registry = ExecutableRegistry::default();
    let mut analyses: BTreeMap<String, ScriptAnalysis> = BTreeMap::new();
    let root = Path::new(&params.source_code_root);

    for script in &params.scripts {
        log.heading(" ", &[]);
        log.separate("file '{filePath}'", &[("filePath", &script.filename)]);
        log.separate("=====================================", &[]);

        let (target, conversion) =
            match paths::determine_conversion(&script.target_os, &script.filename, running_os) {
                Ok(resolved) => resolved,
                Err(err) => {
                    // this script's remaining checks are skipped; the run continues
                    log.error("{e}", &[("e", &err)]);
                    continue;
                }
            };
        log.debug(
            "Check is executed on '{os}' filesystem",
            &[("os", &running_os)],
        );
        if conversion.is_noop() {
            log.debug(
                "Target OS for '{f}' is matching with the running OS",
                &[("f", &script.filename)],
            );
        } else {
            log.debug(
                "Target OS for '{f}' is '{os}' but the running OS is '{ros}'; '{from}' will be converted to '{to}'",
                &[
                    ("f", &script.filename),
                    ("os", &target.as_str()),
                    ("ros", &running_os),
                    ("from", &conversion.from),
                    ("to", &conversion.to),
                ],
            );
        }

        let ignores = params.ignore_patterns.localized(&conversion);
        let global_patterns = PatternList::new(&ignores.global);
        let stylesheet_patterns = PatternList::new(&ignores.stylesheets_folder);

        log.separate("SCRIPT SYNTAX CHECK", &[]);
        let analysis = match check_script_syntax(script, target, root, &matcher, &mut registry, log)
        {
            Some(analysis) => analysis,
            None => {
                // unreadable script: its remaining checks are skipped
                analyses.insert(script.filename.clone(), ScriptAnalysis::default());
                continue;
            }
        };

        log.separate("FILE SYSTEM REFERENCES CHECK", &[]);
        log.separate("Only path definitions with valid syntax are checked.", &[]);
        log.separate(
            "The erroring lines found in the script syntax check are ignored.",
            &[],
        );
        paths::check_referenced_paths(&script.filename, &analysis.valid, root, &conversion, log);

        stylesheet::resolve_all(
            &script.filename,
            &analysis.stylesheet_imports,
            root,
            &conversion,
            &stylesheet_patterns,
            log,
        );

        log.separate("DIRECTORY CONTENT CHECK", &[]);
        log.separate(
            "File & directory patterns defined as 'ignore_patterns' in the configuration are ignored",
            &[],
        );
        let referenced: BTreeSet<String> = analysis
            .valid
            .values()
            .map(|path| conversion.apply(path))
            .collect();
        content::compare_directory_contents(
            &script.filename,
            &referenced,
            root,
            &global_patterns,
            log,
        );
        log.separate(" ", &[]);

        analyses.insert(script.filename.clone(), analysis);
    }

    check_parity(&params.scripts, &registry, &mut analyses, log);
    analyses
}

/// Syntax pass: classifies every non-blank line of the script and reports
/// the buckets, each sorted by line number. `None` when the script file
/// cannot be read.
fn check_script_syntax(
    script: &ScriptDefinition,
    target: TargetOs,
    root: &Path,
    matcher: &FlagMatcher,
    registry: &mut ExecutableRegistry,
    log: &Logger,
) -> Option<ScriptAnalysis> {
    let mut analysis = ScriptAnalysis::default();

    let full_path = root.join(&script.filename);
    let text = match fs::read_to_string(&full_path) {
        Ok(text) => text,
        Err(err) => {
            log.error(
                "Error opening '{f}'. {e}.",
                &[("f", &script.filename), ("e", &err)],
            );
            return None;
        }
    };

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        registry.track(&script.filename, line);
        match matcher.parse_line(&script.filename, line, line_no, target, log) {
            LineOutcome::Valid { path, stylesheet } => {
                analysis.valid.insert(line_no, path);
                if let Some(import) = stylesheet {
                    analysis.stylesheet_imports.insert(line_no, import);
                }
            }
            LineOutcome::Invalid { annotated } => {
                analysis.invalid.insert(line_no, annotated);
            }
            LineOutcome::Skipped { line } => {
                analysis.skipped.insert(line_no, line);
            }
        }
    }

    log.info("valid lines", &[]);
    report_bucket("valid", &analysis.valid, &script.filename, false, log);
    log.info("stylesheet import", &[]);
    report_bucket(
        "stylesheet import",
        &analysis.stylesheet_lines(),
        &script.filename,
        false,
        log,
    );
    log.separate("lines with invalid syntax of referenced filepaths", &[]);
    if !report_bucket("invalid", &analysis.invalid, &script.filename, true, log) {
        log.separate("none", &[]);
    }
    log.info("skipped lines", &[]);
    report_bucket("skipped", &analysis.skipped, &script.filename, false, log);

    Some(analysis)
}

/// Logs one bucket in line order; returns whether it held any entries.
fn report_bucket(
    label: &str,
    lines: &BTreeMap<usize, String>,
    script: &str,
    invalid: bool,
    log: &Logger,
) -> bool {
    if lines.is_empty() {
        log.info("No {lt} entries found", &[("lt", &label)]);
        return false;
    }
    for (line_no, value) in lines {
        if invalid {
            log.error(
                "'{f}' line '{ln}' is invalid: '{val}'",
                &[("f", &script), ("ln", line_no), ("val", &value)],
            );
        } else {
            log.info(
                "'{f}' line '{ln}': '{val}'",
                &[("f", &script), ("ln", line_no), ("val", &value)],
            );
        }
    }
    true
}

/// Parity check: the union of executables tracked across Windows scripts
/// must equal the union across Linux scripts. A no-op when fewer than two
/// scripts are configured or only one OS family is represented.
fn check_parity(
    scripts: &[ScriptDefinition],
    registry: &ExecutableRegistry,
    analyses: &mut BTreeMap<String, ScriptAnalysis>,
    log: &Logger,
) {
    if scripts.len() < 2 {
        return;
    }

    let windows: Vec<&str> = scripts
        .iter()
        .filter(|s| s.target_os == "windows")
        .map(|s| s.filename.as_str())
        .collect();
    let linux: Vec<&str> = scripts
        .iter()
        .filter(|s| s.target_os == "linux")
        .map(|s| s.filename.as_str())
        .collect();
    if windows.is_empty() || linux.is_empty() {
        return;
    }

    log.heading(" ", &[]);
    log.separate("SCRIPT PARITY CHECK", &[]);
    log.separate("=====================================", &[]);
    log.separate(
        "Checking that Windows and Linux scripts call the same executables...",
        &[],
    );

    let windows_execs = registry.union(windows.iter().copied());
    let linux_execs = registry.union(linux.iter().copied());

    // BTreeSet difference iterates in sorted order
    let missing_in_linux: Vec<String> = windows_execs.difference(&linux_execs).cloned().collect();
    let missing_in_windows: Vec<String> = linux_execs.difference(&windows_execs).cloned().collect();

    if !missing_in_linux.is_empty() {
        let joined = missing_in_linux.join(", ");
        log.error(
            "Executables in Windows script(s) but missing in Linux script(s): {execs}",
            &[("execs", &joined)],
        );
        for name in &linux {
            if let Some(analysis) = analyses.get_mut(*name) {
                analysis.missing = missing_in_linux.clone();
            }
        }
    }

    if !missing_in_windows.is_empty() {
        let joined = missing_in_windows.join(", ");
        log.error(
            "Executables in Linux script(s) but missing in Windows script(s): {execs}",
            &[("execs", &joined)],
        );
        for name in &windows {
            if let Some(analysis) = analyses.get_mut(*name) {
                analysis.missing = missing_in_windows.clone();
            }
        }
    }

    if missing_in_linux.is_empty() && missing_in_windows.is_empty() {
        log.separate("none", &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnorePatterns;
    use crate::logger::LogLevel;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn quiet() -> Logger {
        Logger::new(LogLevel::Error, None).unwrap()
    }

    fn params(dir: &TempDir, scripts: Vec<ScriptDefinition>, flags: &[&str]) -> Parameters {
        Parameters {
            scripts,
            path_parameters: flags.iter().map(|s| s.to_string()).collect(),
            source_code_root: dir.path().to_string_lossy().to_string(),
            ignore_patterns: IgnorePatterns::default(),
            logfile: None,
        }
    }

    fn script(filename: &str, target_os: &str) -> ScriptDefinition {
        ScriptDefinition {
            filename: filename.to_string(),
            target_os: target_os.to_string(),
        }
    }

    #[test]
    fn test_windows_script_with_backslash_path_is_valid() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/data.xml"), "<x/>").unwrap();
        fs::write(
            dir.path().join("deploy.bat"),
            "install_util -R=\"config\\data.xml\"\n",
        )
        .unwrap();

        let params = params(&dir, vec![script("deploy.bat", "windows")], &["R"]);
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        let analysis = &analyses["deploy.bat"];
        assert_eq!(analysis.valid.get(&1), Some(&r"config\data.xml".to_string()));
        assert!(analysis.invalid.is_empty());
    }

    #[test]
    fn test_windows_script_with_forward_slash_path_is_invalid() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("deploy.bat"),
            "install_util -R=\"config/data.xml\"\n",
        )
        .unwrap();

        let params = params(&dir, vec![script("deploy.bat", "windows")], &["R"]);
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        let analysis = &analyses["deploy.bat"];
        assert!(analysis.valid.is_empty());
        let annotated = analysis.invalid.get(&1).expect("invalid entry");
        assert!(annotated.contains("forward slashes"));
    }

    #[test]
    fn test_parity_reports_executable_missing_in_linux() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("deploy.bat"),
            "plmxml_import -file=a\ntc_utils -x\n",
        )
        .unwrap();
        fs::write(dir.path().join("deploy.sh"), "tc_utils -x\n").unwrap();

        let params = params(
            &dir,
            vec![script("deploy.bat", "windows"), script("deploy.sh", "linux")],
            &[],
        );
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        assert_eq!(analyses["deploy.sh"].missing, vec!["plmxml_import"]);
        assert!(analyses["deploy.bat"].missing.is_empty());
    }

    #[test]
    fn test_parity_is_symmetric() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.bat"), "tc_utils -x\n").unwrap();
        fs::write(dir.path().join("b.sh"), "plmxml_import -file=a\ntc_utils -x\n").unwrap();

        let params = params(
            &dir,
            vec![script("a.bat", "windows"), script("b.sh", "linux")],
            &[],
        );
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        assert_eq!(analyses["a.bat"].missing, vec!["plmxml_import"]);
        assert!(analyses["b.sh"].missing.is_empty());
    }

    #[test]
    fn test_parity_noop_for_single_os_family() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.sh"), "one -x\n").unwrap();
        fs::write(dir.path().join("b.sh"), "two -x\n").unwrap();

        let params = params(
            &dir,
            vec![script("a.sh", "linux"), script("b.sh", "linux")],
            &[],
        );
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        assert!(analyses["a.sh"].missing.is_empty());
        assert!(analyses["b.sh"].missing.is_empty());
    }

    #[test]
    fn test_invalid_target_os_skips_script_but_not_the_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.cmd"), "one -x\n").unwrap();
        fs::write(dir.path().join("good.sh"), "two -x\n").unwrap();

        let params = params(
            &dir,
            vec![script("bad.cmd", "solaris"), script("good.sh", "linux")],
            &[],
        );
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        assert!(!analyses.contains_key("bad.cmd"));
        assert!(analyses.contains_key("good.sh"));
    }

    #[test]
    fn test_unreadable_script_is_recovered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.sh"), "two -x\n").unwrap();

        let params = params(
            &dir,
            vec![script("absent.sh", "linux"), script("good.sh", "linux")],
            &[],
        );
        let log = quiet();
        let analyses = run_on(&params, "linux", &log);

        // the unreadable script yields an empty analysis; the run continues
        assert!(analyses["absent.sh"].valid.is_empty());
        assert!(analyses["good.sh"].skipped.contains_key(&1));
    }

    #[test]
    fn test_line_buckets_are_mutually_exclusive() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("deploy.sh"),
            "install_util -R=\"a.xml\"\necho next\ninstall_util -R=bad\n\n",
        )
        .unwrap();
        fs::write(dir.path().join("a.xml"), "").unwrap();

        let mut p = params(&dir, vec![script("deploy.sh", "linux")], &["R"]);
        p.ignore_patterns.global = vec!["deploy.sh".to_string()];
        let log = quiet();
        let analyses = run_on(&p, "linux", &log);

        let analysis = &analyses["deploy.sh"];
        assert_eq!(analysis.valid.len(), 1);
        assert_eq!(analysis.invalid.len(), 1);
        assert_eq!(analysis.skipped.len(), 1);
        // line 4 is blank and lands nowhere
        for line_no in [1usize, 2, 3] {
            let buckets = [
                analysis.valid.contains_key(&line_no),
                analysis.invalid.contains_key(&line_no),
                analysis.skipped.contains_key(&line_no),
            ];
            assert_eq!(buckets.iter().filter(|b| **b).count(), 1);
        }
    }

    #[test]
    fn test_stylesheet_import_rides_along_with_valid() {
        let dir = tempdir().unwrap();
        let styles = dir.path().join("styles");
        fs::create_dir_all(&styles).unwrap();
        fs::write(styles.join("summary.xml"), "").unwrap();
        fs::write(styles.join("list.txt"), "Summary,summary.xml\n").unwrap();
        fs::write(
            dir.path().join("deploy.sh"),
            "install_xml_stylesheet_datasets -input=\"styles/list.txt\" -filepath=\"styles\"\n",
        )
        .unwrap();

        let mut p = params(&dir, vec![script("deploy.sh", "linux")], &["input"]);
        p.ignore_patterns.global = vec!["deploy.sh".to_string(), "styles/".to_string()];
        p.ignore_patterns.stylesheets_folder = vec!["*.txt".to_string()];
        let log = quiet();
        let analyses = run_on(&p, "linux", &log);

        let analysis = &analyses["deploy.sh"];
        assert!(analysis.valid.contains_key(&1));
        let import = analysis.stylesheet_imports.get(&1).expect("import entry");
        assert_eq!(import.input_file, "styles/list.txt");
        assert_eq!(import.xmls_filepath, "styles");
    }
}
