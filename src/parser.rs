//! Line-oriented script parsing.
//!
//! Each script line ends up in exactly one bucket: `Valid` (a tracked flag
//! with a well-formed, separator-correct path), `Invalid` (a tracked flag
//! that failed formatting or separator checks), or `Skipped` (no tracked
//! flag at all). Stylesheet-import detection rides along with `Valid`.
//! Independently of classification, the leading executable token of every
//! line is recorded for the cross-script parity check.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;
use crate::logger::Logger;
use crate::models::StylesheetImport;
use crate::paths::TargetOs;

/// Shell builtins that never count as tracked executables.
const SHELL_BUILTINS: &[&str] = &[
    "echo", "cd", "mkdir", "rm", "cp", "mv", "chmod", "chown", "export", "set", "pwd", "ls",
    "dir", "del", "copy", "move", "rem", "call", "if", "for", "goto", "pushd", "popd", "exit",
    "return",
];

const STYLESHEET_UTILITY: &str = "install_xml_stylesheet_datasets";

/// Terminal classification of one script line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Valid {
        path: String,
        stylesheet: Option<StylesheetImport>,
    },
    /// Original line text annotated with the violated rule.
    Invalid { annotated: String },
    Skipped { line: String },
}

struct FlagPatterns {
    name: String,
    /// Bare occurrence of `-<flag>`.
    presence: Regex,
    /// Strict form `-<flag>="<value>"`, value non-empty without embedded quotes.
    value: Regex,
}

/// Pre-compiled patterns for the configured path parameters, in
/// first-match priority order, plus the stylesheet-utility patterns.
pub struct FlagMatcher {
    flags: Vec<FlagPatterns>,
    stylesheet_utility: Regex,
    stylesheet_flags: Regex,
}

impl FlagMatcher {
    pub fn new(parameters: &[String]) -> FlagMatcher {
        let flags = parameters
            .iter()
            .map(|name| {
                let quoted = regex::escape(name);
                FlagPatterns {
                    name: name.clone(),
                    presence: Regex::new(&format!("-{quoted}")).expect("flag pattern"),
                    value: Regex::new(&format!(r#"-{quoted}="([^"]+)""#))
                        .expect("flag value pattern"),
                }
            })
            .collect();
        FlagMatcher {
            flags,
            stylesheet_utility: Regex::new(STYLESHEET_UTILITY).expect("utility pattern"),
            stylesheet_flags: Regex::new(r#"-input="([^"]+)"|-filepath="([^"]+)""#)
                .expect("stylesheet flags pattern"),
        }
    }

    /// Classifies one line of `script`.
    ///
    /// The first configured flag that textually occurs on the line wins;
    /// later flags are not considered even if also present (a debug note is
    /// emitted when that happens). A flag that is present but not in the
    /// strict quoted form makes the line invalid without falling through to
    /// other flags.
    pub fn parse_line(
        &self,
        script: &str,
        line: &str,
        line_number: usize,
        target: TargetOs,
        log: &Logger,
    ) -> LineOutcome {
        log.debug(
            "parsing line '{ln} {l}'",
            &[("ln", &line_number), ("l", &line)],
        );

        for (index, flag) in self.flags.iter().enumerate() {
            log.debug("searching for flag '{f}'", &[("f", &flag.name)]);
            if !flag.presence.is_match(line) {
                log.debug("no '{p}' flag found ...", &[("p", &flag.name)]);
                continue;
            }

            for later in &self.flags[index + 1..] {
                if later.presence.is_match(line) {
                    log.debug(
                        "line '{ln}' also contains flag '-{o}'; '-{f}' matched first and wins",
                        &[("ln", &line_number), ("o", &later.name), ("f", &flag.name)],
                    );
                }
            }

            log.debug(
                "checking if the '-{f}' flag definition is properly formatted",
                &[("f", &flag.name)],
            );
            let Some(captures) = flag.value.captures(line) else {
                log.debug(
                    "line '{l}': '-{s}' is present but not quoted properly",
                    &[("l", &line_number), ("s", &flag.name)],
                );
                return LineOutcome::Invalid {
                    annotated: format!(
                        "{line} [flag '-{}' is present but not quoted properly]",
                        flag.name
                    ),
                };
            };

            let path = captures[1].to_string();
            log.debug("filepath is: '{fp}'", &[("fp", &path)]);

            if let Err(err) = validate_separators(&path, target, line_number) {
                log.error("'{f}' {e}", &[("f", &script), ("e", &err)]);
                return LineOutcome::Invalid {
                    annotated: format!("{line} [{err}]"),
                };
            }

            let stylesheet = self.stylesheet_import(line, log);
            return LineOutcome::Valid { path, stylesheet };
        }

        log.debug(
            "line '{ln} {l}' does not contain any flag of interest",
            &[("ln", &line_number), ("l", &line)],
        );
        LineOutcome::Skipped {
            line: line.to_string(),
        }
    }

    /// Detects an invocation of the stylesheet-import utility and extracts
    /// its `-input` and `-filepath` values. Both flags are optional and
    /// order-independent; an absent flag leaves the field empty.
    fn stylesheet_import(&self, line: &str, log: &Logger) -> Option<StylesheetImport> {
        if !self.stylesheet_utility.is_match(line) {
            return None;
        }
        log.debug(
            "'{l}' is referring to '{u}'",
            &[("l", &line), ("u", &STYLESHEET_UTILITY)],
        );

        let mut input_file = String::new();
        let mut xmls_filepath = String::new();
        for captures in self.stylesheet_flags.captures_iter(line) {
            if let Some(value) = captures.get(1) {
                input_file = value.as_str().to_string();
            }
            if let Some(value) = captures.get(2) {
                xmls_filepath = value.as_str().to_string();
            }
        }
        Some(StylesheetImport {
            line: line.to_string(),
            input_file,
            xmls_filepath,
        })
    }
}

/// Checks that the path uses only the separator of the target OS. A path
/// with no separators at all is valid under either target.
pub fn validate_separators(path: &str, target: TargetOs, line: usize) -> Result<(), Error> {
    let has_backslash = path.contains('\\');
    let has_forward_slash = path.contains('/');

    match target {
        TargetOs::Windows if has_forward_slash => Err(Error::SeparatorMismatch {
            line,
            path: path.to_string(),
            detail: "forward slashes (/) but script targets Windows (use \\)",
        }),
        TargetOs::Linux if has_backslash => Err(Error::SeparatorMismatch {
            line,
            path: path.to_string(),
            detail: "backslashes (\\) but script targets Linux (use /)",
        }),
        _ => Ok(()),
    }
}

/// Extracts the executable name from a command line: first whitespace-
/// delimited word, `@` prefix stripped, reduced to its basename, lowercased,
/// with `.exe`/`.bat`/`.sh` suffixes removed. Returns `None` for blank
/// lines, comments, variable assignments, variable references, and shell
/// builtins.
pub fn executable_name(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty()
        || line.starts_with('#')
        || line.starts_with("REM")
        || line.starts_with("rem")
    {
        return None;
    }

    let command = line.split_whitespace().next()?;
    if command.contains('=') {
        return None; // VAR=value
    }

    let command = command.strip_prefix('@').unwrap_or(command);
    let command = match command.rfind(['/', '\\']) {
        Some(index) => &command[index + 1..],
        None => command,
    };
    if command.starts_with('$') || command.starts_with('%') {
        return None;
    }

    let lowered = command.to_lowercase();
    if SHELL_BUILTINS.contains(&lowered.as_str()) {
        return None;
    }

    let mut name = lowered.as_str();
    for suffix in [".exe", ".bat", ".sh"] {
        name = name.strip_suffix(suffix).unwrap_or(name);
    }
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Executables invoked per script, deduplicated, consumed once by the
/// parity check after all scripts are processed.
#[derive(Debug, Default)]
pub struct ExecutableRegistry {
    by_script: BTreeMap<String, BTreeSet<String>>,
}

impl ExecutableRegistry {
    /// Records the executable of `line` against `script`, if any.
    pub fn track(&mut self, script: &str, line: &str) {
        if let Some(name) = executable_name(line) {
            self.by_script
                .entry(script.to_string())
                .or_default()
                .insert(name);
        }
    }

    pub fn executables(&self, script: &str) -> BTreeSet<String> {
        self.by_script.get(script).cloned().unwrap_or_default()
    }

    /// Union of tracked executables across the given scripts.
    pub fn union<'a>(&self, scripts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut all = BTreeSet::new();
        for script in scripts {
            if let Some(names) = self.by_script.get(script) {
                all.extend(names.iter().cloned());
            }
        }
        all
    }
}
