//! Path separator conversion and referenced-path existence checks.
//!
//! Every filesystem lookup depends on the conversion rule, so it is
//! determined once per script before any check runs and threaded through as
//! a value rather than held in shared state.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Error;
use crate::logger::Logger;

/// Operating system a script is written for, as declared in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Linux,
}

impl TargetOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Windows => "windows",
            TargetOs::Linux => "linux",
        }
    }
}

/// Separator substitution applied to script paths before filesystem lookups.
///
/// Both fields are empty when the target OS matches the running OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub from: &'static str,
    pub to: &'static str,
}

impl Conversion {
    pub const NONE: Conversion = Conversion { from: "", to: "" };

    pub fn is_noop(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }

    /// Substitutes the separator; returns the value unchanged for a no-op rule.
    pub fn apply(&self, value: &str) -> String {
        if self.is_noop() {
            value.to_string()
        } else {
            value.replace(self.from, self.to)
        }
    }
}

/// Validates `target_os` and derives the separator conversion against the
/// running OS. Pure; `running_os` is injected so tests can pin it.
pub fn determine_conversion(
    target_os: &str,
    script: &str,
    running_os: &str,
) -> Result<(TargetOs, Conversion), Error> {
    let target = match target_os {
        "windows" => TargetOs::Windows,
        "linux" => TargetOs::Linux,
        other => {
            return Err(Error::InvalidTargetOs {
                script: script.to_string(),
                value: other.to_string(),
            })
        }
    };

    let conversion = match target {
        TargetOs::Windows if running_os != "windows" => Conversion {
            from: "\\",
            to: "/",
        },
        TargetOs::Linux if running_os == "windows" => Conversion {
            from: "/",
            to: "\\",
        },
        _ => Conversion::NONE,
    };

    Ok((target, conversion))
}

/// Checks that every extracted path of `label` exists under `root`, in line
/// order, and emits a one-line summary at the end.
pub fn check_referenced_paths(
    label: &str,
    lines: &BTreeMap<usize, String>,
    root: &Path,
    conversion: &Conversion,
    log: &Logger,
) {
    log.debug("checking file paths for '{s}'", &[("s", &label)]);

    if lines.is_empty() {
        log.info("No paths to check for '{s}'", &[("s", &label)]);
        return;
    }

    let mut all_exist = true;
    for (line_no, path) in lines {
        if file_exists(path, root, conversion, log) {
            log.info(
                "'{s}' line '{ln}' is valid: file path '{fp}' exists",
                &[("s", &label), ("ln", line_no), ("fp", &path)],
            );
        } else {
            log.error(
                "'{s}' line '{ln}' is invalid: '{fp}' not found on file system",
                &[("s", &label), ("ln", line_no), ("fp", &path)],
            );
            all_exist = false;
        }
    }

    if all_exist {
        log.info(
            "All file paths referenced in '{s}' exist on the file system",
            &[("s", &label)],
        );
    }
}

fn file_exists(path: &str, root: &Path, conversion: &Conversion, log: &Logger) -> bool {
    let localized = conversion.apply(path);
    let full = root.join(localized);
    let shown = full.display().to_string();
    log.debug("fullPath: '{f}'", &[("f", &shown)]);
    full.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;
    use std::fs;
    use tempfile::tempdir;

    fn quiet() -> Logger {
        Logger::new(LogLevel::Error, None).unwrap()
    }

    #[test]
    fn test_conversion_windows_target_on_linux() {
        let (target, conv) = determine_conversion("windows", "deploy.bat", "linux").unwrap();
        assert_eq!(target, TargetOs::Windows);
        assert_eq!(conv.from, "\\");
        assert_eq!(conv.to, "/");
    }

    #[test]
    fn test_conversion_linux_target_on_windows() {
        let (target, conv) = determine_conversion("linux", "deploy.sh", "windows").unwrap();
        assert_eq!(target, TargetOs::Linux);
        assert_eq!(conv.from, "/");
        assert_eq!(conv.to, "\\");
    }

    #[test]
    fn test_conversion_is_noop_on_matching_os() {
        let (_, conv) = determine_conversion("linux", "deploy.sh", "linux").unwrap();
        assert!(conv.from.is_empty() && conv.to.is_empty());
        assert!(conv.is_noop());
        assert_eq!(conv.apply(r"a\b/c"), r"a\b/c");
    }

    #[test]
    fn test_invalid_target_os_names_script_and_value() {
        let err = determine_conversion("macos", "deploy.command", "linux").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("deploy.command"));
        assert!(msg.contains("macos"));
        assert!(msg.contains("must be 'linux' or 'windows'"));
    }

    #[test]
    fn test_apply_substitutes_every_separator() {
        let conv = Conversion {
            from: "\\",
            to: "/",
        };
        assert_eq!(conv.apply(r"a\b\c.xml"), "a/b/c.xml");
    }

    #[test]
    fn test_existence_check_with_conversion() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/data.xml"), "<x/>").unwrap();
        let conv = Conversion {
            from: "\\",
            to: "/",
        };
        let log = quiet();
        assert!(file_exists(r"config\data.xml", dir.path(), &conv, &log));
        assert!(!file_exists(r"config\missing.xml", dir.path(), &conv, &log));
    }
}
