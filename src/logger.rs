//! Leveled logging collaborator used by every check.
//!
//! Messages are template strings with `{name}` placeholders filled from a
//! key/value argument slice; the engine never formats report lines itself.
//! Three severities are level-gated (`error` is always emitted, `info` at
//! info/debug verbosity, `debug` only at debug verbosity) and two structural
//! helpers are unconditional: `separate` prints a bare rule line, `heading`
//! a timestamped section marker. Output goes to stdout and, when a logfile
//! is configured, is appended there as plain text (no colors).

use chrono::Local;
use owo_colors::OwoColorize;
use std::cell::RefCell;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{name}")
    }
}

/// Alternating key/value pairs substituted into `{key}` placeholders.
pub type Args<'a> = &'a [(&'a str, &'a dyn Display)];

pub struct Logger {
    level: LogLevel,
    file: Option<RefCell<File>>,
    color: bool,
}

impl Logger {
    /// Opens the logger, appending to `logfile` when one is given.
    pub fn new(level: LogLevel, logfile: Option<&Path>) -> std::io::Result<Logger> {
        let file = match logfile {
            Some(path) => {
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                Some(RefCell::new(f))
            }
            None => None,
        };
        Ok(Logger {
            level,
            file,
            color: std::env::var_os("NO_COLOR").is_none(),
        })
    }

    /// Always emitted regardless of level.
    pub fn error(&self, template: &str, args: Args) {
        let msg = format_template(template, args);
        if self.color {
            println!("{} {}", "ERROR:".red().bold(), msg);
        } else {
            println!("ERROR: {msg}");
        }
        self.to_file(&format!("ERROR: {msg}"));
    }

    /// Emitted at info and debug verbosity.
    pub fn info(&self, template: &str, args: Args) {
        if self.level < LogLevel::Info {
            return;
        }
        let msg = format_template(template, args);
        println!("INFO: {msg}");
        self.to_file(&format!("INFO: {msg}"));
    }

    /// Emitted only at debug verbosity.
    pub fn debug(&self, template: &str, args: Args) {
        if self.level < LogLevel::Debug {
            return;
        }
        let msg = format_template(template, args);
        println!("DEBUG: {msg}");
        self.to_file(&format!("DEBUG: {msg}"));
    }

    /// Rule line without prefix. Always emitted.
    pub fn separate(&self, template: &str, args: Args) {
        let msg = format_template(template, args);
        println!("{msg}");
        self.to_file(&msg);
    }

    /// Timestamped section marker. Always emitted.
    pub fn heading(&self, template: &str, args: Args) {
        let msg = format_template(template, args);
        let stamp = Local::now().format("%Y/%m/%d %H:%M:%S");
        println!("{stamp} {msg}");
        self.to_file(&format!("{stamp} {msg}"));
    }

    fn to_file(&self, line: &str) {
        if let Some(file) = &self.file {
            // a failing sink must not abort the run
            let _ = writeln!(file.borrow_mut(), "{line}");
        }
    }
}

/// Replaces every `{key}` placeholder with the corresponding value.
fn format_template(template: &str, args: Args) -> String {
    let mut out = template.to_string();
    for (key, value) in args {
        out = out.replace(&format!("{{{key}}}"), &value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_template_substitution() {
        let msg = format_template(
            "'{f}' line '{ln}' is invalid",
            &[("f", &"deploy.bat"), ("ln", &12usize)],
        );
        assert_eq!(msg, "'deploy.bat' line '12' is invalid");
    }

    #[test]
    fn test_template_without_args_is_unchanged() {
        assert_eq!(format_template("SCRIPT SYNTAX CHECK", &[]), "SCRIPT SYNTAX CHECK");
    }

    #[test]
    fn test_repeated_placeholder_is_replaced_everywhere() {
        let msg = format_template("{x} and {x}", &[("x", &"a")]);
        assert_eq!(msg, "a and a");
    }

    #[test]
    fn test_level_gating_in_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = Logger::new(LogLevel::Info, Some(&path)).unwrap();
        log.error("e1", &[]);
        log.info("i1", &[]);
        log.debug("d1", &[]);
        log.separate("---", &[]);
        drop(log);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ERROR: e1"));
        assert!(text.contains("INFO: i1"));
        assert!(!text.contains("d1"));
        assert!(text.contains("---"));
    }

    #[test]
    fn test_error_level_suppresses_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = Logger::new(LogLevel::Error, Some(&path)).unwrap();
        log.info("i1", &[]);
        log.error("e1", &[]);
        drop(log);
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("i1"));
        assert!(text.contains("e1"));
    }

    #[test]
    fn test_heading_carries_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let log = Logger::new(LogLevel::Error, Some(&path)).unwrap();
        log.heading("MARK", &[]);
        drop(log);
        let text = fs::read_to_string(&path).unwrap();
        let line = text.lines().next().unwrap();
        assert!(line.ends_with("MARK"));
        // yyyy/mm/dd hh:mm:ss prefix
        assert!(line.len() > "MARK".len() + 19);
    }
}
