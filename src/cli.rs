//! CLI argument parsing via `clap`.

use clap::Parser;
use std::path::PathBuf;

use crate::logger::LogLevel;

#[derive(Parser)]
#[command(
    name = "deploycheck",
    version,
    about = "Validate deployment script pairs against a source repository",
    long_about = "Deploycheck cross-checks Windows/Linux deployment script variants against the repository they deploy: every referenced path must exist on disk, every repository file must be referenced, path separators must match the declared target OS, and both script variants must invoke the same external utilities.\n\nAll findings are reported through the log; the process exits non-zero only on configuration errors.",
    after_help = "Examples:\n  deploycheck\n  deploycheck -c deploy-validation.yaml\n  deploycheck -c config.yaml -l debug"
)]
/// Top-level CLI options.
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Logging verbosity
    #[arg(short = 'l', long = "log-level", value_enum, default_value_t = LogLevel::Error)]
    pub log_level: LogLevel,
}
