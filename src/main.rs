//! Deploycheck binary entry point.
//!
//! Loads the configuration, wires up the logger, and hands off to the
//! reconciliation engine. Only setup failures affect the exit status;
//! reconciliation findings are reported through the log.

use clap::Parser;

use deploycheck::cli::Cli;
use deploycheck::config;
use deploycheck::engine;
use deploycheck::logger::Logger;

fn main() {
    let cli = Cli::parse();

    let params = match config::load_parameters(&cli.config) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let log = match Logger::new(cli.log_level, params.logfile_path()) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("failed to open log file: {err}");
            std::process::exit(1);
        }
    };

    engine::run(&params, &log);
}
