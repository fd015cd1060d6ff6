//! Shared entry point for the binaries: load config, start logging, run, report

use std::path::PathBuf;
use std::process::ExitCode;

use log::error;

use crate::config::AppConfig;
use crate::logging::init_logging;
use crate::pipeline;
use crate::sources::EpgSource;

/// Run one source end to end.
///
/// `setup` picks the source and output path from the loaded config. Prints the
/// run summary on success; on failure prints the error and exits with status 1.
pub fn main_with<S, F>(setup: F) -> ExitCode
where
    S: EpgSource,
    F: FnOnce(&AppConfig) -> (S, PathBuf),
{
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logger = match init_logging(&config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let (source, output) = setup(&config);
    match pipeline::run(&source, &output) {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} run failed: {}", source.name(), e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
