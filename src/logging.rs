//! Logger setup for the binaries

use flexi_logger::{opt_format, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle};

use crate::config::AppConfig;

/// Start logging. `RUST_LOG` wins over the configured level.
///
/// With `log_file` set, records go to that file and info-and-above are
/// duplicated to stderr; otherwise everything goes to stderr. Keep the
/// returned handle alive for the whole run.
pub fn init_logging(config: &AppConfig) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(&config.log_level)?.format(opt_format);

    let logger = match &config.log_file {
        Some(path) => logger
            .log_to_file(FileSpec::try_from(path)?)
            .append()
            .duplicate_to_stderr(Duplicate::Info),
        None => logger.log_to_stderr(),
    };
    logger.start()
}
