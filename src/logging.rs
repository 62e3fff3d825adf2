use flexi_logger::{DeferredNow, FileSpec, Logger, LoggerHandle};
use std::path::Path;

/// Start the process-wide logger
///
/// `level` takes a flexi_logger spec such as `info` or
/// `warn,queue_relay::queue=debug`. Logs go to stderr unless `log_file` is
/// given. Keep the returned handle alive until the program exits.
pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
) -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    let mut logger = Logger::try_with_str(level)?.format(thread_format);

    if let Some(path) = log_file {
        logger = logger.log_to_file(FileSpec::try_from(path)?);
    }

    logger.start()
}

// "HH:MM:SS.mmm INF [producer-P1] message"
fn thread_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let level_abbr = match record.level() {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    };

    write!(
        w,
        "{} {} [{}] {}",
        now.format("%H:%M:%S%.3f"),
        level_abbr,
        std::thread::current().name().unwrap_or("main"),
        record.args()
    )
}
