// Console logger - `log` backend writing to stderr

use std::io::Write;
use std::sync::OnceLock;

pub struct ConsoleLogger {
    level: log::LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: log::LevelFilter) -> Self {
        Self { level }
    }

    fn format(record: &log::Record) -> String {
        format!("{}:{} -- {}", record.level(), record.target(), record.args())
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // stderr keeps the console prompt on stdout readable
        let _ = writeln!(std::io::stderr().lock(), "{}", Self::format(record));
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static GLOBAL_LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Install the console logger (first call wins)
pub fn init(level: log::LevelFilter) {
    let logger = GLOBAL_LOGGER.get_or_init(|| ConsoleLogger::new(level));
    if log::set_logger(logger).is_err() {
        log::debug!("Logger already installed");
    }
    log::set_max_level(level);
}
