//! Console logger with status brackets.
//!
//! Renders `log` records the way a boot console does:
//!
//! ```text
//! [ OK ] worker-2 placed on level 1 [total: 3/4]
//! [WARN] ...
//! ```

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Environment key for the maximum log level.
pub const ENV_LOG: &str = "ASCENT_LOG";

/// Console status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success - `[ OK ]`
    Ok,
    /// Failure - `[FAIL]`
    Fail,
    /// Warning - `[WARN]`
    Warn,
    /// Informational - `[INFO]`
    Info,
}

impl Status {
    fn bracket(self) -> &'static str {
        match self {
            Status::Ok => "[ OK ]",
            Status::Fail => "[FAIL]",
            Status::Warn => "[WARN]",
            Status::Info => "[INFO]",
        }
    }
}

/// Logger writing one status line per record to stdout (errors to stderr).
#[derive(Debug)]
pub struct ConsoleLogger {
    max_level: LevelFilter,
}

impl ConsoleLogger {
    /// Create a logger that passes records up to `max_level`.
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Install a logger as the global `log` backend.
    pub fn install(max_level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(max_level)))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Format a record as a single status line.
    pub fn format(record: &Record<'_>) -> String {
        let status = status_for(record);
        if record.level() <= Level::Info {
            format!("{} {}", status.bracket(), record.args())
        } else {
            // debug and trace are indented under the status column
            format!("       {}", record.args())
        }
    }
}

/// Parse a level name such as `debug`; unknown names fall back to `info`.
pub fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn status_for(record: &Record<'_>) -> Status {
    match record.level() {
        Level::Error => Status::Fail,
        Level::Warn => Status::Warn,
        Level::Info if record.target().starts_with("ascent::events") => Status::Ok,
        _ => Status::Info,
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        // a closed stdout must not take a worker down with it
        let _ = if record.level() == Level::Error {
            writeln!(std::io::stderr().lock(), "{}", line)
        } else {
            writeln!(std::io::stdout().lock(), "{}", line)
        };
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}
