//! File logging for Fertilikey
//!
//! The terminal UI owns stdout, so diagnostics go to a log file instead.
//! Nothing here ever fails loudly: if the file cannot be opened, logging
//! silently becomes a no-op.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global logger instance
static LOGGER: OnceLock<Mutex<FertilikeyLogger>> = OnceLock::new();

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "fertilikey.log";

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `pad` so that `{:5}` aligns the columns
        f.pad(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

impl LogLevel {
    /// Parse a level name as accepted on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Main logger struct
pub struct FertilikeyLogger {
    file: Option<File>,
    min_level: LogLevel,
}

impl FertilikeyLogger {
    fn new(path: &Path, min_level: LogLevel) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok();

        Self { file, min_level }
    }

    fn log(&mut self, level: LogLevel, module: &str, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = format_entry(level, module, message);

        if let Some(ref mut file) = self.file {
            let _ = file.write_all(entry.as_bytes());
            let _ = file.flush();
        }
    }
}

/// Format one log line: `[timestamp] [LEVEL] [module] message`
fn format_entry(level: LogLevel, module: &str, message: &str) -> String {
    format!(
        "[{}] [{:5}] [{}] {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level,
        module,
        message
    )
}

/// Resolve the log path: explicit path wins, else the working directory.
pub fn default_log_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Initialize the global logger. Later calls are ignored.
pub fn init(path: &Path, min_level: LogLevel) {
    let _ = LOGGER.set(Mutex::new(FertilikeyLogger::new(path, min_level)));
}

fn log(level: LogLevel, module: &str, message: &str) {
    if let Some(logger) = LOGGER.get() {
        logger.lock().log(level, module, message);
    }
}

/// Log debug message
pub fn debug(module: &str, message: &str) {
    log(LogLevel::Debug, module, message);
}

/// Log info message
pub fn info(module: &str, message: &str) {
    log(LogLevel::Info, module, message);
}

/// Log warning message
pub fn warn(module: &str, message: &str) {
    log(LogLevel::Warn, module, message);
}

/// Log error message
pub fn error(module: &str, message: &str) {
    log(LogLevel::Error, module, message);
}

/// Write a separator line for readability
pub fn separator(label: &str) {
    let msg = format!("========== {} ==========", label);
    info("---", &msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_has_level_and_module() {
        let line = format_entry(LogLevel::Warn, "STORE", "no data");
        assert!(line.contains("[WARN ] [STORE] no data"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn logging_before_init_is_a_noop() {
        // Must not panic even though no logger may be installed.
        debug("TEST", "ignored");
    }
}
