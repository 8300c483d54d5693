//! Internal logging system for the Shadowcast3D engine
//!
//! - Pluggable logger via the [`Logger`] trait
//! - Severity levels with a global minimum threshold (see `Engine::set_min_severity`)
//! - Colored console output by default
//! - File and line information on ERROR entries

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use shadowcast_3d_engine::shadowcast3d::log::{Logger, LogEntry};
///
/// struct FrameCounterLogger;
///
/// impl Logger for FrameCounterLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{} {}", entry.severity.label(), entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// Log entry handed to the active [`Logger`]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    /// Timestamp when the entry was created
    pub timestamp: SystemTime,

    /// Emitting component (e.g. "shadowcast3d::ShadowMapGenerator")
    pub source: String,

    pub message: String,

    /// Source file (only for detailed ERROR entries)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR entries)
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-pass and per-frame detail
    Trace,
    Debug,
    /// Lifecycle events (load, begin, end, unload)
    Info,
    /// Recoverable oddities (a texture stream failed, placeholder kept)
    Warn,
    /// Fatal errors, logged once where they are created
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by [`DefaultLogger`]
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Console logger with colored severities
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    fn format_timestamp(timestamp: SystemTime) -> String {
        let datetime: DateTime<Local> = timestamp.into();
        datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let timestamp = Self::format_timestamp(entry.timestamp);

        let label = entry.severity.label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            ),
            _ => println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message),
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!("shadowcast3d::ShadowMapGenerator", "Cube face {:?} rendered", face);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::shadowcast3d::Engine::log(
            $crate::shadowcast3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::shadowcast3d::Engine::log(
            $crate::shadowcast3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::shadowcast3d::Engine::log(
            $crate::shadowcast3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::shadowcast3d::Engine::log(
            $crate::shadowcast3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::shadowcast3d::Engine::log_detailed(
            $crate::shadowcast3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and evaluate to `Error::BackendError` carrying the same message
///
/// ```ignore
/// return Err(engine_err!("shadowcast3d::RecordingDevice", "Unknown texture '{}'", name));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::shadowcast3d::Engine::log_detailed(
            $crate::shadowcast3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::shadowcast3d::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with `Err(Error::BackendError(..))`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an already-built [`Error`](crate::error::Error) and hand it back
///
/// Keeps the "log once where created" rule for typed errors.
#[macro_export]
macro_rules! engine_fail {
    ($source:expr, $error:expr) => {{
        let error = $error;
        $crate::shadowcast3d::Engine::log_detailed(
            $crate::shadowcast3d::log::LogSeverity::Error,
            $source,
            error.to_string(),
            file!(),
            line!()
        );
        error
    }};
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
