//! Unit tests for log.rs
//!
//! Macro tests swap the global logger and are therefore #[serial].

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::shadowcast3d::{Engine, Error};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

struct CapturingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CapturingLogger { entries: entries.clone() });
    Engine::set_min_severity(LogSeverity::Trace);
    entries
}

// ============================================================================
// SEVERITY
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Warn.label().trim(), "WARN");
}

// ============================================================================
// DEFAULT LOGGER
// ============================================================================

#[test]
fn test_default_logger_handles_plain_and_detailed_entries() {
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "shadowcast3d::ShadowScene".to_string(),
        message: "Scene loaded".to_string(),
        file: None,
        line: None,
    });
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "shadowcast3d::ShadowScene".to_string(),
        message: "Missing node".to_string(),
        file: Some("scene.rs"),
        line: Some(42),
    });
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
#[serial]
fn test_engine_error_macro_records_file_and_line() {
    let entries = capture();
    crate::engine_error!("shadowcast3d::Test", "boom {}", 7);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].message, "boom 7");
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
}

#[test]
#[serial]
fn test_engine_err_macro_logs_and_builds_backend_error() {
    let entries = capture();
    let err = crate::engine_err!("shadowcast3d::Test", "lost {}", "device");
    Engine::reset_logger();

    assert_eq!(err, Error::BackendError("lost device".to_string()));
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_engine_bail_macro_returns_early() {
    let entries = capture();
    fn failing() -> crate::error::Result<u32> {
        crate::engine_bail!("shadowcast3d::Test", "nope");
    }
    let result = failing();
    Engine::reset_logger();

    assert!(matches!(result, Err(Error::BackendError(ref m)) if m == "nope"));
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_engine_fail_macro_keeps_typed_error() {
    let entries = capture();
    let err = crate::engine_fail!(
        "shadowcast3d::Test",
        Error::InvalidConfig("zero resolution".to_string())
    );
    Engine::reset_logger();

    assert!(matches!(err, Error::InvalidConfig(_)));
    let entries = entries.lock().unwrap();
    assert!(entries[0].message.contains("zero resolution"));
}

#[test]
#[serial]
fn test_min_severity_filters_lower_levels() {
    let entries = capture();
    Engine::set_min_severity(LogSeverity::Warn);
    crate::engine_trace!("shadowcast3d::Test", "dropped");
    crate::engine_info!("shadowcast3d::Test", "dropped too");
    crate::engine_warn!("shadowcast3d::Test", "kept");
    Engine::set_min_severity(LogSeverity::Trace);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "kept");
}
