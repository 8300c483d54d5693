//! Unit tests for the Engine singleton manager
//!
//! Tests initialization, the graphics device registry and the logging APIs.
//!
//! IMPORTANT: ENGINE_STATE and LOGGER are global and shared by every test.
//! All tests are marked with #[serial] to run sequentially.

use crate::shadowcast3d::{Engine, Error};
use crate::shadowcast3d::log::{Logger, LogEntry, LogSeverity};
use crate::graphics_device::{DeviceConfig, GraphicsDevice, RecordingGraphicsDevice};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<(LogSeverity, String)>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

fn device() -> RecordingGraphicsDevice {
    RecordingGraphicsDevice::new(DeviceConfig::default())
}

fn setup() {
    Engine::reset_for_testing();
    Engine::reset_logger();
    let _ = Engine::initialize();
}

// ============================================================================
// INITIALIZATION AND SHUTDOWN TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_initialize_is_idempotent() {
    setup();
    assert!(Engine::initialize().is_ok());
    assert!(Engine::initialize().is_ok());
}

#[test]
#[serial]
fn test_shutdown_clears_devices() {
    setup();
    Engine::create_graphics_device("test_shutdown_a", device()).unwrap();
    Engine::create_graphics_device("test_shutdown_b", device()).unwrap();
    assert_eq!(Engine::graphics_device_count(), 2);

    Engine::shutdown();
    assert_eq!(Engine::graphics_device_count(), 0);

    Engine::initialize().unwrap();
}

#[test]
#[serial]
fn test_shutdown_idempotent() {
    setup();
    Engine::shutdown();
    Engine::shutdown();
    Engine::initialize().unwrap();
    assert_eq!(Engine::graphics_device_count(), 0);
}

// ============================================================================
// GRAPHICS DEVICE REGISTRY TESTS
// ============================================================================

#[test]
#[serial]
fn test_create_graphics_device_success() {
    setup();
    let created = Engine::create_graphics_device("test_create", device()).unwrap();
    let fetched = Engine::graphics_device("test_create").unwrap();
    assert!(Arc::ptr_eq(&created, &fetched));
}

#[test]
#[serial]
fn test_create_graphics_device_duplicate_name_fails() {
    setup();
    Engine::create_graphics_device("test_duplicate", device()).unwrap();

    let result = Engine::create_graphics_device("test_duplicate", device());
    match result {
        Err(Error::InitializationFailed(message)) => assert!(message.contains("already exists")),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("duplicate name accepted"),
    }
}

#[test]
#[serial]
fn test_graphics_device_not_found_fails() {
    setup();
    let result = Engine::graphics_device("test_missing");
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[serial]
fn test_destroy_graphics_device() {
    setup();
    Engine::create_graphics_device("test_destroy", device()).unwrap();
    Engine::destroy_graphics_device("test_destroy").unwrap();
    assert!(Engine::graphics_device("test_destroy").is_err());

    // Unknown names are ignored
    assert!(Engine::destroy_graphics_device("test_destroy").is_ok());
}

#[test]
#[serial]
fn test_registered_device_is_usable() {
    setup();
    let device = Engine::create_graphics_device("test_usable", device()).unwrap();
    let guard = device.lock().unwrap();
    assert_eq!(guard.presentation_framebuffer().width(), DeviceConfig::default().surface_width);
    assert_eq!(guard.stats().resource_count(), 0);
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_errors() {
    setup();
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let _ = Engine::graphics_device("test_unknown_for_log");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, LogSeverity::Error);
    assert!(entries[0].1.contains("test_unknown_for_log"));
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_min_severity_filters_entries() {
    setup();
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);
    Engine::set_min_severity(LogSeverity::Warn);

    Engine::log(LogSeverity::Info, "shadowcast3d::Test", "dropped".to_string());
    Engine::log(LogSeverity::Warn, "shadowcast3d::Test", "kept".to_string());

    let messages: Vec<String> = entries.lock().unwrap().iter().map(|(_, m)| m.clone()).collect();
    assert_eq!(messages, vec!["kept".to_string()]);
    assert_eq!(Engine::min_severity(), LogSeverity::Warn);

    Engine::set_min_severity(LogSeverity::Trace);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_detailed_carries_location() {
    setup();
    let captured: Arc<Mutex<Option<(Option<&'static str>, Option<u32>)>>> = Arc::new(Mutex::new(None));

    struct LocationLogger(Arc<Mutex<Option<(Option<&'static str>, Option<u32>)>>>);
    impl Logger for LocationLogger {
        fn log(&self, entry: &LogEntry) {
            *self.0.lock().unwrap() = Some((entry.file, entry.line));
        }
    }

    Engine::set_logger(LocationLogger(captured.clone()));
    Engine::log_detailed(LogSeverity::Error, "shadowcast3d::Test", "boom".to_string(), "scene.rs", 42);

    assert_eq!(*captured.lock().unwrap(), Some((Some("scene.rs"), Some(42))));
    Engine::reset_logger();
}
