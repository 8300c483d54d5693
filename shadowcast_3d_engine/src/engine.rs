/// Shadowcast3D Engine - global services shared by every scene
///
/// Holds the pluggable logger and a name-keyed registry of graphics devices.
/// Scene state is never stored here: each `ShadowScene` owns its own aggregate.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use rustc_hash::FxHashMap;
use crate::graphics_device::GraphicsDevice;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger (stored as the enum index)
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(LogSeverity::Trace as u8);

struct EngineState {
    devices: RwLock<FxHashMap<String, Arc<Mutex<dyn GraphicsDevice>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            devices: RwLock::new(FxHashMap::default()),
        }
    }
}

fn severity_from_index(index: u8) -> LogSeverity {
    match index {
        0 => LogSeverity::Trace,
        1 => LogSeverity::Debug,
        2 => LogSeverity::Info,
        3 => LogSeverity::Warn,
        _ => LogSeverity::Error,
    }
}

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// # Example
///
/// ```no_run
/// use shadowcast_3d_engine::shadowcast3d::Engine;
/// use shadowcast_3d_engine::shadowcast3d::render::{RecordingGraphicsDevice, DeviceConfig};
///
/// Engine::initialize()?;
/// let device = Engine::create_graphics_device("main", RecordingGraphicsDevice::new(DeviceConfig::default()))?;
/// // ... hand `device` to a ShadowScene ...
/// Engine::shutdown();
/// # Ok::<(), shadowcast_3d_engine::shadowcast3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    fn log_and_return_error(error: Error) -> Error {
        crate::engine_error!("shadowcast3d::Engine", "{}", error);
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| Self::log_and_return_error(
            Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
        ))
    }

    /// Initialize the engine (idempotent)
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop every registered graphics device
    ///
    /// Devices still referenced by a scene stay alive until that scene is dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut devices) = state.devices.write() {
                devices.clear();
            }
        }
    }

    // ===== GRAPHICS DEVICE REGISTRY =====

    /// Wrap `device` and register it under `name`
    ///
    /// # Errors
    ///
    /// Engine not initialized, name already taken, or lock poisoned.
    pub fn create_graphics_device<D: GraphicsDevice + 'static>(
        name: &str,
        device: D,
    ) -> Result<Arc<Mutex<dyn GraphicsDevice>>> {
        let device: Arc<Mutex<dyn GraphicsDevice>> = Arc::new(Mutex::new(device));
        let state = Self::state()?;

        let mut devices = state.devices.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice registry lock poisoned".to_string())
            ))?;

        if devices.contains_key(name) {
            return Err(Self::log_and_return_error(Error::InitializationFailed(format!(
                "GraphicsDevice '{}' already exists. Call Engine::destroy_graphics_device() first.",
                name
            ))));
        }

        devices.insert(name.to_string(), device.clone());
        crate::engine_info!("shadowcast3d::Engine", "GraphicsDevice '{}' created", name);
        Ok(device)
    }

    /// Look up a registered graphics device
    pub fn graphics_device(name: &str) -> Result<Arc<Mutex<dyn GraphicsDevice>>> {
        let state = Self::state()?;
        let devices = state.devices.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice registry lock poisoned".to_string())
            ))?;

        devices.get(name).cloned().ok_or_else(|| Self::log_and_return_error(
            Error::InitializationFailed(format!("GraphicsDevice '{}' not found", name))
        ))
    }

    /// Unregister a graphics device; unknown names are ignored
    pub fn destroy_graphics_device(name: &str) -> Result<()> {
        let state = Self::state()?;
        let mut devices = state.devices.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice registry lock poisoned".to_string())
            ))?;

        if devices.remove(name).is_some() {
            crate::engine_info!("shadowcast3d::Engine", "GraphicsDevice '{}' destroyed", name);
        }
        Ok(())
    }

    pub fn graphics_device_count() -> usize {
        ENGINE_STATE
            .get()
            .and_then(|state| state.devices.read().ok().map(|devices| devices.len()))
            .unwrap_or(0)
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        MIN_SEVERITY.store(LogSeverity::Trace as u8, Ordering::Relaxed);
    }

    // ===== LOGGING API =====

    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to [`DefaultLogger`]
    pub fn reset_logger() {
        Self::set_logger(DefaultLogger);
    }

    /// Drop every entry below `severity` before it reaches the logger
    pub fn set_min_severity(severity: LogSeverity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> LogSeverity {
        severity_from_index(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    fn dispatch(entry: LogEntry) {
        if entry.severity < Self::min_severity() {
            return;
        }
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&entry);
        }
    }

    /// Logging entry point used by engine_trace!/debug!/info!/warn!
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Logging entry point with file:line, used by engine_error!/err!/bail!
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
