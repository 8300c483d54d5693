//! Error types for the Shadowcast3D engine
//!
//! One enum covers the whole core: asset loading, scene integrity checks,
//! shader program creation, lifecycle misuse, configuration validation and
//! device-level failures reported by a graphics backend.

use std::fmt;
use crate::scene::SceneRole;

/// Result type for Shadowcast3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shader stage a compile diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Shadowcast3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An asset (scene description, shader text, image) could not be fetched or parsed
    ResourceLoad {
        resource: String,
        reason: String,
    },

    /// A node required by the scene layout is absent from the scene description
    SceneIntegrity {
        role: SceneRole,
    },

    /// A shader stage failed to compile
    ShaderCompile {
        program: String,
        stage: ShaderStage,
        diagnostic: String,
    },

    /// A shader program failed to link or does not expose its declared interface
    ShaderLink {
        program: String,
        diagnostic: String,
    },

    /// Lifecycle misuse (rendering before load, double load, ...)
    RuntimeState(String),

    /// Rejected configuration value
    InvalidConfig(String),

    /// Backend-specific error
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, framebuffer, ...)
    InvalidResource(String),

    /// Initialization failed (engine, device registry, subsystems)
    InitializationFailed(String),
}

impl Error {
    /// Build a `ResourceLoad` error from anything printable
    pub fn resource_load(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::ResourceLoad {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceLoad { resource, reason } => {
                write!(f, "Failed to load '{}': {}", resource, reason)
            }
            Error::SceneIntegrity { role } => write!(
                f,
                "Scene integrity error: missing node '{}' for role {:?}",
                role.source_name(),
                role
            ),
            Error::ShaderCompile { program, stage, diagnostic } => {
                write!(f, "{}: {} shader compile error: {}", program, stage, diagnostic)
            }
            Error::ShaderLink { program, diagnostic } => {
                write!(f, "{}: program link error: {}", program, diagnostic)
            }
            Error::RuntimeState(msg) => write!(f, "Runtime state error: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
