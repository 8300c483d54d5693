/// Projection parameters and clip ranges

use glam::Mat4;
use crate::error::{Error, Result};

/// Near/far clip distances of a perspective or shadow projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub near: f32,
    pub far: f32,
}

impl ClipRange {
    /// # Errors
    ///
    /// `InvalidConfig` when `near <= 0` or `far <= near`.
    pub fn new(near: f32, far: f32) -> Result<Self> {
        let range = Self { near, far };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.near > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "Near clip distance must be > 0 (got {})",
                self.near
            )));
        }
        if !(self.far > self.near) {
            return Err(Error::InvalidConfig(format!(
                "Far clip distance {} must exceed near clip distance {}",
                self.far, self.near
            )));
        }
        Ok(())
    }

    pub fn as_array(&self) -> [f32; 2] {
        [self.near, self.far]
    }
}

/// Projection description
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        clip: ClipRange,
    },
    /// Symmetric box of half-size `extent` on every axis
    Orthographic {
        extent: f32,
    },
}

impl Projection {
    /// 90° square perspective shared by the six faces of an omnidirectional light
    pub fn cube_face(clip: ClipRange) -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
            clip,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Projection::Perspective { fov_y, aspect, clip } => {
                if !(*fov_y > 0.0 && *fov_y < std::f32::consts::PI) {
                    return Err(Error::InvalidConfig(format!("Field of view {} out of range", fov_y)));
                }
                if !(*aspect > 0.0) {
                    return Err(Error::InvalidConfig(format!("Aspect ratio {} must be > 0", aspect)));
                }
                clip.validate()
            }
            Projection::Orthographic { extent } => {
                if !(*extent > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "Orthographic extent {} must be > 0",
                        extent
                    )));
                }
                Ok(())
            }
        }
    }

    /// Near/far pair passed to shaders for depth normalization
    pub fn clip_near_far(&self) -> [f32; 2] {
        match self {
            Projection::Perspective { clip, .. } => clip.as_array(),
            Projection::Orthographic { extent } => [-extent, *extent],
        }
    }

    /// OpenGL-convention matrix (clip z in -1..1)
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, clip } => {
                Mat4::perspective_rh_gl(fov_y, aspect, clip.near, clip.far)
            }
            Projection::Orthographic { extent } => {
                Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, -extent, extent)
            }
        }
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
