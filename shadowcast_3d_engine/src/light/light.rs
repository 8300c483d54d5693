/// Light sources and their shadow-casting frusta
///
/// Point and spot lights share one representation (`OmniLight`): both render
/// a six-face depth cube from their position. The directional light renders a
/// single orthographic map whose view and projection never change.

use glam::{Mat4, Vec3};
use crate::camera::{Camera, ClipRange, Projection};
use crate::config::{DirectionalLightConfig, OmniLightConfig};
use crate::error::{Error, Result};
use crate::light::{OmniShadowFrustum, OscillationAnimation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Point,
    Spot,
    Directional,
}

/// Cone of a spot light; a cutoff of 2π lights every direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotCone {
    pub direction: Vec3,
    /// Full cone angle in radians
    pub cutoff: f32,
}

// ============================================================================
// Omnidirectional lights (point, spot)
// ============================================================================

#[derive(Debug, Clone)]
pub struct OmniLight {
    kind: LightKind,
    position: Vec3,
    color: Vec3,
    intensity: f32,
    enabled: bool,
    frustum: OmniShadowFrustum,
    cone: Option<SpotCone>,
    animation: Option<OscillationAnimation>,
}

impl OmniLight {
    pub fn new(kind: LightKind, config: &OmniLightConfig) -> Result<Self> {
        if kind == LightKind::Directional {
            return Err(Error::InvalidConfig(
                "Directional lights use DirectionalLight".to_string()
            ));
        }
        let clip = ClipRange::new(config.near, config.far)?;
        let animation = match config.oscillation {
            Some((amplitude, period_ms)) => Some(OscillationAnimation::new(amplitude, period_ms)?),
            None => None,
        };
        let cone = config.cone.map(|(direction, cutoff)| SpotCone {
            direction: direction.normalize_or_zero(),
            cutoff,
        });

        Ok(Self {
            kind,
            position: config.position,
            color: config.color,
            intensity: config.intensity,
            enabled: true,
            frustum: OmniShadowFrustum::new(config.position, clip)?,
            cone,
            animation,
        })
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the light and recompute its six face views
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.frustum.recompute(position);
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Configured intensity when enabled, 0 otherwise
    pub fn effective_intensity(&self) -> f32 {
        if self.enabled {
            self.intensity
        } else {
            0.0
        }
    }

    pub fn frustum(&self) -> &OmniShadowFrustum {
        &self.frustum
    }

    pub fn cone(&self) -> Option<SpotCone> {
        self.cone
    }

    pub fn animation_mut(&mut self) -> Option<&mut OscillationAnimation> {
        self.animation.as_mut()
    }
}

// ============================================================================
// Directional light
// ============================================================================

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    direction: Vec3,
    color: Vec3,
    intensity: f32,
    projection: Projection,
    view: Mat4,
    projection_matrix: Mat4,
}

impl DirectionalLight {
    pub fn new(config: &DirectionalLightConfig) -> Result<Self> {
        if config.direction.length_squared() <= f32::EPSILON {
            return Err(Error::InvalidConfig("Directional light direction is zero".to_string()));
        }
        let direction = config.direction.normalize();
        let projection = Projection::Orthographic { extent: config.extent };
        projection.validate()?;

        // The shadow camera sits at the origin and looks along the light direction.
        let up = if direction.cross(Vec3::Y).length_squared() > 1e-6 { Vec3::Y } else { Vec3::Z };
        let camera = Camera::new(Vec3::ZERO, direction, up)?;

        Ok(Self {
            direction,
            color: config.color,
            intensity: config.intensity,
            projection,
            view: camera.view_matrix(),
            projection_matrix: projection.matrix(),
        })
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn clip_near_far(&self) -> [f32; 2] {
        self.projection.clip_near_far()
    }
}

// ============================================================================
// Light rig
// ============================================================================

/// The scene's light set: one point, one spot and one directional light,
/// any of which may be absent
#[derive(Debug, Clone, Default)]
pub struct LightRig {
    pub point: Option<OmniLight>,
    pub spot: Option<OmniLight>,
    pub directional: Option<DirectionalLight>,
}

impl LightRig {
    pub fn new(
        point: Option<&OmniLightConfig>,
        spot: Option<&OmniLightConfig>,
        directional: Option<&DirectionalLightConfig>,
    ) -> Result<Self> {
        Ok(Self {
            point: point.map(|c| OmniLight::new(LightKind::Point, c)).transpose()?,
            spot: spot.map(|c| OmniLight::new(LightKind::Spot, c)).transpose()?,
            directional: directional.map(DirectionalLight::new).transpose()?,
        })
    }

    /// Omnidirectional lights in cube-slot order (point first)
    pub fn omni_lights(&self) -> impl Iterator<Item = &OmniLight> {
        self.point.iter().chain(self.spot.iter())
    }

    pub fn omni_count(&self) -> usize {
        self.omni_lights().count()
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
