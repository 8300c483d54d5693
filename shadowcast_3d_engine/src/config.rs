/// Scene configuration
///
/// Plain structs with defaults reproducing the reference room scene. Every
/// value is checked by [`SceneConfig::validate`] before anything is created.

use glam::Vec3;
use crate::camera::{ClipRange, Projection};
use crate::error::{Error, Result};

/// Default edge length of every shadow map, in texels
pub const DEFAULT_SHADOW_MAP_RESOLUTION: u32 = 512;

/// Main camera placement and lens
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 6.0),
            look_at: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::new(0.0, 0.0, -1.0),
            fov_y: std::f32::consts::FRAC_PI_2,
            near: 0.35,
            far: 85.0,
        }
    }
}

/// Point or spot light
#[derive(Debug, Clone, PartialEq)]
pub struct OmniLightConfig {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Shadow clip range
    pub near: f32,
    pub far: f32,
    /// (amplitude, period in ms) of the x-axis oscillation
    pub oscillation: Option<(f32, f32)>,
    /// (direction, full cone angle) for spot lights
    pub cone: Option<(Vec3, f32)>,
}

impl OmniLightConfig {
    pub fn point() -> Self {
        Self {
            position: Vec3::new(0.0, -5.0, -4.0),
            color: Vec3::ONE,
            intensity: 0.8,
            near: 0.05,
            far: 15.0,
            oscillation: Some((2.8, 233.0)),
            cone: None,
        }
    }

    pub fn spot() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -3.0),
            color: Vec3::new(1.0, 0.2, 0.2),
            intensity: 0.8,
            near: 0.04,
            far: 12.0,
            oscillation: Some((2.5, 1000.0)),
            cone: Some((Vec3::new(-8.0, 5.0, -2.0), std::f32::consts::TAU)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightConfig {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Half-size of the orthographic shadow box
    pub extent: f32,
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.6, 1.0, 0.3).normalize(),
            color: Vec3::new(1.0, 1.0, 0.5),
            intensity: 1.0,
            extent: 20.0,
        }
    }
}

/// Complete scene configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub shadow_map_resolution: u32,
    /// Units per second
    pub move_speed: f32,
    /// Radians per second
    pub rotate_speed: f32,
    pub camera: CameraConfig,
    pub point_light: Option<OmniLightConfig>,
    pub spot_light: Option<OmniLightConfig>,
    pub directional_light: Option<DirectionalLightConfig>,
    /// Per-tick translation of the interactive node while a move key is held
    pub interactive_step: f32,
    /// Camera eye placed when interactive mode is entered
    pub interactive_camera_position: Vec3,
    /// Skip shadow passes and shade with the unshadowed program when false
    pub shadows_enabled: bool,
    pub clear_color: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shadow_map_resolution: DEFAULT_SHADOW_MAP_RESOLUTION,
            move_speed: 3.5,
            rotate_speed: 1.5,
            camera: CameraConfig::default(),
            point_light: Some(OmniLightConfig::point()),
            spot_light: Some(OmniLightConfig::spot()),
            directional_light: Some(DirectionalLightConfig::default()),
            interactive_step: 0.0475,
            interactive_camera_position: Vec3::new(0.1, 3.0, 4.0),
            shadows_enabled: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SceneConfig {
    /// Default configuration with an overridden shadow map resolution
    pub fn with_shadow_map_resolution(resolution: u32) -> Result<Self> {
        let config = Self { shadow_map_resolution: resolution, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shadow_map_resolution == 0 {
            return Err(Error::InvalidConfig("Shadow map resolution must be > 0".to_string()));
        }
        if !(self.move_speed >= 0.0) || !(self.rotate_speed >= 0.0) {
            return Err(Error::InvalidConfig("Movement speeds must be >= 0".to_string()));
        }

        Projection::Perspective {
            fov_y: self.camera.fov_y,
            aspect: 1.0,
            clip: ClipRange { near: self.camera.near, far: self.camera.far },
        }.validate()?;

        for light in self.point_light.iter().chain(self.spot_light.iter()) {
            ClipRange::new(light.near, light.far)?;
            if let Some((_, period)) = light.oscillation {
                if !(period > 0.0) {
                    return Err(Error::InvalidConfig(format!("Light oscillation period {} must be > 0", period)));
                }
            }
        }
        if let Some(directional) = &self.directional_light {
            if directional.direction.length_squared() <= f32::EPSILON {
                return Err(Error::InvalidConfig("Directional light direction is zero".to_string()));
            }
            Projection::Orthographic { extent: directional.extent }.validate()?;
        }
        Ok(())
    }
}

/// Parse the optional shadow-map resolution parameter
///
/// `None` or an empty string selects [`DEFAULT_SHADOW_MAP_RESOLUTION`].
pub fn parse_shadow_map_resolution(value: Option<&str>) -> Result<u32> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_SHADOW_MAP_RESOLUTION);
    };
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidConfig(format!(
            "Shadow map resolution '{}' is not a positive integer",
            raw
        ))),
        Ok(resolution) => Ok(resolution),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
