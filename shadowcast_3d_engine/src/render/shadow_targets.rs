/// Shadow map render targets
///
/// One 2D map for the directional light and one cube map per point/spot
/// light, all square at the configured resolution. Every framebuffer shares a
/// single depth attachment since only one target is ever bound at a time.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    DeviceCapabilities, Framebuffer, FramebufferDesc, GraphicsDevice, RenderTarget, Texture, TextureDesc,
    TextureFormat, TextureKind, TextureUsage,
};
use crate::light::{CubeFace, LightKind, LightRig};

const SOURCE: &str = "shadowcast3d::ShadowTargets";

/// Depth comparison bias with float shadow storage
pub const FLOAT_SHADOW_BIAS: f32 = 0.0001;

/// Depth comparison bias with 8-bit shadow storage
pub const FIXED_SHADOW_BIAS: f32 = 0.003;

/// Storage precision of the shadow maps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowPrecision {
    /// 32-bit float channels
    Float,
    /// 8-bit normalized channels
    Fixed,
}

impl ShadowPrecision {
    pub fn from_capabilities(capabilities: &DeviceCapabilities) -> Self {
        if capabilities.float_textures {
            ShadowPrecision::Float
        } else {
            ShadowPrecision::Fixed
        }
    }

    pub fn format(self) -> TextureFormat {
        match self {
            ShadowPrecision::Float => TextureFormat::R32G32B32A32_SFLOAT,
            ShadowPrecision::Fixed => TextureFormat::R8G8B8A8_UNORM,
        }
    }

    pub fn bias(self) -> f32 {
        match self {
            ShadowPrecision::Float => FLOAT_SHADOW_BIAS,
            ShadowPrecision::Fixed => FIXED_SHADOW_BIAS,
        }
    }
}

pub struct DirectionalShadowTarget {
    texture: Arc<dyn Texture>,
    framebuffer: Arc<dyn Framebuffer>,
}

impl DirectionalShadowTarget {
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }
}

/// Cube map of one omnidirectional light with a framebuffer per face
pub struct CubeShadowTarget {
    kind: LightKind,
    texture: Arc<dyn Texture>,
    faces: Vec<Arc<dyn Framebuffer>>,
}

impl CubeShadowTarget {
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn face(&self, face: CubeFace) -> &Arc<dyn Framebuffer> {
        &self.faces[face.layer() as usize]
    }
}

pub struct ShadowTargets {
    resolution: u32,
    precision: ShadowPrecision,
    depth: Arc<dyn Texture>,
    directional: Option<DirectionalShadowTarget>,
    cubes: Vec<CubeShadowTarget>,
}

impl ShadowTargets {
    /// Allocate the maps needed by `lights`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `resolution` is zero or above the device limit,
    /// or any device error while creating the textures.
    pub fn create(device: &mut dyn GraphicsDevice, resolution: u32, lights: &LightRig) -> Result<Self> {
        let capabilities = device.capabilities();
        if resolution == 0 || resolution > capabilities.max_texture_size {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidConfig(format!(
                "Shadow map resolution {} outside 1..={}",
                resolution, capabilities.max_texture_size
            ))));
        }
        let precision = ShadowPrecision::from_capabilities(&capabilities);

        let depth = device.create_texture(TextureDesc {
            label: "shadow.depth".to_string(),
            width: resolution,
            height: resolution,
            format: TextureFormat::D16_UNORM,
            usage: TextureUsage::DepthStencil,
            kind: TextureKind::D2,
            data: None,
        })?;
        let depth_target = device.create_render_target(&depth, 0)?;

        let shadow_texture = |label: &str, kind: TextureKind| TextureDesc {
            label: label.to_string(),
            width: resolution,
            height: resolution,
            format: precision.format(),
            usage: TextureUsage::SampledAndRenderTarget,
            kind,
            data: None,
        };

        let directional = match lights.directional {
            Some(_) => {
                let texture = device.create_texture(shadow_texture("shadow.directional", TextureKind::D2))?;
                let framebuffer = attach(device, "shadow.directional".to_string(), &texture, 0, &depth_target)?;
                Some(DirectionalShadowTarget { texture, framebuffer })
            }
            None => None,
        };

        let mut cubes = Vec::with_capacity(lights.omni_count());
        for light in lights.omni_lights() {
            let label = format!("shadow.{}.cube", kind_label(light.kind()));
            let texture = device.create_texture(shadow_texture(&label, TextureKind::Cube))?;
            let mut faces = Vec::with_capacity(CubeFace::ALL.len());
            for face in CubeFace::ALL {
                let face_label = format!("{}/{}", label, face.label());
                faces.push(attach(device, face_label, &texture, face.layer(), &depth_target)?);
            }
            cubes.push(CubeShadowTarget { kind: light.kind(), texture, faces });
        }

        crate::engine_debug!(
            SOURCE,
            "Created shadow targets: {}x{} {:?}, {} cube map(s), directional: {}",
            resolution, resolution, precision, cubes.len(), directional.is_some()
        );

        Ok(Self { resolution, precision, depth, directional, cubes })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn precision(&self) -> ShadowPrecision {
        self.precision
    }

    /// Bias applied to shadow depth comparisons
    pub fn bias(&self) -> f32 {
        self.precision.bias()
    }

    pub fn depth(&self) -> &Arc<dyn Texture> {
        &self.depth
    }

    pub fn directional(&self) -> Option<&DirectionalShadowTarget> {
        self.directional.as_ref()
    }

    pub fn cube(&self, kind: LightKind) -> Option<&CubeShadowTarget> {
        self.cubes.iter().find(|cube| cube.kind == kind)
    }

    pub fn cubes(&self) -> &[CubeShadowTarget] {
        &self.cubes
    }
}

fn attach(
    device: &mut dyn GraphicsDevice,
    label: String,
    texture: &Arc<dyn Texture>,
    layer: u32,
    depth: &Arc<dyn RenderTarget>,
) -> Result<Arc<dyn Framebuffer>> {
    let color = device.create_render_target(texture, layer)?;
    device.create_framebuffer(&FramebufferDesc {
        label,
        color: Some(color),
        depth: Some(depth.clone()),
    })
}

fn kind_label(kind: LightKind) -> &'static str {
    match kind {
        LightKind::Point => "point",
        LightKind::Spot => "spot",
        LightKind::Directional => "directional",
    }
}

#[cfg(test)]
#[path = "shadow_targets_tests.rs"]
mod tests;
