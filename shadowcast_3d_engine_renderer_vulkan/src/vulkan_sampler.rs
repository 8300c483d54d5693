/// Samplers used by the engine programs
///
/// The engine has no sampler objects of its own: a texture's usage decides how
/// it is filtered. Loaded images repeat with linear filtering, shadow storage
/// is read texel-exact and clamped.

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{TextureInfo, TextureUsage};
use shadowcast_3d_engine::engine_err;

use crate::vulkan_context::GpuContext;
use crate::SOURCE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SamplerKind {
    LinearRepeat,
    NearestClamp,
}

impl SamplerKind {
    pub(crate) fn for_texture(info: &TextureInfo) -> Self {
        match info.usage {
            TextureUsage::Sampled => SamplerKind::LinearRepeat,
            _ => SamplerKind::NearestClamp,
        }
    }
}

/// Every sampler the backend binds, created up front
pub(crate) struct SamplerSet {
    ctx: Arc<GpuContext>,
    linear_repeat: vk::Sampler,
    nearest_clamp: vk::Sampler,
}

impl SamplerSet {
    /// `anisotropy` must only be set when the device feature was enabled
    pub(crate) fn new(ctx: &Arc<GpuContext>, anisotropy: bool) -> Result<Self> {
        let mut set = Self {
            ctx: Arc::clone(ctx),
            linear_repeat: vk::Sampler::null(),
            nearest_clamp: vk::Sampler::null(),
        };
        set.linear_repeat = set.create(SamplerKind::LinearRepeat, anisotropy)?;
        set.nearest_clamp = set.create(SamplerKind::NearestClamp, false)?;
        Ok(set)
    }

    pub(crate) fn get(&self, kind: SamplerKind) -> vk::Sampler {
        match kind {
            SamplerKind::LinearRepeat => self.linear_repeat,
            SamplerKind::NearestClamp => self.nearest_clamp,
        }
    }

    fn create(&self, kind: SamplerKind, anisotropy: bool) -> Result<vk::Sampler> {
        let (filter, mipmap, address) = match kind {
            SamplerKind::LinearRepeat => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
            ),
            SamplerKind::NearestClamp => (
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
            ),
        };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .anisotropy_enable(anisotropy)
            .max_anisotropy(if anisotropy { 16.0 } else { 1.0 });

        unsafe {
            self.ctx.device.create_sampler(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create {:?} sampler: {:?}", kind, e))
        }
    }
}

impl Drop for SamplerSet {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.linear_repeat, None);
            self.ctx.device.destroy_sampler(self.nearest_clamp, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_sampler_tests.rs"]
mod tests;
