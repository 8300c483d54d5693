/// RenderTarget - one writable layer of a Vulkan texture

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{
    RenderTarget as RendererRenderTarget, Texture as RendererTexture,
};
use shadowcast_3d_engine::engine_bail;

use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::Texture;
use crate::SOURCE;

pub struct RenderTarget {
    ctx: Arc<GpuContext>,
    texture: Arc<dyn RendererTexture>,
    layer: u32,
    /// 2D view of `layer` only
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
}

impl RenderTarget {
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        texture: &Arc<dyn RendererTexture>,
        layer: u32,
    ) -> Result<Self> {
        let info = texture.info();
        if !info.usage.is_attachment() {
            engine_bail!(SOURCE, "Texture '{}' is not attachable", info.label);
        }
        if layer >= info.kind.layer_count() {
            engine_bail!(SOURCE,
                "Layer {} out of range for texture '{}' ({} layers)",
                layer, info.label, info.kind.layer_count());
        }

        let vk_texture = Texture::downcast(texture.as_ref());
        let view = vk_texture.create_view(vk::ImageViewType::TYPE_2D, layer, 1)?;

        Ok(Self {
            ctx: Arc::clone(ctx),
            texture: Arc::clone(texture),
            layer,
            view,
            format: vk_texture.format,
        })
    }

    pub(crate) fn downcast(target: &dyn RendererRenderTarget) -> &RenderTarget {
        unsafe { &*(target as *const dyn RendererRenderTarget as *const RenderTarget) }
    }
}

impl RendererRenderTarget for RenderTarget {
    fn texture(&self) -> &Arc<dyn RendererTexture> {
        &self.texture
    }

    fn layer(&self) -> u32 {
        self.layer
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
        }
    }
}
