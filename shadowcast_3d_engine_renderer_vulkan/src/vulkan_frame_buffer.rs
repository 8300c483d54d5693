/// Framebuffer - Vulkan implementation of the engine Framebuffer trait

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{
    texture_identity, Framebuffer as RendererFramebuffer, RenderTarget as RendererRenderTarget,
};
use shadowcast_3d_engine::engine_err;

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_render_target::RenderTarget;
use crate::SOURCE;

pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) render_pass: Arc<RenderPass>,
    label: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    color: Option<Arc<dyn RendererRenderTarget>>,
    depth: Option<Arc<dyn RendererRenderTarget>>,
    /// Backs the window surface: rendered with a flipped viewport, then blitted
    pub(crate) presentation: bool,
}

impl Framebuffer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        render_pass: Arc<RenderPass>,
        label: &str,
        width: u32,
        height: u32,
        color: Option<Arc<dyn RendererRenderTarget>>,
        depth: Option<Arc<dyn RendererRenderTarget>>,
        presentation: bool,
    ) -> Result<Self> {
        let attachments: Vec<vk::ImageView> = color.iter()
            .chain(depth.iter())
            .map(|target| RenderTarget::downcast(target.as_ref()).view)
            .collect();

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&attachments)
            .width(width)
            .height(height)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device.create_framebuffer(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create framebuffer '{}': {:?}", label, e))?
        };

        Ok(Self {
            ctx: Arc::clone(ctx),
            framebuffer,
            render_pass,
            label: label.to_string(),
            width,
            height,
            color,
            depth,
            presentation,
        })
    }

    /// Identities of the attached textures, for read/write hazard checks
    pub(crate) fn attached_textures(&self) -> impl Iterator<Item = usize> + '_ {
        self.color.iter()
            .chain(self.depth.iter())
            .map(|target| texture_identity(target.texture()))
    }

    pub(crate) fn downcast(framebuffer: &dyn RendererFramebuffer) -> &Framebuffer {
        unsafe { &*(framebuffer as *const dyn RendererFramebuffer as *const Framebuffer) }
    }
}

impl RendererFramebuffer for Framebuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_attachment(&self) -> Option<&Arc<dyn RendererRenderTarget>> {
        self.color.as_ref()
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn RendererRenderTarget>> {
        self.depth.as_ref()
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
