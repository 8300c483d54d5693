/// Render targets and framebuffers
///
/// A render target is one layer of a texture (a cube face, or the single
/// layer of a 2D texture). A framebuffer groups an optional color target with
/// an optional depth target of the same size.

use std::sync::Arc;
use crate::graphics_device::Texture;

/// Single writable layer of a texture
pub trait RenderTarget: Send + Sync {
    fn texture(&self) -> &Arc<dyn Texture>;
    fn layer(&self) -> u32;

    fn width(&self) -> u32 {
        self.texture().info().width
    }

    fn height(&self) -> u32 {
        self.texture().info().height
    }
}

/// Attachment set bound by `CommandList::begin_render_pass`
pub trait Framebuffer: Send + Sync {
    fn label(&self) -> &str;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn color_attachment(&self) -> Option<&Arc<dyn RenderTarget>>;
    fn depth_attachment(&self) -> Option<&Arc<dyn RenderTarget>>;
}

/// Descriptor for creating a framebuffer
#[derive(Clone)]
pub struct FramebufferDesc {
    pub label: String,
    pub color: Option<Arc<dyn RenderTarget>>,
    pub depth: Option<Arc<dyn RenderTarget>>,
}

impl FramebufferDesc {
    /// Size shared by every attachment, `None` when attachments disagree or none is set
    pub fn extent(&self) -> Option<(u32, u32)> {
        let sizes: Vec<(u32, u32)> = self.color.iter()
            .chain(self.depth.iter())
            .map(|target| (target.width(), target.height()))
            .collect();
        let first = *sizes.first()?;
        sizes.iter().all(|&size| size == first).then_some(first)
    }
}

/// Identity of a texture object, used to detect read/write hazards
pub fn texture_identity(texture: &Arc<dyn Texture>) -> usize {
    Arc::as_ptr(texture) as *const () as usize
}
