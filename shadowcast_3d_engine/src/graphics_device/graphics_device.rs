/// GraphicsDevice trait - factory for GPU resources and command submission

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, Framebuffer, FramebufferDesc, RenderTarget,
    ShaderProgram, ShaderProgramDesc, Texture, TextureDesc,
};

/// Graphics backend used by the core
///
/// Backends (WebGL-like contexts, Vulkan, the headless recorder) implement this
/// trait; the core only ever talks to `Arc<Mutex<dyn GraphicsDevice>>`.
pub trait GraphicsDevice: Send + Sync {
    /// Create and fill a buffer
    fn create_buffer(&mut self, desc: BufferDesc, data: &[u8]) -> Result<Arc<dyn Buffer>>;

    /// Create a 2D or cube texture, optionally with initial data
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Compile both stages and link them
    ///
    /// # Errors
    ///
    /// `Error::ShaderCompile` or `Error::ShaderLink`, prefixed with the program name.
    fn create_shader_program(&mut self, desc: ShaderProgramDesc) -> Result<Arc<dyn ShaderProgram>>;

    /// Create a writable view of one layer of `texture`
    fn create_render_target(
        &mut self,
        texture: &Arc<dyn Texture>,
        layer: u32,
    ) -> Result<Arc<dyn RenderTarget>>;

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Execute a recorded (ended) command list
    fn submit(&mut self, commands: &dyn CommandList) -> Result<()>;

    /// Framebuffer of the visible surface
    fn presentation_framebuffer(&self) -> Arc<dyn Framebuffer>;

    /// Resize the presentation surface
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn capabilities(&self) -> DeviceCapabilities;

    fn stats(&self) -> DeviceStats;

    fn wait_idle(&self) -> Result<()>;
}

/// Device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    /// Whether float color textures can be rendered to
    pub float_textures: bool,
    pub max_texture_size: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            surface_width: 1280,
            surface_height: 720,
            float_textures: true,
            max_texture_size: 4096,
        }
    }
}

/// Optional features reported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// High-precision (float) shadow storage is available
    pub float_textures: bool,
    pub max_texture_size: u32,
}

/// Resource and submission counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub buffers: u32,
    pub textures: u32,
    pub programs: u32,
    pub framebuffers: u32,
    pub submitted_command_lists: u32,
    pub draw_calls: u32,
}

impl DeviceStats {
    /// Number of GPU objects created so far
    pub fn resource_count(&self) -> u32 {
        self.buffers + self.textures + self.programs + self.framebuffers
    }
}
