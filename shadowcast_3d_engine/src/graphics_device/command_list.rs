/// CommandList trait - records the commands of one frame

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::error::Result;
use crate::graphics_device::{
    Buffer, Framebuffer, IndexType, PrimitiveTopology, ShaderProgram, Texture,
};

/// Command list for recording rendering commands
///
/// Commands are recorded between `begin` and `end`, then handed to
/// `GraphicsDevice::submit`. At most one framebuffer is bound at a time: a
/// render pass must be ended before the next one begins, and a texture that is
/// attached to the active framebuffer may not be bound as a shader input.
pub trait CommandList: Send + Sync {
    fn begin(&mut self) -> Result<()>;
    fn end(&mut self) -> Result<()>;

    /// Bind `framebuffer` as the write target and clear it
    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// Unbind the current write target
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn use_program(&mut self, program: &Arc<dyn ShaderProgram>) -> Result<()>;

    /// Set a uniform of the current program by interface slot
    fn set_uniform(&mut self, slot: u32, value: UniformValue) -> Result<()>;

    /// Bind a sampled texture to an interface texture slot
    fn bind_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()>;

    /// Bind a vertex stream to an interface attribute slot
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, index_type: IndexType) -> Result<()>;

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        first_index: u32,
    ) -> Result<()>;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-size viewport covering `width` x `height`
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Value written by `CommandList::set_uniform`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}
