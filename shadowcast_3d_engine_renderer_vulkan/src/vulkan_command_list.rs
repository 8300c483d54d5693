/// CommandList - Vulkan implementation of the engine CommandList trait
///
/// The engine records GL-style state changes: a program, loose uniforms,
/// textures and vertex streams bound to slots. This list keeps that state on
/// the CPU and turns it into a pipeline, a descriptor set and a snapshot of
/// the program's uniform blocks at every draw.

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{
    texture_identity, Buffer as RendererBuffer, BufferUsage, ClearValue,
    CommandList as RendererCommandList, Framebuffer as RendererFramebuffer, IndexType,
    PrimitiveTopology, ShaderProgram as RendererShaderProgram, Texture as RendererTexture,
    TextureKind, UniformValue, Viewport,
};
use shadowcast_3d_engine::{engine_bail, engine_err};

use crate::vulkan_buffer::{Buffer, HostBuffer};
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{attachment_clear_values, index_type_to_vk, viewport_to_vk};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::PipelineKey;
use crate::vulkan_sampler::{SamplerKind, SamplerSet};
use crate::vulkan_shader::ShaderProgram;
use crate::vulkan_texture::Texture;
use crate::SOURCE;

/// Size of one uniform ring chunk
const UNIFORM_CHUNK_SIZE: u64 = 256 * 1024;

/// Descriptor sets per pool before another pool is created
const SETS_PER_POOL: u32 = 256;

/// Resources every command list of a device binds in place of missing state
pub(crate) struct FrameShared {
    pub(crate) samplers: Arc<SamplerSet>,
    /// 1x1 white, bound to empty 2D slots
    pub(crate) fallback_2d: Arc<dyn RendererTexture>,
    /// 1x1 white cube, bound to empty cube slots
    pub(crate) fallback_cube: Arc<dyn RendererTexture>,
    /// Read with a zero stride by attributes that have no buffer
    pub(crate) zero_vertices: Arc<HostBuffer>,
    pub(crate) uniform_alignment: u64,
}

/// Round `value` up to a multiple of `alignment` (a power of two, or 0/1)
pub(crate) fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        value
    } else {
        (value + alignment - 1) & !(alignment - 1)
    }
}

// ============================================================================
// Uniform ring
// ============================================================================

/// Host-visible chunks that receive the uniform snapshot of each draw
///
/// Rewound at `begin`; chunks are kept for the next frame.
struct UniformRing {
    ctx: Arc<GpuContext>,
    chunks: Vec<HostBuffer>,
    chunk: usize,
    offset: u64,
    alignment: u64,
}

impl UniformRing {
    fn new(ctx: &Arc<GpuContext>, alignment: u64) -> Self {
        Self { ctx: Arc::clone(ctx), chunks: Vec::new(), chunk: 0, offset: 0, alignment }
    }

    fn reset(&mut self) {
        self.chunk = 0;
        self.offset = 0;
    }

    fn push(&mut self, data: &[u8]) -> Result<(vk::Buffer, u64)> {
        let size = data.len() as u64;
        if size > UNIFORM_CHUNK_SIZE {
            engine_bail!(SOURCE, "Uniform block of {} bytes exceeds the ring chunk size", size);
        }

        let mut offset = align_up(self.offset, self.alignment);
        if offset + size > UNIFORM_CHUNK_SIZE {
            self.chunk += 1;
            offset = 0;
        }
        if self.chunk == self.chunks.len() {
            self.chunks.push(HostBuffer::new(
                &self.ctx,
                "uniform ring",
                UNIFORM_CHUNK_SIZE,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
            )?);
        }

        let chunk = &self.chunks[self.chunk];
        chunk.write(offset, data)?;
        self.offset = offset + size;
        Ok((chunk.buffer, offset))
    }
}

// ============================================================================
// Descriptor pools
// ============================================================================

/// Growable set of descriptor pools, reset as a whole at `begin`
struct DescriptorPools {
    ctx: Arc<GpuContext>,
    pools: Vec<vk::DescriptorPool>,
    current: usize,
}

impl DescriptorPools {
    fn new(ctx: &Arc<GpuContext>) -> Self {
        Self { ctx: Arc::clone(ctx), pools: Vec::new(), current: 0 }
    }

    fn reset(&mut self) -> Result<()> {
        for pool in &self.pools {
            unsafe {
                self.ctx.device.reset_descriptor_pool(*pool, vk::DescriptorPoolResetFlags::empty())
                    .map_err(|e| engine_err!(SOURCE, "Failed to reset descriptor pool: {:?}", e))?;
            }
        }
        self.current = 0;
        Ok(())
    }

    fn create_pool(&self) -> Result<vk::DescriptorPool> {
        let sizes = [
            vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: SETS_PER_POOL * 2 },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::SAMPLED_IMAGE, descriptor_count: SETS_PER_POOL * 4 },
            vk::DescriptorPoolSize { ty: vk::DescriptorType::SAMPLER, descriptor_count: SETS_PER_POOL * 4 },
        ];
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(SETS_PER_POOL)
            .pool_sizes(&sizes);
        unsafe {
            self.ctx.device.create_descriptor_pool(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor pool: {:?}", e))
        }
    }

    fn allocate(&mut self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        loop {
            let fresh = self.current == self.pools.len();
            if fresh {
                let pool = self.create_pool()?;
                self.pools.push(pool);
            }

            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(self.pools[self.current])
                .set_layouts(&layouts);
            match unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) } {
                Ok(sets) => {
                    return sets.first().copied()
                        .ok_or_else(|| engine_err!(SOURCE, "Descriptor set allocation returned nothing"));
                }
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL) if !fresh => {
                    self.current += 1;
                }
                Err(e) => engine_bail!(SOURCE, "Failed to allocate descriptor set: {:?}", e),
            }
        }
    }
}

impl Drop for DescriptorPools {
    fn drop(&mut self) {
        unsafe {
            for pool in self.pools.drain(..) {
                self.ctx.device.destroy_descriptor_pool(pool, None);
            }
        }
    }
}

// ============================================================================
// Command list
// ============================================================================

/// Engine objects referenced by recorded commands, released at the next `begin`
#[derive(Default)]
struct Retained {
    programs: Vec<Arc<dyn RendererShaderProgram>>,
    textures: Vec<Arc<dyn RendererTexture>>,
    buffers: Vec<Arc<dyn RendererBuffer>>,
    framebuffers: Vec<Arc<dyn RendererFramebuffer>>,
}

impl Retained {
    fn clear(&mut self) {
        self.programs.clear();
        self.textures.clear();
        self.buffers.clear();
        self.framebuffers.clear();
    }
}

struct ActivePass {
    framebuffer: Arc<dyn RendererFramebuffer>,
    /// Identities of the attached textures
    write_targets: Vec<usize>,
}

/// Vulkan command list implementation
pub struct CommandList {
    ctx: Arc<GpuContext>,
    shared: Arc<FrameShared>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    recording: bool,

    descriptors: DescriptorPools,
    uniforms: UniformRing,
    retained: Retained,

    pass: Option<ActivePass>,
    viewport: Option<Viewport>,
    program: Option<Arc<dyn RendererShaderProgram>>,
    textures: Vec<Option<Arc<dyn RendererTexture>>>,
    vertex_buffers: Vec<Option<Arc<dyn RendererBuffer>>>,
    index_bound: bool,
    bound_pipeline: vk::Pipeline,

    draw_calls: u32,
    rendered_surface: bool,
}

impl CommandList {
    pub(crate) fn new(ctx: &Arc<GpuContext>, shared: &Arc<FrameShared>) -> Result<Self> {
        unsafe {
            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = ctx.device.create_command_pool(&pool_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                other => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_bail!(SOURCE, "Failed to allocate command buffer: {:?}", other.err());
                }
            };

            Ok(Self {
                ctx: Arc::clone(ctx),
                shared: Arc::clone(shared),
                command_pool,
                command_buffer,
                recording: false,
                descriptors: DescriptorPools::new(ctx),
                uniforms: UniformRing::new(ctx, shared.uniform_alignment),
                retained: Retained::default(),
                pass: None,
                viewport: None,
                program: None,
                textures: Vec::new(),
                vertex_buffers: Vec::new(),
                index_bound: false,
                bound_pipeline: vk::Pipeline::null(),
                draw_calls: 0,
                rendered_surface: false,
            })
        }
    }

    /// Underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Draws recorded since the last `begin`
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether a pass targeted the presentation framebuffer
    pub(crate) fn rendered_surface(&self) -> bool {
        self.rendered_surface
    }

    pub(crate) fn downcast(commands: &dyn RendererCommandList) -> &CommandList {
        unsafe { &*(commands as *const dyn RendererCommandList as *const CommandList) }
    }

    fn require_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            engine_bail!(SOURCE, "{} recorded outside begin/end", command);
        }
        Ok(())
    }

    fn apply_viewport(&self, framebuffer: &Framebuffer) {
        let viewport = self.viewport
            .unwrap_or_else(|| Viewport::full(framebuffer.width, framebuffer.height));
        let vk_viewport = viewport_to_vk(viewport, framebuffer.height, framebuffer.presentation);
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D { width: framebuffer.width, height: framebuffer.height },
        };
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[scissor]);
        }
    }

    fn texture_for_slot(&self, slot: usize, cube: bool) -> &Arc<dyn RendererTexture> {
        match self.textures.get(slot) {
            Some(Some(texture)) => texture,
            _ if cube => &self.shared.fallback_cube,
            _ => &self.shared.fallback_2d,
        }
    }
}

impl RendererCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            engine_bail!(SOURCE, "Command list is already recording");
        }

        self.retained.clear();
        self.descriptors.reset()?;
        self.uniforms.reset();
        self.pass = None;
        self.viewport = None;
        self.program = None;
        self.textures.clear();
        self.vertex_buffers.clear();
        self.index_bound = false;
        self.bound_pipeline = vk::Pipeline::null();
        self.draw_calls = 0;
        self.rendered_surface = false;

        unsafe {
            self.ctx.device.reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(SOURCE, "Failed to reset command buffer: {:?}", e))?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to begin command buffer: {:?}", e))?;
        }

        self.recording = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.pass.is_some() {
            engine_bail!(SOURCE, "Command list ended with a render target still bound");
        }
        unsafe {
            self.ctx.device.end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!(SOURCE, "Failed to end command buffer: {:?}", e))?;
        }
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<dyn RendererFramebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.pass.is_some() {
            engine_bail!(SOURCE,
                "Cannot bind framebuffer '{}': another render target is still bound",
                framebuffer.label());
        }

        let vk_framebuffer = Framebuffer::downcast(framebuffer.as_ref());
        let key = vk_framebuffer.render_pass.key;
        let clears = attachment_clear_values(clear_values, key.color.is_some(), key.depth.is_some());
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_framebuffer.render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: vk_framebuffer.width, height: vk_framebuffer.height },
            })
            .clear_values(&clears);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.apply_viewport(vk_framebuffer);
        self.bound_pipeline = vk::Pipeline::null();
        self.rendered_surface |= vk_framebuffer.presentation;

        self.pass = Some(ActivePass {
            framebuffer: Arc::clone(framebuffer),
            write_targets: vk_framebuffer.attached_textures().collect(),
        });
        self.retained.framebuffers.push(Arc::clone(framebuffer));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        if self.pass.take().is_none() {
            engine_bail!(SOURCE, "end_render_pass without an active render pass");
        }
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.viewport = Some(viewport);
        if let Some(pass) = &self.pass {
            self.apply_viewport(Framebuffer::downcast(pass.framebuffer.as_ref()));
        }
        Ok(())
    }

    fn use_program(&mut self, program: &Arc<dyn RendererShaderProgram>) -> Result<()> {
        self.require_recording("use_program")?;
        self.program = Some(Arc::clone(program));
        self.retained.programs.push(Arc::clone(program));
        Ok(())
    }

    fn set_uniform(&mut self, slot: u32, value: UniformValue) -> Result<()> {
        self.require_recording("set_uniform")?;
        let Some(program) = &self.program else {
            engine_bail!(SOURCE, "set_uniform({}) without a bound program", slot);
        };
        ShaderProgram::downcast(program.as_ref()).set_uniform(slot, &value)
    }

    fn bind_texture(&mut self, slot: u32, texture: &Arc<dyn RendererTexture>) -> Result<()> {
        self.require_recording("bind_texture")?;
        let info = texture.info();
        if let Some(pass) = &self.pass {
            if pass.write_targets.contains(&texture_identity(texture)) {
                engine_bail!(SOURCE,
                    "Texture '{}' is sampled while attached to the bound framebuffer", info.label);
            }
        }
        if !info.usage.is_sampled() {
            engine_bail!(SOURCE, "Texture '{}' is not sampleable", info.label);
        }

        let slot = slot as usize;
        if self.textures.len() <= slot {
            self.textures.resize(slot + 1, None);
        }
        self.textures[slot] = Some(Arc::clone(texture));
        self.retained.textures.push(Arc::clone(texture));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn RendererBuffer>) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        if buffer.usage() != BufferUsage::Vertex {
            engine_bail!(SOURCE, "Buffer '{}' is not a vertex buffer", buffer.label());
        }

        let slot = slot as usize;
        if slot >= 32 {
            engine_bail!(SOURCE, "Vertex slot {} out of range", slot);
        }
        if self.vertex_buffers.len() <= slot {
            self.vertex_buffers.resize(slot + 1, None);
        }
        self.vertex_buffers[slot] = Some(Arc::clone(buffer));
        self.retained.buffers.push(Arc::clone(buffer));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn RendererBuffer>, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        if buffer.usage() != BufferUsage::Index {
            engine_bail!(SOURCE, "Buffer '{}' is not an index buffer", buffer.label());
        }
        let vk_buffer = Buffer::downcast(buffer.as_ref());
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.host.buffer,
                0,
                index_type_to_vk(index_type),
            );
        }
        self.index_bound = true;
        self.retained.buffers.push(Arc::clone(buffer));
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        first_index: u32,
    ) -> Result<()> {
        self.require_recording("draw_indexed")?;
        let Some(pass) = &self.pass else {
            engine_bail!(SOURCE, "draw_indexed outside a render pass");
        };
        let Some(program) = &self.program else {
            engine_bail!(SOURCE, "draw_indexed without a bound program");
        };
        if index_count == 0 {
            return Ok(());
        }
        if !self.index_bound {
            engine_bail!(SOURCE, "draw_indexed without an index buffer");
        }

        let framebuffer = Framebuffer::downcast(pass.framebuffer.as_ref());
        let program = ShaderProgram::downcast(program.as_ref());
        let layout = &program.layout;
        let device = &self.ctx.device;
        let cb = self.command_buffer;

        // Pipeline
        let unbound = (0..layout.attributes.len())
            .filter(|slot| !matches!(self.vertex_buffers.get(*slot), Some(Some(_))))
            .fold(0u32, |mask, slot| mask | (1 << slot));
        let key = PipelineKey {
            formats: framebuffer.render_pass.key.compatibility(),
            topology,
            unbound,
        };
        let pipeline = program.pipeline(&framebuffer.render_pass, key)?;
        if pipeline != self.bound_pipeline {
            unsafe { device.cmd_bind_pipeline(cb, vk::PipelineBindPoint::GRAPHICS, pipeline) };
            self.bound_pipeline = pipeline;
        }

        // Vertex streams
        if !layout.attributes.is_empty() {
            let buffers: Vec<vk::Buffer> = (0..layout.attributes.len())
                .map(|slot| match self.vertex_buffers.get(slot) {
                    Some(Some(buffer)) => Buffer::downcast(buffer.as_ref()).host.buffer,
                    _ => self.shared.zero_vertices.buffer,
                })
                .collect();
            let offsets = vec![0u64; buffers.len()];
            unsafe { device.cmd_bind_vertex_buffers(cb, 0, &buffers, &offsets) };
        }

        // Texture slots
        let mut image_infos = Vec::with_capacity(layout.textures.len());
        let mut sampler_infos = Vec::with_capacity(layout.textures.len());
        for (slot, binding) in layout.textures.iter().enumerate() {
            let texture = self.texture_for_slot(slot, binding.cube);
            let info = texture.info();
            if pass.write_targets.contains(&texture_identity(texture)) {
                engine_bail!(SOURCE,
                    "Texture '{}' is sampled while attached to the bound framebuffer", info.label);
            }
            if (info.kind == TextureKind::Cube) != binding.cube {
                engine_bail!(SOURCE,
                    "Texture '{}' ({:?}) bound to a slot of program '{}' expecting {}",
                    info.label, info.kind, program.name(), if binding.cube { "a cube" } else { "a 2D texture" });
            }
            image_infos.push(vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: Texture::downcast(texture.as_ref()).view,
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            });
            sampler_infos.push(vk::DescriptorImageInfo {
                sampler: self.shared.samplers.get(SamplerKind::for_texture(info)),
                image_view: vk::ImageView::null(),
                image_layout: vk::ImageLayout::UNDEFINED,
            });
        }

        // Uniform snapshot
        let snapshots: Vec<Vec<u8>> = program.lock_uniforms()?.clone();
        let mut buffer_infos = Vec::with_capacity(snapshots.len());
        for block in &snapshots {
            let (buffer, offset) = self.uniforms.push(block)?;
            buffer_infos.push(vk::DescriptorBufferInfo {
                buffer,
                offset,
                range: block.len() as u64,
            });
        }

        let set = self.descriptors.allocate(program.descriptor_set_layout)?;
        let mut writes = Vec::with_capacity(buffer_infos.len() + image_infos.len() * 2);
        for (block, info) in layout.blocks.iter().zip(&buffer_infos) {
            writes.push(vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(block.binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(info)));
        }
        for ((binding, image), sampler) in layout.textures.iter().zip(&image_infos).zip(&sampler_infos) {
            writes.push(vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(binding.image)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(std::slice::from_ref(image)));
            writes.push(vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(binding.sampler)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .image_info(std::slice::from_ref(sampler)));
        }

        unsafe {
            device.update_descriptor_sets(&writes, &[]);
            device.cmd_bind_descriptor_sets(
                cb,
                vk::PipelineBindPoint::GRAPHICS,
                program.pipeline_layout,
                0,
                &[set],
                &[],
            );
            device.cmd_draw_indexed(cb, index_count, 1, first_index, 0, 0);
        }

        self.draw_calls += 1;
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Frees the command buffer too
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_command_list_tests.rs"]
mod tests;
