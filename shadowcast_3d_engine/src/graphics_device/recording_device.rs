/// Headless graphics device that records every submitted command
///
/// Nothing is rasterized. Resources are plain descriptions, command lists
/// validate the binding discipline as they record, and submitted frames land
/// in a shared [`RecordingJournal`] that callers can inspect. This is the test
/// backend; it is compiled only with the `recording-device` feature.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{Error, Result, ShaderStage};
use crate::graphics_device::{
    texture_identity, Buffer, BufferDesc, BufferUsage, ClearValue, CommandList,
    DeviceCapabilities, DeviceConfig, DeviceStats, Framebuffer, FramebufferDesc,
    GraphicsDevice, IndexType, PrimitiveTopology, RenderTarget, ShaderInterface,
    ShaderProgram, ShaderProgramDesc, Texture, TextureDesc, TextureFormat, TextureInfo,
    TextureKind, TextureUsage, UniformValue, Viewport,
};

const SOURCE: &str = "shadowcast3d::RecordingDevice";

// ============================================================================
// Journal
// ============================================================================

/// One recorded command, with resources identified by label
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Begin,
    End,
    BeginRenderPass { framebuffer: String, clear_values: Vec<ClearValue> },
    EndRenderPass,
    SetViewport(Viewport),
    UseProgram(String),
    SetUniform { slot: u32, value: UniformValue },
    BindTexture { slot: u32, texture: String },
    BindVertexBuffer { slot: u32, buffer: String },
    BindIndexBuffer { buffer: String, index_type: IndexType },
    DrawIndexed { topology: PrimitiveTopology, index_count: u32, first_index: u32 },
}

#[derive(Default)]
struct JournalState {
    /// Commands of the last ended list, waiting for `submit`
    pending: Option<Vec<RecordedCommand>>,
    frames: Vec<Vec<RecordedCommand>>,
}

/// Shared handle on the frames submitted to a [`RecordingGraphicsDevice`]
#[derive(Clone, Default)]
pub struct RecordingJournal {
    state: Arc<Mutex<JournalState>>,
}

impl RecordingJournal {
    fn lock(&self) -> Result<MutexGuard<'_, JournalState>> {
        self.state.lock().map_err(|_| crate::engine_err!(SOURCE, "Journal lock poisoned"))
    }

    pub fn frame_count(&self) -> usize {
        self.lock().map(|state| state.frames.len()).unwrap_or(0)
    }

    pub fn frames(&self) -> Vec<Vec<RecordedCommand>> {
        self.lock().map(|state| state.frames.clone()).unwrap_or_default()
    }

    pub fn last_frame(&self) -> Option<Vec<RecordedCommand>> {
        self.lock().ok().and_then(|state| state.frames.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.lock() {
            state.frames.clear();
            state.pending = None;
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

struct RecordingBuffer {
    label: String,
    size: u64,
    usage: BufferUsage,
}

impl Buffer for RecordingBuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}

struct RecordingTexture {
    info: TextureInfo,
}

impl Texture for RecordingTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

struct RecordingProgram {
    name: String,
    interface: ShaderInterface,
}

impl ShaderProgram for RecordingProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn interface(&self) -> &ShaderInterface {
        &self.interface
    }
}

struct RecordingRenderTarget {
    texture: Arc<dyn Texture>,
    layer: u32,
}

impl RenderTarget for RecordingRenderTarget {
    fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    fn layer(&self) -> u32 {
        self.layer
    }
}

struct RecordingFramebuffer {
    label: String,
    width: u32,
    height: u32,
    color: Option<Arc<dyn RenderTarget>>,
    depth: Option<Arc<dyn RenderTarget>>,
}

impl Framebuffer for RecordingFramebuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_attachment(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.color.as_ref()
    }

    fn depth_attachment(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.depth.as_ref()
    }
}

// ============================================================================
// Command list
// ============================================================================

/// Command list of the recording device
pub struct RecordingCommandList {
    journal: RecordingJournal,
    commands: Vec<RecordedCommand>,
    recording: bool,
    /// Textures attached to the bound framebuffer, empty outside a pass
    write_targets: Vec<usize>,
    pass_active: bool,
    program_bound: bool,
}

impl RecordingCommandList {
    fn new(journal: RecordingJournal) -> Self {
        Self {
            journal,
            commands: Vec::new(),
            recording: false,
            write_targets: Vec::new(),
            pass_active: false,
            program_bound: false,
        }
    }

    fn require_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            crate::engine_bail!(SOURCE, "{} recorded outside begin/end", command);
        }
        Ok(())
    }
}

impl CommandList for RecordingCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            crate::engine_bail!(SOURCE, "Command list is already recording");
        }
        self.commands.clear();
        self.recording = true;
        self.program_bound = false;
        self.commands.push(RecordedCommand::Begin);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.pass_active {
            crate::engine_bail!(SOURCE, "Command list ended with a render target still bound");
        }
        self.commands.push(RecordedCommand::End);
        self.recording = false;
        self.journal.lock()?.pending = Some(std::mem::take(&mut self.commands));
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.pass_active {
            crate::engine_bail!(
                SOURCE,
                "Cannot bind framebuffer '{}': another render target is still bound",
                framebuffer.label()
            );
        }
        self.write_targets = framebuffer.color_attachment().into_iter()
            .chain(framebuffer.depth_attachment())
            .map(|target| texture_identity(target.texture()))
            .collect();
        self.pass_active = true;
        self.commands.push(RecordedCommand::BeginRenderPass {
            framebuffer: framebuffer.label().to_string(),
            clear_values: clear_values.to_vec(),
        });
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        if !self.pass_active {
            crate::engine_bail!(SOURCE, "end_render_pass without an active render pass");
        }
        self.pass_active = false;
        self.write_targets.clear();
        self.commands.push(RecordedCommand::EndRenderPass);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.commands.push(RecordedCommand::SetViewport(viewport));
        Ok(())
    }

    fn use_program(&mut self, program: &Arc<dyn ShaderProgram>) -> Result<()> {
        self.require_recording("use_program")?;
        self.program_bound = true;
        self.commands.push(RecordedCommand::UseProgram(program.name().to_string()));
        Ok(())
    }

    fn set_uniform(&mut self, slot: u32, value: UniformValue) -> Result<()> {
        self.require_recording("set_uniform")?;
        if !self.program_bound {
            crate::engine_bail!(SOURCE, "set_uniform({}) without a bound program", slot);
        }
        self.commands.push(RecordedCommand::SetUniform { slot, value });
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        self.require_recording("bind_texture")?;
        if self.write_targets.contains(&texture_identity(texture)) {
            crate::engine_bail!(
                SOURCE,
                "Texture '{}' is sampled while attached to the bound framebuffer",
                texture.info().label
            );
        }
        if !texture.info().usage.is_sampled() {
            crate::engine_bail!(SOURCE, "Texture '{}' is not sampleable", texture.info().label);
        }
        self.commands.push(RecordedCommand::BindTexture {
            slot,
            texture: texture.info().label.clone(),
        });
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: &Arc<dyn Buffer>) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        if buffer.usage() != BufferUsage::Vertex {
            crate::engine_bail!(SOURCE, "Buffer '{}' is not a vertex buffer", buffer.label());
        }
        self.commands.push(RecordedCommand::BindVertexBuffer {
            slot,
            buffer: buffer.label().to_string(),
        });
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        if buffer.usage() != BufferUsage::Index {
            crate::engine_bail!(SOURCE, "Buffer '{}' is not an index buffer", buffer.label());
        }
        self.commands.push(RecordedCommand::BindIndexBuffer {
            buffer: buffer.label().to_string(),
            index_type,
        });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        first_index: u32,
    ) -> Result<()> {
        self.require_recording("draw_indexed")?;
        if !self.pass_active {
            crate::engine_bail!(SOURCE, "draw_indexed outside a render pass");
        }
        if !self.program_bound {
            crate::engine_bail!(SOURCE, "draw_indexed without a bound program");
        }
        self.commands.push(RecordedCommand::DrawIndexed { topology, index_count, first_index });
        Ok(())
    }
}

// ============================================================================
// Device
// ============================================================================

/// Headless [`GraphicsDevice`]
pub struct RecordingGraphicsDevice {
    config: DeviceConfig,
    journal: RecordingJournal,
    stats: DeviceStats,
    surface: Arc<dyn Framebuffer>,
}

impl RecordingGraphicsDevice {
    pub fn new(config: DeviceConfig) -> Self {
        let surface = Self::create_surface(config.surface_width, config.surface_height);
        Self {
            config,
            journal: RecordingJournal::default(),
            stats: DeviceStats::default(),
            surface,
        }
    }

    /// Handle on the submitted frames, valid after the device is moved into a scene
    pub fn journal(&self) -> RecordingJournal {
        self.journal.clone()
    }

    fn create_surface(width: u32, height: u32) -> Arc<dyn Framebuffer> {
        let attachment = |label: &str, format: TextureFormat, usage: TextureUsage| -> Arc<dyn RenderTarget> {
            let texture: Arc<dyn Texture> = Arc::new(RecordingTexture {
                info: TextureInfo {
                    label: label.to_string(),
                    width,
                    height,
                    format,
                    usage,
                    kind: TextureKind::D2,
                },
            });
            Arc::new(RecordingRenderTarget { texture, layer: 0 })
        };
        Arc::new(RecordingFramebuffer {
            label: "surface".to_string(),
            width,
            height,
            color: Some(attachment("surface.color", TextureFormat::R8G8B8A8_UNORM, TextureUsage::RenderTarget)),
            depth: Some(attachment("surface.depth", TextureFormat::D16_UNORM, TextureUsage::DepthStencil)),
        })
    }

    fn compile_stage(program: &str, stage: ShaderStage, source: &str) -> Result<()> {
        let diagnostic = if source.trim().is_empty() {
            Some("ERROR: 0:1: '' : syntax error: empty translation unit")
        } else if !source.contains("void main") {
            Some("ERROR: 0:1: 'main' : function not defined")
        } else {
            None
        };
        match diagnostic {
            Some(diagnostic) => Err(crate::engine_fail!(SOURCE, Error::ShaderCompile {
                program: program.to_string(),
                stage,
                diagnostic: diagnostic.to_string(),
            })),
            None => Ok(()),
        }
    }
}

impl GraphicsDevice for RecordingGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc, data: &[u8]) -> Result<Arc<dyn Buffer>> {
        if data.is_empty() {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Buffer '{}' created without data",
                desc.label
            ))));
        }
        crate::engine_trace!(SOURCE, "Creating buffer '{}' ({} bytes)", desc.label, data.len());
        self.stats.buffers += 1;
        Ok(Arc::new(RecordingBuffer {
            label: desc.label,
            size: data.len() as u64,
            usage: desc.usage,
        }))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        let invalid = |reason: String| crate::engine_fail!(SOURCE, Error::InvalidResource(reason));

        if desc.width == 0 || desc.height == 0 {
            return Err(invalid(format!("Texture '{}' has a zero dimension", desc.label)));
        }
        if desc.width > self.config.max_texture_size || desc.height > self.config.max_texture_size {
            return Err(invalid(format!(
                "Texture '{}' exceeds the maximum size {}",
                desc.label, self.config.max_texture_size
            )));
        }
        if desc.kind == TextureKind::Cube && desc.width != desc.height {
            return Err(invalid(format!("Cube texture '{}' must have square faces", desc.label)));
        }
        if desc.format == TextureFormat::R32G32B32A32_SFLOAT && !self.config.float_textures {
            return Err(invalid(format!("Float texture '{}' is not supported", desc.label)));
        }
        if let Some(data) = &desc.data {
            if data.len() != desc.expected_data_len() {
                return Err(invalid(format!(
                    "Texture '{}' data is {} bytes, expected {}",
                    desc.label,
                    data.len(),
                    desc.expected_data_len()
                )));
            }
        }

        crate::engine_trace!(
            SOURCE,
            "Creating texture '{}' ({}x{} {:?} {:?})",
            desc.label, desc.width, desc.height, desc.format, desc.kind
        );
        self.stats.textures += 1;
        Ok(Arc::new(RecordingTexture { info: TextureInfo::from(&desc) }))
    }

    fn create_shader_program(&mut self, desc: ShaderProgramDesc) -> Result<Arc<dyn ShaderProgram>> {
        Self::compile_stage(&desc.name, ShaderStage::Vertex, &desc.vertex_source)?;
        Self::compile_stage(&desc.name, ShaderStage::Fragment, &desc.fragment_source)?;

        let missing: Vec<&str> = desc.interface.glsl_names()
            .filter(|name| !desc.vertex_source.contains(name) && !desc.fragment_source.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(crate::engine_fail!(SOURCE, Error::ShaderLink {
                program: desc.name.clone(),
                diagnostic: format!("active interface variables not found: {}", missing.join(", ")),
            }));
        }

        crate::engine_debug!(SOURCE, "Linked program '{}'", desc.name);
        self.stats.programs += 1;
        Ok(Arc::new(RecordingProgram { name: desc.name, interface: desc.interface }))
    }

    fn create_render_target(
        &mut self,
        texture: &Arc<dyn Texture>,
        layer: u32,
    ) -> Result<Arc<dyn RenderTarget>> {
        let info = texture.info();
        if !info.usage.is_attachment() {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Texture '{}' cannot be rendered to",
                info.label
            ))));
        }
        if layer >= info.kind.layer_count() {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Layer {} out of range for texture '{}'",
                layer, info.label
            ))));
        }
        Ok(Arc::new(RecordingRenderTarget { texture: texture.clone(), layer }))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let (width, height) = desc.extent().ok_or_else(|| crate::engine_fail!(
            SOURCE,
            Error::InvalidResource(format!(
                "Framebuffer '{}' has no attachments or mismatched attachment sizes",
                desc.label
            ))
        ))?;
        if desc.color.as_ref().is_some_and(|c| c.texture().info().format.is_depth()) {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Framebuffer '{}' uses a depth texture as color attachment",
                desc.label
            ))));
        }
        if desc.depth.as_ref().is_some_and(|d| !d.texture().info().format.is_depth()) {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Framebuffer '{}' depth attachment has a color format",
                desc.label
            ))));
        }

        self.stats.framebuffers += 1;
        Ok(Arc::new(RecordingFramebuffer {
            label: desc.label.clone(),
            width,
            height,
            color: desc.color.clone(),
            depth: desc.depth.clone(),
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(RecordingCommandList::new(self.journal.clone())))
    }

    fn submit(&mut self, _commands: &dyn CommandList) -> Result<()> {
        let mut state = self.journal.lock()?;
        let Some(frame) = state.pending.take() else {
            crate::engine_bail!(SOURCE, "Submitted a command list that was not ended");
        };
        let draws = frame.iter()
            .filter(|command| matches!(command, RecordedCommand::DrawIndexed { .. }))
            .count() as u32;
        state.frames.push(frame);
        self.stats.submitted_command_lists += 1;
        self.stats.draw_calls += draws;
        Ok(())
    }

    fn presentation_framebuffer(&self) -> Arc<dyn Framebuffer> {
        self.surface.clone()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(crate::engine_fail!(SOURCE, Error::InvalidResource(format!(
                "Cannot resize surface to {}x{}",
                width, height
            ))));
        }
        self.config.surface_width = width;
        self.config.surface_height = height;
        self.surface = Self::create_surface(width, height);
        Ok(())
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            float_textures: self.config.float_textures,
            max_texture_size: self.config.max_texture_size,
        }
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "recording_device_tests.rs"]
mod tests;
