/// VulkanGraphicsDevice - Vulkan implementation of the engine GraphicsDevice trait

use std::ffi::c_char;
use std::sync::Arc;
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use shadowcast_3d_engine::shadowcast3d::{Error, Result};
use shadowcast_3d_engine::shadowcast3d::render::{
    Buffer as RendererBuffer, BufferDesc, CommandList as RendererCommandList, DeviceCapabilities,
    DeviceConfig, DeviceStats, Framebuffer as RendererFramebuffer, FramebufferDesc, GraphicsDevice,
    RenderTarget as RendererRenderTarget, ShaderProgram as RendererShaderProgram, ShaderProgramDesc,
    Texture as RendererTexture, TextureDesc, TextureFormat, TextureKind, TextureUsage,
};
use shadowcast_3d_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_fail, engine_info, engine_trace};

use crate::vulkan_buffer::{Buffer, HostBuffer};
use crate::vulkan_command_list::{CommandList, FrameShared};
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::color_final_layout;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_render_pass::{RenderPass, RenderPassKey};
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sampler::SamplerSet;
use crate::vulkan_shader::ShaderProgram;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::Texture;
use crate::SOURCE;

fn init_error(what: &str, detail: impl std::fmt::Debug) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, detail);
    Error::InitializationFailed(format!("{}: {:?}", what, detail))
}

fn invalid(reason: String) -> Error {
    engine_fail!(SOURCE, Error::InvalidResource(reason))
}

/// Both features the shadow cubes need: render into it, then sample it
pub(crate) fn supports_float_targets(features: vk::FormatFeatureFlags) -> bool {
    features.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT | vk::FormatFeatureFlags::SAMPLED_IMAGE)
}

/// Device-reported limits never raise the configured maximum
pub(crate) fn max_texture_size(configured: u32, limits: &vk::PhysicalDeviceLimits) -> u32 {
    configured
        .min(limits.max_image_dimension2_d)
        .min(limits.max_image_dimension_cube)
}

/// Render pass cache shared by every framebuffer with the same attachments
type RenderPassCache = FxHashMap<RenderPassKey, Arc<RenderPass>>;

fn cached_render_pass(ctx: &Arc<GpuContext>, cache: &mut RenderPassCache, key: RenderPassKey) -> Result<Arc<RenderPass>> {
    if let Some(render_pass) = cache.get(&key) {
        return Ok(Arc::clone(render_pass));
    }
    let render_pass = Arc::new(RenderPass::new(ctx, key)?);
    cache.insert(key, Arc::clone(&render_pass));
    Ok(render_pass)
}

/// Offscreen color and depth the engine renders its visible frame into
struct SurfaceTargets {
    color: Arc<dyn RendererTexture>,
    framebuffer: Arc<dyn RendererFramebuffer>,
}

impl SurfaceTargets {
    fn new(ctx: &Arc<GpuContext>, cache: &mut RenderPassCache, width: u32, height: u32) -> Result<Self> {
        let texture = |label: &str, format: TextureFormat, usage: TextureUsage| -> Result<Arc<dyn RendererTexture>> {
            Ok(Arc::new(Texture::new(ctx, &TextureDesc {
                label: label.to_string(),
                width,
                height,
                format,
                usage,
                kind: TextureKind::D2,
                data: None,
            })?))
        };
        let color = texture("surface.color", TextureFormat::R8G8B8A8_UNORM, TextureUsage::RenderTarget)?;
        let depth = texture("surface.depth", TextureFormat::D16_UNORM, TextureUsage::DepthStencil)?;

        let color_target = RenderTarget::new(ctx, &color, 0)?;
        let depth_target = RenderTarget::new(ctx, &depth, 0)?;
        let key = RenderPassKey {
            color: Some((color_target.format, color_final_layout(TextureUsage::RenderTarget))),
            depth: Some(depth_target.format),
        };
        let render_pass = cached_render_pass(ctx, cache, key)?;
        let color_target: Arc<dyn RendererRenderTarget> = Arc::new(color_target);
        let depth_target: Arc<dyn RendererRenderTarget> = Arc::new(depth_target);

        let framebuffer = Framebuffer::new(
            ctx,
            render_pass,
            "surface",
            width,
            height,
            Some(color_target),
            Some(depth_target),
            true,
        )?;
        Ok(Self { color, framebuffer: Arc::new(framebuffer) })
    }
}

/// Vulkan graphics device
///
/// Every submission is fenced: `submit` returns once the GPU has finished
/// the frame, so command lists and their resources can be reused right away.
pub struct VulkanGraphicsDevice {
    config: DeviceConfig,
    capabilities: DeviceCapabilities,
    stats: DeviceStats,

    frame_fence: vk::Fence,
    present_pool: vk::CommandPool,
    present_cb: vk::CommandBuffer,

    render_passes: RenderPassCache,
    shared: Arc<FrameShared>,
    surface: SurfaceTargets,
    swapchain: Swapchain,

    ctx: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    /// Create a device presenting to `window`
    ///
    /// The engine surface starts at `config.surface_width` x `config.surface_height`;
    /// `config.float_textures` and `config.max_texture_size` are upper bounds
    /// that the physical device may lower.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: DeviceConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_error("Failed to load Vulkan library", e))?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Shadowcast3D Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Shadowcast3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| init_error("Failed to get display handle", e))?;
            let window_handle = window.window_handle()
                .map_err(|e| init_error("Failed to get window handle", e))?;

            #[allow(unused_mut)]
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_error("Failed to get required extensions", e))?
                .to_vec();
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const c_char> = Vec::new();
            #[cfg(feature = "vulkan-validation")]
            {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(crate::debug::VALIDATION_LAYER.as_ptr());
            }

            let instance_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry.create_instance(&instance_info, None)
                .map_err(|e| init_error("Failed to create Vulkan instance", e))?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = Some(crate::debug::create_messenger(&entry, &instance)?);
            #[cfg(not(feature = "vulkan-validation"))]
            let debug_messenger = None;

            // Kept for the lifetime of the swapchain
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_error("Failed to create surface", e))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let (physical_device, queue_family) = Self::pick_physical_device(&instance, &surface_loader, surface)?;
            let properties = instance.get_physical_device_properties(physical_device);
            engine_info!(SOURCE, "Using GPU: {}",
                properties.device_name_as_c_str().map(|name| name.to_string_lossy()).unwrap_or_default());

            let supported = instance.get_physical_device_features(physical_device);
            let anisotropy = supported.sampler_anisotropy == vk::TRUE;
            let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(anisotropy);

            let queue_priorities = [1.0];
            let queue_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];
            let device_extensions = [ash::khr::swapchain::NAME.as_ptr()];
            let device_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_infos)
                .enabled_extension_names(&device_extensions)
                .enabled_features(&features);
            let device = instance.create_device(physical_device, &device_info, None)
                .map_err(|e| init_error("Failed to create logical device", e))?;
            let queue = device.get_device_queue(queue_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_error("Failed to create GPU allocator", e))?;

            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device.create_command_pool(&upload_pool_info, None)
                .map_err(|e| init_error("Failed to create upload command pool", e))?;

            // From here on every Vulkan object is released through the context
            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                queue,
                queue_family,
                upload_command_pool,
                debug_messenger,
            ));
            let swapchain = Swapchain::new(&ctx, surface, surface_loader, config.surface_width, config.surface_height)?;

            let float_features = ctx.instance
                .get_physical_device_format_properties(physical_device, vk::Format::R32G32B32A32_SFLOAT)
                .optimal_tiling_features;
            let limits = ctx.limits();
            let capabilities = DeviceCapabilities {
                float_textures: config.float_textures && supports_float_targets(float_features),
                max_texture_size: max_texture_size(config.max_texture_size, &limits),
            };
            engine_debug!(SOURCE, "Device capabilities: {:?}", capabilities);

            let frame_fence = ctx.device.create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| init_error("Failed to create frame fence", e))?;
            let present_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let present_pool = ctx.device.create_command_pool(&present_pool_info, None)
                .map_err(|e| init_error("Failed to create present command pool", e))?;
            let present_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(present_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let present_cb = ctx.device.allocate_command_buffers(&present_allocate_info)
                .map_err(|e| init_error("Failed to allocate present command buffer", e))?
                .first()
                .copied()
                .ok_or_else(|| init_error("Present command buffer allocation", "returned nothing"))?;

            let shared = Arc::new(Self::create_frame_shared(&ctx, anisotropy, &limits)?);
            let mut render_passes = RenderPassCache::default();
            let surface = SurfaceTargets::new(&ctx, &mut render_passes, config.surface_width, config.surface_height)?;

            engine_info!(SOURCE, "Vulkan device ready ({}x{} surface)", config.surface_width, config.surface_height);
            Ok(Self {
                config,
                capabilities,
                stats: DeviceStats::default(),
                frame_fence,
                present_pool,
                present_cb,
                render_passes,
                shared,
                surface,
                swapchain,
                ctx,
            })
        }
    }

    /// First device with a queue family that both draws and presents, discrete GPUs first
    unsafe fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32)> {
        let physical_devices = instance.enumerate_physical_devices()
            .map_err(|e| init_error("Failed to enumerate physical devices", e))?;

        let mut candidates: Vec<(vk::PhysicalDevice, u32, bool)> = physical_devices
            .into_iter()
            .filter_map(|physical_device| {
                let families = instance.get_physical_device_queue_family_properties(physical_device);
                let family = (0..families.len() as u32).find(|&index| {
                    families[index as usize].queue_flags.contains(vk::QueueFlags::GRAPHICS)
                        && surface_loader
                            .get_physical_device_surface_support(physical_device, index, surface)
                            .unwrap_or(false)
                })?;
                let discrete = instance.get_physical_device_properties(physical_device).device_type
                    == vk::PhysicalDeviceType::DISCRETE_GPU;
                Some((physical_device, family, discrete))
            })
            .collect();
        candidates.sort_by_key(|(_, _, discrete)| !discrete);

        candidates.first()
            .map(|(physical_device, family, _)| (*physical_device, *family))
            .ok_or_else(|| init_error("No GPU can draw to this window", vk::Result::ERROR_INCOMPATIBLE_DRIVER))
    }

    fn create_frame_shared(
        ctx: &Arc<GpuContext>,
        anisotropy: bool,
        limits: &vk::PhysicalDeviceLimits,
    ) -> Result<FrameShared> {
        let white = |label: &str, kind: TextureKind| -> Result<Arc<dyn RendererTexture>> {
            let desc = TextureDesc {
                label: label.to_string(),
                width: 1,
                height: 1,
                format: TextureFormat::R8G8B8A8_UNORM,
                usage: TextureUsage::Sampled,
                kind,
                data: Some(vec![255; 4 * kind.layer_count() as usize]),
            };
            Ok(Arc::new(Texture::new(ctx, &desc)?))
        };

        let zero_vertices = HostBuffer::new(ctx, "zero vertices", 16, vk::BufferUsageFlags::VERTEX_BUFFER)?;
        zero_vertices.write(0, &[0u8; 16])?;

        Ok(FrameShared {
            samplers: Arc::new(SamplerSet::new(ctx, anisotropy)?),
            fallback_2d: white("fallback.2d", TextureKind::D2)?,
            fallback_cube: white("fallback.cube", TextureKind::Cube)?,
            zero_vertices: Arc::new(zero_vertices),
            uniform_alignment: limits.min_uniform_buffer_offset_alignment,
        })
    }

    fn validate_texture(&self, desc: &TextureDesc) -> Result<()> {
        let max_size = self.capabilities.max_texture_size;
        if desc.width == 0 || desc.height == 0 {
            return Err(invalid(format!("Texture '{}' has a zero dimension", desc.label)));
        }
        if desc.width > max_size || desc.height > max_size {
            return Err(invalid(format!("Texture '{}' exceeds the maximum size {}", desc.label, max_size)));
        }
        if desc.kind == TextureKind::Cube && desc.width != desc.height {
            return Err(invalid(format!("Cube texture '{}' must have square faces", desc.label)));
        }
        if desc.format == TextureFormat::R32G32B32A32_SFLOAT && !self.capabilities.float_textures {
            return Err(invalid(format!("Float texture '{}' is not supported", desc.label)));
        }
        if let Some(data) = &desc.data {
            if data.len() != desc.expected_data_len() {
                return Err(invalid(format!(
                    "Texture '{}' data is {} bytes, expected {}",
                    desc.label, data.len(), desc.expected_data_len()
                )));
            }
        }
        Ok(())
    }

    /// Submit `command_buffers`, then block until they completed
    fn submit_and_wait(
        &self,
        command_buffers: &[vk::CommandBuffer],
        wait: Option<(vk::Semaphore, vk::PipelineStageFlags)>,
        signal: Option<vk::Semaphore>,
    ) -> Result<()> {
        let wait_semaphores: Vec<vk::Semaphore> = wait.iter().map(|(semaphore, _)| *semaphore).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = wait.iter().map(|(_, stage)| *stage).collect();
        let signal_semaphores: Vec<vk::Semaphore> = signal.into_iter().collect();

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx.device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.frame_fence)
                .map_err(|e| engine_err!(SOURCE, "Failed to submit frame: {:?}", e))?;
            self.ctx.device.wait_for_fences(&[self.frame_fence], true, u64::MAX)
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for frame: {:?}", e))?;
            self.ctx.device.reset_fences(&[self.frame_fence])
                .map_err(|e| engine_err!(SOURCE, "Failed to reset frame fence: {:?}", e))
        }
    }

    fn record_present(&self, image_index: u32) -> Result<()> {
        let source = Texture::downcast(self.surface.color.as_ref());
        let cb = self.present_cb;
        unsafe {
            self.ctx.device.reset_command_buffer(cb, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(SOURCE, "Failed to reset present command buffer: {:?}", e))?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx.device.begin_command_buffer(cb, &begin_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to begin present command buffer: {:?}", e))?;
        }
        self.swapchain.record_present(cb, source.image, self.config.surface_width, self.config.surface_height, image_index)?;
        unsafe {
            self.ctx.device.end_command_buffer(cb)
                .map_err(|e| engine_err!(SOURCE, "Failed to end present command buffer: {:?}", e))
        }
    }

    fn recreate_swapchain(&mut self) -> Result<()> {
        self.swapchain.recreate(self.config.surface_width, self.config.surface_height)
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc, data: &[u8]) -> Result<Arc<dyn RendererBuffer>> {
        if data.is_empty() {
            return Err(invalid(format!("Buffer '{}' created without data", desc.label)));
        }
        engine_trace!(SOURCE, "Creating buffer '{}' ({} bytes)", desc.label, data.len());
        let buffer = Buffer::new(&self.ctx, &desc, data)?;
        self.stats.buffers += 1;
        Ok(Arc::new(buffer))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn RendererTexture>> {
        self.validate_texture(&desc)?;
        engine_trace!(SOURCE,
            "Creating texture '{}' ({}x{} {:?} {:?})",
            desc.label, desc.width, desc.height, desc.format, desc.kind);
        let texture = Texture::new(&self.ctx, &desc)?;
        self.stats.textures += 1;
        Ok(Arc::new(texture))
    }

    fn create_shader_program(&mut self, desc: ShaderProgramDesc) -> Result<Arc<dyn RendererShaderProgram>> {
        let program = ShaderProgram::new(&self.ctx, &desc)?;
        self.stats.programs += 1;
        Ok(Arc::new(program))
    }

    fn create_render_target(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        layer: u32,
    ) -> Result<Arc<dyn RendererRenderTarget>> {
        let info = texture.info();
        if !info.usage.is_attachment() {
            return Err(invalid(format!("Texture '{}' cannot be rendered to", info.label)));
        }
        if layer >= info.kind.layer_count() {
            return Err(invalid(format!("Layer {} out of range for texture '{}'", layer, info.label)));
        }
        Ok(Arc::new(RenderTarget::new(&self.ctx, texture, layer)?))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn RendererFramebuffer>> {
        let (width, height) = desc.extent().ok_or_else(|| invalid(format!(
            "Framebuffer '{}' has no attachments or mismatched attachment sizes",
            desc.label
        )))?;
        if desc.color.as_ref().is_some_and(|c| c.texture().info().format.is_depth()) {
            return Err(invalid(format!("Framebuffer '{}' uses a depth texture as color attachment", desc.label)));
        }
        if desc.depth.as_ref().is_some_and(|d| !d.texture().info().format.is_depth()) {
            return Err(invalid(format!("Framebuffer '{}' depth attachment has a color format", desc.label)));
        }

        let key = RenderPassKey {
            color: desc.color.as_ref().map(|target| (
                RenderTarget::downcast(target.as_ref()).format,
                color_final_layout(target.texture().info().usage),
            )),
            depth: desc.depth.as_ref().map(|target| RenderTarget::downcast(target.as_ref()).format),
        };
        let render_pass = cached_render_pass(&self.ctx, &mut self.render_passes, key)?;
        let framebuffer = Framebuffer::new(
            &self.ctx,
            render_pass,
            &desc.label,
            width,
            height,
            desc.color.clone(),
            desc.depth.clone(),
            false,
        )?;
        self.stats.framebuffers += 1;
        Ok(Arc::new(framebuffer))
    }

    fn create_command_list(&self) -> Result<Box<dyn RendererCommandList>> {
        Ok(Box::new(CommandList::new(&self.ctx, &self.shared)?))
    }

    fn submit(&mut self, commands: &dyn RendererCommandList) -> Result<()> {
        let list = CommandList::downcast(commands);
        if list.is_recording() {
            engine_bail!(SOURCE, "Submitted a command list that was not ended");
        }
        let frame_cb = list.command_buffer();

        if list.rendered_surface() {
            match self.swapchain.acquire_next_image()? {
                Some(image_index) => {
                    self.record_present(image_index)?;
                    self.submit_and_wait(
                        &[frame_cb, self.present_cb],
                        Some((self.swapchain.image_available(), vk::PipelineStageFlags::TRANSFER)),
                        Some(self.swapchain.render_finished(image_index)),
                    )?;
                    if !self.swapchain.present(image_index)? {
                        self.recreate_swapchain()?;
                    }
                }
                None => {
                    self.submit_and_wait(&[frame_cb], None, None)?;
                    self.recreate_swapchain()?;
                }
            }
        } else {
            self.submit_and_wait(&[frame_cb], None, None)?;
        }

        self.stats.submitted_command_lists += 1;
        self.stats.draw_calls += list.draw_calls();
        Ok(())
    }

    fn presentation_framebuffer(&self) -> Arc<dyn RendererFramebuffer> {
        Arc::clone(&self.surface.framebuffer)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(invalid(format!("Cannot resize surface to {}x{}", width, height)));
        }
        self.wait_idle()?;
        self.surface = SurfaceTargets::new(&self.ctx, &mut self.render_passes, width, height)?;
        self.config.surface_width = width;
        self.config.surface_height = height;
        self.recreate_swapchain()?;
        engine_debug!(SOURCE, "Surface resized to {}x{}", width, height);
        Ok(())
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| engine_err!(SOURCE, "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            self.ctx.device.destroy_fence(self.frame_fence, None);
            // Frees the present command buffer too
            self.ctx.device.destroy_command_pool(self.present_pool, None);
        }
        self.render_passes.clear();
    }
}

#[cfg(test)]
#[path = "vulkan_tests.rs"]
mod tests;
