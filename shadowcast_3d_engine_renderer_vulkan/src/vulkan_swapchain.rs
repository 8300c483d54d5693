/// Swapchain - window presentation of the offscreen surface
///
/// The engine never renders into swapchain images directly. Each frame that
/// drew into the presentation framebuffer gets a second command buffer that
/// clears the acquired image and blits the surface into it, letterboxed.

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::{Error, Result};
use shadowcast_3d_engine::{engine_bail, engine_debug, engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::letterbox;
use crate::vulkan_texture::layout_barrier;
use crate::SOURCE;

const COLOR_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

const COLOR_LAYER: vk::ImageSubresourceLayers = vk::ImageSubresourceLayers {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    mip_level: 0,
    base_array_layer: 0,
    layer_count: 1,
};

/// UNORM formats only: the surface already holds display values
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    [vk::Format::B8G8R8A8_UNORM, vk::Format::R8G8B8A8_UNORM]
        .iter()
        .find_map(|wanted| formats.iter().find(|f| f.format == *wanted))
        .or_else(|| formats.first())
        .copied()
}

pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
            height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
        }
    }
}

pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

pub(crate) struct Swapchain {
    ctx: Arc<GpuContext>,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,

    /// Frames are fenced one at a time, so one acquire semaphore suffices
    image_available: vk::Semaphore,
    /// One per swapchain image, waited on by present
    render_finished: Vec<vk::Semaphore>,

    /// Zero-sized window: nothing to present until the next recreate
    suspended: bool,
}

impl Swapchain {
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let init_error = |what: &str, e: vk::Result| {
            engine_error!(SOURCE, "{}: {:?}", what, e);
            Error::InitializationFailed(format!("{}: {:?}", what, e))
        };

        unsafe {
            let formats = surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
                .map_err(|e| init_error("Failed to get surface formats", e))?;
            let format = choose_surface_format(&formats)
                .ok_or_else(|| init_error("Surface reports no formats", vk::Result::ERROR_FORMAT_NOT_SUPPORTED))?;

            let image_available = ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| init_error("Failed to create image-available semaphore", e))?;

            let mut swapchain = Self {
                ctx: Arc::clone(ctx),
                surface,
                surface_loader,
                swapchain: vk::SwapchainKHR::null(),
                swapchain_loader: ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device),
                images: Vec::new(),
                format,
                extent: vk::Extent2D { width: 0, height: 0 },
                image_available,
                render_finished: Vec::new(),
                suspended: false,
            };
            swapchain.recreate(width, height)?;
            Ok(swapchain)
        }
    }

    pub(crate) fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub(crate) fn image_available(&self) -> vk::Semaphore {
        self.image_available
    }

    pub(crate) fn render_finished(&self, image_index: u32) -> vk::Semaphore {
        self.render_finished[image_index as usize]
    }

    /// Index of the next image, `None` when the swapchain must be recreated first
    pub(crate) fn acquire_next_image(&mut self) -> Result<Option<u32>> {
        if self.suspended {
            return Ok(None);
        }
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            ) {
                Ok((index, _suboptimal)) => Ok(Some(index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
                Err(e) => Err(engine_err!(SOURCE, "Failed to acquire swapchain image: {:?}", e)),
            }
        }
    }

    /// Record the copy of `source` (a `src_width` x `src_height` color image left
    /// in `COLOR_ATTACHMENT_OPTIMAL`) into swapchain image `image_index`
    pub(crate) fn record_present(
        &self,
        cb: vk::CommandBuffer,
        source: vk::Image,
        src_width: u32,
        src_height: u32,
        image_index: u32,
    ) -> Result<()> {
        let Some(&target) = self.images.get(image_index as usize) else {
            engine_bail!(SOURCE,
                "Swapchain image {} out of range (count: {})", image_index, self.images.len());
        };
        let device = &self.ctx.device;
        let area = letterbox((src_width, src_height), self.extent);

        unsafe {
            let to_transfer = [
                layout_barrier(
                    source, COLOR_RANGE,
                    vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::TRANSFER_READ,
                ),
                layout_barrier(
                    target, COLOR_RANGE,
                    vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::AccessFlags::empty(), vk::AccessFlags::TRANSFER_WRITE,
                ),
            ];
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[], &[], &to_transfer,
            );

            // Bars outside the letterboxed area
            let black = vk::ClearColorValue { float32: [0.0, 0.0, 0.0, 1.0] };
            device.cmd_clear_color_image(cb, target, vk::ImageLayout::TRANSFER_DST_OPTIMAL, &black, &[COLOR_RANGE]);

            let clear_to_blit = layout_barrier(
                target, COLOR_RANGE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::TRANSFER_WRITE,
            );
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[], &[], &[clear_to_blit],
            );

            let region = vk::ImageBlit {
                src_subresource: COLOR_LAYER,
                src_offsets: [
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D { x: src_width as i32, y: src_height as i32, z: 1 },
                ],
                dst_subresource: COLOR_LAYER,
                dst_offsets: [
                    vk::Offset3D { x: area.offset.x, y: area.offset.y, z: 0 },
                    vk::Offset3D {
                        x: area.offset.x + area.extent.width as i32,
                        y: area.offset.y + area.extent.height as i32,
                        z: 1,
                    },
                ],
            };
            device.cmd_blit_image(
                cb,
                source, vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                target, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
                vk::Filter::LINEAR,
            );

            let to_present = layout_barrier(
                target, COLOR_RANGE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::PRESENT_SRC_KHR,
                vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::empty(),
            );
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_present],
            );
        }
        Ok(())
    }

    /// Present `image_index`; `false` when the swapchain must be recreated
    pub(crate) fn present(&self, image_index: u32) -> Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [self.render_finished(image_index)];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.swapchain_loader.queue_present(self.ctx.graphics_queue, &present_info) {
                Ok(false) => Ok(true),
                Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(false),
                Err(e) => Err(engine_err!(SOURCE, "Failed to present swapchain image: {:?}", e)),
            }
        }
    }

    /// Rebuild the swapchain for a `width` x `height` window
    pub(crate) fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        let device = &self.ctx.device;
        unsafe {
            device.device_wait_idle()
                .map_err(|e| engine_err!(SOURCE, "Failed to wait idle before swapchain recreate: {:?}", e))?;

            let capabilities = self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| engine_err!(SOURCE, "Failed to get surface capabilities: {:?}", e))?;
            let extent = choose_extent(&capabilities, width, height);
            if extent.width == 0 || extent.height == 0 {
                engine_debug!(SOURCE, "Window has no area, presentation suspended");
                self.suspended = true;
                return Ok(());
            }

            let old_swapchain = self.swapchain;
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(self.format.format)
                .image_color_space(self.format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self.swapchain_loader.create_swapchain(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create swapchain: {:?}", e))?;
            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = self.swapchain_loader.get_swapchain_images(swapchain)
                .map_err(|e| engine_err!(SOURCE, "Failed to get swapchain images: {:?}", e))?;

            for semaphore in self.render_finished.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for _ in 0..self.images.len() {
                let semaphore = device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| engine_err!(SOURCE, "Failed to create render-finished semaphore: {:?}", e))?;
                self.render_finished.push(semaphore);
            }
        }

        self.suspended = false;
        engine_debug!(SOURCE,
            "Swapchain ready: {}x{}, {} images, {:?}",
            self.extent.width, self.extent.height, self.images.len(), self.format.format);
        Ok(())
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            self.ctx.device.destroy_semaphore(self.image_available, None);
            for &semaphore in &self.render_finished {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
