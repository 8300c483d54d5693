/// Texture - Vulkan implementation of the engine Texture trait

use std::sync::Arc;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{
    Texture as RendererTexture, TextureDesc, TextureInfo,
};
use shadowcast_3d_engine::{engine_bail, engine_err};

use crate::vulkan_buffer::HostBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    aspect_mask, image_create_flags, texture_format_to_vk, texture_usage_to_vk, view_type,
};
use crate::SOURCE;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    /// Whole-image view: 2D, or CUBE over all six layers
    pub(crate) view: vk::ImageView,
    pub(crate) format: vk::Format,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl Texture {
    /// Create the image, its memory and view, then upload `desc.data`
    ///
    /// Sampled textures created without data are moved straight to
    /// `SHADER_READ_ONLY_OPTIMAL`, so they can be sampled before their first
    /// render pass.
    pub(crate) fn new(ctx: &Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        let format = texture_format_to_vk(desc.format);
        let layers = desc.kind.layer_count();
        let aspect = aspect_mask(desc.format);

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .flags(image_create_flags(desc.kind))
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(1)
                .array_layers(layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(texture_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image '{}': {:?}", desc.label, e))?;

            let mut texture = Self {
                ctx: Arc::clone(ctx),
                image,
                view: vk::ImageView::null(),
                format,
                allocation: None,
                info: TextureInfo::from(desc),
            };

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocate(&desc.label, requirements, MemoryLocation::GpuOnly, false)?;
            ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!(SOURCE, "Failed to bind texture memory for '{}': {:?}", desc.label, e))?;
            texture.allocation = Some(allocation);

            texture.view = texture.create_view(view_type(desc.kind), 0, layers)?;

            match &desc.data {
                Some(data) => texture.upload(data)?,
                None if desc.usage.is_sampled() => texture.make_shader_readable()?,
                None => {}
            }

            Ok(texture)
        }
    }

    /// View of `layer_count` layers starting at `base_layer`
    pub(crate) fn create_view(
        &self,
        view_type: vk::ImageViewType,
        base_layer: u32,
        layer_count: u32,
    ) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(self.image)
            .view_type(view_type)
            .format(self.format)
            .components(vk::ComponentMapping::default())
            .subresource_range(self.subresource_range(base_layer, layer_count));

        unsafe {
            self.ctx.device.create_image_view(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create view of '{}': {:?}", self.info.label, e))
        }
    }

    fn subresource_range(&self, base_layer: u32, layer_count: u32) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: aspect_mask(self.info.format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: base_layer,
            layer_count,
        }
    }

    fn upload(&self, data: &[u8]) -> Result<()> {
        if self.info.format.is_depth() {
            engine_bail!(SOURCE, "Depth texture '{}' cannot be created with data", self.info.label);
        }

        let staging = HostBuffer::new(
            &self.ctx,
            "texture staging",
            data.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
        )?;
        staging.write(0, data)?;

        let layers = self.info.kind.layer_count();
        let layer_size = data.len() as u64 / layers as u64;
        let regions: Vec<vk::BufferImageCopy> = (0..layers)
            .map(|layer| vk::BufferImageCopy {
                buffer_offset: layer as u64 * layer_size,
                buffer_row_length: 0,
                buffer_image_height: 0,
                image_subresource: vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: layer,
                    layer_count: 1,
                },
                image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
                image_extent: vk::Extent3D { width: self.info.width, height: self.info.height, depth: 1 },
            })
            .collect();

        let range = self.subresource_range(0, layers);
        let image = self.image;
        let staging_buffer = staging.buffer;

        self.ctx.submit_one_shot(|device, cb| unsafe {
            let to_transfer = layout_barrier(
                image, range,
                vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::empty(), vk::AccessFlags::TRANSFER_WRITE,
            );
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_transfer],
            );

            device.cmd_copy_buffer_to_image(
                cb,
                staging_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &regions,
            );

            let to_shader = layout_barrier(
                image, range,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::SHADER_READ,
            );
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_shader],
            );
        })
    }

    fn make_shader_readable(&self) -> Result<()> {
        let barrier = layout_barrier(
            self.image,
            self.subresource_range(0, self.info.kind.layer_count()),
            vk::ImageLayout::UNDEFINED, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::AccessFlags::empty(), vk::AccessFlags::SHADER_READ,
        );
        self.ctx.submit_one_shot(|device, cb| unsafe {
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[], &[], &[barrier],
            );
        })
    }

    /// Reinterpret an engine texture created by this backend
    pub(crate) fn downcast(texture: &dyn RendererTexture) -> &Texture {
        unsafe { &*(texture as *const dyn RendererTexture as *const Texture) }
    }
}

/// Layout transition of a whole subresource range
pub(crate) fn layout_barrier(
    image: vk::Image,
    range: vk::ImageSubresourceRange,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(range)
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
}

impl RendererTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
