/// RenderPass - clear-and-store pass over an optional color and depth attachment

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::engine_err;

use crate::vulkan_context::GpuContext;
use crate::SOURCE;

/// Attachment formats and the color layout a pass ends in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RenderPassKey {
    pub color: Option<(vk::Format, vk::ImageLayout)>,
    pub depth: Option<vk::Format>,
}

impl RenderPassKey {
    /// Formats only: pipelines built for one pass work with every pass sharing them
    pub(crate) fn compatibility(&self) -> (Option<vk::Format>, Option<vk::Format>) {
        (self.color.map(|(format, _)| format), self.depth)
    }
}

pub(crate) struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) key: RenderPassKey,
}

impl RenderPass {
    /// Every attachment is cleared on load; depth is discarded at the end
    pub(crate) fn new(ctx: &Arc<GpuContext>, key: RenderPassKey) -> Result<Self> {
        let mut attachments = Vec::with_capacity(2);
        let mut color_refs = Vec::with_capacity(1);
        let mut depth_ref = None;

        if let Some((format, final_layout)) = key.color {
            color_refs.push(vk::AttachmentReference {
                attachment: attachments.len() as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });
            attachments.push(vk::AttachmentDescription {
                format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout,
                ..Default::default()
            });
        }

        if let Some(format) = key.depth {
            depth_ref = Some(vk::AttachmentReference {
                attachment: attachments.len() as u32,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            });
            attachments.push(vk::AttachmentDescription {
                format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                ..Default::default()
            });
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let attachment_stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
            | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
        let attachment_writes = vk::AccessFlags::COLOR_ATTACHMENT_WRITE
            | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;

        // Earlier passes may still sample (or write) what this pass overwrites,
        // and later passes sample or blit what it stores.
        let dependencies = [
            vk::SubpassDependency {
                src_subpass: vk::SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage_mask: attachment_stages | vk::PipelineStageFlags::FRAGMENT_SHADER
                    | vk::PipelineStageFlags::TRANSFER,
                dst_stage_mask: attachment_stages,
                src_access_mask: attachment_writes,
                dst_access_mask: attachment_writes
                    | vk::AccessFlags::COLOR_ATTACHMENT_READ
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
                dependency_flags: vk::DependencyFlags::empty(),
            },
            vk::SubpassDependency {
                src_subpass: 0,
                dst_subpass: vk::SUBPASS_EXTERNAL,
                src_stage_mask: attachment_stages,
                dst_stage_mask: vk::PipelineStageFlags::FRAGMENT_SHADER
                    | vk::PipelineStageFlags::TRANSFER,
                src_access_mask: attachment_writes,
                dst_access_mask: vk::AccessFlags::SHADER_READ | vk::AccessFlags::TRANSFER_READ,
                dependency_flags: vk::DependencyFlags::empty(),
            },
        ];

        let subpasses = [subpass];
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            ctx.device.create_render_pass(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create render pass: {:?}", e))?
        };

        Ok(Self { ctx: Arc::clone(ctx), render_pass, key })
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
