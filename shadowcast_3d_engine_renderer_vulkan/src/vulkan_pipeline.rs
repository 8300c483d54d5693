/// Graphics pipelines, built lazily per program from the state of a draw

use std::sync::Arc;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::PrimitiveTopology;
use shadowcast_3d_engine::{engine_debug, engine_err};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::topology_to_vk;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::ShaderProgram;
use crate::SOURCE;

/// Everything a pipeline depends on besides its program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    /// Color and depth formats of the pass
    pub formats: (Option<vk::Format>, Option<vk::Format>),
    pub topology: PrimitiveTopology,
    /// Bit `n` set when attribute slot `n` has no buffer; such inputs read zeros
    pub unbound: u32,
}

impl PipelineKey {
    pub(crate) fn is_unbound(&self, slot: usize) -> bool {
        self.unbound & (1 << slot) != 0
    }
}

/// One vertex binding per attribute slot, same index as the slot
///
/// Unbound attributes keep their binding with a zero stride, so every vertex
/// reads the start of the zero buffer.
pub(crate) fn vertex_input_layout(
    program: &ShaderProgram,
    key: &PipelineKey,
) -> (Vec<vk::VertexInputBindingDescription>, Vec<vk::VertexInputAttributeDescription>) {
    let attributes = &program.layout.attributes;
    let mut bindings = Vec::with_capacity(attributes.len());
    let mut descriptions = Vec::with_capacity(attributes.len());

    for (slot, input) in attributes.iter().enumerate() {
        let stride = if key.is_unbound(slot) { 0 } else { input.stride };
        bindings.push(vk::VertexInputBindingDescription {
            binding: slot as u32,
            stride,
            input_rate: vk::VertexInputRate::VERTEX,
        });
        descriptions.push(vk::VertexInputAttributeDescription {
            location: input.location,
            binding: slot as u32,
            format: input.format,
            offset: 0,
        });
    }

    (bindings, descriptions)
}

pub(crate) fn create_pipeline(
    ctx: &Arc<GpuContext>,
    program: &ShaderProgram,
    render_pass: &RenderPass,
    key: &PipelineKey,
) -> Result<vk::Pipeline> {
    let shader_stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(program.vertex_module)
            .name(c"main"),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(program.fragment_module)
            .name(c"main"),
    ];

    let (bindings, attributes) = vertex_input_layout(program, key);
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&bindings)
        .vertex_attribute_descriptions(&attributes);

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(topology_to_vk(key.topology))
        .primitive_restart_enable(false);

    // Viewport and scissor are dynamic
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .cull_mode(vk::CullModeFlags::NONE)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false)
        .line_width(1.0);

    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(key.formats.1.is_some())
        .depth_write_enable(key.formats.1.is_some())
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = key.formats.0
        .iter()
        .map(|_| vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false))
        .collect();
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(&color_blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
        .dynamic_states(&dynamic_states);

    let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .depth_stencil_state(&depth_stencil_state)
        .multisample_state(&multisample_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(program.pipeline_layout)
        .render_pass(render_pass.render_pass)
        .subpass(0);

    let pipelines = unsafe {
        ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create graphics pipeline: {:?}", e.1))?
    };

    let pipeline = pipelines.into_iter().next()
        .ok_or_else(|| engine_err!(SOURCE, "Pipeline creation returned nothing"))?;
    engine_debug!(SOURCE, "Pipeline built: {:?}", key);
    Ok(pipeline)
}
