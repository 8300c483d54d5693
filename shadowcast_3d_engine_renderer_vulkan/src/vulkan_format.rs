/// Engine enum → Vulkan conversions
///
/// Pure mappings, kept free of device state so they can be tested without a GPU.

use ash::vk;
use shadowcast_3d_engine::shadowcast3d::render::{
    BufferUsage, ClearValue, IndexType, PrimitiveTopology, TextureFormat, TextureKind,
    TextureUsage, Viewport,
};

pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
    }
}

pub(crate) fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Image usage flags for a declared `TextureUsage`
pub(crate) fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    match usage {
        TextureUsage::Sampled => {
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST
        }
        // The presentation surface is blitted to the swapchain
        TextureUsage::RenderTarget => {
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC
        }
        TextureUsage::SampledAndRenderTarget => {
            vk::ImageUsageFlags::SAMPLED
                | vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_DST
        }
        TextureUsage::DepthStencil => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
    }
}

pub(crate) fn image_create_flags(kind: TextureKind) -> vk::ImageCreateFlags {
    match kind {
        TextureKind::D2 => vk::ImageCreateFlags::empty(),
        TextureKind::Cube => vk::ImageCreateFlags::CUBE_COMPATIBLE,
    }
}

pub(crate) fn view_type(kind: TextureKind) -> vk::ImageViewType {
    match kind {
        TextureKind::D2 => vk::ImageViewType::TYPE_2D,
        TextureKind::Cube => vk::ImageViewType::CUBE,
    }
}

/// Layout a color attachment is left in at the end of its render pass
pub(crate) fn color_final_layout(usage: TextureUsage) -> vk::ImageLayout {
    if usage.is_sampled() {
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    } else {
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    }
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
    }
}

/// Convert a bottom-left-origin viewport into Vulkan's top-left space
///
/// With `flip_y` the viewport height is negated so +Y points up on screen.
/// Offscreen targets are not flipped: their row 0 is the bottom row, the
/// memory layout the shadow lookups sample with.
pub(crate) fn viewport_to_vk(viewport: Viewport, target_height: u32, flip_y: bool) -> vk::Viewport {
    let (y, height) = if flip_y {
        (target_height as f32 - viewport.y, -viewport.height)
    } else {
        (viewport.y, viewport.height)
    };
    vk::Viewport {
        x: viewport.x,
        y,
        width: viewport.width,
        height,
        min_depth: viewport.min_depth,
        max_depth: viewport.max_depth,
    }
}

/// Clear values in attachment order: color first, then depth
///
/// Each attachment takes the first matching entry of `clear_values`, falling
/// back to opaque black and depth 1.0.
pub(crate) fn attachment_clear_values(
    clear_values: &[ClearValue],
    has_color: bool,
    has_depth: bool,
) -> Vec<vk::ClearValue> {
    let mut values = Vec::with_capacity(2);
    if has_color {
        let color = clear_values.iter().find_map(|value| match value {
            ClearValue::Color(color) => Some(*color),
            _ => None,
        });
        values.push(vk::ClearValue {
            color: vk::ClearColorValue { float32: color.unwrap_or([0.0, 0.0, 0.0, 1.0]) },
        });
    }
    if has_depth {
        let (depth, stencil) = clear_values.iter().find_map(|value| match value {
            ClearValue::DepthStencil { depth, stencil } => Some((*depth, *stencil)),
            _ => None,
        }).unwrap_or((1.0, 0));
        values.push(vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        });
    }
    values
}

/// Largest rectangle of `source`'s aspect ratio centered in `target`
pub(crate) fn letterbox(source: (u32, u32), target: vk::Extent2D) -> vk::Rect2D {
    let (source_width, source_height) = (source.0.max(1) as f32, source.1.max(1) as f32);
    let scale = (target.width as f32 / source_width).min(target.height as f32 / source_height);
    let width = ((source_width * scale).round() as u32).clamp(1, target.width.max(1));
    let height = ((source_height * scale).round() as u32).clamp(1, target.height.max(1));
    vk::Rect2D {
        offset: vk::Offset2D {
            x: ((target.width.saturating_sub(width)) / 2) as i32,
            y: ((target.height.saturating_sub(height)) / 2) as i32,
        },
        extent: vk::Extent2D { width, height },
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
