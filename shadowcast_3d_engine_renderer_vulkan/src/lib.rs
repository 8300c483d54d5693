/*!
# Shadowcast3D Engine - Vulkan Backend

Vulkan implementation of the Shadowcast3D `GraphicsDevice` trait.

Uses `ash` for the Vulkan bindings, `gpu-allocator` for memory management and
`naga` to compile the engine's GLSL 450 programs to SPIR-V when a program is
created. Interface reflection runs on the naga IR, so a program whose sources
do not expose its declared interface fails with `Error::ShaderLink`.

Frames render into an offscreen surface at the size requested through
`GraphicsDevice::resize`; `submit` blits it, centered, onto the window
swapchain.
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_render_target;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_sampler;
mod vulkan_command_list;
mod vulkan_swapchain;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_command_list::CommandList as VulkanCommandList;

/// Log source of every message emitted by this crate
pub(crate) const SOURCE: &str = "shadowcast3d::vulkan";
