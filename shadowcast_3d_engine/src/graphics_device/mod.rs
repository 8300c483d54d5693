//! Graphics device abstraction
//!
//! Trait objects for GPU resources and command recording. The headless
//! recording backend used by the test suite sits behind the
//! `recording-device` feature; windowed hosts plug in a GPU backend crate.

mod buffer;
mod command_list;
mod frame_buffer;
mod graphics_device;
#[cfg(any(test, feature = "recording-device"))]
mod recording_device;
mod shader;
mod texture;

pub use buffer::{as_bytes, Buffer, BufferDesc, BufferUsage, IndexType, PrimitiveTopology};
pub use command_list::{ClearValue, CommandList, UniformValue, Viewport};
pub use frame_buffer::{texture_identity, Framebuffer, FramebufferDesc, RenderTarget};
pub use graphics_device::{DeviceCapabilities, DeviceConfig, DeviceStats, GraphicsDevice};
#[cfg(any(test, feature = "recording-device"))]
pub use recording_device::{
    RecordedCommand, RecordingCommandList, RecordingGraphicsDevice, RecordingJournal,
};
pub use shader::{
    AttributeSemantic, ShaderInterface, ShaderProgram, ShaderProgramDesc, TextureSemantic,
    UniformSemantic,
};
pub use texture::{Texture, TextureDesc, TextureFormat, TextureInfo, TextureKind, TextureUsage};
