/// Buffer - Vulkan implementation of the engine Buffer trait

use std::sync::Arc;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::shadowcast3d::render::{
    Buffer as RendererBuffer, BufferDesc, BufferUsage,
};
use shadowcast_3d_engine::{engine_bail, engine_err};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::buffer_usage_to_vk;
use crate::SOURCE;

/// Host-visible buffer, persistently mapped
///
/// Geometry streams, the uniform ring, staging uploads and the zero vertex
/// stream all live in host-visible memory.
pub(crate) struct HostBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    pub(crate) size: u64,
}

impl HostBuffer {
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        name: &str,
        size: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        if size == 0 {
            engine_bail!(SOURCE, "Buffer '{}' has zero size", name);
        }

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = ctx.device.create_buffer(&create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create buffer '{}': {:?}", name, e))?;

            // From here on Drop releases the buffer on every error path
            let mut host = Self { ctx: Arc::clone(ctx), buffer, allocation: None, size };

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx.allocate(name, requirements, MemoryLocation::CpuToGpu, true)?;
            ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!(SOURCE, "Failed to bind buffer memory for '{}': {:?}", name, e))?;
            host.allocation = Some(allocation);

            Ok(host)
        }
    }

    /// Copy `data` to `offset`
    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            engine_bail!(SOURCE,
                "Buffer write of {} bytes at {} overflows size {}",
                data.len(), offset, self.size);
        }
        let allocation = self.allocation.as_ref()
            .ok_or_else(|| engine_err!(SOURCE, "Buffer has no allocation"))?;
        let mapped = allocation.mapped_ptr()
            .ok_or_else(|| engine_err!(SOURCE, "Buffer is not CPU-accessible"))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

/// Vertex or index buffer handed to the engine
pub struct Buffer {
    pub(crate) host: HostBuffer,
    label: String,
    usage: BufferUsage,
}

impl Buffer {
    pub(crate) fn new(ctx: &Arc<GpuContext>, desc: &BufferDesc, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            engine_bail!(SOURCE, "Buffer '{}' created without data", desc.label);
        }
        let host = HostBuffer::new(ctx, &desc.label, data.len() as u64, buffer_usage_to_vk(desc.usage))?;
        host.write(0, data)?;
        Ok(Self { host, label: desc.label.clone(), usage: desc.usage })
    }

    /// Reinterpret an engine buffer created by this backend
    pub(crate) fn downcast(buffer: &dyn RendererBuffer) -> &Buffer {
        unsafe { &*(buffer as *const dyn RendererBuffer as *const Buffer) }
    }
}

impl RendererBuffer for Buffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> u64 {
        self.host.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}
