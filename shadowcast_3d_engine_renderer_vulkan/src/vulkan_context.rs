/// GpuContext - device, allocator and queue shared by every Vulkan resource

use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::{AllocationError, MemoryLocation};
use shadowcast_3d_engine::shadowcast3d::{Error, Result};
use shadowcast_3d_engine::{engine_err, engine_error};

use crate::SOURCE;

/// Shared GPU context
///
/// Buffers, textures, views, programs and command lists all hold an
/// `Arc<GpuContext>`. The logical device and the instance are destroyed when
/// the last of them goes away, never before.
pub struct GpuContext {
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before `destroy_device` so its memory blocks are freed first
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,

    /// Reusable pool for one-shot upload command buffers
    upload_command_pool: Mutex<vk::CommandPool>,

    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
        debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) -> Self {
        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool: Mutex::new(upload_command_pool),
            debug_messenger,
        }
    }

    fn lock_allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator.lock().map_err(|_| engine_err!(SOURCE, "GPU allocator lock poisoned"))
    }

    /// Allocate memory for `requirements`
    ///
    /// # Errors
    ///
    /// `Error::OutOfMemory` when the heap is exhausted.
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.lock_allocator()?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|error| allocation_error(name, requirements.size, error))
    }

    pub(crate) fn free(&self, allocation: Allocation) {
        // Freeing still has to happen if another thread panicked with the lock held
        let mut allocator = match self.allocator.lock() {
            Ok(allocator) => allocator,
            Err(poisoned) => poisoned.into_inner(),
        };
        allocator.free(allocation).ok();
    }

    /// Record `record` into a fresh command buffer, submit it and wait for completion
    pub(crate) fn submit_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let pool = self.upload_command_pool.lock()
            .map_err(|_| engine_err!(SOURCE, "Upload command pool lock poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to allocate upload command buffer: {:?}", e))?
                .first()
                .copied()
                .ok_or_else(|| engine_err!(SOURCE, "Upload command buffer allocation returned nothing"))?;

            let result = self.execute_one_shot(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn execute_one_shot<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to begin upload command buffer: {:?}", e))?;

        record(&self.device, command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| engine_err!(SOURCE, "Failed to end upload command buffer: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        self.device.queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
            .map_err(|e| engine_err!(SOURCE, "Failed to submit upload: {:?}", e))?;
        self.device.queue_wait_idle(self.graphics_queue)
            .map_err(|e| engine_err!(SOURCE, "Failed to wait for upload: {:?}", e))
    }

    pub(crate) fn limits(&self) -> vk::PhysicalDeviceLimits {
        unsafe { self.instance.get_physical_device_properties(self.physical_device).limits }
    }
}

/// Map an allocator failure onto the engine error set
pub(crate) fn allocation_error(name: &str, size: u64, error: AllocationError) -> Error {
    let size_mb = size as f64 / (1024.0 * 1024.0);
    match error {
        AllocationError::OutOfMemory => {
            engine_error!(SOURCE, "Out of GPU memory for '{}' ({:.2} MB)", name, size_mb);
            Error::OutOfMemory
        }
        other => engine_err!(SOURCE, "Failed to allocate '{}' ({:.2} MB): {}", name, size_mb, other),
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.get_mut() {
                self.device.destroy_command_pool(*pool, None);
                *pool = vk::CommandPool::null();
            }

            ManuallyDrop::drop(&mut self.allocator);

            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
