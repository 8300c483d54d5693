/// Validation layer messages, forwarded to the engine logger by severity
///
/// Compiled only with the `vulkan-validation` feature.

use std::ffi::CStr;
use ash::vk;
use shadowcast_3d_engine::shadowcast3d::Result;
use shadowcast_3d_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::SOURCE;

pub(crate) const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::Borrowed("No message")
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        engine_error!(SOURCE, "[{:?}] {}", message_type, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        engine_warn!(SOURCE, "[{:?}] {}", message_type, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        engine_info!(SOURCE, "[{:?}] {}", message_type, message);
    } else {
        engine_debug!(SOURCE, "[{:?}] {}", message_type, message);
    }

    vk::FALSE
}

pub(crate) fn create_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
    let messenger = unsafe {
        debug_utils.create_debug_utils_messenger(&create_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create debug messenger: {:?}", e))?
    };
    Ok((debug_utils, messenger))
}
