//! Capability negotiation, no GPU required

use super::*;

#[test]
fn test_float_shadow_storage_needs_render_and_sample_support() {
    let both = vk::FormatFeatureFlags::COLOR_ATTACHMENT
        | vk::FormatFeatureFlags::SAMPLED_IMAGE
        | vk::FormatFeatureFlags::TRANSFER_SRC;
    assert!(supports_float_targets(both));
    assert!(!supports_float_targets(vk::FormatFeatureFlags::SAMPLED_IMAGE));
    assert!(!supports_float_targets(vk::FormatFeatureFlags::COLOR_ATTACHMENT));
}

#[test]
fn test_max_texture_size_takes_the_smallest_limit() {
    let limits = vk::PhysicalDeviceLimits {
        max_image_dimension2_d: 16384,
        max_image_dimension_cube: 8192,
        ..Default::default()
    };
    assert_eq!(max_texture_size(4096, &limits), 4096);
    assert_eq!(max_texture_size(32768, &limits), 8192);
}
