use super::*;

fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR { format, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR }
}

fn capabilities(current: (u32, u32), min_images: u32, max_images: u32) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: min_images,
        max_image_count: max_images,
        current_extent: vk::Extent2D { width: current.0, height: current.1 },
        min_image_extent: vk::Extent2D { width: 1, height: 1 },
        max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
        ..Default::default()
    }
}

#[test]
fn test_surface_format_prefers_unorm_bgra() {
    let formats = [
        surface_format(vk::Format::B8G8R8A8_SRGB),
        surface_format(vk::Format::R8G8B8A8_UNORM),
        surface_format(vk::Format::B8G8R8A8_UNORM),
    ];
    assert_eq!(choose_surface_format(&formats).map(|f| f.format), Some(vk::Format::B8G8R8A8_UNORM));
}

#[test]
fn test_surface_format_falls_back_to_first_reported() {
    let formats = [surface_format(vk::Format::A2B10G10R10_UNORM_PACK32)];
    assert_eq!(
        choose_surface_format(&formats).map(|f| f.format),
        Some(vk::Format::A2B10G10R10_UNORM_PACK32)
    );
    assert!(choose_surface_format(&[]).is_none());
}

#[test]
fn test_extent_follows_the_surface_when_it_is_fixed() {
    let caps = capabilities((800, 600), 2, 3);
    assert_eq!(choose_extent(&caps, 1280, 720), vk::Extent2D { width: 800, height: 600 });
}

#[test]
fn test_extent_clamps_the_window_size_otherwise() {
    let caps = capabilities((u32::MAX, u32::MAX), 2, 3);
    assert_eq!(choose_extent(&caps, 1280, 720), vk::Extent2D { width: 1280, height: 720 });
    assert_eq!(choose_extent(&caps, 9000, 0), vk::Extent2D { width: 4096, height: 1 });
}

#[test]
fn test_image_count_asks_one_above_minimum_within_limit() {
    assert_eq!(choose_image_count(&capabilities((1, 1), 2, 0)), 3);
    assert_eq!(choose_image_count(&capabilities((1, 1), 2, 3)), 3);
    assert_eq!(choose_image_count(&capabilities((1, 1), 3, 3)), 3);
}
