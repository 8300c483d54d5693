/// Presentation surface sizing

/// Aspect ratio kept by the presentation surface
pub const SURFACE_ASPECT: f32 = 16.0 / 9.0;

/// Placement of the presentation surface inside the host window, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered 16:9 rectangle fitting a `window_width` x `window_height` window
///
/// Returns `None` when the window has no area (minimized).
pub fn fit_presentation_surface(window_width: u32, window_height: u32) -> Option<SurfaceRect> {
    if window_width == 0 || window_height == 0 {
        return None;
    }

    let (width, height) = if window_width as f32 / window_height as f32 >= SURFACE_ASPECT {
        ((window_height as f32 * SURFACE_ASPECT).round() as u32, window_height)
    } else {
        (window_width, (window_width as f32 / SURFACE_ASPECT).round() as u32)
    };
    let (width, height) = (width.clamp(1, window_width), height.clamp(1, window_height));

    Some(SurfaceRect {
        x: (window_width - width) / 2,
        y: (window_height - height) / 2,
        width,
        height,
    })
}

#[cfg(test)]
#[path = "presentation_tests.rs"]
mod tests;
