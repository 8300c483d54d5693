/// Host scheduling boundary
///
/// The host owns the window, the input devices and the frame clock. A scene
/// only asks it to start or stop delivering events and to schedule the next
/// tick.

/// Services a host provides to a running scene
pub trait FrameHost {
    /// Start delivering input changes and toggles
    fn subscribe(&mut self);

    /// Stop delivering input changes and toggles
    fn unsubscribe(&mut self);

    /// Ask for one more `on_tick` call
    fn request_tick(&mut self);

    /// Drop a pending tick request
    fn cancel_tick(&mut self);
}

/// Work recorded for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Render passes, shadow and shading combined
    pub render_passes: u32,
    pub shadow_draws: u32,
    pub shading_draws: u32,
}
