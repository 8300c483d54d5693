//! Frame loop: input, per-tick motion and the scene aggregate that drives the passes

mod animation;
mod host;
mod input;
mod shadow_scene;

pub use animation::{apply_camera_input, apply_demo_animation, interactive_step, DEMO_MOTIONS};
pub use host::{FrameHost, FrameStats};
pub use input::{InputCommands, ToggleEvent};
pub use shadow_scene::{SceneState, ShadowScene};
