//! Lights, shadow frusta and light animation

mod animation;
mod cube_face;
mod light;

pub use animation::OscillationAnimation;
pub use cube_face::{CubeFace, OmniShadowFrustum};
pub use light::{DirectionalLight, LightKind, LightRig, OmniLight, SpotCone};
