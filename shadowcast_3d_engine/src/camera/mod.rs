//! Camera basis and projections

mod camera;
mod projection;

pub use camera::Camera;
pub use projection::{ClipRange, Projection};
