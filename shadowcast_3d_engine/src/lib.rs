/*!
# Shadowcast3D Engine

Shadow-mapped real-time rendering core.

Renders an animated scene lit by a directional light and point/spot lights,
with shadows produced by a multi-pass depth-map technique: one orthographic
map for the directional light, one six-face cube map per point/spot light,
then a shading pass sampling them all.

## Architecture

- **GraphicsDevice**: trait-object backend creating buffers, textures,
  programs and framebuffers, and executing recorded command lists
- **NodeRegistry**: per-node world transform, color and GPU geometry
- **Camera / LightRig**: view and projection derivation, per-face light cameras
- **ShadowMapGenerator**: directional and cube shadow passes
- **ShadingPass**: final lit, shadowed draw into the presentation surface
- **ShadowScene**: scene aggregate sequencing one frame per host tick

The host (window, input, frame clock) stays outside the core and plugs in
through the `FrameHost` and `AssetSource` traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
mod config;
mod graphics_device;
mod camera;
mod scene;
mod light;
mod render;
mod frame;
mod assets;

// Main shadowcast3d namespace module
pub mod shadowcast3d {
    // Error types
    pub use crate::error::{Error, Result, ShaderStage};

    // Engine singleton
    pub use crate::engine::Engine;

    // Scene aggregate
    pub use crate::frame::{SceneState, ShadowScene};

    // Logging sub-module (types only, macros stay internal)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics device and render passes
    pub mod render {
        pub use crate::graphics_device::*;
        pub use crate::render::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod light {
        pub use crate::light::*;
    }

    pub mod frame {
        pub use crate::frame::*;
    }

    pub mod assets {
        pub use crate::assets::*;
    }

    pub mod config {
        pub use crate::config::*;
    }
}

// Re-export math library at crate root
pub use glam;
