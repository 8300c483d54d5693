//! Render passes: shadow map generation and the main shading pass

mod presentation;
mod programs;
mod shading_pass;
mod shadow_map_generator;
mod shadow_targets;

pub use presentation::{fit_presentation_surface, SurfaceRect, SURFACE_ASPECT};
pub use programs::{
    ProgramRole, ProgramSet, ShaderSource, ShaderSources, ShadingBindings, ShadowGenBindings,
    ShadowInputBindings,
};
pub use shading_pass::{ShadingInputs, ShadingPass};
pub use shadow_map_generator::{ShadowMapGenerator, ShadowPassStats};
pub use shadow_targets::{
    CubeShadowTarget, DirectionalShadowTarget, ShadowPrecision, ShadowTargets, FIXED_SHADOW_BIAS,
    FLOAT_SHADOW_BIAS,
};
