/// The three shader programs of the pipeline and their binding tables
///
/// Each role declares its interface once. Passes resolve the slots they use
/// into plain structs right after the program is created, so a draw never
/// looks anything up by name.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttributeSemantic, GraphicsDevice, ShaderInterface, ShaderProgram, ShaderProgramDesc,
    TextureSemantic, UniformSemantic,
};

const SOURCE: &str = "shadowcast3d::Programs";

/// Role a program plays in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramRole {
    /// Lit shading without shadow lookups
    Unshadowed,
    /// Lit shading attenuated by the shadow maps
    ShadowLit,
    /// Writes light distance into the shadow maps
    ShadowMapGen,
}

impl ProgramRole {
    pub const ALL: [ProgramRole; 3] = [
        ProgramRole::Unshadowed,
        ProgramRole::ShadowLit,
        ProgramRole::ShadowMapGen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgramRole::Unshadowed => "unshadowed",
            ProgramRole::ShadowLit => "shadow-lit",
            ProgramRole::ShadowMapGen => "shadow-map-gen",
        }
    }

    /// Interface every program of this role must expose
    pub fn interface(self) -> ShaderInterface {
        use UniformSemantic as U;

        const LIT_ATTRIBUTES: [AttributeSemantic; 3] = [
            AttributeSemantic::Position,
            AttributeSemantic::Normal,
            AttributeSemantic::TexCoord,
        ];
        const LIGHT_UNIFORMS: [UniformSemantic; 15] = [
            U::Projection, U::View, U::World, U::MeshColor,
            U::PointLightPosition, U::PointLightColor, U::PointLightIntensity,
            U::SpotLightPosition, U::SpotLightColor, U::SpotLightIntensity,
            U::SpotLightDirection, U::SpotLightCutoff,
            U::DirLightDirection, U::DirLightColor, U::DirLightIntensity,
        ];

        match self {
            ProgramRole::Unshadowed => ShaderInterface::new()
                .with_attributes(&LIT_ATTRIBUTES)
                .with_uniforms(&LIGHT_UNIFORMS)
                .with_textures(&[TextureSemantic::Albedo]),
            // Texture units: point 0, spot 1, directional 2, albedo 3
            ProgramRole::ShadowLit => ShaderInterface::new()
                .with_attributes(&LIT_ATTRIBUTES)
                .with_uniforms(&LIGHT_UNIFORMS)
                .with_uniforms(&[
                    U::PointShadowClipNearFar,
                    U::SpotShadowClipNearFar,
                    U::DirShadowView,
                    U::DirShadowProjection,
                    U::ShadowBias,
                ])
                .with_textures(&[
                    TextureSemantic::PointShadowMap,
                    TextureSemantic::SpotShadowMap,
                    TextureSemantic::DirShadowMap,
                    TextureSemantic::Albedo,
                ]),
            ProgramRole::ShadowMapGen => ShaderInterface::new()
                .with_attributes(&[AttributeSemantic::Position])
                .with_uniforms(&[
                    U::Projection,
                    U::View,
                    U::World,
                    U::LightPosition,
                    U::LightDirection,
                    U::ShadowClipNearFar,
                    U::DirectionalPass,
                ]),
        }
    }
}

/// Vertex and fragment source text of one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

/// Source text of all three programs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub unshadowed: ShaderSource,
    pub shadow_lit: ShaderSource,
    pub shadow_map_gen: ShaderSource,
}

impl ShaderSources {
    /// GLSL 450 sources shipped with the crate
    ///
    /// Each stage keeps its uniforms in one block (vertex at binding 0,
    /// fragment at binding 1). Every sampled texture is a separate image
    /// named after its semantic, paired with a `<name>Sampler` sampler.
    pub fn builtin() -> Self {
        const LIT_VS: &str = include_str!("../../shaders/lit.vs.glsl");
        let source = |vertex: &str, fragment: &str| ShaderSource {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        };
        Self {
            unshadowed: source(LIT_VS, include_str!("../../shaders/unshadowed.fs.glsl")),
            shadow_lit: source(LIT_VS, include_str!("../../shaders/shadow_lit.fs.glsl")),
            shadow_map_gen: source(
                include_str!("../../shaders/shadow_map_gen.vs.glsl"),
                include_str!("../../shaders/shadow_map_gen.fs.glsl"),
            ),
        }
    }

    pub fn get(&self, role: ProgramRole) -> &ShaderSource {
        match role {
            ProgramRole::Unshadowed => &self.unshadowed,
            ProgramRole::ShadowLit => &self.shadow_lit,
            ProgramRole::ShadowMapGen => &self.shadow_map_gen,
        }
    }

    pub fn get_mut(&mut self, role: ProgramRole) -> &mut ShaderSource {
        match role {
            ProgramRole::Unshadowed => &mut self.unshadowed,
            ProgramRole::ShadowLit => &mut self.shadow_lit,
            ProgramRole::ShadowMapGen => &mut self.shadow_map_gen,
        }
    }
}

/// Linked programs, one per role
#[derive(Clone)]
pub struct ProgramSet {
    pub unshadowed: Arc<dyn ShaderProgram>,
    pub shadow_lit: Arc<dyn ShaderProgram>,
    pub shadow_map_gen: Arc<dyn ShaderProgram>,
}

impl ProgramSet {
    /// Compile and link every role
    ///
    /// # Errors
    ///
    /// The first `ShaderCompile`/`ShaderLink` failure, in role order.
    pub fn create(device: &mut dyn GraphicsDevice, sources: &ShaderSources) -> Result<Self> {
        let mut create = |role: ProgramRole| {
            let source = sources.get(role);
            device.create_shader_program(ShaderProgramDesc {
                name: role.name().to_string(),
                vertex_source: source.vertex.clone(),
                fragment_source: source.fragment.clone(),
                interface: role.interface(),
            })
        };
        let unshadowed = create(ProgramRole::Unshadowed)?;
        let shadow_lit = create(ProgramRole::ShadowLit)?;
        let shadow_map_gen = create(ProgramRole::ShadowMapGen)?;

        crate::engine_debug!(SOURCE, "Created {} programs", ProgramRole::ALL.len());
        Ok(Self { unshadowed, shadow_lit, shadow_map_gen })
    }

    pub fn get(&self, role: ProgramRole) -> &Arc<dyn ShaderProgram> {
        match role {
            ProgramRole::Unshadowed => &self.unshadowed,
            ProgramRole::ShadowLit => &self.shadow_lit,
            ProgramRole::ShadowMapGen => &self.shadow_map_gen,
        }
    }
}

// ============================================================================
// Resolved bindings
// ============================================================================

fn undeclared(program: &dyn ShaderProgram, name: &str) -> Error {
    crate::engine_fail!(SOURCE, Error::ShaderLink {
        program: program.name().to_string(),
        diagnostic: format!("'{}' is not declared by the program interface", name),
    })
}

fn uniform(program: &dyn ShaderProgram, semantic: UniformSemantic) -> Result<u32> {
    program.interface().uniform(semantic)
        .ok_or_else(|| undeclared(program, semantic.glsl_name()))
}

fn attribute(program: &dyn ShaderProgram, semantic: AttributeSemantic) -> Result<u32> {
    program.interface().attribute(semantic)
        .ok_or_else(|| undeclared(program, semantic.glsl_name()))
}

fn texture(program: &dyn ShaderProgram, semantic: TextureSemantic) -> Result<u32> {
    program.interface().texture(semantic)
        .ok_or_else(|| undeclared(program, semantic.glsl_name()))
}

/// Slots used by the shadow map generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowGenBindings {
    pub position: u32,
    pub projection: u32,
    pub view: u32,
    pub world: u32,
    pub light_position: u32,
    pub light_direction: u32,
    pub clip_near_far: u32,
    pub directional_pass: u32,
}

impl ShadowGenBindings {
    pub fn resolve(program: &dyn ShaderProgram) -> Result<Self> {
        use UniformSemantic as U;
        Ok(Self {
            position: attribute(program, AttributeSemantic::Position)?,
            projection: uniform(program, U::Projection)?,
            view: uniform(program, U::View)?,
            world: uniform(program, U::World)?,
            light_position: uniform(program, U::LightPosition)?,
            light_direction: uniform(program, U::LightDirection)?,
            clip_near_far: uniform(program, U::ShadowClipNearFar)?,
            directional_pass: uniform(program, U::DirectionalPass)?,
        })
    }
}

/// Shadow inputs of the shadow-lit program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowInputBindings {
    pub point_map: u32,
    pub spot_map: u32,
    pub dir_map: u32,
    pub point_clip_near_far: u32,
    pub spot_clip_near_far: u32,
    pub dir_view: u32,
    pub dir_projection: u32,
    pub bias: u32,
}

/// Slots used by the shading pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadingBindings {
    pub position: u32,
    pub normal: u32,
    pub tex_coord: u32,
    pub projection: u32,
    pub view: u32,
    pub world: u32,
    pub mesh_color: u32,
    pub albedo: u32,
    pub point_position: u32,
    pub point_color: u32,
    pub point_intensity: u32,
    pub spot_position: u32,
    pub spot_color: u32,
    pub spot_intensity: u32,
    pub spot_direction: u32,
    pub spot_cutoff: u32,
    pub dir_direction: u32,
    pub dir_color: u32,
    pub dir_intensity: u32,
    /// `None` for the unshadowed program
    pub shadow: Option<ShadowInputBindings>,
}

impl ShadingBindings {
    pub fn resolve(program: &dyn ShaderProgram, with_shadows: bool) -> Result<Self> {
        use UniformSemantic as U;

        let shadow = if with_shadows {
            Some(ShadowInputBindings {
                point_map: texture(program, TextureSemantic::PointShadowMap)?,
                spot_map: texture(program, TextureSemantic::SpotShadowMap)?,
                dir_map: texture(program, TextureSemantic::DirShadowMap)?,
                point_clip_near_far: uniform(program, U::PointShadowClipNearFar)?,
                spot_clip_near_far: uniform(program, U::SpotShadowClipNearFar)?,
                dir_view: uniform(program, U::DirShadowView)?,
                dir_projection: uniform(program, U::DirShadowProjection)?,
                bias: uniform(program, U::ShadowBias)?,
            })
        } else {
            None
        };

        Ok(Self {
            position: attribute(program, AttributeSemantic::Position)?,
            normal: attribute(program, AttributeSemantic::Normal)?,
            tex_coord: attribute(program, AttributeSemantic::TexCoord)?,
            projection: uniform(program, U::Projection)?,
            view: uniform(program, U::View)?,
            world: uniform(program, U::World)?,
            mesh_color: uniform(program, U::MeshColor)?,
            albedo: texture(program, TextureSemantic::Albedo)?,
            point_position: uniform(program, U::PointLightPosition)?,
            point_color: uniform(program, U::PointLightColor)?,
            point_intensity: uniform(program, U::PointLightIntensity)?,
            spot_position: uniform(program, U::SpotLightPosition)?,
            spot_color: uniform(program, U::SpotLightColor)?,
            spot_intensity: uniform(program, U::SpotLightIntensity)?,
            spot_direction: uniform(program, U::SpotLightDirection)?,
            spot_cutoff: uniform(program, U::SpotLightCutoff)?,
            dir_direction: uniform(program, U::DirLightDirection)?,
            dir_color: uniform(program, U::DirLightColor)?,
            dir_intensity: uniform(program, U::DirLightIntensity)?,
            shadow,
        })
    }
}

#[cfg(test)]
#[path = "programs_tests.rs"]
mod tests;
