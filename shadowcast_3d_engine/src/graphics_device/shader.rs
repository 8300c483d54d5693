/// Shader programs and their declared interface
///
/// A program's interface is declared once, when the program is created, as a
/// table from semantic name to binding slot. Passes look slots up by semantic
/// and never re-declare attribute or uniform names per draw.

use rustc_hash::FxHashMap;

/// Linked GPU program
pub trait ShaderProgram: Send + Sync {
    fn name(&self) -> &str;
    fn interface(&self) -> &ShaderInterface;
}

/// Per-vertex inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    Position,
    Normal,
    TexCoord,
}

impl AttributeSemantic {
    pub fn glsl_name(self) -> &'static str {
        match self {
            AttributeSemantic::Position => "vPos",
            AttributeSemantic::Normal => "vNorm",
            AttributeSemantic::TexCoord => "vTexCoord",
        }
    }
}

/// Uniform inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSemantic {
    Projection,
    View,
    World,
    MeshColor,

    // Shadow map generation
    LightPosition,
    LightDirection,
    ShadowClipNearFar,
    /// 1.0 for the orthographic directional pass, 0.0 for cube passes
    DirectionalPass,

    // Shading
    PointLightPosition,
    PointLightColor,
    PointLightIntensity,
    PointShadowClipNearFar,
    SpotLightPosition,
    SpotLightColor,
    SpotLightIntensity,
    SpotLightDirection,
    SpotLightCutoff,
    SpotShadowClipNearFar,
    DirLightDirection,
    DirLightColor,
    DirLightIntensity,
    DirShadowView,
    DirShadowProjection,
    ShadowBias,
}

impl UniformSemantic {
    pub fn glsl_name(self) -> &'static str {
        match self {
            UniformSemantic::Projection => "mProj",
            UniformSemantic::View => "mView",
            UniformSemantic::World => "mWorld",
            UniformSemantic::MeshColor => "meshColor",
            UniformSemantic::LightPosition => "lightPosition",
            UniformSemantic::LightDirection => "lightDirection",
            UniformSemantic::ShadowClipNearFar => "shadowClipNearFar",
            UniformSemantic::DirectionalPass => "isDirectional",
            UniformSemantic::PointLightPosition => "pointLightPosition",
            UniformSemantic::PointLightColor => "pointLightColor",
            UniformSemantic::PointLightIntensity => "pointLightIntensity",
            UniformSemantic::PointShadowClipNearFar => "pointShadowClipNearFar",
            UniformSemantic::SpotLightPosition => "spotLightPosition",
            UniformSemantic::SpotLightColor => "spotLightColor",
            UniformSemantic::SpotLightIntensity => "spotLightIntensity",
            UniformSemantic::SpotLightDirection => "spotLightDirection",
            UniformSemantic::SpotLightCutoff => "spotLightCutoff",
            UniformSemantic::SpotShadowClipNearFar => "spotShadowClipNearFar",
            UniformSemantic::DirLightDirection => "dirLightDirection",
            UniformSemantic::DirLightColor => "dirLightColor",
            UniformSemantic::DirLightIntensity => "dirLightIntensity",
            UniformSemantic::DirShadowView => "dirShadowMapView",
            UniformSemantic::DirShadowProjection => "dirShadowMapProj",
            UniformSemantic::ShadowBias => "bias",
        }
    }
}

/// Sampled texture inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSemantic {
    PointShadowMap,
    SpotShadowMap,
    DirShadowMap,
    Albedo,
}

impl TextureSemantic {
    pub fn glsl_name(self) -> &'static str {
        match self {
            TextureSemantic::PointShadowMap => "pointShadowMap",
            TextureSemantic::SpotShadowMap => "spotShadowMap",
            TextureSemantic::DirShadowMap => "dirShadowMap",
            TextureSemantic::Albedo => "u_texture",
        }
    }
}

/// Semantic → slot tables of one program
///
/// Slots are assigned in declaration order inside each category, so two
/// programs declaring the same list agree on every slot.
#[derive(Debug, Clone, Default)]
pub struct ShaderInterface {
    attributes: Vec<AttributeSemantic>,
    uniforms: Vec<UniformSemantic>,
    textures: Vec<TextureSemantic>,
    attribute_slots: FxHashMap<AttributeSemantic, u32>,
    uniform_slots: FxHashMap<UniformSemantic, u32>,
    texture_slots: FxHashMap<TextureSemantic, u32>,
}

impl ShaderInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes(mut self, attributes: &[AttributeSemantic]) -> Self {
        for &attribute in attributes {
            if !self.attribute_slots.contains_key(&attribute) {
                self.attribute_slots.insert(attribute, self.attributes.len() as u32);
                self.attributes.push(attribute);
            }
        }
        self
    }

    pub fn with_uniforms(mut self, uniforms: &[UniformSemantic]) -> Self {
        for &uniform in uniforms {
            if !self.uniform_slots.contains_key(&uniform) {
                self.uniform_slots.insert(uniform, self.uniforms.len() as u32);
                self.uniforms.push(uniform);
            }
        }
        self
    }

    pub fn with_textures(mut self, textures: &[TextureSemantic]) -> Self {
        for &texture in textures {
            if !self.texture_slots.contains_key(&texture) {
                self.texture_slots.insert(texture, self.textures.len() as u32);
                self.textures.push(texture);
            }
        }
        self
    }

    pub fn attribute(&self, semantic: AttributeSemantic) -> Option<u32> {
        self.attribute_slots.get(&semantic).copied()
    }

    pub fn uniform(&self, semantic: UniformSemantic) -> Option<u32> {
        self.uniform_slots.get(&semantic).copied()
    }

    pub fn texture(&self, semantic: TextureSemantic) -> Option<u32> {
        self.texture_slots.get(&semantic).copied()
    }

    pub fn attributes(&self) -> &[AttributeSemantic] {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[UniformSemantic] {
        &self.uniforms
    }

    pub fn textures(&self) -> &[TextureSemantic] {
        &self.textures
    }

    /// Every GLSL identifier a backend must resolve when linking
    pub fn glsl_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().map(|a| a.glsl_name())
            .chain(self.uniforms.iter().map(|u| u.glsl_name()))
            .chain(self.textures.iter().map(|t| t.glsl_name()))
    }
}

/// Descriptor for creating a shader program
#[derive(Debug, Clone)]
pub struct ShaderProgramDesc {
    pub name: String,
    pub vertex_source: String,
    pub fragment_source: String,
    pub interface: ShaderInterface,
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
