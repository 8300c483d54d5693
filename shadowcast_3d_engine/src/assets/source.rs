/// Asset sources: where scene descriptions, shader text and images come from

use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::render::{ProgramRole, ShaderSources};
use crate::scene::SceneDescription;

/// Fetches raw assets by path
///
/// Parsing the scene format is the source's business; the core only sees the
/// resulting [`SceneDescription`]. Implementations are called from loader
/// threads.
pub trait AssetSource: Send + Sync {
    fn load_scene(&self, path: &str) -> Result<SceneDescription>;
    fn load_text(&self, path: &str) -> Result<String>;
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Vertex and fragment paths of one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderPaths {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }
}

/// Every asset a scene needs, by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    pub scene: String,
    pub unshadowed: ShaderPaths,
    pub shadow_lit: ShaderPaths,
    pub shadow_map_gen: ShaderPaths,
    /// Texture name → image path, streamed after load
    pub textures: Vec<(String, String)>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            scene: "Room.json".to_string(),
            unshadowed: ShaderPaths::new("shaders/lit.vs.glsl", "shaders/unshadowed.fs.glsl"),
            shadow_lit: ShaderPaths::new("shaders/lit.vs.glsl", "shaders/shadow_lit.fs.glsl"),
            shadow_map_gen: ShaderPaths::new(
                "shaders/shadow_map_gen.vs.glsl",
                "shaders/shadow_map_gen.fs.glsl",
            ),
            textures: vec![("bricks".to_string(), "bricks.png".to_string())],
        }
    }
}

impl AssetManifest {
    pub fn shader_paths(&self, role: ProgramRole) -> &ShaderPaths {
        match role {
            ProgramRole::Unshadowed => &self.unshadowed,
            ProgramRole::ShadowLit => &self.shadow_lit,
            ProgramRole::ShadowMapGen => &self.shadow_map_gen,
        }
    }

    pub fn texture_path(&self, name: &str) -> Option<&str> {
        self.textures.iter()
            .find(|(texture, _)| texture == name)
            .map(|(_, path)| path.as_str())
    }
}

/// In-memory [`AssetSource`]
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    scenes: FxHashMap<String, SceneDescription>,
    texts: FxHashMap<String, String>,
    bytes: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source serving `description` and the built-in shaders at the default manifest paths
    pub fn with_builtin_shaders(description: SceneDescription) -> Self {
        let manifest = AssetManifest::default();
        let shaders = ShaderSources::builtin();
        let mut source = Self::new();
        source.insert_scene(manifest.scene.clone(), description);
        for role in ProgramRole::ALL {
            let paths = manifest.shader_paths(role);
            let text = shaders.get(role);
            source.insert_text(paths.vertex.clone(), text.vertex.clone());
            source.insert_text(paths.fragment.clone(), text.fragment.clone());
        }
        source
    }

    pub fn insert_scene(&mut self, path: impl Into<String>, description: SceneDescription) {
        self.scenes.insert(path.into(), description);
    }

    pub fn insert_text(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(path.into(), text.into());
    }

    pub fn insert_bytes(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.bytes.insert(path.into(), bytes);
    }

    pub fn remove(&mut self, path: &str) {
        self.scenes.remove(path);
        self.texts.remove(path);
        self.bytes.remove(path);
    }
}

fn not_found(path: &str) -> Error {
    Error::resource_load(path, "not found")
}

impl AssetSource for MemoryAssetSource {
    fn load_scene(&self, path: &str) -> Result<SceneDescription> {
        self.scenes.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn load_text(&self, path: &str) -> Result<String> {
        self.texts.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.bytes.get(path).cloned().ok_or_else(|| not_found(path))
    }
}
