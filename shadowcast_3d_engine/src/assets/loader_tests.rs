use super::*;
use crate::assets::MemoryAssetSource;

fn source() -> MemoryAssetSource {
    MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural())
}

#[test]
fn test_load_returns_scene_and_every_shader() {
    let loaded = AssetLoader::load(&source(), &AssetManifest::default()).unwrap();

    assert_eq!(loaded.description, SceneDescription::procedural());
    assert_eq!(loaded.shaders, ShaderSources::builtin());
}

#[test]
fn test_missing_scene_is_resource_load_error() {
    let mut source = source();
    source.remove("Room.json");

    let result = AssetLoader::load(&source, &AssetManifest::default());
    match result {
        Err(Error::ResourceLoad { resource, .. }) => assert_eq!(resource, "Room.json"),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("load succeeded without a scene"),
    }
}

#[test]
fn test_first_failure_in_manifest_order_is_reported() {
    let mut source = source();
    source.remove("shaders/shadow_map_gen.fs.glsl");
    source.remove("shaders/shadow_lit.fs.glsl");

    let result = AssetLoader::load(&source, &AssetManifest::default());
    assert_eq!(
        result.unwrap_err(),
        Error::resource_load("shaders/shadow_lit.fs.glsl", "not found")
    );
}

#[test]
fn test_shared_vertex_path_loads_for_both_lit_programs() {
    let loaded = AssetLoader::load(&source(), &AssetManifest::default()).unwrap();
    assert_eq!(loaded.shaders.unshadowed.vertex, loaded.shaders.shadow_lit.vertex);
    assert_ne!(loaded.shaders.unshadowed.fragment, loaded.shaders.shadow_lit.fragment);
}

#[test]
fn test_custom_manifest_paths_are_honored() {
    let mut source = MemoryAssetSource::new();
    source.insert_scene("levels/room.scene", SceneDescription::procedural());
    for role in ProgramRole::ALL {
        source.insert_text(format!("{}.vert", role.name()), "void main() {}");
        source.insert_text(format!("{}.frag", role.name()), "void main() {}");
    }
    let manifest = AssetManifest {
        scene: "levels/room.scene".to_string(),
        unshadowed: crate::assets::ShaderPaths::new("unshadowed.vert", "unshadowed.frag"),
        shadow_lit: crate::assets::ShaderPaths::new("shadow-lit.vert", "shadow-lit.frag"),
        shadow_map_gen: crate::assets::ShaderPaths::new("shadow-map-gen.vert", "shadow-map-gen.frag"),
        textures: Vec::new(),
    };

    let loaded = AssetLoader::load(&source, &manifest).unwrap();
    assert_eq!(loaded.shaders.shadow_map_gen.fragment, "void main() {}");
}
