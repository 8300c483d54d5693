/// Parallel fetch of the assets a scene needs before it can start
///
/// The scene description and all six shader texts are requested at once on
/// scoped threads and joined into one result. The first failure in manifest
/// order (scene, then each program's vertex and fragment text) is reported;
/// nothing is retried.

use std::thread::ScopedJoinHandle;
use crate::assets::{AssetManifest, AssetSource};
use crate::error::{Error, Result};
use crate::render::{ProgramRole, ShaderSources};
use crate::scene::SceneDescription;

const SOURCE: &str = "shadowcast3d::AssetLoader";

/// Everything fetched by [`AssetLoader::load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAssets {
    pub description: SceneDescription,
    pub shaders: ShaderSources,
}

pub struct AssetLoader;

impl AssetLoader {
    /// Fetch the scene description and shader sources of `manifest`
    ///
    /// # Errors
    ///
    /// The first `ResourceLoad` error in manifest order, logged once.
    pub fn load(source: &dyn AssetSource, manifest: &AssetManifest) -> Result<LoadedAssets> {
        crate::engine_debug!(SOURCE, "Fetching '{}' and {} shader(s)", manifest.scene, ProgramRole::ALL.len() * 2);

        std::thread::scope(|scope| -> Result<LoadedAssets> {
            let scene = scope.spawn(|| source.load_scene(&manifest.scene));
            let shaders: Vec<_> = ProgramRole::ALL.iter()
                .map(|&role| {
                    let paths = manifest.shader_paths(role);
                    let vertex = scope.spawn(move || source.load_text(&paths.vertex));
                    let fragment = scope.spawn(move || source.load_text(&paths.fragment));
                    (role, vertex, fragment)
                })
                .collect();

            let description = join(scene, &manifest.scene)?;
            let mut sources = ShaderSources::default();
            for (role, vertex, fragment) in shaders {
                let paths = manifest.shader_paths(role);
                let target = sources.get_mut(role);
                target.vertex = join(vertex, &paths.vertex)?;
                target.fragment = join(fragment, &paths.fragment)?;
            }

            Ok(LoadedAssets { description, shaders: sources })
        })
        .map_err(|error| crate::engine_fail!(SOURCE, error))
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, Result<T>>, path: &str) -> Result<T> {
    handle.join().map_err(|_| Error::resource_load(path, "loader thread panicked"))?
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
