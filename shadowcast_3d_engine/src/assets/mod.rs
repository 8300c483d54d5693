//! Asset fetching: scene description and shaders before load, textures after

mod loader;
mod source;
mod texture_streamer;

pub use loader::{AssetLoader, LoadedAssets};
pub use source::{AssetManifest, AssetSource, MemoryAssetSource, ShaderPaths};
pub use texture_streamer::{decode_rgba, DecodedImage, StreamedTexture, TextureStreamer};
