/// Background texture streaming
///
/// Each request fetches and decodes one image on its own thread and posts the
/// RGBA result on a channel. The render loop drains the channel at the start of
/// a tick and never waits for a stream to finish.

use std::sync::mpsc;
use std::sync::Arc;
use crate::assets::AssetSource;
use crate::error::{Error, Result};
use crate::scene::TextureKey;

const SOURCE: &str = "shadowcast3d::TextureStreamer";

/// Decoded 8-bit RGBA image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode PNG or JPEG bytes into RGBA8
pub fn decode_rgba(path: &str, bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::resource_load(path, format!("decode failed: {e}")))?
        .to_rgba8();
    Ok(DecodedImage {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}

/// Texture that finished streaming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamedTexture {
    pub key: TextureKey,
    pub image: DecodedImage,
}

struct StreamResult {
    key: TextureKey,
    path: String,
    image: Result<DecodedImage>,
}

pub struct TextureStreamer {
    result_tx: mpsc::Sender<StreamResult>,
    result_rx: mpsc::Receiver<StreamResult>,
    in_flight: usize,
}

impl TextureStreamer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            result_tx: tx,
            result_rx: rx,
            in_flight: 0,
        }
    }

    /// Start fetching `path` for the slot `key`
    pub fn request(&mut self, source: Arc<dyn AssetSource>, key: TextureKey, path: &str) {
        let tx = self.result_tx.clone();
        let path = path.to_string();
        self.in_flight += 1;
        crate::engine_debug!(SOURCE, "Streaming '{}'", path);

        std::thread::spawn(move || {
            let image = source.load_bytes(&path).and_then(|bytes| decode_rgba(&path, &bytes));
            // The receiver is gone once the scene unloads.
            let _ = tx.send(StreamResult { key, path, image });
        });
    }

    /// Drain every stream that completed since the last poll
    ///
    /// Failed streams are logged and dropped; their slot keeps its placeholder.
    pub fn poll(&mut self) -> Vec<StreamedTexture> {
        let mut ready = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            match result.image {
                Ok(image) => ready.push(StreamedTexture { key: result.key, image }),
                Err(error) => crate::engine_warn!(
                    SOURCE,
                    "Texture '{}' unavailable, keeping placeholder: {}",
                    result.path, error
                ),
            }
        }
        ready
    }

    /// Requests whose result has not been polled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Default for TextureStreamer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "texture_streamer_tests.rs"]
mod tests;
