#![allow(dead_code)]
//! Shared helpers for the integration tests
//!
//! Every test renders through the headless recording device, so none of them
//! need a GPU or a window.

use shadowcast_3d_engine::shadowcast3d::assets::{AssetManifest, AssetSource, MemoryAssetSource};
use shadowcast_3d_engine::shadowcast3d::config::SceneConfig;
use shadowcast_3d_engine::shadowcast3d::frame::FrameHost;
use shadowcast_3d_engine::shadowcast3d::render::{
    DeviceConfig, GraphicsDevice, RecordedCommand, RecordingGraphicsDevice, RecordingJournal,
};
use shadowcast_3d_engine::shadowcast3d::scene::SceneDescription;
use shadowcast_3d_engine::shadowcast3d::ShadowScene;
use std::sync::{Arc, Mutex};

/// Host that counts scheduling calls
#[derive(Default)]
pub struct CountingHost {
    pub subscribed: bool,
    pub tick_requests: u32,
    pub cancels: u32,
}

impl FrameHost for CountingHost {
    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    fn request_tick(&mut self) {
        self.tick_requests += 1;
    }

    fn cancel_tick(&mut self) {
        self.cancels += 1;
    }
}

pub fn recording_device(config: DeviceConfig) -> (Arc<Mutex<dyn GraphicsDevice>>, RecordingJournal) {
    let device = RecordingGraphicsDevice::new(config);
    let journal = device.journal();
    (Arc::new(Mutex::new(device)), journal)
}

pub fn procedural_source() -> Arc<dyn AssetSource> {
    Arc::new(MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural()))
}

/// Loaded (not running) scene over a fresh recording device
pub fn load_scene(device_config: DeviceConfig, scene_config: SceneConfig) -> (ShadowScene, RecordingJournal) {
    let (device, journal) = recording_device(device_config);
    let mut scene = ShadowScene::new(device, scene_config).unwrap();
    scene.load(procedural_source(), &AssetManifest::default()).unwrap();
    (scene, journal)
}

/// Framebuffer labels of every render pass, in recording order
pub fn pass_sequence(frame: &[RecordedCommand]) -> Vec<String> {
    frame.iter()
        .filter_map(|command| match command {
            RecordedCommand::BeginRenderPass { framebuffer, .. } => Some(framebuffer.clone()),
            _ => None,
        })
        .collect()
}

/// Buffer labels bound by every draw, in recording order
pub fn bound_buffers(frame: &[RecordedCommand]) -> Vec<String> {
    frame.iter()
        .filter_map(|command| match command {
            RecordedCommand::BindVertexBuffer { buffer, .. } => Some(buffer.clone()),
            RecordedCommand::BindIndexBuffer { buffer, .. } => Some(buffer.clone()),
            _ => None,
        })
        .collect()
}
