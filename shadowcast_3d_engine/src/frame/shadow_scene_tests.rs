use super::*;
use std::io::Cursor;
use crate::assets::MemoryAssetSource;
use crate::graphics_device::{DeviceConfig, RecordedCommand, RecordingGraphicsDevice, RecordingJournal};
use crate::scene::SceneDescription;

const EPS: f32 = 1e-4;

// ============================================================================
// TEST HELPERS
// ============================================================================

#[derive(Default)]
struct TestHost {
    subscribed: bool,
    tick_requests: u32,
    cancels: u32,
}

impl FrameHost for TestHost {
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

fn device(config: DeviceConfig) -> (Arc<Mutex<dyn GraphicsDevice>>, RecordingJournal) {
    let device = RecordingGraphicsDevice::new(config);
    let journal = device.journal();
    (Arc::new(Mutex::new(device)), journal)
}

fn source() -> Arc<dyn AssetSource> {
    Arc::new(MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural()))
}

fn loaded_scene(config: SceneConfig) -> (ShadowScene, RecordingJournal) {
    let (device, journal) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, config).unwrap();
    scene.load(source(), &AssetManifest::default()).unwrap();
    (scene, journal)
}

fn running_scene() -> (ShadowScene, TestHost, RecordingJournal) {
    let (mut scene, journal) = loaded_scene(SceneConfig::default());
    let mut host = TestHost::default();
    scene.begin(&mut host).unwrap();
    (scene, host, journal)
}

fn resource_count(scene: &ShadowScene) -> u32 {
    scene.device().lock().unwrap().stats().resource_count()
}

fn node(scene: &ShadowScene, role: SceneRole) -> NodeKey {
    scene.roles().unwrap().get(role).unwrap()
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_invalid_config_is_rejected() {
    let (device, _) = device(DeviceConfig::default());
    let config = SceneConfig { shadow_map_resolution: 0, ..SceneConfig::default() };
    assert!(matches!(ShadowScene::new(device, config), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_load_creates_every_role_and_target() {
    let (scene, _) = loaded_scene(SceneConfig::default());

    assert_eq!(scene.state(), SceneState::Loaded);
    assert_eq!(scene.nodes().unwrap().len(), 33);
    assert_eq!(scene.roles().unwrap().len(), 33);
    let targets = scene.shadow_targets().unwrap();
    assert_eq!(targets.resolution(), 512);
    assert_eq!(targets.cubes().len(), 2);
}

#[test]
fn test_second_load_is_rejected() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    let result = scene.load(source(), &AssetManifest::default());
    assert!(matches!(result, Err(Error::RuntimeState(_))));
}

#[test]
fn test_missing_room_fails_before_any_gpu_work() {
    let mut description = SceneDescription::procedural();
    description.remove("Room");
    let (device, _) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();

    let result = scene.load(
        Arc::new(MemoryAssetSource::with_builtin_shaders(description)),
        &AssetManifest::default(),
    );
    assert_eq!(result, Err(Error::SceneIntegrity { role: SceneRole::Walls }));
    assert_eq!(scene.state(), SceneState::Unloaded);
    assert_eq!(resource_count(&scene), 0);
}

#[test]
fn test_missing_shader_fails_before_any_gpu_work() {
    let mut source = MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural());
    source.remove("shaders/shadow_map_gen.vs.glsl");
    let (device, _) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();

    let result = scene.load(Arc::new(source), &AssetManifest::default());
    assert!(matches!(result, Err(Error::ResourceLoad { .. })));
    assert_eq!(resource_count(&scene), 0);
}

#[test]
fn test_begin_requires_load() {
    let (device, _) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();
    let mut host = TestHost::default();

    assert!(matches!(scene.begin(&mut host), Err(Error::RuntimeState(_))));
    assert!(!host.subscribed);
}

#[test]
fn test_begin_subscribes_and_schedules_first_tick() {
    let (scene, host, _) = running_scene();
    assert_eq!(scene.state(), SceneState::Running);
    assert!(host.subscribed);
    assert_eq!(host.tick_requests, 1);
}

#[test]
fn test_end_unsubscribes_and_cancels() {
    let (mut scene, mut host, _) = running_scene();
    scene.end(&mut host);

    assert_eq!(scene.state(), SceneState::Loaded);
    assert!(!host.subscribed);
    assert_eq!(host.cancels, 1);

    // Already stopped
    scene.end(&mut host);
    assert_eq!(host.cancels, 1);
}

#[test]
fn test_unload_while_running_is_rejected() {
    let (mut scene, mut host, _) = running_scene();
    assert!(matches!(scene.unload(), Err(Error::RuntimeState(_))));

    scene.end(&mut host);
    scene.unload().unwrap();
    assert_eq!(scene.state(), SceneState::Unloaded);
    assert!(scene.nodes().is_none());
}

#[test]
fn test_scene_can_be_reloaded_after_unload() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    scene.unload().unwrap();
    scene.load(source(), &AssetManifest::default()).unwrap();
    assert_eq!(scene.state(), SceneState::Loaded);
}

// ============================================================================
// TICKS
// ============================================================================

#[test]
fn test_tick_before_begin_is_rejected() {
    let (mut scene, journal) = loaded_scene(SceneConfig::default());
    let mut host = TestHost::default();

    assert!(matches!(scene.on_tick(&mut host, 16.0), Err(Error::RuntimeState(_))));
    assert_eq!(journal.frame_count(), 0);
}

#[test]
fn test_frame_before_load_is_rejected() {
    let (device, _) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();
    assert!(matches!(scene.advance_frame(16.0), Err(Error::RuntimeState(_))));
}

#[test]
fn test_tick_renders_and_requests_next() {
    let (mut scene, mut host, journal) = running_scene();
    let stats = scene.on_tick(&mut host, 1000.0).unwrap();

    assert_eq!(stats, FrameStats { render_passes: 14, shadow_draws: 13 * 33, shading_draws: 33 });
    assert_eq!(host.tick_requests, 2);
    assert_eq!(journal.frame_count(), 1);
}

#[test]
fn test_first_tick_advances_by_zero() {
    let (mut scene, mut host, _) = running_scene();
    scene.on_tick(&mut host, 5000.0).unwrap();

    let point = scene.lights().unwrap().point.as_ref().unwrap();
    assert!(point.position().x.abs() < EPS);
}

#[test]
fn test_point_light_follows_oscillation() {
    let (mut scene, mut host, _) = running_scene();
    scene.on_tick(&mut host, 500.0).unwrap();
    scene.on_tick(&mut host, 1500.0).unwrap();

    let expected_x = (1000.0f32 / 233.0).sin() * 2.8;
    let point = scene.lights().unwrap().point.as_ref().unwrap();
    assert!((point.position().x - expected_x).abs() < EPS);
    assert!((point.position().y - -5.0).abs() < EPS);

    let anchor = node(&scene, SceneRole::PointLightAnchor);
    assert!(scene.nodes().unwrap().translation(anchor).abs_diff_eq(point.position(), EPS));
}

#[test]
fn test_backwards_timestamp_is_clamped() {
    let (mut scene, mut host, _) = running_scene();
    scene.on_tick(&mut host, 1000.0).unwrap();
    scene.on_tick(&mut host, 900.0).unwrap();

    let point = scene.lights().unwrap().point.as_ref().unwrap();
    assert!(point.position().x.abs() < EPS);
}

// ============================================================================
// TOGGLES AND INPUT
// ============================================================================

#[test]
fn test_wireframe_switches_topology() {
    let (mut scene, journal) = loaded_scene(SceneConfig::default());
    scene.on_toggle(ToggleEvent::Wireframe);
    assert!(scene.is_wireframe());
    scene.advance_frame(16.0).unwrap();

    let frame = journal.last_frame().unwrap();
    assert!(frame.iter().all(|command| !matches!(
        command,
        RecordedCommand::DrawIndexed { topology: PrimitiveTopology::TriangleList, .. }
    )));
}

#[test]
fn test_entering_interactive_mode_turns_drone_and_moves_camera() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    scene.on_toggle(ToggleEvent::Interactive);

    let drone = node(&scene, SceneRole::Drone);
    let world = *scene.nodes().unwrap().world(drone);
    assert!(world.abs_diff_eq(Mat4::from_rotation_y(std::f32::consts::PI), EPS));
    assert_eq!(scene.camera().unwrap().position(), Vec3::new(0.1, 3.0, 4.0));

    scene.on_toggle(ToggleEvent::Interactive);
    let drone = node(&scene, SceneRole::Drone);
    assert!(scene.nodes().unwrap().world(drone).abs_diff_eq(Mat4::IDENTITY, EPS));
}

#[test]
fn test_interactive_drone_rests_without_input() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    scene.on_toggle(ToggleEvent::Interactive);
    let drone = node(&scene, SceneRole::Drone);

    scene.advance_frame(16.0).unwrap();
    scene.advance_frame(16.0).unwrap();
    assert!(scene.nodes().unwrap().translation(drone).abs_diff_eq(Vec3::ZERO, EPS));
}

#[test]
fn test_interactive_drone_steps_while_key_held() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    scene.on_toggle(ToggleEvent::Interactive);
    let drone = node(&scene, SceneRole::Drone);

    scene.on_input_changed(InputCommands::LEFT);
    scene.advance_frame(16.0).unwrap();
    scene.advance_frame(16.0).unwrap();
    scene.on_input_changed(InputCommands::empty());
    scene.advance_frame(16.0).unwrap();

    // Half-turned node: local +X is world -X
    let expected = Vec3::new(-2.0 * 0.0475, 0.0, 0.0);
    assert!(scene.nodes().unwrap().translation(drone).abs_diff_eq(expected, EPS));
}

#[test]
fn test_interactive_mode_pauses_demo_animation() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    let head = node(&scene, SceneRole::MonsterHead);

    scene.advance_frame(16.0).unwrap();
    let after_demo = scene.nodes().unwrap().translation(head);
    assert!(after_demo.length() > 0.0);

    scene.on_toggle(ToggleEvent::Interactive);
    scene.advance_frame(16.0).unwrap();
    assert_eq!(scene.nodes().unwrap().translation(head), after_demo);
}

#[test]
fn test_secondary_light_toggle_skips_spot_cube() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    scene.on_toggle(ToggleEvent::SecondaryLight);
    assert!(!scene.lights().unwrap().spot.as_ref().unwrap().is_enabled());

    let stats = scene.advance_frame(16.0).unwrap();
    assert_eq!(stats.render_passes, 8);

    scene.on_toggle(ToggleEvent::SecondaryLight);
    assert_eq!(scene.advance_frame(16.0).unwrap().render_passes, 14);
}

#[test]
fn test_camera_moves_with_held_input() {
    let (mut scene, _) = loaded_scene(SceneConfig::default());
    let start = *scene.camera().unwrap();

    scene.on_input_changed(InputCommands::FORWARD);
    scene.advance_frame(1000.0).unwrap();

    let moved = scene.camera().unwrap().position();
    let expected = start.position() + start.forward() * 3.5 + start.up() * (3.5 / 6.0);
    assert!(moved.abs_diff_eq(expected, EPS));
}

// ============================================================================
// CONFIGURATION VARIANTS
// ============================================================================

#[test]
fn test_disabled_shadows_render_single_unshadowed_pass() {
    let config = SceneConfig { shadows_enabled: false, ..SceneConfig::default() };
    let (mut scene, journal) = loaded_scene(config);
    assert!(scene.shadow_targets().is_none());

    let stats = scene.advance_frame(16.0).unwrap();
    assert_eq!(stats.render_passes, 1);
    assert_eq!(stats.shadow_draws, 0);
    let frame = journal.last_frame().unwrap();
    assert!(frame.contains(&RecordedCommand::UseProgram("unshadowed".to_string())));
}

#[test]
fn test_fixed_precision_device_still_renders() {
    let (device, journal) = device(DeviceConfig { float_textures: false, ..DeviceConfig::default() });
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();
    scene.load(source(), &AssetManifest::default()).unwrap();

    assert_eq!(scene.shadow_targets().unwrap().bias(), crate::render::FIXED_SHADOW_BIAS);
    scene.advance_frame(16.0).unwrap();
    assert_eq!(journal.frame_count(), 1);
}

#[test]
fn test_resize_refits_surface() {
    let (mut scene, journal) = loaded_scene(SceneConfig::default());

    let rect = scene.resize_surface(1280, 1000).unwrap().unwrap();
    assert_eq!((rect.width, rect.height), (1280, 720));
    assert_eq!(scene.resize_surface(0, 600).unwrap(), None);

    scene.advance_frame(16.0).unwrap();
    let frame = journal.last_frame().unwrap();
    assert!(frame.contains(&RecordedCommand::SetViewport(
        crate::graphics_device::Viewport::full(1280, 720)
    )));
}

// ============================================================================
// TEXTURE STREAMING
// ============================================================================

#[test]
fn test_streamed_bricks_replace_placeholder() {
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(8, 8, image::Rgba([180, 60, 40, 255])))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    let mut source = MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural());
    source.insert_bytes("bricks.png", png.into_inner());

    let (device, journal) = device(DeviceConfig::default());
    let mut scene = ShadowScene::new(device, SceneConfig::default()).unwrap();
    scene.load(Arc::new(source), &AssetManifest::default()).unwrap();

    let key = scene.textures().unwrap().key("bricks").unwrap();
    assert!(!scene.textures().unwrap().is_resident(key));

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while scene.pending_textures() > 0 && std::time::Instant::now() < deadline {
        scene.advance_frame(16.0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    scene.advance_frame(16.0).unwrap();

    let textures = scene.textures().unwrap();
    assert!(textures.is_resident(key));
    assert_eq!(textures.texture(key).info().width, 8);
    let frame = journal.last_frame().unwrap();
    assert!(frame.iter().any(|command| matches!(
        command,
        RecordedCommand::BindTexture { texture, .. } if texture == "bricks"
    )));
}

#[test]
fn test_oversized_streamed_texture_keeps_placeholder() {
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(64, 64, image::Rgba([180, 60, 40, 255])))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    let mut source = MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural());
    source.insert_bytes("bricks.png", png.into_inner());

    let (device, _) = device(DeviceConfig { max_texture_size: 32, ..DeviceConfig::default() });
    let config = SceneConfig { shadow_map_resolution: 32, ..SceneConfig::default() };
    let mut scene = ShadowScene::new(device, config).unwrap();
    scene.load(Arc::new(source), &AssetManifest::default()).unwrap();
    let key = scene.textures().unwrap().key("bricks").unwrap();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while scene.pending_textures() > 0 && std::time::Instant::now() < deadline {
        assert!(scene.advance_frame(16.0).is_ok());
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(scene.pending_textures(), 0);
    assert!(scene.advance_frame(16.0).is_ok());

    let textures = scene.textures().unwrap();
    assert!(!textures.is_resident(key));
    assert!(textures.texture(key).info().width <= 32);
}

#[test]
fn test_poisoned_device_lock_fails_the_frame() {
    let (mut scene, _journal) = loaded_scene(SceneConfig::default());
    let device = Arc::clone(scene.device());
    let _ = std::thread::spawn(move || {
        let _guard = device.lock().unwrap();
        panic!("device user panicked while holding the lock");
    }).join();

    assert!(matches!(scene.advance_frame(16.0), Err(Error::BackendError(_))));
}
