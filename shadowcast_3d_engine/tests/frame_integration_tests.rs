//! Integration tests for the frame loop
//!
//! Drives a complete scene through begin / tick / toggle / end against the
//! recording device and checks the recorded command stream.
//!
//! Run with: cargo test --test frame_integration_tests

mod test_utils;

use shadowcast_3d_engine::glam::Vec3;
use shadowcast_3d_engine::shadowcast3d::config::SceneConfig;
use shadowcast_3d_engine::shadowcast3d::frame::{InputCommands, ToggleEvent};
use shadowcast_3d_engine::shadowcast3d::light::CubeFace;
use shadowcast_3d_engine::shadowcast3d::render::{
    DeviceConfig, PrimitiveTopology, ProgramRole, RecordedCommand, UniformSemantic, UniformValue,
    FIXED_SHADOW_BIAS, FLOAT_SHADOW_BIAS,
};
use shadowcast_3d_engine::shadowcast3d::scene::SceneRole;
use shadowcast_3d_engine::shadowcast3d::SceneState;
use test_utils::{bound_buffers, load_scene, pass_sequence, CountingHost};

// ============================================================================
// PASS ORDERING
// ============================================================================

#[test]
fn test_integration_frame_pass_order() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    let mut host = CountingHost::default();
    scene.begin(&mut host).unwrap();
    scene.on_tick(&mut host, 0.0).unwrap();

    let mut expected = vec!["shadow.directional".to_string()];
    for light in ["point", "spot"] {
        for face in CubeFace::ALL {
            expected.push(format!("shadow.{}.cube/{}", light, face.label()));
        }
    }
    expected.push("surface".to_string());

    let frame = journal.last_frame().unwrap();
    assert_eq!(pass_sequence(&frame), expected);
    assert_eq!(frame.first(), Some(&RecordedCommand::Begin));
    assert_eq!(frame.last(), Some(&RecordedCommand::End));
}

#[test]
fn test_integration_shadow_maps_are_sampled_after_they_are_written() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.advance_frame(16.0).unwrap();

    let frame = journal.last_frame().unwrap();
    let shading_start = frame.iter()
        .position(|command| matches!(
            command,
            RecordedCommand::BeginRenderPass { framebuffer, .. } if framebuffer == "surface"
        ))
        .unwrap();
    let first_shadow_bind = frame.iter()
        .position(|command| matches!(
            command,
            RecordedCommand::BindTexture { texture, .. } if texture.starts_with("shadow.")
        ))
        .unwrap();
    assert!(first_shadow_bind > shading_start);
}

#[test]
fn test_integration_every_tick_submits_one_frame() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    let mut host = CountingHost::default();
    scene.begin(&mut host).unwrap();

    for tick in 0..5 {
        scene.on_tick(&mut host, tick as f64 * 16.0).unwrap();
    }
    assert_eq!(journal.frame_count(), 5);
    assert_eq!(host.tick_requests, 6);

    scene.end(&mut host);
    assert_eq!(scene.state(), SceneState::Loaded);
    assert_eq!(host.cancels, 1);
}

// ============================================================================
// LIGHTS AND SHADOW PRECISION
// ============================================================================

#[test]
fn test_integration_light_positions_after_one_second() {
    let (mut scene, _) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.advance_frame(1000.0).unwrap();

    let lights = scene.lights().unwrap();
    let point = lights.point.as_ref().unwrap().position();
    let spot = lights.spot.as_ref().unwrap().position();
    assert!((point.x - (1000.0f32 / 233.0).sin() * 2.8).abs() < 1e-4);
    assert!((spot.x - 1.0f32.sin() * 2.5).abs() < 1e-4);
    assert!((spot.z - -3.0).abs() < 1e-4);
}

#[test]
fn test_integration_bias_follows_device_precision() {
    for (float_textures, bias) in [(true, FLOAT_SHADOW_BIAS), (false, FIXED_SHADOW_BIAS)] {
        let device = DeviceConfig { float_textures, ..DeviceConfig::default() };
        let (mut scene, journal) = load_scene(device, SceneConfig::default());
        scene.advance_frame(16.0).unwrap();

        let frame = journal.last_frame().unwrap();
        assert!(frame.iter().any(|command| matches!(
            command,
            RecordedCommand::SetUniform { value: UniformValue::Float(v), .. } if *v == bias
        )));
    }
}

#[test]
fn test_integration_directional_shadow_ignores_camera() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.advance_frame(16.0).unwrap();
    let before = journal.last_frame().unwrap();

    scene.on_input_changed(InputCommands::YAW_LEFT | InputCommands::PITCH_UP | InputCommands::BACK);
    scene.advance_frame(500.0).unwrap();
    let after = journal.last_frame().unwrap();
    assert_ne!(scene.camera().unwrap().position(), SceneConfig::default().camera.position);

    // Light-space setup of the directional pass, up to the first per-node world matrix
    let world = ProgramRole::ShadowMapGen.interface().uniform(UniformSemantic::World).unwrap();
    let directional_setup = |frame: &[RecordedCommand]| -> Vec<RecordedCommand> {
        let start = frame.iter()
            .position(|command| matches!(
                command,
                RecordedCommand::BeginRenderPass { framebuffer, .. } if framebuffer == "shadow.directional"
            ))
            .unwrap();
        frame[start..].iter()
            .take_while(|command| !matches!(command, RecordedCommand::SetUniform { slot, .. } if *slot == world))
            .cloned()
            .collect()
    };
    let setup = directional_setup(&before);
    assert!(setup.len() > 3);
    assert_eq!(setup, directional_setup(&after));
}

#[test]
fn test_integration_disabled_spot_skips_cube_and_goes_dark() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.on_toggle(ToggleEvent::SecondaryLight);
    scene.advance_frame(16.0).unwrap();

    let passes = pass_sequence(&journal.last_frame().unwrap());
    assert_eq!(passes.len(), 8);
    assert!(passes.iter().all(|label| !label.starts_with("shadow.spot")));
}

// ============================================================================
// RENDER MODES
// ============================================================================

#[test]
fn test_integration_wireframe_reuses_buffers() {
    let (mut scene, journal) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.advance_frame(16.0).unwrap();
    let solid = journal.last_frame().unwrap();

    scene.on_toggle(ToggleEvent::Wireframe);
    scene.advance_frame(16.0).unwrap();
    let wire = journal.last_frame().unwrap();

    assert_eq!(bound_buffers(&solid), bound_buffers(&wire));
    let topologies: Vec<PrimitiveTopology> = wire.iter()
        .filter_map(|command| match command {
            RecordedCommand::DrawIndexed { topology, .. } => Some(*topology),
            _ => None,
        })
        .collect();
    assert!(!topologies.is_empty());
    assert!(topologies.iter().all(|&topology| topology == PrimitiveTopology::LineList));
}

#[test]
fn test_integration_interactive_drone_only_moves_on_input() {
    let (mut scene, _) = load_scene(DeviceConfig::default(), SceneConfig::default());
    scene.on_toggle(ToggleEvent::Interactive);
    let drone = scene.roles().unwrap().get(SceneRole::Drone).unwrap();

    for _ in 0..3 {
        scene.advance_frame(16.0).unwrap();
    }
    assert!(scene.nodes().unwrap().translation(drone).abs_diff_eq(Vec3::ZERO, 1e-5));

    scene.on_input_changed(InputCommands::UP);
    scene.advance_frame(16.0).unwrap();
    let lifted = scene.nodes().unwrap().translation(drone);
    assert!(lifted.abs_diff_eq(Vec3::new(0.0, 0.0475, 0.0), 1e-5));
}
