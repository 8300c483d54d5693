use super::*;
use glam::Vec4;
use crate::config::{DirectionalLightConfig, OmniLightConfig};
use crate::graphics_device::{
    DeviceConfig, GraphicsDevice, RecordedCommand, RecordingGraphicsDevice, RecordingJournal,
};
use crate::render::{ProgramSet, ShaderSources};
use crate::scene::GeometryData;

struct Fixture {
    device: RecordingGraphicsDevice,
    journal: RecordingJournal,
    generator: ShadowMapGenerator,
    nodes: NodeRegistry,
    lights: LightRig,
    targets: ShadowTargets,
}

fn fixture() -> Fixture {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let journal = device.journal();
    let programs = ProgramSet::create(&mut device, &ShaderSources::builtin()).unwrap();
    let generator = ShadowMapGenerator::new(programs.shadow_map_gen.clone()).unwrap();

    let mut nodes = NodeRegistry::new();
    nodes.create_node(&mut device, "Floor", &GeometryData::cuboid(4.0, 0.1, 4.0), Vec4::ONE).unwrap();
    nodes.create_node(&mut device, "Rock1", &GeometryData::cuboid(0.3, 0.2, 0.3), Vec4::ONE).unwrap();

    let lights = LightRig::new(
        Some(&OmniLightConfig::point()),
        Some(&OmniLightConfig::spot()),
        Some(&DirectionalLightConfig::default()),
    )
    .unwrap();
    let targets = ShadowTargets::create(&mut device, 64, &lights).unwrap();

    Fixture { device, journal, generator, nodes, lights, targets }
}

fn record(fixture: &mut Fixture, topology: PrimitiveTopology) -> (ShadowPassStats, Vec<RecordedCommand>) {
    let mut cmd = fixture.device.create_command_list().unwrap();
    cmd.begin().unwrap();
    let stats = fixture.generator
        .render(cmd.as_mut(), &fixture.nodes, &fixture.lights, &fixture.targets, topology)
        .unwrap();
    cmd.end().unwrap();
    fixture.device.submit(cmd.as_ref()).unwrap();
    (stats, fixture.journal.last_frame().unwrap())
}

fn pass_labels(commands: &[RecordedCommand]) -> Vec<String> {
    commands.iter()
        .filter_map(|command| match command {
            RecordedCommand::BeginRenderPass { framebuffer, .. } => Some(framebuffer.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_directional_map_then_point_then_spot_faces() {
    let mut fixture = fixture();
    let (stats, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);

    let mut expected = vec!["shadow.directional".to_string()];
    for light in ["point", "spot"] {
        for face in CubeFace::ALL {
            expected.push(format!("shadow.{}.cube/{}", light, face.label()));
        }
    }
    assert_eq!(pass_labels(&commands), expected);
    assert_eq!(stats, ShadowPassStats { render_passes: 13, draws: 26 });
}

#[test]
fn test_each_pass_clears_and_sets_square_viewport() {
    let mut fixture = fixture();
    let (_, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);

    for (index, command) in commands.iter().enumerate() {
        if let RecordedCommand::BeginRenderPass { clear_values, .. } = command {
            assert_eq!(clear_values.as_slice(), &SHADOW_CLEAR);
            assert_eq!(commands[index + 1], RecordedCommand::SetViewport(Viewport::full(64, 64)));
        }
    }
}

#[test]
fn test_passes_never_overlap() {
    let mut fixture = fixture();
    let (_, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);

    let mut open = false;
    for command in &commands {
        match command {
            RecordedCommand::BeginRenderPass { .. } => {
                assert!(!open);
                open = true;
            }
            RecordedCommand::EndRenderPass => {
                assert!(open);
                open = false;
            }
            _ => {}
        }
    }
    assert!(!open);
}

#[test]
fn test_only_position_stream_is_bound() {
    let mut fixture = fixture();
    let (_, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);

    let vertex_buffers: Vec<&String> = commands.iter()
        .filter_map(|command| match command {
            RecordedCommand::BindVertexBuffer { buffer, .. } => Some(buffer),
            _ => None,
        })
        .collect();
    assert_eq!(vertex_buffers.len(), 26);
    assert!(vertex_buffers.iter().all(|label| label.ends_with(".positions")));
    assert!(!commands.iter().any(|command| matches!(command, RecordedCommand::BindTexture { .. })));
}

#[test]
fn test_directional_flag_distinguishes_passes() {
    let mut fixture = fixture();
    let (_, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);
    let slot = ShadowGenBindings::resolve(fixture.generator.program().as_ref()).unwrap().directional_pass;

    let flags: Vec<f32> = commands.iter()
        .filter_map(|command| match command {
            RecordedCommand::SetUniform { slot: s, value: UniformValue::Float(v) } if *s == slot => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(flags.len(), 13);
    assert_eq!(flags[0], 1.0);
    assert!(flags[1..].iter().all(|&flag| flag == 0.0));
}

#[test]
fn test_disabled_spot_light_skips_its_cube() {
    let mut fixture = fixture();
    if let Some(spot) = fixture.lights.spot.as_mut() {
        spot.set_enabled(false);
    }
    let (stats, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);

    assert_eq!(stats.render_passes, 7);
    assert!(!pass_labels(&commands).iter().any(|label| label.starts_with("shadow.spot")));
}

#[test]
fn test_wireframe_topology_reaches_every_draw() {
    let mut fixture = fixture();
    let (_, commands) = record(&mut fixture, PrimitiveTopology::LineList);

    let topologies: Vec<PrimitiveTopology> = commands.iter()
        .filter_map(|command| match command {
            RecordedCommand::DrawIndexed { topology, .. } => Some(*topology),
            _ => None,
        })
        .collect();
    assert_eq!(topologies.len(), 26);
    assert!(topologies.iter().all(|&topology| topology == PrimitiveTopology::LineList));
}

#[test]
fn test_cube_faces_receive_light_position() {
    let mut fixture = fixture();
    let position = Vec3::new(1.5, -5.0, -4.0);
    if let Some(point) = fixture.lights.point.as_mut() {
        point.set_position(position);
    }
    let (_, commands) = record(&mut fixture, PrimitiveTopology::TriangleList);
    let slot = ShadowGenBindings::resolve(fixture.generator.program().as_ref()).unwrap().light_position;

    let positions: Vec<Vec3> = commands.iter()
        .filter_map(|command| match command {
            RecordedCommand::SetUniform { slot: s, value: UniformValue::Vec3(v) } if *s == slot => Some(*v),
            _ => None,
        })
        .collect();
    // Directional pass, then six point faces
    assert!(positions[1..7].iter().all(|&p| p == position));
}
