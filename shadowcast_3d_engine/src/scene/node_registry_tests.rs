use glam::{Mat4, Vec3, Vec4};
use super::*;
use crate::graphics_device::{DeviceConfig, RecordingGraphicsDevice};

const EPS: f32 = 1e-5;

fn registry_with(names: &[&str]) -> (NodeRegistry, Vec<NodeKey>) {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let mut registry = NodeRegistry::new();
    let keys = names.iter()
        .map(|name| registry.create_node(
            &mut device,
            name,
            &GeometryData::cuboid(0.5, 0.5, 0.5),
            Vec4::ONE,
        ).unwrap())
        .collect();
    (registry, keys)
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_node_starts_at_identity() {
    let (registry, keys) = registry_with(&["Drone"]);
    assert_eq!(*registry.world(keys[0]), Mat4::IDENTITY);
    assert_eq!(registry.node(keys[0]).name(), "Drone");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_iteration_follows_creation_order() {
    let (registry, keys) = registry_with(&["Room", "Chair", "Drone"]);
    let iterated: Vec<NodeKey> = registry.iter().map(|(key, _)| key).collect();
    assert_eq!(iterated, keys);
    assert_eq!(registry.find_by_name("Chair"), Some(keys[1]));
    assert_eq!(registry.find_by_name("Bike"), None);
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn test_translate_accumulates() {
    let (mut registry, keys) = registry_with(&["Drone"]);
    let key = keys[0];
    let a = Vec3::new(1.0, 0.0, -2.0);
    let b = Vec3::new(0.25, 3.0, 0.5);

    registry.translate(key, a);
    registry.translate(key, b);

    assert!(registry.translation(key).abs_diff_eq(a + b, EPS));
}

#[test]
fn test_translate_is_in_local_frame() {
    let (mut registry, keys) = registry_with(&["Rotor"]);
    let key = keys[0];
    registry.rotate_y(key, std::f32::consts::FRAC_PI_2);
    registry.translate(key, Vec3::X);
    // +X local maps to -Z world after a quarter turn about Y.
    assert!(registry.translation(key).abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
}

#[test]
fn test_set_rotation_discards_translation() {
    let (mut registry, keys) = registry_with(&["Drone"]);
    let key = keys[0];
    registry.translate(key, Vec3::new(4.0, 5.0, 6.0));
    registry.set_rotation(key, std::f32::consts::PI, Vec3::Y);

    assert!(registry.translation(key).abs_diff_eq(Vec3::ZERO, EPS));
    let turned = registry.world(key).transform_vector3(Vec3::Z);
    assert!(turned.abs_diff_eq(-Vec3::Z, EPS));
}

#[test]
fn test_set_translation_keeps_rotation() {
    let (mut registry, keys) = registry_with(&["LightBulb"]);
    let key = keys[0];
    registry.rotate_axis(key, 0.7, Vec3::new(1.0, 1.0, 0.0));
    let rotation_before = registry.world(key).x_axis;

    registry.set_translation(key, Vec3::new(0.0, -5.0, -4.0));
    registry.set_translation_component(key, 0, 1.5);

    assert_eq!(registry.world(key).x_axis, rotation_before);
    assert!(registry.translation(key).abs_diff_eq(Vec3::new(1.5, -5.0, -4.0), EPS));
}

#[test]
fn test_zero_axis_rotation_leaves_world_finite() {
    let (mut registry, keys) = registry_with(&["Drone"]);
    let key = keys[0];
    registry.translate(key, Vec3::new(2.0, 0.0, -1.0));
    let before = *registry.world(key);

    registry.rotate_axis(key, 1.2, Vec3::ZERO);
    assert!(registry.world(key).is_finite());
    assert_eq!(*registry.world(key), before);

    registry.set_rotation(key, 0.4, Vec3::ZERO);
    assert_eq!(*registry.world(key), Mat4::IDENTITY);
}

#[test]
#[should_panic(expected = "unknown node handle")]
fn test_unknown_handle_panics() {
    let (mut registry, _) = registry_with(&[]);
    let (_, foreign) = registry_with(&["Elsewhere"]);
    registry.translate(foreign[0], Vec3::ONE);
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn test_group_records_metadata_without_composing_transforms() {
    let (mut registry, keys) = registry_with(&["Bike", "FrontWheelBike", "RearWheelBike"]);
    let (bike, front, rear) = (keys[0], keys[1], keys[2]);

    registry.group(bike, &[front, rear]);
    registry.translate(bike, Vec3::new(10.0, 0.0, 0.0));

    assert_eq!(registry.node(bike).children(), &[front, rear]);
    assert_eq!(registry.node(front).parent(), Some(bike));
    assert!(registry.translation(front).abs_diff_eq(Vec3::ZERO, EPS));
}

#[test]
fn test_regrouping_moves_child() {
    let (mut registry, keys) = registry_with(&["Monster", "HeadMonster", "EyesMonster"]);
    let (monster, head, eyes) = (keys[0], keys[1], keys[2]);

    registry.group(monster, &[eyes]);
    registry.group(head, &[eyes]);

    assert!(registry.node(monster).children().is_empty());
    assert_eq!(registry.node(head).children(), &[eyes]);
    assert_eq!(registry.node(eyes).parent(), Some(head));
}
