use glam::{Mat4, Vec3};
use super::*;
use crate::config::{DirectionalLightConfig, OmniLightConfig};
use crate::light::CubeFace;

const EPS: f32 = 1e-4;

// ============================================================================
// Omni shadow frustum
// ============================================================================

#[test]
fn test_six_face_views_decode_to_light_position() {
    let mut light = OmniLight::new(LightKind::Point, &OmniLightConfig::point()).unwrap();
    let position = Vec3::new(1.3, -4.0, -3.5);
    light.set_position(position);

    for face in CubeFace::ALL {
        let decoded = light.frustum().view(face).inverse().w_axis.truncate();
        assert!(decoded.abs_diff_eq(position, EPS), "face {}", face.label());
    }
}

#[test]
fn test_each_face_looks_along_its_axis() {
    let light = OmniLight::new(LightKind::Spot, &OmniLightConfig::spot()).unwrap();
    let origin = light.position();
    for face in CubeFace::ALL {
        let ahead = light.frustum().view(face).transform_point3(origin + face.direction());
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS), "face {}", face.label());
    }
}

#[test]
fn test_face_order_and_up_vectors() {
    let layers: Vec<u32> = CubeFace::ALL.iter().map(|f| f.layer()).collect();
    assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(CubeFace::PositiveX.up(), Vec3::NEG_Y);
    assert_eq!(CubeFace::PositiveY.up(), Vec3::Z);
    assert_eq!(CubeFace::NegativeY.up(), Vec3::NEG_Z);
    assert_eq!(CubeFace::NegativeZ.up(), Vec3::NEG_Y);
}

#[test]
fn test_faces_share_one_square_projection() {
    let light = OmniLight::new(LightKind::Point, &OmniLightConfig::point()).unwrap();
    let expected = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 0.05, 15.0);
    assert!(light.frustum().projection_matrix().abs_diff_eq(expected, 1e-6));
    assert_eq!(light.frustum().clip_near_far(), [0.05, 15.0]);
}

#[test]
fn test_zero_near_plane_rejected_at_construction() {
    let config = OmniLightConfig { near: 0.0, ..OmniLightConfig::point() };
    assert!(OmniLight::new(LightKind::Point, &config).is_err());
}

#[test]
fn test_disabled_light_has_zero_intensity() {
    let mut spot = OmniLight::new(LightKind::Spot, &OmniLightConfig::spot()).unwrap();
    assert_eq!(spot.effective_intensity(), 0.8);
    spot.set_enabled(false);
    assert_eq!(spot.effective_intensity(), 0.0);
    spot.set_enabled(true);
    assert_eq!(spot.effective_intensity(), 0.8);
}

// ============================================================================
// Directional light
// ============================================================================

#[test]
fn test_directional_light_space_is_fixed() {
    let light = DirectionalLight::new(&DirectionalLightConfig::default()).unwrap();
    let view = *light.view_matrix();
    let projection = *light.projection_matrix();

    // The camera eye is the origin and the light direction maps to -Z.
    assert!(view.inverse().w_axis.truncate().abs_diff_eq(Vec3::ZERO, EPS));
    let ahead = view.transform_point3(light.direction());
    assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));

    let expected = Mat4::orthographic_rh_gl(-20.0, 20.0, -20.0, 20.0, -20.0, 20.0);
    assert!(projection.abs_diff_eq(expected, 1e-6));
    assert_eq!(light.clip_near_far(), [-20.0, 20.0]);
}

#[test]
fn test_directional_light_keeps_configured_intensity() {
    let config = DirectionalLightConfig { intensity: 0.25, ..Default::default() };
    let light = DirectionalLight::new(&config).unwrap();
    assert_eq!(light.intensity(), 0.25);
    assert!(light.color().abs_diff_eq(config.color, EPS));
}

#[test]
fn test_directional_light_along_world_up_is_valid() {
    let config = DirectionalLightConfig { direction: Vec3::Y, ..Default::default() };
    assert!(DirectionalLight::new(&config).is_ok());
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn test_oscillation_accumulates_phase() {
    let mut animation = OscillationAnimation::new(2.8, 233.0).unwrap();
    animation.advance(400.0);
    let x = animation.advance(600.0);
    let expected = (1000.0f32 / 233.0).sin() * 2.8;
    assert!((x - expected).abs() < 1e-4);
}

#[test]
fn test_oscillation_keeps_precision_after_a_day() {
    let mut animation = OscillationAnimation::new(2.8, 233.0).unwrap();
    animation.advance(86_400_000.0);
    let before = animation.phase();
    assert!((0.0..std::f32::consts::TAU).contains(&before));

    animation.advance(16.0);
    let step = (animation.phase() - before).rem_euclid(std::f32::consts::TAU);
    assert!((step - 16.0 / 233.0).abs() < 1e-5, "step was {}", step);
}

#[test]
fn test_oscillation_rejects_zero_period() {
    assert!(OscillationAnimation::new(1.0, 0.0).is_err());
}

// ============================================================================
// Rig
// ============================================================================

#[test]
fn test_rig_orders_point_before_spot() {
    let rig = LightRig::new(
        Some(&OmniLightConfig::point()),
        Some(&OmniLightConfig::spot()),
        Some(&DirectionalLightConfig::default()),
    ).unwrap();
    let kinds: Vec<LightKind> = rig.omni_lights().map(|l| l.kind()).collect();
    assert_eq!(kinds, vec![LightKind::Point, LightKind::Spot]);
}

#[test]
fn test_rig_with_absent_lights() {
    let rig = LightRig::new(None, Some(&OmniLightConfig::spot()), None).unwrap();
    assert_eq!(rig.omni_count(), 1);
    assert!(rig.directional.is_none());
}
