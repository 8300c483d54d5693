use glam::Vec4;
use super::*;

#[test]
fn test_clip_range_rejects_zero_or_negative_near() {
    assert!(ClipRange::new(0.0, 10.0).is_err());
    assert!(ClipRange::new(-0.1, 10.0).is_err());
    assert!(ClipRange::new(f32::NAN, 10.0).is_err());
}

#[test]
fn test_clip_range_rejects_far_not_beyond_near() {
    assert!(ClipRange::new(1.0, 1.0).is_err());
    assert!(ClipRange::new(0.05, 15.0).is_ok());
}

#[test]
fn test_cube_face_projection_is_square_ninety_degrees() {
    let clip = ClipRange::new(0.05, 15.0).unwrap();
    let projection = Projection::cube_face(clip);
    assert!(projection.validate().is_ok());

    // A point on the 45° edge of the frustum lands on the clip-space edge.
    let clip_pos = projection.matrix() * Vec4::new(1.0, 0.0, -1.0, 1.0);
    assert!((clip_pos.x / clip_pos.w - 1.0).abs() < 1e-5);
    assert_eq!(projection.clip_near_far(), [0.05, 15.0]);
}

#[test]
fn test_orthographic_projection_maps_extent_to_unit_cube() {
    let projection = Projection::Orthographic { extent: 20.0 };
    let corner = projection.matrix() * Vec4::new(20.0, -20.0, 0.0, 1.0);
    assert!((corner.x - 1.0).abs() < 1e-5);
    assert!((corner.y + 1.0).abs() < 1e-5);
    assert_eq!(projection.clip_near_far(), [-20.0, 20.0]);
    assert!(Projection::Orthographic { extent: 0.0 }.validate().is_err());
}
