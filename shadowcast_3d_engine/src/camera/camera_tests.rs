use glam::{Mat4, Vec3};
use super::*;

const EPS: f32 = 1e-5;

fn main_camera() -> Camera {
    Camera::new(Vec3::new(0.0, 2.0, 6.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)).unwrap()
}

fn assert_orthonormal(camera: &Camera) {
    assert!((camera.forward().length() - 1.0).abs() < EPS);
    assert!((camera.up().length() - 1.0).abs() < EPS);
    assert!((camera.right().length() - 1.0).abs() < EPS);
    assert!(camera.forward().dot(camera.up()).abs() < EPS);
    assert!(camera.forward().dot(camera.right()).abs() < EPS);
    assert!(camera.up().dot(camera.right()).abs() < EPS);
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_builds_orthonormal_basis() {
    let camera = main_camera();
    assert_orthonormal(&camera);
    let expected_forward = (Vec3::new(0.0, 1.0, 0.0) - Vec3::new(0.0, 2.0, 6.0)).normalize();
    assert!(camera.forward().abs_diff_eq(expected_forward, EPS));
}

#[test]
fn test_new_rejects_parallel_up() {
    let result = Camera::new(Vec3::ZERO, Vec3::Y, Vec3::Y);
    assert!(matches!(result, Err(crate::error::Error::InvalidConfig(_))));
}

#[test]
fn test_new_rejects_coincident_look_at() {
    assert!(Camera::new(Vec3::ONE, Vec3::ONE, Vec3::Y).is_err());
}

// ============================================================================
// View matrix
// ============================================================================

#[test]
fn test_view_inverse_recovers_position() {
    let mut camera = main_camera();
    camera.move_forward(1.25);
    camera.rotate_right(0.4);
    camera.move_right(-0.5);

    let mut view = Mat4::ZERO;
    camera.view_matrix_into(&mut view);
    let decoded = view.inverse().w_axis.truncate();
    assert!(decoded.abs_diff_eq(camera.position(), 1e-4));
}

#[test]
fn test_view_maps_forward_to_negative_z() {
    let camera = main_camera();
    let view = camera.view_matrix();
    let ahead = view.transform_point3(camera.position() + camera.forward());
    assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-4));
}

// ============================================================================
// Movement and rotation
// ============================================================================

#[test]
fn test_moves_follow_basis() {
    let mut camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y).unwrap();
    camera.move_forward(2.0);
    camera.move_right(1.0);
    camera.move_up(0.5);
    assert!(camera.position().abs_diff_eq(Vec3::new(1.0, 0.5, -2.0), EPS));
}

#[test]
fn test_rotate_right_positive_turns_left() {
    let mut camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y).unwrap();
    camera.rotate_right(std::f32::consts::FRAC_PI_2);
    assert!(camera.forward().abs_diff_eq(-Vec3::X, EPS));
    assert_orthonormal(&camera);
}

#[test]
fn test_rotate_up_keeps_basis_orthogonal() {
    let mut camera = main_camera();
    for _ in 0..50 {
        camera.rotate_up(0.07);
        camera.rotate_right(-0.11);
    }
    assert_orthonormal(&camera);
}

#[test]
fn test_rotate_up_positive_looks_up() {
    let mut camera = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y).unwrap();
    camera.rotate_up(0.3);
    assert!(camera.forward().y > 0.0);
}
