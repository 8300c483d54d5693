/// Navigable camera: position plus an orthonormal forward/up/right basis.
///
/// Used for the main view and for every light's shadow-face cameras. The view
/// matrix is written into caller-owned storage so per-frame updates do not
/// allocate.

use glam::{Mat4, Quat, Vec3};
use crate::error::{Error, Result};

/// Squared length under which two directions are treated as parallel
const PARALLEL_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    right: Vec3,
}

impl Camera {
    /// Build a camera at `position` looking at `look_at`
    ///
    /// `up` is only a hint: the stored up vector is re-orthogonalized against
    /// the forward direction.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `look_at == position` or `up` is parallel to the
    /// viewing direction.
    pub fn new(position: Vec3, look_at: Vec3, up: Vec3) -> Result<Self> {
        let to_target = look_at - position;
        if to_target.length_squared() <= PARALLEL_EPSILON {
            return Err(Error::InvalidConfig(format!(
                "Camera look-at point {} coincides with its position",
                look_at
            )));
        }
        let forward = to_target.normalize();
        let right = forward.cross(up);
        if right.length_squared() <= PARALLEL_EPSILON {
            return Err(Error::InvalidConfig(format!(
                "Camera up vector {} is parallel to the view direction {}",
                up, forward
            )));
        }
        let right = right.normalize();
        let up = right.cross(forward).normalize();

        Ok(Self { position, forward, up, right })
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    // ===== MOVEMENT =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Translate along the forward direction
    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward * distance;
    }

    /// Translate along the right direction
    pub fn move_right(&mut self, distance: f32) {
        self.position += self.right * distance;
    }

    /// Translate along the camera's own up direction
    pub fn move_up(&mut self, distance: f32) {
        self.position += self.up * distance;
    }

    /// Yaw about the up axis; positive angles turn counter-clockwise seen from above
    pub fn rotate_right(&mut self, angle: f32) {
        let rotation = Quat::from_axis_angle(self.up, angle);
        self.forward = (rotation * self.forward).normalize();
        self.right = self.forward.cross(self.up).normalize();
    }

    /// Pitch about the right axis; positive angles look up
    pub fn rotate_up(&mut self, angle: f32) {
        let rotation = Quat::from_axis_angle(self.right, angle);
        self.forward = (rotation * self.forward).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }

    // ===== MATRICES =====

    /// Write the world-to-view matrix into `out`
    pub fn view_matrix_into(&self, out: &mut Mat4) {
        *out = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    pub fn view_matrix(&self) -> Mat4 {
        let mut view = Mat4::IDENTITY;
        self.view_matrix_into(&mut view);
        view
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
