/// Per-tick motion: camera controls, the interactive node and demo animation

use glam::Vec3;
use crate::camera::Camera;
use crate::frame::InputCommands;
use crate::scene::{NodeRegistry, RoleMap, SceneRole};

/// Scripted idle motion of demo mode: (role, translation per tick)
pub const DEMO_MOTIONS: [(SceneRole, Vec3); 3] = [
    (SceneRole::DroneRotorLeft, Vec3::new(0.01943, 0.0, 0.01)),
    (SceneRole::DroneRotorRight, Vec3::new(0.01943, 0.0, -0.01)),
    (SceneRole::MonsterHead, Vec3::new(0.01999, 0.0, 0.01)),
];

/// Move and turn the camera for the held commands
///
/// Opposite commands cancel. Moving forward or back also lifts the camera by
/// a sixth of the distance.
pub fn apply_camera_input(
    camera: &mut Camera,
    input: InputCommands,
    dt_ms: f32,
    move_speed: f32,
    rotate_speed: f32,
) {
    let distance = dt_ms / 1000.0 * move_speed;
    let angle = dt_ms / 1000.0 * rotate_speed;

    let forward = input.axis(InputCommands::FORWARD, InputCommands::BACK);
    if forward != 0.0 {
        camera.move_forward(forward * distance);
        camera.move_up(forward * distance / 6.0);
    }
    let right = input.axis(InputCommands::RIGHT, InputCommands::LEFT);
    if right != 0.0 {
        camera.move_right(right * distance);
    }
    let up = input.axis(InputCommands::UP, InputCommands::DOWN);
    if up != 0.0 {
        camera.move_up(up * distance);
    }

    let yaw = input.axis(InputCommands::YAW_LEFT, InputCommands::YAW_RIGHT);
    if yaw != 0.0 {
        camera.rotate_right(yaw * angle);
    }
    let pitch = input.axis(InputCommands::PITCH_UP, InputCommands::PITCH_DOWN);
    if pitch != 0.0 {
        camera.rotate_up(pitch * angle);
    }
}

/// Translation applied to the interactive node this tick
///
/// Recomputed from scratch every tick; with no movement command held it is zero.
/// Left moves along +X and forward along +Z, matching the node's half-turn
/// orientation in interactive mode.
pub fn interactive_step(input: InputCommands, step: f32) -> Vec3 {
    Vec3::new(
        input.axis(InputCommands::LEFT, InputCommands::RIGHT),
        input.axis(InputCommands::UP, InputCommands::DOWN),
        input.axis(InputCommands::FORWARD, InputCommands::BACK),
    ) * step
}

/// Advance the demo-mode motion of the rotors and the monster's head
pub fn apply_demo_animation(nodes: &mut NodeRegistry, roles: &RoleMap, dt_ms: f32, move_speed: f32) {
    let spin = dt_ms / 6000.0 * move_speed;
    for (role, step) in DEMO_MOTIONS {
        if let Some(key) = roles.get(role) {
            nodes.translate(key, step);
            nodes.rotate_y(key, spin);
        }
    }
}

#[cfg(test)]
#[path = "animation_tests.rs"]
mod tests;
