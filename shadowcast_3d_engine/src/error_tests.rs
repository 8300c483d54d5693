//! Unit tests for error.rs

use crate::error::{Error, Result, ShaderStage};
use crate::scene::SceneRole;

// ============================================================================
// DISPLAY
// ============================================================================

#[test]
fn test_resource_load_display_names_resource() {
    let err = Error::resource_load("Room.json", "404 Not Found");
    let display = format!("{}", err);
    assert!(display.contains("Room.json"));
    assert!(display.contains("404 Not Found"));
}

#[test]
fn test_scene_integrity_display_names_source_node() {
    let err = Error::SceneIntegrity { role: SceneRole::Walls };
    let display = format!("{}", err);
    assert!(display.contains("Room"));
    assert!(display.contains("Walls"));
}

#[test]
fn test_shader_compile_display_is_prefixed_with_program() {
    let err = Error::ShaderCompile {
        program: "ShadowLit".to_string(),
        stage: ShaderStage::Fragment,
        diagnostic: "ERROR: 0:12: 'foo' : undeclared identifier".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.starts_with("ShadowLit:"));
    assert!(display.contains("fragment"));
    assert!(display.contains("undeclared identifier"));
}

#[test]
fn test_shader_link_display_is_prefixed_with_program() {
    let err = Error::ShaderLink {
        program: "ShadowMapGen".to_string(),
        diagnostic: "missing uniform mWorld".to_string(),
    };
    assert!(format!("{}", err).starts_with("ShadowMapGen:"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_runtime_state_and_config_display() {
    let state = Error::RuntimeState("tick before load".to_string());
    assert!(format!("{}", state).contains("tick before load"));

    let config = Error::InvalidConfig("near plane must be > 0".to_string());
    assert!(format!("{}", config).contains("Invalid configuration"));
}

// ============================================================================
// TRAITS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::BackendError("lost device".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_equality_distinguishes_roles() {
    let walls = Error::SceneIntegrity { role: SceneRole::Walls };
    let drone = Error::SceneIntegrity { role: SceneRole::Drone };
    assert_eq!(walls.clone(), walls);
    assert_ne!(walls, drone);
}

#[test]
fn test_result_question_mark_propagates() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidResource("bad".to_string()))
    }
    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }
    assert!(matches!(outer(), Err(Error::InvalidResource(_))));
}
