use super::*;
use crate::graphics_device::{DeviceConfig, RecordingGraphicsDevice};

fn triangle() -> GeometryData {
    GeometryData {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        tex_coords: None,
        indices: vec![[0, 1, 2]],
    }
}

#[test]
fn test_valid_triangle_passes() {
    assert!(triangle().validate("tri").is_ok());
    assert_eq!(triangle().index_count(), 3);
}

#[test]
fn test_out_of_range_index_is_rejected() {
    let mut geometry = triangle();
    geometry.indices.push([0, 2, 3]);
    match geometry.validate("tri") {
        Err(Error::ResourceLoad { resource, reason }) => {
            assert_eq!(resource, "tri");
            assert!(reason.contains("out of range"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_mismatched_normals_are_rejected() {
    let mut geometry = triangle();
    geometry.normals.pop();
    assert!(geometry.validate("tri").is_err());
}

#[test]
fn test_mismatched_tex_coords_are_rejected() {
    let mut geometry = triangle();
    geometry.tex_coords = Some(vec![[0.0, 0.0]]);
    assert!(geometry.validate("tri").is_err());
}

#[test]
fn test_cuboid_is_closed_and_valid() {
    let cube = GeometryData::cuboid(1.0, 2.0, 0.5);
    assert!(cube.validate("cube").is_ok());
    assert_eq!(cube.positions.len(), 24);
    assert_eq!(cube.index_count(), 36);
    for position in &cube.positions {
        assert_eq!(position[0].abs(), 1.0);
        assert_eq!(position[1].abs(), 2.0);
        assert_eq!(position[2].abs(), 0.5);
    }
}

#[test]
fn test_upload_creates_one_buffer_per_stream() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let gpu = GpuGeometry::upload(&mut device, "Chair", &GeometryData::cuboid(1.0, 1.0, 1.0)).unwrap();
    assert_eq!(gpu.index_count, 36);
    assert_eq!(gpu.positions.label(), "Chair.positions");
    assert!(gpu.tex_coords.is_some());
    assert_eq!(device.stats().buffers, 4);
}

#[test]
fn test_upload_of_invalid_geometry_creates_nothing() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let result = GpuGeometry::upload(&mut device, "Broken", &GeometryData::default());
    assert!(result.is_err());
    assert_eq!(device.stats().buffers, 0);
}
