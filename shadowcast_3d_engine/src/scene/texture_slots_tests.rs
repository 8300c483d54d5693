use super::*;
use crate::graphics_device::{DeviceConfig, RecordingGraphicsDevice};

#[test]
fn test_reserved_slot_holds_one_texel_placeholder() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let mut slots = TextureSlots::new(&mut device).unwrap();
    let key = slots.reserve(&mut device, "bricks").unwrap();

    let info = slots.texture(key).info();
    assert_eq!((info.width, info.height), (1, 1));
    assert_eq!(info.label, "bricks.placeholder");
    assert!(!slots.is_resident(key));
}

#[test]
fn test_reserve_same_name_returns_same_key() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let mut slots = TextureSlots::new(&mut device).unwrap();
    let a = slots.reserve(&mut device, "bricks").unwrap();
    let b = slots.reserve(&mut device, "bricks").unwrap();
    assert_eq!(a, b);
    assert_eq!(slots.len(), 1);
    assert_eq!(slots.key("bricks"), Some(a));
}

#[test]
fn test_replace_swaps_texture_and_marks_resident() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let mut slots = TextureSlots::new(&mut device).unwrap();
    let key = slots.reserve(&mut device, "bricks").unwrap();

    let swapped = slots.replace(&mut device, key, 2, 2, vec![128; 16]).unwrap();

    assert!(swapped);
    assert!(slots.is_resident(key));
    assert_eq!(slots.texture(key).info().width, 2);
    assert_eq!(slots.texture(key).info().label, "bricks");
}

#[test]
fn test_replace_with_bad_payload_keeps_placeholder() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let mut slots = TextureSlots::new(&mut device).unwrap();
    let key = slots.reserve(&mut device, "bricks").unwrap();

    assert!(slots.replace(&mut device, key, 2, 2, vec![0; 3]).is_err());
    assert!(!slots.is_resident(key));
    assert_eq!(slots.texture(key).info().width, 1);
}

#[test]
fn test_white_texture_is_opaque_single_texel() {
    let mut device = RecordingGraphicsDevice::new(DeviceConfig::default());
    let slots = TextureSlots::new(&mut device).unwrap();
    assert_eq!(slots.white().info().label, "white");
    assert!(slots.is_empty());
}
