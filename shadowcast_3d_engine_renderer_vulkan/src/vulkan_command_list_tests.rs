use super::*;

#[test]
fn test_uniform_offsets_respect_device_alignment() {
    assert_eq!(align_up(0, 256), 0);
    assert_eq!(align_up(1, 256), 256);
    assert_eq!(align_up(256, 256), 256);
    assert_eq!(align_up(300, 64), 320);
}

#[test]
fn test_unit_alignment_keeps_offsets() {
    assert_eq!(align_up(13, 0), 13);
    assert_eq!(align_up(13, 1), 13);
}

#[test]
fn test_pipeline_key_tracks_unbound_attribute_slots() {
    let key = PipelineKey {
        formats: (Some(vk::Format::R8G8B8A8_UNORM), Some(vk::Format::D16_UNORM)),
        topology: PrimitiveTopology::TriangleList,
        unbound: 0b100,
    };
    assert!(!key.is_unbound(0));
    assert!(!key.is_unbound(1));
    assert!(key.is_unbound(2));
}
