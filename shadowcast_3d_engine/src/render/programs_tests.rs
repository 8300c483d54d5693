use super::*;
use crate::error::ShaderStage;
use crate::graphics_device::{DeviceConfig, RecordingGraphicsDevice};

fn device() -> RecordingGraphicsDevice {
    RecordingGraphicsDevice::new(DeviceConfig::default())
}

#[test]
fn test_builtin_sources_link_every_role() {
    let mut device = device();
    let programs = ProgramSet::create(&mut device, &ShaderSources::builtin()).unwrap();

    for role in ProgramRole::ALL {
        assert_eq!(programs.get(role).name(), role.name());
    }
    assert_eq!(device.stats().programs, 3);
}

#[test]
fn test_shadow_lit_textures_use_distinct_units() {
    let interface = ProgramRole::ShadowLit.interface();
    assert_eq!(interface.texture(TextureSemantic::PointShadowMap), Some(0));
    assert_eq!(interface.texture(TextureSemantic::SpotShadowMap), Some(1));
    assert_eq!(interface.texture(TextureSemantic::DirShadowMap), Some(2));
    assert_eq!(interface.texture(TextureSemantic::Albedo), Some(3));
}

#[test]
fn test_unshadowed_interface_has_no_shadow_inputs() {
    let interface = ProgramRole::Unshadowed.interface();
    assert_eq!(interface.textures(), &[TextureSemantic::Albedo]);
    assert_eq!(interface.uniform(UniformSemantic::ShadowBias), None);
    assert_eq!(interface.uniform(UniformSemantic::DirShadowView), None);
}

#[test]
fn test_empty_fragment_source_reports_compile_error() {
    let mut device = device();
    let mut sources = ShaderSources::builtin();
    sources.get_mut(ProgramRole::ShadowLit).fragment.clear();

    let result = ProgramSet::create(&mut device, &sources);
    match result {
        Err(Error::ShaderCompile { program, stage, .. }) => {
            assert_eq!(program, "shadow-lit");
            assert_eq!(stage, ShaderStage::Fragment);
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("empty fragment shader accepted"),
    }
}

#[test]
fn test_missing_interface_variable_reports_link_error() {
    let mut device = device();
    let mut sources = ShaderSources::builtin();
    let source = sources.get_mut(ProgramRole::ShadowMapGen);
    source.vertex = source.vertex.replace("isDirectional", "directionalFlag");
    source.fragment = source.fragment.replace("isDirectional", "directionalFlag");

    let result = ProgramSet::create(&mut device, &sources);
    match result {
        Err(Error::ShaderLink { program, diagnostic }) => {
            assert_eq!(program, "shadow-map-gen");
            assert!(diagnostic.contains("isDirectional"));
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("program linked without isDirectional"),
    }
}

#[test]
fn test_shading_bindings_resolve_shadow_inputs_only_when_asked() {
    let mut device = device();
    let programs = ProgramSet::create(&mut device, &ShaderSources::builtin()).unwrap();

    let lit = ShadingBindings::resolve(programs.shadow_lit.as_ref(), true).unwrap();
    let shadow = lit.shadow.unwrap();
    assert_eq!((shadow.point_map, shadow.spot_map, shadow.dir_map), (0, 1, 2));
    assert_eq!(lit.albedo, 3);

    let plain = ShadingBindings::resolve(programs.unshadowed.as_ref(), false).unwrap();
    assert!(plain.shadow.is_none());
    assert_eq!(plain.albedo, 0);
}

#[test]
fn test_unshadowed_program_cannot_provide_shadow_bindings() {
    let mut device = device();
    let programs = ProgramSet::create(&mut device, &ShaderSources::builtin()).unwrap();

    let result = ShadingBindings::resolve(programs.unshadowed.as_ref(), true);
    assert!(matches!(result, Err(Error::ShaderLink { .. })));
}

#[test]
fn test_shadow_gen_bindings_follow_interface_order() {
    let mut device = device();
    let programs = ProgramSet::create(&mut device, &ShaderSources::builtin()).unwrap();

    let bindings = ShadowGenBindings::resolve(programs.shadow_map_gen.as_ref()).unwrap();
    assert_eq!(bindings.position, 0);
    assert_eq!(bindings.projection, 0);
    assert_eq!(bindings.directional_pass, 6);
}
