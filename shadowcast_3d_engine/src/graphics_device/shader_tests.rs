use super::*;

#[test]
fn test_slots_follow_declaration_order() {
    let interface = ShaderInterface::new()
        .with_attributes(&[AttributeSemantic::Position, AttributeSemantic::Normal])
        .with_uniforms(&[UniformSemantic::Projection, UniformSemantic::View, UniformSemantic::World])
        .with_textures(&[TextureSemantic::DirShadowMap, TextureSemantic::Albedo]);

    assert_eq!(interface.attribute(AttributeSemantic::Normal), Some(1));
    assert_eq!(interface.uniform(UniformSemantic::World), Some(2));
    assert_eq!(interface.texture(TextureSemantic::Albedo), Some(1));
    assert_eq!(interface.attribute(AttributeSemantic::TexCoord), None);
}

#[test]
fn test_duplicate_declarations_keep_first_slot() {
    let interface = ShaderInterface::new()
        .with_uniforms(&[UniformSemantic::World, UniformSemantic::View])
        .with_uniforms(&[UniformSemantic::World, UniformSemantic::Projection]);

    assert_eq!(interface.uniforms().len(), 3);
    assert_eq!(interface.uniform(UniformSemantic::World), Some(0));
    assert_eq!(interface.uniform(UniformSemantic::Projection), Some(2));
}

#[test]
fn test_glsl_names_cover_every_category() {
    let interface = ShaderInterface::new()
        .with_attributes(&[AttributeSemantic::Position])
        .with_uniforms(&[UniformSemantic::ShadowBias])
        .with_textures(&[TextureSemantic::PointShadowMap]);

    let names: Vec<_> = interface.glsl_names().collect();
    assert_eq!(names, vec!["vPos", "bias", "pointShadowMap"]);
}
