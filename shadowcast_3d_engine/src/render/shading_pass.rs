/// Main shading pass
///
/// Draws every node into the presentation framebuffer, lit by the point, spot
/// and directional lights. With shadows enabled the shadow-lit program samples
/// the maps written earlier in the frame; otherwise the unshadowed program is
/// used and no shadow target is touched.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;
use crate::graphics_device::{
    ClearValue, CommandList, Framebuffer, PrimitiveTopology, ShaderProgram, UniformValue, Viewport,
};
use crate::light::{LightRig, OmniLight};
use crate::render::{ProgramSet, ShadingBindings, ShadowTargets};
use crate::scene::{NodeRegistry, TextureSlots};

const SOURCE: &str = "shadowcast3d::ShadingPass";

/// Everything the shading pass reads
pub struct ShadingInputs<'a> {
    pub nodes: &'a NodeRegistry,
    pub textures: &'a TextureSlots,
    pub lights: &'a LightRig,
    pub view: &'a Mat4,
    pub projection: &'a Mat4,
    /// `None` selects the unshadowed program
    pub shadows: Option<&'a ShadowTargets>,
    pub topology: PrimitiveTopology,
    pub clear_color: [f32; 4],
}

struct BoundProgram {
    program: Arc<dyn ShaderProgram>,
    bindings: ShadingBindings,
}

pub struct ShadingPass {
    shadow_lit: BoundProgram,
    unshadowed: BoundProgram,
}

impl ShadingPass {
    pub fn new(programs: &ProgramSet) -> Result<Self> {
        Ok(Self {
            shadow_lit: BoundProgram {
                program: programs.shadow_lit.clone(),
                bindings: ShadingBindings::resolve(programs.shadow_lit.as_ref(), true)?,
            },
            unshadowed: BoundProgram {
                program: programs.unshadowed.clone(),
                bindings: ShadingBindings::resolve(programs.unshadowed.as_ref(), false)?,
            },
        })
    }

    /// Record the pass into `cmd`, returning the number of draws
    pub fn render(
        &self,
        cmd: &mut dyn CommandList,
        framebuffer: &Arc<dyn Framebuffer>,
        inputs: &ShadingInputs<'_>,
    ) -> Result<u32> {
        let bound = if inputs.shadows.is_some() { &self.shadow_lit } else { &self.unshadowed };
        let b = &bound.bindings;
        crate::engine_trace!(
            SOURCE,
            "Shading pass with '{}' ({} nodes)",
            bound.program.name(), inputs.nodes.len()
        );

        cmd.begin_render_pass(framebuffer, &[
            ClearValue::Color(inputs.clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ])?;
        cmd.set_viewport(Viewport::full(framebuffer.width(), framebuffer.height()))?;
        cmd.use_program(&bound.program)?;
        cmd.set_uniform(b.projection, UniformValue::Mat4(*inputs.projection))?;
        cmd.set_uniform(b.view, UniformValue::Mat4(*inputs.view))?;

        Self::set_light_uniforms(cmd, b, inputs.lights)?;
        if let (Some(slots), Some(targets)) = (b.shadow, inputs.shadows) {
            cmd.set_uniform(slots.bias, UniformValue::Float(targets.bias()))?;
            if let (Some(light), Some(target)) = (&inputs.lights.directional, targets.directional()) {
                cmd.set_uniform(slots.dir_view, UniformValue::Mat4(*light.view_matrix()))?;
                cmd.set_uniform(slots.dir_projection, UniformValue::Mat4(*light.projection_matrix()))?;
                cmd.bind_texture(slots.dir_map, target.texture())?;
            }
            let omni = [
                (&inputs.lights.point, slots.point_map, slots.point_clip_near_far),
                (&inputs.lights.spot, slots.spot_map, slots.spot_clip_near_far),
            ];
            for (light, map_slot, clip_slot) in omni {
                let Some(light) = light else { continue };
                if let Some(cube) = targets.cube(light.kind()) {
                    cmd.set_uniform(clip_slot, UniformValue::Vec2(light.frustum().clip_near_far().into()))?;
                    cmd.bind_texture(map_slot, cube.texture())?;
                }
            }
        }

        let mut draws = 0;
        for (_, node) in inputs.nodes.iter() {
            let geometry = node.geometry();
            cmd.set_uniform(b.world, UniformValue::Mat4(*node.world()))?;

            match (node.texture(), &geometry.tex_coords) {
                (Some(key), Some(tex_coords)) => {
                    cmd.set_uniform(b.mesh_color, UniformValue::Vec4(Vec4::ONE))?;
                    cmd.bind_texture(b.albedo, inputs.textures.texture(key))?;
                    cmd.bind_vertex_buffer(b.tex_coord, tex_coords)?;
                }
                _ => {
                    cmd.set_uniform(b.mesh_color, UniformValue::Vec4(node.color()))?;
                    cmd.bind_texture(b.albedo, inputs.textures.white())?;
                }
            }

            cmd.bind_vertex_buffer(b.position, &geometry.positions)?;
            cmd.bind_vertex_buffer(b.normal, &geometry.normals)?;
            cmd.bind_index_buffer(&geometry.indices, geometry.index_type)?;
            cmd.draw_indexed(inputs.topology, geometry.index_count, 0)?;
            draws += 1;
        }

        cmd.end_render_pass()?;
        Ok(draws)
    }

    fn set_light_uniforms(cmd: &mut dyn CommandList, b: &ShadingBindings, lights: &LightRig) -> Result<()> {
        // Absent lights contribute nothing.
        let omni = |light: &Option<OmniLight>| match light {
            Some(light) => (light.position(), light.color(), light.effective_intensity()),
            None => (Vec3::ZERO, Vec3::ZERO, 0.0),
        };

        let (position, color, intensity) = omni(&lights.point);
        cmd.set_uniform(b.point_position, UniformValue::Vec3(position))?;
        cmd.set_uniform(b.point_color, UniformValue::Vec3(color))?;
        cmd.set_uniform(b.point_intensity, UniformValue::Float(intensity))?;

        let (position, color, intensity) = omni(&lights.spot);
        let cone = lights.spot.as_ref().and_then(OmniLight::cone);
        cmd.set_uniform(b.spot_position, UniformValue::Vec3(position))?;
        cmd.set_uniform(b.spot_color, UniformValue::Vec3(color))?;
        cmd.set_uniform(b.spot_intensity, UniformValue::Float(intensity))?;
        cmd.set_uniform(b.spot_direction, UniformValue::Vec3(cone.map_or(Vec3::ZERO, |c| c.direction)))?;
        cmd.set_uniform(b.spot_cutoff, UniformValue::Float(cone.map_or(std::f32::consts::TAU, |c| c.cutoff)))?;

        let (direction, color, intensity) = match &lights.directional {
            Some(light) => (light.direction(), light.color(), light.intensity()),
            None => (Vec3::Y, Vec3::ZERO, 0.0),
        };
        cmd.set_uniform(b.dir_direction, UniformValue::Vec3(direction))?;
        cmd.set_uniform(b.dir_color, UniformValue::Vec3(color))?;
        cmd.set_uniform(b.dir_intensity, UniformValue::Float(intensity))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "shading_pass_tests.rs"]
mod tests;
