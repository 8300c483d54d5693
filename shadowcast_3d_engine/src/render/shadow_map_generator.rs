/// Shadow map generation
///
/// Renders light distance from every light into its shadow target, strictly
/// one target at a time: the directional map first, then the six faces of each
/// enabled point/spot light in +X, -X, +Y, -Y, +Z, -Z order. Every node is
/// drawn with its position stream only.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::error::Result;
use crate::graphics_device::{
    ClearValue, CommandList, Framebuffer, PrimitiveTopology, ShaderProgram, UniformValue, Viewport,
};
use crate::light::{CubeFace, DirectionalLight, LightRig, OmniLight};
use crate::render::{ShadowGenBindings, ShadowTargets};
use crate::scene::NodeRegistry;

const SOURCE: &str = "shadowcast3d::ShadowMapGenerator";

const SHADOW_CLEAR: [ClearValue; 2] = [
    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
    ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
];

/// Work recorded by one shadow pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowPassStats {
    pub render_passes: u32,
    pub draws: u32,
}

impl std::ops::AddAssign for ShadowPassStats {
    fn add_assign(&mut self, other: Self) {
        self.render_passes += other.render_passes;
        self.draws += other.draws;
    }
}

/// Per-target uniforms of one shadow render pass
struct LightSpace<'a> {
    projection: &'a Mat4,
    view: &'a Mat4,
    position: Vec3,
    direction: Vec3,
    clip_near_far: [f32; 2],
    directional: bool,
}

pub struct ShadowMapGenerator {
    program: Arc<dyn ShaderProgram>,
    bindings: ShadowGenBindings,
}

impl ShadowMapGenerator {
    pub fn new(program: Arc<dyn ShaderProgram>) -> Result<Self> {
        let bindings = ShadowGenBindings::resolve(program.as_ref())?;
        Ok(Self { program, bindings })
    }

    pub fn program(&self) -> &Arc<dyn ShaderProgram> {
        &self.program
    }

    /// Directional pass followed by every enabled omnidirectional light
    pub fn render(
        &self,
        cmd: &mut dyn CommandList,
        nodes: &NodeRegistry,
        lights: &LightRig,
        targets: &ShadowTargets,
        topology: PrimitiveTopology,
    ) -> Result<ShadowPassStats> {
        let mut stats = ShadowPassStats::default();

        if let Some(light) = &lights.directional {
            stats += self.render_directional(cmd, nodes, light, targets, topology)?;
        }
        for light in lights.omni_lights() {
            stats += self.render_omnidirectional(cmd, nodes, light, targets, topology)?;
        }
        Ok(stats)
    }

    /// Render the directional light's orthographic map
    ///
    /// Skipped when the scene has no directional target.
    pub fn render_directional(
        &self,
        cmd: &mut dyn CommandList,
        nodes: &NodeRegistry,
        light: &DirectionalLight,
        targets: &ShadowTargets,
        topology: PrimitiveTopology,
    ) -> Result<ShadowPassStats> {
        let Some(target) = targets.directional() else {
            return Ok(ShadowPassStats::default());
        };
        crate::engine_trace!(SOURCE, "Directional shadow pass ({} nodes)", nodes.len());

        let space = LightSpace {
            projection: light.projection_matrix(),
            view: light.view_matrix(),
            position: Vec3::ZERO,
            direction: light.direction(),
            clip_near_far: light.clip_near_far(),
            directional: true,
        };
        let draws = self.render_target(
            cmd,
            nodes,
            target.framebuffer(),
            targets.resolution(),
            &space,
            topology,
        )?;
        Ok(ShadowPassStats { render_passes: 1, draws })
    }

    /// Render the six cube faces of one point/spot light
    ///
    /// Disabled lights and lights without a cube target are skipped.
    pub fn render_omnidirectional(
        &self,
        cmd: &mut dyn CommandList,
        nodes: &NodeRegistry,
        light: &OmniLight,
        targets: &ShadowTargets,
        topology: PrimitiveTopology,
    ) -> Result<ShadowPassStats> {
        if !light.is_enabled() {
            crate::engine_trace!(SOURCE, "{:?} light disabled, cube pass skipped", light.kind());
            return Ok(ShadowPassStats::default());
        }
        let Some(cube) = targets.cube(light.kind()) else {
            return Ok(ShadowPassStats::default());
        };
        crate::engine_trace!(
            SOURCE,
            "{:?} cube shadow pass at {:?} ({} nodes)",
            light.kind(), light.position(), nodes.len()
        );

        let frustum = light.frustum();
        let mut stats = ShadowPassStats::default();
        for face in CubeFace::ALL {
            let space = LightSpace {
                projection: frustum.projection_matrix(),
                view: frustum.view(face),
                position: light.position(),
                direction: face.direction(),
                clip_near_far: frustum.clip_near_far(),
                directional: false,
            };
            stats.draws += self.render_target(
                cmd,
                nodes,
                cube.face(face),
                targets.resolution(),
                &space,
                topology,
            )?;
            stats.render_passes += 1;
        }
        Ok(stats)
    }

    fn render_target(
        &self,
        cmd: &mut dyn CommandList,
        nodes: &NodeRegistry,
        framebuffer: &Arc<dyn Framebuffer>,
        resolution: u32,
        space: &LightSpace<'_>,
        topology: PrimitiveTopology,
    ) -> Result<u32> {
        let b = &self.bindings;

        cmd.begin_render_pass(framebuffer, &SHADOW_CLEAR)?;
        cmd.set_viewport(Viewport::full(resolution, resolution))?;
        cmd.use_program(&self.program)?;
        cmd.set_uniform(b.projection, UniformValue::Mat4(*space.projection))?;
        cmd.set_uniform(b.view, UniformValue::Mat4(*space.view))?;
        cmd.set_uniform(b.light_position, UniformValue::Vec3(space.position))?;
        cmd.set_uniform(b.light_direction, UniformValue::Vec3(space.direction))?;
        cmd.set_uniform(b.clip_near_far, UniformValue::Vec2(space.clip_near_far.into()))?;
        cmd.set_uniform(b.directional_pass, UniformValue::Float(if space.directional { 1.0 } else { 0.0 }))?;

        let mut draws = 0;
        for (_, node) in nodes.iter() {
            let geometry = node.geometry();
            cmd.set_uniform(b.world, UniformValue::Mat4(*node.world()))?;
            cmd.bind_vertex_buffer(b.position, &geometry.positions)?;
            cmd.bind_index_buffer(&geometry.indices, geometry.index_type)?;
            cmd.draw_indexed(topology, geometry.index_count, 0)?;
            draws += 1;
        }

        cmd.end_render_pass()?;
        Ok(draws)
    }
}

#[cfg(test)]
#[path = "shadow_map_generator_tests.rs"]
mod tests;
