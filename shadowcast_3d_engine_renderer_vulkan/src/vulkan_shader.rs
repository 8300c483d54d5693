/// Shader programs: GLSL → SPIR-V compilation, interface reflection and
/// per-program uniform storage
///
/// Both stages are parsed and validated by naga, then written out as SPIR-V.
/// Reflection walks the naga IR to find where every name of the declared
/// `ShaderInterface` lives: uniforms are members of a uniform block, textures
/// are separate images each paired with a `<name>Sampler` sampler, and
/// attributes are vertex entry point inputs.

use std::sync::{Arc, Mutex, MutexGuard};
use ash::vk;
use rustc_hash::FxHashMap;
use shadowcast_3d_engine::shadowcast3d::{Error, Result, ShaderStage};
use shadowcast_3d_engine::shadowcast3d::render::{
    ShaderInterface, ShaderProgram as RendererShaderProgram, ShaderProgramDesc, UniformValue,
};
use shadowcast_3d_engine::{engine_debug, engine_err, engine_fail};

use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::{create_pipeline, PipelineKey};
use crate::vulkan_render_pass::RenderPass;
use crate::SOURCE;

// ============================================================================
// Compilation
// ============================================================================

/// One compiled stage: the validated IR plus its SPIR-V words
pub(crate) struct CompiledStage {
    pub(crate) module: naga::Module,
    pub(crate) spirv: Vec<u32>,
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parse, validate and translate one GLSL 450 stage
///
/// # Errors
///
/// `Error::ShaderCompile` carrying the naga diagnostic.
pub(crate) fn compile_stage(program: &str, stage: ShaderStage, source: &str) -> Result<CompiledStage> {
    let compile_error = |diagnostic: String| engine_fail!(SOURCE, Error::ShaderCompile {
        program: program.to_string(),
        stage,
        diagnostic,
    });

    let shader_stage = naga_stage(stage);
    let options = naga::front::glsl::Options::from(shader_stage);
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend.parse(&options, source)
        .map_err(|errors| compile_error(format!("GLSL parse error:\n{errors}")))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    let info = validator.validate(&module)
        .map_err(|e| compile_error(format!("Validation error: {e}")))?;

    // Default writer flags would flip Y; viewports handle orientation instead
    let options = naga::back::spv::Options {
        lang_version: (1, 3),
        flags: naga::back::spv::WriterFlags::empty(),
        capabilities: None,
        bounds_check_policies: naga::proc::BoundsCheckPolicies::default(),
        binding_map: Default::default(),
        debug_info: None,
        zero_initialize_workgroup_memory: naga::back::spv::ZeroInitializeWorkgroupMemoryMode::None,
    };
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage,
        entry_point: "main".to_string(),
    };
    let spirv = naga::back::spv::write_vec(&module, &info, &options, Some(&pipeline_options))
        .map_err(|e| compile_error(format!("SPIR-V generation error: {e}")))?;

    Ok(CompiledStage { module, spirv })
}

// ============================================================================
// Reflection
// ============================================================================

/// Type of a uniform member, as declared in GLSL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    pub(crate) fn of(value: &UniformValue) -> Self {
        match value {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{ScalarKind, TypeInner, VectorSize};

        let is_f32 = |scalar: &naga::Scalar| scalar.kind == ScalarKind::Float && scalar.width == 4;
        match inner {
            TypeInner::Scalar(scalar) if is_f32(scalar) => Some(UniformKind::Float),
            TypeInner::Vector { size, scalar } if is_f32(scalar) => Some(match size {
                VectorSize::Bi => UniformKind::Vec2,
                VectorSize::Tri => UniformKind::Vec3,
                VectorSize::Quad => UniformKind::Vec4,
            }),
            TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar }
                if is_f32(scalar) => Some(UniformKind::Mat4),
            _ => None,
        }
    }
}

/// One uniform block of the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UniformBlockLayout {
    pub binding: u32,
    pub size: u32,
    pub stages: vk::ShaderStageFlags,
}

/// Where a uniform slot lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UniformLocation {
    pub block: usize,
    pub offset: u32,
    pub kind: UniformKind,
}

/// Image and sampler bindings behind a texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextureBinding {
    pub image: u32,
    pub sampler: u32,
    pub cube: bool,
    pub stages: vk::ShaderStageFlags,
}

/// Vertex input behind an attribute slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VertexInput {
    pub location: u32,
    pub format: vk::Format,
    pub stride: u32,
}

/// Reflected layout of a linked program, indexed by interface slot
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProgramLayout {
    pub blocks: Vec<UniformBlockLayout>,
    pub uniforms: Vec<UniformLocation>,
    pub textures: Vec<TextureBinding>,
    pub attributes: Vec<VertexInput>,
}

impl ProgramLayout {
    pub(crate) fn descriptor_bindings(&self) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        let mut bindings = Vec::with_capacity(self.blocks.len() + self.textures.len() * 2);
        for block in &self.blocks {
            bindings.push(vk::DescriptorSetLayoutBinding::default()
                .binding(block.binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(block.stages));
        }
        for texture in &self.textures {
            bindings.push(vk::DescriptorSetLayoutBinding::default()
                .binding(texture.image)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .descriptor_count(1)
                .stage_flags(texture.stages));
            bindings.push(vk::DescriptorSetLayoutBinding::default()
                .binding(texture.sampler)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .descriptor_count(1)
                .stage_flags(texture.stages));
        }
        bindings
    }
}

struct ReflectedMember {
    block: usize,
    offset: u32,
    kind: Option<UniformKind>,
}

struct ReflectedImage {
    binding: u32,
    cube: bool,
    stages: vk::ShaderStageFlags,
}

/// Names and bindings gathered from both stages
#[derive(Default)]
struct Declarations {
    blocks: Vec<UniformBlockLayout>,
    members: FxHashMap<String, ReflectedMember>,
    images: FxHashMap<String, ReflectedImage>,
    samplers: FxHashMap<String, u32>,
}

impl Declarations {
    fn collect(&mut self, link_error: &dyn Fn(String) -> Error, module: &naga::Module, stages: vk::ShaderStageFlags) -> Result<()> {
        use naga::{AddressSpace, ImageDimension, TypeInner};

        for (_, variable) in module.global_variables.iter() {
            let Some(binding) = variable.binding.as_ref() else {
                continue;
            };
            if binding.group != 0 {
                return Err(link_error(format!(
                    "'{}' uses descriptor set {}; only set 0 is bound",
                    variable.name.as_deref().unwrap_or("<unnamed>"), binding.group
                )));
            }

            match (&variable.space, &module.types[variable.ty].inner) {
                (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                    let block = match self.blocks.iter().position(|b| b.binding == binding.binding) {
                        Some(index) => index,
                        None => {
                            self.blocks.push(UniformBlockLayout {
                                binding: binding.binding,
                                size: 0,
                                stages: vk::ShaderStageFlags::empty(),
                            });
                            self.blocks.len() - 1
                        }
                    };
                    self.blocks[block].size = self.blocks[block].size.max(*span);
                    self.blocks[block].stages |= stages;

                    for member in members {
                        if let Some(name) = &member.name {
                            self.members.entry(name.clone()).or_insert(ReflectedMember {
                                block,
                                offset: member.offset,
                                kind: UniformKind::from_naga(&module.types[member.ty].inner),
                            });
                        }
                    }
                }
                (AddressSpace::Handle, TypeInner::Image { dim, arrayed: false, .. }) => {
                    if let Some(name) = &variable.name {
                        let image = self.images.entry(name.clone()).or_insert(ReflectedImage {
                            binding: binding.binding,
                            cube: *dim == ImageDimension::Cube,
                            stages: vk::ShaderStageFlags::empty(),
                        });
                        image.stages |= stages;
                    }
                }
                (AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => {
                    if let Some(name) = &variable.name {
                        self.samplers.entry(name.clone()).or_insert(binding.binding);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn vertex_format(inner: &naga::TypeInner) -> Option<(vk::Format, u32)> {
    match UniformKind::from_naga(inner)? {
        UniformKind::Float => Some((vk::Format::R32_SFLOAT, 4)),
        UniformKind::Vec2 => Some((vk::Format::R32G32_SFLOAT, 8)),
        UniformKind::Vec3 => Some((vk::Format::R32G32B32_SFLOAT, 12)),
        UniformKind::Vec4 => Some((vk::Format::R32G32B32A32_SFLOAT, 16)),
        UniformKind::Mat4 => None,
    }
}

/// Resolve every name of `interface` against the compiled stages
///
/// # Errors
///
/// `Error::ShaderLink` naming the first interface entry the sources do not
/// declare, or declare with an unusable type.
pub(crate) fn reflect_program(
    program: &str,
    interface: &ShaderInterface,
    vertex: &naga::Module,
    fragment: &naga::Module,
) -> Result<ProgramLayout> {
    let link_error = |diagnostic: String| engine_fail!(SOURCE, Error::ShaderLink {
        program: program.to_string(),
        diagnostic,
    });

    let mut declarations = Declarations::default();
    declarations.collect(&link_error, vertex, vk::ShaderStageFlags::VERTEX)?;
    declarations.collect(&link_error, fragment, vk::ShaderStageFlags::FRAGMENT)?;

    let mut layout = ProgramLayout {
        blocks: declarations.blocks.clone(),
        ..Default::default()
    };

    for semantic in interface.uniforms() {
        let name = semantic.glsl_name();
        let member = declarations.members.get(name)
            .ok_or_else(|| link_error(format!("uniform '{}' is not declared in a uniform block", name)))?;
        let kind = member.kind
            .ok_or_else(|| link_error(format!("uniform '{}' has an unsupported type", name)))?;
        layout.uniforms.push(UniformLocation { block: member.block, offset: member.offset, kind });
    }

    for semantic in interface.textures() {
        let name = semantic.glsl_name();
        let image = declarations.images.get(name)
            .ok_or_else(|| link_error(format!("texture '{}' is not declared", name)))?;
        let sampler_name = format!("{}Sampler", name);
        let sampler = declarations.samplers.get(&sampler_name)
            .ok_or_else(|| link_error(format!("sampler '{}' is not declared", sampler_name)))?;
        layout.textures.push(TextureBinding {
            image: image.binding,
            sampler: *sampler,
            cube: image.cube,
            stages: image.stages,
        });
    }

    let entry_point = vertex.entry_points.iter()
        .find(|entry| entry.stage == naga::ShaderStage::Vertex)
        .ok_or_else(|| link_error("vertex stage has no entry point".to_string()))?;
    let inputs: Vec<(Option<&str>, u32, &naga::TypeInner)> = entry_point.function.arguments.iter()
        .filter_map(|argument| match argument.binding {
            Some(naga::Binding::Location { location, .. }) => Some((
                argument.name.as_deref(),
                location,
                &vertex.types[argument.ty].inner,
            )),
            _ => None,
        })
        .collect();
    let named_inputs = inputs.iter().any(|(name, _, _)| name.is_some());

    for (slot, semantic) in interface.attributes().iter().enumerate() {
        let name = semantic.glsl_name();
        // Unnamed inputs are matched by location, which follows slot order
        let input = if named_inputs {
            inputs.iter().find(|(input_name, _, _)| *input_name == Some(name))
        } else {
            inputs.iter().find(|(_, location, _)| *location == slot as u32)
        };
        let (_, location, inner) = input
            .ok_or_else(|| link_error(format!("attribute '{}' is not declared", name)))?;
        let (format, stride) = vertex_format(inner)
            .ok_or_else(|| link_error(format!("attribute '{}' has an unsupported type", name)))?;
        layout.attributes.push(VertexInput { location: *location, format, stride });
    }

    Ok(layout)
}

/// Write `value` into a uniform block at `location`
pub(crate) fn write_uniform(block: &mut [u8], location: &UniformLocation, value: &UniformValue) -> Result<()> {
    let kind = UniformKind::of(value);
    if kind != location.kind {
        return Err(engine_err!(SOURCE,
            "Uniform type mismatch: declared {:?}, got {:?}", location.kind, kind));
    }

    let offset = location.offset as usize;
    let mut write = |bytes: &[u8]| -> Result<()> {
        let target = block.get_mut(offset..offset + bytes.len())
            .ok_or_else(|| engine_err!(SOURCE,
                "Uniform at offset {} ({} bytes) overflows its block", offset, bytes.len()))?;
        target.copy_from_slice(bytes);
        Ok(())
    };

    match value {
        UniformValue::Float(v) => write(bytemuck::bytes_of(v)),
        UniformValue::Vec2(v) => write(bytemuck::cast_slice(&v.to_array())),
        UniformValue::Vec3(v) => write(bytemuck::cast_slice(&v.to_array())),
        UniformValue::Vec4(v) => write(bytemuck::cast_slice(&v.to_array())),
        UniformValue::Mat4(m) => write(bytemuck::cast_slice(&m.to_cols_array())),
    }
}

// ============================================================================
// Program
// ============================================================================

/// Vulkan implementation of the engine ShaderProgram trait
///
/// Uniform values are program state: they persist across draws and frames
/// until overwritten, and each draw snapshots the current blocks.
pub struct ShaderProgram {
    ctx: Arc<GpuContext>,
    name: String,
    interface: ShaderInterface,
    pub(crate) layout: ProgramLayout,
    pub(crate) vertex_module: vk::ShaderModule,
    pub(crate) fragment_module: vk::ShaderModule,
    pub(crate) descriptor_set_layout: vk::DescriptorSetLayout,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    uniform_blocks: Mutex<Vec<Vec<u8>>>,
    pipelines: Mutex<FxHashMap<PipelineKey, vk::Pipeline>>,
}

impl ShaderProgram {
    pub(crate) fn new(ctx: &Arc<GpuContext>, desc: &ShaderProgramDesc) -> Result<Self> {
        let vertex = compile_stage(&desc.name, ShaderStage::Vertex, &desc.vertex_source)?;
        let fragment = compile_stage(&desc.name, ShaderStage::Fragment, &desc.fragment_source)?;
        let layout = reflect_program(&desc.name, &desc.interface, &vertex.module, &fragment.module)?;

        let uniform_blocks = layout.blocks.iter()
            .map(|block| vec![0u8; block.size as usize])
            .collect();

        // Handles start null; Drop skips nothing since destroying null is a no-op
        let mut program = Self {
            ctx: Arc::clone(ctx),
            name: desc.name.clone(),
            interface: desc.interface.clone(),
            layout,
            vertex_module: vk::ShaderModule::null(),
            fragment_module: vk::ShaderModule::null(),
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            uniform_blocks: Mutex::new(uniform_blocks),
            pipelines: Mutex::new(FxHashMap::default()),
        };

        unsafe {
            program.vertex_module = program.create_module(&vertex.spirv)?;
            program.fragment_module = program.create_module(&fragment.spirv)?;

            let bindings = program.layout.descriptor_bindings();
            let set_layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            program.descriptor_set_layout = ctx.device.create_descriptor_set_layout(&set_layout_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor set layout for '{}': {:?}", desc.name, e))?;

            let set_layouts = [program.descriptor_set_layout];
            let pipeline_layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            program.pipeline_layout = ctx.device.create_pipeline_layout(&pipeline_layout_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create pipeline layout for '{}': {:?}", desc.name, e))?;
        }

        engine_debug!(SOURCE,
            "Program '{}' linked: {} uniform blocks, {} textures, {} attributes",
            program.name, program.layout.blocks.len(), program.layout.textures.len(),
            program.layout.attributes.len());
        Ok(program)
    }

    unsafe fn create_module(&self, spirv: &[u32]) -> Result<vk::ShaderModule> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(spirv);
        self.ctx.device.create_shader_module(&create_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create shader module for '{}': {:?}", self.name, e))
    }

    pub(crate) fn set_uniform(&self, slot: u32, value: &UniformValue) -> Result<()> {
        let location = self.layout.uniforms.get(slot as usize)
            .ok_or_else(|| engine_err!(SOURCE, "Program '{}' has no uniform slot {}", self.name, slot))?;
        let mut blocks = self.lock_uniforms()?;
        write_uniform(&mut blocks[location.block], location, value)
    }

    pub(crate) fn lock_uniforms(&self) -> Result<MutexGuard<'_, Vec<Vec<u8>>>> {
        self.uniform_blocks.lock()
            .map_err(|_| engine_err!(SOURCE, "Uniform storage of '{}' poisoned", self.name))
    }

    /// Pipeline for `render_pass`, `topology` and the set of unbound attributes
    pub(crate) fn pipeline(&self, render_pass: &RenderPass, key: PipelineKey) -> Result<vk::Pipeline> {
        let mut pipelines = self.pipelines.lock()
            .map_err(|_| engine_err!(SOURCE, "Pipeline cache of '{}' poisoned", self.name))?;
        if let Some(pipeline) = pipelines.get(&key) {
            return Ok(*pipeline);
        }
        let pipeline = create_pipeline(&self.ctx, self, render_pass, &key)?;
        pipelines.insert(key, pipeline);
        Ok(pipeline)
    }

    pub(crate) fn downcast(program: &dyn RendererShaderProgram) -> &ShaderProgram {
        unsafe { &*(program as *const dyn RendererShaderProgram as *const ShaderProgram) }
    }
}

impl RendererShaderProgram for ShaderProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn interface(&self) -> &ShaderInterface {
        &self.interface
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            if let Ok(pipelines) = self.pipelines.get_mut() {
                for (_, pipeline) in pipelines.drain() {
                    self.ctx.device.destroy_pipeline(pipeline, None);
                }
            }
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            self.ctx.device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
            self.ctx.device.destroy_shader_module(self.vertex_module, None);
            self.ctx.device.destroy_shader_module(self.fragment_module, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
