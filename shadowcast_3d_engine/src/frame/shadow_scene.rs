/// The shadow-mapped scene and its frame loop
///
/// `ShadowScene` owns every per-scene structure (nodes, lights, camera,
/// shadow targets, input state) and sequences one frame per host tick:
///
/// 1. swap in textures that finished streaming
/// 2. apply held input to the camera and, in interactive mode, to the drone
/// 3. advance the demo animation and the light anchors
/// 4. recompute the main and per-face view matrices
/// 5. directional shadow pass, then the cube passes
/// 6. main shading pass
///
/// All of it runs on the caller's thread; the host is asked for the next tick
/// only after the frame has been submitted.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Mat4, Vec3};
use crate::assets::{AssetLoader, AssetManifest, AssetSource, TextureStreamer};
use crate::camera::{Camera, ClipRange, Projection};
use crate::config::SceneConfig;
use crate::error::{Error, Result};
use crate::frame::{
    apply_camera_input, apply_demo_animation, interactive_step, FrameHost, FrameStats,
    InputCommands, ToggleEvent,
};
use crate::graphics_device::{GraphicsDevice, PrimitiveTopology};
use crate::light::{LightRig, OmniLight};
use crate::render::{
    fit_presentation_surface, ProgramSet, ShadingInputs, ShadingPass, ShadowMapGenerator,
    ShadowTargets, SurfaceRect,
};
use crate::scene::{
    match_roles, NodeKey, NodeRegistry, RoleMap, SceneRole, TextureSlots,
};

const SOURCE: &str = "shadowcast3d::ShadowScene";

/// Lifecycle of a [`ShadowScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Unloaded,
    /// Resources created, no host subscription
    Loaded,
    /// Subscribed to the host and ticking
    Running,
}

/// Everything created by a successful load
struct LoadedScene {
    nodes: NodeRegistry,
    roles: RoleMap,
    textures: TextureSlots,
    streamer: TextureStreamer,
    lights: LightRig,
    camera: Camera,
    projection: Mat4,
    view: Mat4,
    shadow_targets: Option<ShadowTargets>,
    shadow_generator: ShadowMapGenerator,
    shading: ShadingPass,
    drone: NodeKey,
    point_anchor: NodeKey,
    spot_anchor: NodeKey,
}

pub struct ShadowScene {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    config: SceneConfig,
    state: SceneState,
    loaded: Option<LoadedScene>,
    input: InputCommands,
    wireframe: bool,
    interactive: bool,
    last_timestamp: Option<f64>,
}

fn lock_device(device: &Arc<Mutex<dyn GraphicsDevice>>) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device.lock().map_err(|_| crate::engine_err!(SOURCE, "GraphicsDevice lock poisoned"))
}

fn role_node(roles: &RoleMap, role: SceneRole) -> Result<NodeKey> {
    roles.get(role).ok_or(Error::SceneIntegrity { role })
}

fn projection_matrix(config: &SceneConfig, width: u32, height: u32) -> Mat4 {
    Projection::Perspective {
        fov_y: config.camera.fov_y,
        aspect: width as f32 / height.max(1) as f32,
        clip: ClipRange { near: config.camera.near, far: config.camera.far },
    }.matrix()
}

impl ShadowScene {
    /// Create an unloaded scene rendering through `device`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `config` fails validation.
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>, config: SceneConfig) -> Result<Self> {
        config.validate().map_err(|error| crate::engine_fail!(SOURCE, error))?;
        Ok(Self {
            device,
            config,
            state: SceneState::Unloaded,
            loaded: None,
            input: InputCommands::empty(),
            wireframe: false,
            interactive: false,
            last_timestamp: None,
        })
    }

    // ===== LIFECYCLE =====

    /// Fetch every asset, then create all GPU resources
    ///
    /// Asset fetches and role matching finish before the first GPU object is
    /// created, so a missing file or node leaves the device untouched.
    ///
    /// # Errors
    ///
    /// `ResourceLoad`, `SceneIntegrity`, `ShaderCompile`/`ShaderLink`, or
    /// `RuntimeState` when the scene is already loaded.
    pub fn load(&mut self, source: Arc<dyn AssetSource>, manifest: &AssetManifest) -> Result<()> {
        if self.state != SceneState::Unloaded {
            return Err(crate::engine_fail!(SOURCE, Error::RuntimeState(
                "Scene is already loaded".to_string()
            )));
        }
        crate::engine_info!(SOURCE, "Loading scene '{}'", manifest.scene);

        let assets = AssetLoader::load(source.as_ref(), manifest)?;
        let matched = match_roles(&assets.description).map_err(|error| crate::engine_fail!(SOURCE, error))?;

        let mut guard = lock_device(&self.device)?;
        let device = &mut *guard;

        let programs = ProgramSet::create(device, &assets.shaders)?;
        let shadow_generator = ShadowMapGenerator::new(programs.shadow_map_gen.clone())?;
        let shading = ShadingPass::new(&programs)?;

        let mut nodes = NodeRegistry::new();
        let mut textures = TextureSlots::new(device)?;
        let roles = RoleMap::instantiate(&matched, &mut nodes, &mut textures, device)?;

        let lights = LightRig::new(
            self.config.point_light.as_ref(),
            self.config.spot_light.as_ref(),
            self.config.directional_light.as_ref(),
        )?;
        let point_anchor = role_node(&roles, SceneRole::PointLightAnchor)?;
        let spot_anchor = role_node(&roles, SceneRole::SpotLightAnchor)?;
        let drone = role_node(&roles, SceneRole::Drone)?;
        for (anchor, light) in [(point_anchor, &lights.point), (spot_anchor, &lights.spot)] {
            if let Some(light) = light {
                nodes.set_translation(anchor, light.position());
            }
        }

        let shadow_targets = if self.config.shadows_enabled {
            Some(ShadowTargets::create(device, self.config.shadow_map_resolution, &lights)?)
        } else {
            None
        };

        let camera = Camera::new(self.config.camera.position, self.config.camera.look_at, self.config.camera.up)?;
        let surface = device.presentation_framebuffer();
        let projection = projection_matrix(&self.config, surface.width(), surface.height());
        drop(guard);

        let mut streamer = TextureStreamer::new();
        for (name, path) in &manifest.textures {
            if let Some(key) = textures.key(name) {
                streamer.request(source.clone(), key, path);
            }
        }

        crate::engine_info!(
            SOURCE,
            "Scene loaded: {} nodes, {} texture slot(s), {} omni light(s)",
            nodes.len(), textures.len(), lights.omni_count()
        );

        self.loaded = Some(LoadedScene {
            nodes,
            roles,
            textures,
            streamer,
            lights,
            view: camera.view_matrix(),
            camera,
            projection,
            shadow_targets,
            shadow_generator,
            shading,
            drone,
            point_anchor,
            spot_anchor,
        });
        self.state = SceneState::Loaded;
        Ok(())
    }

    /// Subscribe to the host and schedule the first tick
    pub fn begin(&mut self, host: &mut dyn FrameHost) -> Result<()> {
        if self.state != SceneState::Loaded {
            return Err(crate::engine_fail!(SOURCE, Error::RuntimeState(format!(
                "begin() requires a loaded, stopped scene (state: {:?})",
                self.state
            ))));
        }
        host.subscribe();
        self.last_timestamp = None;
        self.state = SceneState::Running;
        host.request_tick();
        crate::engine_info!(SOURCE, "Scene started");
        Ok(())
    }

    /// Unsubscribe from the host and cancel the pending tick
    ///
    /// Does nothing when the scene is not running.
    pub fn end(&mut self, host: &mut dyn FrameHost) {
        if self.state != SceneState::Running {
            return;
        }
        host.unsubscribe();
        host.cancel_tick();
        self.state = SceneState::Loaded;
        crate::engine_info!(SOURCE, "Scene stopped");
    }

    /// Release every resource created by `load`
    ///
    /// # Errors
    ///
    /// `RuntimeState` while the scene is still running.
    pub fn unload(&mut self) -> Result<()> {
        if self.state == SceneState::Running {
            return Err(crate::engine_fail!(SOURCE, Error::RuntimeState(
                "end() must be called before unload()".to_string()
            )));
        }
        if self.loaded.take().is_some() {
            lock_device(&self.device)?.wait_idle()?;
            crate::engine_info!(SOURCE, "Scene unloaded");
        }
        self.state = SceneState::Unloaded;
        Ok(())
    }

    // ===== HOST CALLBACKS =====

    /// Run one frame for the host tick at `timestamp_ms`, then request the next
    ///
    /// Elapsed time is measured from the previous tick; the first tick after
    /// `begin` advances by zero.
    pub fn on_tick(&mut self, host: &mut dyn FrameHost, timestamp_ms: f64) -> Result<FrameStats> {
        if self.state != SceneState::Running {
            return Err(crate::engine_fail!(SOURCE, Error::RuntimeState(format!(
                "Tick delivered while the scene is {:?}",
                self.state
            ))));
        }
        let dt_ms = match self.last_timestamp {
            Some(previous) => (timestamp_ms - previous).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        let stats = self.advance_frame(dt_ms)?;
        host.request_tick();
        Ok(stats)
    }

    /// Replace the set of held commands
    pub fn on_input_changed(&mut self, input: InputCommands) {
        self.input = input;
    }

    pub fn on_toggle(&mut self, toggle: ToggleEvent) {
        match toggle {
            ToggleEvent::Wireframe => {
                self.wireframe = !self.wireframe;
                crate::engine_debug!(SOURCE, "Wireframe: {}", self.wireframe);
            }
            ToggleEvent::Interactive => {
                self.interactive = !self.interactive;
                crate::engine_debug!(SOURCE, "Interactive mode: {}", self.interactive);
                let Some(loaded) = self.loaded.as_mut() else { return };
                if self.interactive {
                    loaded.nodes.set_rotation(loaded.drone, std::f32::consts::PI, Vec3::Y);
                    loaded.camera.set_position(self.config.interactive_camera_position);
                } else {
                    loaded.nodes.set_rotation(loaded.drone, 0.0, Vec3::Y);
                }
            }
            ToggleEvent::SecondaryLight => {
                let Some(spot) = self.loaded.as_mut().and_then(|loaded| loaded.lights.spot.as_mut()) else {
                    return;
                };
                spot.set_enabled(!spot.is_enabled());
                crate::engine_debug!(SOURCE, "Spot light enabled: {}", spot.is_enabled());
            }
        }
    }

    /// Fit the presentation surface to a resized host window
    ///
    /// Returns the 16:9 rectangle the surface now occupies, `None` when the
    /// window has no area (nothing is changed then).
    pub fn resize_surface(&mut self, window_width: u32, window_height: u32) -> Result<Option<SurfaceRect>> {
        let Some(rect) = fit_presentation_surface(window_width, window_height) else {
            return Ok(None);
        };
        lock_device(&self.device)?.resize(rect.width, rect.height)?;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.projection = projection_matrix(&self.config, rect.width, rect.height);
        }
        Ok(Some(rect))
    }

    // ===== FRAME =====

    /// Advance the scene by `dt_ms` and record one complete frame
    ///
    /// # Errors
    ///
    /// `RuntimeState` before `load`; device errors while recording.
    pub fn advance_frame(&mut self, dt_ms: f32) -> Result<FrameStats> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Err(crate::engine_fail!(SOURCE, Error::RuntimeState(
                "Frame requested before the scene finished loading".to_string()
            )));
        };
        let mut guard = lock_device(&self.device)?;
        let device = &mut *guard;

        for streamed in loaded.streamer.poll() {
            let image = streamed.image;
            let name = loaded.textures.name(streamed.key).unwrap_or_default().to_string();
            match loaded.textures.replace(device, streamed.key, image.width, image.height, image.pixels) {
                Ok(true) => crate::engine_debug!(SOURCE, "Texture '{}' resident", name),
                Ok(false) => {}
                Err(error) => crate::engine_warn!(
                    SOURCE,
                    "Texture '{}' kept its placeholder: {}",
                    name, error
                ),
            }
        }

        apply_camera_input(
            &mut loaded.camera,
            self.input,
            dt_ms,
            self.config.move_speed,
            self.config.rotate_speed,
        );
        if self.interactive {
            loaded.nodes.translate(loaded.drone, interactive_step(self.input, self.config.interactive_step));
        } else {
            apply_demo_animation(&mut loaded.nodes, &loaded.roles, dt_ms, self.config.move_speed);
        }

        animate_light(&mut loaded.nodes, loaded.point_anchor, loaded.lights.point.as_mut(), dt_ms);
        animate_light(&mut loaded.nodes, loaded.spot_anchor, loaded.lights.spot.as_mut(), dt_ms);
        loaded.camera.view_matrix_into(&mut loaded.view);

        let topology = if self.wireframe { PrimitiveTopology::LineList } else { PrimitiveTopology::TriangleList };
        let surface = device.presentation_framebuffer();
        let mut cmd = device.create_command_list()?;
        cmd.begin()?;

        let mut stats = FrameStats::default();
        if let Some(targets) = &loaded.shadow_targets {
            let shadow = loaded.shadow_generator.render(cmd.as_mut(), &loaded.nodes, &loaded.lights, targets, topology)?;
            stats.render_passes += shadow.render_passes;
            stats.shadow_draws = shadow.draws;
        }
        stats.shading_draws = loaded.shading.render(cmd.as_mut(), &surface, &ShadingInputs {
            nodes: &loaded.nodes,
            textures: &loaded.textures,
            lights: &loaded.lights,
            view: &loaded.view,
            projection: &loaded.projection,
            shadows: loaded.shadow_targets.as_ref(),
            topology,
            clear_color: self.config.clear_color,
        })?;
        stats.render_passes += 1;

        cmd.end()?;
        device.submit(cmd.as_ref())?;
        Ok(stats)
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.device
    }

    pub fn input(&self) -> InputCommands {
        self.input
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn nodes(&self) -> Option<&NodeRegistry> {
        self.loaded.as_ref().map(|loaded| &loaded.nodes)
    }

    pub fn roles(&self) -> Option<&RoleMap> {
        self.loaded.as_ref().map(|loaded| &loaded.roles)
    }

    pub fn lights(&self) -> Option<&LightRig> {
        self.loaded.as_ref().map(|loaded| &loaded.lights)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.loaded.as_ref().map(|loaded| &loaded.camera)
    }

    pub fn textures(&self) -> Option<&TextureSlots> {
        self.loaded.as_ref().map(|loaded| &loaded.textures)
    }

    pub fn shadow_targets(&self) -> Option<&ShadowTargets> {
        self.loaded.as_ref().and_then(|loaded| loaded.shadow_targets.as_ref())
    }

    /// Texture streams whose result has not been applied yet
    pub fn pending_textures(&self) -> usize {
        self.loaded.as_ref().map_or(0, |loaded| loaded.streamer.in_flight())
    }
}

/// Oscillate a light's anchor along X and move the light onto it
fn animate_light(nodes: &mut NodeRegistry, anchor: NodeKey, light: Option<&mut OmniLight>, dt_ms: f32) {
    let Some(light) = light else { return };
    if let Some(animation) = light.animation_mut() {
        let x = animation.advance(dt_ms);
        nodes.set_translation_component(anchor, 0, x);
    }
    light.set_position(nodes.translation(anchor));
}

#[cfg(test)]
#[path = "shadow_scene_tests.rs"]
mod tests;
