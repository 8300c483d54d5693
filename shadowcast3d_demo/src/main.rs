//! Shadowcast3D demo host
//!
//! Opens a window, feeds keyboard state to a `ShadowScene` and drives one
//! frame per redraw through the Vulkan backend. Per-second frame statistics
//! are logged.
//!
//! Usage: shadowcast3d_demo [SHADOW_MAP_RESOLUTION]
//!
//! Controls:
//! - W/S/A/D: move, Space/Left Shift: up/down, arrows: look
//! - F: wireframe, I: interactive drone, L: spot light on/off

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use shadowcast_3d_engine::shadowcast3d::assets::{AssetManifest, AssetSource, MemoryAssetSource};
use shadowcast_3d_engine::shadowcast3d::config::{parse_shadow_map_resolution, SceneConfig};
use shadowcast_3d_engine::shadowcast3d::frame::{FrameHost, FrameStats, InputCommands, ToggleEvent};
use shadowcast_3d_engine::shadowcast3d::log::LogSeverity;
use shadowcast_3d_engine::shadowcast3d::render::DeviceConfig;
use shadowcast_3d_engine::shadowcast3d::scene::SceneDescription;
use shadowcast_3d_engine::shadowcast3d::{Engine, Error, Result, ShadowScene};
use shadowcast_3d_engine_renderer_vulkan::VulkanGraphicsDevice;

const SOURCE: &str = "shadowcast3d::Demo";

// ============================================================================
// Assets
// ============================================================================

/// Red bricks with light mortar lines
fn bricks_png() -> Vec<u8> {
    const SIZE: u32 = 64;
    let image = image::RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let row = y / 8;
        let offset = if row % 2 == 0 { 0 } else { 8 };
        let mortar = y % 8 == 0 || (x + offset) % 16 == 0;
        if mortar {
            image::Rgba([200, 200, 190, 255])
        } else {
            image::Rgba([150, 50 + (x * 7 + y * 3) as u8 % 20, 40, 255])
        }
    });

    let mut bytes = Cursor::new(Vec::new());
    match image::DynamicImage::ImageRgba8(image).write_to(&mut bytes, image::ImageFormat::Png) {
        Ok(()) => bytes.into_inner(),
        Err(e) => {
            Engine::log(LogSeverity::Warn, SOURCE, format!("Failed to encode bricks texture: {}", e));
            Vec::new()
        }
    }
}

fn demo_assets() -> Arc<dyn AssetSource> {
    let manifest = AssetManifest::default();
    let mut source = MemoryAssetSource::with_builtin_shaders(SceneDescription::procedural());
    if let Some(path) = manifest.texture_path("bricks") {
        source.insert_bytes(path, bricks_png());
    }
    Arc::new(source)
}

// ============================================================================
// Host
// ============================================================================

/// Window-backed frame host: a requested tick becomes a redraw request
#[derive(Default)]
struct WindowHost {
    window: Option<Arc<Window>>,
    subscribed: bool,
    tick_pending: bool,
}

impl FrameHost for WindowHost {
    fn subscribe(&mut self) {
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    fn request_tick(&mut self) {
        self.tick_pending = true;
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn cancel_tick(&mut self) {
        self.tick_pending = false;
    }
}

fn movement_command(key: KeyCode) -> Option<InputCommands> {
    Some(match key {
        KeyCode::KeyW => InputCommands::FORWARD,
        KeyCode::KeyS => InputCommands::BACK,
        KeyCode::KeyA => InputCommands::LEFT,
        KeyCode::KeyD => InputCommands::RIGHT,
        KeyCode::Space => InputCommands::UP,
        KeyCode::ShiftLeft => InputCommands::DOWN,
        KeyCode::ArrowLeft => InputCommands::YAW_LEFT,
        KeyCode::ArrowRight => InputCommands::YAW_RIGHT,
        KeyCode::ArrowUp => InputCommands::PITCH_UP,
        KeyCode::ArrowDown => InputCommands::PITCH_DOWN,
        _ => return None,
    })
}

fn toggle_event(key: KeyCode) -> Option<ToggleEvent> {
    match key {
        KeyCode::KeyF => Some(ToggleEvent::Wireframe),
        KeyCode::KeyI => Some(ToggleEvent::Interactive),
        KeyCode::KeyL => Some(ToggleEvent::SecondaryLight),
        _ => None,
    }
}

// ============================================================================
// Application
// ============================================================================

struct App {
    config: SceneConfig,
    // Dropped before the window its swapchain presents to
    scene: Option<ShadowScene>,
    host: WindowHost,
    input: InputCommands,
    clock: Instant,
    frames: u32,
    totals: FrameStats,
    last_report: f64,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            scene: None,
            host: WindowHost::default(),
            input: InputCommands::empty(),
            clock: Instant::now(),
            frames: 0,
            totals: FrameStats::default(),
            last_report: 0.0,
        }
    }

    fn start_scene(&mut self, width: u32, height: u32) -> Result<()> {
        let window = self.host.window.clone()
            .ok_or_else(|| Error::InitializationFailed("no window to render into".to_string()))?;
        let device = VulkanGraphicsDevice::new(&*window, DeviceConfig {
            surface_width: width.max(1),
            surface_height: height.max(1),
            ..DeviceConfig::default()
        })?;
        let device = Engine::create_graphics_device("main", device)?;

        let mut scene = ShadowScene::new(device, self.config.clone())?;
        scene.load(demo_assets(), &AssetManifest::default())?;
        scene.resize_surface(width, height)?;
        scene.begin(&mut self.host)?;
        self.scene = Some(scene);
        Ok(())
    }

    fn stop_scene(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.end(&mut self.host);
            if let Err(e) = scene.unload() {
                Engine::log(LogSeverity::Warn, SOURCE, format!("Unload failed: {}", e));
            }
        }
        let _ = Engine::destroy_graphics_device("main");
    }

    fn tick(&mut self) -> Result<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        if !self.host.tick_pending {
            return Ok(());
        }
        self.host.tick_pending = false;

        let now_ms = self.clock.elapsed().as_secs_f64() * 1000.0;
        let stats = scene.on_tick(&mut self.host, now_ms)?;
        self.frames += 1;
        self.totals.render_passes += stats.render_passes;
        self.totals.shadow_draws += stats.shadow_draws;
        self.totals.shading_draws += stats.shading_draws;

        if now_ms - self.last_report >= 1000.0 {
            Engine::log(LogSeverity::Info, SOURCE, format!(
                "{} frames: {} passes, {} shadow draws, {} shading draws",
                self.frames, self.totals.render_passes, self.totals.shadow_draws, self.totals.shading_draws
            ));
            self.frames = 0;
            self.totals = FrameStats::default();
            self.last_report = now_ms;
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if let Some(command) = movement_command(key) {
            self.input.set(command, state.is_pressed());
            if self.host.subscribed {
                if let Some(scene) = self.scene.as_mut() {
                    scene.on_input_changed(self.input);
                }
            }
        } else if let Some(toggle) = toggle_event(key) {
            if state.is_pressed() && !repeat && self.host.subscribed {
                if let Some(scene) = self.scene.as_mut() {
                    scene.on_toggle(toggle);
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("Shadowcast3D")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                Engine::log(LogSeverity::Error, SOURCE, format!("Failed to create window: {}", e));
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        self.host.window = Some(window);

        if let Err(e) = self.start_scene(size.width, size.height) {
            Engine::log(LogSeverity::Error, SOURCE, format!("Failed to start scene: {}", e));
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.stop_scene();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(scene) = self.scene.as_mut() {
                    if let Err(e) = scene.resize_surface(size.width, size.height) {
                        Engine::log(LogSeverity::Warn, SOURCE, format!("Resize failed: {}", e));
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.tick() {
                    Engine::log(LogSeverity::Error, SOURCE, format!("Frame failed: {}", e));
                    self.stop_scene();
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.on_key(key, event.state, event.repeat);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // The registered device holds the window surface
        self.stop_scene();
    }
}

fn main() {
    if let Err(e) = Engine::initialize() {
        eprintln!("Engine initialization failed: {}", e);
        return;
    }

    let resolution = std::env::args().nth(1);
    let config = match parse_shadow_map_resolution(resolution.as_deref())
        .and_then(SceneConfig::with_shadow_map_resolution)
    {
        Ok(config) => config,
        Err(e) => {
            Engine::log(LogSeverity::Error, SOURCE, e.to_string());
            return;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            Engine::log(LogSeverity::Error, SOURCE, format!("Failed to create event loop: {}", e));
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        Engine::log(LogSeverity::Error, SOURCE, format!("Event loop error: {}", e));
    }
    Engine::shutdown();
}
