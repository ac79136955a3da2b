use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use helicity_common::FillMode;
use helicity_input::{Action, Control, ControlEvent, Controls, Key};
use helicity_kernel::config::MAX_BOX_SLOTS;
use helicity_kernel::{Tuning, World, WorldEvent};
use helicity_render::{CameraMode, DrawList, FixedView, FrameDriver, ViewState};
use helicity_render_wgpu::WgpuRenderer;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::window::{Window, WindowId};

const RECENT_EVENTS: usize = 8;
/// Longest frame step fed to the simulation after a stall.
const MAX_FRAME_DT: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "helicity-desktop", about = "Fly a helicopter around a small city")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with simulation tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of box slots
    #[arg(long)]
    max_boxes: Option<usize>,
}

/// Translate a winit logical key into a bound key.
fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Named(NamedKey::ArrowUp) => Some(Key::ArrowUp),
        WinitKey::Named(NamedKey::ArrowDown) => Some(Key::ArrowDown),
        WinitKey::Named(NamedKey::ArrowLeft) => Some(Key::ArrowLeft),
        WinitKey::Named(NamedKey::Space) => Some(Key::Space),
        WinitKey::Named(NamedKey::Enter) => Some(Key::Enter),
        WinitKey::Character(s) => Key::from_name(s.as_str()),
        _ => None,
    }
}

/// Simulation, view and panel state.
struct AppState {
    world: World,
    view: ViewState,
    controls: Controls,
    driver: FrameDriver,
    draws: DrawList,
    last_frame: Instant,
    /// Panel events, applied after the UI pass.
    pending: Vec<ControlEvent>,
    gamma_text: String,
    theta_text: String,
    max_boxes_text: String,
    recent: VecDeque<String>,
}

impl AppState {
    fn new(tuning: Tuning) -> Self {
        let world = World::new(tuning);
        let driver = FrameDriver::new(&world);
        let mut draws = DrawList::new();
        driver.init_primitives(&mut draws);
        let view = ViewState::default();
        Self {
            gamma_text: format!("{:.0}", view.camera.gamma_deg()),
            theta_text: format!("{:.0}", view.camera.theta_deg()),
            max_boxes_text: world.tuning().max_boxes.to_string(),
            world,
            view,
            controls: Controls::new(),
            driver,
            draws,
            last_frame: Instant::now(),
            pending: Vec::new(),
            recent: VecDeque::with_capacity(RECENT_EVENTS),
        }
    }

    fn apply(&mut self, event: ControlEvent) -> Action {
        let action = self.controls.apply(event, &mut self.world, &mut self.view);
        match action {
            Action::SetGamma(v) => self.gamma_text = format!("{v:.0}"),
            Action::SetTheta(v) => self.theta_text = format!("{v:.0}"),
            Action::SetMaxBoxes(n) => self.max_boxes_text = n.to_string(),
            _ => {}
        }
        action
    }

    fn flush_pending(&mut self) {
        let events: Vec<ControlEvent> = self.pending.drain(..).collect();
        for event in events {
            self.apply(event);
        }
    }

    fn set_aspect(&mut self, width: u32, height: u32) {
        self.view.aspect = width as f32 / height.max(1) as f32;
    }

    fn record_events(&mut self) {
        for event in self.world.drain_events() {
            let line = match event {
                WorldEvent::BoxReleased { slot, origin } => {
                    format!("box {slot} released at height {:.1}", origin.y)
                }
                WorldEvent::ReleaseRejected { outcome } => format!("release ignored: {outcome:?}"),
                WorldEvent::BoxExpired { slot } => format!("box {slot} expired"),
                WorldEvent::CapacityChanged { from, to } => format!("box slots {from} -> {to}"),
            };
            if self.recent.len() == RECENT_EVENTS {
                self.recent.pop_front();
            }
            self.recent.push_back(line);
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        let heli = *self.world.helicopter();
        let boxes = self.world.boxes();
        let (active, capacity) = (boxes.active_count(), boxes.capacity());

        egui::SidePanel::left("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Helicity");
                ui.separator();
                ui.label(format!("Frame: {}", self.world.frame()));
                ui.label(format!("Height: {:.2}", heli.height));
                ui.label(format!("Speed: {:.2}", heli.speed));
                ui.label(format!("Heading: {:.1}", heli.heading_deg));
                ui.label(format!("Tilt: {:.1}", heli.tilt_deg));
                ui.label(format!("Rotor: {:.0}", heli.propeller_speed));
                ui.label(format!("Boxes: {active}/{capacity}"));
                ui.horizontal(|ui| {
                    let label = if self.view.paused { "p resume" } else { "p pause" };
                    if ui.button(label).clicked() {
                        self.pending.push(ControlEvent::KeyDown(Key::P));
                    }
                    ui.add_enabled_ui(!self.view.paused, |ui| {
                        if ui.button("-").clicked() {
                            self.pending.push(ControlEvent::KeyDown(Key::Minus));
                        }
                        if ui.button("+").clicked() {
                            self.pending.push(ControlEvent::KeyDown(Key::Plus));
                        }
                    });
                    ui.label(format!("speed x{:.2}", self.view.time_scale));
                });
                ui.separator();

                ui.heading("Camera");
                ui.label(format!("Mode: {}", self.view.camera.mode().label()));
                ui.horizontal_wrapped(|ui| {
                    let modes = [
                        (1, CameraMode::Axonometric),
                        (2, CameraMode::Fixed(FixedView::Front)),
                        (3, CameraMode::Fixed(FixedView::Top)),
                        (4, CameraMode::Fixed(FixedView::Right)),
                        (5, CameraMode::FirstPerson),
                    ];
                    for (digit, mode) in modes {
                        let selected = self.view.camera.mode() == mode;
                        let text = format!("{digit} {}", mode.label());
                        if ui.selectable_label(selected, text).clicked() {
                            self.pending.push(ControlEvent::KeyDown(Key::Digit(digit)));
                        }
                    }
                });

                let mut gamma = self.view.camera.gamma_deg();
                if ui
                    .add(egui::Slider::new(&mut gamma, -180.0..=180.0).text("gamma"))
                    .changed()
                {
                    self.pending.push(ControlEvent::ValueChanged(Control::Gamma, gamma));
                }
                let mut theta = self.view.camera.theta_deg();
                if ui
                    .add(egui::Slider::new(&mut theta, -180.0..=180.0).text("theta"))
                    .changed()
                {
                    self.pending.push(ControlEvent::ValueChanged(Control::Theta, theta));
                }
                value_field(ui, Control::Gamma, &mut self.gamma_text, &mut self.pending);
                value_field(ui, Control::Theta, &mut self.theta_text, &mut self.pending);
                ui.separator();

                ui.heading("Boxes");
                let mut max_boxes = capacity;
                if ui
                    .add(egui::Slider::new(&mut max_boxes, 0..=MAX_BOX_SLOTS.min(64)).text("max boxes"))
                    .changed()
                {
                    self.pending.push(ControlEvent::ValueChanged(
                        Control::MaxBoxes,
                        max_boxes as f32,
                    ));
                }
                value_field(ui, Control::MaxBoxes, &mut self.max_boxes_text, &mut self.pending);
                ui.separator();

                ui.heading("Fill");
                ui.horizontal(|ui| {
                    let wire = self.view.fill == FillMode::Wireframe;
                    if ui.selectable_label(wire, "w wireframe").clicked() {
                        self.pending.push(ControlEvent::KeyDown(Key::W));
                    }
                    if ui.selectable_label(!wire, "s solid").clicked() {
                        self.pending.push(ControlEvent::KeyDown(Key::S));
                    }
                });
                ui.separator();

                ui.heading("Events");
                for line in &self.recent {
                    ui.small(line.as_str());
                }

                ui.separator();
                ui.small("Up/Down: climb | Left: fly | Space: drop | 1-5: camera | p: pause | +/-: speed | Esc: quit");
            });
    }
}

/// Text entry for a numeric control, applied when confirmed with Enter.
fn value_field(
    ui: &mut egui::Ui,
    control: Control,
    text: &mut String,
    pending: &mut Vec<ControlEvent>,
) {
    ui.horizontal(|ui| {
        ui.label(control.label());
        let response = ui.add(egui::TextEdit::singleline(text).desired_width(60.0));
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            match text.trim().parse::<f32>() {
                Ok(value) => pending.push(ControlEvent::ValueChanged(control, value)),
                Err(e) => tracing::warn!(control = control.label(), "not a number: {e}"),
            }
        }
    });
}

/// Surface, device and the two renderers drawing into it.
struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(window: Arc<Window>, egui_ctx: &EguiContext) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("helicity_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn paint_ui(
        &mut self,
        window: &Window,
        view: &wgpu::TextureView,
        egui_ctx: &EguiContext,
        full_output: egui::FullOutput,
    ) {
        self.egui_winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct App {
    state: AppState,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl App {
    fn new(tuning: Tuning) -> Self {
        Self {
            state: AppState::new(tuning),
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Helicity")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let gpu = Gpu::new(window.clone(), &self.egui_ctx)?;

        let size = window.inner_size();
        self.state.set_aspect(size.width, size.height);
        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) else {
            return;
        };
        // One request per frame keeps the loop animating under ControlFlow::Wait.
        window.request_redraw();

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => {
                tracing::warn!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let now = Instant::now();
        let dt = (now - self.state.last_frame).min(MAX_FRAME_DT);
        self.state.last_frame = now;

        let state = &mut self.state;
        let info = state
            .driver
            .render_frame(&mut state.world, &state.view, dt, &mut state.draws);
        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &info, &state.draws);
        state.record_events();

        let raw_input = gpu.egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        let focused = self.egui_ctx.wants_keyboard_input();
        if focused != state.controls.is_focused() {
            state.apply(ControlEvent::FocusChanged(focused));
        }
        state.flush_pending();

        gpu.paint_ui(window, &view, &self.egui_ctx, full_output);
        output.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("start-up failed: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) {
            let response = gpu.egui_winit.on_window_event(window, &event);
            // Keys always reach the controls; the focus gate decides.
            if response.consumed && !matches!(event, WindowEvent::KeyboardInput { .. }) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.state.set_aspect(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if pressed
                    && logical_key == WinitKey::Named(NamedKey::Escape)
                    && !self.state.controls.is_focused()
                {
                    event_loop.exit();
                    return;
                }
                if repeat {
                    return;
                }
                let Some(key) = map_key(&logical_key) else {
                    tracing::debug!(?logical_key, "unbound key");
                    return;
                };
                let event = if pressed {
                    ControlEvent::KeyDown(key)
                } else {
                    ControlEvent::KeyUp(key)
                };
                self.state.apply(event);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut tuning = match &cli.config {
        Some(path) => Tuning::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Tuning::default(),
    };
    if let Some(n) = cli.max_boxes {
        tuning.max_boxes = n;
        tuning.validate()?;
    }

    tracing::info!("helicity-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(tuning);
    event_loop.run_app(&mut app)?;

    Ok(())
}
