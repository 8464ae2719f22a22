mod cli;
mod config;
mod field;
mod framepace;
mod gpu;
mod gui;
mod headless;
mod particle;
mod render;
mod surface;

use std::sync::Arc;

use clap::Parser;
use config::FieldConfig;
use field::ParticleField;
use framepace::{frame_limit, Framepacer};
use glam::Vec2;
use gpu::GpuContext;
use gui::{EguiIntegration, Overlay};
use log::{error, warn};
use render::RenderModule;
use surface::{Canvas, SurfaceError};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();

    if let Some(frames) = args.headless {
        headless::run(&args, frames)?;
        return Ok(());
    }

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // State
    let mut app_state = AppState {
        tokio_rt: tokio::runtime::Runtime::new()?,
        config: FieldConfig::default(),
        seed: args.seed,

        gfx: None,
        field: None,
        framepace: Framepacer::new(),

        overlay: Overlay::default(),
        show_overlay: args.overlay,
        mouse_position: Vec2::ZERO,
        framerate: args.framerate.unwrap_or(0),
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    window: Arc<Window>,
    gpu: GpuContext<'static>,
    egui: EguiIntegration,

    render_module: RenderModule,
}

struct AppState {
    tokio_rt: tokio::runtime::Runtime,
    config: FieldConfig,
    seed: Option<u64>,

    gfx: Option<GfxState>,
    field: Option<ParticleField<Canvas>>,
    framepace: Framepacer,

    overlay: Overlay,
    show_overlay: bool,
    mouse_position: Vec2,
    framerate: u32,
}

impl AppState {
    fn create_gfx(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<GfxState> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Constellation"))?,
        );

        let gpu = self.tokio_rt.block_on(GpuContext::new(window.clone()))?;
        let render_module = RenderModule::new(&gpu.device, gpu.config.format);
        render_module.update_size(
            &gpu.queue,
            logical_size(window.inner_size(), window.scale_factor()),
        );

        let mut egui = EguiIntegration::new(&gpu.device, gpu.config.format);
        egui.resize(gpu.config.width, gpu.config.height);

        Ok(GfxState {
            window,
            gpu,
            egui,

            render_module,
        })
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Self {
            gfx: Some(gfx),
            field: Some(field),
            config,
            framepace,
            overlay,
            show_overlay,
            framerate,
            ..
        } = self
        else {
            return;
        };

        framepace.begin_frame();

        if overlay.reinitialize {
            overlay.reinitialize = false;
            if let Err(err) = field.init() {
                error!("Reinitialize failed, stopping: {err}");
                event_loop.exit();
                return;
            }
        }

        if !overlay.paused || overlay.step {
            match field.animate() {
                Ok(stats) => overlay.stats = stats,
                Err(err) => {
                    error!("Frame aborted, stopping: {err}");
                    event_loop.exit();
                    return;
                }
            }
            overlay.step = false;
        }

        let frame = match gfx.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gfx.gpu.reconfigure_surface();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next frame, skipping it");
                return;
            }
            Err(err) => {
                error!("Cannot acquire the next frame, stopping: {err}");
                event_loop.exit();
                return;
            }
        };

        gfx.render_module
            .upload(&gfx.gpu.device, &gfx.gpu.queue, field.surface(), config.line_width);

        let mut encoder = gfx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        if *show_overlay {
            overlay.framerate = framepace.framerate();
            overlay.pointer = field.pointer();
            gfx.egui.run(|ctx| overlay.show(ctx));

            gfx.egui.pre_render(
                &gfx.gpu.device,
                &gfx.gpu.queue,
                &mut encoder,
                framepace.frametime(),
            );
        }

        // Render
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = gfx
                .render_module
                .begin_pass(&mut encoder, &view, config.background);

            if *show_overlay {
                gfx.egui.render(&mut rpass);
            }
        }

        gfx.gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        framepace.end_frame(frame_limit(*framerate));
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }

        let gfx = match self.create_gfx(event_loop) {
            Ok(gfx) => Some(gfx),
            Err(err) => {
                warn!("Failed to create the display surface: {err:#}");
                None
            }
        };

        let canvas = gfx.as_ref().map(|gfx| {
            Canvas::new(logical_size(
                gfx.window.inner_size(),
                gfx.window.scale_factor(),
            ))
        });
        self.field = ParticleField::attach(canvas, self.config.clone(), self.seed);

        if self.field.is_none() {
            event_loop.exit();
            return;
        }
        self.gfx = gfx;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(gfx), Some(field)) = (self.gfx.as_mut(), self.field.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Destroyed => {
                field.surface_mut().detach();
            }

            WindowEvent::Resized(new_size) => {
                gfx.gpu.resize(new_size.width, new_size.height);
                gfx.egui.resize(new_size.width, new_size.height);

                let size = logical_size(new_size, gfx.window.scale_factor());
                if let Err(err) = apply_viewport(gfx, field, size) {
                    error!("Resize failed, stopping: {err}");
                    event_loop.exit();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = logical_size(gfx.window.inner_size(), scale_factor);
                if let Err(err) = apply_viewport(gfx, field, size) {
                    error!("Rescale failed, stopping: {err}");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }

                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => {
                        self.overlay.paused = !self.overlay.paused;
                    }
                    PhysicalKey::Code(KeyCode::KeyN) => {
                        self.overlay.step = true;
                    }
                    PhysicalKey::Code(KeyCode::KeyR) => {
                        self.overlay.reinitialize = true;
                    }
                    PhysicalKey::Code(KeyCode::KeyO) => {
                        self.show_overlay = !self.show_overlay;
                    }
                    PhysicalKey::Code(KeyCode::F11) => {
                        if gfx.window.fullscreen().is_none() {
                            gfx.window
                                .set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
                        } else {
                            gfx.window.set_fullscreen(None);
                        }
                    }
                    _ => (),
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if self.show_overlay {
                    gfx.egui.mouse_event(self.mouse_position, state, button);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                field.set_pointer(Some(logical_position(position, gfx.window.scale_factor())));

                // egui works in physical pixels
                let position = Vec2::new(position.x as f32, position.y as f32);
                if self.show_overlay {
                    gfx.egui.mouse_motion(position);
                }
                self.mouse_position = position;
            }
            WindowEvent::CursorLeft { .. } => {
                field.set_pointer(None);

                if self.show_overlay {
                    gfx.egui.mouse_left();
                }
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.frame(event_loop);
    }
}

/// The field runs in logical pixels, like the page it comes from, so its
/// distances and speeds look the same on any display scale.
fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> Vec2 {
    let size = size.to_logical::<f32>(scale_factor);
    Vec2::new(size.width, size.height)
}

fn logical_position(position: PhysicalPosition<f64>, scale_factor: f64) -> Vec2 {
    let position = position.to_logical::<f32>(scale_factor);
    Vec2::new(position.x, position.y)
}

fn apply_viewport(
    gfx: &GfxState,
    field: &mut ParticleField<Canvas>,
    size: Vec2,
) -> Result<(), SurfaceError> {
    if size.x > 0.0 && size.y > 0.0 {
        gfx.render_module.update_size(&gfx.gpu.queue, size);
    }

    field.surface_mut().set_viewport(size);
    field.init()
}
