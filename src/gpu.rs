use std::sync::Arc;

use anyhow::Context;
use log::info;
use winit::window::Window;

pub struct GpuContext<'a> {
    pub surface: wgpu::Surface<'a>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext<'static> {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let window_size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .context("Failed to find an appropriate adapter")?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("Failed to create Device")?;

        let mut config = surface
            .get_default_config(&adapter, window_size.width.max(1), window_size.height.max(1))
            .context("Surface is not supported by the adapter")?;

        // Colors are authored in sRGB already, so prefer a format that
        // doesn't encode them a second time.
        let capabilities = surface.get_capabilities(&adapter);
        if let Some(format) = capabilities.formats.iter().find(|f| !f.is_srgb()) {
            config.format = *format;
        }
        surface.configure(&device, &config);

        info!(
            "GPU ready: {{ adapter: {}, format: {:?}, width: {}, height: {} }}",
            adapter.get_info().name,
            config.format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }
}

impl<'a> GpuContext<'a> {
    /// Applies a new window size, ignoring the zero size of a minimized window
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.reconfigure_surface();
    }

    pub fn reconfigure_surface(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}
