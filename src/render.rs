use std::borrow::Cow;

use glam::Vec2;
use log::debug;

use crate::surface::{Canvas, Color, DrawCommand};

pub const CIRCLE_SEGMENTS: usize = 24;

const INITIAL_VERTICES: usize = 16 * 1024;

#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec2,
    pub color: [f32; 4],
}

pub struct RenderModule {
    pub screen_size_buffer: wgpu::Buffer,
    vertices_buffer: wgpu::Buffer,
    vertices_capacity: usize,
    vertices: Vec<Vertex>,

    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
}

impl RenderModule {
    pub fn new(device: &wgpu::Device, swapchain_format: wgpu::TextureFormat) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("render.wgsl"))),
        });

        let screen_size_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen Size Buffer"),
            // padded to a full uniform block
            size: 4 * 4,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vertices_buffer = create_vertices_buffer(device, INITIAL_VERTICES);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_size_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("render"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment",
                targets: &[Some(wgpu::ColorTargetState {
                    format: swapchain_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            screen_size_buffer,
            vertices_buffer,
            vertices_capacity: INITIAL_VERTICES,
            vertices: Vec::with_capacity(INITIAL_VERTICES),

            bind_group,
            pipeline,
        }
    }

    /// Tessellates the canvas' recorded frame and uploads it
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        canvas: &Canvas,
        line_width: f32,
    ) {
        self.vertices.clear();
        tessellate(canvas.commands(), line_width, &mut self.vertices);

        if self.vertices.len() > self.vertices_capacity {
            self.vertices_capacity = self.vertices.len().next_power_of_two();
            self.vertices_buffer = create_vertices_buffer(device, self.vertices_capacity);
            debug!("Grew vertex buffer to {} vertices", self.vertices_capacity);
        }

        queue.write_buffer(
            &self.vertices_buffer,
            0,
            bytemuck::cast_slice(&self.vertices),
        );
    }

    pub fn begin_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        background: Color,
    ) -> wgpu::RenderPass<'a> {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: background.r as f64,
                        g: background.g as f64,
                        b: background.b as f64,
                        a: background.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if !self.vertices.is_empty() {
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vertices_buffer.slice(..));
            rpass.draw(0..self.vertices.len() as u32, 0..1);
        }

        rpass
    }

    /// `size` is in the same logical pixels the canvas is drawn in
    pub fn update_size(&self, queue: &wgpu::Queue, size: Vec2) {
        queue.write_buffer(&self.screen_size_buffer, 0, bytemuck::bytes_of(&size));
    }
}

fn create_vertices_buffer(device: &wgpu::Device, vertices: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Canvas Vertex Buffer"),
        size: (std::mem::size_of::<Vertex>() * vertices) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Turns draw commands into a triangle list in canvas (logical pixel) coordinates
pub fn tessellate(commands: &[DrawCommand], line_width: f32, out: &mut Vec<Vertex>) {
    for command in commands {
        match *command {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => circle(center, radius, color.to_array(), out),
            DrawCommand::Line { from, to, color } => {
                line(from, to, line_width, color.to_array(), out)
            }
        }
    }
}

fn circle(center: Vec2, radius: f32, color: [f32; 4], out: &mut Vec<Vertex>) {
    let step = std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
    let rim = |i: usize| center + Vec2::from_angle(step * i as f32) * radius;

    for i in 0..CIRCLE_SEGMENTS {
        out.extend([center, rim(i), rim(i + 1)].map(|position| Vertex { position, color }));
    }
}

fn line(from: Vec2, to: Vec2, width: f32, color: [f32; 4], out: &mut Vec<Vertex>) {
    let Some(direction) = (to - from).try_normalize() else {
        return;
    };
    let offset = direction.perp() * (width * 0.5);

    let quad = [
        from + offset,
        from - offset,
        to + offset,
        to + offset,
        from - offset,
        to - offset,
    ];
    out.extend(quad.map(|position| Vertex { position, color }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_is_a_fan_around_its_center() {
        let mut out = Vec::new();
        tessellate(
            &[DrawCommand::Circle {
                center: Vec2::new(10.0, 20.0),
                radius: 2.0,
                color: Color::ACCENT,
            }],
            1.0,
            &mut out,
        );

        assert_eq!(out.len(), 3 * CIRCLE_SEGMENTS);
        for triangle in out.chunks(3) {
            assert_eq!(triangle[0].position, Vec2::new(10.0, 20.0));
            for rim in &triangle[1..] {
                assert!((rim.position.distance(Vec2::new(10.0, 20.0)) - 2.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn line_is_a_quad_of_line_width() {
        let color = Color::ACCENT.with_alpha(0.25);
        let mut out = Vec::new();
        tessellate(
            &[DrawCommand::Line {
                from: Vec2::new(0.0, 0.0),
                to: Vec2::new(10.0, 0.0),
                color,
            }],
            1.0,
            &mut out,
        );

        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|v| v.color == color.to_array()));
        assert!(out.iter().all(|v| v.position.y.abs() == 0.5));
    }

    #[test]
    fn zero_length_line_has_no_geometry() {
        let mut out = Vec::new();
        tessellate(
            &[DrawCommand::Line {
                from: Vec2::ONE,
                to: Vec2::ONE,
                color: Color::ACCENT,
            }],
            1.0,
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn vertex_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<Vertex>(), 6 * 4);
    }
}
