//! The wgpu quad renderer.
//!
//! One pipeline, one pre-allocated vertex buffer, one orthographic camera.
//! A frame is built by [`GameRenderer::prepare`], any number of `draw_*`
//! calls that accumulate [`Quad`]s, and [`GameRenderer::present`], which
//! uploads everything and submits a single render pass — all the frame's
//! sprites go to the GPU in one batch.

use std::sync::Arc;

use skitter_world::entity::World;
use skitter_world::sprite::SpritePool;
use wgpu::util::DeviceExt;

use crate::physics::PhysicsWorld;

use super::debug;
use super::hud::{self, HudIcon};
use super::text;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A single vertex with 2D position and RGBA color, sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 4],
}

impl Vertex {
    /// Vertex buffer layout for the shader.
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Camera2D
// ---------------------------------------------------------------------------

/// A 2D orthographic camera over pixel space.
///
/// The visible area is `width` x `height` pixels centered at `(x, y)`,
/// y-up, origin at the bottom-left of the default view.
#[derive(Debug, Clone)]
pub struct Camera2D {
    /// Width of the visible area in pixels.
    pub width: f32,
    /// Height of the visible area in pixels.
    pub height: f32,
    /// Camera center X in pixels.
    pub x: f32,
    /// Camera center Y in pixels.
    pub y: f32,
}

impl Camera2D {
    /// A camera showing exactly a `width` x `height` surface, bottom-left at
    /// the origin.
    pub fn for_surface(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            x: width / 2.0,
            y: height / 2.0,
        }
    }

    /// Produce a column-major 4x4 orthographic projection matrix mapping the
    /// visible area to clip space `[-1, 1]` on both axes. Z is unused.
    pub fn orthographic_matrix(&self) -> [f32; 16] {
        let left = self.x - self.width / 2.0;
        let right = self.x + self.width / 2.0;
        let bottom = self.y - self.height / 2.0;
        let top = self.y + self.height / 2.0;

        let sx = 2.0 / (right - left);
        let sy = 2.0 / (top - bottom);
        let tx = -(right + left) / (right - left);
        let ty = -(top + bottom) / (top - bottom);

        // Column-major layout:
        [
            sx, 0.0, 0.0, 0.0, // column 0
            0.0, sy, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            tx, ty, 0.0, 1.0, // column 3
        ]
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::for_surface(800.0, 600.0)
    }
}

// ---------------------------------------------------------------------------
// Quad
// ---------------------------------------------------------------------------

/// The unit of batching: a colored rectangle in pixel space.
///
/// `x`/`y` are the center; rotation is radians counter-clockwise about the
/// center.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    /// Center X in pixels.
    pub x: f32,
    /// Center Y in pixels.
    pub y: f32,
    /// Full width in pixels.
    pub width: f32,
    /// Full height in pixels.
    pub height: f32,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    /// RGBA color, each channel 0.0..=1.0.
    pub color: [f32; 4],
}

impl Quad {
    /// The four corners after rotation, counter-clockwise from bottom-left.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let (sin, cos) = self.rotation.sin_cos();
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let rotate = |dx: f32, dy: f32| {
            [
                self.x + dx * cos - dy * sin,
                self.y + dx * sin + dy * cos,
            ]
        };
        [
            rotate(-half_w, -half_h),
            rotate(half_w, -half_h),
            rotate(half_w, half_h),
            rotate(-half_w, half_h),
        ]
    }
}

// ---------------------------------------------------------------------------
// Buffer sizing
// ---------------------------------------------------------------------------

/// Maximum quads per frame (bounds the pre-allocated vertex buffer).
/// Each quad uses 6 vertices (two triangles).
const MAX_QUADS: usize = 4096;
const VERTICES_PER_QUAD: usize = 6;
const MAX_VERTICES: usize = MAX_QUADS * VERTICES_PER_QUAD;

// ---------------------------------------------------------------------------
// GameRenderer
// ---------------------------------------------------------------------------

/// The client renderer.
///
/// Holds the wgpu surface/device/pipeline and the frame accumulation state.
/// Per frame: [`prepare`](Self::prepare), then `draw_*` calls in paint
/// order (later calls draw on top), then [`present`](Self::present).
pub struct GameRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    window: Arc<winit::window::Window>,
    clear_color: wgpu::Color,
    frame_quads: Vec<Quad>,
    /// The 2D orthographic camera.
    pub camera: Camera2D,
}

impl GameRenderer {
    /// Initialize wgpu: surface, device, queue, pipeline.
    ///
    /// Async because wgpu adapter/device selection is asynchronous; call
    /// with `.await` or through `pollster::block_on`.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available.
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("skitter_renderer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader_source = include_str!("shaders.wgsl");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let camera = Camera2D::for_surface(width as f32, height as f32);
        let camera_matrix = camera.orthographic_matrix();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniform"),
            contents: bytemuck::cast_slice(&camera_matrix),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
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

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_vertex_buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            camera_buffer,
            camera_bind_group,
            window,
            clear_color: wgpu::Color::BLACK,
            frame_quads: Vec::new(),
            camera,
        })
    }

    // -- frame building -----------------------------------------------------

    /// Begin a new frame: set the clear color and drop last frame's quads.
    pub fn prepare(&mut self, clear: [f64; 4]) {
        self.clear_color = wgpu::Color {
            r: clear[0],
            g: clear[1],
            b: clear[2],
            a: clear[3],
        };
        self.frame_quads.clear();
    }

    /// Batch raw quads into the frame.
    pub fn draw_quads(&mut self, quads: impl IntoIterator<Item = Quad>) {
        self.frame_quads.extend(quads);
    }

    /// Batch every sprite in the pool into the frame.
    pub fn draw_sprites(&mut self, sprites: &SpritePool) {
        self.frame_quads.extend(sprites.iter().map(|(_, s)| Quad {
            x: s.x,
            y: s.y,
            width: s.width,
            height: s.height,
            rotation: s.rotation,
            color: s.tint,
        }));
    }

    /// Batch every live entity's sprite into the frame.
    pub fn draw_entities(&mut self, world: &World) {
        let pool = world.sprites();
        self.frame_quads.extend(
            world
                .iter()
                .filter_map(|(_, record)| record.sprite())
                .filter_map(|key| pool.get(key))
                .map(|s| Quad {
                    x: s.x,
                    y: s.y,
                    width: s.width,
                    height: s.height,
                    rotation: s.rotation,
                    color: s.tint,
                }),
        );
    }

    /// Batch a centered row of HUD icons near the top edge.
    pub fn draw_hud_icons(&mut self, icons: &[HudIcon]) {
        let quads = hud::icon_row_quads(icons, self.config.width as f32, self.config.height as f32);
        self.frame_quads.extend(quads);
    }

    /// Batch the countdown digits, centered on the surface.
    pub fn draw_countdown(&mut self, seconds: u32) {
        let center = [
            self.config.width as f32 / 2.0,
            self.config.height as f32 / 2.0,
        ];
        let quads = text::number_quads(seconds, center, text::COUNTDOWN_PIXEL_SIZE, [1.0; 4]);
        self.frame_quads.extend(quads);
    }

    /// Batch wireframe outlines of every physics collider, scaled
    /// meters→pixels.
    pub fn draw_physics_debug(&mut self, physics: &PhysicsWorld) {
        self.frame_quads.extend(debug::collider_outline_quads(physics));
    }

    // -- submission ---------------------------------------------------------

    /// Upload the frame's quads and submit one render pass.
    ///
    /// Quads beyond the buffer capacity are dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`wgpu::SurfaceError`] if the surface cannot provide an
    /// output texture (window minimized, surface lost).
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let camera_matrix = self.camera.orthographic_matrix();
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&camera_matrix));

        let mut vertices: Vec<Vertex> =
            Vec::with_capacity(self.frame_quads.len().min(MAX_QUADS) * VERTICES_PER_QUAD);
        for quad in self.frame_quads.iter().take(MAX_QUADS) {
            let [bl, br, tr, tl] = quad.corners();
            let c = quad.color;
            // Two CCW triangles per quad.
            for position in [bl, br, tr, bl, tr, tl] {
                vertices.push(Vertex { position, color: c });
            }
        }

        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

            let vertex_count = vertices.len() as u32;
            if vertex_count > 0 {
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Reconfigure the surface for a new window size and re-center the
    /// camera on it.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera = Camera2D::for_surface(new_size.width as f32, new_size.height as f32);
        }
    }

    /// The underlying window.
    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }
}
