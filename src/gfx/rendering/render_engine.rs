//! WGPU-based rendering engine
//!
//! Owns the surface, device and every GPU buffer handed out through
//! [`RenderBackend`]. A frame is a single pass: lit meshes, then the line
//! overlay, both depth tested. Picking renders the same meshes into an
//! off-screen `Rgba8Unorm` target with flat id colors and reads one pixel back.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::TextureFormat;

use super::backend::{FrameDraws, MeshHandle, PickFrame, RenderBackend, RenderError};
use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use crate::gfx::resources::{
    global_bindings::{GlobalBindings, GlobalUBOContent},
    object_uniform::ObjectUBOContent,
    texture_resource::TextureResource,
};
use crate::gfx::scene::vertex::{LineVertex, Vertex3D};
use crate::wgpu_utils::{binding_types, uniform_buffer::UniformBuffer};

const MESH_PIPELINE: &str = "Mesh";
const LINE_PIPELINE: &str = "Lines";
const PICK_PIPELINE: &str = "Pick";

const PICK_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
/// One Rgba8 texel padded to the required row alignment.
const PICK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

#[derive(Debug, thiserror::Error)]
pub enum EngineInitError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("pipeline setup failed: {0}")]
    Pipelines(String),
}

type ObjectUBO = UniformBuffer<ObjectUBOContent>;

/// GPU side of one uploaded mesh.
///
/// Draw and pick passes use separate uniforms so both can be recorded
/// between the same pair of submits.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_count: usize,
    index_count: u32,
    draw_uniform: ObjectUBO,
    draw_bind_group: wgpu::BindGroup,
    pick_uniform: ObjectUBO,
    pick_bind_group: wgpu::BindGroup,
}

/// Growable vertex buffer for the per-frame line overlay.
struct LineBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
}

struct PickTarget {
    color: TextureResource,
    depth: TextureResource,
}

impl PickTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            color: TextureResource::create_readable_target(
                device,
                width,
                height,
                PICK_FORMAT,
                "pick_color_texture",
            ),
            depth: TextureResource::create_depth_texture(device, width, height, "pick_depth_texture"),
        }
    }
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    pick_globals: GlobalBindings,
    object_layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshHandle, GpuMesh>,
    next_handle: u64,
    lines: Option<LineBuffer>,
    pick_target: PickTarget,
    readback: wgpu::Buffer,
}

impl RenderEngine {
    /// Opens a device for `window` and builds the three pipelines.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<RenderEngine, EngineInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(EngineInitError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");
        let pick_target = PickTarget::new(&device, config.width, config.height);

        let global_bindings = GlobalBindings::new(&device, "Global Bindings");
        let pick_globals = GlobalBindings::new(&device, "Pick Global Bindings");
        let object_layout = binding_types::uniform_layout(&device, "Object Layout");

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("mesh.wgsl", include_str!("shaders/mesh.wgsl"));
        pipeline_manager.load_shader("line.wgsl", include_str!("shaders/line.wgsl"));
        pipeline_manager.load_shader("pick.wgsl", include_str!("shaders/pick.wgsl"));

        let mesh_layouts = vec![global_bindings.layout().clone(), object_layout.clone()];
        pipeline_manager.register_pipeline(
            MESH_PIPELINE,
            PipelineConfig::default()
                .with_label("Mesh Pipeline")
                .with_shader("mesh.wgsl")
                .with_bind_group_layouts(mesh_layouts.clone())
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_format(format)
                .with_cull_mode(None),
        );
        pipeline_manager.register_pipeline(
            PICK_PIPELINE,
            PipelineConfig::default()
                .with_label("Pick Pipeline")
                .with_shader("pick.wgsl")
                .with_bind_group_layouts(mesh_layouts)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_format(PICK_FORMAT)
                .with_cull_mode(None),
        );
        pipeline_manager.register_pipeline(
            LINE_PIPELINE,
            PipelineConfig::default()
                .with_label("Line Pipeline")
                .with_shader("line.wgsl")
                .with_bind_group_layouts(vec![global_bindings.layout().clone()])
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_format(format)
                .with_vertex_layout(VertexLayout::Line)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None),
        );
        pipeline_manager.create_all_pipelines().map_err(|errors| {
            EngineInitError::Pipelines(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Readback Buffer"),
            size: PICK_ROW_BYTES as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            depth_texture,
            pipeline_manager,
            global_bindings,
            pick_globals,
            object_layout,
            meshes: HashMap::new(),
            next_handle: 0,
            lines: None,
            pick_target,
            readback,
        })
    }

    /// Reconfigures the surface and recreates every size-dependent target.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
        self.pick_target = PickTarget::new(&self.device, width, height);
    }

    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    fn upload_lines(&mut self, lines: &[LineVertex]) {
        if lines.is_empty() {
            return;
        }
        let needed = lines.len();
        let fits = self.lines.as_ref().is_some_and(|l| l.capacity >= needed);
        if !fits {
            let capacity = needed.next_power_of_two();
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Line Vertex Buffer"),
                size: (capacity * std::mem::size_of::<LineVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.lines = Some(LineBuffer { buffer, capacity });
        }
        if let Some(line_buffer) = &self.lines {
            self.queue
                .write_buffer(&line_buffer.buffer, 0, bytemuck::cast_slice(lines));
        }
    }

    fn acquire_frame(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(self.surface.get_current_texture()?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::Immediate
    }
}

fn clear_color([r, g, b]: [f32; 3]) -> wgpu::Color {
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

impl RenderBackend for RenderEngine {
    fn upload_mesh(&mut self, vertices: &[Vertex3D], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", handle)),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", handle)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let draw_uniform = ObjectUBO::new(&self.device);
        let draw_bind_group = binding_types::uniform_bind_group(
            &self.device,
            &self.object_layout,
            draw_uniform.binding_resource(),
            &format!("{} Draw Bind Group", handle),
        );
        let pick_uniform = ObjectUBO::new(&self.device);
        let pick_bind_group = binding_types::uniform_bind_group(
            &self.device,
            &self.object_layout,
            pick_uniform.binding_resource(),
            &format!("{} Pick Bind Group", handle),
        );

        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                vertex_count: vertices.len(),
                index_count: indices.len() as u32,
                draw_uniform,
                draw_bind_group,
                pick_uniform,
                pick_bind_group,
            },
        );
        log::debug!(
            "Uploaded {} ({} vertices, {} indices)",
            handle,
            vertices.len(),
            indices.len()
        );
        handle
    }

    fn update_vertices(
        &mut self,
        mesh: MeshHandle,
        vertices: &[Vertex3D],
    ) -> Result<(), RenderError> {
        let gpu = self.meshes.get(&mesh).ok_or(RenderError::UnknownMesh(mesh))?;
        if vertices.len() != gpu.vertex_count {
            log::warn!(
                "{}: vertex count changed from {} to {}; update ignored",
                mesh,
                gpu.vertex_count,
                vertices.len()
            );
            return Ok(());
        }
        self.queue
            .write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        Ok(())
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        if let Some(gpu) = self.meshes.remove(&mesh) {
            gpu.vertex_buffer.destroy();
            gpu.index_buffer.destroy();
            log::debug!("Released {}", mesh);
        }
    }

    fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn draw_frame(&mut self, frame: &FrameDraws) -> Result<(), RenderError> {
        self.global_bindings.update(
            &self.queue,
            GlobalUBOContent::new(
                frame.view_proj,
                frame.eye,
                frame.light_position,
                frame.light_color,
            ),
        );
        for item in &frame.items {
            let gpu = self
                .meshes
                .get_mut(&item.mesh)
                .ok_or(RenderError::UnknownMesh(item.mesh))?;
            gpu.draw_uniform.update_content(
                &self.queue,
                ObjectUBOContent::lit(item.model, item.color, item.unlit),
            );
        }
        self.upload_lines(&frame.lines);

        let surface_texture = self.acquire_frame()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(frame.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.pipeline(MESH_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for item in &frame.items {
                    if let Some(gpu) = self.meshes.get(&item.mesh) {
                        render_pass.set_bind_group(1, &gpu.draw_bind_group, &[]);
                        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                        render_pass
                            .set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
                    }
                }
            }

            if let (Some(pipeline), Some(line_buffer)) =
                (self.pipeline_manager.pipeline(LINE_PIPELINE), &self.lines)
            {
                if !frame.lines.is_empty() {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_vertex_buffer(0, line_buffer.buffer.slice(..));
                    render_pass.draw(0..frame.lines.len() as u32, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn read_pick_pixel(
        &mut self,
        frame: &PickFrame,
        pixel: [u32; 2],
    ) -> Result<[u8; 4], RenderError> {
        let (width, height) = (self.pick_target.color.width(), self.pick_target.color.height());
        let [x, y] = pixel;
        if x >= width || y >= height {
            return Err(RenderError::PixelOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        self.pick_globals
            .update(&self.queue, GlobalUBOContent::with_view_proj(frame.view_proj));
        for item in &frame.items {
            let gpu = self
                .meshes
                .get_mut(&item.mesh)
                .ok_or(RenderError::UnknownMesh(item.mesh))?;
            gpu.pick_uniform
                .update_content(&self.queue, ObjectUBOContent::pick(item.model, item.id_color));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Encoder"),
            });
        {
            let mut pick_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.pick_target.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.pick_target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pick_pass.set_bind_group(0, self.pick_globals.bind_group(), &[]);
            if let Some(pipeline) = self.pipeline_manager.pipeline(PICK_PIPELINE) {
                pick_pass.set_pipeline(pipeline);
                for item in &frame.items {
                    if let Some(gpu) = self.meshes.get(&item.mesh) {
                        pick_pass.set_bind_group(1, &gpu.pick_bind_group, &[]);
                        pick_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                        pick_pass
                            .set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pick_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
                    }
                }
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.pick_target.color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(PICK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::MaintainBase::Wait);
        futures::executor::block_on(rx).map_err(|_| RenderError::ReadbackCancelled)??;

        let mut rgba = [0u8; 4];
        {
            let data = slice.get_mapped_range();
            rgba.copy_from_slice(&data[..4]);
        }
        self.readback.unmap();
        Ok(rgba)
    }
}
