use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::shader::{LinkedProgram, UniformLocation};

use super::backend::{AttributePointer, BufferTarget, GpuDevice, ResourceId, VertexArrayLayout};
use super::error::{ShaderError, SurfaceErrorAction, UploadError};
use super::surface;

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO waits for one vertical blank per present, which is the frame pacing
    /// the render loop relies on.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

#[derive(Default)]
struct VertexArray {
    layout: Option<VertexArrayLayout>,
    /// Bit `n` set when attribute slot `n` is enabled.
    enabled: u32,
}

impl VertexArray {
    fn enabled_attributes(&self) -> impl Iterator<Item = &AttributePointer> {
        let enabled = self.enabled;
        self.layout
            .iter()
            .flat_map(|l| l.attributes.iter())
            .filter(move |a| a.slot < 32 && enabled & (1 << a.slot) != 0)
    }
}

struct UniformSlot {
    location: UniformLocation,
    buffer: wgpu::Buffer,
}

struct Program {
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group: wgpu::BindGroup,
    uniforms: Vec<UniformSlot>,
    /// Keyed by vertex array and its enabled-slot mask.
    pipelines: HashMap<(ResourceId, u32), wgpu::RenderPipeline>,
}

struct DrawCall {
    vao: ResourceId,
    program: ResourceId,
    index_count: u32,
}

/// Commands recorded between `clear` and `present`.
#[derive(Default)]
struct PendingFrame {
    clear_color: Option<wgpu::Color>,
    draws: Vec<DrawCall>,
}

/// wgpu implementation of [`GpuDevice`].
///
/// Presents a bind-then-draw API on top of wgpu: vertex arrays, buffers and
/// programs live in id-keyed tables, draws are recorded per frame and replayed
/// into one render pass (color + depth) when the frame is presented.
pub struct WgpuDevice {
    /// Keeps the window alive for the `'static` surface.
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,

    next_id: u32,
    vertex_arrays: HashMap<ResourceId, VertexArray>,
    buffers: HashMap<ResourceId, wgpu::Buffer>,
    programs: HashMap<ResourceId, Program>,

    bound_vao: Option<ResourceId>,
    current_program: Option<ResourceId>,
    frame: Option<PendingFrame>,
}

impl WgpuDevice {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prism device"),
                required_features: init.required_features,
                required_limits: init.required_limits.using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        // The default handler panics; the render loop has no error path, so
        // validation failures are logged and the frame carries on.
        device.on_uncaptured_error(Arc::new(|err: wgpu::Error| {
            log::error!("wgpu error: {err}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let depth_view = surface::create_depth_view(&device, size.width, size.height);

        log::debug!(
            "wgpu device ready: {:?} backend, surface {:?} {}x{}",
            adapter.get_info().backend,
            format,
            size.width,
            size.height
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            next_id: 1,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            bound_vao: None,
            current_program: None,
            frame: None,
        })
    }

    fn issue_id(&mut self) -> ResourceId {
        let id = ResourceId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Builds the pipeline for `draw` if it is not cached yet. Returns whether
    /// the draw can be replayed.
    fn ensure_pipeline(&mut self, draw: &DrawCall) -> bool {
        let Some(vao) = self.vertex_arrays.get(&draw.vao) else {
            log::warn!("draw references deleted vertex array {}", draw.vao.raw());
            return false;
        };
        if vao.layout.is_none() {
            log::warn!("draw references unconfigured vertex array {}", draw.vao.raw());
            return false;
        }
        let Some(program) = self.programs.get_mut(&draw.program) else {
            log::warn!("draw references deleted program {}", draw.program.raw());
            return false;
        };

        let key = (draw.vao, vao.enabled);
        if program.pipelines.contains_key(&key) {
            return true;
        }

        let enabled: Vec<&AttributePointer> = vao.enabled_attributes().collect();
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = enabled
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: vertex_format(a.components),
                    offset: 0,
                    shader_location: a.slot,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = enabled
            .iter()
            .zip(&attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: a.effective_stride(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prism pipeline"),
            layout: Some(&program.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &program.vertex_module,
                entry_point: Some(program.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &program.fragment_module,
                entry_point: Some(program.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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

            depth_stencil: Some(wgpu::DepthStencilState {
                format: surface::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "built pipeline for program {} / vertex array {} ({} attribute slot(s))",
            draw.program.raw(),
            draw.vao.raw(),
            enabled.len()
        );
        program.pipelines.insert(key, pipeline);
        true
    }

    fn acquire_surface_texture(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(texture) => Some(texture),
            Err(err) => {
                match surface::classify_surface_error(&err) {
                    SurfaceErrorAction::Reconfigured => {
                        if self.config.width > 0 && self.config.height > 0 {
                            self.surface.configure(&self.device, &self.config);
                        }
                        log::debug!("surface reconfigured after {err}; frame skipped");
                    }
                    SurfaceErrorAction::SkipFrame => log::warn!("frame skipped: {err}"),
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface failure: {err}; frame dropped")
                    }
                }
                None
            }
        }
    }
}

impl GpuDevice for WgpuDevice {
    fn is_current(&self) -> bool {
        true
    }

    fn create_vertex_array(&mut self) -> Result<ResourceId, UploadError> {
        let id = self.issue_id();
        self.vertex_arrays.insert(id, VertexArray::default());
        Ok(id)
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        contents: &[u8],
    ) -> Result<ResourceId, UploadError> {
        if contents.is_empty() {
            return Err(UploadError::AllocationFailed("zero-sized data store".into()));
        }
        let max = self.device.limits().max_buffer_size;
        if contents.len() as u64 > max {
            return Err(UploadError::AllocationFailed(format!(
                "{} bytes exceeds the device limit of {max}",
                contents.len()
            )));
        }

        let (label, usage) = match target {
            BufferTarget::Vertex => ("prism vertex buffer", wgpu::BufferUsages::VERTEX),
            BufferTarget::Index => ("prism index buffer", wgpu::BufferUsages::INDEX),
        };

        // No COPY_DST: the store is written once at creation and never respecified.
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        });

        let id = self.issue_id();
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn configure_vertex_array(&mut self, vao: ResourceId, layout: &VertexArrayLayout) {
        match self.vertex_arrays.get_mut(&vao) {
            Some(entry) => entry.layout = Some(layout.clone()),
            None => log::warn!("configure on unknown vertex array {}", vao.raw()),
        }
    }

    fn bind_vertex_array(&mut self, vao: ResourceId) {
        self.bound_vao = Some(vao);
    }

    fn enable_attribute(&mut self, slot: u32) {
        let Some(entry) = self.bound_vao.and_then(|id| self.vertex_arrays.get_mut(&id)) else {
            log::warn!("enable_attribute({slot}) with no vertex array bound");
            return;
        };
        if slot < 32 {
            entry.enabled |= 1 << slot;
        }
    }

    fn delete_vertex_array(&mut self, vao: ResourceId) {
        self.vertex_arrays.remove(&vao);
        if self.bound_vao == Some(vao) {
            self.bound_vao = None;
        }
    }

    fn delete_buffer(&mut self, buffer: ResourceId) {
        if let Some(buffer) = self.buffers.remove(&buffer) {
            buffer.destroy();
        }
    }

    fn create_program(&mut self, linked: &LinkedProgram) -> Result<ResourceId, ShaderError> {
        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism vertex shader"),
            source: wgpu::ShaderSource::Wgsl(linked.vertex_source().into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism fragment shader"),
            source: wgpu::ShaderSource::Wgsl(linked.fragment_source().into()),
        });

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = linked
            .uniforms()
            .iter()
            .map(|u| wgpu::BindGroupLayoutEntry {
                binding: u.location.binding(),
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(u.size),
                },
                count: None,
            })
            .collect();

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("prism uniform bgl"),
                entries: &layout_entries,
            });

        let uniforms: Vec<UniformSlot> = linked
            .uniforms()
            .iter()
            .map(|u| UniformSlot {
                location: u.location,
                buffer: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    size: u.size.next_multiple_of(16),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            })
            .collect();

        let group_entries: Vec<wgpu::BindGroupEntry<'_>> = uniforms
            .iter()
            .map(|slot| wgpu::BindGroupEntry {
                binding: slot.location.binding(),
                resource: slot.buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism uniform bind group"),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("prism pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let program = Program {
            vertex_module,
            fragment_module,
            vertex_entry: linked.vertex_entry_point().to_string(),
            fragment_entry: linked.fragment_entry_point().to_string(),
            pipeline_layout,
            bind_group,
            uniforms,
            pipelines: HashMap::new(),
        };

        let id = self.issue_id();
        self.programs.insert(id, program);
        Ok(id)
    }

    fn use_program(&mut self, program: ResourceId) {
        self.current_program = Some(program);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, columns: &[f32; 16]) {
        let Some(program) = self.current_program.and_then(|id| self.programs.get(&id)) else {
            log::warn!("uniform upload with no program in use");
            return;
        };
        let Some(slot) = program.uniforms.iter().find(|u| u.location == location) else {
            log::warn!("uniform binding {} not in the program in use", location.binding());
            return;
        };
        self.queue
            .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(columns));
    }

    fn delete_program(&mut self, program: ResourceId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.frame = Some(PendingFrame {
            clear_color: Some(wgpu::Color {
                r: color[0] as f64,
                g: color[1] as f64,
                b: color[2] as f64,
                a: color[3] as f64,
            }),
            draws: Vec::new(),
        });
    }

    fn draw_indexed_triangles(&mut self, index_count: u32) {
        let (Some(vao), Some(program)) = (self.bound_vao, self.current_program) else {
            log::error!("draw issued without a bound vertex array and program in use");
            return;
        };
        self.frame
            .get_or_insert_with(PendingFrame::default)
            .draws
            .push(DrawCall {
                vao,
                program,
                index_count,
            });
    }

    fn present(&mut self) {
        let frame = self.frame.take().unwrap_or_default();

        // Pipelines are built before the pass borrows the tables immutably.
        let ready: Vec<bool> = frame.draws.iter().map(|d| self.ensure_pipeline(d)).collect();

        let Some(surface_texture) = self.acquire_surface_texture() else {
            return;
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism frame encoder"),
            });

        {
            let color_load = match frame.clear_color {
                Some(c) => wgpu::LoadOp::Clear(c),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = match frame.clear_color {
                Some(_) => wgpu::LoadOp::Clear(1.0),
                None => wgpu::LoadOp::Load,
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (draw, _) in frame.draws.iter().zip(&ready).filter(|(_, ok)| **ok) {
                let (Some(vao), Some(program)) = (
                    self.vertex_arrays.get(&draw.vao),
                    self.programs.get(&draw.program),
                ) else {
                    continue;
                };
                let Some(layout) = vao.layout.as_ref() else {
                    continue;
                };
                let Some(pipeline) = program.pipelines.get(&(draw.vao, vao.enabled)) else {
                    continue;
                };
                let (Some(vertex_buffer), Some(index_buffer)) = (
                    self.buffers.get(&layout.vertex_buffer),
                    self.buffers.get(&layout.index_buffer),
                ) else {
                    log::warn!("draw skipped: vertex array {} lost a buffer", draw.vao.raw());
                    continue;
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &program.bind_group, &[]);
                for (slot, attribute) in vao.enabled_attributes().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, vertex_buffer.slice(attribute.offset..));
                }
                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();
    }

    /// wgpu does not support configuring a surface with a 0x0 size; in that
    /// case the resize is ignored until a non-zero size arrives.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = surface::create_depth_view(&self.device, width, height);
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}
