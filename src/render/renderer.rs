use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use glam::Mat4;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::shadow::{light_view_projection, ShadowMap, SHADOW_FORMAT};
use super::textures::{TextureCache, TextureUsage};
use super::uniforms::{BoundMaps, GlobalUniform, ObjectConstants, SceneLighting};
use crate::camera::PerspectiveCamera;
use crate::error::SceneError;
use crate::geometry::{MeshData, Vertex};
use crate::part::Side;
use crate::scene::{DrawItem, SceneGraph};
use crate::texture::TextureSlot;
use crate::viewport::RenderSurface;

const SHADER: &str = include_str!("shader.wgsl");

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x4,
];

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// wgpu renderer for a static [`SceneGraph`].
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    pipelines: Pipelines,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    shadow: ShadowMap,
    textures: TextureCache,
    lighting: SceneLighting,
    shadow_view_proj: Option<Mat4>,
    draws: Vec<Draw>,
}

impl Renderer {
    /// Initializes the GPU renderer for the provided window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));

        let backends = if cfg!(target_arch = "wasm32") {
            wgpu::Backends::GL | wgpu::Backends::BROWSER_WEBGPU
        } else {
            wgpu::Backends::PRIMARY
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using GPU adapter {}", adapter.get_info().name);

        let required_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            wgpu::Limits::default()
        };
        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("renderer-device"),
            required_features: wgpu::Features::empty(),
            required_limits,
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|mode| *mode == wgpu::PresentMode::Mailbox)
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);
        let shadow = ShadowMap::create(&device);
        let textures = TextureCache::new(&device, &queue);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<GlobalUniform>() as u64
                ),
            },
            count: None,
        };
        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[
                global_uniform_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        // The shadow pass writes the depth map, so it binds the uniforms alone.
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-bind-layout"),
            entries: &[global_uniform_entry],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ObjectConstants>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: global_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
            ],
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-bind-group"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&shadow_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Pipelines {
            front: scene_pipeline(
                &device,
                &scene_layout,
                &shader,
                surface_format,
                DrawStyle::Front,
            ),
            double: scene_pipeline(
                &device,
                &scene_layout,
                &shader,
                surface_format,
                DrawStyle::Double,
            ),
            wireframe: scene_pipeline(
                &device,
                &scene_layout,
                &shader,
                surface_format,
                DrawStyle::Wireframe,
            ),
            shadow: shadow_pipeline(
                &device,
                &shadow_pipeline_layout,
                &shader,
                DrawStyle::Front,
            ),
            shadow_lines: shadow_pipeline(
                &device,
                &shadow_pipeline_layout,
                &shader,
                DrawStyle::Wireframe,
            ),
        };

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            pipelines,
            global_buffer,
            global_bind_group,
            shadow_bind_group,
            object_layout,
            shadow,
            textures,
            lighting: SceneLighting::default(),
            shadow_view_proj: None,
            draws: Vec::new(),
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Uploads textures whose slots finished loading and rebinds the draws
    /// that use them.
    fn refresh_textures(&mut self) {
        for index in 0..self.draws.len() {
            let draw = &self.draws[index];
            let maps = BoundMaps {
                base: draw.map.as_ref().is_some_and(|slot| {
                    self.textures
                        .ensure(&self.device, &self.queue, slot, TextureUsage::Color)
                }),
                normal: draw.normal_map.as_ref().is_some_and(|slot| {
                    self.textures
                        .ensure(&self.device, &self.queue, slot, TextureUsage::Data)
                }),
            };
            if maps == draw.maps {
                continue;
            }
            debug!("rebinding textures for `{}`", draw.name);
            let constants = ObjectConstants::new(draw.world, &draw.material, draw.receives_shadow, maps);
            self.queue
                .write_buffer(&draw.constants, 0, bytes_of(&constants));
            let bind_group = self.object_bind_group(
                &draw.name,
                &draw.constants,
                draw.map.as_ref(),
                draw.normal_map.as_ref(),
            );
            let draw = &mut self.draws[index];
            draw.bind_group = bind_group;
            draw.maps = maps;
        }
    }

    fn object_bind_group(
        &self,
        name: &str,
        constants: &wgpu::Buffer,
        map: Option<&TextureSlot>,
        normal_map: Option<&TextureSlot>,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}-bind-group")),
            layout: &self.object_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: constants.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        self.textures.view(map, TextureUsage::Color),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        self.textures.view(normal_map, TextureUsage::Data),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.textures.sampler),
                },
            ],
        })
    }

    fn create_draw(&self, item: &DrawItem<'_>) -> Draw {
        let material = &item.mesh.material;
        let style = if material.wireframe {
            DrawStyle::Wireframe
        } else if material.side == Side::Double {
            DrawStyle::Double
        } else {
            DrawStyle::Front
        };
        let maps = BoundMaps::default();
        let constants = ObjectConstants::new(item.world, material, item.mesh.receives_shadow, maps);
        let constants = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-uniform", item.name)),
                contents: bytes_of(&constants),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = self.object_bind_group(item.name, &constants, None, None);

        Draw {
            name: item.name.to_string(),
            world: item.world,
            material: material.clone(),
            receives_shadow: item.mesh.receives_shadow,
            casts_shadow: item.mesh.casts_shadow,
            style,
            buffers: MeshBuffers::from_mesh(&self.device, &item.mesh.data, item.name, style),
            constants,
            bind_group,
            map: material.map.clone(),
            normal_map: material.normal_map.clone(),
            maps,
        }
    }

    fn draw_frame(&mut self, camera: &PerspectiveCamera) -> Result<(), wgpu::SurfaceError> {
        self.refresh_textures();

        let globals = GlobalUniform::new(
            camera,
            &self.lighting,
            self.shadow_view_proj,
            ShadowMap::texel_size(),
        );
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&globals));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        if self.shadow_view_proj.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow-pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.shadow_bind_group, &[]);
            for draw in self.draws.iter().filter(|draw| draw.casts_shadow) {
                pass.set_pipeline(self.pipelines.shadow_for(draw.style));
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, draw.buffers.vertex.slice(..));
                let (index, count) = draw.buffers.indices(draw.style);
                pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.global_bind_group, &[]);

            for draw in &self.draws {
                pass.set_pipeline(self.pipelines.for_style(draw.style));
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, draw.buffers.vertex.slice(..));
                let (index, count) = draw.buffers.indices(draw.style);
                pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderSurface for Renderer {
    fn prepare(&mut self, scene: &SceneGraph) -> Result<(), SceneError> {
        self.draws = scene
            .draw_items()
            .iter()
            .map(|item| self.create_draw(item))
            .collect();
        self.lighting = SceneLighting::from_lights(&scene.lights());
        self.shadow_view_proj = match (self.lighting.point, scene.bounds()) {
            (Some(point), Some(bounds)) if point.casts_shadow => {
                Some(light_view_projection(point.position, &bounds))
            }
            _ => None,
        };
        self.refresh_textures();
        info!(
            "renderer prepared {} draws (shadows {})",
            self.draws.len(),
            if self.shadow_view_proj.is_some() {
                "on"
            } else {
                "off"
            }
        );
        Ok(())
    }

    /// Resizes the swap chain to match the new dimensions.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = PhysicalSize::new(width, height);
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        self.depth = DepthBuffer::create(&self.device, width, height);
    }

    fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), SceneError> {
        match self.draw_frame(camera) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("surface timeout; retrying next frame");
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                Err(SceneError::backend("GPU is out of memory"))
            }
            Err(err) => {
                warn!("surface error: {err}; retrying next frame");
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawStyle {
    /// Back faces culled.
    Front,
    /// Both faces drawn; the shader flips back-face normals.
    Double,
    /// Triangle edges as a line list.
    Wireframe,
}

struct Pipelines {
    front: wgpu::RenderPipeline,
    double: wgpu::RenderPipeline,
    wireframe: wgpu::RenderPipeline,
    shadow: wgpu::RenderPipeline,
    shadow_lines: wgpu::RenderPipeline,
}

impl Pipelines {
    fn for_style(&self, style: DrawStyle) -> &wgpu::RenderPipeline {
        match style {
            DrawStyle::Front => &self.front,
            DrawStyle::Double => &self.double,
            DrawStyle::Wireframe => &self.wireframe,
        }
    }

    /// Wireframe parts cast the shadow of their edges only.
    fn shadow_for(&self, style: DrawStyle) -> &wgpu::RenderPipeline {
        match topology(style) {
            wgpu::PrimitiveTopology::LineList => &self.shadow_lines,
            _ => &self.shadow,
        }
    }
}

fn topology(style: DrawStyle) -> wgpu::PrimitiveTopology {
    match style {
        DrawStyle::Front | DrawStyle::Double => wgpu::PrimitiveTopology::TriangleList,
        DrawStyle::Wireframe => wgpu::PrimitiveTopology::LineList,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    style: DrawStyle,
) -> wgpu::RenderPipeline {
    let (label, cull_mode) = match style {
        DrawStyle::Front => ("front-pipeline", Some(wgpu::Face::Back)),
        DrawStyle::Double => ("double-pipeline", None),
        DrawStyle::Wireframe => ("wireframe-pipeline", None),
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: topology(style),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

/// Depth bias is only valid for triangle topologies.
fn shadow_bias(style: DrawStyle) -> wgpu::DepthBiasState {
    match topology(style) {
        wgpu::PrimitiveTopology::TriangleList => wgpu::DepthBiasState {
            constant: 2,
            slope_scale: 2.0,
            clamp: 0.0,
        },
        _ => wgpu::DepthBiasState::default(),
    }
}

fn shadow_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    style: DrawStyle,
) -> wgpu::RenderPipeline {
    let label = match topology(style) {
        wgpu::PrimitiveTopology::LineList => "shadow-lines-pipeline",
        _ => "shadow-pipeline",
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_shadow"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        primitive: wgpu::PrimitiveState {
            topology: topology(style),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: SHADOW_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: Default::default(),
            bias: shadow_bias(style),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        multiview: None,
        cache: None,
    })
}

/// GPU state for one mesh of the scene.
struct Draw {
    name: String,
    world: Mat4,
    material: crate::material::Material,
    receives_shadow: bool,
    casts_shadow: bool,
    style: DrawStyle,
    buffers: MeshBuffers,
    constants: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    map: Option<TextureSlot>,
    normal_map: Option<TextureSlot>,
    maps: BoundMaps,
}

struct EdgeBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    edges: Option<EdgeBuffer>,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData, label: &str, style: DrawStyle) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edges = (style == DrawStyle::Wireframe).then(|| {
            let edges = mesh.edge_indices();
            EdgeBuffer {
                buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}-edges")),
                    contents: bytemuck::cast_slice(&edges),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                count: edges.len() as u32,
            }
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
            edges,
        }
    }

    /// Index buffer and count to draw for `style`.
    fn indices(&self, style: DrawStyle) -> (&wgpu::Buffer, u32) {
        match (&self.edges, style) {
            (Some(edges), DrawStyle::Wireframe) => (&edges.buffer, edges.count),
            _ => (&self.index, self.index_count),
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
