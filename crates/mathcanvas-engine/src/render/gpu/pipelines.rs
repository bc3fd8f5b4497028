//! wgpu pipelines for the GPU backend.
//!
//! Each pipeline lazily creates its GPU objects on first use, rebuilds them
//! when the target format changes, and grows its dynamic buffers to the next
//! power of two.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::ctx::RenderCtx;
use super::geometry::{DiscInstance, MeshVertex};

// ── shared ────────────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Viewport uniform buffer plus its bind group.
struct ViewportBinding {
    layout: wgpu::BindGroupLayout,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ViewportBinding {
    fn new(ctx: &RenderCtx<'_>, label: &str) -> Self {
        let size = std::mem::size_of::<ViewportUniform>() as u64;
        let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        });
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });
        Self { layout, ubo, bind_group }
    }

    fn write(&self, ctx: &RenderCtx<'_>) {
        ctx.queue.write_buffer(
            &self.ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                viewport: [
                    ctx.viewport.width.max(1.0) as f32,
                    ctx.viewport.height.max(1.0) as f32,
                ],
                _pad: [0.0; 2],
            }),
        );
    }
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    label: &str,
    source: &str,
    binding: &ViewportBinding,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> wgpu::RenderPipeline {
    let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&binding.layout],
        immediate_size: 0,
    });

    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.target_format,
                blend: Some(premul_alpha_blend()),
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
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Dynamic buffer that only grows.
#[derive(Default)]
struct GrowBuffer {
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
}

impl GrowBuffer {
    fn upload<T: Pod>(&mut self, ctx: &RenderCtx<'_>, label: &str, usage: wgpu::BufferUsages, data: &[T]) {
        if data.is_empty() {
            return;
        }
        if data.len() > self.capacity || self.buffer.is_none() {
            let new_cap = data.len().next_power_of_two().max(64);
            self.buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (new_cap * std::mem::size_of::<T>()) as u64,
                usage: usage | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = new_cap;
        }
        if let Some(buffer) = self.buffer.as_ref() {
            ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
    }
}

// ── mesh ──────────────────────────────────────────────────────────────────

/// Colored triangle lists (strokes, fans, strips).
#[derive(Default)]
pub(super) struct MeshPipeline {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    binding: Option<ViewportBinding>,
    vbo: GrowBuffer,
    ibo: GrowBuffer,
}

impl MeshPipeline {
    pub(super) fn prepare(&mut self, ctx: &RenderCtx<'_>, vertices: &[MeshVertex], indices: &[u32]) {
        self.ensure_pipeline(ctx);
        if let Some(binding) = self.binding.as_ref() {
            binding.write(ctx);
        }
        self.vbo.upload(ctx, "mathcanvas mesh vbo", wgpu::BufferUsages::VERTEX, vertices);
        self.ibo.upload(ctx, "mathcanvas mesh ibo", wgpu::BufferUsages::INDEX, indices);
    }

    pub(super) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, indices: Range<u32>) {
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(binding) = self.binding.as_ref() else { return };
        let Some(vbo) = self.vbo.buffer.as_ref() else { return };
        let Some(ibo) = self.ibo.buffer.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &binding.bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(indices, 0, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }
        let binding = ViewportBinding::new(ctx, "mathcanvas mesh viewport");
        let pipeline = create_pipeline(
            ctx,
            "mathcanvas mesh pipeline",
            include_str!("shaders/mesh.wgsl"),
            &binding,
            &[MeshVertex::layout()],
        );
        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.binding = Some(binding);
    }
}

// ── discs ─────────────────────────────────────────────────────────────────

/// Instanced antialiased discs with an optional border ring.
#[derive(Default)]
pub(super) struct DiscPipeline {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    binding: Option<ViewportBinding>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instances: GrowBuffer,
}

impl DiscPipeline {
    pub(super) fn prepare(&mut self, ctx: &RenderCtx<'_>, discs: &[DiscInstance]) {
        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        if let Some(binding) = self.binding.as_ref() {
            binding.write(ctx);
        }
        self.instances.upload(ctx, "mathcanvas disc instance vbo", wgpu::BufferUsages::VERTEX, discs);
    }

    pub(super) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(binding) = self.binding.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };
        let Some(instance_vbo) = self.instances.buffer.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &binding.bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, instances);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }
        let binding = ViewportBinding::new(ctx, "mathcanvas disc viewport");
        let pipeline = create_pipeline(
            ctx,
            "mathcanvas disc pipeline",
            include_str!("shaders/disc.wgsl"),
            &binding,
            &[QuadVertex::layout(), DiscInstance::layout()],
        );
        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.binding = Some(binding);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }
        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mathcanvas disc quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mathcanvas disc quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}
