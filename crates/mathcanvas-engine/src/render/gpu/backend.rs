use crate::coords::Viewport;
use crate::device::Gpu;
use crate::plan::Plan;
use crate::primitive::Primitive;
use crate::render::backend::check_viewport;
use crate::render::{BackendConfig, BackendError, BackendKind, Renderer};
use crate::telemetry::Telemetry;

use super::ctx::RenderCtx;
use super::geometry::{DrawRun, GeometryBatch};
use super::pipelines::{DiscPipeline, MeshPipeline};

/// Color texture plus its default view.
struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(gpu: &Gpu, size: wgpu::Extent3d, label: &str) -> Self {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.target_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Buffer-based backend over a headless wgpu device.
///
/// - `apply_plan` only tessellates; nothing touches the device until
///   `end_frame`
/// - `DrawText` is a no-op, warned once per backend
/// - with offscreen compositing the pass renders into a second texture that
///   is copied to the target before submission
pub struct GpuBackend {
    gpu: Gpu,
    viewport: Viewport,
    target: Target,
    offscreen: Option<Target>,
    clear_color: wgpu::Color,

    batch: GeometryBatch,
    mesh: MeshPipeline,
    discs: DiscPipeline,

    warned_text: bool,
    telemetry: Telemetry,
}

impl GpuBackend {
    pub fn new(gpu: Gpu, viewport: Viewport, config: &BackendConfig) -> Result<Self, BackendError> {
        check_viewport(viewport)?;
        let size = texture_extent(&gpu, viewport);
        let target = Target::new(&gpu, size, "mathcanvas target");
        let offscreen = config
            .offscreen_gpu
            .then(|| Target::new(&gpu, size, "mathcanvas offscreen target"));

        Ok(Self {
            gpu,
            viewport,
            target,
            offscreen,
            clear_color: wgpu::Color::TRANSPARENT,
            batch: GeometryBatch::new(),
            mesh: MeshPipeline::default(),
            discs: DiscPipeline::default(),
            warned_text: false,
            telemetry: Telemetry::new(),
        })
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Texture holding the last presented frame.
    pub fn target(&self) -> &wgpu::Texture {
        &self.target.texture
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Geometry staged for the current frame.
    pub fn batch(&self) -> &GeometryBatch {
        &self.batch
    }

    fn submit(&mut self) {
        let ctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.target_format(),
            self.viewport,
        );

        self.mesh.prepare(&ctx, self.batch.vertices(), self.batch.indices());
        self.discs.prepare(&ctx, self.batch.discs());
        self.telemetry
            .record_events("gpu_vertices_uploaded", self.batch.vertices().len() as u64);

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mathcanvas frame encoder"),
        });

        let view = match self.offscreen.as_ref() {
            Some(hidden) => &hidden.view,
            None => &self.target.view,
        };
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mathcanvas frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for run in self.batch.runs() {
                match run {
                    DrawRun::Mesh(range) => self.mesh.draw(&mut rpass, range.clone()),
                    DrawRun::Discs(range) => self.discs.draw(&mut rpass, range.clone()),
                }
            }
        }
        self.telemetry
            .record_events("gpu_draw_calls", self.batch.runs().len() as u64);

        if let Some(hidden) = self.offscreen.as_ref() {
            encoder.copy_texture_to_texture(
                hidden.texture.as_image_copy(),
                self.target.texture.as_image_copy(),
                self.target.texture.size(),
            );
            self.telemetry.record_event("gpu_offscreen_copy");
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        self.telemetry.record_event("gpu_submit");
    }
}

impl Renderer for GpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn begin_frame(&mut self) {
        self.batch.clear();
    }

    fn apply_plan(&mut self, plan: &Plan) {
        for cmd in &plan.commands {
            match cmd {
                Primitive::ClearSurface => self.batch.clear(),
                Primitive::ResizeSurface { width, height } => {
                    self.resize(Viewport::new(*width, *height))
                }
                Primitive::DrawText { .. } => {
                    if !self.warned_text {
                        log::warn!("gpu backend: text primitives are not rendered");
                        self.warned_text = true;
                    }
                    self.telemetry.record_event("gpu_text_skipped");
                }
                _ => {
                    self.batch.push(cmd);
                }
            }
        }
    }

    fn end_frame(&mut self) {
        self.submit();
    }

    fn clear(&mut self) {
        self.batch.clear();
        self.submit();
    }

    fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::debug!("gpu: ignoring resize to {}x{}", viewport.width, viewport.height);
            return;
        }
        self.viewport = viewport;
        let size = texture_extent(&self.gpu, viewport);
        if size == self.target.texture.size() {
            return;
        }
        self.target = Target::new(&self.gpu, size, "mathcanvas target");
        if self.offscreen.is_some() {
            self.offscreen = Some(Target::new(&self.gpu, size, "mathcanvas offscreen target"));
        }
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}

/// Texture size for a logical viewport, clamped to device limits.
fn texture_extent(gpu: &Gpu, viewport: Viewport) -> wgpu::Extent3d {
    let max = gpu.device().limits().max_texture_dimension_2d;
    let clamp = |v: f64| (v.ceil().max(1.0) as u32).min(max);
    wgpu::Extent3d {
        width: clamp(viewport.width),
        height: clamp(viewport.height),
        depth_or_array_layers: 1,
    }
}
