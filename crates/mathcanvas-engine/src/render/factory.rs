use crate::coords::Viewport;
use crate::device::Gpu;

use super::canvas::CanvasBackend;
use super::gpu::GpuBackend;
use super::svg::SvgBackend;
use super::{BackendConfig, BackendError, BackendKind, Renderer};

/// Everything a backend constructor may need.
pub struct BackendRequest {
    pub viewport: Viewport,
    pub config: BackendConfig,
    /// Device for the GPU backend. `None` makes it unavailable.
    pub gpu: Option<Gpu>,
}

impl BackendRequest {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, config: BackendConfig::default(), gpu: None }
    }

    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_gpu(mut self, gpu: Gpu) -> Self {
        self.gpu = Some(gpu);
        self
    }
}

/// Constructs the first backend in `preference` that succeeds.
pub fn create_backend(
    preference: &[BackendKind],
    mut request: BackendRequest,
) -> Result<Box<dyn Renderer>, BackendError> {
    let mut attempted = Vec::with_capacity(preference.len());
    for &kind in preference {
        attempted.push(kind);
        match construct(kind, &mut request) {
            Ok(renderer) => {
                log::info!(
                    "render: using {kind} backend (offscreen: {})",
                    request.config.offscreen(kind)
                );
                return Ok(renderer);
            }
            Err(err) => log::warn!("render: {err}; trying next backend"),
        }
    }
    Err(BackendError::NoBackendAvailable { attempted })
}

fn construct(
    kind: BackendKind,
    request: &mut BackendRequest,
) -> Result<Box<dyn Renderer>, BackendError> {
    let viewport = request.viewport;
    let config = request.config;
    match kind {
        BackendKind::Canvas => Ok(Box::new(CanvasBackend::headless(viewport, &config)?)),
        BackendKind::Svg => Ok(Box::new(SvgBackend::new(viewport, &config)?)),
        BackendKind::Gpu => {
            let gpu = request.gpu.take().ok_or_else(|| BackendError::Unavailable {
                kind,
                reason: "no GPU device".into(),
            })?;
            match GpuBackend::new(gpu.clone(), viewport, &config) {
                Ok(backend) => Ok(Box::new(backend)),
                Err(err) => {
                    // Leave the device for a later GPU entry in the list.
                    request.gpu = Some(gpu);
                    Err(err)
                }
            }
        }
    }
}
