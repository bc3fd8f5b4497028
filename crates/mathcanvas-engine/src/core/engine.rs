use crate::coords::{CoordinateMapper, Vec2, Viewport};
use crate::drawable::{Drawable, DrawableId};
use crate::frame::{FrameConfig, FrameOrchestrator, FrameReport};
use crate::paint::Theme;
use crate::render::{BackendKind, Renderer};
use crate::telemetry::TelemetrySnapshot;

/// Owns everything a frame needs except the drawable list, which stays with
/// the embedding application.
pub struct Engine {
    mapper: CoordinateMapper,
    theme: Theme,
    orchestrator: FrameOrchestrator,
    renderer: Box<dyn Renderer>,
}

impl Engine {
    pub fn new(renderer: Box<dyn Renderer>, mapper: CoordinateMapper, config: FrameConfig) -> Self {
        Self {
            mapper,
            theme: Theme::default(),
            orchestrator: FrameOrchestrator::new(config),
            renderer,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Renders one frame. Pass `apply_zoom` after a pan or zoom gesture.
    pub fn draw(&mut self, drawables: &[Drawable], apply_zoom: bool) -> FrameReport {
        self.orchestrator.draw(
            drawables,
            &self.mapper,
            &self.theme,
            self.renderer.as_mut(),
            apply_zoom,
        )
    }

    /// Resizes the view and the renderer surface. Invalid sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            log::debug!("engine: ignoring resize to {width}x{height}");
            return;
        }
        self.mapper.resize(width, height);
        self.renderer.resize(viewport);
    }

    /// Screen-space pan.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.mapper.pan(dx, dy);
    }

    /// Zoom anchored at a screen point.
    pub fn zoom(&mut self, factor: f64, anchor: Vec2) {
        self.mapper.zoom(factor, anchor);
    }

    pub fn invalidate_drawable_cache(&mut self, id: Option<DrawableId>) {
        self.orchestrator.invalidate_drawable_cache(id);
    }

    #[inline]
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    #[inline]
    pub fn mapper_mut(&mut self) -> &mut CoordinateMapper {
        &mut self.mapper
    }

    #[inline]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replaces the theme. Every cached plan is dropped.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.orchestrator.invalidate_drawable_cache(None);
    }

    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.renderer.kind()
    }

    pub fn peek_telemetry(&self) -> TelemetrySnapshot {
        self.renderer.peek_telemetry()
    }

    pub fn drain_telemetry(&mut self) -> TelemetrySnapshot {
        self.renderer.drain_telemetry()
    }
}
