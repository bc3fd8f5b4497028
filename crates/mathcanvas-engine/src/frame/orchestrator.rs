use std::time::Instant;

use crate::cache::{CacheConfig, CacheOutcome, PlanCache};
use crate::coords::{CoordinateMapper, Rect, Vec2};
use crate::drawable::{Drawable, DrawableId, ShapeKind};
use crate::paint::Theme;
use crate::plan::{build_plan, Plan, PlanContext, RenderError};
use crate::primitive::Primitive;
use crate::render::Renderer;

use super::labels::{LabelConfig, LabelPlacer};

/// Viewport culling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CullConfig {
    pub enabled: bool,
    /// Extra screen margin kept around the viewport, in pixels.
    pub margin_px: f64,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self { enabled: true, margin_px: 64.0 }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameConfig {
    pub cache: CacheConfig,
    pub cull: CullConfig,
    pub labels: LabelConfig,
}

/// Per-frame outcome. `failures` is the side channel for build errors.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub frame: u64,
    /// Plans applied to the renderer.
    pub drawn: usize,
    pub culled: usize,
    pub built: usize,
    pub hits: usize,
    pub reprojected: usize,
    /// Plans drawn with their labels moved off an earlier label.
    pub labels_shifted: usize,
    pub failures: Vec<(DrawableId, RenderError)>,
}

/// Drives frames: owns the plan cache and the cull policy, borrows the
/// renderer per call.
#[derive(Debug, Default)]
pub struct FrameOrchestrator {
    cache: PlanCache,
    cull: CullConfig,
    labels: LabelPlacer,
}

impl FrameOrchestrator {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            cache: PlanCache::new(config.cache),
            cull: config.cull,
            labels: LabelPlacer::new(config.labels),
        }
    }

    #[inline]
    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    #[inline]
    pub fn cull_config(&self) -> CullConfig {
        self.cull
    }

    pub fn set_cull_config(&mut self, cull: CullConfig) {
        self.cull = cull;
    }

    #[inline]
    pub fn label_config(&self) -> LabelConfig {
        self.labels.config()
    }

    pub fn set_label_config(&mut self, labels: LabelConfig) {
        self.labels.set_config(labels);
    }

    /// Drops the cached plan of `id`, or every plan when `id` is `None`.
    pub fn invalidate_drawable_cache(&mut self, id: Option<DrawableId>) {
        match id {
            Some(id) => {
                self.cache.invalidate(id);
            }
            None => self.cache.invalidate_all(),
        }
    }

    /// Renders one frame of `drawables`.
    ///
    /// Drawables are applied by paint layer (axes, then areas, then the
    /// rest), keeping the caller's order within a layer. `apply_zoom` drops
    /// zoom-sensitive plans before anything is built. Culling uses the
    /// mapper's viewport, the one plans are built against.
    pub fn draw(
        &mut self,
        drawables: &[Drawable],
        mapper: &CoordinateMapper,
        theme: &Theme,
        renderer: &mut dyn Renderer,
        apply_zoom: bool,
    ) -> FrameReport {
        if apply_zoom {
            self.cache.invalidate_zoom_sensitive();
        }

        let frame = self.cache.begin_frame();
        renderer.begin_frame();
        renderer.telemetry_mut().record_frame();
        self.labels.reset();

        let mut report = FrameReport { frame, ..FrameReport::default() };
        let ctx = PlanContext::new(mapper, theme);
        if renderer.viewport() != mapper.viewport() {
            log::debug!(
                "frame {frame}: renderer viewport {:?} differs from mapper viewport {:?}",
                renderer.viewport(),
                mapper.viewport()
            );
        }
        let visible = mapper.viewport().rect();
        let keep = visible.inflate(self.cull.margin_px);

        let mut ordered: Vec<&Drawable> = drawables.iter().collect();
        ordered.sort_by_key(|d| d.kind().layer());

        for drawable in ordered {
            if self.precull(drawable, mapper, theme, visible) {
                report.culled += 1;
                renderer.telemetry_mut().record_skip();
                continue;
            }

            let built = self
                .cache
                .get_or_build(drawable, &ctx, renderer.telemetry_mut(), build_plan);
            let (outcome, plan) = match built {
                Ok(found) => found,
                Err(err) => {
                    log::warn!("frame {frame}: drawable {} skipped: {err}", drawable.id);
                    report.failures.push((drawable.id, err));
                    continue;
                }
            };
            match outcome {
                CacheOutcome::Built => report.built += 1,
                CacheOutcome::Hit => report.hits += 1,
                CacheOutcome::Reprojected => report.reprojected += 1,
            }

            if plan.is_empty() || (self.cull.enabled && !plan.intersects(keep)) {
                report.culled += 1;
                renderer.telemetry_mut().record_skip();
                continue;
            }

            let shifted = if self.labels.config().resolve_overlaps {
                shift_labels(&mut self.labels, plan, theme)
            } else {
                None
            };
            if shifted.is_some() {
                report.labels_shifted += 1;
            }

            let started = Instant::now();
            renderer.apply_plan(shifted.as_ref().unwrap_or(plan));
            renderer.telemetry_mut().record_apply(started.elapsed());
            report.drawn += 1;
        }

        let evicted = self.cache.end_frame();
        renderer.end_frame();

        log::debug!(
            "frame {frame}: drawn {} culled {} built {} hits {} reprojected {} labels shifted {} evicted {evicted}",
            report.drawn,
            report.culled,
            report.built,
            report.hits,
            report.reprojected,
            report.labels_shifted,
        );
        report
    }

    /// Whether `drawable` is certainly off screen, judged from its math
    /// extent alone. Drawables without a bounded extent are never pre-culled.
    fn precull(&self, drawable: &Drawable, mapper: &CoordinateMapper, theme: &Theme, visible: Rect) -> bool {
        if !self.cull.enabled || !self.cull.margin_px.is_finite() {
            return false;
        }
        let Some(extent) = drawable.math_extent() else { return false };
        let stroke = drawable.style.stroke_width.unwrap_or(theme.stroke_width);
        let pad = self.cull.margin_px + theme.point_radius.max(theme.vector_tip_size) + stroke;
        let area = mapper.math_rect_to_screen(extent).inflate(pad);
        area.is_finite() && !area.intersects(visible)
    }
}

/// Places the text of point and label plans. Returns a moved copy when the
/// placer picked a non-zero offset; the cached plan is never touched.
fn shift_labels(placer: &mut LabelPlacer, plan: &Plan, theme: &Theme) -> Option<Plan> {
    if !matches!(plan.kind, ShapeKind::Point | ShapeKind::Label) {
        return None;
    }
    let mut base: Option<Rect> = None;
    let mut font_px: f64 = 0.0;
    for cmd in &plan.commands {
        if let (Some(b), Primitive::DrawText { font, .. }) = (cmd.label_box(), cmd) {
            base = Some(base.map_or(b, |acc| acc.union(b)));
            font_px = font_px.max(font.size);
        }
    }
    let dy = placer.place(plan.drawable, base?, font_px * theme.label_line_height);
    if dy == 0.0 {
        return None;
    }
    let mut moved = plan.clone();
    for cmd in moved.commands.iter_mut().filter(|c| matches!(c, Primitive::DrawText { .. })) {
        cmd.translate(Vec2::new(0.0, dy));
    }
    moved.bounds = moved.commands.iter().filter_map(Primitive::bounds).reduce(Rect::union);
    Some(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::drawable::{
        AreaBoundary, Circle, ColoredArea, FunctionPlot, PlotFunction, Point, Segment,
    };
    use crate::plan::shapes::test_support::mapper;
    use crate::primitive::Primitive;
    use crate::render::canvas::{CanvasBackend, CanvasCall};
    use crate::render::svg::SvgBackend;
    use crate::render::BackendConfig;

    fn canvas() -> CanvasBackend {
        CanvasBackend::headless(Viewport::new(800.0, 600.0), &BackendConfig::default()).unwrap()
    }

    fn point(id: u64, x: f64, y: f64) -> Drawable {
        Drawable::new(id, Point { position: Vec2::new(x, y) })
    }

    fn circle(id: u64) -> Drawable {
        Drawable::new(id, Circle { center: Vec2::new(0.0, 0.0), radius: 1.0 })
    }

    fn parabola(id: u64) -> Drawable {
        Drawable::new(
            id,
            FunctionPlot { function: PlotFunction::new("x^2", |x| x * x), domain: None },
        )
    }

    // ── cache interplay ──

    #[test]
    fn unchanged_scene_hits() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        let scene = vec![circle(1), point(2, 1.0, 1.0)];

        let first = orch.draw(&scene, &m, &theme, &mut r, false);
        assert_eq!(first.built, 2);
        let builds = r.peek_telemetry().plan_build_count();
        let misses = r.peek_telemetry().plan_miss_count;

        let second = orch.draw(&scene, &m, &theme, &mut r, false);
        assert_eq!(second.hits, 2);
        assert_eq!(second.drawn, 2);
        assert_eq!(r.peek_telemetry().plan_build_count(), builds);
        assert_eq!(r.peek_telemetry().plan_miss_count, misses);
        assert_eq!(r.peek_telemetry().frames, 2);
    }

    #[test]
    fn zoom_rebuilds_circle_with_scaled_radius() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let mut m = mapper();
        let scene = vec![circle(1)];

        orch.draw(&scene, &m, &theme, &mut r, false);
        m.zoom(2.0, Vec2::new(400.0, 300.0));
        let report = orch.draw(&scene, &m, &theme, &mut r, true);
        assert_eq!(report.built, 1);

        let plan = orch.cache().peek(DrawableId(1)).unwrap();
        match &plan.commands[0] {
            Primitive::StrokeCircle { center, radius, .. } => {
                assert_eq!(*center, Vec2::new(400.0, 300.0));
                assert!((radius - 100.0).abs() < 1e-9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn apply_zoom_drops_only_zoom_sensitive_plans() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        let scene = vec![parabola(1), point(2, 0.0, 0.0)];

        orch.draw(&scene, &m, &theme, &mut r, false);
        let report = orch.draw(&scene, &m, &theme, &mut r, true);
        assert_eq!(report.built, 1);
        assert_eq!(report.hits, 1);
    }

    #[test]
    fn absent_drawable_is_evicted() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();

        orch.draw(&[circle(1), point(2, 0.0, 0.0)], &m, &theme, &mut r, false);
        assert!(orch.cache().contains(DrawableId(2)));
        orch.draw(&[circle(1)], &m, &theme, &mut r, false);
        assert!(!orch.cache().contains(DrawableId(2)));
        assert!(orch.cache().contains(DrawableId(1)));
    }

    #[test]
    fn explicit_invalidation() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        let scene = vec![circle(1), point(2, 0.0, 0.0)];

        orch.draw(&scene, &m, &theme, &mut r, false);
        orch.invalidate_drawable_cache(Some(DrawableId(1)));
        assert_eq!(orch.draw(&scene, &m, &theme, &mut r, false).built, 1);
        orch.invalidate_drawable_cache(None);
        assert_eq!(orch.draw(&scene, &m, &theme, &mut r, false).built, 2);
    }

    // ── fail-soft ──

    #[test]
    fn failing_drawable_does_not_abort_frame() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        let broken = Drawable::new(
            7,
            Segment { start: Vec2::new(f64::NAN, 0.0), end: Vec2::new(1.0, 1.0) },
        );
        let scene = vec![circle(1), broken, point(2, 1.0, 0.0)];

        let report = orch.draw(&scene, &m, &theme, &mut r, false);
        assert_eq!(report.drawn, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, DrawableId(7));
        assert!(matches!(report.failures[0].1, RenderError::NonFinite { .. }));
        assert!(!orch.cache().contains(DrawableId(7)));
        // end_frame ran: the next frame starts cleanly
        assert_eq!(orch.draw(&scene, &m, &theme, &mut r, false).hits, 2);
    }

    // ── culling ──

    #[test]
    fn offscreen_point_is_culled_without_building() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        // visible x range is [-8, 8]
        let report = orch.draw(&[point(1, 100.0, 0.0)], &m, &theme, &mut r, false);
        assert_eq!(report.culled, 1);
        assert_eq!(report.built, 0);
        assert!(!orch.cache().contains(DrawableId(1)));
        assert_eq!(r.peek_telemetry().plan_skip_count, 1);
    }

    #[test]
    fn margin_keeps_nearby_drawables() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let theme = Theme::default();
        let m = mapper();
        // 0.5 units (25 px) past the right edge
        let report = orch.draw(&[point(1, 8.5, 0.0)], &m, &theme, &mut r, false);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn culling_can_be_disabled() {
        let config = FrameConfig {
            cull: CullConfig { enabled: false, ..CullConfig::default() },
            ..FrameConfig::default()
        };
        let mut orch = FrameOrchestrator::new(config);
        let mut r = canvas();
        let report = orch.draw(&[point(1, 100.0, 0.0)], &mapper(), &Theme::default(), &mut r, false);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn culling_follows_the_mapper_viewport() {
        let theme = Theme::default();

        // surface 800x600, view 400x300: x = 650 is on the surface only
        let mut orch = FrameOrchestrator::default();
        let small = CoordinateMapper::with_pan(Viewport::new(400.0, 300.0), 50.0, Vec2::new(200.0, 150.0));
        let report = orch.draw(&[point(1, 9.0, 0.0)], &small, &theme, &mut canvas(), false);
        assert_eq!(report.culled, 1);
        assert_eq!(report.drawn, 0);

        // surface 400x300, view 800x600: x = 700 is in view
        let mut orch = FrameOrchestrator::default();
        let mut r = CanvasBackend::headless(Viewport::new(400.0, 300.0), &BackendConfig::default()).unwrap();
        let report = orch.draw(&[point(1, 6.0, 0.0)], &mapper(), &theme, &mut r, false);
        assert_eq!(report.drawn, 1);
        assert_eq!(report.culled, 0);
    }

    // ── labels ──

    fn label_y(r: &CanvasBackend, label: &str) -> f64 {
        r.surface()
            .calls()
            .iter()
            .find_map(|c| match c {
                CanvasCall::FillText { text, y, .. } if text == label => Some(*y),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn overlapping_point_labels_are_stacked() {
        let config = FrameConfig {
            labels: LabelConfig { resolve_overlaps: true, ..LabelConfig::default() },
            ..FrameConfig::default()
        };
        let mut orch = FrameOrchestrator::new(config);
        let mut r = canvas();
        let theme = Theme::default();
        let scene = vec![point(1, 0.0, 0.0).with_label("A"), point(2, 0.0, 0.0).with_label("B")];

        let report = orch.draw(&scene, &mapper(), &theme, &mut r, false);
        assert_eq!(report.labels_shifted, 1);
        assert!(label_y(&r, "B") - label_y(&r, "A") >= theme.point_label_font_size);

        // cached plans keep the unshifted layout
        let text_at = |id: u64| {
            orch.cache().peek(DrawableId(id)).unwrap().commands.iter().find_map(|c| match c {
                Primitive::DrawText { position, .. } => Some(*position),
                _ => None,
            })
        };
        assert_eq!(text_at(1), text_at(2));

        // placement restarts every frame, so a cache hit lands in the same spot
        let again = orch.draw(&scene, &mapper(), &theme, &mut r, false);
        assert_eq!(again.hits, 2);
        assert_eq!(again.labels_shifted, 1);
    }

    #[test]
    fn label_overlaps_are_kept_by_default() {
        let mut orch = FrameOrchestrator::default();
        let mut r = canvas();
        let scene = vec![point(1, 0.0, 0.0).with_label("A"), point(2, 0.0, 0.0).with_label("B")];
        let report = orch.draw(&scene, &mapper(), &Theme::default(), &mut r, false);
        assert_eq!(report.labels_shifted, 0);
        assert_eq!(label_y(&r, "A"), label_y(&r, "B"));
    }

    // ── ordering ──

    #[test]
    fn areas_paint_under_other_shapes() {
        let mut orch = FrameOrchestrator::default();
        let mut r = SvgBackend::new(Viewport::new(800.0, 600.0), &BackendConfig::default()).unwrap();
        let area = Drawable::new(
            5,
            ColoredArea {
                upper: AreaBoundary::Function(PlotFunction::new("1", |_| 1.0)),
                lower: AreaBoundary::XAxis,
                x_range: Some((-1.0, 1.0)),
            },
        );
        orch.draw(&[point(1, 0.0, 0.0), area], &mapper(), &Theme::default(), &mut r, false);

        let svg = r.to_svg_string();
        let area_at = svg.find("data-drawable=\"5\"").unwrap();
        let point_at = svg.find("data-drawable=\"1\"").unwrap();
        assert!(area_at < point_at);
    }

    // ── backend parity ──

    #[test]
    fn plans_do_not_depend_on_backend() {
        let theme = Theme::default();
        let m = mapper();
        let scene = vec![circle(1), point(2, 1.0, 2.0), parabola(3)];

        let mut a = FrameOrchestrator::default();
        let mut b = FrameOrchestrator::default();
        a.draw(&scene, &m, &theme, &mut canvas(), false);
        let mut svg = SvgBackend::new(Viewport::new(800.0, 600.0), &BackendConfig::default()).unwrap();
        b.draw(&scene, &m, &theme, &mut svg, false);

        for d in &scene {
            let pa = a.cache().peek(d.id).unwrap();
            let pb = b.cache().peek(d.id).unwrap();
            assert_eq!(pa.commands, pb.commands);
        }
    }
}
