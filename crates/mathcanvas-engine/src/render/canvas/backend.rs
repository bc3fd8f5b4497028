use std::f64::consts::TAU;

use crate::coords::{Vec2, Viewport};
use crate::paint::{Color, FontStyle, HorizontalAlign, LineCap, LineJoin, StrokeStyle, TextAlign, VerticalAlign};
use crate::plan::Plan;
use crate::primitive::Primitive;
use crate::render::backend::check_viewport;
use crate::render::{BackendConfig, BackendError, BackendKind, Renderer};
use crate::telemetry::Telemetry;

use super::{Canvas2d, RecordingCanvas};

/// Immediate-mode backend.
///
/// - `begin_frame` clears the surface
/// - context style is tracked and only re-set when it changes
/// - consecutive strokes with identical style share one path and a single
///   `stroke()` call, across plan boundaries
/// - with offscreen compositing, drawing goes to a hidden surface that is
///   copied to the visible one in `end_frame`
pub struct CanvasBackend<C: Canvas2d = RecordingCanvas> {
    visible: C,
    offscreen: Option<C>,
    viewport: Viewport,
    state: ContextState,
    telemetry: Telemetry,
}

/// Context state as last set on the surface.
#[derive(Debug, Default)]
struct ContextState {
    stroke_css: Option<String>,
    fill_css: Option<String>,
    line_width: Option<f64>,
    join: Option<LineJoin>,
    cap: Option<LineCap>,
    font: Option<String>,
    align: Option<HorizontalAlign>,
    baseline: Option<VerticalAlign>,
    /// Stroke style of the open, not yet stroked path.
    pending: Option<StrokeStyle>,
    pending_subpaths: u64,
}

impl CanvasBackend<RecordingCanvas> {
    /// Headless backend over recording surfaces.
    pub fn headless(viewport: Viewport, config: &BackendConfig) -> Result<Self, BackendError> {
        check_viewport(viewport)?;
        let make = || RecordingCanvas::new(viewport.width, viewport.height);
        let offscreen = config.offscreen_canvas.then(make);
        Ok(Self::from_surfaces(make(), offscreen, viewport))
    }
}

impl<C: Canvas2d> CanvasBackend<C> {
    /// Wraps caller-provided surfaces. `offscreen` enables compositing.
    pub fn from_surfaces(visible: C, offscreen: Option<C>, viewport: Viewport) -> Self {
        Self {
            visible,
            offscreen,
            viewport,
            state: ContextState::default(),
            telemetry: Telemetry::new(),
        }
    }

    /// The visible surface.
    #[inline]
    pub fn surface(&self) -> &C {
        &self.visible
    }

    #[inline]
    pub fn offscreen_surface(&self) -> Option<&C> {
        self.offscreen.as_ref()
    }

    fn painter(&mut self) -> Painter<'_, C> {
        let surface = match self.offscreen.as_mut() {
            Some(hidden) => hidden,
            None => &mut self.visible,
        };
        Painter {
            surface,
            state: &mut self.state,
            telemetry: &mut self.telemetry,
            viewport: self.viewport,
        }
    }

    fn draw(&mut self, cmd: &Primitive) {
        let mut p = self.painter();
        match cmd {
            Primitive::StrokeLine { from, to, stroke } => p.stroke_path(stroke, |c| {
                c.move_to(from.x, from.y);
                c.line_to(to.x, to.y);
            }),
            Primitive::StrokePolyline { points, stroke } => {
                if points.len() < 2 {
                    return;
                }
                p.stroke_path(stroke, |c| polyline(c, points));
            }
            Primitive::StrokeCircle { center, radius, stroke } => p.stroke_path(stroke, |c| {
                c.move_to(center.x + radius, center.y);
                c.arc(center.x, center.y, *radius, 0.0, TAU, false);
            }),
            Primitive::StrokeArc { center, radius, start_angle, end_angle, clockwise, stroke } => {
                p.stroke_path(stroke, |c| {
                    let start = *center + Vec2::from_polar(*radius, *start_angle);
                    c.move_to(start.x, start.y);
                    c.arc(center.x, center.y, *radius, *start_angle, *end_angle, !clockwise);
                })
            }
            Primitive::StrokeEllipse { center, radius_x, radius_y, rotation, stroke, fill } => {
                let path = |c: &mut C| {
                    let start = *center + Vec2::from_polar(*radius_x, *rotation);
                    c.move_to(start.x, start.y);
                    c.ellipse(center.x, center.y, *radius_x, *radius_y, *rotation, 0.0, TAU, false);
                };
                match fill {
                    Some(fill) => p.fill_path(fill.effective_color(), Some(stroke), path),
                    None => p.stroke_path(stroke, path),
                }
            }
            Primitive::FillCircle { center, radius, fill, stroke, .. } => {
                p.fill_path(fill.effective_color(), stroke.as_ref(), |c| {
                    c.arc(center.x, center.y, *radius, 0.0, TAU, false);
                })
            }
            Primitive::FillPolygon { points, fill, stroke, .. } => {
                if points.len() < 3 {
                    return;
                }
                p.fill_path(fill.effective_color(), stroke.as_ref(), |c| {
                    polyline(c, points);
                    c.close_path();
                })
            }
            Primitive::FillJoinedArea { forward, reverse, fill } => {
                if forward.len() + reverse.len() < 3 {
                    return;
                }
                p.fill_path(fill.effective_color(), None, |c| {
                    let mut all = forward.iter().chain(reverse.iter());
                    if let Some(first) = all.next() {
                        c.move_to(first.x, first.y);
                    }
                    all.for_each(|q| c.line_to(q.x, q.y));
                    c.close_path();
                })
            }
            Primitive::DrawText { text, position, font, color, align } => {
                p.text(text, *position, font, *color, *align)
            }
            Primitive::ClearSurface => p.clear_all(),
            Primitive::ResizeSurface { width, height } => {
                self.resize(Viewport::new(*width, *height))
            }
        }
    }
}

fn polyline<C: Canvas2d>(c: &mut C, points: &[Vec2]) {
    if let Some((first, rest)) = points.split_first() {
        c.move_to(first.x, first.y);
        rest.iter().for_each(|q| c.line_to(q.x, q.y));
    }
}

impl<C: Canvas2d> Renderer for CanvasBackend<C> {
    fn kind(&self) -> BackendKind {
        BackendKind::Canvas
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn begin_frame(&mut self) {
        self.painter().clear_all();
    }

    fn apply_plan(&mut self, plan: &Plan) {
        for cmd in &plan.commands {
            self.draw(cmd);
        }
    }

    fn end_frame(&mut self) {
        self.painter().flush();
        let Some(hidden) = self.offscreen.as_ref() else { return };
        let vp = self.viewport;
        self.visible.clear_rect(0.0, 0.0, vp.width, vp.height);
        self.visible.draw_surface(hidden);
        self.telemetry.record_event("canvas_composite");
    }

    fn clear(&mut self) {
        self.painter().clear_all();
        if self.offscreen.is_some() {
            let vp = self.viewport;
            self.visible.clear_rect(0.0, 0.0, vp.width, vp.height);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::debug!("canvas: ignoring resize to {}x{}", viewport.width, viewport.height);
            return;
        }
        // A batched stroke belongs to the old bitmap.
        self.painter().flush();
        self.viewport = viewport;
        self.visible.set_size(viewport.width, viewport.height);
        if let Some(hidden) = self.offscreen.as_mut() {
            hidden.set_size(viewport.width, viewport.height);
        }
        // A resized canvas starts from default context state.
        self.state = ContextState::default();
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}

// ── painter ───────────────────────────────────────────────────────────────

/// Borrowed view of the active surface plus the state that shadows it.
struct Painter<'a, C: Canvas2d> {
    surface: &'a mut C,
    state: &'a mut ContextState,
    telemetry: &'a mut Telemetry,
    viewport: Viewport,
}

impl<C: Canvas2d> Painter<'_, C> {
    /// Strokes the open batched path, if any.
    fn flush(&mut self) {
        if self.state.pending.take().is_none() {
            return;
        }
        self.surface.stroke();
        self.telemetry.record_event("canvas_stroke");
        let merged = self.state.pending_subpaths.saturating_sub(1);
        self.telemetry.record_events("canvas_batched_subpaths", merged);
        self.state.pending_subpaths = 0;
    }

    fn clear_all(&mut self) {
        self.flush();
        let vp = self.viewport;
        self.surface.clear_rect(0.0, 0.0, vp.width, vp.height);
        self.telemetry.record_event("canvas_clear");
    }

    fn stroke_path(&mut self, stroke: &StrokeStyle, path: impl FnOnce(&mut C)) {
        if stroke.width <= 0.0 {
            return;
        }
        if self.state.pending.as_ref() == Some(stroke) {
            path(&mut *self.surface);
            self.state.pending_subpaths += 1;
            return;
        }
        self.flush();
        self.apply_stroke(stroke);
        self.surface.begin_path();
        path(&mut *self.surface);
        self.state.pending = Some(*stroke);
        self.state.pending_subpaths = 1;
    }

    fn fill_path(&mut self, color: Color, stroke: Option<&StrokeStyle>, path: impl FnOnce(&mut C)) {
        self.flush();
        self.apply_fill(color);
        self.surface.begin_path();
        path(&mut *self.surface);
        self.surface.fill();
        self.telemetry.record_event("canvas_fill");

        if let Some(stroke) = stroke.filter(|s| s.width > 0.0) {
            self.apply_stroke(stroke);
            self.surface.stroke();
            self.telemetry.record_event("canvas_stroke");
        }
    }

    fn text(&mut self, text: &str, at: Vec2, font: &FontStyle, color: Color, align: TextAlign) {
        if text.is_empty() || font.size <= 0.0 {
            return;
        }
        self.flush();
        self.apply_fill(color);

        let css = font.to_css();
        if self.state.font.as_deref() != Some(css.as_str()) {
            self.surface.set_font(&css);
            self.state.font = Some(css);
            self.telemetry.record_event("canvas_style_set");
        }
        if self.state.align != Some(align.horizontal) {
            self.surface.set_text_align(match align.horizontal {
                HorizontalAlign::Left => "left",
                HorizontalAlign::Center => "center",
                HorizontalAlign::Right => "right",
            });
            self.state.align = Some(align.horizontal);
            self.telemetry.record_event("canvas_style_set");
        }
        if self.state.baseline != Some(align.vertical) {
            self.surface.set_text_baseline(match align.vertical {
                VerticalAlign::Top => "top",
                VerticalAlign::Middle => "middle",
                VerticalAlign::Alphabetic => "alphabetic",
                VerticalAlign::Bottom => "bottom",
            });
            self.state.baseline = Some(align.vertical);
            self.telemetry.record_event("canvas_style_set");
        }

        self.surface.fill_text(text, at.x, at.y);
        self.telemetry.record_event("canvas_text");
    }

    fn apply_stroke(&mut self, stroke: &StrokeStyle) {
        let css = stroke.color.to_css();
        if self.state.stroke_css.as_deref() != Some(css.as_str()) {
            self.surface.set_stroke_style(&css);
            self.state.stroke_css = Some(css);
            self.telemetry.record_event("canvas_style_set");
        }
        if self.state.line_width != Some(stroke.width) {
            self.surface.set_line_width(stroke.width);
            self.state.line_width = Some(stroke.width);
            self.telemetry.record_event("canvas_style_set");
        }
        if self.state.join != Some(stroke.join) {
            self.surface.set_line_join(stroke.join.as_str());
            self.state.join = Some(stroke.join);
            self.telemetry.record_event("canvas_style_set");
        }
        if self.state.cap != Some(stroke.cap) {
            self.surface.set_line_cap(stroke.cap.as_str());
            self.state.cap = Some(stroke.cap);
            self.telemetry.record_event("canvas_style_set");
        }
    }

    fn apply_fill(&mut self, color: Color) {
        let css = color.to_css();
        if self.state.fill_css.as_deref() != Some(css.as_str()) {
            self.surface.set_fill_style(&css);
            self.state.fill_css = Some(css);
            self.telemetry.record_event("canvas_style_set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{DrawableId, ShapeKind};
    use crate::paint::FillStyle;
    use crate::render::canvas::CanvasCall;

    fn backend(offscreen: bool) -> CanvasBackend {
        let config = BackendConfig { offscreen_canvas: offscreen, ..BackendConfig::default() };
        CanvasBackend::headless(Viewport::new(800.0, 600.0), &config).unwrap()
    }

    fn plan(id: u64, commands: Vec<Primitive>) -> Plan {
        Plan {
            drawable: DrawableId(id),
            kind: ShapeKind::Segment,
            commands,
            bounds: None,
            signature: None,
            zoom_sensitive: false,
            reprojectable: true,
        }
    }

    fn line(x: f64, color: Color) -> Primitive {
        Primitive::StrokeLine {
            from: Vec2::new(x, 0.0),
            to: Vec2::new(x, 10.0),
            stroke: StrokeStyle::new(color, 1.0),
        }
    }

    fn count(b: &CanvasBackend, call: fn(&CanvasCall) -> bool) -> usize {
        b.surface().count(call)
    }

    // ── batching ──

    #[test]
    fn same_style_strokes_share_one_path() {
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(1, vec![line(1.0, Color::BLACK)]));
        b.apply_plan(&plan(2, vec![line(2.0, Color::BLACK), line(3.0, Color::BLACK)]));
        b.end_frame();

        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Stroke)), 1);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::BeginPath)), 1);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::MoveTo(..))), 3);
        assert_eq!(b.peek_telemetry().event("canvas_batched_subpaths"), 2);
    }

    #[test]
    fn style_change_breaks_the_batch() {
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(1, vec![line(1.0, Color::BLACK), line(2.0, Color::GREY)]));
        b.end_frame();

        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Stroke)), 2);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::StrokeStyle(_))), 2);
        // width, join and cap are set once and then reused
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::LineWidth(_))), 1);
    }

    #[test]
    fn style_is_not_reissued_across_frames() {
        let mut b = backend(false);
        for _ in 0..2 {
            b.begin_frame();
            b.apply_plan(&plan(1, vec![line(1.0, Color::BLACK)]));
            b.end_frame();
        }
        // History was cleared by the second begin_frame; no style set since.
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::StrokeStyle(_))), 0);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Stroke)), 1);
    }

    // ── shapes ──

    #[test]
    fn fill_circle_with_outline() {
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(
            1,
            vec![Primitive::FillCircle {
                center: Vec2::new(10.0, 10.0),
                radius: 3.0,
                fill: FillStyle::with_opacity(Color::BLACK, 0.5),
                stroke: Some(StrokeStyle::new(Color::BLACK, 1.0)),
                screen_space: true,
            }],
        ));
        b.end_frame();

        let calls = b.surface().calls();
        assert!(calls.contains(&CanvasCall::FillStyle("rgba(0, 0, 0, 0.502)".into())));
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Fill)), 1);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Stroke)), 1);
    }

    #[test]
    fn arc_direction_maps_to_anticlockwise_flag() {
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(
            1,
            vec![Primitive::StrokeArc {
                center: Vec2::new(50.0, 50.0),
                radius: 20.0,
                start_angle: 0.0,
                end_angle: -1.0,
                clockwise: false,
                stroke: StrokeStyle::new(Color::BLACK, 1.0),
            }],
        ));
        b.end_frame();
        assert!(b.surface().calls().iter().any(|c| matches!(
            c,
            CanvasCall::Arc { anticlockwise: true, end, .. } if *end == -1.0
        )));
    }

    #[test]
    fn text_state_is_deduplicated() {
        let text = |s: &str| Primitive::DrawText {
            text: s.into(),
            position: Vec2::new(1.0, 2.0),
            font: FontStyle::new("serif", 10.0),
            color: Color::BLACK,
            align: TextAlign::default(),
        };
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(1, vec![text("a"), text("b")]));
        b.end_frame();

        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Font(_))), 1);
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::FillText { .. })), 2);
    }

    // ── compositing ──

    #[test]
    fn offscreen_composites_once() {
        let mut b = backend(true);
        b.begin_frame();
        b.apply_plan(&plan(1, vec![line(1.0, Color::BLACK)]));
        b.end_frame();

        let hidden = b.offscreen_surface().unwrap();
        assert!(hidden.calls().contains(&CanvasCall::Stroke));
        assert_eq!(
            b.surface().calls().last(),
            Some(&CanvasCall::DrawSurface { source_calls: hidden.calls().len() })
        );
        assert_eq!(count(&b, |c| matches!(c, CanvasCall::Stroke)), 0);
        assert_eq!(b.peek_telemetry().event("canvas_composite"), 1);
    }

    #[test]
    fn resize_resets_surface() {
        let mut b = backend(false);
        b.resize(Viewport::new(400.0, 300.0));
        assert_eq!(b.surface().size(), (400.0, 300.0));
        b.resize(Viewport::new(0.0, 300.0));
        assert_eq!(b.viewport(), Viewport::new(400.0, 300.0));
    }

    #[test]
    fn resize_command_strokes_the_pending_batch() {
        let mut b = backend(false);
        b.begin_frame();
        b.apply_plan(&plan(
            1,
            vec![
                line(1.0, Color::BLACK),
                Primitive::ResizeSurface { width: 400.0, height: 300.0 },
                line(2.0, Color::BLACK),
            ],
        ));
        b.end_frame();

        assert_eq!(b.peek_telemetry().event("canvas_stroke"), 2);
        assert_eq!(b.peek_telemetry().event("canvas_batched_subpaths"), 0);
        assert_eq!(b.surface().size(), (400.0, 300.0));
    }
}
