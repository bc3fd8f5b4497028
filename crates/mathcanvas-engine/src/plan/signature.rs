use crate::coords::{CoordinateMapper, Vec2, Viewport};
use crate::drawable::{
    AreaBoundary, AreaRegion, Bar, ClosedOutline, Drawable, FunctionPiece, PlotFunction, Shape,
};
use crate::paint::{Color, Theme};

use super::shapes::function::SampleWindow;
use super::PlanContext;

/// Mapper parameters a plan was built against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewKey {
    pub scale: f64,
    pub pan: Vec2,
    pub viewport: Viewport,
}

impl ViewKey {
    pub fn of(mapper: &CoordinateMapper) -> Self {
        Self {
            scale: mapper.scale(),
            pan: mapper.pan_offset(),
            viewport: mapper.viewport(),
        }
    }

    /// Pan delta if `self` differs from `other` by pan alone.
    pub fn pan_delta_to(&self, other: &ViewKey) -> Option<Vec2> {
        (self.scale == other.scale && self.viewport == other.viewport)
            .then(|| other.pan - self.pan)
    }
}

/// Everything that affects a plan's commands.
///
/// `content` holds the exact bit patterns of geometry, style, theme and any
/// kind-specific view-derived inputs (e.g. the sampling window of a function
/// plot); `view` holds the mapper parameters. Equality of both is the cache
/// hit condition. There is no hashing, so distinct inputs never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    content: Vec<u64>,
    view: ViewKey,
}

impl Signature {
    #[inline]
    pub fn view(&self) -> ViewKey {
        self.view
    }

    #[inline]
    pub fn same_content(&self, other: &Signature) -> bool {
        self.content == other.content
    }
}

/// Computes the signature of `drawable` under `ctx`.
///
/// Returns `None` if any input is non-finite; such drawables are never cached.
pub fn signature(drawable: &Drawable, ctx: &PlanContext<'_>) -> Option<Signature> {
    let mut w = SignatureWriter::default();
    w.u64(drawable.kind() as u64);
    w.words.extend_from_slice(&ctx.theme_words);

    match drawable.label.as_deref() {
        Some(label) => {
            w.bool(true);
            w.str(label);
        }
        None => w.bool(false),
    }

    let style = &drawable.style;
    w.opt_color(style.color);
    w.opt_f64(style.stroke_width);
    w.opt_color(style.fill);
    w.opt_f64(style.fill_opacity);
    w.opt_f64(style.font_size);

    write_shape(&mut w, &drawable.shape, ctx);

    w.finish(ViewKey::of(ctx.mapper))
}

fn write_shape(w: &mut SignatureWriter, shape: &Shape, ctx: &PlanContext<'_>) {
    match shape {
        Shape::Point(p) => w.point(p.position),
        Shape::Segment(s) | Shape::Vector(s) => {
            w.point(s.start);
            w.point(s.end);
        }
        Shape::Triangle(t) => t.vertices.iter().for_each(|&v| w.point(v)),
        Shape::Rectangle(r) => {
            w.point(r.corner);
            w.point(r.opposite);
        }
        Shape::Polygon(p) => {
            w.u64(p.vertices.len() as u64);
            p.vertices.iter().for_each(|&v| w.point(v));
        }
        Shape::Circle(c) => {
            w.point(c.center);
            w.f64(c.radius);
        }
        Shape::Ellipse(e) => {
            w.point(e.center);
            w.f64(e.radius_x);
            w.f64(e.radius_y);
            w.f64(e.rotation);
        }
        Shape::CircleArc(a) => {
            w.point(a.center);
            w.f64(a.radius);
            w.point(a.from);
            w.point(a.to);
            w.bool(a.major);
        }
        Shape::Angle(a) => {
            w.point(a.vertex);
            w.point(a.arm1);
            w.point(a.arm2);
            w.bool(a.reflex);
        }
        Shape::Function(f) => {
            w.function(&f.function);
            w.opt_range(f.domain);
            w.window(SampleWindow::for_mapper(ctx.mapper));
        }
        Shape::Parametric(p) => {
            w.function(&p.x);
            w.function(&p.y);
            w.f64(p.t_min);
            w.f64(p.t_max);
        }
        Shape::Piecewise(p) => {
            w.u64(p.pieces.len() as u64);
            p.pieces.iter().for_each(|piece| w.piece(piece));
            w.window(SampleWindow::for_mapper(ctx.mapper));
        }
        Shape::ColoredArea(a) => {
            w.boundary(&a.upper);
            w.boundary(&a.lower);
            w.opt_range(a.x_range);
            // Straight-sided regions are exact and do not depend on the window.
            if a.region() != AreaRegion::Segments {
                w.window(SampleWindow::for_mapper(ctx.mapper));
            }
        }
        Shape::ClosedArea(a) => w.outline(&a.outline),
        Shape::Bar(b) => w.bar(b),
        Shape::BarChart(c) => {
            let bars = c.bars();
            w.u64(bars.len() as u64);
            bars.iter().for_each(|b| w.bar(b));
        }
        Shape::Graph(g) => {
            w.u64(g.vertices.len() as u64);
            g.vertices.iter().for_each(|&v| w.point(v));
            w.u64(g.edges.len() as u64);
            for &(a, b) in &g.edges {
                w.u64(a as u64);
                w.u64(b as u64);
            }
            w.bool(g.directed);
            w.u64(g.vertex_labels.len() as u64);
            g.vertex_labels.iter().for_each(|l| w.str(l));
        }
        Shape::Label(l) => {
            w.point(l.position);
            w.str(&l.text);
            w.opt_f64(l.font_size);
            w.opt_f64(l.reference_scale);
        }
        Shape::Cartesian(c) => w.opt_f64(c.tick_spacing),
        Shape::PolarGrid(g) => {
            w.u64(g.angular_divisions as u64);
            w.opt_f64(g.radial_spacing);
        }
    }
}

/// Theme words shared by every signature in a frame.
pub(crate) fn theme_words(theme: &Theme) -> Vec<u64> {
    let mut w = SignatureWriter::default();
    w.str(&theme.font_family);
    for c in [
        theme.background,
        theme.default_color,
        theme.area_fill,
        theme.axis_color,
        theme.grid_color,
        theme.axis_label_color,
    ] {
        w.color(c);
    }
    for v in [
        theme.stroke_width,
        theme.point_radius,
        theme.point_label_font_size,
        theme.label_font_size,
        theme.label_min_font_px,
        theme.label_vanish_px,
        theme.label_line_height,
        theme.vector_tip_size,
        theme.angle_arc_radius,
        theme.angle_text_radius_factor,
        theme.angle_label_font_size,
        theme.circle_arc_radius_scale,
        theme.area_opacity,
        theme.bar_label_font_size,
        theme.bar_label_padding_px,
        theme.function_sample_px,
        theme.tick_size,
        theme.tick_font_size,
        theme.minor_grid_width,
        theme.min_grid_spacing_px,
    ] {
        w.f64(v);
    }
    w.words
}

// ── writer ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SignatureWriter {
    words: Vec<u64>,
    non_finite: bool,
}

impl SignatureWriter {
    #[inline]
    fn u64(&mut self, v: u64) {
        self.words.push(v);
    }

    #[inline]
    fn bool(&mut self, v: bool) {
        self.words.push(v as u64);
    }

    /// Exact bits; `-0.0` is folded into `0.0` since both map identically.
    #[inline]
    fn f64(&mut self, v: f64) {
        if !v.is_finite() {
            self.non_finite = true;
        }
        let v = if v == 0.0 { 0.0 } else { v };
        self.words.push(v.to_bits());
    }

    #[inline]
    fn point(&mut self, p: Vec2) {
        self.f64(p.x);
        self.f64(p.y);
    }

    fn opt_f64(&mut self, v: Option<f64>) {
        match v {
            Some(v) => {
                self.bool(true);
                self.f64(v);
            }
            None => self.bool(false),
        }
    }

    fn opt_range(&mut self, r: Option<(f64, f64)>) {
        match r {
            Some((a, b)) => {
                self.bool(true);
                self.f64(a);
                self.f64(b);
            }
            None => self.bool(false),
        }
    }

    fn color(&mut self, c: Color) {
        let packed = (c.r.to_bits() as u64) << 32 | c.g.to_bits() as u64;
        self.u64(packed);
        let packed = (c.b.to_bits() as u64) << 32 | c.a.to_bits() as u64;
        self.u64(packed);
        if !(c.r.is_finite() && c.g.is_finite() && c.b.is_finite() && c.a.is_finite()) {
            self.non_finite = true;
        }
    }

    fn opt_color(&mut self, c: Option<Color>) {
        match c {
            Some(c) => {
                self.bool(true);
                self.color(c);
            }
            None => self.bool(false),
        }
    }

    /// Length-prefixed, packed eight bytes per word.
    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        for chunk in s.as_bytes().chunks(8) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.u64(u64::from_le_bytes(buf));
        }
    }

    fn function(&mut self, f: &PlotFunction) {
        self.str(f.key());
        self.u64(f.identity() as u64);
    }

    fn boundary(&mut self, b: &AreaBoundary) {
        match b {
            AreaBoundary::Function(f) => {
                self.u64(0);
                self.function(f);
            }
            AreaBoundary::Segment { start, end } => {
                self.u64(1);
                self.point(*start);
                self.point(*end);
            }
            AreaBoundary::XAxis => self.u64(2),
        }
    }

    fn piece(&mut self, piece: &FunctionPiece) {
        self.function(&piece.function);
        self.opt_f64(piece.left);
        self.opt_f64(piece.right);
        self.bool(piece.left_inclusive);
        self.bool(piece.right_inclusive);
        self.u64(piece.undefined_at.len() as u64);
        piece.undefined_at.iter().for_each(|&x| self.f64(x));
    }

    fn opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.bool(true);
                self.str(s);
            }
            None => self.bool(false),
        }
    }

    fn bar(&mut self, bar: &Bar) {
        self.f64(bar.x_left);
        self.f64(bar.x_right);
        self.f64(bar.y_bottom);
        self.f64(bar.y_top);
        self.opt_str(bar.label_above.as_deref());
        self.opt_str(bar.label_below.as_deref());
    }

    fn outline(&mut self, outline: &ClosedOutline) {
        match outline {
            ClosedOutline::Polygon(vertices) => {
                self.u64(0);
                self.u64(vertices.len() as u64);
                vertices.iter().for_each(|&v| self.point(v));
            }
            ClosedOutline::Circle(c) => {
                self.u64(1);
                self.point(c.center);
                self.f64(c.radius);
            }
            ClosedOutline::Ellipse(e) => {
                self.u64(2);
                self.point(e.center);
                self.f64(e.radius_x);
                self.f64(e.radius_y);
                self.f64(e.rotation);
            }
            ClosedOutline::CircleSegment { circle, chord, clockwise } => {
                self.u64(3);
                self.point(circle.center);
                self.f64(circle.radius);
                self.point(chord.start);
                self.point(chord.end);
                self.bool(*clockwise);
            }
            ClosedOutline::EllipseSegment { ellipse, chord, clockwise } => {
                self.u64(4);
                self.point(ellipse.center);
                self.f64(ellipse.radius_x);
                self.f64(ellipse.radius_y);
                self.f64(ellipse.rotation);
                self.point(chord.start);
                self.point(chord.end);
                self.bool(*clockwise);
            }
        }
    }

    fn window(&mut self, window: SampleWindow) {
        self.u64(window.bucket_x as u64);
        self.u64(window.bucket_y as u64);
    }

    fn finish(self, view: ViewKey) -> Option<Signature> {
        (!self.non_finite).then(|| Signature {
            content: self.words,
            view,
        })
    }
}
