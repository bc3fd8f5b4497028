use crate::coords::{MathBounds, Vec2};

use super::PlotFunction;

/// Geometry of a drawable, in math space.
///
/// Extending the model:
/// - add a struct + variant here and a matching [`ShapeKind`]
/// - add a builder under `plan::shapes::*`
/// - route it in `plan::build_plan` and `plan::signature`
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Segment(Segment),
    Vector(Segment),
    Triangle(Triangle),
    Rectangle(Rectangle),
    Polygon(Polygon),
    Circle(Circle),
    Ellipse(Ellipse),
    CircleArc(CircleArc),
    Angle(Angle),
    Function(FunctionPlot),
    Parametric(ParametricCurve),
    Piecewise(PiecewiseFunction),
    ColoredArea(ColoredArea),
    ClosedArea(ClosedArea),
    Bar(Bar),
    BarChart(BarChart),
    Graph(Graph),
    Label(Label),
    Cartesian(Cartesian),
    PolarGrid(PolarGrid),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Point,
    Segment,
    Vector,
    Triangle,
    Rectangle,
    Polygon,
    Circle,
    Ellipse,
    CircleArc,
    Angle,
    Function,
    Parametric,
    Piecewise,
    ColoredArea,
    ClosedArea,
    Bar,
    BarChart,
    Graph,
    Label,
    Cartesian,
    PolarGrid,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Segment => "segment",
            ShapeKind::Vector => "vector",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::CircleArc => "circle_arc",
            ShapeKind::Angle => "angle",
            ShapeKind::Function => "function",
            ShapeKind::Parametric => "parametric",
            ShapeKind::Piecewise => "piecewise_function",
            ShapeKind::ColoredArea => "colored_area",
            ShapeKind::ClosedArea => "closed_area",
            ShapeKind::Bar => "bar",
            ShapeKind::BarChart => "bar_chart",
            ShapeKind::Graph => "graph",
            ShapeKind::Label => "label",
            ShapeKind::Cartesian => "cartesian",
            ShapeKind::PolarGrid => "polar_grid",
        }
    }

    /// Paint layer: axes under areas, areas under everything else.
    #[inline]
    pub fn layer(self) -> u8 {
        match self {
            ShapeKind::Cartesian | ShapeKind::PolarGrid => 0,
            ShapeKind::ColoredArea | ShapeKind::ClosedArea => 1,
            _ => 2,
        }
    }
}

// ── shape payloads ────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub position: Vec2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec2; 3],
}

/// Axis-aligned rectangle spanned by two opposite corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub corner: Vec2,
    pub opposite: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

/// `rotation` is counter-clockwise in math space, radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipse {
    pub center: Vec2,
    pub radius_x: f64,
    pub radius_y: f64,
    pub rotation: f64,
}

/// Arc of a circle between the directions of two points. The minor arc is
/// drawn unless `major` is set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircleArc {
    pub center: Vec2,
    pub radius: f64,
    pub from: Vec2,
    pub to: Vec2,
    pub major: bool,
}

/// Angle at `vertex` between the rays towards `arm1` and `arm2`. The
/// interior (at most 180°) angle is drawn unless `reflex` is set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Angle {
    pub vertex: Vec2,
    pub arm1: Vec2,
    pub arm2: Vec2,
    pub reflex: bool,
}

/// Graph of `y = f(x)`, optionally restricted to a closed x domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPlot {
    pub function: PlotFunction,
    pub domain: Option<(f64, f64)>,
}

/// Curve `(x(t), y(t))` for `t` in `[t_min, t_max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricCurve {
    pub x: PlotFunction,
    pub y: PlotFunction,
    pub t_min: f64,
    pub t_max: f64,
}

/// One piece of a [`PiecewiseFunction`]. Missing bounds are unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPiece {
    pub function: PlotFunction,
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub left_inclusive: bool,
    pub right_inclusive: bool,
    /// Isolated points where the piece is undefined.
    pub undefined_at: Vec<f64>,
}

const HOLE_EPSILON: f64 = 1e-12;

impl FunctionPiece {
    /// Piece over `[left, right)`.
    pub fn new(function: PlotFunction, left: Option<f64>, right: Option<f64>) -> Self {
        Self {
            function,
            left,
            right,
            left_inclusive: true,
            right_inclusive: false,
            undefined_at: Vec::new(),
        }
    }

    pub fn with_holes(mut self, holes: impl IntoIterator<Item = f64>) -> Self {
        self.undefined_at.extend(holes);
        self
    }

    pub fn contains(&self, x: f64) -> bool {
        if !x.is_finite() || self.is_hole(x) {
            return false;
        }
        let after_left = match self.left {
            Some(l) if self.left_inclusive => x >= l,
            Some(l) => x > l,
            None => true,
        };
        let before_right = match self.right {
            Some(r) if self.right_inclusive => x <= r,
            Some(r) => x < r,
            None => true,
        };
        after_left && before_right
    }

    #[inline]
    pub fn is_hole(&self, x: f64) -> bool {
        self.undefined_at.iter().any(|h| (x - h).abs() <= HOLE_EPSILON)
    }

    /// `NaN` at holes; otherwise the piece's function, ignoring the interval.
    pub fn eval(&self, x: f64) -> f64 {
        if self.is_hole(x) { f64::NAN } else { self.function.eval(x) }
    }
}

/// Function defined by intervals. The first piece containing `x` wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PiecewiseFunction {
    pub pieces: Vec<FunctionPiece>,
}

impl PiecewiseFunction {
    pub fn new(pieces: Vec<FunctionPiece>) -> Self {
        Self { pieces }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.pieces
            .iter()
            .find(|p| p.contains(x))
            .map_or(f64::NAN, |p| p.function.eval(x))
    }
}

/// One side of a colored area.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaBoundary {
    Function(PlotFunction),
    /// Straight boundary; the area is limited to its x extent.
    Segment { start: Vec2, end: Vec2 },
    /// The x axis (`y = 0`).
    XAxis,
}

/// Region between two boundaries over an x range.
///
/// The range is the intersection of `x_range` (if any), the x extent of
/// segment boundaries, and the sampled window around the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredArea {
    pub upper: AreaBoundary,
    pub lower: AreaBoundary,
    pub x_range: Option<(f64, f64)>,
}

/// How a [`ColoredArea`] is sampled, derived from its sides.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AreaRegion {
    /// At least one curved side, no straight segment.
    Functions,
    /// A curve against a straight segment.
    FunctionSegment,
    /// Straight sides only; exact and independent of the view.
    Segments,
}

impl ColoredArea {
    pub fn region(&self) -> AreaRegion {
        let curved = |b: &AreaBoundary| matches!(b, AreaBoundary::Function(_));
        let straight = |b: &AreaBoundary| matches!(b, AreaBoundary::Segment { .. });
        let (upper, lower) = (&self.upper, &self.lower);
        if (curved(upper) && straight(lower)) || (straight(upper) && curved(lower)) {
            AreaRegion::FunctionSegment
        } else if curved(upper) || curved(lower) {
            AreaRegion::Functions
        } else {
            AreaRegion::Segments
        }
    }
}

/// Closed outline filled by a [`ClosedArea`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClosedOutline {
    Polygon(Vec<Vec2>),
    Circle(Circle),
    Ellipse(Ellipse),
    /// Region cut off by `chord`: the arc runs counter-clockwise from the
    /// first crossing to the second unless `clockwise` is set.
    CircleSegment { circle: Circle, chord: Segment, clockwise: bool },
    EllipseSegment { ellipse: Ellipse, chord: Segment, clockwise: bool },
}

/// Filled interior of a closed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedArea {
    pub outline: ClosedOutline,
}

/// Rectangle from `y_bottom` to `y_top`, with optional captions drawn
/// above and below it at a fixed pixel gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bar {
    pub x_left: f64,
    pub x_right: f64,
    pub y_bottom: f64,
    pub y_top: f64,
    pub label_above: Option<String>,
    pub label_below: Option<String>,
}

impl Bar {
    fn has_labels(&self) -> bool {
        [&self.label_above, &self.label_below]
            .into_iter()
            .any(|l| l.as_deref().is_some_and(|l| !l.is_empty()))
    }
}

/// Row of bars, one per value, laid out from `x_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub values: Vec<f64>,
    pub labels_below: Vec<String>,
    pub labels_above: Vec<String>,
    pub bar_width: f64,
    pub bar_spacing: f64,
    pub x_start: f64,
    pub y_base: f64,
}

impl BarChart {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            labels_below: Vec::new(),
            labels_above: Vec::new(),
            bar_width: 1.0,
            bar_spacing: 0.2,
            x_start: 0.0,
            y_base: 0.0,
        }
    }

    /// Bars for the finite values; a non-finite value leaves its slot empty.
    pub fn bars(&self) -> Vec<Bar> {
        let label = |labels: &[String], i: usize| labels.get(i).filter(|l| !l.is_empty()).cloned();
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| {
                let x_left = self.x_start + i as f64 * (self.bar_width + self.bar_spacing);
                Bar {
                    x_left,
                    x_right: x_left + self.bar_width,
                    y_bottom: self.y_base,
                    y_top: self.y_base + v,
                    label_above: label(&self.labels_above, i),
                    label_below: label(&self.labels_below, i),
                }
            })
            .collect()
    }
}

/// Vertices + edges. `vertex_labels` is indexed like `vertices`; missing or
/// empty entries draw no label.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub vertices: Vec<Vec2>,
    pub edges: Vec<(usize, usize)>,
    pub directed: bool,
    pub vertex_labels: Vec<String>,
}

/// Free text anchored at a math-space position.
///
/// With `reference_scale` set, the font shrinks proportionally when the view
/// is zoomed out past that scale and the label disappears once it would be
/// unreadably small.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Vec2,
    pub text: String,
    pub font_size: Option<f64>,
    pub reference_scale: Option<f64>,
}

/// Axes through the origin with a major/minor grid and tick labels.
///
/// `tick_spacing` pins the major spacing in math units; otherwise a
/// 1-2-5 spacing is derived from the current zoom.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Cartesian {
    pub tick_spacing: Option<f64>,
}

/// Concentric circles and radial lines around the origin.
///
/// `radial_spacing` pins the circle spacing in math units; otherwise it
/// follows the zoom like the cartesian grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PolarGrid {
    pub angular_divisions: u32,
    pub radial_spacing: Option<f64>,
}

impl Default for PolarGrid {
    fn default() -> Self {
        Self { angular_divisions: 12, radial_spacing: None }
    }
}

// ── conversions ───────────────────────────────────────────────────────────

macro_rules! impl_into_shape {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Shape {
            #[inline]
            fn from(v: $ty) -> Shape {
                Shape::$variant(v)
            }
        })*
    };
}

impl_into_shape!(
    Point => Point,
    Segment => Segment,
    Triangle => Triangle,
    Rectangle => Rectangle,
    Polygon => Polygon,
    Circle => Circle,
    Ellipse => Ellipse,
    CircleArc => CircleArc,
    Angle => Angle,
    FunctionPlot => Function,
    ParametricCurve => Parametric,
    PiecewiseFunction => Piecewise,
    ColoredArea => ColoredArea,
    ClosedArea => ClosedArea,
    Bar => Bar,
    BarChart => BarChart,
    Graph => Graph,
    Label => Label,
    Cartesian => Cartesian,
    PolarGrid => PolarGrid,
);

impl Shape {
    /// Vector from `start` to `end`; arrowhead at `end`.
    #[inline]
    pub fn vector(start: Vec2, end: Vec2) -> Shape {
        Shape::Vector(Segment { start, end })
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::Segment(_) => ShapeKind::Segment,
            Shape::Vector(_) => ShapeKind::Vector,
            Shape::Triangle(_) => ShapeKind::Triangle,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::CircleArc(_) => ShapeKind::CircleArc,
            Shape::Angle(_) => ShapeKind::Angle,
            Shape::Function(_) => ShapeKind::Function,
            Shape::Parametric(_) => ShapeKind::Parametric,
            Shape::Piecewise(_) => ShapeKind::Piecewise,
            Shape::ColoredArea(_) => ShapeKind::ColoredArea,
            Shape::ClosedArea(_) => ShapeKind::ClosedArea,
            Shape::Bar(_) => ShapeKind::Bar,
            Shape::BarChart(_) => ShapeKind::BarChart,
            Shape::Graph(_) => ShapeKind::Graph,
            Shape::Label(_) => ShapeKind::Label,
            Shape::Cartesian(_) => ShapeKind::Cartesian,
            Shape::PolarGrid(_) => ShapeKind::PolarGrid,
        }
    }

    /// Conservative math-space extent of the geometry, excluding any
    /// fixed-pixel decoration. `None` if unbounded or text-bearing.
    pub fn math_extent(&self) -> Option<MathBounds> {
        match self {
            Shape::Point(p) => bounds_of([p.position]),
            Shape::Segment(s) | Shape::Vector(s) => bounds_of([s.start, s.end]),
            Shape::Triangle(t) => bounds_of(t.vertices),
            Shape::Rectangle(r) => bounds_of([r.corner, r.opposite]),
            Shape::Polygon(p) => bounds_of(p.vertices.iter().copied()),
            Shape::Circle(c) => radial(c.center, c.radius),
            Shape::Ellipse(e) => radial(e.center, e.radius_x.abs().max(e.radius_y.abs())),
            Shape::CircleArc(a) => radial(a.center, a.radius),
            Shape::Graph(g) if g.vertex_labels.iter().all(String::is_empty) => {
                bounds_of(g.vertices.iter().copied())
            }
            Shape::Bar(b) if !b.has_labels() => bounds_of(bar_corners(b)),
            Shape::BarChart(c) if c.bars().iter().all(|b| !b.has_labels()) => {
                bounds_of(c.bars().iter().flat_map(bar_corners))
            }
            Shape::ClosedArea(a) => match &a.outline {
                ClosedOutline::Polygon(vertices) => bounds_of(vertices.iter().copied()),
                ClosedOutline::Circle(c) | ClosedOutline::CircleSegment { circle: c, .. } => {
                    radial(c.center, c.radius)
                }
                ClosedOutline::Ellipse(e) | ClosedOutline::EllipseSegment { ellipse: e, .. } => {
                    radial(e.center, e.radius_x.abs().max(e.radius_y.abs()))
                }
            },
            Shape::Graph(_)
            | Shape::Angle(_)
            | Shape::Function(_)
            | Shape::Parametric(_)
            | Shape::Piecewise(_)
            | Shape::ColoredArea(_)
            | Shape::Bar(_)
            | Shape::BarChart(_)
            | Shape::Label(_)
            | Shape::Cartesian(_)
            | Shape::PolarGrid(_) => None,
        }
    }
}

fn bounds_of<I: IntoIterator<Item = Vec2>>(points: I) -> Option<MathBounds> {
    let mut iter = points.into_iter();
    let first = iter.next().filter(|p| p.is_finite())?;
    let mut b = MathBounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in iter {
        // NaN would be swallowed by min/max; leave such drawables to the builder.
        if !p.is_finite() {
            return None;
        }
        b.min_x = b.min_x.min(p.x);
        b.min_y = b.min_y.min(p.y);
        b.max_x = b.max_x.max(p.x);
        b.max_y = b.max_y.max(p.y);
    }
    Some(b)
}

fn bar_corners(b: &Bar) -> [Vec2; 2] {
    [Vec2::new(b.x_left, b.y_bottom), Vec2::new(b.x_right, b.y_top)]
}

fn radial(center: Vec2, radius: f64) -> Option<MathBounds> {
    let r = radius.abs();
    if !(center.is_finite() && r.is_finite()) {
        return None;
    }
    Some(MathBounds {
        min_x: center.x - r,
        min_y: center.y - r,
        max_x: center.x + r,
        max_y: center.y + r,
    })
}
