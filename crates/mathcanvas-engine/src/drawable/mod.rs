//! Drawable model.
//!
//! Plain data describing what to draw, in math space. Drawables know nothing
//! about rendering; the embedding application owns and mutates them, and the
//! rendering core only borrows them for the duration of a frame.

mod function;
mod shape;

pub use function::PlotFunction;
pub use shape::{
    Angle, AreaBoundary, AreaRegion, Bar, BarChart, Cartesian, Circle, CircleArc, ClosedArea,
    ClosedOutline, ColoredArea, Ellipse, FunctionPiece, FunctionPlot, Graph, Label,
    ParametricCurve, PiecewiseFunction, Point, PolarGrid, Polygon, Rectangle, Segment, Shape,
    ShapeKind, Triangle,
};

use crate::coords::MathBounds;
use crate::paint::Color;

/// Stable drawable identity, assigned by the owning container.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub u64);

impl From<u64> for DrawableId {
    #[inline]
    fn from(v: u64) -> Self {
        DrawableId(v)
    }
}

impl std::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-drawable style overrides. `None` falls back to the theme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawableStyle {
    pub color: Option<Color>,
    pub stroke_width: Option<f64>,
    pub fill: Option<Color>,
    pub fill_opacity: Option<f64>,
    pub font_size: Option<f64>,
}

impl DrawableStyle {
    #[inline]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[inline]
    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    #[inline]
    pub fn with_fill(mut self, fill: Color, opacity: f64) -> Self {
        self.fill = Some(fill);
        self.fill_opacity = Some(opacity);
        self
    }

    #[inline]
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// A drawable math object: identity + geometry + style.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub id: DrawableId,
    /// Display name. Points draw it next to their marker.
    pub label: Option<String>,
    pub shape: Shape,
    pub style: DrawableStyle,
}

impl Drawable {
    pub fn new(id: impl Into<DrawableId>, shape: impl Into<Shape>) -> Self {
        Self {
            id: id.into(),
            label: None,
            shape: shape.into(),
            style: DrawableStyle::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: DrawableStyle) -> Self {
        self.style = style;
        self
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Math-space extent usable for culling before any plan is built.
    ///
    /// `None` when the on-screen extent cannot be bounded from geometry
    /// alone: sampled curves, the axes grid, and anything carrying text.
    pub fn math_extent(&self) -> Option<MathBounds> {
        if self.label.as_deref().is_some_and(|l| !l.is_empty()) {
            return None;
        }
        self.shape.math_extent()
    }
}
