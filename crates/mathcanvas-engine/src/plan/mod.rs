//! Plan building.
//!
//! Responsibilities:
//! - compile a [`Drawable`] into an ordered list of screen-space [`Primitive`]s
//! - compute the [`Signature`] that decides whether a cached plan is reusable
//! - compute conservative screen bounds for culling
//!
//! Builders are pure: the same drawable, mapper and theme always produce the
//! same plan. Shape-specific code lives in one file per shape under
//! `plan::shapes`.

mod error;
mod signature;
pub(crate) mod shapes;

pub use error::RenderError;
pub use signature::{signature, Signature, ViewKey};

use crate::coords::{CoordinateMapper, Rect, Vec2};
use crate::drawable::{AreaRegion, Drawable, DrawableId, Shape, ShapeKind};
use crate::paint::Theme;
use crate::primitive::Primitive;

/// Inputs shared by every build in a frame.
pub struct PlanContext<'a> {
    pub mapper: &'a CoordinateMapper,
    pub theme: &'a Theme,
    theme_words: Vec<u64>,
}

impl<'a> PlanContext<'a> {
    pub fn new(mapper: &'a CoordinateMapper, theme: &'a Theme) -> Self {
        Self {
            mapper,
            theme,
            theme_words: signature::theme_words(theme),
        }
    }
}

/// Backend-neutral commands for one drawable at one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub drawable: DrawableId,
    pub kind: ShapeKind,
    pub commands: Vec<Primitive>,
    /// Union of command bounds. `None` for an empty plan.
    pub bounds: Option<Rect>,
    /// `None` when inputs were not signable; such plans are never reused.
    pub signature: Option<Signature>,
    /// Evicted by zoom-triggered invalidation (`draw(apply_zoom = true)`).
    pub zoom_sensitive: bool,
    /// Can be translated instead of rebuilt when only the pan changed.
    pub reprojectable: bool,
}

impl Plan {
    pub fn empty(drawable: &Drawable) -> Self {
        let kind = drawable.kind();
        let zoom_sensitive = match &drawable.shape {
            Shape::Label(l) => l.reference_scale.is_some(),
            Shape::ColoredArea(a) => a.region() != AreaRegion::Segments,
            Shape::Cartesian(_)
            | Shape::PolarGrid(_)
            | Shape::Angle(_)
            | Shape::Function(_)
            | Shape::Piecewise(_)
            | Shape::Parametric(_) => true,
            _ => false,
        };
        Self {
            drawable: drawable.id,
            kind,
            commands: Vec::new(),
            bounds: None,
            signature: None,
            zoom_sensitive,
            // Grids span the viewport; a translated copy would leave gaps.
            reprojectable: !matches!(kind, ShapeKind::Cartesian | ShapeKind::PolarGrid),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether any part of the plan may land inside `area`.
    #[inline]
    pub fn intersects(&self, area: Rect) -> bool {
        self.bounds.is_some_and(|b| b.intersects(area))
    }

    pub(crate) fn push(&mut self, cmd: Primitive) {
        if let Some(b) = cmd.bounds() {
            self.bounds = Some(match self.bounds {
                Some(acc) => acc.union(b),
                None => b,
            });
        }
        self.commands.push(cmd);
    }

    /// Shifts the whole plan by a screen-space delta.
    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.commands.iter_mut().for_each(|c| c.translate(delta));
        self.bounds = self.bounds.map(|b| b.translate(delta));
    }
}

/// Builds the plan for one drawable. Pure; never touches a cache.
pub fn build_plan(drawable: &Drawable, ctx: &PlanContext<'_>) -> Result<Plan, RenderError> {
    use shapes::*;

    let mut plan = Plan::empty(drawable);
    let styled = Styled::resolve(drawable, ctx.theme)?;
    let label = drawable.label.as_deref().filter(|l| !l.is_empty());

    match &drawable.shape {
        Shape::Point(p) => point::build(&mut plan, p, label, &styled, ctx)?,
        Shape::Segment(s) => segment::build_segment(&mut plan, s, &styled, ctx)?,
        Shape::Vector(s) => segment::build_vector(&mut plan, s, &styled, ctx)?,
        Shape::Triangle(t) => polygon::build(&mut plan, &t.vertices, &styled, ctx)?,
        Shape::Rectangle(r) => polygon::build_rectangle(&mut plan, r, &styled, ctx)?,
        Shape::Polygon(p) => polygon::build(&mut plan, &p.vertices, &styled, ctx)?,
        Shape::Circle(c) => circle::build_circle(&mut plan, c, &styled, ctx)?,
        Shape::Ellipse(e) => circle::build_ellipse(&mut plan, e, &styled, ctx)?,
        Shape::CircleArc(a) => circle::build_arc(&mut plan, a, &styled, ctx)?,
        Shape::Angle(a) => angle::build(&mut plan, a, &styled, ctx)?,
        Shape::Function(f) => function::build_function(&mut plan, f, &styled, ctx)?,
        Shape::Parametric(p) => function::build_parametric(&mut plan, p, &styled, ctx)?,
        Shape::Piecewise(p) => function::build_piecewise(&mut plan, p, &styled, ctx)?,
        Shape::ColoredArea(a) => area::build(&mut plan, a, &styled, ctx)?,
        Shape::ClosedArea(a) => closed::build(&mut plan, a, &styled, ctx)?,
        Shape::Bar(b) => bar::build(&mut plan, b, &styled, ctx)?,
        Shape::BarChart(c) => bar::build_chart(&mut plan, c, &styled, ctx)?,
        Shape::Graph(g) => graph::build(&mut plan, g, &styled, ctx)?,
        Shape::Label(l) => label::build(&mut plan, l, &styled, ctx)?,
        Shape::Cartesian(c) => cartesian::build(&mut plan, c, &styled, ctx)?,
        Shape::PolarGrid(g) => polar::build(&mut plan, g, &styled, ctx)?,
    }

    plan.signature = signature(drawable, ctx);
    Ok(plan)
}
