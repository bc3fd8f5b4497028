//! Per-shape plan builders and the helpers they share.
//!
//! Conventions:
//! - math-space inputs are validated (finite) before mapping
//! - degenerate but finite geometry yields no commands, not an error
//! - fixed-pixel decorations (markers, arrowheads, labels) are laid out
//!   around an anchor that was mapped exactly once

pub(crate) mod angle;
pub(crate) mod area;
pub(crate) mod bar;
pub(crate) mod cartesian;
pub(crate) mod circle;
pub(crate) mod closed;
pub(crate) mod function;
pub(crate) mod graph;
pub(crate) mod label;
pub(crate) mod point;
pub(crate) mod polar;
pub(crate) mod polygon;
pub(crate) mod segment;

use crate::coords::Vec2;
use crate::drawable::{Drawable, ShapeKind};
use crate::paint::{Color, FillStyle, FontStyle, StrokeStyle, TextAlign, Theme};
use crate::primitive::Primitive;

use super::{Plan, PlanContext, RenderError};

/// Screen-space lengths below this are treated as zero.
pub(crate) const EPSILON_PX: f64 = 1e-9;

/// Drawable style resolved against the theme.
pub(crate) struct Styled<'a> {
    pub kind: ShapeKind,
    pub color: Color,
    /// The drawable pinned its color instead of taking the theme default.
    pub color_set: bool,
    pub stroke: StrokeStyle,
    pub fill: Option<FillStyle>,
    pub font_size: Option<f64>,
    pub theme: &'a Theme,
}

impl<'a> Styled<'a> {
    pub(crate) fn resolve(drawable: &Drawable, theme: &'a Theme) -> Result<Self, RenderError> {
        let kind = drawable.kind();
        let style = &drawable.style;

        let width = style.stroke_width.unwrap_or(theme.stroke_width);
        if !width.is_finite() {
            return Err(RenderError::non_finite(kind, "stroke_width"));
        }
        if width < 0.0 {
            return Err(RenderError::invalid(kind, format!("negative stroke width {width}")));
        }
        let opacity = style.fill_opacity.unwrap_or(1.0);
        if !opacity.is_finite() {
            return Err(RenderError::non_finite(kind, "fill_opacity"));
        }
        if let Some(size) = style.font_size {
            if !size.is_finite() {
                return Err(RenderError::non_finite(kind, "font_size"));
            }
        }

        let color = style.color.unwrap_or(theme.default_color);
        Ok(Self {
            kind,
            color,
            color_set: style.color.is_some(),
            stroke: StrokeStyle::new(color, width),
            fill: style.fill.map(|c| FillStyle::with_opacity(c, opacity)),
            font_size: style.font_size.filter(|s| *s > 0.0),
            theme,
        })
    }

    pub(crate) fn font(&self, default_size: f64) -> FontStyle {
        FontStyle::new(self.theme.font_family.clone(), self.font_size.unwrap_or(default_size))
    }

    #[inline]
    pub(crate) fn non_finite(&self, field: &'static str) -> RenderError {
        RenderError::non_finite(self.kind, field)
    }
}

// ── validation + mapping ──────────────────────────────────────────────────

#[inline]
pub(crate) fn finite(styled: &Styled<'_>, v: f64, field: &'static str) -> Result<f64, RenderError> {
    if v.is_finite() { Ok(v) } else { Err(styled.non_finite(field)) }
}

/// Validates a math-space point and maps it to screen space.
#[inline]
pub(crate) fn to_screen(
    ctx: &PlanContext<'_>,
    styled: &Styled<'_>,
    p: Vec2,
    field: &'static str,
) -> Result<Vec2, RenderError> {
    if p.is_finite() {
        Ok(ctx.mapper.math_to_screen(p))
    } else {
        Err(styled.non_finite(field))
    }
}

// ── shared decorations ────────────────────────────────────────────────────

/// Filled triangle of side `size` pixels with its tip at `tip`, pointing
/// away from `tail`. `None` if the direction is undefined.
///
/// The triangle height is clamped to the tail distance so a very short
/// vector never grows an arrowhead longer than itself.
pub(crate) fn arrowhead(tail: Vec2, tip: Vec2, size: f64) -> Option<[Vec2; 3]> {
    let d = tip - tail;
    let len = d.length();
    if len < EPSILON_PX || size <= 0.0 {
        return None;
    }
    let dir = d / len;
    let perp = Vec2::new(-dir.y, dir.x);
    let half_base = size * 0.5;
    let height = (size * size - half_base * half_base).max(0.0).sqrt().min(len);
    let base = tip - dir * height;
    Some([tip, base + perp * half_base, base - perp * half_base])
}

/// Name label next to a point marker: offset right and up by the marker
/// radius, in fixed pixels.
pub(crate) fn push_point_label(
    plan: &mut Plan,
    anchor: Vec2,
    radius: f64,
    text: &str,
    color: Color,
    styled: &Styled<'_>,
) {
    plan.push(Primitive::DrawText {
        text: text.to_string(),
        position: Vec2::new(anchor.x + radius, anchor.y - radius),
        font: styled.font(styled.theme.point_label_font_size),
        color,
        align: TextAlign::default(),
    });
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::coords::{CoordinateMapper, Vec2, Viewport};
    use crate::drawable::Drawable;
    use crate::paint::Theme;
    use crate::plan::{build_plan, Plan, PlanContext};

    /// scale 50 px/unit, origin at (400, 300), 800x600 viewport.
    pub(crate) fn mapper() -> CoordinateMapper {
        CoordinateMapper::with_pan(Viewport::new(800.0, 600.0), 50.0, Vec2::new(400.0, 300.0))
    }

    pub(crate) fn build(drawable: &Drawable, mapper: &CoordinateMapper) -> Plan {
        let theme = Theme::default();
        let ctx = PlanContext::new(mapper, &theme);
        build_plan(drawable, &ctx).expect("plan builds")
    }

    pub(crate) fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * (1.0 + b.abs())
    }

    pub(crate) fn approx_pt(a: Vec2, b: Vec2) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrowhead_points_along_direction() {
        let [tip, b1, b2] = arrowhead(Vec2::zero(), Vec2::new(100.0, 0.0), 12.0).unwrap();
        assert_eq!(tip, Vec2::new(100.0, 0.0));
        let h = (144.0f64 - 36.0).sqrt();
        assert!((b1.x - (100.0 - h)).abs() < 1e-9);
        assert!((b1.y - 6.0).abs() < 1e-9);
        assert!((b2.y + 6.0).abs() < 1e-9);
    }

    #[test]
    fn arrowhead_clamped_to_short_vectors() {
        let [_, b1, _] = arrowhead(Vec2::zero(), Vec2::new(2.0, 0.0), 12.0).unwrap();
        assert!((b1.x - 0.0).abs() < 1e-9);
    }

    #[test]
    fn arrowhead_undefined_for_zero_length() {
        assert!(arrowhead(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), 12.0).is_none());
    }
}
