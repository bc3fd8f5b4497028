use std::f64::consts::TAU;

use crate::coords::{Rect, Vec2};
use crate::paint::{Color, FillStyle, FontStyle, StrokeStyle, TextAlign};

/// Backend-neutral draw instruction in screen space.
///
/// Extending the command set:
/// - add a variant here and a matching [`PrimitiveKind`]
/// - extend `bounds` and `translate`
/// - handle it in every renderer under `render::*`
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    StrokeLine {
        from: Vec2,
        to: Vec2,
        stroke: StrokeStyle,
    },
    StrokePolyline {
        points: Vec<Vec2>,
        stroke: StrokeStyle,
    },
    StrokeCircle {
        center: Vec2,
        radius: f64,
        stroke: StrokeStyle,
    },
    /// `screen_space` marks fixed-pixel markers whose radius ignores zoom.
    FillCircle {
        center: Vec2,
        radius: f64,
        fill: FillStyle,
        stroke: Option<StrokeStyle>,
        screen_space: bool,
    },
    /// `rotation` is in radians, screen orientation (clockwise positive).
    StrokeEllipse {
        center: Vec2,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        stroke: StrokeStyle,
        fill: Option<FillStyle>,
    },
    FillPolygon {
        points: Vec<Vec2>,
        fill: FillStyle,
        stroke: Option<StrokeStyle>,
        screen_space: bool,
    },
    /// Closed region bounded by `forward` followed by `reverse`.
    FillJoinedArea {
        forward: Vec<Vec2>,
        reverse: Vec<Vec2>,
        fill: FillStyle,
    },
    /// Angles in screen space (radians from +X, +Y down). `clockwise`
    /// means increasing screen angle.
    StrokeArc {
        center: Vec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
        stroke: StrokeStyle,
    },
    DrawText {
        text: String,
        position: Vec2,
        font: FontStyle,
        color: Color,
        align: TextAlign,
    },
    ClearSurface,
    ResizeSurface {
        width: f64,
        height: f64,
    },
}

/// Discriminant of [`Primitive`], used as a pool key and telemetry label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    StrokeLine,
    StrokePolyline,
    StrokeCircle,
    FillCircle,
    StrokeEllipse,
    FillPolygon,
    FillJoinedArea,
    StrokeArc,
    DrawText,
    ClearSurface,
    ResizeSurface,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::StrokeLine => "stroke_line",
            PrimitiveKind::StrokePolyline => "stroke_polyline",
            PrimitiveKind::StrokeCircle => "stroke_circle",
            PrimitiveKind::FillCircle => "fill_circle",
            PrimitiveKind::StrokeEllipse => "stroke_ellipse",
            PrimitiveKind::FillPolygon => "fill_polygon",
            PrimitiveKind::FillJoinedArea => "fill_joined_area",
            PrimitiveKind::StrokeArc => "stroke_arc",
            PrimitiveKind::DrawText => "draw_text",
            PrimitiveKind::ClearSurface => "clear_surface",
            PrimitiveKind::ResizeSurface => "resize_surface",
        }
    }
}

/// Glyph advance used for text bounds, as a fraction of the font size.
/// Deliberately wide so estimated text boxes are never smaller than rendered ones.
const TEXT_ADVANCE_EM: f64 = 1.0;
/// Antialiasing fringe added around stroked geometry.
const AA_FRINGE_PX: f64 = 1.0;
/// Typical glyph advance, used where boxes should hug the text.
const LABEL_ADVANCE_EM: f64 = 0.6;

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::StrokeLine { .. } => PrimitiveKind::StrokeLine,
            Primitive::StrokePolyline { .. } => PrimitiveKind::StrokePolyline,
            Primitive::StrokeCircle { .. } => PrimitiveKind::StrokeCircle,
            Primitive::FillCircle { .. } => PrimitiveKind::FillCircle,
            Primitive::StrokeEllipse { .. } => PrimitiveKind::StrokeEllipse,
            Primitive::FillPolygon { .. } => PrimitiveKind::FillPolygon,
            Primitive::FillJoinedArea { .. } => PrimitiveKind::FillJoinedArea,
            Primitive::StrokeArc { .. } => PrimitiveKind::StrokeArc,
            Primitive::DrawText { .. } => PrimitiveKind::DrawText,
            Primitive::ClearSurface => PrimitiveKind::ClearSurface,
            Primitive::ResizeSurface { .. } => PrimitiveKind::ResizeSurface,
        }
    }

    /// Conservative screen-space extent. `None` for surface commands and
    /// commands without geometry.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Primitive::StrokeLine { from, to, stroke } => {
                Rect::from_points([*from, *to]).map(|r| r.inflate(pad(stroke)))
            }
            Primitive::StrokePolyline { points, stroke } => {
                Rect::from_points(points.iter().copied()).map(|r| r.inflate(pad(stroke)))
            }
            Primitive::StrokeCircle { center, radius, stroke } => {
                Some(Rect::around(*center, *radius, *radius).inflate(pad(stroke)))
            }
            Primitive::FillCircle { center, radius, stroke, .. } => {
                let extra = stroke.as_ref().map_or(AA_FRINGE_PX, pad);
                Some(Rect::around(*center, *radius, *radius).inflate(extra))
            }
            Primitive::StrokeEllipse { center, radius_x, radius_y, rotation, stroke, .. } => {
                let (s, c) = rotation.sin_cos();
                let hx = ((radius_x * c).powi(2) + (radius_y * s).powi(2)).sqrt();
                let hy = ((radius_x * s).powi(2) + (radius_y * c).powi(2)).sqrt();
                Some(Rect::around(*center, hx, hy).inflate(pad(stroke)))
            }
            Primitive::FillPolygon { points, stroke, .. } => {
                let extra = stroke.as_ref().map_or(AA_FRINGE_PX, pad);
                Rect::from_points(points.iter().copied()).map(|r| r.inflate(extra))
            }
            Primitive::FillJoinedArea { forward, reverse, .. } => {
                Rect::from_points(forward.iter().chain(reverse.iter()).copied())
                    .map(|r| r.inflate(AA_FRINGE_PX))
            }
            // Full circle: cheap and never smaller than the arc.
            Primitive::StrokeArc { center, radius, stroke, .. } => {
                Some(Rect::around(*center, *radius, *radius).inflate(pad(stroke)))
            }
            Primitive::DrawText { text, position, font, align, .. } => {
                Some(text_bounds(text, *position, font.size, *align))
            }
            Primitive::ClearSurface | Primitive::ResizeSurface { .. } => None,
        }
    }

    /// Tight layout box of a text command, for label placement. Unlike
    /// [`Primitive::bounds`] this is not guaranteed to cover the glyphs.
    pub fn label_box(&self) -> Option<Rect> {
        use crate::paint::{HorizontalAlign, VerticalAlign};

        let Primitive::DrawText { text, position, font, align, .. } = self else {
            return None;
        };
        let size = font.size;
        let lines = text.lines().count().max(1) as f64;
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let (w, h) = (longest * size * LABEL_ADVANCE_EM, size * lines);
        let x = match align.horizontal {
            HorizontalAlign::Left => position.x,
            HorizontalAlign::Center => position.x - w * 0.5,
            HorizontalAlign::Right => position.x - w,
        };
        let y = match align.vertical {
            VerticalAlign::Top => position.y,
            VerticalAlign::Middle => position.y - h * 0.5,
            VerticalAlign::Alphabetic => position.y - size * 0.8,
            VerticalAlign::Bottom => position.y - h,
        };
        Some(Rect::new(x, y, w, h))
    }

    /// Shifts every screen-space coordinate by `delta`. Sizes are untouched.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Primitive::StrokeLine { from, to, .. } => {
                *from = *from + delta;
                *to = *to + delta;
            }
            Primitive::StrokePolyline { points, .. } | Primitive::FillPolygon { points, .. } => {
                points.iter_mut().for_each(|p| *p = *p + delta);
            }
            Primitive::StrokeCircle { center, .. }
            | Primitive::FillCircle { center, .. }
            | Primitive::StrokeEllipse { center, .. }
            | Primitive::StrokeArc { center, .. } => {
                *center = *center + delta;
            }
            Primitive::FillJoinedArea { forward, reverse, .. } => {
                forward
                    .iter_mut()
                    .chain(reverse.iter_mut())
                    .for_each(|p| *p = *p + delta);
            }
            Primitive::DrawText { position, .. } => {
                *position = *position + delta;
            }
            Primitive::ClearSurface | Primitive::ResizeSurface { .. } => {}
        }
    }
}

#[inline]
fn pad(stroke: &StrokeStyle) -> f64 {
    stroke.width.max(0.0) * 0.5 + AA_FRINGE_PX
}

fn text_bounds(text: &str, position: Vec2, size: f64, align: TextAlign) -> Rect {
    use crate::paint::{HorizontalAlign, VerticalAlign};

    let lines = text.lines().count().max(1) as f64;
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
    let w = longest * size * TEXT_ADVANCE_EM;
    let h = size * lines * 1.25;

    let x = match align.horizontal {
        HorizontalAlign::Left => position.x,
        HorizontalAlign::Center => position.x - w * 0.5,
        HorizontalAlign::Right => position.x - w,
    };
    // Descenders and multi-line layouts can extend below an alphabetic
    // baseline; cover a full extra height in both directions.
    let y = match align.vertical {
        VerticalAlign::Top => position.y - size * 0.25,
        VerticalAlign::Middle => position.y - h * 0.5,
        VerticalAlign::Alphabetic => position.y - size,
        VerticalAlign::Bottom => position.y - h,
    };
    Rect::new(x, y, w, h + size * 0.25).inflate(AA_FRINGE_PX)
}

/// Resolves the signed sweep of an arc, in radians.
///
/// The result is positive for clockwise arcs and negative otherwise, with
/// magnitude in `(0, 2π]`. End angles on the "wrong" side of the start are
/// wrapped by whole turns, so `(0, -π/2, clockwise)` sweeps `3π/2`.
pub fn normalized_sweep(start_angle: f64, end_angle: f64, clockwise: bool) -> f64 {
    let raw = end_angle - start_angle;
    if raw.abs() >= TAU {
        return if clockwise { TAU } else { -TAU };
    }
    if clockwise {
        if raw < 0.0 { raw + TAU } else { raw }
    } else if raw > 0.0 {
        raw - TAU
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn stroke(w: f64) -> StrokeStyle {
        StrokeStyle::new(Color::BLACK, w)
    }

    // ── bounds ─────────────────────────────────────────────────────────────

    #[test]
    fn line_bounds_include_stroke() {
        let p = Primitive::StrokeLine {
            from: Vec2::new(10.0, 10.0),
            to: Vec2::new(20.0, 10.0),
            stroke: stroke(4.0),
        };
        let b = p.bounds().unwrap();
        assert_eq!(b, Rect::new(7.0, 7.0, 16.0, 6.0));
    }

    #[test]
    fn rotated_ellipse_bounds_cover_axes() {
        let p = Primitive::StrokeEllipse {
            center: Vec2::zero(),
            radius_x: 10.0,
            radius_y: 2.0,
            rotation: FRAC_PI_2,
            stroke: stroke(0.0),
            fill: None,
        };
        let b = p.bounds().unwrap();
        assert!((b.size.x - 6.0).abs() < 1e-9);
        assert!((b.size.y - 22.0).abs() < 1e-9);
    }

    #[test]
    fn text_bounds_contain_anchor() {
        let p = Primitive::DrawText {
            text: "12.5°".to_string(),
            position: Vec2::new(100.0, 50.0),
            font: FontStyle::new("sans", 10.0),
            color: Color::BLACK,
            align: TextAlign::centered(),
        };
        let b = p.bounds().unwrap();
        assert!(b.contains(Vec2::new(100.0, 50.0)));
        assert!(b.size.x >= 50.0);
    }

    #[test]
    fn label_box_hugs_the_text() {
        let p = Primitive::DrawText {
            text: "AB".to_string(),
            position: Vec2::new(100.0, 50.0),
            font: FontStyle::new("sans", 10.0),
            color: Color::BLACK,
            align: TextAlign::default(),
        };
        let b = p.label_box().unwrap();
        assert!((b.size.x - 12.0).abs() < 1e-9);
        assert_eq!(b.size.y, 10.0);
        assert_eq!(b.origin.y, 42.0);
        assert!(b.size.x < p.bounds().unwrap().size.x);
        assert!(Primitive::ClearSurface.label_box().is_none());
    }

    #[test]
    fn surface_commands_have_no_bounds() {
        assert!(Primitive::ClearSurface.bounds().is_none());
    }

    // ── translate ──────────────────────────────────────────────────────────

    #[test]
    fn translate_moves_positions_not_sizes() {
        let mut p = Primitive::FillCircle {
            center: Vec2::new(1.0, 2.0),
            radius: 3.0,
            fill: FillStyle::new(Color::BLACK),
            stroke: None,
            screen_space: true,
        };
        p.translate(Vec2::new(10.0, -2.0));
        match p {
            Primitive::FillCircle { center, radius, .. } => {
                assert_eq!(center, Vec2::new(11.0, 0.0));
                assert_eq!(radius, 3.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // ── sweep ──────────────────────────────────────────────────────────────

    #[test]
    fn sweep_wraps_by_direction() {
        assert!((normalized_sweep(0.0, FRAC_PI_2, true) - FRAC_PI_2).abs() < 1e-12);
        assert!((normalized_sweep(0.0, -FRAC_PI_2, true) - 1.5 * PI).abs() < 1e-12);
        assert!((normalized_sweep(0.0, -FRAC_PI_2, false) + FRAC_PI_2).abs() < 1e-12);
        assert!((normalized_sweep(0.0, FRAC_PI_2, false) + 1.5 * PI).abs() < 1e-12);
        assert_eq!(normalized_sweep(0.0, 2.0 * TAU, false), -TAU);
    }
}
