//! Filled interiors of closed shapes.
//!
//! Outlines are sampled in math space and mapped point by point, so a
//! segment cut from a rotated ellipse stays exact at its chord ends.

use std::f64::consts::TAU;

use crate::coords::Vec2;
use crate::drawable::{Circle, ClosedArea, ClosedOutline, Ellipse, Segment};
use crate::paint::FillStyle;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, to_screen, Styled};

/// Points around a full circle or ellipse.
const RING_SAMPLES: usize = 96;
/// Arc samples of a circle or ellipse segment.
const SEGMENT_SAMPLES: usize = 64;
/// Slack on the chord parameter so endpoints lying on the curve count.
const CHORD_SLACK: f64 = 1e-9;

pub(crate) fn build(
    plan: &mut Plan,
    area: &ClosedArea,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let outline = match &area.outline {
        ClosedOutline::Polygon(vertices) => vertices.clone(),
        ClosedOutline::Circle(c) => ring(&circle_ellipse(c, styled)?),
        ClosedOutline::Ellipse(e) => ring(&checked(e, styled)?),
        ClosedOutline::CircleSegment { circle, chord, clockwise } => {
            cut(&circle_ellipse(circle, styled)?, chord, *clockwise, styled)?
        }
        ClosedOutline::EllipseSegment { ellipse, chord, clockwise } => {
            cut(&checked(ellipse, styled)?, chord, *clockwise, styled)?
        }
    };

    let mut points = Vec::with_capacity(outline.len());
    for p in outline {
        points.push(to_screen(ctx, styled, p, "outline")?);
    }
    if points.len() < 3 {
        return Ok(());
    }

    let fill = styled.fill.unwrap_or_else(|| {
        FillStyle::with_opacity(styled.theme.area_fill, styled.theme.area_opacity)
    });
    plan.push(Primitive::FillPolygon { points, fill, stroke: None, screen_space: false });
    Ok(())
}

fn circle_ellipse(c: &Circle, styled: &Styled<'_>) -> Result<Ellipse, RenderError> {
    let r = finite(styled, c.radius, "radius")?;
    checked(&Ellipse { center: c.center, radius_x: r, radius_y: r, rotation: 0.0 }, styled)
}

fn checked(e: &Ellipse, styled: &Styled<'_>) -> Result<Ellipse, RenderError> {
    if !e.center.is_finite() {
        return Err(styled.non_finite("center"));
    }
    finite(styled, e.radius_x, "radius_x")?;
    finite(styled, e.radius_y, "radius_y")?;
    finite(styled, e.rotation, "rotation")?;
    Ok(*e)
}

/// Point at eccentric angle `t`.
fn at(e: &Ellipse, t: f64) -> Vec2 {
    let (s, c) = e.rotation.sin_cos();
    let (x, y) = (e.radius_x * t.cos(), e.radius_y * t.sin());
    e.center + Vec2::new(x * c - y * s, x * s + y * c)
}

fn ring(e: &Ellipse) -> Vec<Vec2> {
    if e.radius_x <= 0.0 || e.radius_y <= 0.0 {
        return Vec::new();
    }
    (0..RING_SAMPLES).map(|i| at(e, i as f64 * TAU / RING_SAMPLES as f64)).collect()
}

/// Region between `chord` and the arc joining its two crossings with `e`.
/// Empty unless the chord crosses the curve twice.
fn cut(e: &Ellipse, chord: &Segment, clockwise: bool, styled: &Styled<'_>) -> Result<Vec<Vec2>, RenderError> {
    if !(chord.start.is_finite() && chord.end.is_finite()) {
        return Err(styled.non_finite("chord"));
    }
    if e.radius_x <= 0.0 || e.radius_y <= 0.0 {
        return Ok(Vec::new());
    }

    // Unit-circle frame of the ellipse.
    let (s, c) = (-e.rotation).sin_cos();
    let local = |p: Vec2| {
        let d = p - e.center;
        Vec2::new((d.x * c - d.y * s) / e.radius_x, (d.x * s + d.y * c) / e.radius_y)
    };
    let a = local(chord.start);
    let d = local(chord.end) - a;

    let qa = d.x * d.x + d.y * d.y;
    let qb = 2.0 * (a.x * d.x + a.y * d.y);
    let qc = a.x * a.x + a.y * a.y - 1.0;
    let disc = qb * qb - 4.0 * qa * qc;
    if qa == 0.0 || disc <= 0.0 {
        return Ok(Vec::new());
    }
    let root = disc.sqrt();
    let (t1, t2) = ((-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa));
    let on_chord = |t: f64| (-CHORD_SLACK..=1.0 + CHORD_SLACK).contains(&t);
    if !(on_chord(t1) && on_chord(t2)) {
        return Ok(Vec::new());
    }

    let angle = |t: f64| {
        let u = a + d * t;
        u.y.atan2(u.x)
    };
    let (from, to) = (angle(t1), angle(t2));
    let sweep = if clockwise { -(from - to).rem_euclid(TAU) } else { (to - from).rem_euclid(TAU) };

    let mut points: Vec<Vec2> = (0..=SEGMENT_SAMPLES)
        .map(|i| at(e, from + sweep * i as f64 / SEGMENT_SAMPLES as f64))
        .collect();
    points[0] = chord.start.lerp(chord.end, t1.clamp(0.0, 1.0));
    points[SEGMENT_SAMPLES] = chord.start.lerp(chord.end, t2.clamp(0.0, 1.0));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::super::test_support::*;
    use super::super::test_support::build;
    use crate::coords::Vec2;
    use crate::drawable::{Circle, ClosedArea, ClosedOutline, Drawable, Ellipse, Segment};
    use crate::paint::{FillStyle, Theme};
    use crate::plan::{Plan, PlanContext};
    use crate::primitive::Primitive;

    fn closed(outline: ClosedOutline) -> Drawable {
        Drawable::new(1, ClosedArea { outline })
    }

    fn filled(plan: &Plan) -> (&Vec<Vec2>, FillStyle) {
        match &plan.commands[..] {
            [Primitive::FillPolygon { points, fill, stroke: None, screen_space: false }] => {
                (points, *fill)
            }
            other => panic!("{other:?}"),
        }
    }

    fn unit_circle() -> Circle {
        Circle { center: Vec2::zero(), radius: 1.0 }
    }

    fn diameter() -> Segment {
        Segment { start: Vec2::new(-1.0, 0.0), end: Vec2::new(1.0, 0.0) }
    }

    // ── outlines ──

    #[test]
    fn polygon_interior_is_filled() {
        let square = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let plan = build(&closed(ClosedOutline::Polygon(square)), &mapper());
        let (points, fill) = filled(&plan);
        assert_eq!(points.len(), 4);
        assert!(approx_pt(points[2], Vec2::new(450.0, 250.0)));
        let theme = Theme::default();
        assert_eq!((fill.color, fill.opacity), (theme.area_fill, theme.area_opacity));
    }

    #[test]
    fn circle_ring_sits_on_the_radius() {
        let plan = build(&closed(ClosedOutline::Circle(unit_circle())), &mapper());
        let (points, _) = filled(&plan);
        assert_eq!(points.len(), 96);
        for p in points {
            assert!((p.distance(Vec2::new(400.0, 300.0)) - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_outlines_are_empty() {
        let flat = Ellipse { center: Vec2::zero(), radius_x: 1.0, radius_y: 0.0, rotation: 0.0 };
        assert!(build(&closed(ClosedOutline::Ellipse(flat)), &mapper()).is_empty());
        let two = vec![Vec2::zero(), Vec2::new(1.0, 1.0)];
        assert!(build(&closed(ClosedOutline::Polygon(two)), &mapper()).is_empty());
    }

    // ── segments ──

    #[test]
    fn circle_segment_runs_counter_clockwise() {
        let outline = ClosedOutline::CircleSegment { circle: unit_circle(), chord: diameter(), clockwise: false };
        let plan = build(&closed(outline), &mapper());
        let (points, _) = filled(&plan);
        assert_eq!(points.len(), 65);
        assert!(approx_pt(points[0], Vec2::new(350.0, 300.0)));
        assert!(approx_pt(points[64], Vec2::new(450.0, 300.0)));
        // from (-1, 0) counter-clockwise passes below the x axis
        assert!(points.iter().all(|p| p.y >= 300.0 - 1e-9));
        assert!(approx(points[32].y, 350.0));
    }

    #[test]
    fn clockwise_takes_the_other_side() {
        let outline = ClosedOutline::CircleSegment { circle: unit_circle(), chord: diameter(), clockwise: true };
        let plan = build(&closed(outline), &mapper());
        let (points, _) = filled(&plan);
        assert!(points.iter().all(|p| p.y <= 300.0 + 1e-9));
        assert!(approx(points[32].y, 250.0));
    }

    #[test]
    fn rotated_ellipse_segment_keeps_exact_ends() {
        let ellipse = Ellipse { center: Vec2::zero(), radius_x: 2.0, radius_y: 1.0, rotation: FRAC_PI_2 };
        let chord = Segment { start: Vec2::new(0.0, -2.0), end: Vec2::new(0.0, 2.0) };
        let outline = ClosedOutline::EllipseSegment { ellipse, chord, clockwise: false };
        let plan = build(&closed(outline), &mapper());
        let (points, _) = filled(&plan);
        assert!(approx_pt(points[0], Vec2::new(400.0, 400.0)));
        assert!(approx_pt(points[64], Vec2::new(400.0, 200.0)));
        // bottom to top counter-clockwise sweeps through the right half
        assert!(points.iter().all(|p| p.x >= 400.0 - 1e-9));
        assert!(approx(points[32].x, 450.0));
    }

    #[test]
    fn chord_missing_the_curve_is_empty() {
        let chord = Segment { start: Vec2::new(-3.0, 2.0), end: Vec2::new(3.0, 2.0) };
        let outline = ClosedOutline::CircleSegment { circle: unit_circle(), chord, clockwise: false };
        assert!(build(&closed(outline), &mapper()).is_empty());
    }

    #[test]
    fn non_finite_chord_is_an_error() {
        let chord = Segment { start: Vec2::new(f64::NAN, 0.0), end: Vec2::new(1.0, 0.0) };
        let d = closed(ClosedOutline::CircleSegment { circle: unit_circle(), chord, clockwise: false });
        let (m, theme) = (mapper(), Theme::default());
        assert!(crate::plan::build_plan(&d, &PlanContext::new(&m, &theme)).is_err());
    }
}
