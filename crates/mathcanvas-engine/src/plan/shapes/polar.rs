//! Polar grid: concentric circles, radial lines and their labels.
//!
//! Laid out in screen space around the mapped origin like the cartesian
//! grid, and rebuilt on every pan or zoom for the same reason.

use std::f64::consts::TAU;

use crate::coords::Vec2;
use crate::drawable::PolarGrid;
use crate::paint::style::trim_number;
use crate::paint::{FontStyle, StrokeStyle, TextAlign};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::cartesian::{format_tick, nice_spacing, tick_precision};
use super::{finite, Styled};

/// Pinned spacings finer than this on screen fall back to automatic.
const MIN_PINNED_SPACING_PX: f64 = 2.0;
/// The spacing doubles until the circle count fits.
const MAX_CIRCLES: usize = 100;
/// Circles reach this far past the farthest viewport corner.
const REACH: f64 = 1.1;
const LABEL_GAP_PX: f64 = 2.0;
/// Angle labels keep clear of the viewport edge by these many pixels,
/// more on the right where left-aligned text extends.
const EDGE_PAD_PX: f64 = 15.0;
const EDGE_PAD_LEFT_PX: f64 = 10.0;
const EDGE_PAD_RIGHT_PX: f64 = 25.0;
const MIN_LABEL_RADIUS_PX: f64 = 30.0;

pub(crate) fn build(
    plan: &mut Plan,
    grid: &PolarGrid,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let theme = styled.theme;
    let vp = ctx.mapper.viewport();
    if !vp.is_valid() {
        return Ok(());
    }
    let (w, h) = (vp.width, vp.height);
    let scale = ctx.mapper.scale();
    let o = ctx.mapper.math_to_screen(Vec2::zero());

    let auto = nice_spacing(theme.min_grid_spacing_px.max(1.0) / scale);
    let mut spacing = match grid.radial_spacing {
        Some(s) => {
            let s = finite(styled, s, "radial_spacing")?;
            if s <= 0.0 {
                return Err(RenderError::invalid(
                    styled.kind,
                    format!("radial spacing must be positive, got {s}"),
                ));
            }
            if s * scale < MIN_PINNED_SPACING_PX { auto } else { s }
        }
        None => auto,
    };

    let max_r = REACH
        * [Vec2::new(0.0, 0.0), Vec2::new(w, 0.0), Vec2::new(0.0, h), Vec2::new(w, h)]
            .into_iter()
            .map(|c| c.distance(o))
            .fold(0.0, f64::max);
    while max_r / (spacing * scale) > MAX_CIRCLES as f64 {
        spacing *= 2.0;
    }
    let step = spacing * scale;
    let count = (max_r / step).floor() as usize;

    let ring = StrokeStyle::new(theme.grid_color, styled.stroke.width);
    let axis = StrokeStyle::new(styled.color, 1.0);

    // ── circles + rays ──
    for k in 1..=count {
        plan.push(Primitive::StrokeCircle { center: o, radius: k as f64 * step, stroke: ring });
    }
    let divisions = grid.angular_divisions;
    let directions: Vec<(f64, Vec2)> = (0..divisions)
        .map(|i| {
            let degrees = i as f64 * 360.0 / divisions as f64;
            let a = i as f64 * TAU / divisions as f64;
            // Screen y grows downwards.
            (degrees, Vec2::new(a.cos(), -a.sin()))
        })
        .collect();
    for &(_, dir) in &directions {
        plan.push(Primitive::StrokeLine { from: o, to: o + dir * max_r, stroke: ring });
    }

    // ── axes ──
    plan.push(Primitive::StrokeLine { from: Vec2::new(0.0, o.y), to: Vec2::new(w, o.y), stroke: axis });
    plan.push(Primitive::StrokeLine { from: Vec2::new(o.x, 0.0), to: Vec2::new(o.x, h), stroke: axis });

    // ── labels ──
    let font = FontStyle::new(theme.font_family.clone(), theme.tick_font_size);
    let label = |text: String, position: Vec2| Primitive::DrawText {
        text,
        position,
        font: font.clone(),
        color: theme.axis_label_color,
        align: TextAlign::default(),
    };

    let inside = (0.0..=w).contains(&o.x) && (0.0..=h).contains(&o.y);
    if inside {
        for &(degrees, dir) in &directions {
            let pad = if dir.x > 1e-9 {
                EDGE_PAD_RIGHT_PX
            } else if dir.x < -1e-9 {
                EDGE_PAD_LEFT_PX
            } else {
                EDGE_PAD_PX
            };
            let r = (edge_distance(o, dir, w, h) - pad).max(MIN_LABEL_RADIUS_PX);
            plan.push(label(format!("{}°", trim_number(degrees)), o + dir * r));
        }
    }

    if (0.0..=h).contains(&o.y) {
        let precision = tick_precision(spacing);
        let y = o.y + theme.tick_font_size;
        if (0.0..=w).contains(&o.x) {
            plan.push(label("O".to_string(), Vec2::new(o.x + LABEL_GAP_PX, y)));
        }
        for k in 1..=count {
            let x = o.x + k as f64 * step;
            if !(0.0..=w).contains(&x) {
                continue;
            }
            let text = format_tick(k as f64 * spacing, precision);
            plan.push(label(text, Vec2::new(x + LABEL_GAP_PX, y)));
        }
    }
    Ok(())
}

/// Distance from `o` (inside the viewport) along unit `dir` to its edge.
fn edge_distance(o: Vec2, dir: Vec2, w: f64, h: f64) -> f64 {
    let along = |p: f64, d: f64, extent: f64| {
        if d > 0.0 {
            (extent - p) / d
        } else if d < 0.0 {
            -p / d
        } else {
            f64::INFINITY
        }
    };
    along(o.x, dir.x, w).min(along(o.y, dir.y, h))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::test_support::build;
    use super::*;
    use crate::drawable::Drawable;

    fn polar(radial_spacing: Option<f64>) -> Drawable {
        Drawable::new(1, PolarGrid { radial_spacing, ..PolarGrid::default() })
    }

    fn radii(plan: &Plan) -> Vec<f64> {
        plan.commands
            .iter()
            .filter_map(|c| match c {
                Primitive::StrokeCircle { radius, center, .. } => {
                    assert!(approx_pt(*center, Vec2::new(400.0, 300.0)));
                    Some(*radius)
                }
                _ => None,
            })
            .collect()
    }

    fn texts(plan: &Plan) -> Vec<(String, Vec2)> {
        plan.commands
            .iter()
            .filter_map(|c| match c {
                Primitive::DrawText { text, position, .. } => Some((text.clone(), *position)),
                _ => None,
            })
            .collect()
    }

    // ── layout ──

    #[test]
    fn circles_reach_past_the_corners() {
        let plan = build(&polar(None), &mapper());
        let r = radii(&plan);
        // corners are 500 px out; circles every unit (50 px) up to 550
        assert_eq!(r.len(), 11);
        assert!(approx(r[0], 50.0));
        assert!(approx(*r.last().unwrap(), 550.0));
    }

    #[test]
    fn rays_follow_the_divisions() {
        let plan = build(&polar(None), &mapper());
        let rays: Vec<Vec2> = plan
            .commands
            .iter()
            .filter_map(|c| match c {
                Primitive::StrokeLine { from, to, .. } if approx_pt(*from, Vec2::new(400.0, 300.0)) => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(rays.len(), 12);
        assert!(approx_pt(rays[0], Vec2::new(950.0, 300.0)));
        // 90° points up on screen
        assert!((rays[3].x - 400.0).abs() < 1e-9);
        assert!(approx(rays[3].y, -250.0));
    }

    #[test]
    fn dense_spacing_is_doubled() {
        let plan = build(&polar(Some(0.05)), &mapper());
        let r = radii(&plan);
        assert!(r.len() <= MAX_CIRCLES);
        assert!(approx(r[0], 10.0));
    }

    // ── labels ──

    #[test]
    fn angle_labels_stay_inside() {
        let plan = build(&polar(None), &mapper());
        let labels = texts(&plan);
        let degrees: Vec<_> = labels.iter().filter(|(t, _)| t.ends_with('°')).collect();
        assert_eq!(degrees.len(), 12);
        assert_eq!(degrees[0].0, "0°");
        assert!(approx_pt(degrees[0].1, Vec2::new(775.0, 300.0)));
        assert_eq!(degrees[3].0, "90°");
        assert!((degrees[3].1.y - 15.0).abs() < 1e-9);
        assert_eq!(degrees[11].0, "330°");
    }

    #[test]
    fn radius_labels_run_along_the_axis() {
        let plan = build(&polar(Some(1.0)), &mapper());
        let labels = texts(&plan);
        let origin = labels.iter().find(|(t, _)| t == "O").expect("origin label");
        assert!(approx_pt(origin.1, Vec2::new(402.0, 308.0)));
        let radial: Vec<_> = labels
            .iter()
            .filter(|(t, _)| t != "O" && !t.ends_with('°'))
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(radial, ["1", "2", "3", "4", "5", "6", "7", "8"]);
    }

    #[test]
    fn grid_is_rebuilt_rather_than_moved() {
        let plan = build(&polar(None), &mapper());
        assert!(plan.zoom_sensitive);
        assert!(!plan.reprojectable);
    }

    #[test]
    fn non_positive_spacing_is_an_error() {
        let (m, theme) = (mapper(), crate::paint::Theme::default());
        let ctx = PlanContext::new(&m, &theme);
        assert!(crate::plan::build_plan(&polar(Some(0.0)), &ctx).is_err());
    }
}
