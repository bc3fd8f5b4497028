use crate::coords::Vec2;
use crate::drawable::{AreaBoundary, AreaRegion, ColoredArea};
use crate::paint::FillStyle;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::function::{sample_count, SampleWindow};
use super::{finite, Styled};

/// Region between two boundaries, filled as one joined polygon.
///
/// The upper boundary is walked left to right (forward), the lower one right
/// to left (reverse). Curved sides are sampled across the window and samples
/// where they are undefined are skipped; the fill closes across the gap.
/// Straight sides contribute their two end points only.
///
/// A region with straight sides only is exact: it ignores the window, and
/// stays empty when nothing bounds its x range.
pub(crate) fn build(
    plan: &mut Plan,
    area: &ColoredArea,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let window = SampleWindow::for_mapper(ctx.mapper);
    let exact = area.region() == AreaRegion::Segments;
    let (mut lo, mut hi) =
        if exact { (f64::NEG_INFINITY, f64::INFINITY) } else { (window.x_min, window.x_max) };

    if let Some((a, b)) = area.x_range {
        let (a, b) = (finite(styled, a, "x_range")?, finite(styled, b, "x_range")?);
        lo = lo.max(a.min(b));
        hi = hi.min(a.max(b));
    }
    for boundary in [&area.upper, &area.lower] {
        if let Some((a, b)) = boundary_extent(boundary, styled)? {
            lo = lo.max(a);
            hi = hi.min(b);
        }
    }
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Ok(());
    }

    let n = sample_count(lo, hi, ctx, window.sample_cap(ctx));
    let step = (hi - lo) / n as f64;
    let xs = |boundary: &AreaBoundary| -> Vec<f64> {
        match boundary {
            AreaBoundary::Function(_) => {
                (0..=n).map(|i| if i == n { hi } else { lo + i as f64 * step }).collect()
            }
            AreaBoundary::Segment { .. } | AreaBoundary::XAxis => vec![lo, hi],
        }
    };

    let sample = |boundary: &AreaBoundary, x: f64| {
        boundary_y(boundary, x).filter(|y| y.is_finite()).map(|y| {
            let y = if exact { y } else { window.clamp_y(y) };
            ctx.mapper.math_to_screen(Vec2::new(x, y))
        })
    };
    let forward: Vec<Vec2> =
        xs(&area.upper).into_iter().filter_map(|x| sample(&area.upper, x)).collect();
    let reverse: Vec<Vec2> =
        xs(&area.lower).into_iter().rev().filter_map(|x| sample(&area.lower, x)).collect();
    if forward.len() + reverse.len() < 3 {
        return Ok(());
    }

    let fill = styled.fill.unwrap_or_else(|| {
        FillStyle::with_opacity(styled.theme.area_fill, styled.theme.area_opacity)
    });
    plan.push(Primitive::FillJoinedArea { forward, reverse, fill });
    Ok(())
}

/// x extent a boundary limits the area to, if any.
fn boundary_extent(
    boundary: &AreaBoundary,
    styled: &Styled<'_>,
) -> Result<Option<(f64, f64)>, RenderError> {
    match boundary {
        AreaBoundary::Segment { start, end } => {
            if !(start.is_finite() && end.is_finite()) {
                return Err(styled.non_finite("boundary"));
            }
            Ok(Some((start.x.min(end.x), start.x.max(end.x))))
        }
        AreaBoundary::Function(_) | AreaBoundary::XAxis => Ok(None),
    }
}

fn boundary_y(boundary: &AreaBoundary, x: f64) -> Option<f64> {
    match boundary {
        AreaBoundary::Function(f) => Some(f.eval(x)),
        AreaBoundary::Segment { start, end } => {
            let dx = end.x - start.x;
            if dx == 0.0 {
                return None;
            }
            Some(start.y + (x - start.x) / dx * (end.y - start.y))
        }
        AreaBoundary::XAxis => Some(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::test_support::build;
    use crate::coords::{CoordinateMapper, Vec2, Viewport};
    use crate::drawable::{AreaBoundary, ColoredArea, Drawable, DrawableStyle, PlotFunction};
    use crate::paint::{Color, Theme};
    use crate::plan::PlanContext;
    use crate::primitive::Primitive;

    fn joined(plan: &crate::plan::Plan) -> (&Vec<Vec2>, &Vec<Vec2>, crate::paint::FillStyle) {
        match &plan.commands[..] {
            [Primitive::FillJoinedArea { forward, reverse, fill }] => (forward, reverse, *fill),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn function_over_axis_between_bounds() {
        let d = Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Function(PlotFunction::new("x^2", |x| x * x)),
                lower: AreaBoundary::XAxis,
                x_range: Some((0.0, 2.0)),
            },
        );
        let plan = build(&d, &mapper());
        let (forward, reverse, fill) = joined(&plan);

        assert!(approx_pt(forward[0], Vec2::new(400.0, 300.0)));
        assert!(approx_pt(*forward.last().unwrap(), Vec2::new(500.0, 100.0)));
        assert!(approx_pt(reverse[0], Vec2::new(500.0, 300.0)));
        assert!(approx_pt(*reverse.last().unwrap(), Vec2::new(400.0, 300.0)));

        let theme = Theme::default();
        assert_eq!(fill.color, theme.area_fill);
        assert_eq!(fill.opacity, theme.area_opacity);
    }

    #[test]
    fn segment_boundary_limits_range() {
        let d = Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Segment { start: Vec2::new(-1.0, 1.0), end: Vec2::new(1.0, 1.0) },
                lower: AreaBoundary::XAxis,
                x_range: None,
            },
        )
        .with_style(DrawableStyle::default().with_fill(Color::BLACK, 0.5));
        let plan = build(&d, &mapper());
        let (forward, _, fill) = joined(&plan);
        assert!(approx(forward[0].x, 350.0));
        assert!(approx(forward.last().unwrap().x, 450.0));
        assert!(forward.iter().all(|p| approx(p.y, 250.0)));
        assert_eq!(fill.opacity, 0.5);
    }

    #[test]
    fn vertical_segment_boundary_is_empty() {
        let d = Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Segment { start: Vec2::new(1.0, 0.0), end: Vec2::new(1.0, 2.0) },
                lower: AreaBoundary::XAxis,
                x_range: None,
            },
        );
        assert!(build(&d, &mapper()).is_empty());
    }

    #[test]
    fn undefined_samples_are_skipped() {
        let d = Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Function(PlotFunction::new("sqrt", f64::sqrt)),
                lower: AreaBoundary::XAxis,
                x_range: Some((-1.0, 1.0)),
            },
        );
        let plan = build(&d, &mapper());
        let (forward, reverse, _) = joined(&plan);
        assert!(forward.iter().all(|p| p.x >= 400.0 - 1e-9));
        // the axis side is straight
        assert_eq!(reverse.len(), 2);
    }

    // ── regions ──

    fn triangle_under_segment() -> Drawable {
        Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Segment { start: Vec2::new(0.0, 0.0), end: Vec2::new(2.0, 2.0) },
                lower: AreaBoundary::XAxis,
                x_range: None,
            },
        )
    }

    #[test]
    fn straight_sides_are_exact() {
        let plan = build(&triangle_under_segment(), &mapper());
        let (forward, reverse, _) = joined(&plan);
        assert_eq!(forward.len(), 2);
        assert!(approx_pt(forward[0], Vec2::new(400.0, 300.0)));
        assert!(approx_pt(forward[1], Vec2::new(500.0, 200.0)));
        assert!(approx_pt(reverse[0], Vec2::new(500.0, 300.0)));
        assert!(approx_pt(reverse[1], Vec2::new(400.0, 300.0)));
        assert!(!plan.zoom_sensitive);
    }

    #[test]
    fn straight_region_ignores_the_window() {
        let far = CoordinateMapper::with_pan(Viewport::new(800.0, 600.0), 50.0, Vec2::new(-5000.0, 300.0));
        let plan = build(&triangle_under_segment(), &far);
        let (forward, _, _) = joined(&plan);
        assert!(approx_pt(forward[1], far.math_to_screen(Vec2::new(2.0, 2.0))));

        let (theme, m) = (Theme::default(), mapper());
        let sig = |mapper: &CoordinateMapper| {
            crate::plan::signature(&triangle_under_segment(), &PlanContext::new(mapper, &theme))
                .expect("finite inputs")
        };
        assert!(sig(&m).same_content(&sig(&far)));
    }

    #[test]
    fn unbounded_straight_region_is_empty() {
        let d = Drawable::new(
            1,
            ColoredArea { upper: AreaBoundary::XAxis, lower: AreaBoundary::XAxis, x_range: None },
        );
        assert!(build(&d, &mapper()).is_empty());
    }

    #[test]
    fn function_against_segment() {
        let d = Drawable::new(
            1,
            ColoredArea {
                upper: AreaBoundary::Function(PlotFunction::new("x^2+1", |x| x * x + 1.0)),
                lower: AreaBoundary::Segment { start: Vec2::new(-1.0, 0.0), end: Vec2::new(1.0, 0.0) },
                x_range: None,
            },
        );
        let plan = build(&d, &mapper());
        let (forward, reverse, _) = joined(&plan);
        assert!(forward.len() > 2);
        assert!(approx_pt(forward[0], Vec2::new(350.0, 200.0)));
        assert!(approx_pt(*forward.last().unwrap(), Vec2::new(450.0, 200.0)));
        assert_eq!(reverse.len(), 2);
        assert!(plan.zoom_sensitive);
    }
}
