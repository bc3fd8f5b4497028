use crate::drawable::Segment;
use crate::paint::FillStyle;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{arrowhead, to_screen, Styled, EPSILON_PX};

pub(crate) fn build_segment(
    plan: &mut Plan,
    seg: &Segment,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let from = to_screen(ctx, styled, seg.start, "start")?;
    let to = to_screen(ctx, styled, seg.end, "end")?;
    if from.distance(to) < EPSILON_PX {
        return Ok(());
    }
    plan.push(Primitive::StrokeLine { from, to, stroke: styled.stroke });
    Ok(())
}

/// Segment plus a fixed-pixel arrowhead at `end`, oriented along the
/// screen-space direction.
pub(crate) fn build_vector(
    plan: &mut Plan,
    seg: &Segment,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let from = to_screen(ctx, styled, seg.start, "start")?;
    let to = to_screen(ctx, styled, seg.end, "end")?;
    if from.distance(to) < EPSILON_PX {
        return Ok(());
    }
    plan.push(Primitive::StrokeLine { from, to, stroke: styled.stroke });

    if let Some(tri) = arrowhead(from, to, styled.theme.vector_tip_size) {
        plan.push(Primitive::FillPolygon {
            points: tri.to_vec(),
            fill: FillStyle::new(styled.color),
            stroke: Some(crate::paint::StrokeStyle::new(styled.color, 1.0)),
            screen_space: true,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::coords::Vec2;
    use crate::drawable::{Drawable, Segment, Shape};
    use crate::primitive::Primitive;

    fn tip_polygon(plan: &crate::plan::Plan) -> Vec<Vec2> {
        match &plan.commands[1] {
            Primitive::FillPolygon { points, screen_space, .. } => {
                assert!(*screen_space);
                points.clone()
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn segment_maps_endpoints() {
        let d = Drawable::new(1, Segment { start: Vec2::zero(), end: Vec2::new(2.0, 1.0) });
        let plan = build(&d, &mapper());
        assert_eq!(
            plan.commands[0],
            Primitive::StrokeLine {
                from: Vec2::new(400.0, 300.0),
                to: Vec2::new(500.0, 250.0),
                stroke: crate::paint::StrokeStyle::new(crate::paint::Color::BLACK, 1.0),
            }
        );
    }

    #[test]
    fn coincident_endpoints_yield_empty_plan() {
        let d = Drawable::new(1, Segment { start: Vec2::new(1.0, 1.0), end: Vec2::new(1.0, 1.0) });
        let plan = build(&d, &mapper());
        assert!(plan.is_empty());
        assert!(plan.bounds.is_none());
    }

    #[test]
    fn arrowhead_size_is_zoom_invariant() {
        let d = Drawable::new(1, Shape::vector(Vec2::zero(), Vec2::new(3.0, 4.0)));
        let mut m = mapper();
        let a = tip_polygon(&build(&d, &m));
        m.zoom(0.25, Vec2::new(400.0, 300.0));
        let b = tip_polygon(&build(&d, &m));

        assert!(approx(a[1].distance(a[2]), b[1].distance(b[2])));
        assert!(approx(a[0].distance(a[1]), b[0].distance(b[1])));
        assert!(!approx_pt(a[0], b[0]));
    }
}
