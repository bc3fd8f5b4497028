use crate::coords::Vec2;
use crate::drawable::Rectangle;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{to_screen, Styled, EPSILON_PX};

/// Closed polygon. Filled when the drawable has a fill, outlined otherwise.
pub(crate) fn build(
    plan: &mut Plan,
    vertices: &[Vec2],
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let mut points = Vec::with_capacity(vertices.len() + 1);
    for &v in vertices {
        let p = to_screen(ctx, styled, v, "vertices")?;
        // Drop consecutive duplicates; they add nothing and confuse joins.
        if points.last().is_none_or(|last: &Vec2| last.distance(p) >= EPSILON_PX) {
            points.push(p);
        }
    }
    if points.len() > 1 && points[0].distance(points[points.len() - 1]) < EPSILON_PX {
        points.pop();
    }
    if points.len() < 2 {
        return Ok(());
    }

    match styled.fill {
        Some(fill) if points.len() >= 3 => plan.push(Primitive::FillPolygon {
            points,
            fill,
            stroke: Some(styled.stroke),
            screen_space: false,
        }),
        _ => {
            let first = points[0];
            points.push(first);
            plan.push(Primitive::StrokePolyline { points, stroke: styled.stroke });
        }
    }
    Ok(())
}

pub(crate) fn build_rectangle(
    plan: &mut Plan,
    rect: &Rectangle,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let (a, b) = (rect.corner, rect.opposite);
    build(plan, &[a, Vec2::new(b.x, a.y), b, Vec2::new(a.x, b.y)], styled, ctx)
}
