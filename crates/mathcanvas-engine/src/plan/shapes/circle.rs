use std::f64::consts::TAU;

use crate::drawable::{Circle, CircleArc, Ellipse};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, to_screen, Styled};

/// Arcs spanning less than this (radians) are not drawn.
const MIN_SWEEP: f64 = 1e-9;

pub(crate) fn build_circle(
    plan: &mut Plan,
    circle: &Circle,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let center = to_screen(ctx, styled, circle.center, "center")?;
    let radius = ctx.mapper.scale_value(finite(styled, circle.radius, "radius")?);
    if radius <= 0.0 {
        return Ok(());
    }

    match styled.fill {
        Some(fill) => plan.push(Primitive::FillCircle {
            center,
            radius,
            fill,
            stroke: Some(styled.stroke),
            screen_space: false,
        }),
        None => plan.push(Primitive::StrokeCircle { center, radius, stroke: styled.stroke }),
    }
    Ok(())
}

/// Math rotation is counter-clockwise with +Y up; on screen (+Y down) the
/// same visual rotation is the negated angle.
pub(crate) fn build_ellipse(
    plan: &mut Plan,
    ellipse: &Ellipse,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let center = to_screen(ctx, styled, ellipse.center, "center")?;
    let rx = ctx.mapper.scale_value(finite(styled, ellipse.radius_x, "radius_x")?);
    let ry = ctx.mapper.scale_value(finite(styled, ellipse.radius_y, "radius_y")?);
    let rotation = finite(styled, ellipse.rotation, "rotation")?;
    if rx <= 0.0 || ry <= 0.0 {
        return Ok(());
    }

    plan.push(Primitive::StrokeEllipse {
        center,
        radius_x: rx,
        radius_y: ry,
        rotation: -rotation,
        stroke: styled.stroke,
        fill: styled.fill,
    });
    Ok(())
}

/// Minor (or major) arc between the directions of `from` and `to`.
pub(crate) fn build_arc(
    plan: &mut Plan,
    arc: &CircleArc,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let center = to_screen(ctx, styled, arc.center, "center")?;
    to_screen(ctx, styled, arc.from, "from")?;
    to_screen(ctx, styled, arc.to, "to")?;
    let radius = ctx.mapper.scale_value(finite(styled, arc.radius, "radius")?)
        * styled.theme.circle_arc_radius_scale;
    if radius <= 0.0 {
        return Ok(());
    }

    let a = arc.from - arc.center;
    let b = arc.to - arc.center;
    if a.length() == 0.0 || b.length() == 0.0 {
        return Ok(());
    }
    let start_math = a.angle();
    let end_math = b.angle();

    let delta_ccw = (end_math - start_math).rem_euclid(TAU);
    let delta_cw = (start_math - end_math).rem_euclid(TAU);
    if delta_ccw.min(delta_cw) < MIN_SWEEP {
        return Ok(());
    }

    let minor_is_ccw = delta_ccw <= delta_cw;
    let (math_ccw, sweep) = match (arc.major, minor_is_ccw) {
        (false, true) => (true, delta_ccw),
        (false, false) => (false, delta_cw),
        (true, true) => (false, delta_cw),
        (true, false) => (true, delta_ccw),
    };

    // Y flip: screen angle is the negated math angle, and a counter-clockwise
    // math sweep runs towards decreasing screen angles.
    let start_angle = -start_math;
    let (end_angle, clockwise) = if math_ccw {
        (start_angle - sweep, false)
    } else {
        (start_angle + sweep, true)
    };

    plan.push(Primitive::StrokeArc {
        center,
        radius,
        start_angle,
        end_angle,
        clockwise,
        stroke: styled.stroke,
    });
    Ok(())
}
