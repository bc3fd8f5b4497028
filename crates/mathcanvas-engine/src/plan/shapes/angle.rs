use std::f64::consts::{PI, TAU};

use crate::coords::Vec2;
use crate::drawable::Angle;
use crate::paint::TextAlign;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{to_screen, Styled, EPSILON_PX};

/// Angle marker: a fixed-pixel arc at the vertex and a degree label on the
/// bisector.
///
/// The arc radius is the theme radius, clamped to the shorter arm so the arc
/// never overshoots a short arm. The label font shrinks with the same ratio,
/// bounded below by the theme's minimum readable size.
pub(crate) fn build(
    plan: &mut Plan,
    angle: &Angle,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let vertex = to_screen(ctx, styled, angle.vertex, "vertex")?;
    let arm1 = to_screen(ctx, styled, angle.arm1, "arm1")? - vertex;
    let arm2 = to_screen(ctx, styled, angle.arm2, "arm2")? - vertex;

    let min_arm = arm1.length().min(arm2.length());
    let arc_radius = styled.theme.angle_arc_radius;
    if min_arm < EPSILON_PX || arc_radius <= 0.0 {
        return Ok(());
    }
    let radius = arc_radius.min(min_arm);

    // Screen angles grow clockwise (+Y down).
    let start_angle = arm1.angle();
    let delta_cw = (arm2.angle() - start_angle).rem_euclid(TAU);
    if delta_cw < EPSILON_PX || TAU - delta_cw < EPSILON_PX {
        return Ok(());
    }
    let interior_cw = delta_cw <= PI;
    let clockwise = interior_cw != angle.reflex;
    let sweep = if clockwise { delta_cw } else { TAU - delta_cw };
    let signed = if clockwise { sweep } else { -sweep };

    plan.push(Primitive::StrokeArc {
        center: vertex,
        radius,
        start_angle,
        end_angle: start_angle + signed,
        clockwise,
        stroke: styled.stroke,
    });

    let ratio = (radius / arc_radius).clamp(0.0, 1.0);
    let base = styled.font_size.unwrap_or(styled.theme.angle_label_font_size);
    let size = (base * ratio).max(styled.theme.label_min_font_px);

    let text_radius = radius * styled.theme.angle_text_radius_factor;
    let position = vertex + Vec2::from_polar(text_radius, start_angle + signed * 0.5);
    let mut font = styled.font(base);
    font.size = size;

    plan.push(Primitive::DrawText {
        text: format!("{:.1}°", sweep.to_degrees()),
        position,
        font,
        color: styled.color,
        align: TextAlign::centered(),
    });
    Ok(())
}
