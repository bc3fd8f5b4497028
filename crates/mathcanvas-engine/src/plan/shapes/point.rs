use crate::drawable::Point;
use crate::paint::FillStyle;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{push_point_label, to_screen, Styled};

/// Point marker: a fixed-pixel disc at the mapped position, plus the name
/// label when present. Neither size depends on zoom.
pub(crate) fn build(
    plan: &mut Plan,
    point: &Point,
    label: Option<&str>,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let center = to_screen(ctx, styled, point.position, "position")?;
    let radius = styled.theme.point_radius;
    if radius <= 0.0 {
        return Ok(());
    }

    plan.push(Primitive::FillCircle {
        center,
        radius,
        fill: FillStyle::new(styled.color),
        stroke: None,
        screen_space: true,
    });

    if let Some(text) = label {
        push_point_label(plan, center, radius, text, styled.color, styled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::test_support::build;
    use crate::coords::Vec2;
    use crate::drawable::{Circle, Drawable, Point};
    use crate::primitive::Primitive;

    fn marker(plan: &crate::plan::Plan) -> (Vec2, f64) {
        match &plan.commands[0] {
            Primitive::FillCircle { center, radius, screen_space, .. } => {
                assert!(*screen_space);
                (*center, *radius)
            }
            other => panic!("expected marker, got {other:?}"),
        }
    }

    #[test]
    fn marker_radius_is_zoom_invariant() {
        let point = Drawable::new(1, Point { position: Vec2::new(1.0, 2.0) });
        let circle = Drawable::new(2, Circle { center: Vec2::new(1.0, 2.0), radius: 1.0 });

        let mut m = mapper();
        let (c0, r0) = marker(&build(&point, &m));
        let circle_r0 = match &build(&circle, &m).commands[0] {
            Primitive::StrokeCircle { radius, .. } => *radius,
            other => panic!("{other:?}"),
        };

        m.zoom(3.0, Vec2::new(100.0, 100.0));
        let (c1, r1) = marker(&build(&point, &m));
        let circle_r1 = match &build(&circle, &m).commands[0] {
            Primitive::StrokeCircle { radius, .. } => *radius,
            other => panic!("{other:?}"),
        };

        assert_eq!(r0, r1);
        assert_ne!(c0, c1);
        assert!(approx(circle_r1, circle_r0 * 3.0));
    }

    #[test]
    fn label_offset_by_radius() {
        let point = Drawable::new(1, Point { position: Vec2::zero() }).with_label("A");
        let plan = build(&point, &mapper());
        assert_eq!(plan.commands.len(), 2);
        match &plan.commands[1] {
            Primitive::DrawText { text, position, .. } => {
                assert_eq!(text, "A");
                assert_eq!(*position, Vec2::new(403.0, 297.0));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn nan_position_is_an_error() {
        let point = Drawable::new(1, Point { position: Vec2::new(f64::NAN, 0.0) });
        let theme = crate::paint::Theme::default();
        let m = mapper();
        let ctx = crate::plan::PlanContext::new(&m, &theme);
        assert!(crate::plan::build_plan(&point, &ctx).is_err());
    }
}
