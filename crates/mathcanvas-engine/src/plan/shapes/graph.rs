use crate::coords::Vec2;
use crate::drawable::Graph;
use crate::paint::{FillStyle, StrokeStyle};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{arrowhead, push_point_label, to_screen, Styled, EPSILON_PX};

/// Edges first, then vertex discs on top, each followed by its label.
///
/// Directed edges end at the rim of the target disc with an arrowhead, so the
/// tip stays visible at any zoom.
pub(crate) fn build(
    plan: &mut Plan,
    graph: &Graph,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let vertices = graph
        .vertices
        .iter()
        .map(|&v| to_screen(ctx, styled, v, "vertex"))
        .collect::<Result<Vec<Vec2>, _>>()?;
    let radius = styled.theme.point_radius.max(0.0);

    for &(a, b) in &graph.edges {
        let (Some(&from), Some(&to)) = (vertices.get(a), vertices.get(b)) else {
            return Err(RenderError::invalid(
                styled.kind,
                format!("edge ({a}, {b}) references a missing vertex; graph has {}", vertices.len()),
            ));
        };
        let len = from.distance(to);
        if len < EPSILON_PX {
            continue;
        }
        if !graph.directed {
            plan.push(Primitive::StrokeLine { from, to, stroke: styled.stroke });
            continue;
        }

        let tip = if len > radius { to - (to - from) * (radius / len) } else { to };
        plan.push(Primitive::StrokeLine { from, to: tip, stroke: styled.stroke });
        if let Some(tri) = arrowhead(from, tip, styled.theme.vector_tip_size) {
            plan.push(Primitive::FillPolygon {
                points: tri.to_vec(),
                fill: FillStyle::new(styled.color),
                stroke: Some(StrokeStyle::new(styled.color, 1.0)),
                screen_space: true,
            });
        }
    }

    for (i, &center) in vertices.iter().enumerate() {
        if radius > 0.0 {
            plan.push(Primitive::FillCircle {
                center,
                radius,
                fill: FillStyle::new(styled.color),
                stroke: None,
                screen_space: true,
            });
        }
        if let Some(text) = graph.vertex_labels.get(i).filter(|l| !l.is_empty()) {
            push_point_label(plan, center, radius, text, styled.color, styled);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::test_support::build;
    use crate::coords::Vec2;
    use crate::drawable::{Drawable, Graph};
    use crate::paint::Theme;
    use crate::plan::{build_plan, PlanContext, RenderError};
    use crate::primitive::{Primitive, PrimitiveKind};

    fn triangle(directed: bool) -> Drawable {
        Drawable::new(
            7,
            Graph {
                vertices: vec![Vec2::zero(), Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0)],
                edges: vec![(0, 1), (1, 2)],
                directed,
                vertex_labels: vec!["A".into(), String::new(), "C".into()],
            },
        )
    }

    #[test]
    fn undirected_layout() {
        let plan = build(&triangle(false), &mapper());
        let kinds: Vec<_> = plan.commands.iter().map(Primitive::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PrimitiveKind::StrokeLine,
                PrimitiveKind::StrokeLine,
                PrimitiveKind::FillCircle,
                PrimitiveKind::DrawText,
                PrimitiveKind::FillCircle,
                PrimitiveKind::FillCircle,
                PrimitiveKind::DrawText,
            ]
        );
    }

    #[test]
    fn directed_edges_stop_at_the_disc_rim() {
        let plan = build(&triangle(true), &mapper());
        match &plan.commands[0] {
            Primitive::StrokeLine { to, .. } => assert!(approx_pt(*to, Vec2::new(497.0, 300.0))),
            other => panic!("{other:?}"),
        }
        match &plan.commands[1] {
            Primitive::FillPolygon { points, .. } => {
                assert!(approx_pt(points[0], Vec2::new(497.0, 300.0)))
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn dangling_edge_is_invalid() {
        let mut d = triangle(false);
        if let crate::drawable::Shape::Graph(g) = &mut d.shape {
            g.edges.push((0, 9));
        }
        let theme = Theme::default();
        let m = mapper();
        let err = build_plan(&d, &PlanContext::new(&m, &theme)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidGeometry { .. }));
    }
}
