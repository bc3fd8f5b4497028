//! Bars and bar charts.

use crate::coords::Vec2;
use crate::drawable::{Bar, BarChart};
use crate::paint::{FillStyle, HorizontalAlign, TextAlign, VerticalAlign};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, Styled};

/// Filled rectangle in math space, captioned in fixed pixels. Outlined only
/// when the drawable pins a color.
pub(crate) fn build(
    plan: &mut Plan,
    bar: &Bar,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let left = finite(styled, bar.x_left, "x_left")?;
    let right = finite(styled, bar.x_right, "x_right")?;
    let bottom = finite(styled, bar.y_bottom, "y_bottom")?;
    let top = finite(styled, bar.y_top, "y_top")?;
    if left == right || bottom == top {
        return Ok(());
    }

    let m = ctx.mapper;
    let corners = [
        m.math_to_screen(Vec2::new(left, bottom)),
        m.math_to_screen(Vec2::new(right, bottom)),
        m.math_to_screen(Vec2::new(right, top)),
        m.math_to_screen(Vec2::new(left, top)),
    ];
    let theme = styled.theme;
    plan.push(Primitive::FillPolygon {
        points: corners.to_vec(),
        fill: styled
            .fill
            .unwrap_or_else(|| FillStyle::with_opacity(theme.area_fill, theme.area_opacity)),
        stroke: styled.color_set.then_some(styled.stroke),
        screen_space: false,
    });

    let cx = 0.5 * (corners[0].x + corners[1].x);
    let (upper, lower) = (corners[0].y.min(corners[2].y), corners[0].y.max(corners[2].y));
    let pad = theme.bar_label_padding_px;
    let captions = [
        (&bar.label_above, upper - pad, VerticalAlign::Bottom),
        (&bar.label_below, lower + pad, VerticalAlign::Top),
    ];
    for (text, y, vertical) in captions {
        let Some(text) = text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        plan.push(Primitive::DrawText {
            text: text.to_string(),
            position: Vec2::new(cx, y),
            font: styled.font(theme.bar_label_font_size),
            color: styled.color,
            align: TextAlign::new(HorizontalAlign::Center, vertical),
        });
    }
    Ok(())
}

pub(crate) fn build_chart(
    plan: &mut Plan,
    chart: &BarChart,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    finite(styled, chart.bar_width, "bar_width")?;
    finite(styled, chart.bar_spacing, "bar_spacing")?;
    finite(styled, chart.x_start, "x_start")?;
    finite(styled, chart.y_base, "y_base")?;
    for bar in chart.bars() {
        build(plan, &bar, styled, ctx)?;
    }
    Ok(())
}
