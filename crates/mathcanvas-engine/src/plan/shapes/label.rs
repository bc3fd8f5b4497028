use crate::coords::Vec2;
use crate::drawable::Label;
use crate::paint::TextAlign;
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, to_screen, Styled};

/// Free text at a mapped anchor, one `DrawText` per line.
///
/// With a reference scale the font shrinks by `scale / reference_scale` once
/// zoomed out past it. Below `label_vanish_px` the label is dropped; while
/// visible it never goes below `label_min_font_px`.
pub(crate) fn build(
    plan: &mut Plan,
    label: &Label,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let anchor = to_screen(ctx, styled, label.position, "position")?;
    if label.text.trim().is_empty() {
        return Ok(());
    }

    let theme = styled.theme;
    let base = match label.font_size {
        Some(size) => finite(styled, size, "font_size")?,
        None => styled.font_size.unwrap_or(theme.label_font_size),
    };
    if base <= 0.0 {
        return Ok(());
    }

    let size = match label.reference_scale {
        Some(reference) => {
            let reference = finite(styled, reference, "reference_scale")?;
            if reference <= 0.0 {
                return Err(RenderError::invalid(
                    styled.kind,
                    format!("reference scale must be positive, got {reference}"),
                ));
            }
            let shrunk = base * (ctx.mapper.scale() / reference).min(1.0);
            if shrunk < theme.label_vanish_px {
                return Ok(());
            }
            shrunk.max(theme.label_min_font_px.min(base))
        }
        None => base,
    };

    let mut font = styled.font(size);
    font.size = size;
    let line_height = size * theme.label_line_height;
    for (i, line) in label.text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        plan.push(Primitive::DrawText {
            text: line.to_string(),
            position: anchor + Vec2::new(0.0, i as f64 * line_height),
            font: font.clone(),
            color: styled.color,
            align: TextAlign::default(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::test_support::build;
    use crate::coords::Vec2;
    use crate::drawable::{Drawable, Label};
    use crate::primitive::Primitive;

    fn label(text: &str, reference_scale: Option<f64>) -> Drawable {
        Drawable::new(
            3,
            Label {
                position: Vec2::new(1.0, 1.0),
                text: text.into(),
                font_size: Some(14.0),
                reference_scale,
            },
        )
    }

    fn texts(plan: &crate::plan::Plan) -> Vec<(String, Vec2, f64)> {
        plan.commands
            .iter()
            .map(|c| match c {
                Primitive::DrawText { text, position, font, .. } => {
                    (text.clone(), *position, font.size)
                }
                other => panic!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn multi_line_stacks_downwards() {
        let plan = build(&label("first\nsecond", None), &mapper());
        let t = texts(&plan);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].1, Vec2::new(450.0, 250.0));
        assert!(approx(t[1].1.y - t[0].1.y, 14.0 * 1.2));
        assert_eq!(t[1].0, "second");
    }

    #[test]
    fn shrinks_when_zoomed_out_past_reference() {
        // mapper scale is 50; half of the reference scale halves the font.
        let plan = build(&label("x", Some(100.0)), &mapper());
        assert_eq!(texts(&plan)[0].2, 7.0);

        let plan = build(&label("x", Some(25.0)), &mapper());
        assert_eq!(texts(&plan)[0].2, 14.0);
    }

    #[test]
    fn clamps_to_min_then_vanishes() {
        // 14 * 50/200 = 3.5: visible, clamped up to 6.
        let plan = build(&label("x", Some(200.0)), &mapper());
        assert_eq!(texts(&plan)[0].2, 6.0);

        // 14 * 50/400 = 1.75: below the vanish threshold.
        let plan = build(&label("x", Some(400.0)), &mapper());
        assert!(plan.is_empty());
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(build(&label("  ", None), &mapper()).is_empty());
    }
}
