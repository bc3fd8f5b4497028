//! Axes, grid, ticks and tick labels.
//!
//! Everything is laid out in screen space from the mapped origin: grid lines
//! span the viewport, ticks and labels have fixed pixel sizes. The plan is
//! tied to the exact view, so it is rebuilt on every pan or zoom.

use crate::coords::Vec2;
use crate::drawable::Cartesian;
use crate::paint::{FontStyle, StrokeStyle, TextAlign};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, Styled};

/// Pinned spacings finer than this on screen fall back to automatic.
const MIN_PINNED_SPACING_PX: f64 = 2.0;
/// Gap between a tick and its label.
const LABEL_GAP_PX: f64 = 2.0;

pub(crate) fn build(
    plan: &mut Plan,
    cartesian: &Cartesian,
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
    let origin = ctx.mapper.math_to_screen(Vec2::zero());

    let auto = nice_spacing(theme.min_grid_spacing_px.max(1.0) / scale);
    let spacing = match cartesian.tick_spacing {
        Some(s) => {
            let s = finite(styled, s, "tick_spacing")?;
            if s <= 0.0 {
                return Err(RenderError::invalid(
                    styled.kind,
                    format!("tick spacing must be positive, got {s}"),
                ));
            }
            if s * scale < MIN_PINNED_SPACING_PX { auto } else { s }
        }
        None => auto,
    };
    let step = spacing * scale;

    let grid = StrokeStyle::new(theme.grid_color, styled.stroke.width);
    let minor = StrokeStyle::new(theme.grid_color, theme.minor_grid_width);
    let axis = StrokeStyle::new(theme.axis_color, styled.stroke.width);

    // ── grid ──
    if theme.minor_grid_width > 0.0 {
        for n in steps(origin.x - 0.5 * step, step, w) {
            let x = origin.x + (n as f64 + 0.5) * step;
            plan.push(vline(x, h, minor));
        }
        for n in steps(origin.y - 0.5 * step, step, h) {
            let y = origin.y + (n as f64 + 0.5) * step;
            plan.push(hline(y, w, minor));
        }
    }
    for n in steps(origin.x, step, w) {
        plan.push(vline(origin.x + n as f64 * step, h, grid));
    }
    for n in steps(origin.y, step, h) {
        plan.push(hline(origin.y + n as f64 * step, w, grid));
    }

    // ── axes ──
    plan.push(hline(origin.y, w, axis));
    plan.push(vline(origin.x, h, axis));

    // ── ticks + labels ──
    let tick = theme.tick_size;
    let font = FontStyle::new(theme.font_family.clone(), theme.tick_font_size);
    let precision = tick_precision(spacing);
    let label = |text: String, position: Vec2| Primitive::DrawText {
        text,
        position,
        font: font.clone(),
        color: theme.axis_label_color,
        align: TextAlign::default(),
    };

    if (0.0..=h).contains(&origin.y) {
        for n in steps(origin.x, step, w) {
            let x = origin.x + n as f64 * step;
            plan.push(Primitive::StrokeLine {
                from: Vec2::new(x, origin.y - tick),
                to: Vec2::new(x, origin.y + tick),
                stroke: axis,
            });
            let text = if n == 0 {
                "O".to_string()
            } else {
                format_tick(n as f64 * spacing, precision)
            };
            let at = Vec2::new(x + LABEL_GAP_PX, origin.y + tick + theme.tick_font_size);
            plan.push(label(text, at));
        }
    }
    if (0.0..=w).contains(&origin.x) {
        for n in steps(origin.y, step, h) {
            let y = origin.y + n as f64 * step;
            plan.push(Primitive::StrokeLine {
                from: Vec2::new(origin.x - tick, y),
                to: Vec2::new(origin.x + tick, y),
                stroke: axis,
            });
            if n != 0 {
                // Screen y grows downwards.
                let text = format_tick(-(n as f64) * spacing, precision);
                let at = Vec2::new(origin.x + tick + LABEL_GAP_PX, y - tick);
                plan.push(label(text, at));
            }
        }
    }
    Ok(())
}

/// Indices `n` with `start + n * step` inside `[0, extent]`.
fn steps(start: f64, step: f64, extent: f64) -> std::ops::RangeInclusive<i64> {
    let first = (-start / step).ceil() as i64;
    let last = ((extent - start) / step).floor() as i64;
    first..=last
}

#[inline]
fn vline(x: f64, h: f64, stroke: StrokeStyle) -> Primitive {
    Primitive::StrokeLine { from: Vec2::new(x, 0.0), to: Vec2::new(x, h), stroke }
}

#[inline]
fn hline(y: f64, w: f64, stroke: StrokeStyle) -> Primitive {
    Primitive::StrokeLine { from: Vec2::new(0.0, y), to: Vec2::new(w, y), stroke }
}

/// Smallest `{1, 2, 5} * 10^k` that is at least `raw`.
pub(crate) fn nice_spacing(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw * (1.0 - 1e-12))
        .unwrap_or(10.0 * magnitude)
}

/// Decimal places needed to tell adjacent ticks apart.
pub(crate) fn tick_precision(spacing: f64) -> usize {
    if !(spacing.is_finite() && spacing > 0.0) || spacing >= 1.0 {
        return 0;
    }
    (-spacing.log10()).ceil().max(0.0) as usize
}

pub(crate) fn format_tick(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e6 || precision > 4 || magnitude < 1e-3 {
        return format!("{value:.1e}");
    }
    if precision == 0 {
        return format!("{}", value.round() as i64);
    }
    let s = format!("{value:.precision$}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
