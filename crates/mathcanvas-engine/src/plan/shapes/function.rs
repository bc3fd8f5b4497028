//! Curve sampling for function plots, piecewise functions, parametric
//! curves and area boundaries.
//!
//! Sampling is anchored to a [`SampleWindow`]: a math-space window snapped to
//! half-viewport buckets and wider than the viewport on every side. Panning
//! inside one bucket keeps the window (and the samples) identical, so cached
//! plans are translated instead of resampled. Crossing a bucket edge or
//! zooming moves the window and forces a rebuild.

use crate::coords::{CoordinateMapper, Vec2};
use crate::drawable::{FunctionPiece, FunctionPlot, ParametricCurve, PiecewiseFunction};
use crate::plan::{Plan, PlanContext, RenderError};
use crate::primitive::Primitive;

use super::{finite, Styled};

/// Lower bound on uniform samples across the window.
pub(crate) const MIN_SAMPLES: usize = 64;
/// Refinement budget floor. A curve may always spend as many midpoints as
/// it has uniform samples.
pub(crate) const MAX_SAMPLES: usize = 4096;
/// Ceiling on uniform samples across one window, however wide.
pub(crate) const MAX_WINDOW_SAMPLES: usize = 1 << 15;
/// Uniform samples along a parametric curve before refinement.
const PARAMETRIC_SAMPLES: usize = 256;
/// Consecutive samples further apart than this get a midpoint.
const REFINE_PX: f64 = 4.0;
const MAX_REFINE_DEPTH: u32 = 3;

/// Bucketed sampling window derived from the mapper.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct SampleWindow {
    pub bucket_x: i64,
    pub bucket_y: i64,
    pub x_min: f64,
    pub x_max: f64,
    /// Curve values are clamped into `[y_min, y_max]`.
    pub y_min: f64,
    pub y_max: f64,
}

impl SampleWindow {
    pub(crate) fn for_mapper(mapper: &CoordinateMapper) -> Self {
        let vp = mapper.viewport();
        let scale = mapper.scale();
        let visible = mapper.visible_math_bounds();

        let bx = vp.width.max(1.0) * 0.5 / scale;
        let by = vp.height.max(1.0) * 0.5 / scale;
        let kx = (visible.min_x / bx).floor();
        let ky = (visible.min_y / by).floor();

        // The visible range spans two buckets; one bucket of slack on the
        // left, up to two on the right. The y band is far wider still.
        Self {
            bucket_x: kx as i64,
            bucket_y: ky as i64,
            x_min: (kx - 1.0) * bx,
            x_max: (kx + 3.0) * bx,
            y_min: (ky - 5.0) * by,
            y_max: (ky + 7.0) * by,
        }
    }

    /// Uniform samples that keep the whole window at the theme's pixel
    /// spacing; grows with the viewport.
    pub(crate) fn sample_cap(&self, ctx: &PlanContext<'_>) -> usize {
        sample_count(self.x_min, self.x_max, ctx, MAX_WINDOW_SAMPLES)
    }

    #[inline]
    pub(crate) fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.y_min, self.y_max)
    }
}

/// Uniform sample count for `[lo, hi]` at roughly `sample_px` pixels apart.
pub(crate) fn sample_count(lo: f64, hi: f64, ctx: &PlanContext<'_>, cap: usize) -> usize {
    let px = ctx.theme.function_sample_px.max(0.5);
    let n = ((hi - lo) * ctx.mapper.scale() / px).ceil();
    if n.is_finite() {
        (n as usize).clamp(MIN_SAMPLES, cap)
    } else {
        cap
    }
}

pub(crate) fn build_function(
    plan: &mut Plan,
    plot: &FunctionPlot,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let window = SampleWindow::for_mapper(ctx.mapper);
    let (mut lo, mut hi) = (window.x_min, window.x_max);
    if let Some((a, b)) = plot.domain {
        lo = lo.max(finite(styled, a, "domain")?);
        hi = hi.min(finite(styled, b, "domain")?);
    }
    if lo >= hi {
        return Ok(());
    }

    let n = sample_count(lo, hi, ctx, window.sample_cap(ctx));
    let f = &plot.function;
    let runs = trace(lo, hi, n, jump_limit(ctx), |x| {
        let y = f.eval(x);
        y.is_finite()
            .then(|| ctx.mapper.math_to_screen(Vec2::new(x, window.clamp_y(y))))
    });
    push_runs(plan, runs, styled);
    Ok(())
}

pub(crate) fn build_piecewise(
    plan: &mut Plan,
    function: &PiecewiseFunction,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let window = SampleWindow::for_mapper(ctx.mapper);
    let cap = window.sample_cap(ctx);
    let gap = 1.0 / ctx.mapper.scale();

    for piece in &function.pieces {
        let lo = match piece.left {
            Some(l) => finite(styled, l, "left")?.max(window.x_min),
            None => window.x_min,
        };
        let hi = match piece.right {
            Some(r) => finite(styled, r, "right")?.min(window.x_max),
            None => window.x_max,
        };
        for (a, b) in split_at_holes(lo, hi, piece, gap) {
            let n = sample_count(a, b, ctx, cap);
            let runs = trace(a, b, n, jump_limit(ctx), |x| {
                let y = piece.eval(x);
                y.is_finite()
                    .then(|| ctx.mapper.math_to_screen(Vec2::new(x, window.clamp_y(y))))
            });
            push_runs(plan, runs, styled);
        }
    }
    Ok(())
}

/// Sub-ranges of `[lo, hi]` that stay `gap` away from the piece's holes.
fn split_at_holes(lo: f64, hi: f64, piece: &FunctionPiece, gap: f64) -> Vec<(f64, f64)> {
    let mut holes: Vec<f64> = piece
        .undefined_at
        .iter()
        .copied()
        .filter(|h| h.is_finite() && *h > lo && *h < hi)
        .collect();
    holes.sort_by(f64::total_cmp);

    let mut ranges = Vec::with_capacity(holes.len() + 1);
    let mut start = lo;
    for h in holes {
        if h - gap > start {
            ranges.push((start, h - gap));
        }
        start = start.max(h + gap);
    }
    if hi > start {
        ranges.push((start, hi));
    }
    ranges
}

pub(crate) fn build_parametric(
    plan: &mut Plan,
    curve: &ParametricCurve,
    styled: &Styled<'_>,
    ctx: &PlanContext<'_>,
) -> Result<(), RenderError> {
    let t0 = finite(styled, curve.t_min, "t_min")?;
    let t1 = finite(styled, curve.t_max, "t_max")?;
    if t0 == t1 {
        return Ok(());
    }

    let runs = trace(t0, t1, PARAMETRIC_SAMPLES, jump_limit(ctx), |t| {
        let p = Vec2::new(curve.x.eval(t), curve.y.eval(t));
        p.is_finite().then(|| ctx.mapper.math_to_screen(p))
    });
    push_runs(plan, runs, styled);
    Ok(())
}

#[inline]
fn jump_limit(ctx: &PlanContext<'_>) -> f64 {
    2.0 * ctx.mapper.viewport().height.max(1.0)
}

fn push_runs(plan: &mut Plan, runs: Vec<Vec<Vec2>>, styled: &Styled<'_>) {
    for points in runs {
        plan.push(Primitive::StrokePolyline { points, stroke: styled.stroke });
    }
}

// ── sampling ──────────────────────────────────────────────────────────────

/// Samples `eval` at `n + 1` evenly spaced parameters over `[t0, t1]`,
/// refines wide gaps, and splits the result into drawable runs.
///
/// `eval` returns `None` where the curve is undefined. Runs break there and
/// wherever consecutive points jump further than `jump_px` (asymptotes).
/// Runs shorter than two points are dropped.
pub(crate) fn trace<F>(t0: f64, t1: f64, n: usize, jump_px: f64, mut eval: F) -> Vec<Vec<Vec2>>
where
    F: FnMut(f64) -> Option<Vec2>,
{
    let n = n.max(1);
    let step = (t1 - t0) / n as f64;
    let mut budget = MAX_SAMPLES.max(2 * (n + 1)) - (n + 1);
    let mut seq: Vec<Option<Vec2>> = Vec::with_capacity(n + 1);
    let mut prev: Option<(f64, Vec2)> = None;

    for i in 0..=n {
        let t = if i == n { t1 } else { t0 + i as f64 * step };
        let p = eval(t);
        if let (Some(a), Some(b)) = (prev, p) {
            refine(&mut eval, a, (t, b), 0, &mut budget, &mut seq);
        }
        seq.push(p);
        prev = p.map(|p| (t, p));
    }

    split_runs(seq, jump_px)
}

fn refine<F>(
    eval: &mut F,
    a: (f64, Vec2),
    b: (f64, Vec2),
    depth: u32,
    budget: &mut usize,
    out: &mut Vec<Option<Vec2>>,
) where
    F: FnMut(f64) -> Option<Vec2>,
{
    if depth >= MAX_REFINE_DEPTH || *budget == 0 || a.1.distance(b.1) <= REFINE_PX {
        return;
    }
    *budget -= 1;
    let tm = 0.5 * (a.0 + b.0);
    match eval(tm) {
        Some(pm) => {
            refine(eval, a, (tm, pm), depth + 1, budget, out);
            out.push(Some(pm));
            refine(eval, (tm, pm), b, depth + 1, budget, out);
        }
        None => out.push(None),
    }
}

fn split_runs(seq: Vec<Option<Vec2>>, jump_px: f64) -> Vec<Vec<Vec2>> {
    let mut runs = Vec::new();
    let mut run: Vec<Vec2> = Vec::new();

    for p in seq {
        match p {
            Some(p) => {
                if run.last().is_some_and(|last| (p.y - last.y).abs() > jump_px) {
                    flush(&mut runs, &mut run);
                }
                run.push(p);
            }
            None => flush(&mut runs, &mut run),
        }
    }
    flush(&mut runs, &mut run);
    runs
}

fn flush(runs: &mut Vec<Vec<Vec2>>, run: &mut Vec<Vec2>) {
    let taken = std::mem::take(run);
    if taken.len() >= 2 {
        runs.push(taken);
    }
}
