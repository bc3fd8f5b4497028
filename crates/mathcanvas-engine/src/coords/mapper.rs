use super::{Rect, Vec2, Viewport};

/// Visible region in math space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MathBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MathBounds {
    #[inline]
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Default scale limits. Wide enough for any sane zoom, tight enough that
/// `1.0 / scale` and `x * scale` never overflow for on-screen values.
const MIN_SCALE: f64 = 1e-6;
const MAX_SCALE: f64 = 1e6;

/// Math-space to screen-space transform.
///
/// Mapping (y axis flipped, screen +Y points down):
///
/// ```text
/// sx = pan.x + x * scale
/// sy = pan.y - y * scale
/// ```
///
/// `pan` is therefore the screen position of the math origin. The mapper is
/// stateless with respect to drawables; every query recomputes from the three
/// parameters (`scale`, `pan`, `viewport`).
///
/// Invariant: `scale` is finite and positive. Mutators reject inputs that
/// would break it instead of returning errors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateMapper {
    scale: f64,
    pan: Vec2,
    viewport: Viewport,
    min_scale: f64,
    max_scale: f64,
}

impl CoordinateMapper {
    /// Creates a mapper with the math origin at the viewport center.
    pub fn new(viewport: Viewport, scale: f64) -> Self {
        Self::with_pan(viewport, scale, viewport.center())
    }

    /// Creates a mapper with an explicit origin position in screen space.
    pub fn with_pan(viewport: Viewport, scale: f64, pan: Vec2) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            log::debug!("mapper: invalid initial scale {scale}, using 1.0");
            1.0
        };
        Self {
            scale,
            pan,
            viewport,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }

    /// Restricts zooming to `[min, max]`. Invalid limits are ignored.
    pub fn with_scale_limits(mut self, min: f64, max: f64) -> Self {
        if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
            self.min_scale = min;
            self.max_scale = max;
            self.scale = self.scale.clamp(min, max);
        }
        self
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // ── transforms ─────────────────────────────────────────────────────────

    #[inline]
    pub fn math_to_screen(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.pan.x + p.x * self.scale, self.pan.y - p.y * self.scale)
    }

    #[inline]
    pub fn screen_to_math(&self, s: Vec2) -> Vec2 {
        Vec2::new((s.x - self.pan.x) / self.scale, (self.pan.y - s.y) / self.scale)
    }

    /// Scales a math-space length (radius, width) to pixels. Unaffected by pan.
    #[inline]
    pub fn scale_value(&self, v: f64) -> f64 {
        v * self.scale
    }

    /// Inverse of [`scale_value`](Self::scale_value).
    #[inline]
    pub fn unscale_value(&self, px: f64) -> f64 {
        px / self.scale
    }

    /// Math-space region covered by the viewport.
    pub fn visible_math_bounds(&self) -> MathBounds {
        let a = self.screen_to_math(Vec2::zero());
        let b = self.screen_to_math(Vec2::new(self.viewport.width, self.viewport.height));
        MathBounds {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Maps a math-space axis-aligned box to its screen-space rect.
    pub fn math_rect_to_screen(&self, bounds: MathBounds) -> Rect {
        let a = self.math_to_screen(Vec2::new(bounds.min_x, bounds.max_y));
        let b = self.math_to_screen(Vec2::new(bounds.max_x, bounds.min_y));
        Rect::from_min_max(a, b)
    }

    // ── mutators ───────────────────────────────────────────────────────────

    /// Shifts the view by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            log::debug!("mapper: ignoring non-finite pan ({dx}, {dy})");
            return;
        }
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Multiplies the scale by `factor`, keeping the math point under
    /// `anchor` (screen space) fixed on screen.
    ///
    /// Non-finite or non-positive factors are ignored. The resulting scale
    /// is clamped to the configured limits; the anchor stays fixed for the
    /// factor actually applied.
    pub fn zoom(&mut self, factor: f64, anchor: Vec2) {
        if !(factor.is_finite() && factor > 0.0) || !anchor.is_finite() {
            log::debug!("mapper: ignoring zoom factor {factor} at {anchor:?}");
            return;
        }
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        let applied = new_scale / self.scale;
        self.pan = anchor - (anchor - self.pan) * applied;
        self.scale = new_scale;
    }

    /// Changes the viewport size, keeping the math point at the old center
    /// at the new center.
    pub fn resize(&mut self, width: f64, height: f64) {
        let next = Viewport::new(width, height);
        if !next.is_valid() {
            log::debug!("mapper: ignoring invalid resize {width}x{height}");
            return;
        }
        let shift = next.center() - self.viewport.center();
        self.pan = self.pan + shift;
        self.viewport = next;
    }

    /// Replaces pan and scale directly (e.g. restoring a saved view).
    pub fn set_view(&mut self, scale: f64, pan: Vec2) {
        if scale.is_finite() && scale > 0.0 && pan.is_finite() {
            self.scale = scale.clamp(self.min_scale, self.max_scale);
            self.pan = pan;
        } else {
            log::debug!("mapper: ignoring invalid view scale={scale} pan={pan:?}");
        }
    }
}
