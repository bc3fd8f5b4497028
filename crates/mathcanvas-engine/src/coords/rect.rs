use super::Vec2;

/// Axis-aligned rectangle in screen space (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Smallest rect containing every point. `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::from_min_max(min, max))
    }

    /// Rect with half-extents `radius_x`/`radius_y` around `center`.
    #[inline]
    pub fn around(center: Vec2, radius_x: f64, radius_y: f64) -> Self {
        Rect::new(
            center.x - radius_x,
            center.y - radius_y,
            radius_x * 2.0,
            radius_y * 2.0,
        )
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x * 0.5, self.origin.y + self.size.y * 0.5)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Grows the rect by `amount` on every side.
    #[inline]
    pub fn inflate(self, amount: f64) -> Self {
        let r = self.normalized();
        Rect::new(
            r.origin.x - amount,
            r.origin.y - amount,
            r.size.x + amount * 2.0,
            r.size.y + amount * 2.0,
        )
    }

    #[inline]
    pub fn translate(self, delta: Vec2) -> Self {
        Rect::from_origin_size(self.origin + delta, self.size)
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn union(self, other: Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();
        let min = Vec2::new(a.origin.x.min(b.origin.x), a.origin.y.min(b.origin.y));
        let max = Vec2::new(a.max().x.max(b.max().x), a.max().y.max(b.max().y));
        Rect::from_min_max(min, max)
    }

    /// Closed containment: [min, max].
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x <= (r.origin.x + r.size.x)
            && p.y <= (r.origin.y + r.size.y)
    }

    /// Closed overlap test. Touching edges count, so a zero-width rect
    /// (a vertical line) lying on the viewport edge is still visible.
    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.origin.x <= b.max().x
            && b.origin.x <= a.max().x
            && a.origin.y <= b.max().y
            && b.origin.y <= a.max().y
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f64, y: f64, w: f64, h: f64) -> Rect { Rect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_width() {
        let n = r(10.0, 0.0, -4.0, 5.0).normalized();
        assert_eq!(n.origin.x, 6.0);
        assert_eq!(n.size.x, 4.0);
    }

    // ── from_points / union ───────────────────────────────────────────────

    #[test]
    fn from_points_spans_extremes() {
        let rect = Rect::from_points([
            Vec2::new(3.0, -1.0),
            Vec2::new(-2.0, 4.0),
            Vec2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(rect, r(-2.0, -1.0, 5.0, 5.0));
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Rect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn union_covers_both() {
        let u = r(0.0, 0.0, 2.0, 2.0).union(r(5.0, -3.0, 1.0, 1.0));
        assert_eq!(u, r(0.0, -3.0, 6.0, 5.0));
    }

    #[test]
    fn inflate_grows_every_side() {
        assert_eq!(r(10.0, 10.0, 4.0, 4.0).inflate(2.0), r(8.0, 8.0, 8.0, 8.0));
    }

    // ── intersects ────────────────────────────────────────────────────────

    #[test]
    fn intersects_touching_edge() {
        // A line lying exactly on the edge must still be considered visible.
        assert!(r(0.0, 0.0, 10.0, 10.0).intersects(r(10.0, 2.0, 0.0, 5.0)));
    }

    #[test]
    fn intersects_disjoint() {
        assert!(!r(0.0, 0.0, 5.0, 5.0).intersects(r(20.0, 20.0, 5.0, 5.0)));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let i = r(0.0, 0.0, 10.0, 10.0).intersect(r(5.0, 5.0, 10.0, 10.0)).unwrap();
        assert_eq!(i, r(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        // Zero-area overlap is not an intersection, unlike `intersects`.
        assert!(r(0.0, 0.0, 10.0, 10.0).intersect(r(10.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn contains_is_closed() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(-0.5, 5.0)));
    }
}
