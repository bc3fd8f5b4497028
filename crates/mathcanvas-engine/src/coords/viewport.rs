/// Drawing surface size in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn center(self) -> super::Vec2 {
        super::Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Full-surface rect in screen space.
    #[inline]
    pub fn rect(self) -> super::Rect {
        super::Rect::new(0.0, 0.0, self.width, self.height)
    }
}
