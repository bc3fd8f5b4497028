//! Coordinate and geometry types shared by builders and renderers.
//!
//! Two spaces are in play:
//! - math space: user units, origin anywhere, +Y up
//! - screen space: surface pixels, origin top-left, +Y down
//!
//! [`CoordinateMapper`] is the only place that converts between them.

mod mapper;
mod rect;
mod vec2;
mod viewport;

pub use mapper::{CoordinateMapper, MathBounds};
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
