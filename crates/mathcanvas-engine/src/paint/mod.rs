//! Paint model shared between plan builders and renderers.
//!
//! Scope:
//! - color representation (straight alpha, CSS and premultiplied output)
//! - stroke, fill and font styles carried by primitive commands
//! - the global [`Theme`] of default sizes and colors
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod style;
pub mod theme;

pub use color::{Color, ColorParseError};
pub use style::{
    FillStyle, FontStyle, HorizontalAlign, LineCap, LineJoin, StrokeStyle, TextAlign,
    VerticalAlign,
};
pub use theme::Theme;
