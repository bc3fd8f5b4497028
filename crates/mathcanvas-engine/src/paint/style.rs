use super::Color;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn as_str(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Outline style. `width` is in screen pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub join: LineJoin,
    pub cap: LineCap,
}

impl StrokeStyle {
    #[inline]
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            join: LineJoin::default(),
            cap: LineCap::default(),
        }
    }

    #[inline]
    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    #[inline]
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }
}

/// Fill style. `opacity` multiplies the color alpha.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub opacity: f64,
}

impl FillStyle {
    #[inline]
    pub fn new(color: Color) -> Self {
        Self { color, opacity: 1.0 }
    }

    #[inline]
    pub fn with_opacity(color: Color, opacity: f64) -> Self {
        Self { color, opacity }
    }

    /// Color with opacity folded into alpha.
    #[inline]
    pub fn effective_color(&self) -> Color {
        self.color.with_opacity(self.opacity)
    }
}

/// Font description. `size` is in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    pub family: String,
    pub size: f64,
    pub weight: u16,
}

impl FontStyle {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            weight: 400,
        }
    }

    /// CSS font shorthand, e.g. `"400 12px sans-serif"`.
    pub fn to_css(&self) -> String {
        format!("{} {}px {}", self.weight, trim_number(self.size), self.family)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

/// Text anchor relative to the draw position.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextAlign {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl TextAlign {
    #[inline]
    pub const fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        Self { horizontal, vertical }
    }

    #[inline]
    pub const fn centered() -> Self {
        Self::new(HorizontalAlign::Center, VerticalAlign::Middle)
    }
}

/// Formats a pixel value without trailing zeros (`12.0` -> `"12"`, `1.25` -> `"1.25"`).
pub(crate) fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.3}");
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" { "0".to_string() } else { s.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_css_shorthand() {
        assert_eq!(FontStyle::new("sans-serif", 12.0).to_css(), "400 12px sans-serif");
        assert_eq!(FontStyle::new("serif", 9.5).to_css(), "400 9.5px serif");
    }

    #[test]
    fn trim_number_drops_zeros() {
        assert_eq!(trim_number(3.0), "3");
        assert_eq!(trim_number(-0.5), "-0.5");
        assert_eq!(trim_number(1.23456), "1.235");
        assert_eq!(trim_number(0.0001), "0");
    }

    #[test]
    fn fill_opacity_folds_into_alpha() {
        let fill = FillStyle::with_opacity(Color::BLACK, 0.5);
        assert_eq!(fill.effective_color().a, 0.5);
    }
}
