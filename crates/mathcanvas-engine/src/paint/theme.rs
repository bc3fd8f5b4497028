use super::Color;

/// Global render style defaults.
///
/// Builders fall back to these values when a drawable carries no override.
/// All sizes are screen pixels unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub font_family: String,
    pub background: Color,
    pub default_color: Color,
    pub stroke_width: f64,

    pub point_radius: f64,
    pub point_label_font_size: f64,

    pub label_font_size: f64,
    /// Labels never shrink below this size while visible.
    pub label_min_font_px: f64,
    /// A shrinking label whose computed size drops below this disappears.
    pub label_vanish_px: f64,
    pub label_line_height: f64,

    pub vector_tip_size: f64,

    pub angle_arc_radius: f64,
    pub angle_text_radius_factor: f64,
    pub angle_label_font_size: f64,

    pub circle_arc_radius_scale: f64,

    pub area_fill: Color,
    pub area_opacity: f64,

    pub bar_label_font_size: f64,
    /// Gap between a bar edge and its label.
    pub bar_label_padding_px: f64,

    /// Target distance between consecutive function samples.
    pub function_sample_px: f64,

    pub axis_color: Color,
    pub grid_color: Color,
    pub axis_label_color: Color,
    pub tick_size: f64,
    pub tick_font_size: f64,
    pub minor_grid_width: f64,
    /// Smallest on-screen spacing between major grid lines.
    pub min_grid_spacing_px: f64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "Inter, sans-serif".to_string(),
            background: Color::WHITE,
            default_color: Color::BLACK,
            stroke_width: 1.0,

            point_radius: 3.0,
            point_label_font_size: 10.0,

            label_font_size: 14.0,
            label_min_font_px: 6.0,
            label_vanish_px: 3.0,
            label_line_height: 1.2,

            vector_tip_size: 12.0,

            angle_arc_radius: 20.0,
            angle_text_radius_factor: 1.8,
            angle_label_font_size: 10.0,

            circle_arc_radius_scale: 1.0,

            area_fill: Color::LIGHT_BLUE,
            area_opacity: 0.3,

            bar_label_font_size: 12.0,
            bar_label_padding_px: 6.0,

            function_sample_px: 2.0,

            axis_color: Color::BLACK,
            grid_color: Color::LIGHT_GREY,
            axis_label_color: Color::GREY,
            tick_size: 3.0,
            tick_font_size: 8.0,
            minor_grid_width: 0.5,
            min_grid_spacing_px: 40.0,
        }
    }
}
