/// Minimal 2D drawing context.
///
/// Angles are radians, clockwise on screen. Style setters take CSS strings.
pub trait Canvas2d {
    fn set_size(&mut self, width: f64, height: f64);

    fn set_stroke_style(&mut self, css: &str);
    fn set_fill_style(&mut self, css: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_join(&mut self, join: &str);
    fn set_line_cap(&mut self, cap: &str);
    fn set_font(&mut self, css: &str);
    fn set_text_align(&mut self, align: &str);
    fn set_text_baseline(&mut self, baseline: &str);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    );
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn fill(&mut self);

    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Copies `source` onto this surface at the origin.
    fn draw_surface(&mut self, source: &Self);
}

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCall {
    SetSize { width: f64, height: f64 },
    StrokeStyle(String),
    FillStyle(String),
    LineWidth(f64),
    LineJoin(String),
    LineCap(String),
    Font(String),
    TextAlign(String),
    TextBaseline(String),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool },
    Ellipse { x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64 },
    ClosePath,
    Stroke,
    Fill,
    FillText { text: String, x: f64, y: f64 },
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    /// `draw_surface` with the number of calls the source held.
    DrawSurface { source_calls: usize },
}

/// Headless canvas that records calls.
///
/// `clear_rect` over the whole surface drops the recorded history, which
/// mirrors what a raster surface keeps after a full clear.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    calls: Vec<CanvasCall>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, calls: Vec::new() }
    }

    #[inline]
    pub fn calls(&self) -> &[CanvasCall] {
        &self.calls
    }

    #[inline]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn count(&self, pred: impl Fn(&CanvasCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    #[inline]
    fn push(&mut self, call: CanvasCall) {
        self.calls.push(call);
    }
}

impl Canvas2d for RecordingCanvas {
    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        // Resizing a canvas resets its bitmap.
        self.calls.clear();
        self.push(CanvasCall::SetSize { width, height });
    }

    fn set_stroke_style(&mut self, css: &str) {
        self.push(CanvasCall::StrokeStyle(css.to_string()));
    }

    fn set_fill_style(&mut self, css: &str) {
        self.push(CanvasCall::FillStyle(css.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(CanvasCall::LineWidth(width));
    }

    fn set_line_join(&mut self, join: &str) {
        self.push(CanvasCall::LineJoin(join.to_string()));
    }

    fn set_line_cap(&mut self, cap: &str) {
        self.push(CanvasCall::LineCap(cap.to_string()));
    }

    fn set_font(&mut self, css: &str) {
        self.push(CanvasCall::Font(css.to_string()));
    }

    fn set_text_align(&mut self, align: &str) {
        self.push(CanvasCall::TextAlign(align.to_string()));
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        self.push(CanvasCall::TextBaseline(baseline.to_string()));
    }

    fn begin_path(&mut self) {
        self.push(CanvasCall::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(CanvasCall::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(CanvasCall::LineTo(x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.push(CanvasCall::Arc { x, y, radius, start, end, anticlockwise });
    }

    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        _start: f64,
        _end: f64,
        _anticlockwise: bool,
    ) {
        self.push(CanvasCall::Ellipse { x, y, radius_x, radius_y, rotation });
    }

    fn close_path(&mut self) {
        self.push(CanvasCall::ClosePath);
    }

    fn stroke(&mut self) {
        self.push(CanvasCall::Stroke);
    }

    fn fill(&mut self) {
        self.push(CanvasCall::Fill);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(CanvasCall::FillText { text: text.to_string(), x, y });
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let covers = x <= 0.0 && y <= 0.0 && x + width >= self.width && y + height >= self.height;
        if covers {
            self.calls.clear();
        }
        self.push(CanvasCall::ClearRect { x, y, width, height });
    }

    fn draw_surface(&mut self, source: &Self) {
        self.push(CanvasCall::DrawSurface { source_calls: source.calls.len() });
    }
}
