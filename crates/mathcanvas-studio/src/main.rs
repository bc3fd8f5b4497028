use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mathcanvas_engine::coords::{CoordinateMapper, Vec2, Viewport};
use mathcanvas_engine::core::Engine;
use mathcanvas_engine::device::{Gpu, GpuInit};
use mathcanvas_engine::drawable::{
    Angle, AreaBoundary, BarChart, Cartesian, Circle, CircleArc, ClosedArea, ClosedOutline,
    ColoredArea, Drawable, DrawableStyle, Ellipse, FunctionPiece, FunctionPlot, Graph, Label,
    ParametricCurve, PiecewiseFunction, PlotFunction, Point, Segment, Shape,
};
use mathcanvas_engine::frame::{FrameConfig, FrameOrchestrator, LabelConfig};
use mathcanvas_engine::logging::{init_logging, LoggingConfig};
use mathcanvas_engine::paint::{Color, Theme};
use mathcanvas_engine::render::svg::SvgBackend;
use mathcanvas_engine::render::{create_backend, BackendConfig, BackendKind, BackendRequest};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 640.0;
const SCALE: f64 = 60.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = BackendConfig::from_env();
    let viewport = Viewport::new(WIDTH, HEIGHT);

    let mut request = BackendRequest::new(viewport).with_config(config);
    match Gpu::request(GpuInit::default()) {
        Ok(gpu) => request = request.with_gpu(gpu),
        Err(err) => log::warn!("studio: no GPU device, falling back: {err:#}"),
    }

    let renderer = create_backend(&[BackendKind::Gpu, BackendKind::Svg, BackendKind::Canvas], request)
        .context("failed to create a renderer")?;

    let mapper = CoordinateMapper::new(viewport, SCALE);
    let mut engine = Engine::new(renderer, mapper, frame_config());
    log::info!("studio: rendering with the {} backend", engine.backend_kind());

    let scene = demo_scene();

    let report = engine.draw(&scene, false);
    log::info!("studio: first frame drew {} of {} drawables", report.drawn, scene.len());

    engine.draw(&scene, false);

    engine.pan(-40.0, 25.0);
    engine.draw(&scene, true);

    let center = viewport.center();
    engine.zoom(1.5, center);
    let report = engine.draw(&scene, true);
    for (id, err) in &report.failures {
        log::warn!("studio: drawable {id} failed: {err}");
    }

    log::info!("studio: telemetry\n{}", engine.drain_telemetry());

    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("mathcanvas.svg"));
    export_svg(&scene, engine.mapper(), engine.theme(), &out)?;
    log::info!("studio: wrote {}", out.display());

    Ok(())
}

/// Renders the last view through a dedicated SVG backend and writes it out.
fn export_svg(scene: &[Drawable], mapper: &CoordinateMapper, theme: &Theme, path: &Path) -> Result<()> {
    let mut svg = SvgBackend::new(mapper.viewport(), &BackendConfig::default())
        .context("failed to create the SVG exporter")?;
    let mut orchestrator = FrameOrchestrator::new(frame_config());
    orchestrator.draw(scene, mapper, theme, &mut svg, false);

    std::fs::write(path, svg.to_svg_string())
        .with_context(|| format!("failed to write {}", path.display()))
}

fn frame_config() -> FrameConfig {
    FrameConfig {
        labels: LabelConfig { resolve_overlaps: true, ..LabelConfig::default() },
        ..FrameConfig::default()
    }
}

fn demo_scene() -> Vec<Drawable> {
    let blue = Color::rgb_u8(31, 119, 180);
    let red = Color::rgb_u8(214, 39, 40);
    let green = Color::rgb_u8(44, 160, 44);

    let a = Vec2::new(-3.0, -1.0);
    let b = Vec2::new(2.0, -1.5);
    let c = Vec2::new(0.5, 2.5);

    vec![
        Drawable::new(1, Cartesian::default()),
        Drawable::new(
            2,
            ColoredArea {
                upper: AreaBoundary::Function(PlotFunction::new("sin(x) + 2", |x| x.sin() + 2.0)),
                lower: AreaBoundary::XAxis,
                x_range: Some((-2.0, 2.0)),
            },
        ),
        Drawable::new(3, Point { position: a }).with_label("A"),
        Drawable::new(4, Point { position: b }).with_label("B"),
        Drawable::new(5, Point { position: c }).with_label("C"),
        Drawable::new(6, Segment { start: a, end: b }),
        Drawable::new(7, Shape::vector(b, c)).with_style(DrawableStyle::default().with_color(red)),
        Drawable::new(8, Circle { center: Vec2::new(4.0, 2.0), radius: 1.0 })
            .with_style(DrawableStyle::default().with_color(blue).with_fill(blue, 0.2)),
        Drawable::new(
            9,
            Ellipse { center: Vec2::new(-4.5, 2.5), radius_x: 1.5, radius_y: 0.75, rotation: 0.5 },
        ),
        Drawable::new(
            10,
            CircleArc {
                center: Vec2::new(4.0, -2.5),
                radius: 1.0,
                from: Vec2::new(5.0, -2.5),
                to: Vec2::new(4.0, -1.5),
                major: true,
            },
        ),
        Drawable::new(11, Angle { vertex: a, arm1: b, arm2: c, reflex: false }),
        Drawable::new(
            12,
            FunctionPlot { function: PlotFunction::new("x^3 / 8", |x| x * x * x / 8.0), domain: None },
        )
        .with_style(DrawableStyle::default().with_color(green).with_stroke_width(2.0)),
        Drawable::new(
            13,
            ParametricCurve {
                x: PlotFunction::new("2 cos(3t)", |t| 2.0 * (3.0 * t).cos()),
                y: PlotFunction::new("2 sin(2t)", |t| 2.0 * (2.0 * t).sin()),
                t_min: 0.0,
                t_max: std::f64::consts::TAU,
            },
        ),
        Drawable::new(
            14,
            Graph {
                vertices: vec![Vec2::new(-6.0, -3.0), Vec2::new(-4.5, -4.0), Vec2::new(-3.0, -3.0)],
                edges: vec![(0, 1), (1, 2), (2, 0)],
                directed: true,
                vertex_labels: vec!["u".into(), "v".into(), "w".into()],
            },
        ),
        Drawable::new(
            15,
            Label {
                position: Vec2::new(-7.5, 4.8),
                text: "mathcanvas\nplan cache demo".into(),
                font_size: Some(16.0),
                reference_scale: Some(SCALE),
            },
        ),
        Drawable::new(
            16,
            PiecewiseFunction::new(vec![
                FunctionPiece::new(PlotFunction::new("-1", |_| -1.0), Some(5.0), Some(6.0)),
                FunctionPiece::new(PlotFunction::new("x - 7", |x| x - 7.0), Some(6.0), Some(7.5))
                    .with_holes([6.5]),
            ]),
        )
        .with_style(DrawableStyle::default().with_color(red)),
        Drawable::new(
            17,
            ClosedArea {
                outline: ClosedOutline::CircleSegment {
                    circle: Circle { center: Vec2::new(4.0, 2.0), radius: 1.0 },
                    chord: Segment { start: Vec2::new(3.0, 2.0), end: Vec2::new(5.0, 2.0) },
                    clockwise: false,
                },
            },
        ),
        Drawable::new(18, {
            let mut chart = BarChart::new(vec![1.0, 2.5, 1.5]);
            chart.x_start = -7.5;
            chart.y_base = -4.5;
            chart.bar_width = 0.6;
            chart.labels_below = vec!["a".into(), "b".into(), "c".into()];
            chart
        }),
        // Sits on A to exercise label stacking.
        Drawable::new(19, Point { position: a + Vec2::new(0.05, 0.0) }).with_label("A'"),
    ]
}
