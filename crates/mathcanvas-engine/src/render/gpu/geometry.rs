//! CPU-side tessellation of primitives into GPU-ready buffers.
//!
//! Fills and strokes go through lyon's tessellators, so concave outlines and
//! line joins match the 2D backends. Filled circles become instanced discs
//! shaded analytically. Draw order is kept as a list of [`DrawRun`]s so
//! meshes and discs interleave correctly.

use std::f64::consts::TAU;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use lyon::math::point;
use lyon::path::{LineCap as PathCap, LineJoin as PathJoin, Path};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, StrokeOptions,
    StrokeTessellator, StrokeVertex, VertexBuffers,
};

use crate::coords::Vec2;
use crate::paint::{Color, LineCap, LineJoin, StrokeStyle};
use crate::primitive::{normalized_sweep, Primitive};

/// Segments used for full circles and ellipses.
pub const CIRCLE_SEGMENTS: usize = 64;
/// Segments used for any arc, regardless of sweep.
pub const ARC_SEGMENTS: usize = 32;
/// Flattening tolerance for round joins and caps, in pixels.
const TOLERANCE: f32 = 0.1;
/// Matches the 2D canvas default.
const MITER_LIMIT: f32 = 10.0;

// ── GPU types ─────────────────────────────────────────────────────────────

/// Mesh vertex (24 bytes): pixel position, premultiplied color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Disc instance layout (48 bytes):
///
///  offset  0  center       [f32; 2]   loc 1
///  offset  8  radius_bw    [f32; 2]   loc 2  (.x = outer radius, .y = border_width)
///  offset 16  color        [f32; 4]   loc 3
///  offset 32  border_color [f32; 4]   loc 4
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DiscInstance {
    pub center: [f32; 2],
    pub radius_bw: [f32; 2],
    pub color: [f32; 4],
    pub border_color: [f32; 4],
}

impl DiscInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // center
        2 => Float32x2, // radius_bw
        3 => Float32x4, // color
        4 => Float32x4  // border_color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<DiscInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Contiguous draw in paint order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawRun {
    /// Index range into [`GeometryBatch::indices`].
    Mesh(Range<u32>),
    /// Instance range into [`GeometryBatch::discs`].
    Discs(Range<u32>),
}

// ── batch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GeometryBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    discs: Vec<DiscInstance>,
    runs: Vec<DrawRun>,
}

impl GeometryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.discs.clear();
        self.runs.clear();
    }

    #[inline]
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn discs(&self) -> &[DiscInstance] {
        &self.discs
    }

    #[inline]
    pub fn runs(&self) -> &[DrawRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Tessellates one command. Returns `false` for commands this batch
    /// cannot express (text and surface commands).
    pub fn push(&mut self, cmd: &Primitive) -> bool {
        match cmd {
            Primitive::StrokeLine { from, to, stroke } => self.stroke(&[*from, *to], stroke, false),
            Primitive::StrokePolyline { points, stroke } => self.stroke(points, stroke, false),
            Primitive::StrokeCircle { center, radius, stroke } => {
                let ring = ellipse_points(*center, *radius, *radius, 0.0);
                self.stroke(&ring, stroke, true);
            }
            Primitive::FillCircle { center, radius, fill, stroke, .. } => {
                let border = stroke.filter(|s| s.width > 0.0);
                self.disc(*center, *radius, fill.effective_color(), border);
            }
            Primitive::StrokeEllipse { center, radius_x, radius_y, rotation, stroke, fill } => {
                let ring = ellipse_points(*center, *radius_x, *radius_y, *rotation);
                if let Some(fill) = fill {
                    self.fill(&ring, fill.effective_color());
                }
                self.stroke(&ring, stroke, true);
            }
            Primitive::FillPolygon { points, fill, stroke, .. } => {
                self.fill(points, fill.effective_color());
                if let Some(stroke) = stroke {
                    self.stroke(points, stroke, true);
                }
            }
            Primitive::FillJoinedArea { forward, reverse, fill } => {
                // `reverse` already runs backwards, so the chain is a closed ring.
                let ring: Vec<Vec2> = forward.iter().chain(reverse.iter()).copied().collect();
                self.fill(&ring, fill.effective_color());
            }
            Primitive::StrokeArc { center, radius, start_angle, end_angle, clockwise, stroke } => {
                let sweep = normalized_sweep(*start_angle, *end_angle, *clockwise);
                if sweep == 0.0 {
                    return true;
                }
                let points: Vec<Vec2> = (0..=ARC_SEGMENTS)
                    .map(|i| {
                        let a = start_angle + sweep * i as f64 / ARC_SEGMENTS as f64;
                        *center + Vec2::from_polar(*radius, a)
                    })
                    .collect();
                self.stroke(&points, stroke, false);
            }
            Primitive::DrawText { .. } | Primitive::ClearSurface | Primitive::ResizeSurface { .. } => {
                return false;
            }
        }
        true
    }

    /// Non-zero fill of a closed outline. Concave and self-touching outlines
    /// are handled by the sweep tessellator.
    fn fill(&mut self, outline: &[Vec2], color: Color) {
        let Some(path) = outline_path(outline, true, 3) else {
            return;
        };
        let color = color.to_premul_array();
        let options = FillOptions::tolerance(TOLERANCE).with_fill_rule(FillRule::NonZero);
        let mut mesh: VertexBuffers<MeshVertex, u32> = VertexBuffers::new();
        let result = FillTessellator::new().tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut mesh, |v: FillVertex| mesh_vertex(v.position(), color)),
        );
        match result {
            Ok(()) => self.append(&mesh),
            Err(err) => log::warn!("fill tessellation failed ({} points): {err:?}", outline.len()),
        }
    }

    /// Stroke centered on the outline, honoring join and cap.
    fn stroke(&mut self, points: &[Vec2], stroke: &StrokeStyle, closed: bool) {
        if stroke.width <= 0.0 {
            return;
        }
        let Some(path) = outline_path(points, closed, 2) else {
            return;
        };
        let color = stroke.color.to_premul_array();
        let options = StrokeOptions::tolerance(TOLERANCE)
            .with_line_width(stroke.width as f32)
            .with_line_join(path_join(stroke.join))
            .with_line_cap(path_cap(stroke.cap))
            .with_miter_limit(MITER_LIMIT);
        let mut mesh: VertexBuffers<MeshVertex, u32> = VertexBuffers::new();
        let result = StrokeTessellator::new().tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut mesh, |v: StrokeVertex| mesh_vertex(v.position(), color)),
        );
        match result {
            Ok(()) => self.append(&mesh),
            Err(err) => log::warn!("stroke tessellation failed ({} points): {err:?}", points.len()),
        }
    }

    /// The border straddles the radius like a 2D stroke: the disc grows by
    /// half the border width and the shader paints the outer `bw` band.
    fn disc(&mut self, center: Vec2, radius: f64, color: Color, border: Option<StrokeStyle>) {
        if radius <= 0.0 {
            return;
        }
        let (outer, border_width, border_color) = match border {
            Some(s) => (radius + s.width * 0.5, s.width as f32, s.color.to_premul_array()),
            None => (radius, 0.0, [0.0; 4]),
        };
        let index = self.discs.len() as u32;
        self.discs.push(DiscInstance {
            center: [center.x as f32, center.y as f32],
            radius_bw: [outer as f32, border_width],
            color: color.to_premul_array(),
            border_color,
        });
        match self.runs.last_mut() {
            Some(DrawRun::Discs(range)) => range.end = index + 1,
            _ => self.runs.push(DrawRun::Discs(index..index + 1)),
        }
    }

    fn append(&mut self, mesh: &VertexBuffers<MeshVertex, u32>) {
        let base = self.vertices.len() as u32;
        let start = self.indices.len() as u32;
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend(mesh.indices.iter().map(|i| base + i));
        self.extend_mesh_run(start);
    }

    fn extend_mesh_run(&mut self, start: u32) {
        let end = self.indices.len() as u32;
        if end == start {
            return;
        }
        match self.runs.last_mut() {
            Some(DrawRun::Mesh(range)) if range.end == start => range.end = end,
            _ => self.runs.push(DrawRun::Mesh(start..end)),
        }
    }
}

#[inline]
fn mesh_vertex(p: lyon::math::Point, color: [f32; 4]) -> MeshVertex {
    MeshVertex { pos: [p.x, p.y], color }
}

/// Builds a lyon path after dropping coincident neighbours. `None` when
/// fewer than `min` distinct points remain.
fn outline_path(points: &[Vec2], closed: bool, min: usize) -> Option<Path> {
    let mut kept: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points.iter().filter(|p| p.x.is_finite() && p.y.is_finite()) {
        if kept.last().is_none_or(|last| last.distance(*p) > f64::EPSILON) {
            kept.push(*p);
        }
    }
    if closed && kept.len() > 1 && kept[0].distance(kept[kept.len() - 1]) <= f64::EPSILON {
        kept.pop();
    }
    if kept.len() < min {
        return None;
    }
    let mut builder = Path::builder();
    builder.begin(point(kept[0].x as f32, kept[0].y as f32));
    for p in &kept[1..] {
        builder.line_to(point(p.x as f32, p.y as f32));
    }
    builder.end(closed);
    Some(builder.build())
}

fn path_join(join: LineJoin) -> PathJoin {
    match join {
        LineJoin::Miter => PathJoin::Miter,
        LineJoin::Round => PathJoin::Round,
        LineJoin::Bevel => PathJoin::Bevel,
    }
}

fn path_cap(cap: LineCap) -> PathCap {
    match cap {
        LineCap::Butt => PathCap::Butt,
        LineCap::Round => PathCap::Round,
        LineCap::Square => PathCap::Square,
    }
}

fn ellipse_points(center: Vec2, rx: f64, ry: f64, rotation: f64) -> Vec<Vec2> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let (sin_r, cos_r) = rotation.sin_cos();
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let t = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            let (x, y) = (rx * t.cos(), ry * t.sin());
            center + Vec2::new(x * cos_r - y * sin_r, x * sin_r + y * cos_r)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{FillStyle, FontStyle, TextAlign};

    fn stroke() -> StrokeStyle {
        StrokeStyle::new(Color::BLACK, 2.0)
    }

    fn line(x: f64) -> Primitive {
        Primitive::StrokeLine { from: Vec2::new(x, 0.0), to: Vec2::new(x, 10.0), stroke: stroke() }
    }

    fn dot(x: f64) -> Primitive {
        Primitive::FillCircle {
            center: Vec2::new(x, 5.0),
            radius: 4.0,
            fill: FillStyle::new(Color::BLACK),
            stroke: None,
            screen_space: true,
        }
    }

    fn polygon(points: &[(f64, f64)]) -> Primitive {
        Primitive::FillPolygon {
            points: points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            fill: FillStyle::new(Color::BLACK),
            stroke: None,
            screen_space: false,
        }
    }

    fn triangles(batch: &GeometryBatch) -> Vec<[[f32; 2]; 3]> {
        batch
            .indices()
            .chunks(3)
            .map(|t| [0, 1, 2].map(|k| batch.vertices()[t[k] as usize].pos))
            .collect()
    }

    fn area(t: &[[f32; 2]; 3]) -> f64 {
        let [a, b, c] = t.map(|p| (p[0] as f64, p[1] as f64));
        ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1)).abs() * 0.5
    }

    fn covers(t: &[[f32; 2]; 3], p: (f64, f64)) -> bool {
        let [a, b, c] = t.map(|q| (q[0] as f64, q[1] as f64));
        let side = |u: (f64, f64), v: (f64, f64)| (v.0 - u.0) * (p.1 - u.1) - (v.1 - u.1) * (p.0 - u.0);
        let (d1, d2, d3) = (side(a, b), side(b, c), side(c, a));
        (d1 > 0.0 && d2 > 0.0 && d3 > 0.0) || (d1 < 0.0 && d2 < 0.0 && d3 < 0.0)
    }

    // ── strokes ──

    #[test]
    fn line_becomes_band() {
        let mut batch = GeometryBatch::new();
        assert!(batch.push(&line(5.0)));
        assert!(batch.indices().len() >= 6);
        assert_eq!(batch.runs(), &[DrawRun::Mesh(0..batch.indices().len() as u32)]);

        // vertical line of width 2, butt caps: x in [4, 6], y in [0, 10]
        for v in batch.vertices() {
            assert!((v.pos[0] - 4.0).abs() < 1e-4 || (v.pos[0] - 6.0).abs() < 1e-4, "{:?}", v.pos);
            assert!((-1e-4..=10.0001).contains(&v.pos[1]), "{:?}", v.pos);
        }
        let covered: f64 = triangles(&batch).iter().map(area).sum();
        assert!((covered - 20.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_strokes_are_dropped() {
        let mut batch = GeometryBatch::new();
        batch.push(&Primitive::StrokeLine { from: Vec2::new(1.0, 1.0), to: Vec2::new(1.0, 1.0), stroke: stroke() });
        batch.push(&Primitive::StrokeLine {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(1.0, 1.0),
            stroke: StrokeStyle::new(Color::BLACK, 0.0),
        });
        assert!(batch.is_empty());
    }

    #[test]
    fn circle_outline_is_centered_on_radius() {
        let mut batch = GeometryBatch::new();
        batch.push(&Primitive::StrokeCircle { center: Vec2::new(0.0, 0.0), radius: 10.0, stroke: stroke() });
        assert_eq!(batch.runs().len(), 1);
        for v in batch.vertices() {
            let d = (v.pos[0] as f64).hypot(v.pos[1] as f64);
            assert!((8.9..=11.1).contains(&d), "vertex at distance {d}");
        }
    }

    #[test]
    fn arc_stays_in_its_band() {
        let mut batch = GeometryBatch::new();
        batch.push(&Primitive::StrokeArc {
            center: Vec2::new(0.0, 0.0),
            radius: 10.0,
            start_angle: 0.0,
            end_angle: 1.0,
            clockwise: true,
            stroke: stroke(),
        });
        assert!(!batch.indices().is_empty());
        for v in batch.vertices() {
            let d = (v.pos[0] as f64).hypot(v.pos[1] as f64);
            assert!((8.9..=11.1).contains(&d), "vertex at distance {d}");
        }
    }

    #[test]
    fn polyline_corner_is_joined() {
        let mut batch = GeometryBatch::new();
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        batch.push(&Primitive::StrokePolyline { points, stroke: stroke() });
        // the miter fills the outer corner square at (10..11, -1..0)
        assert!(triangles(&batch).iter().any(|t| covers(t, (10.7, -0.4))));
    }

    #[test]
    fn bevel_join_cuts_the_corner() {
        let mut batch = GeometryBatch::new();
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let stroke = stroke().with_join(LineJoin::Bevel);
        batch.push(&Primitive::StrokePolyline { points, stroke });
        assert!(!triangles(&batch).iter().any(|t| covers(t, (10.9, -0.9))));
    }

    // ── fills ──

    #[test]
    fn convex_polygon_covers_its_area() {
        let mut batch = GeometryBatch::new();
        batch.push(&polygon(&[(0.0, 0.0), (10.0, 0.0), (12.0, 5.0), (5.0, 10.0), (-2.0, 5.0)]));
        let covered: f64 = triangles(&batch).iter().map(area).sum();
        // shoelace area of the pentagon
        assert!((covered - 95.0).abs() < 1e-3, "covered {covered}");
    }

    #[test]
    fn concave_polygon_leaves_the_notch_empty() {
        let mut batch = GeometryBatch::new();
        batch.push(&polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (5.0, 3.0), (0.0, 10.0)]));
        let tris = triangles(&batch);
        assert!(!tris.is_empty());
        assert!(!tris.iter().any(|t| covers(t, (6.0, 5.5))), "notch point covered");
        assert!(tris.iter().any(|t| covers(t, (4.0, 1.0))));
        let covered: f64 = tris.iter().map(area).sum();
        assert!((covered - 65.0).abs() < 1e-3, "covered {covered}");
    }

    #[test]
    fn joined_area_fills_between_boundaries() {
        let mut batch = GeometryBatch::new();
        let forward = vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)];
        let reverse = vec![Vec2::new(10.0, 8.0), Vec2::new(0.0, 8.0)];
        batch.push(&Primitive::FillJoinedArea {
            forward,
            reverse,
            fill: FillStyle::with_opacity(Color::BLACK, 0.5),
        });

        let covered: f64 = triangles(&batch).iter().map(area).sum();
        assert!((covered - 80.0).abs() < 1e-3, "covered {covered}");
        // premultiplied
        assert!(batch.vertices().iter().all(|v| v.color[3] == 0.5));
    }

    #[test]
    fn fill_circle_is_a_disc_instance() {
        let mut batch = GeometryBatch::new();
        batch.push(&dot(1.0));
        assert!(batch.vertices().is_empty());
        assert_eq!(batch.discs()[0].radius_bw, [4.0, 0.0]);
    }

    #[test]
    fn disc_border_straddles_the_radius() {
        let mut batch = GeometryBatch::new();
        batch.push(&Primitive::FillCircle {
            center: Vec2::new(0.0, 0.0),
            radius: 4.0,
            fill: FillStyle::new(Color::WHITE),
            stroke: Some(StrokeStyle::new(Color::BLACK, 2.0)),
            screen_space: true,
        });
        // painted band is [outer - bw, outer] = [3, 5]
        assert_eq!(batch.discs()[0].radius_bw, [5.0, 2.0]);
    }

    // ── ordering ──

    #[test]
    fn runs_preserve_paint_order() {
        let mut batch = GeometryBatch::new();
        for cmd in [line(1.0), line(2.0), dot(3.0), dot(4.0), line(5.0)] {
            batch.push(&cmd);
        }
        let total = batch.indices().len() as u32;
        match batch.runs() {
            [DrawRun::Mesh(first), DrawRun::Discs(discs), DrawRun::Mesh(last)] => {
                assert_eq!(first.start, 0);
                assert_eq!(first.end, last.start);
                assert_eq!(last.end, total);
                assert_eq!(discs, &(0..2));
            }
            other => panic!("unexpected runs {other:?}"),
        }
    }

    #[test]
    fn text_is_not_supported() {
        let mut batch = GeometryBatch::new();
        let text = Primitive::DrawText {
            text: "x".into(),
            position: Vec2::new(0.0, 0.0),
            font: FontStyle::new("serif", 10.0),
            color: Color::BLACK,
            align: TextAlign::default(),
        };
        assert!(!batch.push(&text));
        assert!(batch.is_empty());
    }
}
