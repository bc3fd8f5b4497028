use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use crate::coords::{Vec2, Viewport};
use crate::drawable::DrawableId;
use crate::paint::style::trim_number as num;
use crate::paint::{FillStyle, HorizontalAlign, StrokeStyle, VerticalAlign};
use crate::plan::Plan;
use crate::primitive::{normalized_sweep, Primitive};
use crate::render::backend::check_viewport;
use crate::render::{BackendConfig, BackendError, BackendKind, Renderer};
use crate::telemetry::Telemetry;

use super::{NodeId, SvgDocument};

/// Retained-mode backend over an [`SvgDocument`].
///
/// Pool layout: `svg > g#scene > g[data-drawable] > element*`, one element
/// per primitive command. Groups created during a frame are staged in a
/// fragment and attached once at `end_frame`, which also restores apply
/// order and prunes groups that were not applied this frame.
pub struct SvgBackend {
    doc: SvgDocument,
    scene: NodeId,
    groups: HashMap<DrawableId, Group>,
    /// Drawables in apply order for the current frame.
    order: Vec<DrawableId>,
    staged: Option<NodeId>,
    frame: u64,
    offscreen: bool,
    viewport: Viewport,
    telemetry: Telemetry,
}

#[derive(Debug)]
struct Group {
    node: NodeId,
    items: Vec<NodeId>,
    last_frame: u64,
}

/// Target state of one pooled element.
#[derive(Debug, PartialEq)]
struct ElementSpec {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    text: Option<String>,
}

impl ElementSpec {
    fn new(tag: &'static str) -> Self {
        Self { tag, attrs: Vec::new(), text: None }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn point(self, x: &'static str, y: &'static str, p: Vec2) -> Self {
        self.attr(x, num(p.x)).attr(y, num(p.y))
    }

    fn stroke(self, stroke: Option<&StrokeStyle>) -> Self {
        match stroke.filter(|s| s.width > 0.0) {
            Some(s) => self
                .attr("stroke", s.color.to_css())
                .attr("stroke-width", num(s.width))
                .attr("stroke-linejoin", s.join.as_str())
                .attr("stroke-linecap", s.cap.as_str()),
            None => self.attr("stroke", "none"),
        }
    }

    fn fill(self, fill: Option<&FillStyle>) -> Self {
        match fill {
            Some(f) => self.attr("fill", f.effective_color().to_css()),
            None => self.attr("fill", "none"),
        }
    }
}

impl SvgBackend {
    pub fn new(viewport: Viewport, config: &BackendConfig) -> Result<Self, BackendError> {
        check_viewport(viewport)?;
        let mut doc = SvgDocument::new(viewport.width, viewport.height);
        let scene = doc.create_element("g");
        doc.set_attribute(scene, "id", "scene");
        let root = doc.root();
        doc.append_child(root, scene);
        Ok(Self {
            doc,
            scene,
            groups: HashMap::new(),
            order: Vec::new(),
            staged: None,
            frame: 0,
            offscreen: config.offscreen_svg,
            viewport,
            telemetry: Telemetry::new(),
        })
    }

    #[inline]
    pub fn document(&self) -> &SvgDocument {
        &self.doc
    }

    /// Serialized document as of the last completed frame.
    pub fn to_svg_string(&self) -> String {
        self.doc.serialize()
    }

    /// Pooled group of a drawable.
    pub fn group_node(&self, id: DrawableId) -> Option<NodeId> {
        self.groups.get(&id).map(|g| g.node)
    }

    /// Pooled element for `(drawable, command index)`.
    pub fn element_node(&self, id: DrawableId, index: usize) -> Option<NodeId> {
        self.groups.get(&id)?.items.get(index).copied()
    }

    fn group_for(&mut self, id: DrawableId) -> &mut Group {
        let Self { doc, groups, staged, telemetry, .. } = self;
        groups.entry(id).or_insert_with(|| {
            let node = doc.create_element("g");
            doc.set_attribute(node, "data-drawable", &id.0.to_string());
            let frag = *staged.get_or_insert_with(|| doc.create_fragment());
            doc.append_child(frag, node);
            telemetry.record_event("svg_create");
            Group { node, items: Vec::new(), last_frame: 0 }
        })
    }

    /// Brings the pooled element at `slot` of `group` in line with `spec`.
    fn sync_element(&mut self, id: DrawableId, slot: usize, spec: &ElementSpec) {
        let Some(group) = self.groups.get(&id) else { return };
        let parent = group.node;
        let existing = group.items.get(slot).copied();

        let node = match existing {
            Some(node) if self.doc.tag(node) == Some(spec.tag) => node,
            Some(old) => {
                let node = self.doc.create_element(spec.tag);
                self.doc.replace_child(parent, node, old);
                self.doc.remove(old);
                self.telemetry.record_event("svg_create");
                self.telemetry.record_event("svg_remove");
                if let Some(group) = self.groups.get_mut(&id) {
                    group.items[slot] = node;
                }
                node
            }
            None => {
                let node = self.doc.create_element(spec.tag);
                self.doc.append_child(parent, node);
                self.telemetry.record_event("svg_create");
                if let Some(group) = self.groups.get_mut(&id) {
                    group.items.push(node);
                }
                node
            }
        };

        for name in self.doc.attribute_names(node) {
            if !spec.attrs.iter().any(|(k, _)| *k == name) {
                self.doc.remove_attribute(node, &name);
                self.telemetry.record_event("svg_attr_set");
            }
        }
        for (name, value) in &spec.attrs {
            if self.doc.set_attribute(node, name, value) {
                self.telemetry.record_event("svg_attr_set");
            }
        }
        if let Some(text) = &spec.text {
            if self.doc.set_text(node, text) {
                self.telemetry.record_event("svg_attr_set");
            }
        }
    }

    fn truncate_group(&mut self, id: DrawableId, len: usize) {
        let Some(group) = self.groups.get_mut(&id) else { return };
        if group.items.len() <= len {
            return;
        }
        let surplus: Vec<NodeId> = group.items.drain(len..).collect();
        for node in surplus {
            self.doc.remove(node);
            self.telemetry.record_event("svg_remove");
        }
    }

    fn flush_staged(&mut self) {
        let Some(frag) = self.staged.take() else { return };
        let moved = self.doc.children(frag).len() as u64;
        self.doc.append_child(self.scene, frag);
        self.doc.remove(frag);
        self.telemetry.record_events("svg_append", moved);
    }

    fn prune(&mut self) {
        let frame = self.frame;
        let stale: Vec<DrawableId> = self
            .groups
            .iter()
            .filter(|(_, g)| g.last_frame != frame)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(group) = self.groups.remove(&id) {
                self.doc.remove(group.node);
                self.telemetry.record_event("svg_remove");
            }
        }
    }

    /// Re-appends groups whose document position differs from apply order.
    fn restore_order(&mut self) {
        let desired: Vec<NodeId> = self
            .order
            .iter()
            .filter_map(|id| self.groups.get(id).map(|g| g.node))
            .collect();
        if self.doc.children(self.scene) == desired.as_slice() {
            return;
        }
        for node in desired {
            self.doc.append_child(self.scene, node);
        }
        self.telemetry.record_event("svg_reorder");
    }

    fn remove_all(&mut self) {
        for (_, group) in self.groups.drain() {
            self.doc.remove(group.node);
        }
        if let Some(frag) = self.staged.take() {
            self.doc.remove(frag);
        }
        self.order.clear();
    }
}

impl Renderer for SvgBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Svg
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn begin_frame(&mut self) {
        self.frame += 1;
        self.order.clear();
        if self.offscreen {
            self.doc.detach(self.scene);
            self.telemetry.record_event("svg_offscreen_swap");
        }
    }

    fn apply_plan(&mut self, plan: &Plan) {
        let id = plan.drawable;
        let frame = self.frame;
        let group = self.group_for(id);
        if group.last_frame == frame {
            log::debug!("svg: drawable {id} applied twice in frame {frame}");
        } else {
            group.last_frame = frame;
            self.order.push(id);
        }

        let mut slot = 0;
        for cmd in &plan.commands {
            match cmd {
                Primitive::ClearSurface => {}
                Primitive::ResizeSurface { width, height } => {
                    self.resize(Viewport::new(*width, *height))
                }
                _ => {
                    if let Some(spec) = element_for(cmd) {
                        self.sync_element(id, slot, &spec);
                        slot += 1;
                    }
                }
            }
        }
        self.truncate_group(id, slot);
    }

    fn end_frame(&mut self) {
        self.flush_staged();
        self.prune();
        self.restore_order();
        if self.offscreen {
            let root = self.doc.root();
            self.doc.append_child(root, self.scene);
            self.telemetry.record_event("svg_offscreen_swap");
        }
    }

    fn clear(&mut self) {
        self.remove_all();
    }

    fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            log::debug!("svg: ignoring resize to {}x{}", viewport.width, viewport.height);
            return;
        }
        self.viewport = viewport;
        self.doc.set_size(viewport.width, viewport.height);
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}

fn points_attr(points: impl IntoIterator<Item = Vec2>) -> String {
    points
        .into_iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn arc_path(center: Vec2, radius: f64, start: f64, sweep: f64) -> String {
    let at = |a: f64| center + Vec2::from_polar(radius, a);
    let r = num(radius);
    let flag = u8::from(sweep > 0.0);
    let from = at(start);
    let mut d = format!("M {} {}", num(from.x), num(from.y));

    // A single arc command cannot close a full turn.
    let pieces: &[f64] = if sweep.abs() >= TAU - 1e-9 { &[0.5, 1.0] } else { &[1.0] };
    let mut prev = 0.0;
    for &t in pieces {
        let to = at(start + sweep * t);
        let large = u8::from((sweep * (t - prev)).abs() > PI);
        d.push_str(&format!(" A {r} {r} 0 {large} {flag} {} {}", num(to.x), num(to.y)));
        prev = t;
    }
    d
}

fn element_for(cmd: &Primitive) -> Option<ElementSpec> {
    let spec = match cmd {
        Primitive::StrokeLine { from, to, stroke } => ElementSpec::new("line")
            .point("x1", "y1", *from)
            .point("x2", "y2", *to)
            .fill(None)
            .stroke(Some(stroke)),
        Primitive::StrokePolyline { points, stroke } => {
            if points.len() < 2 {
                return None;
            }
            ElementSpec::new("polyline")
                .attr("points", points_attr(points.iter().copied()))
                .fill(None)
                .stroke(Some(stroke))
        }
        Primitive::StrokeCircle { center, radius, stroke } => ElementSpec::new("circle")
            .point("cx", "cy", *center)
            .attr("r", num(*radius))
            .fill(None)
            .stroke(Some(stroke)),
        Primitive::FillCircle { center, radius, fill, stroke, .. } => ElementSpec::new("circle")
            .point("cx", "cy", *center)
            .attr("r", num(*radius))
            .fill(Some(fill))
            .stroke(stroke.as_ref()),
        Primitive::StrokeEllipse { center, radius_x, radius_y, rotation, stroke, fill } => {
            ElementSpec::new("ellipse")
                .point("cx", "cy", *center)
                .attr("rx", num(*radius_x))
                .attr("ry", num(*radius_y))
                .attr(
                    "transform",
                    format!("rotate({} {} {})", num(rotation.to_degrees()), num(center.x), num(center.y)),
                )
                .fill(fill.as_ref())
                .stroke(Some(stroke))
        }
        Primitive::FillPolygon { points, fill, stroke, .. } => {
            if points.len() < 3 {
                return None;
            }
            ElementSpec::new("polygon")
                .attr("points", points_attr(points.iter().copied()))
                .fill(Some(fill))
                .stroke(stroke.as_ref())
        }
        Primitive::FillJoinedArea { forward, reverse, fill } => {
            let mut all = forward.iter().chain(reverse.iter());
            let first = all.next()?;
            let mut d = format!("M {} {}", num(first.x), num(first.y));
            for p in all {
                d.push_str(&format!(" L {} {}", num(p.x), num(p.y)));
            }
            d.push_str(" Z");
            ElementSpec::new("path").attr("d", d).fill(Some(fill)).stroke(None)
        }
        Primitive::StrokeArc { center, radius, start_angle, end_angle, clockwise, stroke } => {
            let sweep = normalized_sweep(*start_angle, *end_angle, *clockwise);
            if sweep == 0.0 {
                return None;
            }
            ElementSpec::new("path")
                .attr("d", arc_path(*center, *radius, *start_angle, sweep))
                .fill(None)
                .stroke(Some(stroke))
        }
        Primitive::DrawText { text, position, font, color, align } => {
            let anchor = match align.horizontal {
                HorizontalAlign::Left => "start",
                HorizontalAlign::Center => "middle",
                HorizontalAlign::Right => "end",
            };
            let baseline = match align.vertical {
                VerticalAlign::Top => "hanging",
                VerticalAlign::Middle => "central",
                VerticalAlign::Alphabetic => "alphabetic",
                VerticalAlign::Bottom => "text-after-edge",
            };
            let mut spec = ElementSpec::new("text")
                .point("x", "y", *position)
                .attr("font-family", font.family.clone())
                .attr("font-size", num(font.size))
                .attr("font-weight", font.weight.to_string())
                .attr("text-anchor", anchor)
                .attr("dominant-baseline", baseline)
                .attr("fill", color.to_css());
            spec.text = Some(text.clone());
            spec
        }
        Primitive::ClearSurface | Primitive::ResizeSurface { .. } => return None,
    };
    Some(spec)
}
