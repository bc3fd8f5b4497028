use std::fmt::Write as _;

/// Handle to a node in an [`SvgDocument`]. Stale after `remove`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    /// `None` for a fragment.
    tag: Option<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: Option<String>) -> Self {
        Self { tag, attrs: Vec::new(), text: None, parent: None, children: Vec::new() }
    }
}

/// Minimal retained element tree.
///
/// Mutation semantics follow the DOM where it matters:
/// - appending an attached node moves it
/// - appending a fragment moves its children and leaves it empty
/// - a node removed with [`SvgDocument::remove`] frees its whole subtree
#[derive(Debug, Clone)]
pub struct SvgDocument {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl SvgDocument {
    /// Empty `<svg>` root sized to `width` x `height`.
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self { nodes: Vec::new(), free: Vec::new(), root: NodeId(0) };
        let root = doc.create_element("svg");
        doc.root = root;
        doc.set_attribute(root, "xmlns", "http://www.w3.org/2000/svg");
        doc.set_size(width, height);
        doc
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        let (w, h) = (num(width), num(height));
        let root = self.root;
        self.set_attribute(root, "width", &w);
        self.set_attribute(root, "height", &h);
        self.set_attribute(root, "viewBox", &format!("0 0 {w} {h}"));
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(Some(tag.to_string())))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(Node::new(None))
    }

    /// `None` for fragments and stale ids.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.tag.as_deref()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let node = self.node(id)?;
        node.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn attribute_names(&self, id: NodeId) -> Vec<String> {
        self.node(id).map_or_else(Vec::new, |n| n.attrs.iter().map(|(k, _)| k.clone()).collect())
    }

    /// Sets an attribute. Returns whether the stored value changed.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(node) = self.node_mut(id) else { return false };
        match node.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) if v == value => false,
            Some((_, v)) => {
                value.clone_into(v);
                true
            }
            None => {
                node.attrs.push((name.to_string(), value.to_string()));
                true
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(node) = self.node_mut(id) else { return false };
        let before = node.attrs.len();
        node.attrs.retain(|(k, _)| k != name);
        node.attrs.len() != before
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.text.as_deref()
    }

    /// Sets text content. Returns whether it changed.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        let Some(node) = self.node_mut(id) else { return false };
        if node.text.as_deref() == Some(text) {
            return false;
        }
        node.text = Some(text.to_string());
        true
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Appends `child` as the last child of `parent`, moving it if attached.
    /// A fragment hands over all of its children instead.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) || self.is_ancestor(child, parent) {
            return;
        }
        let is_fragment = match self.node(child) {
            Some(node) => node.tag.is_none(),
            None => return,
        };
        if is_fragment {
            let moved = self
                .node_mut(child)
                .map(|n| std::mem::take(&mut n.children))
                .unwrap_or_default();
            for c in moved {
                self.link(parent, c);
            }
            return;
        }
        self.detach(child);
        self.link(parent, child);
    }

    /// Puts `new` where `old` was; `old` ends up detached.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        if self.parent(old) != Some(parent) || !self.contains(new) || new == old {
            return false;
        }
        self.detach(new);
        let Some(pos) = self.children(parent).iter().position(|&c| c == old) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children[pos] = new;
        }
        if let Some(n) = self.node_mut(new) {
            n.parent = Some(parent);
        }
        if let Some(o) = self.node_mut(old) {
            o.parent = None;
        }
        true
    }

    /// Unlinks `id` from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else { return };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Detaches `id` and frees it together with its subtree.
    /// Returns the number of nodes freed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }
        self.detach(id);
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.0].take() {
                stack.extend(node.children);
                self.free.push(n.0);
                freed += 1;
            }
        }
        freed
    }

    /// Serializes the tree under the root as an SVG document.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        let Some(tag) = node.tag.as_deref() else {
            node.children.iter().for_each(|&c| self.write_node(c, out));
            return;
        };
        out.push('<');
        out.push_str(tag);
        for (k, v) in &node.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape(v, true));
        }
        if node.children.is_empty() && node.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text, false));
        }
        node.children.iter().for_each(|&c| self.write_node(c, out));
        let _ = write!(out, "</{tag}>");
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    fn is_ancestor(&self, candidate: NodeId, mut of: NodeId) -> bool {
        while let Some(p) = self.parent(of) {
            if p == candidate {
                return true;
            }
            of = p;
        }
        false
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    #[inline]
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)?.as_mut()
    }
}

fn num(v: f64) -> String {
    crate::paint::style::trim_number(v)
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_diff_reports_changes() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let n = doc.create_element("line");
        assert!(doc.set_attribute(n, "x1", "1"));
        assert!(!doc.set_attribute(n, "x1", "1"));
        assert!(doc.set_attribute(n, "x1", "2"));
        assert_eq!(doc.attribute(n, "x1"), Some("2"));
        assert!(doc.remove_attribute(n, "x1"));
        assert!(!doc.remove_attribute(n, "x1"));
    }

    #[test]
    fn fragment_append_moves_children() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let frag = doc.create_fragment();
        let a = doc.create_element("g");
        let b = doc.create_element("g");
        doc.append_child(frag, a);
        doc.append_child(frag, b);

        let root = doc.root();
        doc.append_child(root, frag);
        assert_eq!(doc.children(root), &[a, b]);
        assert!(doc.children(frag).is_empty());
        assert_eq!(doc.parent(a), Some(root));
    }

    #[test]
    fn append_moves_attached_node() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let root = doc.root();
        let a = doc.create_element("g");
        let b = doc.create_element("g");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, a);
        assert_eq!(doc.children(root), &[b, a]);
    }

    #[test]
    fn replace_and_remove() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let root = doc.root();
        let g = doc.create_element("g");
        let line = doc.create_element("line");
        doc.append_child(root, g);
        doc.append_child(g, line);

        let circle = doc.create_element("circle");
        assert!(doc.replace_child(g, circle, line));
        assert_eq!(doc.children(g), &[circle]);
        assert_eq!(doc.parent(line), None);

        assert_eq!(doc.remove(g), 2);
        assert!(!doc.contains(circle));
        assert!(doc.children(root).is_empty());
        // line is still alive, detached
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let a = doc.create_element("g");
        doc.remove(a);
        let b = doc.create_element("rect");
        assert_eq!(a, b);
        assert_eq!(doc.tag(b), Some("rect"));
    }

    #[test]
    fn cycles_are_refused() {
        let mut doc = SvgDocument::new(10.0, 10.0);
        let root = doc.root();
        let g = doc.create_element("g");
        doc.append_child(root, g);
        doc.append_child(g, root);
        assert_eq!(doc.parent(root), None);
    }

    // ── serialization ──

    #[test]
    fn serializes_with_escaping() {
        let mut doc = SvgDocument::new(100.0, 50.0);
        let root = doc.root();
        let t = doc.create_element("text");
        doc.set_attribute(t, "font-family", "a\"b");
        doc.set_text(t, "x < 1 & y");
        doc.append_child(root, t);

        assert_eq!(
            doc.serialize(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"50\" \
             viewBox=\"0 0 100 50\"><text font-family=\"a&quot;b\">x &lt; 1 &amp; y</text></svg>"
        );
    }
}
