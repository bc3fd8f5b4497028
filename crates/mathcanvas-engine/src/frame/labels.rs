//! Greedy vertical displacement of overlapping labels.
//!
//! Labels are placed in paint order. Each group (one drawable's text) gets a
//! single `dy`: the first of `0, +step, -step, +2*step, ...` whose padded box
//! clears everything already placed, or the offset with the fewest overlaps
//! when none does.

use std::collections::HashMap;

use crate::coords::{Rect, Vec2};
use crate::drawable::DrawableId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelConfig {
    pub resolve_overlaps: bool,
    /// Largest step multiple tried in each direction.
    pub max_steps: u32,
    /// Gap kept around every placed box, in pixels.
    pub padding_px: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { resolve_overlaps: false, max_steps: 10, padding_px: 2.0 }
    }
}

/// Per-frame placement state.
#[derive(Debug, Default)]
pub struct LabelPlacer {
    config: LabelConfig,
    placed: Vec<Rect>,
    by_group: HashMap<DrawableId, f64>,
}

impl LabelPlacer {
    pub fn new(config: LabelConfig) -> Self {
        Self { config, ..Self::default() }
    }

    #[inline]
    pub fn config(&self) -> LabelConfig {
        self.config
    }

    pub fn set_config(&mut self, config: LabelConfig) {
        self.config = config;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.placed.clear();
        self.by_group.clear();
    }

    #[inline]
    pub fn placed(&self) -> &[Rect] {
        &self.placed
    }

    /// Offset for `group`, placing `base` on first sight. Later calls for the
    /// same group return the stored offset unchanged.
    pub fn place(&mut self, group: DrawableId, base: Rect, step: f64) -> f64 {
        if let Some(dy) = self.by_group.get(&group) {
            return *dy;
        }
        let dy = pick_dy(&self.placed, base, step, self.config.max_steps, self.config.padding_px);
        self.by_group.insert(group, dy);
        self.placed
            .push(base.inflate(self.config.padding_px.max(0.0)).translate(Vec2::new(0.0, dy)));
        dy
    }
}

/// Vertical offset for `base` against `placed`.
pub fn pick_dy(placed: &[Rect], base: Rect, step: f64, max_steps: u32, padding: f64) -> f64 {
    let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
    let padded = if padding > 0.0 { base.inflate(padding) } else { base.normalized() };

    let mut best_dy = 0.0;
    let mut best = overlap_count(placed, padded);
    if best == 0 {
        return 0.0;
    }
    for i in 1..=max_steps {
        for dy in [i as f64 * step, -(i as f64) * step] {
            let n = overlap_count(placed, padded.translate(Vec2::new(0.0, dy)));
            if n == 0 {
                return dy;
            }
            if n < best {
                best = n;
                best_dy = dy;
            }
        }
    }
    best_dy
}

fn overlap_count(placed: &[Rect], rect: Rect) -> usize {
    placed.iter().filter(|other| overlaps(rect, **other)).count()
}

/// Open overlap: boxes sharing only an edge stack flush.
fn overlaps(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.normalized(), b.normalized());
    a.origin.x < b.max().x && b.origin.x < a.max().x && a.origin.y < b.max().y && b.origin.y < a.max().y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(y: f64) -> Rect {
        Rect::new(0.0, y, 40.0, 10.0)
    }

    // ── pick_dy ──

    #[test]
    fn free_space_keeps_position() {
        assert_eq!(pick_dy(&[boxed(100.0)], boxed(0.0), 12.0, 10, 2.0), 0.0);
    }

    #[test]
    fn tries_down_before_up() {
        // +12 clears a box ending at 10
        assert_eq!(pick_dy(&[boxed(0.0)], boxed(0.0), 12.0, 10, 0.0), 12.0);
        let below = Rect::new(0.0, 10.0, 40.0, 12.0);
        assert_eq!(pick_dy(&[boxed(0.0), below], boxed(0.0), 12.0, 10, 0.0), -12.0);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        assert!(!overlaps(boxed(0.0), boxed(10.0)));
        assert!(overlaps(boxed(0.0), boxed(9.5)));
    }

    #[test]
    fn crowded_column_picks_fewest_overlaps() {
        let tall = Rect::new(0.0, -1000.0, 40.0, 2000.0);
        assert_eq!(pick_dy(&[tall], boxed(0.0), 12.0, 3, 2.0), 0.0);
        // the short box is cleared only by moving down
        let placed = [Rect::new(0.0, -40.0, 40.0, 60.0), Rect::new(0.0, 0.0, 40.0, 8.0)];
        assert_eq!(pick_dy(&placed, boxed(0.0), 10.0, 1, 0.0), 10.0);
    }

    #[test]
    fn invalid_step_falls_back_to_one_pixel() {
        assert_eq!(pick_dy(&[boxed(0.0)], boxed(0.0), f64::NAN, 100, 0.0), 10.0);
    }

    // ── placer ──

    #[test]
    fn groups_are_stable() {
        let mut placer = LabelPlacer::new(LabelConfig { resolve_overlaps: true, ..LabelConfig::default() });
        assert_eq!(placer.place(DrawableId(1), boxed(0.0), 14.0), 0.0);
        let dy = placer.place(DrawableId(2), boxed(0.0), 14.0);
        assert_eq!(dy, 14.0);
        assert_eq!(placer.place(DrawableId(2), boxed(500.0), 14.0), dy);
        assert_eq!(placer.placed().len(), 2);

        placer.reset();
        assert!(placer.placed().is_empty());
        assert_eq!(placer.place(DrawableId(2), boxed(0.0), 14.0), 0.0);
    }
}
