use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

use crate::coords::Vec2;
use crate::drawable::{Drawable, DrawableId};
use crate::plan::{signature, Plan, PlanContext, RenderError, Signature};
use crate::telemetry::Telemetry;

/// Cache policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Extra frames an untouched entry survives before eviction. `0` evicts
    /// at the end of the first frame that does not touch it.
    pub retain_frames: u64,
    /// Translate reprojectable plans on pan-only changes instead of
    /// rebuilding them.
    pub reproject_on_pan: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retain_frames: 0,
            reproject_on_pan: true,
        }
    }
}

/// How `get_or_build` satisfied a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Reprojected,
    Built,
}

#[derive(Debug)]
struct CacheEntry {
    plan: Plan,
    last_touched: u64,
}

enum Reuse {
    Hit,
    Translate(Vec2),
}

/// Drawable id -> most recent plan.
#[derive(Debug, Default)]
pub struct PlanCache {
    entries: HashMap<DrawableId, CacheEntry>,
    frame: u64,
    config: CacheConfig,
}

impl PlanCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            frame: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Current frame number (incremented by `begin_frame`).
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Cached plan for `id`, without touching it.
    pub fn peek(&self, id: DrawableId) -> Option<&Plan> {
        self.entries.get(&id).map(|e| &e.plan)
    }

    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    /// Returns the plan for `drawable` under `ctx`, building it with `build`
    /// on a miss.
    ///
    /// Drawables without a signature (non-finite inputs) are rebuilt on every
    /// call. A failed build drops any previous entry for the drawable.
    pub fn get_or_build<F>(
        &mut self,
        drawable: &Drawable,
        ctx: &PlanContext<'_>,
        telemetry: &mut Telemetry,
        build: F,
    ) -> Result<(CacheOutcome, &Plan), RenderError>
    where
        F: FnOnce(&Drawable, &PlanContext<'_>) -> Result<Plan, RenderError>,
    {
        let sig = signature(drawable, ctx);
        let reuse = match (&sig, self.entries.get(&drawable.id)) {
            (Some(sig), Some(entry)) => classify(&entry.plan, sig, self.config.reproject_on_pan),
            _ => None,
        };

        let frame = self.frame;
        let (outcome, entry) = match (reuse, self.entries.entry(drawable.id)) {
            (Some(Reuse::Hit), Entry::Occupied(slot)) => {
                telemetry.record_hit();
                (CacheOutcome::Hit, slot.into_mut())
            }
            (Some(Reuse::Translate(delta)), Entry::Occupied(slot)) => {
                let entry = slot.into_mut();
                entry.plan.translate(delta);
                entry.plan.signature = sig;
                telemetry.record_reproject();
                (CacheOutcome::Reprojected, entry)
            }
            (_, slot) => {
                let started = Instant::now();
                let result = build(drawable, ctx);
                telemetry.record_build(started.elapsed());
                telemetry.record_miss();

                let mut plan = match result {
                    Ok(plan) => plan,
                    Err(err) => {
                        if let Entry::Occupied(stale) = slot {
                            stale.remove();
                        }
                        return Err(err);
                    }
                };
                plan.signature = sig;
                let fresh = CacheEntry { plan, last_touched: frame };
                let entry = match slot {
                    Entry::Occupied(mut stale) => {
                        stale.insert(fresh);
                        stale.into_mut()
                    }
                    Entry::Vacant(empty) => empty.insert(fresh),
                };
                (CacheOutcome::Built, entry)
            }
        };

        entry.last_touched = frame;
        Ok((outcome, &entry.plan))
    }

    /// Evicts entries not touched within the retention window. Returns the
    /// number of evicted entries.
    pub fn end_frame(&mut self) -> usize {
        let frame = self.frame;
        let retain = self.config.retain_frames;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| frame.saturating_sub(e.last_touched) <= retain);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("plan cache: evicted {evicted} untouched entries at frame {frame}");
        }
        evicted
    }

    /// Forces the next request for `id` to rebuild.
    pub fn invalidate(&mut self, id: DrawableId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            log::debug!("plan cache: invalidated {id}");
        }
        removed
    }

    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("plan cache: invalidated all {} entries", self.entries.len());
        }
        self.entries.clear();
    }

    /// Drops plans that embed zoom-dependent layout (grid spacing, sampled
    /// curves, shrinking labels). Returns the number dropped.
    pub fn invalidate_zoom_sensitive(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.plan.zoom_sensitive);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            log::debug!("plan cache: dropped {dropped} zoom-sensitive entries");
        }
        dropped
    }
}

/// Whether `plan` can serve a request whose current signature is `sig`.
fn classify(plan: &Plan, sig: &Signature, reproject: bool) -> Option<Reuse> {
    let old = plan.signature.as_ref()?;
    if old == sig {
        return Some(Reuse::Hit);
    }
    if !(reproject && plan.reprojectable && old.same_content(sig)) {
        return None;
    }
    old.view().pan_delta_to(&sig.view()).map(Reuse::Translate)
}
