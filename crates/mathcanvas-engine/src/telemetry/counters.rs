use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Count and accumulated wall time of one pipeline phase.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PhaseStats {
    pub count: u64,
    pub total_ms: f64,
}

impl PhaseStats {
    #[inline]
    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total_ms / self.count as f64 }
    }

    #[inline]
    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total_ms += elapsed.as_secs_f64() * 1000.0;
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub frames: u64,
    pub plan_build: PhaseStats,
    pub plan_apply: PhaseStats,
    pub plan_miss_count: u64,
    pub plan_hit_count: u64,
    /// Drawables culled before or after building.
    pub plan_skip_count: u64,
    pub plan_reproject_count: u64,
    /// Backend operation counts keyed by operation name.
    pub adapter_events: BTreeMap<&'static str, u64>,
}

impl TelemetrySnapshot {
    #[inline]
    pub fn plan_build_count(&self) -> u64 {
        self.plan_build.count
    }

    #[inline]
    pub fn plan_apply_count(&self) -> u64 {
        self.plan_apply.count
    }

    /// Count of one adapter event; zero if never recorded.
    pub fn event(&self, name: &str) -> u64 {
        self.adapter_events.get(name).copied().unwrap_or(0)
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} builds={} ({:.3} ms avg) applies={} ({:.3} ms avg) \
             miss={} hit={} skip={} reproject={}",
            self.frames,
            self.plan_build.count,
            self.plan_build.avg_ms(),
            self.plan_apply.count,
            self.plan_apply.avg_ms(),
            self.plan_miss_count,
            self.plan_hit_count,
            self.plan_skip_count,
            self.plan_reproject_count,
        )?;
        for (name, count) in &self.adapter_events {
            write!(f, " {name}={count}")?;
        }
        Ok(())
    }
}

/// Accumulating counters.
#[derive(Debug, Default)]
pub struct Telemetry {
    current: TelemetrySnapshot,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_frame(&mut self) {
        self.current.frames += 1;
    }

    #[inline]
    pub fn record_build(&mut self, elapsed: Duration) {
        self.current.plan_build.record(elapsed);
    }

    #[inline]
    pub fn record_apply(&mut self, elapsed: Duration) {
        self.current.plan_apply.record(elapsed);
    }

    #[inline]
    pub fn record_miss(&mut self) {
        self.current.plan_miss_count += 1;
    }

    #[inline]
    pub fn record_hit(&mut self) {
        self.current.plan_hit_count += 1;
    }

    #[inline]
    pub fn record_skip(&mut self) {
        self.current.plan_skip_count += 1;
    }

    #[inline]
    pub fn record_reproject(&mut self) {
        self.current.plan_reproject_count += 1;
    }

    #[inline]
    pub fn record_event(&mut self, name: &'static str) {
        self.record_events(name, 1);
    }

    pub fn record_events(&mut self, name: &'static str, count: u64) {
        if count > 0 {
            *self.current.adapter_events.entry(name).or_insert(0) += count;
        }
    }

    /// Snapshot without resetting.
    pub fn peek(&self) -> TelemetrySnapshot {
        self.current.clone()
    }

    /// Snapshot and reset every counter.
    pub fn drain(&mut self) -> TelemetrySnapshot {
        std::mem::take(&mut self.current)
    }
}
