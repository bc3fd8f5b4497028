//! Telemetry sink.
//!
//! Responsibilities:
//! - accumulate plan build/apply timings and cache outcome counts
//! - count backend operations by name (stroke calls, node appends, uploads)
//! - hand out snapshots, either non-destructively (`peek`) or by resetting
//!   the counters (`drain`)
//!
//! One sink lives in each renderer instance; the frame orchestrator and
//! the plan cache record into the active renderer's sink.

mod counters;

pub use counters::{PhaseStats, Telemetry, TelemetrySnapshot};
