//! Frame orchestration.
//!
//! One [`FrameOrchestrator::draw`] call is one frame: begin, per-drawable
//! cull/build/apply, end. A drawable that fails to build is reported and
//! skipped; the rest of the frame always completes. Point and label text can
//! optionally be nudged vertically so labels do not overlap.

mod labels;
mod orchestrator;

pub use labels::{LabelConfig, LabelPlacer};
pub use orchestrator::{CullConfig, FrameConfig, FrameOrchestrator, FrameReport};
