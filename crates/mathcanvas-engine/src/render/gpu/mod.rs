//! GPU backend.
//!
//! Primitives are tessellated on the CPU into a [`GeometryBatch`] while plans
//! are applied, uploaded once at `end_frame`, and drawn in a single render
//! pass into a texture owned by the backend. Text is not rendered.

mod backend;
mod ctx;
mod geometry;
mod pipelines;

pub use backend::GpuBackend;
pub use geometry::{DiscInstance, DrawRun, GeometryBatch, MeshVertex, ARC_SEGMENTS, CIRCLE_SEGMENTS};
