//! Renderer backends.
//!
//! Every backend consumes the same [`Plan`](crate::plan::Plan)s and differs
//! only in how it executes them:
//! - `canvas`: immediate-mode 2D surface, style-deduplicated, batched strokes
//! - `svg`: retained node tree, pooled per drawable and diffed per attribute
//! - `gpu`: tessellated geometry uploaded to wgpu buffers once per frame
//!
//! Convention:
//! - all coordinates are logical pixels (top-left origin, +Y down)
//! - angles grow clockwise on screen

mod backend;
mod factory;

pub mod canvas;
pub mod gpu;
pub mod svg;

pub use backend::{BackendConfig, BackendError, BackendKind, Renderer};
pub use factory::{create_backend, BackendRequest};
