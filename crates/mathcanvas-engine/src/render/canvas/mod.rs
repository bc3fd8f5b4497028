//! Immediate-mode 2D canvas backend.
//!
//! `CanvasBackend` drives any [`Canvas2d`] surface with the call set of an
//! HTML canvas 2D context. `RecordingCanvas` is the headless surface: it
//! records every call, which is what tests and the studio driver inspect.

mod backend;
mod surface;

pub use backend::CanvasBackend;
pub use surface::{Canvas2d, CanvasCall, RecordingCanvas};
