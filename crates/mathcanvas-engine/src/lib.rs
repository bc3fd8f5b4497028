//! Mathcanvas engine crate.
//!
//! This crate owns the rendering core of the math canvas: drawables are
//! compiled into backend-neutral plans, cached across frames, and applied to
//! one of several renderer backends.

pub mod device;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod primitive;
pub mod drawable;
pub mod plan;
pub mod cache;
pub mod frame;
pub mod telemetry;
pub mod render;
