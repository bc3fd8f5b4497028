//! Headless GPU device acquisition.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - recording the render target format the GPU backend draws into

mod gpu;

pub use gpu::{Gpu, GpuInit};
