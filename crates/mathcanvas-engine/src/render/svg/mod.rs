//! Retained SVG backend.
//!
//! [`SvgDocument`] is a small node arena standing in for a DOM; the
//! [`SvgBackend`] keeps one `<g>` per drawable and one pooled element per
//! command index, and diffs attributes against the pool on every apply.

mod backend;
mod document;

pub use backend::SvgBackend;
pub use document::{NodeId, SvgDocument};
