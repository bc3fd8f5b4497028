//! Embedding-facing facade.
//!
//! [`Engine`] bundles the view state, theme, frame orchestrator and the
//! selected renderer behind the small set of calls an application needs:
//! draw, resize, cache invalidation and telemetry.

mod engine;

pub use engine::Engine;
