//! Backend-neutral primitive commands.
//!
//! Responsibilities:
//! - define the closed set of draw instructions every renderer understands
//! - compute conservative screen-space bounds per command
//! - translate commands in place (used by pan reprojection)
//!
//! All coordinates are screen-space pixels.

mod cmd;

pub use cmd::{normalized_sweep, Primitive, PrimitiveKind};
