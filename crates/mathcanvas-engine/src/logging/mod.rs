//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only talks to
//! the `log` facade; the embedding binary decides whether to call
//! [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
