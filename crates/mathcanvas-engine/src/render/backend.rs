use std::fmt;

use crate::coords::Viewport;
use crate::plan::Plan;
use crate::telemetry::{Telemetry, TelemetrySnapshot};

/// Available backend implementations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Canvas,
    Svg,
    Gpu,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Canvas => "canvas",
            BackendKind::Svg => "svg",
            BackendKind::Gpu => "gpu",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-backend runtime flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Draw into a hidden canvas and composite it once per frame.
    pub offscreen_canvas: bool,
    /// Detach the SVG scene while mutating it and reattach at frame end.
    pub offscreen_svg: bool,
    /// Render into an intermediate texture and copy it to the target.
    pub offscreen_gpu: bool,
}

impl BackendConfig {
    pub const ENV_OFFSCREEN_CANVAS: &'static str = "MATHCANVAS_OFFSCREEN_CANVAS";
    pub const ENV_OFFSCREEN_SVG: &'static str = "MATHCANVAS_OFFSCREEN_SVG";
    pub const ENV_OFFSCREEN_GPU: &'static str = "MATHCANVAS_OFFSCREEN_GPU";

    /// Reads the offscreen flags from the process environment. Unset or
    /// unrecognized values are `false`.
    pub fn from_env() -> Self {
        let flag = |name: &str| std::env::var(name).is_ok_and(|v| parse_flag(&v));
        Self {
            offscreen_canvas: flag(Self::ENV_OFFSCREEN_CANVAS),
            offscreen_svg: flag(Self::ENV_OFFSCREEN_SVG),
            offscreen_gpu: flag(Self::ENV_OFFSCREEN_GPU),
        }
    }

    #[inline]
    pub fn offscreen(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Canvas => self.offscreen_canvas,
            BackendKind::Svg => self.offscreen_svg,
            BackendKind::Gpu => self.offscreen_gpu,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Backend construction failure.
#[derive(Debug)]
pub enum BackendError {
    /// The backend cannot run here (e.g. no GPU device).
    Unavailable { kind: BackendKind, reason: String },
    InvalidViewport { width: f64, height: f64 },
    /// Every backend in the preference list failed.
    NoBackendAvailable { attempted: Vec<BackendKind> },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable { kind, reason } => {
                write!(f, "{kind} backend unavailable: {reason}")
            }
            BackendError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {width}x{height}")
            }
            BackendError::NoBackendAvailable { attempted } => {
                write!(f, "no backend available (tried: ")?;
                for (i, kind) in attempted.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Validates a construction-time viewport.
pub(crate) fn check_viewport(viewport: Viewport) -> Result<(), BackendError> {
    if viewport.is_valid() {
        Ok(())
    } else {
        Err(BackendError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

/// Contract shared by all backends.
///
/// Frame protocol: `begin_frame`, any number of `apply_plan`, `end_frame`.
/// `clear` and `resize` are called between frames. Backends record their
/// own operation counts into [`Renderer::telemetry_mut`]; plan timings are
/// recorded by the frame orchestrator.
pub trait Renderer {
    fn kind(&self) -> BackendKind;

    fn viewport(&self) -> Viewport;

    fn begin_frame(&mut self);

    fn apply_plan(&mut self, plan: &Plan);

    fn end_frame(&mut self);

    /// Erases the surface and drops any retained state.
    fn clear(&mut self);

    /// Resizes the surface. Non-finite or empty sizes are ignored.
    fn resize(&mut self, viewport: Viewport);

    fn telemetry(&self) -> &Telemetry;

    fn telemetry_mut(&mut self) -> &mut Telemetry;

    fn peek_telemetry(&self) -> TelemetrySnapshot {
        self.telemetry().peek()
    }

    fn drain_telemetry(&mut self) -> TelemetrySnapshot {
        self.telemetry_mut().drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["", "0", "false", "off", "maybe"] {
            assert!(!parse_flag(v), "{v}");
        }
    }

    #[test]
    fn offscreen_lookup_by_kind() {
        let cfg = BackendConfig { offscreen_svg: true, ..BackendConfig::default() };
        assert!(cfg.offscreen(BackendKind::Svg));
        assert!(!cfg.offscreen(BackendKind::Canvas));
        assert!(!cfg.offscreen(BackendKind::Gpu));
    }

    #[test]
    fn no_backend_message_lists_attempts() {
        let err = BackendError::NoBackendAvailable {
            attempted: vec![BackendKind::Gpu, BackendKind::Canvas],
        };
        assert_eq!(err.to_string(), "no backend available (tried: gpu, canvas)");
    }
}
