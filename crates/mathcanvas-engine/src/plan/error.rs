use std::fmt;

use crate::drawable::ShapeKind;

/// Why a drawable produced no plan this frame.
///
/// Degenerate but finite geometry (zero radius, coincident points) is not an
/// error; builders return an empty plan for it.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A coordinate, length or style value is NaN or infinite.
    NonFinite { kind: ShapeKind, field: &'static str },
    /// Structurally invalid input, e.g. a graph edge pointing past the vertex list.
    InvalidGeometry { kind: ShapeKind, reason: String },
}

impl RenderError {
    pub(crate) fn non_finite(kind: ShapeKind, field: &'static str) -> Self {
        RenderError::NonFinite { kind, field }
    }

    pub(crate) fn invalid(kind: ShapeKind, reason: impl Into<String>) -> Self {
        RenderError::InvalidGeometry { kind, reason: reason.into() }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NonFinite { kind, field } => {
                write!(f, "{}: non-finite value in `{}`", kind.as_str(), field)
            }
            RenderError::InvalidGeometry { kind, reason } => {
                write!(f, "{}: invalid geometry: {}", kind.as_str(), reason)
            }
        }
    }
}

impl std::error::Error for RenderError {}
