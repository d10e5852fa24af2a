use thiserror::Error;

/// Result alias used throughout the conversion core.
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Why a path fails the structural validity invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("path has {count} segment(s), at least 2 are required")]
    TooFewSegments { count: usize },
    #[error("segment {index} has a non-finite anchor or handle coordinate")]
    NonFiniteCoordinate { index: usize },
    #[error("path bounds are degenerate ({width} x {height})")]
    DegenerateBounds { width: f64, height: f64 },
    #[error("path length {length} is not a positive finite number")]
    ZeroLength { length: f64 },
    #[error("compound path has no children")]
    EmptyCompound,
    #[error("compound child {index} is invalid: {source}")]
    InvalidChild {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Errors surfaced by a conversion request.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The markup could not be read or contained no usable outline.
    #[error("could not read outline markup: {0}")]
    Parse(String),

    /// A geometry failed the validator's invariants.
    #[error("invalid geometry: {0}")]
    Validation(#[from] ValidationError),

    /// A pipeline stage filtered its working set down to nothing.
    #[error("{message}")]
    Processing { stage: &'static str, message: String },

    /// A geometry kernel call faulted or produced invalid output.
    #[error("geometry operation `{operation}` failed: {reason}")]
    GeometryOperation {
        operation: &'static str,
        reason: String,
    },

    /// The mesh could not be serialized.
    #[error("export failed: {0}")]
    Export(String),

    /// The request deadline expired.
    #[error("conversion timed out during {stage}")]
    Timeout { stage: &'static str },
}

impl ConvertError {
    pub(crate) fn processing(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Processing {
            stage,
            message: message.into(),
        }
    }

    pub(crate) fn kernel(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::GeometryOperation {
            operation,
            reason: reason.into(),
        }
    }

    /// Timeouts are never absorbed by a fallback.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
