use thiserror::Error;

/// Failures raised by the analysis stages.
///
/// All of them are deterministic: the same inputs always fail the same way,
/// and a failing stage aborts the whole analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Empty or malformed scan (length mismatch, non-finite values, non-monotonic positions).
    #[error("invalid scan: {0}")]
    InvalidScan(String),

    /// Too few samples for the requested stage.
    #[error("insufficient data: {stage} needs at least {needed} points, got {got}")]
    InsufficientData {
        stage: &'static str,
        needed: usize,
        got: usize,
    },

    /// Two sequences that must line up elementwise do not.
    #[error("dimension mismatch: {what} has {actual} values, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A caller-supplied setting is unusable (e.g. a non-finite offset).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The valid branch spans no path-length difference, so no frequency step exists.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
