//! Error types for the core time and keyframe model.

use thiserror::Error;

use crate::keyframe::KeyframeId;
use crate::time::EditorTime;

/// Errors raised by time conversion and keyframe curve editing.
///
/// Every curve mutation that returns one of these leaves the curve untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpliceError {
    #[error("Invalid time value: {0} (time inputs must be finite)")]
    InvalidTimeValue(f64),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(String),

    #[error("A keyframe already exists at {0}")]
    DuplicateKeyframeTime(EditorTime),

    #[error("Keyframe not found: {0}")]
    KeyframeNotFound(KeyframeId),

    #[error("Invalid control point: {0}")]
    InvalidControlPoint(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, SpliceError>;
