//! Error types for the timeline model.

use splice_core::{EditorTime, SpliceError};
use thiserror::Error;

use crate::adjustment::AdjustmentId;
use crate::clip::ClipId;
use crate::mask::{MaskId, MaskKind};
use crate::marker::MarkerId;
use crate::track::TrackId;
use crate::transition::TransitionId;

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input, rejected before any mutation.
    Validation,
    /// The edit would break a structural rule of the timeline.
    Invariant,
    /// A referenced entity does not exist.
    NotFound,
    /// Reading or writing the project document failed.
    Persistence,
}

/// Errors raised by timeline edits, queries and persistence.
///
/// A mutation that fails leaves the timeline exactly as it was.
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error(transparent)]
    Core(#[from] SpliceError),

    #[error("Clip {clip} overlaps clip {other} by {overlap}")]
    OverlapViolation {
        clip: ClipId,
        other: ClipId,
        overlap: EditorTime,
    },

    #[error("Invalid trim: {0}")]
    InvalidTrim(String),

    #[error("Clips {from} and {to} are not adjacent (gap {gap})")]
    NotAdjacent {
        from: ClipId,
        to: ClipId,
        gap: EditorTime,
    },

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Track {0} is locked")]
    TrackLocked(TrackId),

    #[error("Index {index} out of bounds for stack of {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Shape kind mismatch: mask is {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: MaskKind, actual: MaskKind },

    #[error("A transition already links clips {from} and {to}")]
    TransitionExists { from: ClipId, to: ClipId },

    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Transition not found: {0}")]
    TransitionNotFound(TransitionId),

    #[error("Marker not found: {0}")]
    MarkerNotFound(MarkerId),

    #[error("Mask not found: {0}")]
    MaskNotFound(MaskId),

    #[error("Adjustment layer not found: {0}")]
    AdjustmentNotFound(AdjustmentId),

    #[error("Parameter not found: {0}")]
    ParamNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Project file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl TimelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Core(err) => match err {
                SpliceError::DuplicateKeyframeTime(_) | SpliceError::InvalidControlPoint(_) => {
                    ErrorCategory::Invariant
                }
                SpliceError::KeyframeNotFound(_) => ErrorCategory::NotFound,
                SpliceError::InvalidTimeValue(_)
                | SpliceError::InvalidFrameRate(_)
                | SpliceError::InvalidParameter(_) => ErrorCategory::Validation,
            },
            Self::OverlapViolation { .. }
            | Self::InvalidTrim(_)
            | Self::NotAdjacent { .. }
            | Self::TransitionExists { .. } => ErrorCategory::Invariant,
            Self::InvalidClip(_)
            | Self::InvalidValue(_)
            | Self::TrackLocked(_)
            | Self::IndexOutOfBounds { .. }
            | Self::ShapeMismatch { .. } => ErrorCategory::Validation,
            Self::TrackNotFound(_)
            | Self::ClipNotFound(_)
            | Self::TransitionNotFound(_)
            | Self::MarkerNotFound(_)
            | Self::MaskNotFound(_)
            | Self::AdjustmentNotFound(_)
            | Self::ParamNotFound(_) => ErrorCategory::NotFound,
            Self::Io(_) | Self::Serialization(_) | Self::UnsupportedVersion { .. } => {
                ErrorCategory::Persistence
            }
        }
    }
}

/// Result type alias for timeline operations.
pub type TimelineResult<T> = std::result::Result<T, TimelineError>;
