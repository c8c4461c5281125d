//! Splice Core - Foundation types for the timeline engine
//!
//! This crate provides the fundamental types used throughout Splice:
//! - Time representation (EditorTime, FrameRate, TimeRange)
//! - Keyframe curves with linear, stepped and Bézier interpolation

pub mod error;
pub mod keyframe;
pub mod time;

pub use error::{Result, SpliceError};
pub use keyframe::{
    ControlPoint, Domain, Interpolation, Keyframe, KeyframeCurve, KeyframeId, KeyframeUpdate,
};
pub use time::{EditorTime, FrameRate, TimeRange};
