//! Splice Timeline - Timeline data model and edit controller
//!
//! Implements the editable timeline on top of `splice-core`:
//! - Projects containing tracks, clips and markers
//! - Speed ramps, transitions, masks and adjustment layers
//! - A single-writer controller with change sets and undo/redo
//! - Frame sampling for the renderer and versioned persistence

mod id;

pub mod adjustment;
pub mod clip;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod history;
pub mod marker;
pub mod mask;
pub mod project;
pub mod sample;
pub mod serialization;
pub mod shared;
pub mod speed;
pub mod stack;
pub mod track;
pub mod transition;

pub use adjustment::{AdjustmentId, AdjustmentKind, AdjustmentLayer, AdjustmentStack, BlendMode};
pub use clip::{Clip, ClipId, ClipKind, TrimEdge};
pub use config::{AdjacencyTolerance, TimelineConfig};
pub use controller::{Committed, TimelineController};
pub use error::{ErrorCategory, TimelineError, TimelineResult};
pub use events::{ChangeSet, CurveTarget, EntityRef, TimelineEvent};
pub use history::History;
pub use marker::{Marker, MarkerCollection, MarkerId, MarkerKind, MarkerUpdate, SearchDirection};
pub use mask::{Mask, MaskId, MaskKind, MaskProperty, MaskShape, MaskStack, MaskVertex};
pub use project::Project;
pub use sample::{
    evaluate_frame, sample_timeline_at, ClipSample, FrameState, TextOverlay, TimelineSample,
    TransitionSample,
};
pub use serialization::{ProjectFile, CURRENT_VERSION};
pub use shared::{PlaybackSampler, SharedTimeline};
pub use stack::{LayerStack, StackEntry};
pub use track::{Track, TrackId, TrackKind};
pub use transition::{Transition, TransitionId, TransitionKind, TransitionState};
