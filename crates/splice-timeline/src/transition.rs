//! Transitions between adjacent clips on a track.
//!
//! A transition blends the tail of the outgoing clip, `[from.end - duration,
//! from.end)`, with the incoming clip sampled back into its source handle. It
//! only exists while the two clips stay adjacent; the track drops it as soon as
//! an edit breaks adjacency.

use serde::{Deserialize, Serialize};
use splice_core::{EditorTime, TimeRange};

use crate::clip::{Clip, ClipId};
use crate::id::entity_id;

entity_id!(
    /// Identifier of a transition.
    TransitionId
);

/// Built-in transition looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    #[default]
    CrossDissolve,
    DipToBlack,
    DipToWhite,
    Wipe,
    Push,
    Iris,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 6] = [
        Self::CrossDissolve,
        Self::DipToBlack,
        Self::DipToWhite,
        Self::Wipe,
        Self::Push,
        Self::Iris,
    ];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::CrossDissolve => "Cross Dissolve",
            Self::DipToBlack => "Dip to Black",
            Self::DipToWhite => "Dip to White",
            Self::Wipe => "Wipe",
            Self::Push => "Push",
            Self::Iris => "Iris",
        }
    }
}

/// An active transition linking two clips on the same track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub kind: TransitionKind,
    pub duration: EditorTime,
    /// Outgoing clip.
    pub from_clip: ClipId,
    /// Incoming clip.
    pub to_clip: ClipId,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration: EditorTime, from_clip: ClipId, to_clip: ClipId) -> Self {
        Self {
            id: TransitionId::new(),
            kind,
            duration,
            from_clip,
            to_clip,
        }
    }

    pub fn links(&self, a: ClipId, b: ClipId) -> bool {
        (self.from_clip == a && self.to_clip == b) || (self.from_clip == b && self.to_clip == a)
    }

    pub fn involves(&self, clip: ClipId) -> bool {
        self.from_clip == clip || self.to_clip == clip
    }

    /// Timeline region the transition covers, given its outgoing clip.
    pub fn region(&self, from: &Clip) -> TimeRange {
        TimeRange::new(from.timeline_end() - self.duration, self.duration)
    }

    /// Normalized progress at `time`, or `None` outside the region.
    pub fn progress(&self, from: &Clip, time: EditorTime) -> Option<f64> {
        let region = self.region(from);
        if !region.contains(time) || self.duration <= EditorTime::ZERO {
            return None;
        }
        Some((time - region.start).to_seconds_f64() / self.duration.to_seconds_f64())
    }
}

/// Blend weights `(outgoing, incoming)` at normalized progress `p`.
pub fn weights(p: f64) -> (f64, f64) {
    let p = p.clamp(0.0, 1.0);
    (1.0 - p, p)
}

/// Transition status of an ordered clip pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// Not adjacent, or adjacent but nothing may be added.
    None,
    /// Adjacent with no transition yet; one up to `max_duration` may be added.
    Proposed { max_duration: EditorTime },
    /// A transition links the pair.
    Active(TransitionId),
}

/// Gap between the end of `prev` and the start of `next` (negative on overlap).
pub fn gap_between(prev: &Clip, next: &Clip) -> EditorTime {
    next.timeline_start - prev.timeline_end()
}

/// Whether `next` starts within `tolerance` of where `prev` ends.
pub fn is_adjacent(prev: &Clip, next: &Clip, tolerance: EditorTime) -> bool {
    prev.timeline_start < next.timeline_start && gap_between(prev, next).abs() <= tolerance
}

/// Longest transition the pair can hold.
pub fn max_duration(prev: &Clip, next: &Clip) -> EditorTime {
    prev.timeline_duration.min(next.timeline_duration)
}
