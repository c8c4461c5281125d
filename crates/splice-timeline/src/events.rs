//! Change notifications emitted by committed timeline mutations.

use crate::adjustment::AdjustmentId;
use crate::clip::ClipId;
use crate::marker::MarkerId;
use crate::mask::MaskId;
use crate::track::TrackId;
use crate::transition::TransitionId;

/// Reference to any timeline entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Track(TrackId),
    Clip(ClipId),
    Transition(TransitionId),
    Marker(MarkerId),
    Mask(MaskId),
    Adjustment(AdjustmentId),
}

/// One observable change to the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    TrackAdded(TrackId),
    TrackRemoved(TrackId),
    /// Name, mute or lock state changed.
    TrackUpdated(TrackId),
    ClipAdded { track: TrackId, clip: ClipId },
    ClipRemoved { track: TrackId, clip: ClipId },
    /// Position, source range or duration changed. `from_track` differs from
    /// `track` when the clip changed owner.
    ClipMoved {
        from_track: TrackId,
        track: TrackId,
        clip: ClipId,
    },
    /// Trim, speed curve or other clip-level edit.
    ClipChanged { track: TrackId, clip: ClipId },
    KeyframesChanged { clip: ClipId, curve: CurveTarget },
    TransitionAdded(TransitionId),
    TransitionChanged(TransitionId),
    TransitionRemoved(TransitionId),
    /// Dropped because an edit broke its clips' adjacency.
    TransitionInvalidated(TransitionId),
    MarkerAdded(MarkerId),
    MarkerRemoved(MarkerId),
    MarkerChanged(MarkerId),
    MaskAdded { clip: ClipId, mask: MaskId },
    MaskRemoved { clip: ClipId, mask: MaskId },
    MaskChanged { clip: ClipId, mask: MaskId },
    MasksReordered { clip: ClipId },
    AdjustmentAdded { clip: ClipId, layer: AdjustmentId },
    AdjustmentRemoved { clip: ClipId, layer: AdjustmentId },
    AdjustmentChanged { clip: ClipId, layer: AdjustmentId },
    AdjustmentsReordered { clip: ClipId },
    ConfigChanged,
    /// Undo or redo replaced the whole document.
    HistoryRestored,
}

/// Which keyframe curve of a clip an edit addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CurveTarget {
    Speed,
    Param(String),
}

impl TimelineEvent {
    /// Entities this event touches.
    pub fn entities(&self) -> Vec<EntityRef> {
        use EntityRef as E;
        match self {
            Self::TrackAdded(t) | Self::TrackRemoved(t) | Self::TrackUpdated(t) => vec![E::Track(*t)],
            Self::ClipAdded { track, clip }
            | Self::ClipRemoved { track, clip }
            | Self::ClipChanged { track, clip } => vec![E::Track(*track), E::Clip(*clip)],
            Self::ClipMoved {
                from_track,
                track,
                clip,
            } => {
                let mut refs = vec![E::Track(*from_track), E::Clip(*clip)];
                if from_track != track {
                    refs.push(E::Track(*track));
                }
                refs
            }
            Self::KeyframesChanged { clip, .. }
            | Self::MasksReordered { clip }
            | Self::AdjustmentsReordered { clip } => vec![E::Clip(*clip)],
            Self::TransitionAdded(t)
            | Self::TransitionChanged(t)
            | Self::TransitionRemoved(t)
            | Self::TransitionInvalidated(t) => vec![E::Transition(*t)],
            Self::MarkerAdded(m) | Self::MarkerRemoved(m) | Self::MarkerChanged(m) => {
                vec![E::Marker(*m)]
            }
            Self::MaskAdded { clip, mask }
            | Self::MaskRemoved { clip, mask }
            | Self::MaskChanged { clip, mask } => vec![E::Clip(*clip), E::Mask(*mask)],
            Self::AdjustmentAdded { clip, layer }
            | Self::AdjustmentRemoved { clip, layer }
            | Self::AdjustmentChanged { clip, layer } => {
                vec![E::Clip(*clip), E::Adjustment(*layer)]
            }
            Self::ConfigChanged | Self::HistoryRestored => Vec::new(),
        }
    }
}

/// Everything one committed mutation changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Monotonic document revision after the mutation.
    pub revision: u64,
    pub events: Vec<TimelineEvent>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct entities touched, in first-seen order.
    pub fn entities_changed(&self) -> Vec<EntityRef> {
        let mut seen = Vec::new();
        for entity in self.events.iter().flat_map(TimelineEvent::entities) {
            if !seen.contains(&entity) {
                seen.push(entity);
            }
        }
        seen
    }

    /// Transitions dropped by adjacency breaks in this change.
    pub fn invalidated_transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TimelineEvent::TransitionInvalidated(id) => Some(*id),
            _ => None,
        })
    }

    /// Whether the whole document should be treated as changed.
    pub fn is_full_reload(&self) -> bool {
        self.events.contains(&TimelineEvent::HistoryRestored)
    }
}
