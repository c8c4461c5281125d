//! Track types for the timeline.

use serde::{Deserialize, Serialize};
use splice_core::EditorTime;

use crate::clip::{Clip, ClipId, TrimEdge};
use crate::error::{TimelineError, TimelineResult};
use crate::id::entity_id;
use crate::transition::{self, Transition, TransitionId, TransitionKind, TransitionState};

entity_id!(
    /// Identifier of a track.
    TrackId
);

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

/// A track holding non-overlapping clips and the transitions between them.
///
/// Clips stay sorted by `timeline_start`. Two clips may overlap only by the
/// adjacency tolerance; a transition never widens that allowance.
/// Every edit that moves or resizes a clip drops the transitions whose clips
/// are no longer adjacent and hands them back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    clips: Vec<Clip>,
    transitions: Vec<Transition>,
    /// Is track muted
    pub muted: bool,
    /// Is track locked (prevent edits)
    pub locked: bool,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            transitions: Vec::new(),
            muted: false,
            locked: false,
        }
    }

    /// Create a new video track.
    pub fn new_video(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Video)
    }

    /// Create a new audio track.
    pub fn new_audio(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    /// Clips sorted by start time.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn contains_clip(&self, id: ClipId) -> bool {
        self.clips.iter().any(|c| c.id == id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn transition_between(&self, a: ClipId, b: ClipId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.links(a, b))
    }

    /// Get the total duration of this track.
    pub fn duration(&self) -> EditorTime {
        self.clips
            .iter()
            .map(Clip::timeline_end)
            .max()
            .unwrap_or(EditorTime::ZERO)
    }

    /// Clips whose timeline range contains `time`.
    pub fn clips_at(&self, time: EditorTime) -> impl Iterator<Item = &Clip> {
        let end = self.clips.partition_point(|c| c.timeline_start <= time);
        self.clips[..end]
            .iter()
            .filter(move |c| c.timeline_range().contains(time))
    }

    /// Insert a clip. On rejection the track is unchanged.
    pub fn insert_clip(&mut self, clip: Clip, tolerance: EditorTime) -> TimelineResult<()> {
        clip.validate()?;
        if self.contains_clip(clip.id) {
            return Err(TimelineError::InvalidClip(format!(
                "clip {} is already on track {}",
                clip.id, self.id
            )));
        }
        self.check_placement(&clip, tolerance)?;
        self.insert_sorted(clip);
        Ok(())
    }

    /// Remove a clip together with the transitions that reference it.
    pub fn remove_clip(&mut self, id: ClipId) -> TimelineResult<(Clip, Vec<Transition>)> {
        let idx = self.clip_index(id)?;
        let clip = self.clips.remove(idx);
        let (dropped, kept): (Vec<Transition>, Vec<Transition>) = self
            .transitions
            .drain(..)
            .partition(|t| t.involves(id));
        self.transitions = kept;
        Ok((clip, dropped))
    }

    /// Edit a clip through `edit`, then re-check placement and transitions.
    ///
    /// The edit runs on a copy; nothing is written unless the result is valid.
    /// Returns the edit's value and the transitions dropped because their
    /// clips stopped being adjacent.
    pub fn update_clip<T>(
        &mut self,
        id: ClipId,
        tolerance: EditorTime,
        edit: impl FnOnce(&mut Clip) -> TimelineResult<T>,
    ) -> TimelineResult<(T, Vec<Transition>)> {
        let idx = self.clip_index(id)?;
        let mut candidate = self.clips[idx].clone();
        let value = edit(&mut candidate)?;
        candidate.id = id;
        candidate.validate()?;
        self.check_placement(&candidate, tolerance)?;

        self.clips.remove(idx);
        self.insert_sorted(candidate);
        Ok((value, self.revalidate_transitions(tolerance)))
    }

    /// Move a clip to a new start time.
    pub fn move_clip(
        &mut self,
        id: ClipId,
        new_start: EditorTime,
        tolerance: EditorTime,
    ) -> TimelineResult<Vec<Transition>> {
        let ((), dropped) = self.update_clip(id, tolerance, |clip| {
            clip.timeline_start = new_start;
            Ok(())
        })?;
        Ok(dropped)
    }

    /// Trim one edge of a clip.
    pub fn trim_clip(
        &mut self,
        id: ClipId,
        edge: TrimEdge,
        tolerance: EditorTime,
    ) -> TimelineResult<Vec<Transition>> {
        let ((), dropped) = self.update_clip(id, tolerance, |clip| {
            *clip = clip.trimmed(edge)?;
            Ok(())
        })?;
        Ok(dropped)
    }

    /// Link two adjacent clips with a transition.
    ///
    /// The duration is clamped to the shorter of the two clips.
    pub fn add_transition(
        &mut self,
        kind: TransitionKind,
        from: ClipId,
        to: ClipId,
        duration: EditorTime,
        tolerance: EditorTime,
    ) -> TimelineResult<&Transition> {
        if duration <= EditorTime::ZERO {
            return Err(TimelineError::InvalidValue(format!(
                "transition duration must be positive, got {duration}"
            )));
        }
        let prev = self.clip(from).ok_or(TimelineError::ClipNotFound(from))?;
        let next = self.clip(to).ok_or(TimelineError::ClipNotFound(to))?;
        if !transition::is_adjacent(prev, next, tolerance) {
            return Err(TimelineError::NotAdjacent {
                from,
                to,
                gap: transition::gap_between(prev, next),
            });
        }
        if self.transition_between(from, to).is_some() {
            return Err(TimelineError::TransitionExists { from, to });
        }

        let duration = duration.min(transition::max_duration(prev, next));
        self.transitions
            .push(Transition::new(kind, duration, from, to));
        let idx = self.transitions.len() - 1;
        Ok(&self.transitions[idx])
    }

    /// Change a transition's duration, clamped to the shorter clip. Returns the
    /// stored duration.
    pub fn resize_transition(
        &mut self,
        id: TransitionId,
        duration: EditorTime,
    ) -> TimelineResult<EditorTime> {
        if duration <= EditorTime::ZERO {
            return Err(TimelineError::InvalidValue(format!(
                "transition duration must be positive, got {duration}"
            )));
        }
        let idx = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::TransitionNotFound(id))?;
        let (from, to) = (self.transitions[idx].from_clip, self.transitions[idx].to_clip);
        let prev = self.clip(from).ok_or(TimelineError::ClipNotFound(from))?;
        let next = self.clip(to).ok_or(TimelineError::ClipNotFound(to))?;
        let clamped = duration.min(transition::max_duration(prev, next));
        self.transitions[idx].duration = clamped;
        Ok(clamped)
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> TimelineResult<Transition> {
        let idx = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::TransitionNotFound(id))?;
        Ok(self.transitions.remove(idx))
    }

    /// Transition status of the ordered pair `from` → `to`. Pure query.
    pub fn propose_transition(
        &self,
        from: ClipId,
        to: ClipId,
        tolerance: EditorTime,
    ) -> TimelineResult<TransitionState> {
        let prev = self.clip(from).ok_or(TimelineError::ClipNotFound(from))?;
        let next = self.clip(to).ok_or(TimelineError::ClipNotFound(to))?;
        if let Some(existing) = self.transition_between(from, to) {
            return Ok(TransitionState::Active(existing.id));
        }
        if transition::is_adjacent(prev, next, tolerance) {
            Ok(TransitionState::Proposed {
                max_duration: transition::max_duration(prev, next),
            })
        } else {
            Ok(TransitionState::None)
        }
    }

    /// Drop transitions whose clips are gone or no longer adjacent, and clamp
    /// the rest to their clips. Returns the dropped transitions.
    pub fn revalidate_transitions(&mut self, tolerance: EditorTime) -> Vec<Transition> {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.transitions.len());
        for mut t in std::mem::take(&mut self.transitions) {
            let pair = self.clip(t.from_clip).zip(self.clip(t.to_clip));
            match pair {
                Some((prev, next)) if transition::is_adjacent(prev, next, tolerance) => {
                    t.duration = t.duration.min(transition::max_duration(prev, next));
                    kept.push(t);
                }
                _ => dropped.push(t),
            }
        }
        self.transitions = kept;
        dropped
    }

    /// Reject `candidate` if it overlaps another clip by more than allowed.
    pub fn check_placement(&self, candidate: &Clip, tolerance: EditorTime) -> TimelineResult<()> {
        let range = candidate.timeline_range();
        for other in self.clips.iter().filter(|c| c.id != candidate.id) {
            let other_range = other.timeline_range();
            let overlap = range.overlap_len(other_range);
            if overlap <= EditorTime::ZERO {
                continue;
            }
            let contained = overlap == range.duration || overlap == other_range.duration;
            if contained || overlap > tolerance {
                return Err(TimelineError::OverlapViolation {
                    clip: candidate.id,
                    other: other.id,
                    overlap,
                });
            }
        }
        Ok(())
    }

    /// Check every clip against the others under `tolerance`.
    pub fn check_all_placements(&self, tolerance: EditorTime) -> TimelineResult<()> {
        self.clips
            .iter()
            .try_for_each(|clip| self.check_placement(clip, tolerance))
    }

    fn clip_index(&self, id: ClipId) -> TimelineResult<usize> {
        self.clips
            .iter()
            .position(|c| c.id == id)
            .ok_or(TimelineError::ClipNotFound(id))
    }

    fn insert_sorted(&mut self, clip: Clip) {
        let pos = self
            .clips
            .partition_point(|c| c.timeline_start <= clip.timeline_start);
        self.clips.insert(pos, clip);
    }

    /// Number of clips in this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TOL: EditorTime = EditorTime::from_millis(100);

    fn secs(s: i64) -> EditorTime {
        EditorTime::from_secs(s)
    }

    fn clip_at(start: i64, dur: i64) -> Clip {
        Clip::media("c", Uuid::new_v4(), secs(start), EditorTime::ZERO, secs(dur)).unwrap()
    }

    fn two_adjacent() -> (Track, ClipId, ClipId) {
        let mut track = Track::new_video("V1");
        let a = clip_at(0, 5);
        let b = clip_at(5, 5);
        let (a_id, b_id) = (a.id, b.id);
        track.insert_clip(b, TOL).unwrap();
        track.insert_clip(a, TOL).unwrap();
        (track, a_id, b_id)
    }

    #[test]
    fn test_insert_keeps_clips_sorted() {
        let (track, a, b) = two_adjacent();
        let ids: Vec<_> = track.clips().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(track.duration(), secs(10));
    }

    #[test]
    fn test_rejected_insert_leaves_track_unchanged() {
        let (mut track, _, _) = two_adjacent();
        let snapshot = track.clone();
        let err = track.insert_clip(clip_at(3, 4), TOL).unwrap_err();
        assert!(matches!(err, TimelineError::OverlapViolation { .. }));
        assert_eq!(track, snapshot);
    }

    #[test]
    fn test_overlap_within_tolerance_allowed() {
        let (mut track, _, _) = two_adjacent();
        let c = Clip::media(
            "c",
            Uuid::new_v4(),
            EditorTime::from_millis(9950),
            EditorTime::ZERO,
            secs(2),
        )
        .unwrap();
        assert!(track.insert_clip(c, TOL).is_ok());
    }

    #[test]
    fn test_contained_clip_rejected() {
        let (mut track, _, _) = two_adjacent();
        let tiny = Clip::media(
            "tiny",
            Uuid::new_v4(),
            EditorTime::from_millis(4960),
            EditorTime::ZERO,
            EditorTime::from_millis(20),
        )
        .unwrap();
        assert!(track.insert_clip(tiny, TOL).is_err());
    }

    #[test]
    fn test_transition_duration_clamped() {
        let mut track = Track::new_video("V1");
        let a = clip_at(0, 5);
        let b = clip_at(5, 2);
        let (a_id, b_id) = (a.id, b.id);
        track.insert_clip(a, TOL).unwrap();
        track.insert_clip(b, TOL).unwrap();

        let t = track
            .add_transition(TransitionKind::CrossDissolve, a_id, b_id, secs(3), TOL)
            .unwrap();
        assert_eq!(t.duration, secs(2));
        let id = t.id;
        assert_eq!(track.resize_transition(id, secs(10)).unwrap(), secs(2));
        assert_eq!(
            track.resize_transition(id, EditorTime::from_millis(500)).unwrap(),
            EditorTime::from_millis(500)
        );
    }

    #[test]
    fn test_transition_requires_adjacency() {
        let mut track = Track::new_video("V1");
        let a = clip_at(0, 5);
        let b = clip_at(7, 2);
        let (a_id, b_id) = (a.id, b.id);
        track.insert_clip(a, TOL).unwrap();
        track.insert_clip(b, TOL).unwrap();

        assert_eq!(
            track.propose_transition(a_id, b_id, TOL).unwrap(),
            TransitionState::None
        );
        let err = track
            .add_transition(TransitionKind::Wipe, a_id, b_id, secs(1), TOL)
            .unwrap_err();
        assert!(matches!(err, TimelineError::NotAdjacent { .. }));
    }

    #[test]
    fn test_propose_then_activate() {
        let (mut track, a, b) = two_adjacent();
        assert_eq!(
            track.propose_transition(a, b, TOL).unwrap(),
            TransitionState::Proposed { max_duration: secs(5) }
        );
        let id = track
            .add_transition(TransitionKind::DipToBlack, a, b, secs(1), TOL)
            .unwrap()
            .id;
        assert_eq!(
            track.propose_transition(a, b, TOL).unwrap(),
            TransitionState::Active(id)
        );
        assert!(matches!(
            track.add_transition(TransitionKind::DipToBlack, a, b, secs(1), TOL),
            Err(TimelineError::TransitionExists { .. })
        ));
    }

    #[test]
    fn test_move_breaking_adjacency_drops_transition() {
        let (mut track, a, b) = two_adjacent();
        track
            .add_transition(TransitionKind::CrossDissolve, a, b, secs(1), TOL)
            .unwrap();

        let dropped = track.move_clip(b, secs(8), TOL).unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(track.transitions().is_empty());
    }

    #[test]
    fn test_small_move_keeps_transition() {
        let (mut track, a, b) = two_adjacent();
        track
            .add_transition(TransitionKind::CrossDissolve, a, b, secs(1), TOL)
            .unwrap();
        let dropped = track.move_clip(b, EditorTime::from_millis(5050), TOL).unwrap();
        assert!(dropped.is_empty());
        assert_eq!(track.transitions().len(), 1);
    }

    #[test]
    fn test_move_into_transition_region_rejected() {
        let (mut track, a, b) = two_adjacent();
        track
            .add_transition(TransitionKind::CrossDissolve, a, b, secs(1), TOL)
            .unwrap();
        let snapshot = track.clone();

        let err = track
            .move_clip(b, EditorTime::from_millis(4500), TOL)
            .unwrap_err();
        assert!(matches!(
            err,
            TimelineError::OverlapViolation { overlap, .. } if overlap == EditorTime::from_millis(500)
        ));
        assert_eq!(track, snapshot);
        assert!(track.check_all_placements(TOL).is_ok());
    }

    #[test]
    fn test_tighter_tolerance_fails_placement_check() {
        let (mut track, _, _) = two_adjacent();
        let c = Clip::media(
            "c",
            Uuid::new_v4(),
            EditorTime::from_millis(9950),
            EditorTime::ZERO,
            secs(2),
        )
        .unwrap();
        track.insert_clip(c, TOL).unwrap();

        assert!(track.check_all_placements(TOL).is_ok());
        assert!(matches!(
            track.check_all_placements(EditorTime::from_millis(40)),
            Err(TimelineError::OverlapViolation { .. })
        ));
    }

    #[test]
    fn test_trim_start_moves_start_and_keeps_end() {
        let (mut track, a, b) = two_adjacent();
        track.trim_clip(b, TrimEdge::Start(secs(1)), TOL).unwrap();
        let clip = track.clip(b).unwrap();
        assert_eq!(clip.timeline_start, secs(6));
        assert_eq!(clip.timeline_duration, secs(4));
        assert_eq!(clip.source_out, secs(5));
        assert!(track.clip(a).is_some());
    }

    #[test]
    fn test_remove_clip_cascades_transitions() {
        let (mut track, a, b) = two_adjacent();
        track
            .add_transition(TransitionKind::Push, a, b, secs(1), TOL)
            .unwrap();
        let (removed, dropped) = track.remove_clip(a).unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(dropped.len(), 1);
        assert!(matches!(track.remove_clip(a), Err(TimelineError::ClipNotFound(_))));
    }

    #[test]
    fn test_clips_at() {
        let (track, a, b) = two_adjacent();
        let at: Vec<_> = track.clips_at(secs(2)).map(|c| c.id).collect();
        assert_eq!(at, vec![a]);
        let at: Vec<_> = track.clips_at(secs(5)).map(|c| c.id).collect();
        assert_eq!(at, vec![b]);
        assert_eq!(track.clips_at(secs(11)).count(), 0);
    }
}
