//! The project document: configuration, tracks and markers.

use serde::{Deserialize, Serialize};
use splice_core::{EditorTime, TimeRange};
use uuid::Uuid;

use crate::clip::{Clip, ClipId};
use crate::config::TimelineConfig;
use crate::error::{TimelineError, TimelineResult};
use crate::marker::MarkerCollection;
use crate::track::{Track, TrackId};
use crate::transition::{self, Transition, TransitionId};

/// Everything a timeline consists of. Tracks are listed bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,
    /// Project name
    pub name: String,
    pub config: TimelineConfig,
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub markers: MarkerCollection,
}

impl Project {
    /// Create a new empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, TimelineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: TimelineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
            tracks: Vec::new(),
            markers: MarkerCollection::new(),
        }
    }

    /// Adjacency window at the project frame rate.
    pub fn tolerance(&self) -> EditorTime {
        self.config.tolerance()
    }

    pub fn track(&self, id: TrackId) -> TimelineResult<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    pub fn track_mut(&mut self, id: TrackId) -> TimelineResult<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    /// Track owning `clip`.
    pub fn track_of_clip(&self, clip: ClipId) -> TimelineResult<&Track> {
        self.tracks
            .iter()
            .find(|t| t.contains_clip(clip))
            .ok_or(TimelineError::ClipNotFound(clip))
    }

    /// Track holding the transition `id`.
    pub fn track_of_transition(&self, id: TransitionId) -> TimelineResult<&Track> {
        self.tracks
            .iter()
            .find(|t| t.transition(id).is_some())
            .ok_or(TimelineError::TransitionNotFound(id))
    }

    pub fn clip(&self, id: ClipId) -> TimelineResult<&Clip> {
        self.tracks
            .iter()
            .find_map(|t| t.clip(id))
            .ok_or(TimelineError::ClipNotFound(id))
    }

    pub fn transition(&self, id: TransitionId) -> TimelineResult<&Transition> {
        self.tracks
            .iter()
            .find_map(|t| t.transition(id))
            .ok_or(TimelineError::TransitionNotFound(id))
    }

    /// End of the last clip on any track.
    pub fn duration(&self) -> EditorTime {
        self.tracks
            .iter()
            .map(Track::duration)
            .max()
            .unwrap_or(EditorTime::ZERO)
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(EditorTime::ZERO, self.duration())
    }

    /// Check the loaded document against the structural rules edits enforce.
    pub fn validate(&self) -> TimelineResult<()> {
        let tolerance = self.tolerance();
        for track in &self.tracks {
            let sorted = track
                .clips()
                .windows(2)
                .all(|w| w[0].timeline_start <= w[1].timeline_start);
            if !sorted {
                return Err(TimelineError::Serialization(format!(
                    "clips on track {} are not sorted by start",
                    track.id
                )));
            }
            for clip in track.clips() {
                clip.validate()?;
                check_derived_duration(clip)?;
            }
            track.check_all_placements(tolerance)?;
            for t in track.transitions() {
                check_transition(track, t, tolerance)?;
            }
        }
        Ok(())
    }
}

/// The stored duration must be the one the source range and speed curve give.
fn check_derived_duration(clip: &Clip) -> TimelineResult<()> {
    let mut derived = clip.clone();
    derived.recompute_duration()?;
    if derived.timeline_duration != clip.timeline_duration {
        return Err(TimelineError::InvalidClip(format!(
            "clip {} stores duration {} but its source range gives {}",
            clip.id, clip.timeline_duration, derived.timeline_duration
        )));
    }
    Ok(())
}

fn check_transition(track: &Track, t: &Transition, tolerance: EditorTime) -> TimelineResult<()> {
    let prev = track
        .clip(t.from_clip)
        .ok_or(TimelineError::ClipNotFound(t.from_clip))?;
    let next = track
        .clip(t.to_clip)
        .ok_or(TimelineError::ClipNotFound(t.to_clip))?;
    if !transition::is_adjacent(prev, next, tolerance) {
        return Err(TimelineError::NotAdjacent {
            from: t.from_clip,
            to: t.to_clip,
            gap: transition::gap_between(prev, next),
        });
    }
    let linked = track
        .transitions()
        .iter()
        .filter(|other| other.links(t.from_clip, t.to_clip))
        .count();
    if linked > 1 {
        return Err(TimelineError::TransitionExists {
            from: t.from_clip,
            to: t.to_clip,
        });
    }
    let max = transition::max_duration(prev, next);
    if t.duration <= EditorTime::ZERO || t.duration > max {
        return Err(TimelineError::InvalidValue(format!(
            "transition {} duration {} outside (0, {max}]",
            t.id, t.duration
        )));
    }
    Ok(())
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled Project")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let mut project = Project::new("p");
        let track = Track::new_video("V1");
        let track_id = track.id;
        project.tracks.push(track);

        let clip = Clip::adjustment("adj", EditorTime::ZERO, EditorTime::from_secs(3)).unwrap();
        let clip_id = clip.id;
        let tol = project.tolerance();
        project.track_mut(track_id).unwrap().insert_clip(clip, tol).unwrap();

        assert_eq!(project.track_of_clip(clip_id).unwrap().id, track_id);
        assert_eq!(project.duration(), EditorTime::from_secs(3));
        assert!(project.validate().is_ok());
        assert!(matches!(
            project.clip(ClipId::new()),
            Err(TimelineError::ClipNotFound(_))
        ));
    }
}
