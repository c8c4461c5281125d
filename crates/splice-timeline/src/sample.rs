//! Pure frame sampling for the renderer.
//!
//! Sampling never fails: positions with nothing on them produce empty
//! samples. Tracks are visited bottom to top, so every list in a sample is in
//! paint order.

use smallvec::SmallVec;
use splice_core::EditorTime;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::adjustment::AdjustmentLayer;
use crate::clip::{Clip, ClipId, ClipKind};
use crate::mask::Mask;
use crate::project::Project;
use crate::track::{Track, TrackId, TrackKind};
use crate::transition::{self, Transition, TransitionId, TransitionKind};

/// One clip contributing to a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSample {
    pub track: TrackId,
    pub clip: ClipId,
    pub media_id: Option<Uuid>,
    /// Time since the clip's timeline start; negative in a transition pre-roll.
    pub local_time: EditorTime,
    pub source_time: EditorTime,
    pub speed_factor: f64,
    /// Blend weight; clips not in a transition have weight 1.
    pub weight: f64,
    pub params: BTreeMap<String, f64>,
    /// Enabled masks in paint order.
    pub masks: Vec<Mask>,
}

impl ClipSample {
    fn new(track: TrackId, clip: &Clip, time: EditorTime, weight: f64) -> Self {
        Self {
            track,
            clip: clip.id,
            media_id: clip.media_id(),
            local_time: clip.local_time(time),
            source_time: clip.source_time_at(time),
            speed_factor: clip.speed_at(time),
            weight,
            params: clip.evaluate_params(time),
            masks: clip.masks.active().cloned().collect(),
        }
    }
}

/// A transition in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSample {
    pub id: TransitionId,
    pub kind: TransitionKind,
    /// Normalized progress in `[0, 1)`.
    pub progress: f64,
    pub from: ClipId,
    pub to: ClipId,
    /// The incoming clip, sampled from its source handle.
    pub incoming: ClipSample,
}

impl TransitionSample {
    fn new(track: &Track, transition: &Transition, to: &Clip, time: EditorTime, progress: f64) -> Self {
        Self {
            id: transition.id,
            kind: transition.kind,
            progress,
            from: transition.from_clip,
            to: transition.to_clip,
            incoming: ClipSample::new(track.id, to, time, progress),
        }
    }
}

/// A title to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub track: TrackId,
    pub clip: ClipId,
    pub text: String,
    pub font_size: f32,
    pub color: [f32; 4],
    pub weight: f64,
    pub params: BTreeMap<String, f64>,
}

/// Everything active at one timeline position.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub time: EditorTime,
    pub clips: SmallVec<[ClipSample; 4]>,
    pub transitions: SmallVec<[TransitionSample; 2]>,
    pub adjustments: Vec<AdjustmentLayer>,
    pub text: Vec<TextOverlay>,
}

impl FrameState {
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty() && self.text.is_empty() && self.adjustments.is_empty()
    }
}

/// What the renderer needs for the topmost visible picture at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSample {
    pub time: EditorTime,
    pub active_clip: Option<ClipId>,
    pub source_time: Option<EditorTime>,
    pub speed_factor: f64,
    /// Enabled adjustment layers from adjustment clips, in paint order.
    pub active_effects: Vec<AdjustmentLayer>,
    /// Enabled masks of the active clip.
    pub active_masks: Vec<Mask>,
    pub active_transition: Option<TransitionSample>,
}

impl TimelineSample {
    /// Sample of a position with nothing on it.
    pub fn empty(time: EditorTime) -> Self {
        Self {
            time,
            active_clip: None,
            source_time: None,
            speed_factor: 1.0,
            active_effects: Vec::new(),
            active_masks: Vec::new(),
            active_transition: None,
        }
    }
}

/// Which clips of one track are visible at a position, with their weights.
struct TrackState<'a> {
    entries: SmallVec<[(&'a Clip, f64); 2]>,
    transition: Option<(&'a Transition, &'a Clip, f64)>,
}

fn resolve_track(track: &Track, time: EditorTime) -> TrackState<'_> {
    let mut entries: SmallVec<[(&Clip, f64); 2]> = track
        .clips_at(time)
        .filter(|c| c.enabled)
        .map(|c| (c, 1.0))
        .collect();

    let active_transition = track.transitions().iter().find_map(|t| {
        let from = track.clip(t.from_clip).filter(|c| c.enabled)?;
        let to = track.clip(t.to_clip).filter(|c| c.enabled)?;
        let progress = t.progress(from, time)?;
        Some((t, from, to, progress))
    });

    match active_transition {
        Some((t, from, to, progress)) => {
            let (w_out, w_in) = transition::weights(progress);
            entries.retain(|(c, _)| c.id == from.id || c.id == to.id);
            for (clip, weight) in entries.iter_mut() {
                *weight = if clip.id == from.id { w_out } else { w_in };
            }
            if !entries.iter().any(|(c, _)| c.id == to.id) {
                entries.push((to, w_in));
            }
            TrackState {
                entries,
                transition: Some((t, to, progress)),
            }
        }
        None => {
            // Clips overlapping inside the tolerance: the later one wins.
            if entries.len() > 1 {
                let last = entries[entries.len() - 1];
                entries.clear();
                entries.push(last);
            }
            TrackState {
                entries,
                transition: None,
            }
        }
    }
}

/// Evaluate every track at `time`.
pub fn evaluate_frame(project: &Project, time: EditorTime) -> FrameState {
    let mut frame = FrameState {
        time,
        clips: SmallVec::new(),
        transitions: SmallVec::new(),
        adjustments: Vec::new(),
        text: Vec::new(),
    };

    for track in project.tracks.iter().filter(|t| !t.muted) {
        let state = resolve_track(track, time);
        if let Some((t, to, progress)) = state.transition {
            frame.transitions.push(TransitionSample::new(track, t, to, time, progress));
        }
        for (clip, weight) in state.entries {
            match &clip.kind {
                ClipKind::Media { .. } => frame.clips.push(ClipSample::new(track.id, clip, time, weight)),
                ClipKind::Text {
                    text,
                    font_size,
                    color,
                } => frame.text.push(TextOverlay {
                    track: track.id,
                    clip: clip.id,
                    text: text.clone(),
                    font_size: *font_size,
                    color: *color,
                    weight,
                    params: clip.evaluate_params(time),
                }),
                ClipKind::Adjustment { layers } => {
                    frame.adjustments.extend(layers.active().cloned());
                }
            }
        }
    }
    frame
}

/// Sample the topmost visible clip at `time`.
pub fn sample_timeline_at(project: &Project, time: EditorTime) -> TimelineSample {
    let mut sample = TimelineSample::empty(time);
    let video = project
        .tracks
        .iter()
        .filter(|t| t.kind == TrackKind::Video && !t.muted);

    for track in video {
        let state = resolve_track(track, time);
        for (clip, _) in &state.entries {
            if let Some(layers) = clip.adjustment_layers() {
                sample.active_effects.extend(layers.active().cloned());
            }
        }

        // The outgoing clip stays primary during a transition.
        let primary = match state.transition {
            Some((t, _, _)) => track.clip(t.from_clip),
            None => state
                .entries
                .iter()
                .map(|(c, _)| *c)
                .find(|c| c.adjustment_layers().is_none()),
        };
        let Some(clip) = primary else {
            continue;
        };

        sample.active_clip = Some(clip.id);
        sample.source_time = Some(clip.source_time_at(time));
        sample.speed_factor = clip.speed_at(time);
        sample.active_masks = clip.masks.active().cloned().collect();
        sample.active_transition = state
            .transition
            .map(|(t, to, progress)| TransitionSample::new(track, t, to, time, progress));
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::AdjustmentKind;
    use crate::mask::MaskKind;

    fn secs(s: i64) -> EditorTime {
        EditorTime::from_secs(s)
    }

    fn media(start: i64, dur: i64) -> Clip {
        Clip::media("m", Uuid::new_v4(), secs(start), secs(1), secs(1 + dur)).unwrap()
    }

    fn project_with_transition() -> (Project, ClipId, ClipId) {
        let mut project = Project::new("p");
        let mut track = Track::new_video("V1");
        let tol = project.tolerance();
        let a = media(0, 5);
        let b = media(5, 5);
        let (a_id, b_id) = (a.id, b.id);
        track.insert_clip(a, tol).unwrap();
        track.insert_clip(b, tol).unwrap();
        track
            .add_transition(TransitionKind::CrossDissolve, a_id, b_id, secs(1), tol)
            .unwrap();
        project.tracks.push(track);
        (project, a_id, b_id)
    }

    #[test]
    fn test_weights_inside_transition() {
        let (project, a, b) = project_with_transition();
        let frame = evaluate_frame(&project, EditorTime::from_millis(4500));

        assert_eq!(frame.clips.len(), 2);
        let wa = frame.clips.iter().find(|c| c.clip == a).unwrap().weight;
        let wb = frame.clips.iter().find(|c| c.clip == b).unwrap().weight;
        assert!((wa - 0.5).abs() < 1e-12);
        assert!((wb - 0.5).abs() < 1e-12);
        assert!((wa + wb - 1.0).abs() < 1e-12);

        // The incoming clip reaches half a second back into its handle.
        let incoming = frame.clips.iter().find(|c| c.clip == b).unwrap();
        assert_eq!(incoming.source_time, EditorTime::from_millis(500));
        assert_eq!(incoming.local_time, EditorTime::from_millis(-500));
    }

    #[test]
    fn test_single_clip_outside_transition() {
        let (project, a, _) = project_with_transition();
        let frame = evaluate_frame(&project, secs(2));
        assert_eq!(frame.clips.len(), 1);
        assert_eq!(frame.clips[0].clip, a);
        assert_eq!(frame.clips[0].weight, 1.0);
        assert!(frame.transitions.is_empty());
    }

    #[test]
    fn test_empty_position() {
        let (project, _, _) = project_with_transition();
        assert!(evaluate_frame(&project, secs(30)).is_empty());
        let sample = sample_timeline_at(&project, secs(30));
        assert_eq!(sample, TimelineSample::empty(secs(30)));
    }

    #[test]
    fn test_sample_reports_transition_and_masks() {
        let (mut project, a, b) = project_with_transition();
        let tol = project.tolerance();
        project.tracks[0]
            .update_clip(a, tol, |clip| {
                clip.masks.add_mask(MaskKind::Ellipse);
                Ok(())
            })
            .unwrap();

        let sample = sample_timeline_at(&project, EditorTime::from_millis(4250));
        assert_eq!(sample.active_clip, Some(a));
        assert_eq!(sample.source_time, Some(EditorTime::from_millis(5250)));
        assert_eq!(sample.active_masks.len(), 1);
        let transition = sample.active_transition.unwrap();
        assert_eq!(transition.incoming.clip, b);
        assert!((transition.progress - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_frame_and_sample_agree_on_transition() {
        let (project, a, b) = project_with_transition();
        for ms in [4000, 4250, 4999] {
            let time = EditorTime::from_millis(ms);
            let frame = evaluate_frame(&project, time);
            let sample = sample_timeline_at(&project, time);

            assert_eq!(frame.transitions.len(), 1);
            let from_frame = &frame.transitions[0];
            assert_eq!((from_frame.from, from_frame.to), (a, b));
            assert_eq!(sample.active_transition.as_ref(), Some(from_frame));
            let incoming = frame.clips.iter().find(|c| c.clip == b).unwrap();
            assert_eq!(&from_frame.incoming, incoming);
        }
    }

    #[test]
    fn test_adjustment_clip_contributes_effects() {
        let (mut project, _, _) = project_with_transition();
        let tol = project.tolerance();
        let mut adj = Clip::adjustment("grade", secs(0), secs(10)).unwrap();
        if let Ok(layers) = adj.adjustment_layers_mut() {
            layers.add_layer(AdjustmentKind::Saturation);
            let hidden = layers.add_layer(AdjustmentKind::Blur);
            layers.toggle_enabled(hidden).unwrap();
        }
        let mut upper = Track::new_video("V2");
        upper.insert_clip(adj, tol).unwrap();
        project.tracks.push(upper);

        let sample = sample_timeline_at(&project, secs(1));
        assert_eq!(sample.active_effects.len(), 1);
        assert_eq!(sample.active_effects[0].kind, AdjustmentKind::Saturation);
        assert!(sample.active_clip.is_some());

        let frame = evaluate_frame(&project, secs(1));
        assert_eq!(frame.adjustments.len(), 1);
    }

    #[test]
    fn test_muted_track_is_skipped() {
        let (mut project, _, _) = project_with_transition();
        project.tracks[0].muted = true;
        assert!(evaluate_frame(&project, secs(1)).is_empty());
    }
}
