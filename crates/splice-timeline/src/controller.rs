//! The single writer of a timeline.
//!
//! Every mutation runs against a draft copy of the project. If any step fails
//! the draft is dropped and the project is untouched; otherwise the draft
//! replaces the project, the previous state goes onto the undo history and the
//! resulting [`ChangeSet`] is returned and broadcast to subscribers.

use crossbeam_channel::{Receiver, Sender};
use splice_core::{ControlPoint, EditorTime, Interpolation, Keyframe, KeyframeCurve, KeyframeId, KeyframeUpdate};
use tracing::{debug, warn};

use crate::adjustment::{AdjustmentId, AdjustmentKind, AdjustmentLayer, BlendMode};
use crate::clip::{Clip, ClipId, TrimEdge};
use crate::config::TimelineConfig;
use crate::error::{TimelineError, TimelineResult};
use crate::events::{ChangeSet, CurveTarget, TimelineEvent};
use crate::history::History;
use crate::marker::{Marker, MarkerId, MarkerKind, MarkerUpdate};
use crate::mask::{Mask, MaskId, MaskKind, MaskProperty, MaskShape};
use crate::project::Project;
use crate::sample::{self, FrameState, TimelineSample};
use crate::track::{Track, TrackId, TrackKind};
use crate::transition::{Transition, TransitionId, TransitionKind, TransitionState};

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub changes: ChangeSet,
}

/// Owns the project and applies every edit to it.
#[derive(Debug)]
pub struct TimelineController {
    project: Project,
    history: History<Project>,
    subscribers: Vec<Sender<ChangeSet>>,
    revision: u64,
}

impl TimelineController {
    pub fn new(project: Project) -> Self {
        let history = History::new(project.config.history_depth);
        Self {
            project,
            history,
            subscribers: Vec::new(),
            revision: 0,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.project.config
    }

    /// Revision of the current document; bumped by every commit, undo and redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive every future [`ChangeSet`]. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ChangeSet> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Everything active at `time`.
    pub fn evaluate_at(&self, time: EditorTime) -> FrameState {
        sample::evaluate_frame(&self.project, time)
    }

    pub fn sample_timeline_at(&self, time: EditorTime) -> TimelineSample {
        sample::sample_timeline_at(&self.project, time)
    }

    /// Whether a transition could link `from` → `to`, and how long it may be.
    pub fn propose_transition(&self, from: ClipId, to: ClipId) -> TimelineResult<TransitionState> {
        let track = self.project.track_of_clip(from)?;
        if !track.contains_clip(to) {
            self.project.clip(to)?;
            return Ok(TransitionState::None);
        }
        track.propose_transition(from, to, self.project.tolerance())
    }

    // ── Commit plumbing ─────────────────────────────────────────

    fn commit<T>(
        &mut self,
        op: &'static str,
        edit: impl FnOnce(&mut Project, &mut Vec<TimelineEvent>) -> TimelineResult<T>,
    ) -> TimelineResult<Committed<T>> {
        let mut draft = self.project.clone();
        let mut events = Vec::new();
        let value = match edit(&mut draft, &mut events) {
            Ok(value) => value,
            Err(err) => {
                debug!(op, error = %err, "Timeline edit rejected");
                return Err(err);
            }
        };

        let before = std::mem::replace(&mut self.project, draft);
        self.history.record(before);
        let changes = self.publish(events);
        debug!(
            op,
            revision = changes.revision,
            events = changes.events.len(),
            "Timeline edit committed"
        );
        Ok(Committed { value, changes })
    }

    fn publish(&mut self, events: Vec<TimelineEvent>) -> ChangeSet {
        self.revision += 1;
        let changes = ChangeSet {
            revision: self.revision,
            events,
        };
        for id in changes.invalidated_transitions() {
            warn!(transition = %id, revision = changes.revision, "Transition invalidated by edit");
        }
        self.subscribers.retain(|tx| tx.send(changes.clone()).is_ok());
        changes
    }

    /// Restore the state before the last commit.
    pub fn undo(&mut self) -> Option<ChangeSet> {
        let current = self.project.clone();
        let previous = self.history.undo(current)?;
        self.project = previous;
        let changes = self.publish(vec![TimelineEvent::HistoryRestored]);
        debug!(revision = changes.revision, "Undo");
        Some(changes)
    }

    /// Re-apply the last undone commit.
    pub fn redo(&mut self) -> Option<ChangeSet> {
        let current = self.project.clone();
        let next = self.history.redo(current)?;
        self.project = next;
        let changes = self.publish(vec![TimelineEvent::HistoryRestored]);
        debug!(revision = changes.revision, "Redo");
        Some(changes)
    }

    // ── Configuration ───────────────────────────────────────────

    /// Replace the timeline settings. A tighter tolerance can drop transitions.
    pub fn set_config(&mut self, config: TimelineConfig) -> TimelineResult<Committed<()>> {
        let committed = self.commit("set_config", |project, events| {
            project.config = config;
            events.push(TimelineEvent::ConfigChanged);
            let tolerance = project.tolerance();
            for track in &mut project.tracks {
                let dropped = track.revalidate_transitions(tolerance);
                invalidated(events, dropped);
                track.check_all_placements(tolerance)?;
            }
            Ok(())
        })?;
        self.history.set_max_depth(config.history_depth);
        Ok(committed)
    }

    // ── Tracks ──────────────────────────────────────────────────

    /// Add an empty track on top of the stack.
    pub fn add_track(
        &mut self,
        name: impl Into<String>,
        kind: TrackKind,
    ) -> TimelineResult<Committed<TrackId>> {
        let track = Track::new(name, kind);
        self.commit("add_track", |project, events| {
            let id = track.id;
            project.tracks.push(track);
            events.push(TimelineEvent::TrackAdded(id));
            Ok(id)
        })
    }

    /// Remove a track with all its clips and transitions.
    pub fn remove_track(&mut self, id: TrackId) -> TimelineResult<Committed<Track>> {
        self.commit("remove_track", |project, events| {
            let idx = project
                .tracks
                .iter()
                .position(|t| t.id == id)
                .ok_or(TimelineError::TrackNotFound(id))?;
            if project.tracks[idx].locked {
                return Err(TimelineError::TrackLocked(id));
            }
            let track = project.tracks.remove(idx);
            for t in track.transitions() {
                events.push(TimelineEvent::TransitionRemoved(t.id));
            }
            for clip in track.clips() {
                events.push(TimelineEvent::ClipRemoved {
                    track: id,
                    clip: clip.id,
                });
            }
            events.push(TimelineEvent::TrackRemoved(id));
            Ok(track)
        })
    }

    pub fn set_track_muted(&mut self, id: TrackId, muted: bool) -> TimelineResult<Committed<()>> {
        self.commit("set_track_muted", |project, events| {
            project.track_mut(id)?.muted = muted;
            events.push(TimelineEvent::TrackUpdated(id));
            Ok(())
        })
    }

    /// Lock or unlock a track. Locked tracks reject every clip-level edit.
    pub fn set_track_locked(&mut self, id: TrackId, locked: bool) -> TimelineResult<Committed<()>> {
        self.commit("set_track_locked", |project, events| {
            project.track_mut(id)?.locked = locked;
            events.push(TimelineEvent::TrackUpdated(id));
            Ok(())
        })
    }

    // ── Clips ───────────────────────────────────────────────────

    pub fn add_clip(&mut self, track: TrackId, clip: Clip) -> TimelineResult<Committed<ClipId>> {
        self.commit("add_clip", |project, events| {
            if project.track_of_clip(clip.id).is_ok() {
                return Err(TimelineError::InvalidClip(format!(
                    "clip {} is already on the timeline",
                    clip.id
                )));
            }
            let tolerance = project.tolerance();
            let target = unlocked_track_mut(project, track)?;
            let id = clip.id;
            target.insert_clip(clip, tolerance)?;
            events.push(TimelineEvent::ClipAdded { track, clip: id });
            Ok(id)
        })
    }

    /// Remove a clip; transitions that reference it are invalidated.
    pub fn remove_clip(&mut self, clip: ClipId) -> TimelineResult<Committed<Clip>> {
        self.commit("remove_clip", |project, events| {
            let track = owning_track_mut(project, clip)?;
            let track_id = track.id;
            let (removed, dropped) = track.remove_clip(clip)?;
            events.push(TimelineEvent::ClipRemoved {
                track: track_id,
                clip,
            });
            invalidated(events, dropped);
            Ok(removed)
        })
    }

    /// Move a clip to `new_start`, optionally onto another track.
    pub fn move_clip(
        &mut self,
        clip: ClipId,
        new_start: EditorTime,
        target_track: Option<TrackId>,
    ) -> TimelineResult<Committed<()>> {
        self.commit("move_clip", |project, events| {
            let tolerance = project.tolerance();
            let from_track = owning_track_mut(project, clip)?.id;
            let to_track = target_track.unwrap_or(from_track);

            if to_track == from_track {
                let dropped = project
                    .track_mut(from_track)?
                    .move_clip(clip, new_start, tolerance)?;
                invalidated(events, dropped);
            } else {
                unlocked_track_mut(project, to_track)?;
                let (mut moved, dropped) = project.track_mut(from_track)?.remove_clip(clip)?;
                invalidated(events, dropped);
                moved.timeline_start = new_start;
                project.track_mut(to_track)?.insert_clip(moved, tolerance)?;
            }
            events.push(TimelineEvent::ClipMoved {
                from_track,
                track: to_track,
                clip,
            });
            Ok(())
        })
    }

    /// Trim one edge of a clip.
    pub fn trim_clip(&mut self, clip: ClipId, edge: TrimEdge) -> TimelineResult<Committed<()>> {
        self.commit("trim_clip", |project, events| {
            let tolerance = project.tolerance();
            let track = owning_track_mut(project, clip)?;
            let track_id = track.id;
            let dropped = track.trim_clip(clip, edge, tolerance)?;
            events.push(TimelineEvent::ClipChanged {
                track: track_id,
                clip,
            });
            invalidated(events, dropped);
            Ok(())
        })
    }

    pub fn set_clip_enabled(&mut self, clip: ClipId, enabled: bool) -> TimelineResult<Committed<()>> {
        self.commit("set_clip_enabled", |project, events| {
            edit_clip(project, events, clip, |c| {
                c.enabled = enabled;
                Ok(())
            })
        })
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Link two adjacent clips on the same track.
    pub fn add_transition(
        &mut self,
        from: ClipId,
        to: ClipId,
        kind: TransitionKind,
        duration: EditorTime,
    ) -> TimelineResult<Committed<TransitionId>> {
        self.commit("add_transition", |project, events| {
            let tolerance = project.tolerance();
            project.clip(to)?;
            let track = owning_track_mut(project, from)?;
            if !track.contains_clip(to) {
                return Err(TimelineError::InvalidValue(format!(
                    "clips {from} and {to} are on different tracks"
                )));
            }
            let id = track.add_transition(kind, from, to, duration, tolerance)?.id;
            events.push(TimelineEvent::TransitionAdded(id));
            Ok(id)
        })
    }

    /// Change a transition's duration; the stored (clamped) value is returned.
    pub fn resize_transition(
        &mut self,
        id: TransitionId,
        duration: EditorTime,
    ) -> TimelineResult<Committed<EditorTime>> {
        self.commit("resize_transition", |project, events| {
            let track = owning_transition_track_mut(project, id)?;
            let stored = track.resize_transition(id, duration)?;
            events.push(TimelineEvent::TransitionChanged(id));
            Ok(stored)
        })
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> TimelineResult<Committed<Transition>> {
        self.commit("remove_transition", |project, events| {
            let track = owning_transition_track_mut(project, id)?;
            let removed = track.remove_transition(id)?;
            events.push(TimelineEvent::TransitionRemoved(id));
            Ok(removed)
        })
    }

    // ── Speed ramps ─────────────────────────────────────────────

    /// Install or clear a clip's speed curve; the duration is re-derived.
    pub fn set_speed_curve(
        &mut self,
        clip: ClipId,
        curve: Option<KeyframeCurve>,
    ) -> TimelineResult<Committed<()>> {
        self.commit("set_speed_curve", |project, events| {
            edit_clip(project, events, clip, |c| c.set_speed_curve(curve))?;
            events.push(TimelineEvent::KeyframesChanged {
                clip,
                curve: CurveTarget::Speed,
            });
            Ok(())
        })
    }

    /// Enable or bypass the speed curve; disabling reverts to 1x duration.
    pub fn set_speed_curve_enabled(
        &mut self,
        clip: ClipId,
        enabled: bool,
    ) -> TimelineResult<Committed<()>> {
        self.commit("set_speed_curve_enabled", |project, events| {
            edit_clip(project, events, clip, |c| {
                c.speed_curve
                    .as_mut()
                    .ok_or_else(|| TimelineError::ParamNotFound("speed".to_string()))?
                    .set_enabled(enabled);
                c.recompute_duration()
            })
        })
    }

    // ── Keyframes ───────────────────────────────────────────────

    /// Register an animatable parameter curve on a clip, replacing any
    /// existing curve of that name.
    pub fn set_param_curve(
        &mut self,
        clip: ClipId,
        name: impl Into<String>,
        curve: KeyframeCurve,
    ) -> TimelineResult<Committed<()>> {
        let name = name.into();
        self.commit("set_param_curve", |project, events| {
            edit_clip(project, events, clip, |c| {
                c.params.insert(name.clone(), curve);
                Ok(())
            })?;
            events.push(TimelineEvent::KeyframesChanged {
                clip,
                curve: CurveTarget::Param(name),
            });
            Ok(())
        })
    }

    pub fn add_keyframe(
        &mut self,
        clip: ClipId,
        target: CurveTarget,
        time: EditorTime,
        value: f64,
        interpolation: Interpolation,
    ) -> TimelineResult<Committed<KeyframeId>> {
        self.edit_curve("add_keyframe", clip, target, |curve| {
            Ok(curve.add_keyframe(time, value, interpolation)?)
        })
    }

    pub fn update_keyframe(
        &mut self,
        clip: ClipId,
        target: CurveTarget,
        id: KeyframeId,
        update: KeyframeUpdate,
    ) -> TimelineResult<Committed<()>> {
        self.edit_curve("update_keyframe", clip, target, |curve| {
            Ok(curve.update_keyframe(id, update)?)
        })
    }

    pub fn remove_keyframe(
        &mut self,
        clip: ClipId,
        target: CurveTarget,
        id: KeyframeId,
    ) -> TimelineResult<Committed<Keyframe>> {
        self.edit_curve("remove_keyframe", clip, target, |curve| {
            Ok(curve.remove_keyframe(id)?)
        })
    }

    pub fn set_control_points(
        &mut self,
        clip: ClipId,
        target: CurveTarget,
        id: KeyframeId,
        control_in: ControlPoint,
        control_out: ControlPoint,
    ) -> TimelineResult<Committed<()>> {
        self.edit_curve("set_control_points", clip, target, |curve| {
            Ok(curve.set_control_points(id, control_in, control_out)?)
        })
    }

    /// Apply a curve edit; speed curve edits re-derive the clip duration.
    fn edit_curve<T>(
        &mut self,
        op: &'static str,
        clip: ClipId,
        target: CurveTarget,
        edit: impl FnOnce(&mut KeyframeCurve) -> TimelineResult<T>,
    ) -> TimelineResult<Committed<T>> {
        self.commit(op, |project, events| {
            let value = edit_clip(project, events, clip, |c| {
                let value = match &target {
                    CurveTarget::Speed => {
                        let curve = c
                            .speed_curve
                            .as_mut()
                            .ok_or_else(|| TimelineError::ParamNotFound("speed".to_string()))?;
                        edit(curve)?
                    }
                    CurveTarget::Param(name) => edit(c.param_mut(name)?)?,
                };
                if target == CurveTarget::Speed {
                    c.recompute_duration()?;
                }
                Ok(value)
            })?;
            events.push(TimelineEvent::KeyframesChanged { clip, curve: target });
            Ok(value)
        })
    }

    // ── Markers ─────────────────────────────────────────────────

    pub fn add_marker(
        &mut self,
        timestamp: EditorTime,
        label: impl Into<String>,
        kind: MarkerKind,
        color: Option<String>,
        description: Option<String>,
    ) -> TimelineResult<Committed<MarkerId>> {
        let label = label.into();
        self.commit("add_marker", |project, events| {
            let id = project
                .markers
                .add(timestamp, label, kind, color, description)?;
            events.push(TimelineEvent::MarkerAdded(id));
            Ok(id)
        })
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> TimelineResult<Committed<Marker>> {
        self.commit("remove_marker", |project, events| {
            let marker = project.markers.remove(id)?;
            events.push(TimelineEvent::MarkerRemoved(id));
            Ok(marker)
        })
    }

    pub fn update_marker(&mut self, id: MarkerId, update: MarkerUpdate) -> TimelineResult<Committed<()>> {
        self.commit("update_marker", |project, events| {
            project.markers.update(id, update)?;
            events.push(TimelineEvent::MarkerChanged(id));
            Ok(())
        })
    }

    // ── Masks ───────────────────────────────────────────────────

    pub fn add_mask(&mut self, clip: ClipId, kind: MaskKind) -> TimelineResult<Committed<MaskId>> {
        self.commit("add_mask", |project, events| {
            let mask = edit_clip(project, events, clip, |c| Ok(c.masks.add_mask(kind)))?;
            events.push(TimelineEvent::MaskAdded { clip, mask });
            Ok(mask)
        })
    }

    pub fn remove_mask(&mut self, clip: ClipId, mask: MaskId) -> TimelineResult<Committed<Mask>> {
        self.commit("remove_mask", |project, events| {
            let removed = edit_clip(project, events, clip, |c| c.masks.remove_mask(mask))?;
            events.push(TimelineEvent::MaskRemoved { clip, mask });
            Ok(removed)
        })
    }

    pub fn reorder_masks(
        &mut self,
        clip: ClipId,
        old_index: usize,
        new_index: usize,
    ) -> TimelineResult<Committed<()>> {
        self.commit("reorder_masks", |project, events| {
            edit_clip(project, events, clip, |c| c.masks.reorder(old_index, new_index))?;
            events.push(TimelineEvent::MasksReordered { clip });
            Ok(())
        })
    }

    /// Set feather, opacity or expansion; the stored (clamped) value is returned.
    pub fn set_mask_property(
        &mut self,
        clip: ClipId,
        mask: MaskId,
        property: MaskProperty,
        value: f32,
    ) -> TimelineResult<Committed<f32>> {
        self.commit("set_mask_property", |project, events| {
            let stored = edit_clip(project, events, clip, |c| {
                c.masks.set_property(mask, property, value)
            })?;
            events.push(TimelineEvent::MaskChanged { clip, mask });
            Ok(stored)
        })
    }

    pub fn toggle_mask_enabled(&mut self, clip: ClipId, mask: MaskId) -> TimelineResult<Committed<bool>> {
        self.commit("toggle_mask_enabled", |project, events| {
            let enabled = edit_clip(project, events, clip, |c| c.masks.toggle_enabled(mask))?;
            events.push(TimelineEvent::MaskChanged { clip, mask });
            Ok(enabled)
        })
    }

    pub fn toggle_mask_inverted(&mut self, clip: ClipId, mask: MaskId) -> TimelineResult<Committed<bool>> {
        self.commit("toggle_mask_inverted", |project, events| {
            let inverted = edit_clip(project, events, clip, |c| c.masks.toggle_inverted(mask))?;
            events.push(TimelineEvent::MaskChanged { clip, mask });
            Ok(inverted)
        })
    }

    pub fn set_mask_shape(
        &mut self,
        clip: ClipId,
        mask: MaskId,
        shape: MaskShape,
    ) -> TimelineResult<Committed<()>> {
        self.commit("set_mask_shape", |project, events| {
            edit_clip(project, events, clip, |c| c.masks.set_shape(mask, shape))?;
            events.push(TimelineEvent::MaskChanged { clip, mask });
            Ok(())
        })
    }

    // ── Adjustment layers ───────────────────────────────────────

    pub fn add_adjustment(
        &mut self,
        clip: ClipId,
        kind: AdjustmentKind,
    ) -> TimelineResult<Committed<AdjustmentId>> {
        self.commit("add_adjustment", |project, events| {
            let layer = edit_clip(project, events, clip, |c| {
                Ok(c.adjustment_layers_mut()?.add_layer(kind))
            })?;
            events.push(TimelineEvent::AdjustmentAdded { clip, layer });
            Ok(layer)
        })
    }

    pub fn remove_adjustment(
        &mut self,
        clip: ClipId,
        layer: AdjustmentId,
    ) -> TimelineResult<Committed<AdjustmentLayer>> {
        self.commit("remove_adjustment", |project, events| {
            let removed = edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.remove_layer(layer)
            })?;
            events.push(TimelineEvent::AdjustmentRemoved { clip, layer });
            Ok(removed)
        })
    }

    pub fn reorder_adjustments(
        &mut self,
        clip: ClipId,
        old_index: usize,
        new_index: usize,
    ) -> TimelineResult<Committed<()>> {
        self.commit("reorder_adjustments", |project, events| {
            edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.reorder(old_index, new_index)
            })?;
            events.push(TimelineEvent::AdjustmentsReordered { clip });
            Ok(())
        })
    }

    pub fn set_adjustment_amount(
        &mut self,
        clip: ClipId,
        layer: AdjustmentId,
        amount: f32,
    ) -> TimelineResult<Committed<f32>> {
        self.commit("set_adjustment_amount", |project, events| {
            let stored = edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.set_amount(layer, amount)
            })?;
            events.push(TimelineEvent::AdjustmentChanged { clip, layer });
            Ok(stored)
        })
    }

    pub fn set_adjustment_opacity(
        &mut self,
        clip: ClipId,
        layer: AdjustmentId,
        opacity: f32,
    ) -> TimelineResult<Committed<f32>> {
        self.commit("set_adjustment_opacity", |project, events| {
            let stored = edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.set_opacity(layer, opacity)
            })?;
            events.push(TimelineEvent::AdjustmentChanged { clip, layer });
            Ok(stored)
        })
    }

    pub fn set_adjustment_blend(
        &mut self,
        clip: ClipId,
        layer: AdjustmentId,
        blend: BlendMode,
    ) -> TimelineResult<Committed<()>> {
        self.commit("set_adjustment_blend", |project, events| {
            edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.set_blend(layer, blend)
            })?;
            events.push(TimelineEvent::AdjustmentChanged { clip, layer });
            Ok(())
        })
    }

    pub fn toggle_adjustment_enabled(
        &mut self,
        clip: ClipId,
        layer: AdjustmentId,
    ) -> TimelineResult<Committed<bool>> {
        self.commit("toggle_adjustment_enabled", |project, events| {
            let enabled = edit_clip(project, events, clip, |c| {
                c.adjustment_layers_mut()?.toggle_enabled(layer)
            })?;
            events.push(TimelineEvent::AdjustmentChanged { clip, layer });
            Ok(enabled)
        })
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(Project::default())
    }
}

// ── Draft helpers ───────────────────────────────────────────────

fn invalidated(events: &mut Vec<TimelineEvent>, dropped: Vec<Transition>) {
    events.extend(
        dropped
            .into_iter()
            .map(|t| TimelineEvent::TransitionInvalidated(t.id)),
    );
}

fn unlocked_track_mut(project: &mut Project, id: TrackId) -> TimelineResult<&mut Track> {
    let track = project.track_mut(id)?;
    if track.locked {
        return Err(TimelineError::TrackLocked(id));
    }
    Ok(track)
}

/// The unlocked track holding `clip`.
fn owning_track_mut(project: &mut Project, clip: ClipId) -> TimelineResult<&mut Track> {
    let id = project.track_of_clip(clip)?.id;
    unlocked_track_mut(project, id)
}

fn owning_transition_track_mut(
    project: &mut Project,
    transition: TransitionId,
) -> TimelineResult<&mut Track> {
    let id = project.track_of_transition(transition)?.id;
    unlocked_track_mut(project, id)
}

/// Edit one clip in place on its track and record the change.
fn edit_clip<T>(
    project: &mut Project,
    events: &mut Vec<TimelineEvent>,
    clip: ClipId,
    edit: impl FnOnce(&mut Clip) -> TimelineResult<T>,
) -> TimelineResult<T> {
    let tolerance = project.tolerance();
    let track = owning_track_mut(project, clip)?;
    let track_id = track.id;
    let (value, dropped) = track.update_clip(clip, tolerance, edit)?;
    events.push(TimelineEvent::ClipChanged {
        track: track_id,
        clip,
    });
    invalidated(events, dropped);
    Ok(value)
}
