//! Integration tests for the timeline subsystem.
//!
//! Exercises splice-core curves and time through the splice-timeline
//! controller, sampling, persistence and shared access.

use std::thread;

use proptest::prelude::*;
use splice_core::{EditorTime, Interpolation, KeyframeCurve};
use splice_timeline::{
    AdjacencyTolerance, Clip, ClipId, CurveTarget, MarkerKind, MaskKind, ProjectFile,
    SearchDirection, SharedTimeline, TimelineConfig, TimelineController, TimelineError,
    TimelineEvent, TrackId, TrackKind, TransitionKind, TransitionState, TrimEdge,
};
use uuid::Uuid;

use crate::init_tracing;

// ── Helpers ────────────────────────────────────────────────────

fn secs(s: i64) -> EditorTime {
    EditorTime::from_secs(s)
}

fn ms(ms: i64) -> EditorTime {
    EditorTime::from_millis(ms)
}

/// A media clip with one second of source handle before its in point.
fn clip(name: &str, start: i64, duration: i64) -> Clip {
    Clip::media(name, Uuid::new_v4(), secs(start), secs(1), secs(1 + duration)).unwrap()
}

struct Fixture {
    controller: TimelineController,
    track: TrackId,
    first: ClipId,
    second: ClipId,
}

/// Two adjacent 5 s clips joined by a 1 s cross dissolve.
fn two_clips_with_dissolve() -> Fixture {
    init_tracing();
    let mut controller = TimelineController::default();
    let track = controller.add_track("V1", TrackKind::Video).unwrap().value;
    let first = controller.add_clip(track, clip("Intro", 0, 5)).unwrap().value;
    let second = controller.add_clip(track, clip("Body", 5, 5)).unwrap().value;
    controller
        .add_transition(first, second, TransitionKind::CrossDissolve, secs(1))
        .unwrap();
    Fixture {
        controller,
        track,
        first,
        second,
    }
}

// ── Sampling ───────────────────────────────────────────────────

#[test]
fn dissolve_midpoint_blends_both_clips() {
    let f = two_clips_with_dissolve();
    let frame = f.controller.evaluate_at(ms(4500));

    assert_eq!(frame.clips.len(), 2);
    let total: f64 = frame.clips.iter().map(|c| c.weight).sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert_eq!(frame.transitions.len(), 1);
    assert!((frame.transitions[0].progress - 0.5).abs() < 1e-12);

    let sample = f.controller.sample_timeline_at(ms(4500));
    assert_eq!(sample.active_clip, Some(f.first));
    let transition = sample.active_transition.unwrap();
    assert_eq!(transition.to, f.second);
    assert_eq!(transition.incoming.source_time, ms(500));
}

#[test]
fn outside_dissolve_only_one_clip_is_active() {
    let f = two_clips_with_dissolve();
    let frame = f.controller.evaluate_at(secs(2));

    assert_eq!(frame.clips.len(), 1);
    assert_eq!(frame.clips[0].clip, f.first);
    assert_eq!(frame.clips[0].weight, 1.0);
    assert_eq!(frame.clips[0].source_time, secs(3));

    let later = f.controller.sample_timeline_at(secs(7));
    assert_eq!(later.active_clip, Some(f.second));
    assert!(later.active_transition.is_none());
}

#[test]
fn empty_positions_sample_empty() {
    let f = two_clips_with_dissolve();
    let sample = f.controller.sample_timeline_at(secs(60));
    assert!(sample.active_clip.is_none());
    assert!(f.controller.evaluate_at(secs(60)).is_empty());
}

#[test]
fn param_curve_is_evaluated_in_clip_local_time() {
    let mut f = two_clips_with_dissolve();
    f.controller
        .set_param_curve(f.second, "opacity", KeyframeCurve::unit(1.0))
        .unwrap();
    let target = CurveTarget::Param("opacity".into());
    f.controller
        .add_keyframe(f.second, target.clone(), secs(0), 1.0, Interpolation::Linear)
        .unwrap();
    f.controller
        .add_keyframe(f.second, target, secs(2), 0.0, Interpolation::Linear)
        .unwrap();

    let opacity = |t: EditorTime| {
        let frame = f.controller.evaluate_at(t);
        frame
            .clips
            .iter()
            .find(|c| c.clip == f.second)
            .map(|c| c.params["opacity"])
    };
    assert!((opacity(secs(6)).unwrap() - 0.5).abs() < 1e-12);
    assert_eq!(opacity(secs(8)), Some(0.0));
}

#[test]
fn speed_ramp_rederives_duration_and_source_mapping() {
    init_tracing();
    let mut controller = TimelineController::default();
    let track = controller.add_track("V1", TrackKind::Video).unwrap().value;
    let id = controller
        .add_clip(
            track,
            Clip::media("Fast", Uuid::new_v4(), EditorTime::ZERO, EditorTime::ZERO, secs(10)).unwrap(),
        )
        .unwrap()
        .value;

    controller
        .set_speed_curve(id, Some(KeyframeCurve::speed()))
        .unwrap();
    controller
        .add_keyframe(id, CurveTarget::Speed, EditorTime::ZERO, 2.0, Interpolation::Linear)
        .unwrap();

    assert_eq!(controller.project().clip(id).unwrap().timeline_duration, secs(5));
    let sample = controller.sample_timeline_at(ms(2500));
    assert_eq!(sample.speed_factor, 2.0);
    let source = sample.source_time.unwrap();
    assert!((source - secs(5)).abs() <= EditorTime::from_micros(2));
}

// ── Editing ────────────────────────────────────────────────────

#[test]
fn trimming_start_forward_shifts_clip() {
    init_tracing();
    let mut controller = TimelineController::default();
    let track = controller.add_track("V1", TrackKind::Video).unwrap().value;
    let id = controller.add_clip(track, clip("A", 2, 5)).unwrap().value;
    let before = controller.project().clip(id).unwrap().clone();

    controller
        .trim_clip(id, TrimEdge::Start(before.source_in + secs(1)))
        .unwrap();
    let after = controller.project().clip(id).unwrap();

    assert_eq!(after.timeline_duration, before.timeline_duration - secs(1));
    assert_eq!(after.timeline_start, before.timeline_start + secs(1));
    assert_eq!(after.source_out, before.source_out);
    assert_eq!(after.timeline_end(), before.timeline_end());
}

#[test]
fn breaking_adjacency_drops_transition_in_same_change() {
    let mut f = two_clips_with_dissolve();
    let transition = f.controller.project().track(f.track).unwrap().transitions()[0].id;
    let rx = f.controller.subscribe();

    let source_in = f.controller.project().clip(f.second).unwrap().source_in;
    let committed = f
        .controller
        .trim_clip(f.second, TrimEdge::Start(source_in + secs(1)))
        .unwrap();

    let received = rx.try_recv().unwrap();
    assert_eq!(received, committed.changes);
    assert!(received
        .events
        .contains(&TimelineEvent::TransitionInvalidated(transition)));
    assert!(f.controller.project().transition(transition).is_err());
    assert_eq!(
        f.controller.propose_transition(f.first, f.second).unwrap(),
        TransitionState::None
    );
}

#[test]
fn moving_into_dissolve_region_is_rejected() {
    let mut f = two_clips_with_dissolve();
    let snapshot = f.controller.project().clone();

    let err = f.controller.move_clip(f.second, ms(4500), None).unwrap_err();
    assert!(matches!(err, TimelineError::OverlapViolation { .. }));
    assert_eq!(f.controller.project(), &snapshot);

    let data = ProjectFile::new(f.controller.project().clone()).to_json().unwrap();
    assert!(ProjectFile::from_json(&data).is_ok());
}

#[test]
fn tightening_tolerance_under_overlapping_clips_is_rejected() {
    init_tracing();
    let mut controller = TimelineController::default();
    let track = controller.add_track("V1", TrackKind::Video).unwrap().value;
    controller.add_clip(track, clip("A", 0, 5)).unwrap();
    controller
        .add_clip(
            track,
            Clip::media("B", Uuid::new_v4(), ms(4950), secs(1), secs(6)).unwrap(),
        )
        .unwrap();
    let snapshot = controller.project().clone();

    let config = TimelineConfig {
        adjacency_tolerance: AdjacencyTolerance::Frames(1),
        ..*controller.config()
    };
    assert!(matches!(
        controller.set_config(config),
        Err(TimelineError::OverlapViolation { .. })
    ));
    assert_eq!(controller.project(), &snapshot);
}

#[test]
fn rejected_insert_leaves_project_unchanged() {
    let mut f = two_clips_with_dissolve();
    let snapshot = f.controller.project().clone();
    let rx = f.controller.subscribe();

    let err = f.controller.add_clip(f.track, clip("Overlap", 3, 4)).unwrap_err();
    assert!(matches!(err, TimelineError::OverlapViolation { .. }));
    assert_eq!(f.controller.project(), &snapshot);
    assert!(rx.try_recv().is_err());
}

#[test]
fn undo_and_redo_walk_edit_history() {
    let mut f = two_clips_with_dissolve();
    let original = f.controller.project().clone();

    f.controller.move_clip(f.second, secs(8), None).unwrap();
    let moved = f.controller.project().clone();
    f.controller.add_mask(f.first, MaskKind::Rectangle).unwrap();

    f.controller.undo().unwrap();
    assert_eq!(f.controller.project(), &moved);
    f.controller.undo().unwrap();
    assert_eq!(f.controller.project(), &original);
    assert_eq!(f.controller.project().track(f.track).unwrap().transitions().len(), 1);

    f.controller.redo().unwrap();
    assert_eq!(f.controller.project(), &moved);
    assert!(f.controller.can_redo());

    f.controller.set_clip_enabled(f.first, false).unwrap();
    assert!(!f.controller.can_redo());
}

#[test]
fn markers_are_navigable() {
    let mut f = two_clips_with_dissolve();
    f.controller
        .add_marker(secs(1), "Cold open", MarkerKind::Chapter, None, None)
        .unwrap();
    let beat = f
        .controller
        .add_marker(secs(5), "Beat", MarkerKind::Standard, Some("#ff8800".into()), None)
        .unwrap()
        .value;

    let markers = &f.controller.project().markers;
    assert_eq!(markers.len(), 2);
    let next = markers.find_nearest(secs(1), SearchDirection::Forward).unwrap();
    assert_eq!(next.id, beat);
    assert_eq!(next.color, "#FF8800");
    assert!(markers.find_nearest(secs(1), SearchDirection::Backward).is_none());
}

// ── Persistence ────────────────────────────────────────────────

#[test]
fn project_file_round_trip_is_byte_identical() {
    let mut f = two_clips_with_dissolve();
    f.controller.add_mask(f.second, MaskKind::Ellipse).unwrap();
    f.controller
        .add_marker(secs(3), "Note", MarkerKind::Comment, None, Some("check grade".into()))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("round_trip.json");
    f.controller.save_to_file(&path).unwrap();

    let first = std::fs::read(&path).unwrap();
    let loaded = ProjectFile::load_from_file(&path).unwrap();
    let second = loaded.to_json().unwrap();
    assert_eq!(first, second);

    let reloaded = TimelineController::new(loaded.project);
    for t in (0..11_000).step_by(250) {
        assert_eq!(
            f.controller.sample_timeline_at(ms(t)),
            reloaded.sample_timeline_at(ms(t))
        );
    }
}

#[test]
fn v0_document_loads_with_defaults() {
    let raw = serde_json::json!({
        "id": Uuid::new_v4(),
        "name": "Legacy",
        "frame_rate": { "numerator": 25, "denominator": 1 },
        "tracks": [],
    });
    let loaded = ProjectFile::from_json(&serde_json::to_vec(&raw).unwrap()).unwrap();
    assert_eq!(loaded.project.config.frame_rate.numerator, 25);
    assert_eq!(loaded.project.config.history_depth, 200);
}

// ── Edit sequences ─────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Edit {
    Move { clip: usize, start: EditorTime },
    TrimStart { clip: usize, shift: EditorTime },
    TrimEnd { clip: usize, shift: EditorTime },
    Link { from: usize, to: usize, duration: EditorTime },
    Tolerance(AdjacencyTolerance),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    // Starts on a 50 ms grid so edits regularly land inside the tolerance.
    let start = (0i64..320).prop_map(|n| ms(n * 50));
    let shift = (-30i64..30).prop_map(|n| ms(n * 50));
    let tolerance = prop_oneof![
        (0u32..4).prop_map(AdjacencyTolerance::Frames),
        (0i64..150).prop_map(|n| AdjacencyTolerance::Time(ms(n))),
    ];
    prop_oneof![
        (0usize..3, start).prop_map(|(clip, start)| Edit::Move { clip, start }),
        (0usize..3, shift.clone()).prop_map(|(clip, shift)| Edit::TrimStart { clip, shift }),
        (0usize..3, shift).prop_map(|(clip, shift)| Edit::TrimEnd { clip, shift }),
        (0usize..3, 0usize..3, 1i64..4000)
            .prop_map(|(from, to, d)| Edit::Link { from, to, duration: ms(d) }),
        tolerance.prop_map(Edit::Tolerance),
    ]
}

/// Three adjacent clips with a transition at each cut.
fn three_linked_clips() -> (TimelineController, [ClipId; 3]) {
    let mut f = two_clips_with_dissolve();
    let third = f.controller.add_clip(f.track, clip("Outro", 10, 5)).unwrap().value;
    f.controller
        .add_transition(f.second, third, TransitionKind::Wipe, ms(750))
        .unwrap();
    (f.controller, [f.first, f.second, third])
}

fn apply(controller: &mut TimelineController, clips: &[ClipId; 3], edit: &Edit) -> Result<(), TimelineError> {
    match *edit {
        Edit::Move { clip, start } => controller.move_clip(clips[clip], start, None).map(|_| ()),
        Edit::TrimStart { clip, shift } => {
            let source_in = controller.project().clip(clips[clip])?.source_in;
            controller
                .trim_clip(clips[clip], TrimEdge::Start(source_in + shift))
                .map(|_| ())
        }
        Edit::TrimEnd { clip, shift } => {
            let source_out = controller.project().clip(clips[clip])?.source_out;
            controller
                .trim_clip(clips[clip], TrimEdge::End(source_out + shift))
                .map(|_| ())
        }
        Edit::Link { from, to, duration } => controller
            .add_transition(clips[from], clips[to], TransitionKind::CrossDissolve, duration)
            .map(|_| ()),
        Edit::Tolerance(adjacency_tolerance) => {
            let config = TimelineConfig {
                adjacency_tolerance,
                ..*controller.config()
            };
            controller.set_config(config).map(|_| ())
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_committed_edits_always_reload(edits in prop::collection::vec(edit_strategy(), 1..24)) {
        let (mut controller, clips) = three_linked_clips();

        for edit in &edits {
            let before = controller.project().clone();
            match apply(&mut controller, &clips, edit) {
                Ok(()) => {
                    let data = ProjectFile::new(controller.project().clone()).to_json().unwrap();
                    let loaded = ProjectFile::from_json(&data);
                    prop_assert!(loaded.is_ok(), "{:?} left an unloadable project: {:?}", edit, loaded.as_ref().err());
                    prop_assert_eq!(&loaded.unwrap().project, controller.project());
                }
                Err(_) => {
                    prop_assert_eq!(controller.project(), &before);
                }
            }
        }
    }
}

// ── Shared access ──────────────────────────────────────────────

#[test]
fn playback_thread_samples_while_editor_writes() {
    let f = two_clips_with_dissolve();
    let (first, second) = (f.first, f.second);
    let shared = SharedTimeline::new(f.controller);

    let playback = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut sampler = shared.sampler();
            (0..200)
                .map(|i| sampler.sample(ms(i * 50)).active_clip)
                .filter(|active| active.is_some_and(|c| c != first && c != second))
                .count()
        })
    };

    for i in 0..20 {
        shared.edit(|c| {
            c.set_clip_enabled(first, i % 2 == 0).unwrap();
        });
    }

    assert_eq!(playback.join().unwrap(), 0);
    assert_eq!(shared.read().project().tracks[0].clip_count(), 2);
}
