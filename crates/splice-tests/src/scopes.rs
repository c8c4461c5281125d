//! Integration tests for scope derivation driven by timeline samples.

use splice_core::EditorTime;
use splice_scopes::{
    DerivationScheduler, FrameSamples, HistogramConfig, ScopeData, ScopeKind, WaveformConfig,
};
use splice_timeline::{Clip, SharedTimeline, TimelineController, TrackKind};
use uuid::Uuid;

use crate::init_tracing;

/// Decode stand-in: a horizontal gray ramp for whatever media is active.
fn decode(media_id: Uuid, width: u32, height: u32) -> FrameSamples {
    let pixels = (0..width * height)
        .map(|i| {
            let v = (i % width) as f32 / (width - 1) as f32;
            [v, v, v]
        })
        .collect();
    FrameSamples::new(media_id, width, height, pixels).unwrap()
}

fn timeline_with_media() -> (SharedTimeline, Uuid) {
    let media_id = Uuid::new_v4();
    let mut controller = TimelineController::default();
    let track = controller.add_track("V1", TrackKind::Video).unwrap().value;
    let clip = Clip::media(
        "Shot",
        media_id,
        EditorTime::ZERO,
        EditorTime::ZERO,
        EditorTime::from_secs(4),
    )
    .unwrap();
    controller.add_clip(track, clip).unwrap();
    (SharedTimeline::new(controller), media_id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scopes_follow_the_active_clip() {
    init_tracing();
    let (timeline, media_id) = timeline_with_media();

    let active = {
        let guard = timeline.read();
        let frame = guard.evaluate_at(EditorTime::from_secs(1));
        frame.clips[0].media_id.unwrap()
    };
    assert_eq!(active, media_id);

    let scheduler = DerivationScheduler::new();
    let frame = decode(active, 256, 8);

    let histogram = scheduler.request(frame.clone(), ScopeKind::Histogram(HistogramConfig::default()));
    match histogram.result().await.unwrap() {
        ScopeData::Histogram(hist) => {
            assert_eq!(hist.total(), 256 * 8);
            assert!(hist.luma.iter().filter(|&&c| c > 0).count() > 200);
        }
        other => panic!("expected histogram, got {other:?}"),
    }

    let waveform = scheduler.request(frame, ScopeKind::Waveform(WaveformConfig::default()));
    match waveform.result().await.unwrap() {
        ScopeData::Waveform(wf) => {
            assert_eq!(wf.count(0, 0), 8);
            assert_eq!(wf.count(255, 100), 8);
        }
        other => panic!("expected waveform, got {other:?}"),
    }
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scrubbing_supersedes_stale_derivations() {
    init_tracing();
    let scheduler = DerivationScheduler::new();
    let media_id = Uuid::new_v4();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            scheduler.request(
                decode(media_id, 640, 360),
                ScopeKind::Waveform(WaveformConfig::default()),
            )
        })
        .collect();
    assert!(scheduler.active_count() <= 1);

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.result().await);
    }
    // Only the newest request is guaranteed to finish.
    assert!(matches!(results.last(), Some(Ok(ScopeData::Waveform(_)))));
    assert!(results
        .iter()
        .all(|r| matches!(r, Ok(_) | Err(splice_scopes::ScopeError::Cancelled))));
}
