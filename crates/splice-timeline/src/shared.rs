//! Thread-safe handle to a timeline.
//!
//! One `RwLock` guards the whole controller. Edits take the write lock, UI
//! queries take read locks, and the playback thread never blocks: it samples
//! through [`PlaybackSampler`], which reuses its last sample while a write is
//! in progress.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use splice_core::EditorTime;
use tracing::trace;

use crate::controller::TimelineController;
use crate::project::Project;
use crate::sample::TimelineSample;

/// Cloneable, shareable handle to a [`TimelineController`].
#[derive(Debug, Clone, Default)]
pub struct SharedTimeline {
    inner: Arc<RwLock<TimelineController>>,
}

impl SharedTimeline {
    pub fn new(controller: TimelineController) -> Self {
        Self {
            inner: Arc::new(RwLock::new(controller)),
        }
    }

    pub fn from_project(project: Project) -> Self {
        Self::new(TimelineController::new(project))
    }

    /// Shared access; concurrent with other readers.
    pub fn read(&self) -> RwLockReadGuard<'_, TimelineController> {
        self.inner.read()
    }

    /// Exclusive access for edits.
    pub fn write(&self) -> RwLockWriteGuard<'_, TimelineController> {
        self.inner.write()
    }

    /// Run `f` with exclusive access.
    pub fn edit<T>(&self, f: impl FnOnce(&mut TimelineController) -> T) -> T {
        f(&mut self.inner.write())
    }

    /// A sampler for a playback thread.
    pub fn sampler(&self) -> PlaybackSampler {
        PlaybackSampler {
            timeline: self.clone(),
            last: None,
        }
    }
}

/// Non-blocking sampler used by playback.
#[derive(Debug)]
pub struct PlaybackSampler {
    timeline: SharedTimeline,
    last: Option<TimelineSample>,
}

impl PlaybackSampler {
    /// Sample at `time`, or repeat the previous sample if a writer holds the
    /// lock. Before the first successful read the fallback is an empty sample.
    pub fn sample(&mut self, time: EditorTime) -> TimelineSample {
        match self.timeline.inner.try_read() {
            Some(controller) => {
                let sample = controller.sample_timeline_at(time);
                self.last = Some(sample.clone());
                sample
            }
            None => {
                trace!(time = %time, "Timeline locked for writing, reusing last sample");
                self.last
                    .clone()
                    .unwrap_or_else(|| TimelineSample::empty(time))
            }
        }
    }

    /// The most recent successful sample.
    pub fn last_sample(&self) -> Option<&TimelineSample> {
        self.last.as_ref()
    }
}
