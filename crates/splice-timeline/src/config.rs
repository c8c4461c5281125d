//! Timeline configuration stored alongside the project.

use serde::{Deserialize, Serialize};
use splice_core::{EditorTime, FrameRate};

/// How far apart two clips may be and still count as adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum AdjacencyTolerance {
    /// Fixed time window.
    Time(EditorTime),
    /// A number of frames at the timeline rate.
    Frames(u32),
}

impl AdjacencyTolerance {
    /// Resolve to a time window at the given frame rate.
    pub fn resolve(self, rate: FrameRate) -> EditorTime {
        match self {
            Self::Time(t) => t.abs(),
            Self::Frames(n) => EditorTime::from_frames(i64::from(n), rate),
        }
    }
}

impl Default for AdjacencyTolerance {
    fn default() -> Self {
        Self::Time(EditorTime::from_millis(100))
    }
}

/// Per-project timeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Timeline frame rate, used for snapping and frame-based tolerances.
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub adjacency_tolerance: AdjacencyTolerance,
    /// Maximum number of undo steps kept.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

fn default_history_depth() -> usize {
    200
}

impl TimelineConfig {
    pub fn new(frame_rate: FrameRate) -> Self {
        Self {
            frame_rate,
            adjacency_tolerance: AdjacencyTolerance::default(),
            history_depth: default_history_depth(),
        }
    }

    /// Adjacency window in time units.
    pub fn tolerance(&self) -> EditorTime {
        self.adjacency_tolerance.resolve(self.frame_rate)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new(FrameRate::FPS_24)
    }
}
