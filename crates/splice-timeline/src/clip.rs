//! Clip types for the timeline.

use serde::{Deserialize, Serialize};
use splice_core::{EditorTime, KeyframeCurve, TimeRange};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::adjustment::AdjustmentStack;
use crate::error::{TimelineError, TimelineResult};
use crate::id::entity_id;
use crate::mask::MaskStack;
use crate::speed;

entity_id!(
    /// Identifier of a clip, stable across moves between tracks.
    ClipId
);

/// What a clip shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClipKind {
    /// Footage or audio from the media pool.
    Media { media_id: Uuid },
    /// Generated title text.
    Text {
        text: String,
        font_size: f32,
        /// Linear RGBA.
        color: [f32; 4],
    },
    /// Applies its layers to everything on the tracks below.
    Adjustment { layers: AdjustmentStack },
}

/// Which edge of a clip a trim moves, with the new source point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    /// New `source_in`. The clip's timeline end stays fixed.
    Start(EditorTime),
    /// New `source_out`. The clip's timeline start stays fixed.
    End(EditorTime),
}

/// A clip on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Clip name (displayed in UI)
    pub name: String,
    pub kind: ClipKind,
    /// Position of the first frame on the timeline
    pub timeline_start: EditorTime,
    /// Duration on timeline
    pub timeline_duration: EditorTime,
    /// Source in point
    pub source_in: EditorTime,
    /// Source out point (exclusive)
    pub source_out: EditorTime,
    /// Speed ramp keyed by absolute source time
    pub speed_curve: Option<KeyframeCurve>,
    /// Animated parameters keyed by clip-local time
    pub params: BTreeMap<String, KeyframeCurve>,
    pub masks: MaskStack,
    /// Is clip enabled
    pub enabled: bool,
}

impl Clip {
    /// Create a clip playing `[source_in, source_out)` at normal speed.
    pub fn new(
        name: impl Into<String>,
        kind: ClipKind,
        timeline_start: EditorTime,
        source_in: EditorTime,
        source_out: EditorTime,
    ) -> TimelineResult<Self> {
        let clip = Self {
            id: ClipId::new(),
            name: name.into(),
            kind,
            timeline_start,
            timeline_duration: source_out - source_in,
            source_in,
            source_out,
            speed_curve: None,
            params: BTreeMap::new(),
            masks: MaskStack::new(),
            enabled: true,
        };
        clip.validate()?;
        Ok(clip)
    }

    /// Create a media clip.
    pub fn media(
        name: impl Into<String>,
        media_id: Uuid,
        timeline_start: EditorTime,
        source_in: EditorTime,
        source_out: EditorTime,
    ) -> TimelineResult<Self> {
        Self::new(
            name,
            ClipKind::Media { media_id },
            timeline_start,
            source_in,
            source_out,
        )
    }

    /// Create a text clip with an opacity curve.
    pub fn text(
        name: impl Into<String>,
        text: impl Into<String>,
        timeline_start: EditorTime,
        duration: EditorTime,
    ) -> TimelineResult<Self> {
        let mut clip = Self::new(
            name,
            ClipKind::Text {
                text: text.into(),
                font_size: 48.0,
                color: [1.0, 1.0, 1.0, 1.0],
            },
            timeline_start,
            EditorTime::ZERO,
            duration,
        )?;
        clip.params
            .insert("opacity".to_string(), KeyframeCurve::unit(1.0));
        Ok(clip)
    }

    /// Create an empty adjustment clip.
    pub fn adjustment(
        name: impl Into<String>,
        timeline_start: EditorTime,
        duration: EditorTime,
    ) -> TimelineResult<Self> {
        Self::new(
            name,
            ClipKind::Adjustment {
                layers: AdjustmentStack::new(),
            },
            timeline_start,
            EditorTime::ZERO,
            duration,
        )
    }

    /// Timeline end (exclusive).
    pub fn timeline_end(&self) -> EditorTime {
        self.timeline_start + self.timeline_duration
    }

    pub fn timeline_range(&self) -> TimeRange {
        TimeRange::new(self.timeline_start, self.timeline_duration)
    }

    /// Get the source time range.
    pub fn source_range(&self) -> TimeRange {
        TimeRange::from_start_end(self.source_in, self.source_out)
    }

    pub fn media_id(&self) -> Option<Uuid> {
        match &self.kind {
            ClipKind::Media { media_id } => Some(*media_id),
            _ => None,
        }
    }

    pub fn adjustment_layers(&self) -> Option<&AdjustmentStack> {
        match &self.kind {
            ClipKind::Adjustment { layers } => Some(layers),
            _ => None,
        }
    }

    pub fn adjustment_layers_mut(&mut self) -> TimelineResult<&mut AdjustmentStack> {
        match &mut self.kind {
            ClipKind::Adjustment { layers } => Ok(layers),
            _ => Err(TimelineError::InvalidClip(format!(
                "clip {} is not an adjustment clip",
                self.id
            ))),
        }
    }

    /// The speed curve, if present and enabled.
    pub fn active_speed_curve(&self) -> Option<&KeyframeCurve> {
        self.speed_curve.as_ref().filter(|c| c.is_enabled())
    }

    /// Install or clear the speed curve and recompute the duration.
    pub fn set_speed_curve(&mut self, curve: Option<KeyframeCurve>) -> TimelineResult<()> {
        if let Some(curve) = &curve {
            if curve.domain().min <= 0.0 {
                return Err(TimelineError::InvalidValue(format!(
                    "speed curve domain must be positive, got min {}",
                    curve.domain().min
                )));
            }
        }
        self.speed_curve = curve;
        self.recompute_duration()
    }

    /// Derive `timeline_duration` from the source range and speed curve.
    pub fn recompute_duration(&mut self) -> TimelineResult<()> {
        self.timeline_duration = match self.active_speed_curve() {
            Some(curve) => speed::timeline_duration(curve, self.source_in, self.source_out),
            None => self.source_out - self.source_in,
        };
        self.validate()
    }

    /// Apply a trim on a copy and return it; `self` is untouched.
    pub fn trimmed(&self, edge: TrimEdge) -> TimelineResult<Self> {
        let mut clip = self.clone();
        match edge {
            TrimEdge::Start(source_in) => {
                let end = self.timeline_end();
                clip.source_in = source_in;
                clip.recompute_duration().map_err(as_trim_error)?;
                clip.timeline_start = end - clip.timeline_duration;
                if clip.timeline_start.is_negative() {
                    return Err(TimelineError::InvalidTrim(format!(
                        "clip would start before zero at {}",
                        clip.timeline_start
                    )));
                }
            }
            TrimEdge::End(source_out) => {
                clip.source_out = source_out;
                clip.recompute_duration().map_err(as_trim_error)?;
            }
        }
        Ok(clip)
    }

    /// Check the clip's structural invariants.
    pub fn validate(&self) -> TimelineResult<()> {
        if self.source_in.is_negative() {
            return Err(TimelineError::InvalidClip(format!(
                "source in {} is negative",
                self.source_in
            )));
        }
        if self.source_out <= self.source_in {
            return Err(TimelineError::InvalidClip(format!(
                "source out {} must be after source in {}",
                self.source_out, self.source_in
            )));
        }
        if self.timeline_duration <= EditorTime::ZERO {
            return Err(TimelineError::InvalidClip(format!(
                "timeline duration {} must be positive",
                self.timeline_duration
            )));
        }
        if self.timeline_start.is_negative() {
            return Err(TimelineError::InvalidClip(format!(
                "timeline start {} is negative",
                self.timeline_start
            )));
        }
        Ok(())
    }

    /// Clip-local time of a timeline position. Negative before the clip starts.
    pub fn local_time(&self, time: EditorTime) -> EditorTime {
        time - self.timeline_start
    }

    /// Source time shown at a timeline position, clamped at source zero.
    ///
    /// Positions before the clip reach back into the source handle.
    pub fn source_time_at(&self, time: EditorTime) -> EditorTime {
        let offset = self.local_time(time);
        let source = match self.active_speed_curve() {
            Some(curve) => speed::source_at_offset(curve, self.source_in, self.source_out, offset),
            None => self.source_in + offset,
        };
        source.max(EditorTime::ZERO)
    }

    /// Playback rate at a timeline position.
    pub fn speed_at(&self, time: EditorTime) -> f64 {
        match self.active_speed_curve() {
            Some(curve) => curve.evaluate(self.source_time_at(time)),
            None => 1.0,
        }
    }

    /// Values of enabled parameter curves at a timeline position.
    pub fn evaluate_params(&self, time: EditorTime) -> BTreeMap<String, f64> {
        let local = self.local_time(time);
        self.params
            .iter()
            .filter(|(_, curve)| curve.is_enabled())
            .map(|(name, curve)| (name.clone(), curve.evaluate(local)))
            .collect()
    }

    pub fn param(&self, name: &str) -> TimelineResult<&KeyframeCurve> {
        self.params
            .get(name)
            .ok_or_else(|| TimelineError::ParamNotFound(name.to_string()))
    }

    pub fn param_mut(&mut self, name: &str) -> TimelineResult<&mut KeyframeCurve> {
        self.params
            .get_mut(name)
            .ok_or_else(|| TimelineError::ParamNotFound(name.to_string()))
    }
}

fn as_trim_error(err: TimelineError) -> TimelineError {
    match err {
        TimelineError::InvalidClip(msg) => TimelineError::InvalidTrim(msg),
        other => other,
    }
}
