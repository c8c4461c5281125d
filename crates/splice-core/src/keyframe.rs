//! Keyframe curves with linear, stepped and Bézier interpolation.
//!
//! A curve is a time-sorted vector of keyframes with unique times. Bézier
//! segments are evaluated by solving the cubic's time component for the query
//! time (Newton-Raphson with a bisection fallback) and returning its value
//! component.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, SpliceError};
use crate::time::{EditorTime, TimeRange};

// ── Identifiers ─────────────────────────────────────────────────

/// Stable identifier of a keyframe within its curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Interpolation ───────────────────────────────────────────────

/// How to interpolate from a keyframe to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Hold the value until the next keyframe.
    Stepped,
    /// Linear interpolation.
    #[default]
    Linear,
    /// Cubic Bézier using this keyframe's out handle and the next one's in handle.
    Bezier,
}

/// A Bézier handle relative to its keyframe: `dt` seconds along time and `dv`
/// along value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlPoint {
    pub dt: f64,
    pub dv: f64,
}

impl ControlPoint {
    pub const ZERO: Self = Self { dt: 0.0, dv: 0.0 };

    pub const fn new(dt: f64, dv: f64) -> Self {
        Self { dt, dv }
    }
}

/// One cubic segment normalised to `x ∈ [0, 1]`; `y` stays in value space.
#[derive(Debug, Clone, Copy)]
struct CubicSegment {
    x1: f64,
    x2: f64,
    y0: f64,
    y1: f64,
    y2: f64,
    y3: f64,
}

impl CubicSegment {
    fn sample_x(&self, s: f64) -> f64 {
        let mt = 1.0 - s;
        3.0 * mt * mt * s * self.x1 + 3.0 * mt * s * s * self.x2 + s * s * s
    }

    fn sample_y(&self, s: f64) -> f64 {
        let mt = 1.0 - s;
        mt * mt * mt * self.y0
            + 3.0 * mt * mt * s * self.y1
            + 3.0 * mt * s * s * self.y2
            + s * s * s * self.y3
    }

    fn sample_dx(&self, s: f64) -> f64 {
        let mt = 1.0 - s;
        3.0 * mt * mt * self.x1 + 6.0 * mt * s * (self.x2 - self.x1) + 3.0 * s * s * (1.0 - self.x2)
    }

    /// Find `s` with `sample_x(s) == x` and return the value there.
    fn evaluate(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return self.y0;
        }
        if x >= 1.0 {
            return self.y3;
        }

        let mut s = x;
        for _ in 0..8 {
            let err = self.sample_x(s) - x;
            if err.abs() < 1e-12 {
                return self.sample_y(s);
            }
            let dx = self.sample_dx(s);
            if dx.abs() < 1e-12 {
                break;
            }
            s = (s - err / dx).clamp(0.0, 1.0);
        }

        // Newton stalled on a flat tangent; x(s) is monotonic so bisection converges.
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..64 {
            s = 0.5 * (lo + hi);
            if self.sample_x(s) < x {
                lo = s;
            } else {
                hi = s;
            }
        }
        self.sample_y(s)
    }
}

// ── Keyframe ────────────────────────────────────────────────────

/// A single keyframe at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    /// Position on the curve's time axis.
    pub time: EditorTime,
    pub value: f64,
    /// Interpolation used TO the next keyframe.
    pub interpolation: Interpolation,
    #[serde(default)]
    pub control_in: ControlPoint,
    #[serde(default)]
    pub control_out: ControlPoint,
}

/// Field changes for [`KeyframeCurve::update_keyframe`]; `None` keeps the field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyframeUpdate {
    pub time: Option<EditorTime>,
    pub value: Option<f64>,
    pub interpolation: Option<Interpolation>,
}

/// Inclusive value clamp applied to stored and evaluated values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub const UNBOUNDED: Self = Self {
        min: f64::MIN,
        max: f64::MAX,
    };

    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(SpliceError::InvalidParameter(format!(
                "invalid curve domain [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

// ── Keyframe curve ──────────────────────────────────────────────

/// Keyframes for a single animated parameter.
///
/// Keyframe times are strictly increasing. Every mutation validates before it
/// writes, so a failed call leaves the curve unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeCurve {
    keyframes: Vec<Keyframe>,
    domain: Domain,
    enabled: bool,
    /// Value reported while the curve has no keyframes.
    default_value: f64,
}

impl KeyframeCurve {
    /// Create an empty, enabled, unbounded curve.
    pub fn new(default_value: f64) -> Self {
        Self {
            keyframes: Vec::new(),
            domain: Domain::UNBOUNDED,
            enabled: true,
            default_value,
        }
    }

    /// Create an empty curve clamped to `domain`.
    pub fn with_domain(default_value: f64, domain: Domain) -> Self {
        Self {
            keyframes: Vec::new(),
            domain,
            enabled: true,
            default_value: domain.clamp(default_value),
        }
    }

    /// Speed multiplier curve: defaults to 1x, clamped to `[0.05, 100]`.
    pub fn speed() -> Self {
        Self::with_domain(
            1.0,
            Domain {
                min: 0.05,
                max: 100.0,
            },
        )
    }

    /// Opacity-style curve clamped to `[0, 1]`.
    pub fn unit(default_value: f64) -> Self {
        Self::with_domain(default_value, Domain { min: 0.0, max: 1.0 })
    }

    /// Add a keyframe. Fails if another keyframe already sits at `time`.
    pub fn add_keyframe(
        &mut self,
        time: EditorTime,
        value: f64,
        interpolation: Interpolation,
    ) -> Result<KeyframeId> {
        let value = self.checked_value(value)?;
        let pos = match self.keyframes.binary_search_by_key(&time, |kf| kf.time) {
            Ok(_) => return Err(SpliceError::DuplicateKeyframeTime(time)),
            Err(pos) => pos,
        };
        let id = KeyframeId::new();
        self.keyframes.insert(
            pos,
            Keyframe {
                id,
                time,
                value,
                interpolation,
                control_in: ControlPoint::ZERO,
                control_out: ControlPoint::ZERO,
            },
        );
        Ok(id)
    }

    /// Remove a keyframe by id.
    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Result<Keyframe> {
        let idx = self.index_of(id)?;
        Ok(self.keyframes.remove(idx))
    }

    /// Move and/or change a keyframe.
    pub fn update_keyframe(&mut self, id: KeyframeId, update: KeyframeUpdate) -> Result<()> {
        let idx = self.index_of(id)?;
        let value = match update.value {
            Some(v) => Some(self.checked_value(v)?),
            None => None,
        };

        let mut kf = self.keyframes[idx].clone();
        if let Some(value) = value {
            kf.value = value;
        }
        if let Some(interpolation) = update.interpolation {
            kf.interpolation = interpolation;
        }

        match update.time {
            Some(time) if time != kf.time => {
                if let Ok(other) = self.keyframes.binary_search_by_key(&time, |k| k.time) {
                    if other != idx {
                        return Err(SpliceError::DuplicateKeyframeTime(time));
                    }
                }
                kf.time = time;
                self.keyframes.remove(idx);
                let pos = self.keyframes.partition_point(|k| k.time < time);
                self.keyframes.insert(pos, kf);
            }
            _ => self.keyframes[idx] = kf,
        }
        Ok(())
    }

    /// Set the Bézier handles of a keyframe.
    ///
    /// The out handle must point forward and stay within the following
    /// segment; the in handle must point backward and stay within the
    /// preceding one. Anything else would make the segment's time component
    /// non-monotonic.
    pub fn set_control_points(
        &mut self,
        id: KeyframeId,
        control_in: ControlPoint,
        control_out: ControlPoint,
    ) -> Result<()> {
        let idx = self.index_of(id)?;
        let finite = [control_in.dt, control_in.dv, control_out.dt, control_out.dv]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SpliceError::InvalidControlPoint(
                "handle components must be finite".into(),
            ));
        }
        if control_out.dt < 0.0 || control_in.dt > 0.0 {
            return Err(SpliceError::InvalidControlPoint(format!(
                "handles must point away from the keyframe (in dt {}, out dt {})",
                control_in.dt, control_out.dt
            )));
        }
        if let Some(next) = self.keyframes.get(idx + 1) {
            let span = (next.time - self.keyframes[idx].time).to_seconds_f64();
            if control_out.dt > span {
                return Err(SpliceError::InvalidControlPoint(format!(
                    "out handle {}s overshoots the next keyframe ({}s away)",
                    control_out.dt, span
                )));
            }
        }
        if idx > 0 {
            let span = (self.keyframes[idx].time - self.keyframes[idx - 1].time).to_seconds_f64();
            if -control_in.dt > span {
                return Err(SpliceError::InvalidControlPoint(format!(
                    "in handle {}s overshoots the previous keyframe ({}s away)",
                    control_in.dt, span
                )));
            }
        }

        let kf = &mut self.keyframes[idx];
        kf.control_in = control_in;
        kf.control_out = control_out;
        Ok(())
    }

    /// Evaluate the curve at a given time.
    pub fn evaluate(&self, time: EditorTime) -> f64 {
        let idx = self.keyframes.partition_point(|kf| kf.time <= time);
        self.evaluate_segment(idx, |a, span| (time - a.time).to_seconds_f64() / span)
    }

    /// Evaluate at a fractional time in seconds.
    ///
    /// Used by numeric integration, which needs sample points finer than a
    /// microsecond.
    pub fn evaluate_seconds(&self, seconds: f64) -> f64 {
        let idx = self
            .keyframes
            .partition_point(|kf| kf.time.to_seconds_f64() <= seconds);
        self.evaluate_segment(idx, |a, span| (seconds - a.time.to_seconds_f64()) / span)
    }

    /// `idx` is the partition point of keyframes at or before the query time;
    /// `progress` maps the left keyframe and segment span to normalised `t`.
    fn evaluate_segment(&self, idx: usize, progress: impl Fn(&Keyframe, f64) -> f64) -> f64 {
        let value = match (idx, self.keyframes.len()) {
            (_, 0) => self.default_value,
            (0, _) => self.keyframes[0].value,
            (i, n) if i == n => self.keyframes[n - 1].value,
            (i, _) => {
                let (a, b) = (&self.keyframes[i - 1], &self.keyframes[i]);
                let span = (b.time - a.time).to_seconds_f64();
                Self::interpolate(a, b, progress(a, span), span)
            }
        };
        self.domain.clamp(value)
    }

    /// Interpolate between two neighbouring keyframes at normalised `t`.
    fn interpolate(a: &Keyframe, b: &Keyframe, t: f64, span: f64) -> f64 {
        if span <= 0.0 {
            return a.value;
        }
        let t = t.clamp(0.0, 1.0);

        match a.interpolation {
            Interpolation::Stepped => a.value,
            Interpolation::Linear => a.value + (b.value - a.value) * t,
            Interpolation::Bezier => {
                // Handles are validated on edit; neighbours moving closer later
                // are absorbed by clamping into the segment.
                let segment = CubicSegment {
                    x1: (a.control_out.dt / span).clamp(0.0, 1.0),
                    x2: (1.0 + b.control_in.dt / span).clamp(0.0, 1.0),
                    y0: a.value,
                    y1: a.value + a.control_out.dv,
                    y2: b.value + b.control_in.dv,
                    y3: b.value,
                };
                segment.evaluate(t)
            }
        }
    }

    fn checked_value(&self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(SpliceError::InvalidParameter(format!(
                "keyframe value must be finite, got {value}"
            )));
        }
        Ok(self.domain.clamp(value))
    }

    fn index_of(&self, id: KeyframeId) -> Result<usize> {
        self.keyframes
            .iter()
            .position(|kf| kf.id == id)
            .ok_or(SpliceError::KeyframeNotFound(id))
    }

    /// Get a keyframe by id.
    pub fn get(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|kf| kf.id == id)
    }

    /// Get all keyframes (read-only, time-sorted).
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Remove every keyframe (parameter reset).
    pub fn clear(&mut self) {
        self.keyframes.clear();
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Whether this curve is animated (has more than one keyframe).
    pub fn is_animated(&self) -> bool {
        self.keyframes.len() > 1
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Change the domain, re-clamping stored values.
    pub fn set_domain(&mut self, domain: Domain) -> Result<()> {
        let domain = Domain::new(domain.min, domain.max)?;
        self.domain = domain;
        self.default_value = domain.clamp(self.default_value);
        for kf in &mut self.keyframes {
            kf.value = domain.clamp(kf.value);
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Get the time range spanned by keyframes.
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        Some(TimeRange::from_start_end(first.time, last.time))
    }
}

impl fmt::Display for KeyframeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyframeCurve({} keyframes)", self.keyframes.len())
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: i64) -> EditorTime {
        EditorTime::from_secs(s)
    }

    fn ms(v: i64) -> EditorTime {
        EditorTime::from_millis(v)
    }

    #[test]
    fn test_linear_midpoint_and_hold() {
        let mut curve = KeyframeCurve::new(0.0);
        curve.add_keyframe(secs(0), 1.0, Interpolation::Linear).unwrap();
        curve.add_keyframe(secs(2), 0.0, Interpolation::Linear).unwrap();

        assert!((curve.evaluate(secs(1)) - 0.5).abs() < 1e-12);
        assert_eq!(curve.evaluate(secs(3)), 0.0);
        assert_eq!(curve.evaluate(secs(-1)), 1.0);
    }

    #[test]
    fn test_stepped_holds_left_value() {
        let mut curve = KeyframeCurve::new(0.0);
        curve.add_keyframe(secs(0), 0.0, Interpolation::Stepped).unwrap();
        curve.add_keyframe(secs(1), 1.0, Interpolation::Stepped).unwrap();

        assert_eq!(curve.evaluate(ms(999)), 0.0);
        assert_eq!(curve.evaluate(secs(1)), 1.0);
    }

    #[test]
    fn test_duplicate_time_rejected() {
        let mut curve = KeyframeCurve::new(0.0);
        curve.add_keyframe(secs(1), 1.0, Interpolation::Linear).unwrap();
        let before = curve.clone();
        assert_eq!(
            curve.add_keyframe(secs(1), 5.0, Interpolation::Stepped),
            Err(SpliceError::DuplicateKeyframeTime(secs(1)))
        );
        assert_eq!(curve, before);
    }

    #[test]
    fn test_update_collision_leaves_curve_unchanged() {
        let mut curve = KeyframeCurve::new(0.0);
        let a = curve.add_keyframe(secs(0), 0.0, Interpolation::Linear).unwrap();
        curve.add_keyframe(secs(2), 2.0, Interpolation::Linear).unwrap();
        let before = curve.clone();

        let err = curve.update_keyframe(
            a,
            KeyframeUpdate {
                time: Some(secs(2)),
                value: Some(9.0),
                ..Default::default()
            },
        );
        assert_eq!(err, Err(SpliceError::DuplicateKeyframeTime(secs(2))));
        assert_eq!(curve, before);
    }

    #[test]
    fn test_update_moves_keyframe_and_keeps_order() {
        let mut curve = KeyframeCurve::new(0.0);
        let a = curve.add_keyframe(secs(0), 0.0, Interpolation::Linear).unwrap();
        curve.add_keyframe(secs(1), 1.0, Interpolation::Linear).unwrap();
        curve
            .update_keyframe(
                a,
                KeyframeUpdate {
                    time: Some(secs(3)),
                    ..Default::default()
                },
            )
            .unwrap();

        let times: Vec<_> = curve.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![secs(1), secs(3)]);
        assert_eq!(curve.keyframes()[1].id, a);
    }

    #[test]
    fn test_remove_missing_keyframe_errors() {
        let mut curve = KeyframeCurve::new(0.0);
        let id = curve.add_keyframe(secs(0), 1.0, Interpolation::Linear).unwrap();
        assert!(curve.remove_keyframe(id).is_ok());
        assert_eq!(
            curve.remove_keyframe(id),
            Err(SpliceError::KeyframeNotFound(id))
        );
        assert!(curve.is_empty());
    }

    #[test]
    fn test_empty_curve_reports_default() {
        let curve = KeyframeCurve::speed();
        assert_eq!(curve.evaluate(secs(10)), 1.0);
    }

    #[test]
    fn test_domain_clamps_values() {
        let mut curve = KeyframeCurve::unit(1.0);
        curve.add_keyframe(secs(0), 4.0, Interpolation::Linear).unwrap();
        assert_eq!(curve.keyframes()[0].value, 1.0);
        curve.add_keyframe(secs(1), -3.0, Interpolation::Linear).unwrap();
        assert_eq!(curve.evaluate(ms(500)), 0.5);
    }

    #[test]
    fn test_bezier_zero_handles_ease_in_out() {
        let mut curve = KeyframeCurve::new(0.0);
        curve.add_keyframe(secs(0), 0.0, Interpolation::Bezier).unwrap();
        curve.add_keyframe(secs(1), 100.0, Interpolation::Linear).unwrap();

        let mid = curve.evaluate(ms(500));
        assert!((mid - 50.0).abs() < 1e-6);
        assert!(curve.evaluate(ms(100)) < 10.0);
        assert!(curve.evaluate(ms(900)) > 90.0);
    }

    #[test]
    fn test_bezier_linear_handles_match_linear() {
        let mut curve = KeyframeCurve::new(0.0);
        let a = curve.add_keyframe(secs(0), 0.0, Interpolation::Bezier).unwrap();
        let b = curve.add_keyframe(secs(3), 3.0, Interpolation::Linear).unwrap();
        curve
            .set_control_points(a, ControlPoint::ZERO, ControlPoint::new(1.0, 1.0))
            .unwrap();
        curve
            .set_control_points(b, ControlPoint::new(-1.0, -1.0), ControlPoint::ZERO)
            .unwrap();

        for i in 0..=30 {
            let t = EditorTime::from_millis(i * 100);
            let y = curve.evaluate(t);
            assert!((y - t.to_seconds_f64()).abs() < 1e-6, "at {t}: {y}");
        }
    }

    #[test]
    fn test_non_monotonic_handles_rejected() {
        let mut curve = KeyframeCurve::new(0.0);
        let a = curve.add_keyframe(secs(0), 0.0, Interpolation::Bezier).unwrap();
        curve.add_keyframe(secs(1), 1.0, Interpolation::Linear).unwrap();
        let before = curve.clone();

        let backwards = curve.set_control_points(a, ControlPoint::ZERO, ControlPoint::new(-0.2, 0.0));
        assert!(matches!(backwards, Err(SpliceError::InvalidControlPoint(_))));
        let overshoot = curve.set_control_points(a, ControlPoint::ZERO, ControlPoint::new(1.5, 0.0));
        assert!(matches!(overshoot, Err(SpliceError::InvalidControlPoint(_))));
        assert_eq!(curve, before);
    }

    #[test]
    fn test_evaluate_seconds_matches_evaluate() {
        let mut curve = KeyframeCurve::new(0.0);
        curve.add_keyframe(secs(0), 0.0, Interpolation::Bezier).unwrap();
        curve.add_keyframe(secs(2), 4.0, Interpolation::Linear).unwrap();
        for ms_value in [0, 250, 1000, 1750, 2000, 2500] {
            let t = ms(ms_value);
            let a = curve.evaluate(t);
            let b = curve.evaluate_seconds(t.to_seconds_f64());
            assert!((a - b).abs() < 1e-9, "at {t}: {a} vs {b}");
        }
    }

    #[test]
    fn test_serde_roundtrip_preserves_ids() {
        let mut curve = KeyframeCurve::speed();
        let id = curve.add_keyframe(secs(1), 2.0, Interpolation::Bezier).unwrap();
        let json = serde_json::to_string(&curve).unwrap();
        let back: KeyframeCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, curve);
        assert!(back.get(id).is_some());
    }

    fn interior_curve(values: &[f64], bezier: bool) -> KeyframeCurve {
        let mut curve = KeyframeCurve::new(0.0);
        let mode = if bezier {
            Interpolation::Bezier
        } else {
            Interpolation::Linear
        };
        for (i, v) in values.iter().enumerate() {
            curve.add_keyframe(ms(i as i64 * 250), *v, mode).unwrap();
        }
        curve
    }

    proptest! {
        #[test]
        fn prop_continuous_at_interior_keyframes(
            values in prop::collection::vec(-100.0f64..100.0, 3..8),
            bezier in any::<bool>(),
        ) {
            let curve = interior_curve(&values, bezier);
            for kf in &curve.keyframes()[1..curve.len() - 1] {
                let eps = EditorTime::from_micros(1);
                let before = curve.evaluate(kf.time - eps);
                let after = curve.evaluate(kf.time + eps);
                prop_assert!((before - kf.value).abs() < 0.01);
                prop_assert!((after - kf.value).abs() < 0.01);
                prop_assert_eq!(curve.evaluate(kf.time), kf.value);
            }
        }
    }
}
