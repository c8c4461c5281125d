//! Time representation for frame-accurate editing
//!
//! Timeline positions are exact signed microsecond counts. Frame rates are kept
//! as exact rationals and every frame conversion is computed from the absolute
//! value with integer rational arithmetic, so nothing accumulates.

use num_rational::Ratio;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::error::{Result, SpliceError};

const MICROS_PER_SECOND: i64 = 1_000_000;

/// A point in (or span of) editor time, stored as signed microseconds.
///
/// Arithmetic is exact. Raw subtraction may go negative so deltas can be
/// computed; use [`EditorTime::saturating_sub`] where a display context needs
/// a non-negative result.
///
/// # Frame conversion drift
///
/// `from_frames` rounds to the nearest microsecond from the absolute frame
/// index, so the worst-case error of any single timestamp is 0.5 µs and the
/// error per hour does not grow: drift over one hour is 0 frames for every
/// rate, NTSC rates included. Rates whose frame duration is a whole number of
/// microseconds (25, 50, 100) map exactly; 24, 30 and 60 round each timestamp
/// but still round-trip to the same frame index. A caller that approximates
/// 29.97 as 2997/100 instead of 30000/1001 diverges from broadcast NTSC by
/// 0.108 frames (3.6 ms) per hour; [`FrameRate::from_fps`] maps the NTSC
/// literals to x/1001 to avoid that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorTime(i64);

impl EditorTime {
    /// Zero time constant.
    pub const ZERO: Self = Self(0);

    /// Largest representable time.
    pub const MAX: Self = Self(i64::MAX);

    /// Create from a raw microsecond count.
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * MICROS_PER_SECOND)
    }

    /// Create from seconds, rounding to the nearest microsecond.
    ///
    /// Non-finite input is a caller contract violation and is reported as
    /// [`SpliceError::InvalidTimeValue`].
    pub fn from_seconds(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() {
            return Err(SpliceError::InvalidTimeValue(seconds));
        }
        let micros = (seconds * MICROS_PER_SECOND as f64).round();
        if micros >= i64::MAX as f64 || micros <= i64::MIN as f64 {
            return Err(SpliceError::InvalidTimeValue(seconds));
        }
        Ok(Self(micros as i64))
    }

    /// Create a time from a frame index at the given rate.
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        let micros = Ratio::new(
            frames as i128 * MICROS_PER_SECOND as i128 * rate.denominator as i128,
            rate.numerator as i128,
        );
        Self(micros.round().to_integer() as i64)
    }

    /// Convert to the frame index at the given rate, rounding half away from zero.
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        let frames = Ratio::new(
            self.0 as i128 * rate.numerator as i128,
            MICROS_PER_SECOND as i128 * rate.denominator as i128,
        );
        frames.round().to_integer() as i64
    }

    /// Snap to the nearest frame boundary of `rate`.
    #[inline]
    pub fn snap_to_frame(self, rate: FrameRate) -> Self {
        Self::from_frames(self.to_frames(rate), rate)
    }

    /// Raw microsecond count.
    #[inline]
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Convert to seconds as f64.
    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SECOND as f64
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Subtract, clamping the result at zero (for display contexts).
    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0).max(0))
    }

    /// Format as non-drop-frame timecode `HH:MM:SS:FF`.
    pub fn to_timecode(self, rate: FrameRate) -> String {
        let nominal = rate.nominal_fps() as i64;
        let total = self.to_frames(rate);
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        let ff = total % nominal;
        let secs = total / nominal;
        format!(
            "{}{:02}:{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            ff
        )
    }
}

impl Add for EditorTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for EditorTime {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for EditorTime {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for EditorTime {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for EditorTime {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i64> for EditorTime {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for EditorTime {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for EditorTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.to_seconds_f64())
    }
}

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 24000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Build a rate from frames per second.
    ///
    /// The NTSC literals (23.976, 29.97, 47.952, 59.94, 119.88) map to their
    /// exact x/1001 rationals; whole numbers map to n/1; anything else is
    /// approximated with a denominator of 1000.
    pub fn from_fps(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 || fps > 1_000_000.0 {
            return Err(SpliceError::InvalidFrameRate(format!("{fps} fps")));
        }
        for base in [24u32, 30, 48, 60, 120] {
            let ntsc = base as f64 * 1000.0 / 1001.0;
            if (fps - ntsc).abs() < 0.0005 {
                return Ok(Self::new(base * 1000, 1001));
            }
        }
        if (fps - fps.round()).abs() < 1e-9 {
            return Ok(Self::new(fps.round() as u32, 1));
        }
        Ok(Self::new((fps * 1000.0).round() as u32, 1000))
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Whole frames per second used for timecode labels (30 for 29.97).
    #[inline]
    pub fn nominal_fps(self) -> u32 {
        (self.to_fps_f64().round() as u32).max(1)
    }

    /// Duration of a single frame, rounded to the microsecond.
    #[inline]
    pub fn frame_duration(self) -> EditorTime {
        EditorTime::from_frames(1, self)
    }

    /// Whether frame boundaries land on exact microseconds.
    #[inline]
    pub fn is_exact(self) -> bool {
        (MICROS_PER_SECOND as u64 * self.denominator as u64) % self.numerator as u64 == 0
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A time range with inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: EditorTime,
    /// Duration of the range
    pub duration: EditorTime,
}

impl TimeRange {
    /// Create a new time range from start and duration.
    #[inline]
    pub fn new(start: EditorTime, duration: EditorTime) -> Self {
        Self { start, duration }
    }

    /// Create a time range from start and end times.
    #[inline]
    pub fn from_start_end(start: EditorTime, end: EditorTime) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> EditorTime {
        self.start + self.duration
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time: EditorTime) -> bool {
        time >= self.start && time < self.end()
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Length of the overlap between two ranges (zero when disjoint).
    pub fn overlap_len(self, other: Self) -> EditorTime {
        self.intersection(other)
            .map(|r| r.duration)
            .unwrap_or(EditorTime::ZERO)
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start: EditorTime::ZERO,
        duration: EditorTime::ZERO,
    };
}
