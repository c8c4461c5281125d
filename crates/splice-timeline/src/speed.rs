//! Speed-ramp time mapping.
//!
//! A speed curve is keyed by absolute source time and gives the playback rate
//! at that source position. Playing source `[a, b)` takes
//! `∫ a..b 1/speed(s) ds` of timeline time. Stepped and linear segments are
//! integrated in closed form; Bézier segments use adaptive Simpson quadrature.

use splice_core::{EditorTime, Interpolation, KeyframeCurve};

/// Absolute quadrature tolerance per Bézier segment, in seconds.
const SEGMENT_TOLERANCE: f64 = 1e-6;
const MAX_SIMPSON_DEPTH: u32 = 16;

/// Smallest rate used as a divisor.
const MIN_RATE: f64 = 1e-6;

/// Timeline duration needed to play source `[source_in, source_out)`.
pub fn timeline_duration(
    curve: &KeyframeCurve,
    source_in: EditorTime,
    source_out: EditorTime,
) -> EditorTime {
    seconds_to_time(timeline_seconds(curve, source_in, source_out))
}

/// Timeline seconds needed to play source `[from, to)`. Negative if `to < from`.
pub fn timeline_seconds(curve: &KeyframeCurve, from: EditorTime, to: EditorTime) -> f64 {
    if to < from {
        return -timeline_seconds(curve, to, from);
    }
    if to == from {
        return 0.0;
    }

    let mut bounds = vec![from];
    bounds.extend(
        curve
            .keyframes()
            .iter()
            .map(|kf| kf.time)
            .filter(|t| *t > from && *t < to),
    );
    bounds.push(to);

    bounds
        .windows(2)
        .map(|w| segment_seconds(curve, w[0], w[1]))
        .sum()
}

/// Source time reached after playing `offset` of timeline time from `source_in`.
///
/// Solved by bisection over [`timeline_seconds`]. Offsets outside
/// `[0, duration]` extrapolate at the boundary rate, which is how an incoming
/// transition clip reaches into its source handle.
pub fn source_at_offset(
    curve: &KeyframeCurve,
    source_in: EditorTime,
    source_out: EditorTime,
    offset: EditorTime,
) -> EditorTime {
    let target = offset.to_seconds_f64();
    if target <= 0.0 {
        return source_in + seconds_to_time(target * rate_at(curve, source_in));
    }
    let total = timeline_seconds(curve, source_in, source_out);
    if target >= total {
        return source_out + seconds_to_time((target - total) * rate_at(curve, source_out));
    }

    let (mut lo, mut hi) = (source_in, source_out);
    while (hi - lo).as_micros() > 1 {
        let mid = lo + (hi - lo) / 2;
        if timeline_seconds(curve, source_in, mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let lo_err = (timeline_seconds(curve, source_in, lo) - target).abs();
    let hi_err = (timeline_seconds(curve, source_in, hi) - target).abs();
    if lo_err <= hi_err {
        lo
    } else {
        hi
    }
}

fn segment_seconds(curve: &KeyframeCurve, x0: EditorTime, x1: EditorTime) -> f64 {
    let len = (x1 - x0).to_seconds_f64();
    let keyframes = curve.keyframes();
    let idx = keyframes.partition_point(|kf| kf.time <= x0);

    // Outside the keyed range the curve holds a constant.
    if idx == 0 || idx == keyframes.len() {
        return len / rate_at(curve, x0);
    }

    match keyframes[idx - 1].interpolation {
        Interpolation::Stepped => len / rate_at(curve, x0),
        Interpolation::Linear => {
            let v0 = rate_at(curve, x0);
            let v1 = rate_at(curve, x1);
            if (v1 - v0).abs() < 1e-12 {
                len / v0
            } else {
                len * (v1 / v0).ln() / (v1 - v0)
            }
        }
        Interpolation::Bezier => {
            let f = |s: f64| 1.0 / curve.evaluate_seconds(s).max(MIN_RATE);
            adaptive_simpson(&f, x0.to_seconds_f64(), x1.to_seconds_f64(), SEGMENT_TOLERANCE)
        }
    }
}

fn rate_at(curve: &KeyframeCurve, time: EditorTime) -> f64 {
    curve.evaluate(time).max(MIN_RATE)
}

fn seconds_to_time(seconds: f64) -> EditorTime {
    EditorTime::from_micros((seconds * 1_000_000.0).round() as i64)
}

fn adaptive_simpson(f: &impl Fn(f64) -> f64, a: f64, b: f64, tolerance: f64) -> f64 {
    let (fa, fb) = (f(a), f(b));
    let fm = f(0.5 * (a + b));
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(f, (a, b), (fa, fm, fb), whole, tolerance, MAX_SIMPSON_DEPTH)
}

fn simpson_step(
    f: &impl Fn(f64) -> f64,
    (a, b): (f64, f64),
    (fa, fm, fb): (f64, f64, f64),
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let flm = f(0.5 * (a + m));
    let frm = f(0.5 * (m + b));
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }
    simpson_step(f, (a, m), (fa, flm, fm), left, tolerance / 2.0, depth - 1)
        + simpson_step(f, (m, b), (fm, frm, fb), right, tolerance / 2.0, depth - 1)
}
