//! Immutable frame snapshots handed to derivations.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{ScopeError, ScopeResult};

/// Rec. 709 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// RGB pixels of one decoded frame, normalized to [0, 1], row-major.
///
/// Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct FrameSamples {
    pub media_id: Uuid,
    pub width: u32,
    pub height: u32,
    pixels: Arc<[[f32; 3]]>,
}

impl FrameSamples {
    pub fn new(media_id: Uuid, width: u32, height: u32, pixels: Vec<[f32; 3]>) -> ScopeResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ScopeError::DimensionMismatch {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            media_id,
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Frame filled with one color.
    pub fn solid(media_id: Uuid, width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let len = width as usize * height as usize;
        Self {
            media_id,
            width,
            height,
            pixels: vec![rgb; len].into(),
        }
    }

    pub fn pixels(&self) -> &[[f32; 3]] {
        &self.pixels
    }

    pub fn row(&self, y: u32) -> &[[f32; 3]] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Luma of a linear RGB triple.
pub fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2]
}

/// Map a [0, 1] value onto one of `count` buckets.
pub(crate) fn bucket(value: f32, count: usize) -> usize {
    let v = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    ((v * (count - 1) as f32).round() as usize).min(count - 1)
}
