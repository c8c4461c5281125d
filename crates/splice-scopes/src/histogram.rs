//! RGB and luma histograms.
//!
//! Rows are split into chunks counted in parallel; the cancel token is
//! checked before each chunk.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{ScopeError, ScopeResult};
use crate::frame::{bucket, luma, FrameSamples};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Buckets per channel.
    pub bins: usize,
    /// Rows counted per parallel chunk.
    pub rows_per_chunk: usize,
}

impl HistogramConfig {
    fn validate(&self) -> ScopeResult<()> {
        if self.bins < 2 {
            return Err(ScopeError::InvalidConfig(format!(
                "histogram needs at least 2 bins, got {}",
                self.bins
            )));
        }
        if self.rows_per_chunk == 0 {
            return Err(ScopeError::InvalidConfig("rows_per_chunk must be positive".into()));
        }
        Ok(())
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: 256,
            rows_per_chunk: 16,
        }
    }
}

/// Per-channel pixel counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
    pub luma: Vec<u32>,
}

impl Histogram {
    fn zeroed(bins: usize) -> Self {
        Self {
            red: vec![0; bins],
            green: vec![0; bins],
            blue: vec![0; bins],
            luma: vec![0; bins],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (dst, src) in [
            (&mut self.red, &other.red),
            (&mut self.green, &other.green),
            (&mut self.blue, &other.blue),
            (&mut self.luma, &other.luma),
        ] {
            dst.iter_mut().zip(src).for_each(|(d, s)| *d += s);
        }
        self
    }

    pub fn bins(&self) -> usize {
        self.luma.len()
    }

    /// Number of pixels counted.
    pub fn total(&self) -> u64 {
        self.luma.iter().map(|&c| c as u64).sum()
    }

    /// Count `frame` into a histogram.
    pub fn compute(
        frame: &FrameSamples,
        config: &HistogramConfig,
        cancel: &CancelToken,
    ) -> ScopeResult<Self> {
        config.validate()?;
        let bins = config.bins;
        let chunk_len = (config.rows_per_chunk * frame.width as usize).max(1);

        frame
            .pixels()
            .par_chunks(chunk_len)
            .map(|chunk| {
                if cancel.is_cancelled() {
                    return Err(ScopeError::Cancelled);
                }
                let mut hist = Self::zeroed(bins);
                for &rgb in chunk {
                    hist.red[bucket(rgb[0], bins)] += 1;
                    hist.green[bucket(rgb[1], bins)] += 1;
                    hist.blue[bucket(rgb[2], bins)] += 1;
                    hist.luma[bucket(luma(rgb), bins)] += 1;
                }
                Ok(hist)
            })
            .try_reduce(|| Self::zeroed(bins), |a, b| Ok(a.merge(b)))
    }
}
