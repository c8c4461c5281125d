//! Luma waveform monitor data.
//!
//! The frame is divided into vertical columns; each column holds a count of
//! pixels per IRE level, bottom (0 IRE) first. Rows are counted in parallel
//! chunks like the histogram.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{ScopeError, ScopeResult};
use crate::frame::{bucket, luma, FrameSamples};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Output columns; frame columns are binned onto these.
    pub columns: usize,
    /// Vertical resolution. 101 gives one level per IRE.
    pub levels: usize,
    /// Rows counted per parallel chunk.
    pub rows_per_chunk: usize,
}

impl WaveformConfig {
    fn validate(&self) -> ScopeResult<()> {
        if self.columns == 0 || self.levels < 2 {
            return Err(ScopeError::InvalidConfig(format!(
                "waveform needs columns > 0 and levels > 1, got {}x{}",
                self.columns, self.levels
            )));
        }
        if self.rows_per_chunk == 0 {
            return Err(ScopeError::InvalidConfig("rows_per_chunk must be positive".into()));
        }
        Ok(())
    }
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            columns: 256,
            levels: 101,
            rows_per_chunk: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LumaWaveform {
    pub columns: usize,
    pub levels: usize,
    /// `columns * levels` counts, column-major.
    counts: Vec<u32>,
}

impl LumaWaveform {
    /// Pixels in `column` at `level`.
    pub fn count(&self, column: usize, level: usize) -> u32 {
        if column >= self.columns || level >= self.levels {
            return 0;
        }
        self.counts[column * self.levels + level]
    }

    /// Counts of one column, bottom to top.
    pub fn column(&self, column: usize) -> &[u32] {
        let start = column.min(self.columns) * self.levels;
        let end = (start + self.levels).min(self.counts.len());
        &self.counts[start..end]
    }

    /// Highest occupied level per column, or `None` for empty columns.
    pub fn peaks(&self) -> Vec<Option<usize>> {
        (0..self.columns)
            .map(|c| self.column(c).iter().rposition(|&n| n > 0))
            .collect()
    }

    pub fn compute(
        frame: &FrameSamples,
        config: &WaveformConfig,
        cancel: &CancelToken,
    ) -> ScopeResult<Self> {
        config.validate()?;
        let WaveformConfig {
            columns,
            levels,
            rows_per_chunk,
        } = *config;
        let width = frame.width as usize;
        let len = columns * levels;
        let chunk_len = (rows_per_chunk * width).max(1);

        // Chunks hold whole rows, so the offset within a chunk gives x.
        let counts = frame
            .pixels()
            .par_chunks(chunk_len)
            .map(|chunk| {
                if cancel.is_cancelled() {
                    return Err(ScopeError::Cancelled);
                }
                let mut counts = vec![0u32; len];
                for (i, &rgb) in chunk.iter().enumerate() {
                    let column = (i % width) * columns / width;
                    counts[column * levels + bucket(luma(rgb), levels)] += 1;
                }
                Ok(counts)
            })
            .try_reduce(|| vec![0u32; len], |mut a, b| {
                a.iter_mut().zip(&b).for_each(|(d, s)| *d += s);
                Ok(a)
            })?;

        Ok(Self {
            columns,
            levels,
            counts,
        })
    }
}
