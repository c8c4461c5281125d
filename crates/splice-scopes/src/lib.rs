//! Splice Scopes - Video scope data for the viewer
//!
//! Computes histogram and luma waveform data from decoded frame snapshots.
//! Derivations run in parallel on a background pool, can be cancelled, and
//! never touch the timeline lock.

pub mod cancel;
pub mod error;
pub mod frame;
pub mod histogram;
pub mod scheduler;
pub mod waveform;

pub use cancel::CancelToken;
pub use error::{ScopeError, ScopeResult};
pub use frame::{luma, FrameSamples, LUMA_WEIGHTS};
pub use histogram::{Histogram, HistogramConfig};
pub use scheduler::{
    DerivationHandle, DerivationKey, DerivationScheduler, RequestId, ScopeData, ScopeKind,
};
pub use waveform::{LumaWaveform, WaveformConfig};
