//! Background scope derivation.
//!
//! Derivations run on the tokio blocking pool against an immutable frame
//! snapshot and report through an awaitable [`DerivationHandle`]. At most one
//! derivation is active per [`DerivationKey`]; a newer request cancels the
//! older one.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::{ScopeError, ScopeResult};
use crate::frame::FrameSamples;
use crate::histogram::{Histogram, HistogramConfig};
use crate::waveform::{LumaWaveform, WaveformConfig};

/// Identifies one derivation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What is being derived: one media item at one requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationKey {
    pub media_id: Uuid,
    pub width: u32,
    pub height: u32,
}

impl DerivationKey {
    pub fn for_frame(frame: &FrameSamples) -> Self {
        Self {
            media_id: frame.media_id,
            width: frame.width,
            height: frame.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Histogram(HistogramConfig),
    Waveform(WaveformConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeData {
    Histogram(Histogram),
    Waveform(LumaWaveform),
}

impl ScopeKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Histogram(_) => "histogram",
            Self::Waveform(_) => "waveform",
        }
    }

    /// Compute synchronously on the calling thread.
    pub fn derive(&self, frame: &FrameSamples, cancel: &CancelToken) -> ScopeResult<ScopeData> {
        match self {
            Self::Histogram(config) => Histogram::compute(frame, config, cancel).map(ScopeData::Histogram),
            Self::Waveform(config) => LumaWaveform::compute(frame, config, cancel).map(ScopeData::Waveform),
        }
    }
}

/// Awaitable result of a scheduled derivation.
#[derive(Debug)]
pub struct DerivationHandle {
    request: RequestId,
    key: DerivationKey,
    rx: oneshot::Receiver<ScopeResult<ScopeData>>,
}

impl DerivationHandle {
    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn key(&self) -> DerivationKey {
        self.key
    }

    /// Wait for the derivation to finish.
    pub async fn result(self) -> ScopeResult<ScopeData> {
        self.rx
            .await
            .map_err(|_| ScopeError::TaskFailed(format!("derivation {} dropped its result", self.request)))?
    }
}

#[derive(Debug)]
struct Active {
    request: RequestId,
    cancel: CancelToken,
}

/// Schedules scope derivations on the tokio blocking pool.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct DerivationScheduler {
    active: Arc<Mutex<HashMap<DerivationKey, Active>>>,
    next_id: Arc<AtomicU64>,
}

impl DerivationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start deriving `kind` from `frame`, superseding any derivation still
    /// running for the same media and size.
    pub fn request(&self, frame: FrameSamples, kind: ScopeKind) -> DerivationHandle {
        let key = DerivationKey::for_frame(&frame);
        let request = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let cancel = CancelToken::new();

        if let Some(previous) = self.active.lock().insert(
            key,
            Active {
                request,
                cancel: cancel.clone(),
            },
        ) {
            previous.cancel.cancel();
            warn!(
                superseded = %previous.request,
                by = %request,
                media = %key.media_id,
                "Scope derivation superseded"
            );
        }

        let (tx, rx) = oneshot::channel();
        let active = Arc::clone(&self.active);
        debug!(request = %request, media = %key.media_id, scope = kind.name(), "Scope derivation started");

        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = kind
                .derive(&frame, &cancel)
                .and_then(|data| if cancel.is_cancelled() { Err(ScopeError::Cancelled) } else { Ok(data) });

            {
                let mut active = active.lock();
                if active.get(&key).is_some_and(|a| a.request == request) {
                    active.remove(&key);
                }
            }
            debug!(
                request = %request,
                ok = result.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scope derivation finished"
            );
            // The receiver may have been dropped; nobody is waiting then.
            let _ = tx.send(result);
        });

        DerivationHandle { request, key, rx }
    }

    /// Cancel a running derivation. Returns `false` if it already finished or
    /// was superseded.
    pub fn cancel(&self, request: RequestId) -> bool {
        let mut active = self.active.lock();
        let key = active
            .iter()
            .find(|(_, a)| a.request == request)
            .map(|(key, _)| *key);
        match key.and_then(|key| active.remove(&key)) {
            Some(entry) => {
                entry.cancel.cancel();
                debug!(request = %request, "Scope derivation cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, request: RequestId) -> bool {
        self.active.lock().values().any(|a| a.request == request)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}
