//! Scope derivation errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("dimension mismatch: expected {expected} samples, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid scope config: {0}")]
    InvalidConfig(String),
    #[error("derivation cancelled")]
    Cancelled,
    #[error("derivation task failed: {0}")]
    TaskFailed(String),
}

pub type ScopeResult<T> = std::result::Result<T, ScopeError>;
