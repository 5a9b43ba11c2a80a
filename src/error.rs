//! Error types for ringdump.

use crate::ring::AppendStatus;
use std::collections::TryReserveError;
use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Collector-level errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ring `{0}` not found")]
    RingNotFound(String),

    #[error("ring `{0}` is already registered")]
    DuplicateRing(String),

    #[error("invalid ring name `{0}`: expected 1-64 characters from [A-Za-z0-9_.-]")]
    InvalidRingName(String),

    #[error("failed to read source for ring `{ring}`: {source}")]
    Source {
        ring: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source reader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Reasons a record can be refused by a [`crate::ring::BoundedRecordBuffer`].
///
/// A refused append never changes the buffer.
#[derive(Error, Debug)]
pub enum AppendError {
    #[error("failed to reserve space for record: {0}")]
    Generic(#[from] TryReserveError),

    #[error("input record is empty")]
    Empty,

    #[error("record of {len} bytes exceeds ring capacity of {max_size} bytes")]
    ExceededMaxSize { len: usize, max_size: usize },

    #[error("size counter says {tracked} bytes but records hold {actual} bytes")]
    Corrupted { tracked: usize, actual: usize },
}

impl AppendError {
    pub fn status(&self) -> AppendStatus {
        match self {
            AppendError::Generic(_) => AppendStatus::FailGeneric,
            AppendError::Empty => AppendStatus::FailIpBufferZero,
            AppendError::ExceededMaxSize { .. } => AppendStatus::FailIpBufferExceededMaxsize,
            AppendError::Corrupted { .. } => AppendStatus::FailRingBufferCorrupted,
        }
    }
}
